//! Real-time loudness metering for BULLsEYE
//!
//! This crate provides:
//! - K-weighting (high-pass + high-shelf biquad cascade) recomputed per sample rate
//! - Gated integrated loudness over sequential 400 ms blocks
//! - True peak detection with 4x Hermite oversampling
//! - Lock-free publication of results to any number of reader threads
//!
//! # Architecture
//!
//! ```text
//! Audio thread                                    Display threads
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │ L/R sample  │ ─►│ K-Weighting  │ ─►│ Integrator │ ─┐
//! └─────────────┘   └──────────────┘   └────────────┘  │  ┌──────────┐   ┌─────────────┐
//!        │                                             ├─►│ Snapshot │ ◄─│ MeterHandle │
//!        │          ┌──────────────┐                   │  └──────────┘   └─────────────┘
//!        └─────────►│  True Peak   │ ──────────────────┘
//!                   └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use bullseye_loudness::{ContentType, LoudnessMeter};
//!
//! let mut meter = LoudnessMeter::new();
//! meter.set_sample_rate(48000.0);
//! meter.set_content_type(ContentType::MusicNonDrums);
//!
//! // Readers live on other threads
//! let handle = meter.handle();
//!
//! for i in 0..48000 {
//!     let t = i as f64 / 48000.0;
//!     let s = 0.5 * (2.0 * std::f64::consts::PI * 1000.0 * t).sin();
//!     meter.process(s, s);
//! }
//!
//! println!("{}", handle.reading());
//! ```

mod content;
mod engine;
mod error;
mod integrator;
mod kweighting;
mod level;
mod snapshot;
mod truepeak;

pub use content::ContentType;
pub use engine::{LoudnessMeter, MeterState};
pub use error::{MeterError, Result};
pub use integrator::{BlockReport, GatedIntegrator};
pub use kweighting::{BiquadCoefficients, BiquadState, KWeightingFilter};
pub use level::{linear_to_db, normalize_db};
pub use snapshot::{AtomicF64, MeterHandle, MeterReading, PublishedSnapshot};
pub use truepeak::{hermite_interpolate, TruePeakDetector};

/// Lowest value any published level can take (dB / LUFS)
pub const MIN_DISPLAY_DB: f64 = -120.0;

/// Highest value any published level can take, leaving headroom above 0 dBTP
pub const MAX_DISPLAY_DB: f64 = 20.0;

/// Magnitudes at or below this are treated as silence
pub const DENORM_THRESHOLD: f64 = 1e-18;

/// Sample rate used until the host configures one
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Minimum accepted sample rate in Hz
pub const MIN_SAMPLE_RATE: f64 = 8000.0;

/// Maximum accepted sample rate in Hz
pub const MAX_SAMPLE_RATE: f64 = 1_000_000.0;

/// Gating block duration in seconds
pub const BLOCK_DURATION_SECS: f64 = 0.4;

/// ITU-R BS.1770 K-offset applied to mean-square energy
pub const K_OFFSET_DB: f64 = -0.691;

/// Absolute gate threshold
pub const GATE_ABSOLUTE_DB: f64 = -70.0;

/// Relative gate sits this many LU below the current integrated loudness
pub const GATE_RELATIVE_OFFSET_DB: f64 = 10.0;

/// Offset applied to the integrated value to match the legacy meter's readings
pub const CALIBRATION_OFFSET_DB: f64 = 1.7;

/// Deviation from target is clamped to +/- this many LU
pub const MAX_DEVIATION_LU: f64 = 50.0;

/// Ceiling for the linear running peak
pub const MAX_PEAK_LINEAR: f64 = 1e10;

/// True peak is copied to the snapshot once per this many samples
pub const TRUE_PEAK_BATCH_SIZE: usize = 100;

/// Target loudness for music without a drum bus
pub const TARGET_MUSIC_NON_DRUMS_LUFS: f64 = -11.0;

/// Target loudness for drum-driven music
pub const TARGET_MUSIC_DRUMS_LUFS: f64 = -8.0;

/// Target loudness for cinema and trailer material
pub const TARGET_CINEMA_TRAILER_LUFS: f64 = -14.0;
