//! BULLsEYE command-line host
//!
//! Drives the loudness meter from WAV files or synthetic tones while a display
//! thread polls the published readings.

pub mod config;
pub mod error;
pub mod monitor;
pub mod source;

pub use config::CliConfig;
pub use error::{CliError, Result};
pub use monitor::{DisplayMonitor, MonitorSummary};
pub use source::{analyze_tone, analyze_wav, StreamInfo};
