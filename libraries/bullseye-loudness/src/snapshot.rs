//! Lock-free publication of meter results
//!
//! The audio thread is the only writer. Every field is an independent atomic:
//! stores use `Release`, loads use `Acquire`. Readers may observe fields from
//! neighbouring updates side by side, which is fine for display purposes.

use crate::content::ContentType;
use crate::level::normalize_db;
use crate::MIN_DISPLAY_DB;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// `f64` stored as its bit pattern in an `AtomicU64`
#[derive(Debug)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

impl Default for AtomicF64 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Values visible to reader threads
#[derive(Debug)]
pub struct PublishedSnapshot {
    integrated_lufs: AtomicF64,
    true_peak_db: AtomicF64,
    deviation_lu: AtomicF64,
    content_type: AtomicU8,
    sample_sum: AtomicU64,
    total_samples_processed: AtomicU64,
}

impl PublishedSnapshot {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            integrated_lufs: AtomicF64::new(MIN_DISPLAY_DB),
            true_peak_db: AtomicF64::new(MIN_DISPLAY_DB),
            deviation_lu: AtomicF64::new(0.0),
            content_type: AtomicU8::new(content_type.index()),
            sample_sum: AtomicU64::new(0),
            total_samples_processed: AtomicU64::new(0),
        }
    }

    pub(crate) fn store_loudness(&self, integrated_lufs: f64, deviation_lu: f64) {
        self.integrated_lufs.store(integrated_lufs);
        self.deviation_lu.store(deviation_lu);
    }

    pub(crate) fn store_deviation(&self, deviation_lu: f64) {
        self.deviation_lu.store(deviation_lu);
    }

    pub(crate) fn store_true_peak(&self, true_peak_db: f64) {
        self.true_peak_db.store(true_peak_db);
    }

    pub(crate) fn store_counters(&self, sample_sum: u64, total_samples_processed: u64) {
        self.sample_sum.store(sample_sum, Ordering::Release);
        self.total_samples_processed
            .store(total_samples_processed, Ordering::Release);
    }

    pub(crate) fn store_content_type(&self, content_type: ContentType) {
        self.content_type
            .store(content_type.index(), Ordering::Release);
    }

    pub fn integrated_lufs(&self) -> f64 {
        self.integrated_lufs.load()
    }

    pub fn true_peak_db(&self) -> f64 {
        self.true_peak_db.load()
    }

    pub fn deviation_lu(&self) -> f64 {
        self.deviation_lu.load()
    }

    pub fn content_type(&self) -> ContentType {
        ContentType::from_index(i64::from(self.content_type.load(Ordering::Acquire)))
            .unwrap_or_default()
    }

    pub fn target_lufs(&self) -> f64 {
        self.content_type().target_lufs()
    }

    /// Samples in blocks that passed the gate
    pub fn sample_sum(&self) -> u64 {
        self.sample_sum.load(Ordering::Acquire)
    }

    /// Samples in every closed block; keeps rising during silence, unlike `sample_sum`
    pub fn total_samples_processed(&self) -> u64 {
        self.total_samples_processed.load(Ordering::Acquire)
    }

    /// Integrated loudness projected onto 0.0-1.0 for display scaling
    pub fn normalized_lufs(&self) -> f32 {
        normalize_db(self.integrated_lufs())
    }

    /// True peak projected onto 0.0-1.0 for display scaling
    pub fn normalized_true_peak(&self) -> f32 {
        normalize_db(self.true_peak_db())
    }

    /// Collect every field into a plain value
    pub fn reading(&self) -> MeterReading {
        let content_type = self.content_type();
        MeterReading {
            integrated_lufs: self.integrated_lufs(),
            true_peak_db: self.true_peak_db(),
            deviation_lu: self.deviation_lu(),
            content_type,
            target_lufs: content_type.target_lufs(),
            sample_sum: self.sample_sum(),
            total_samples_processed: self.total_samples_processed(),
        }
    }
}

impl Default for PublishedSnapshot {
    fn default() -> Self {
        Self::new(ContentType::default())
    }
}

/// Cloneable, read-only view of a meter's published results
///
/// Handles are `Send + Sync` and never block the audio thread.
#[derive(Debug, Clone)]
pub struct MeterHandle {
    snapshot: Arc<PublishedSnapshot>,
}

impl MeterHandle {
    pub(crate) fn new(snapshot: Arc<PublishedSnapshot>) -> Self {
        Self { snapshot }
    }

    pub fn integrated_lufs(&self) -> f64 {
        self.snapshot.integrated_lufs()
    }

    pub fn true_peak_db(&self) -> f64 {
        self.snapshot.true_peak_db()
    }

    pub fn deviation_lu(&self) -> f64 {
        self.snapshot.deviation_lu()
    }

    pub fn content_type(&self) -> ContentType {
        self.snapshot.content_type()
    }

    pub fn target_lufs(&self) -> f64 {
        self.snapshot.target_lufs()
    }

    pub fn sample_sum(&self) -> u64 {
        self.snapshot.sample_sum()
    }

    pub fn total_samples_processed(&self) -> u64 {
        self.snapshot.total_samples_processed()
    }

    pub fn normalized_lufs(&self) -> f32 {
        self.snapshot.normalized_lufs()
    }

    pub fn normalized_true_peak(&self) -> f32 {
        self.snapshot.normalized_true_peak()
    }

    pub fn reading(&self) -> MeterReading {
        self.snapshot.reading()
    }
}

/// Point-in-time copy of the published values
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeterReading {
    /// Integrated loudness (LUFS), display floor when nothing has been measured
    pub integrated_lufs: f64,
    /// True peak in dBTP
    pub true_peak_db: f64,
    /// Integrated loudness minus target, in LU
    pub deviation_lu: f64,
    pub content_type: ContentType,
    pub target_lufs: f64,
    pub sample_sum: u64,
    pub total_samples_processed: u64,
}

impl MeterReading {
    /// Whether any block has passed the gate
    pub fn is_measured(&self) -> bool {
        self.sample_sum > 0
    }
}

impl fmt::Display for MeterReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Integrated: {:.1} LUFS, True Peak: {:.1} dBTP, Deviation: {:+.1} LU, Target: {}",
            self.integrated_lufs, self.true_peak_db, self.deviation_lu, self.content_type
        )
    }
}
