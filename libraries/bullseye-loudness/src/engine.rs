//! Meter façade tying the stages together
//!
//! [`LoudnessMeter`] is owned by the audio thread. All numeric state lives in the
//! flat [`MeterState`] value; results are pushed into a shared [`PublishedSnapshot`]
//! that readers access through [`MeterHandle`].

use crate::content::ContentType;
use crate::error::{MeterError, Result};
use crate::integrator::GatedIntegrator;
use crate::kweighting::KWeightingFilter;
use crate::snapshot::{MeterHandle, MeterReading, PublishedSnapshot};
use crate::truepeak::TruePeakDetector;
use crate::{DEFAULT_SAMPLE_RATE, MAX_DEVIATION_LU, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE};
use dasp::sample::ToSample;
use std::sync::Arc;

/// Complete non-atomic measurement state
///
/// A plain value: saving, duplicating and restoring a meter is assignment. Fields are
/// private so every stage always agrees with `sample_rate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterState {
    filter: KWeightingFilter,
    integrator: GatedIntegrator,
    true_peak: TruePeakDetector,
    sample_rate: f64,
    content_type: ContentType,
}

impl MeterState {
    /// Fresh state for `sample_rate`
    pub fn new(sample_rate: f64, content_type: ContentType) -> Result<Self> {
        validate_sample_rate(sample_rate)?;
        Ok(Self::fresh(sample_rate, content_type))
    }

    fn fresh(sample_rate: f64, content_type: ContentType) -> Self {
        Self {
            filter: KWeightingFilter::new(sample_rate),
            integrator: GatedIntegrator::new(sample_rate),
            true_peak: TruePeakDetector::new(),
            sample_rate,
            content_type,
        }
    }

    /// Integrated loudness minus target, 0 while nothing has been measured
    pub fn deviation_lu(&self) -> f64 {
        match self.integrator.integrated_lufs() {
            Some(integrated) => (integrated - self.content_type.target_lufs())
                .clamp(-MAX_DEVIATION_LU, MAX_DEVIATION_LU),
            None => 0.0,
        }
    }

    pub fn filter(&self) -> &KWeightingFilter {
        &self.filter
    }

    pub fn integrator(&self) -> &GatedIntegrator {
        &self.integrator
    }

    pub fn true_peak(&self) -> &TruePeakDetector {
        &self.true_peak
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }
}

impl Default for MeterState {
    fn default() -> Self {
        Self::fresh(DEFAULT_SAMPLE_RATE, ContentType::default())
    }
}

fn validate_sample_rate(sample_rate: f64) -> Result<()> {
    if sample_rate.is_finite() && (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
        Ok(())
    } else {
        Err(MeterError::InvalidSampleRate(sample_rate))
    }
}

/// Stereo loudness and true peak meter
///
/// Single writer: `process`, `reset` and the setters must all be called from the
/// owning (audio) thread. Any number of [`MeterHandle`]s may read concurrently.
#[derive(Debug)]
pub struct LoudnessMeter {
    state: MeterState,
    published: Arc<PublishedSnapshot>,
}

impl LoudnessMeter {
    /// Create a meter at the default sample rate with the default content type
    pub fn new() -> Self {
        let state = MeterState::default();
        let published = Arc::new(PublishedSnapshot::new(state.content_type));
        Self { state, published }
    }

    /// Create a meter for `sample_rate`
    pub fn with_sample_rate(sample_rate: f64) -> Result<Self> {
        let mut meter = Self::new();
        meter.try_set_sample_rate(sample_rate)?;
        Ok(meter)
    }

    /// Reader handle over the published results
    pub fn handle(&self) -> MeterHandle {
        MeterHandle::new(Arc::clone(&self.published))
    }

    /// Change the sample rate, ignoring values outside the supported range
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if let Err(e) = self.try_set_sample_rate(sample_rate) {
            tracing::warn!("Ignoring sample rate change: {}", e);
        }
    }

    /// Change the sample rate
    ///
    /// A new valid rate redesigns the filter, resizes the integration blocks and
    /// clears all measurement state. Passing the current rate is a no-op.
    pub fn try_set_sample_rate(&mut self, sample_rate: f64) -> Result<()> {
        validate_sample_rate(sample_rate)?;

        if sample_rate == self.state.sample_rate {
            return Ok(());
        }

        tracing::debug!(
            "Sample rate {} Hz -> {} Hz",
            self.state.sample_rate,
            sample_rate
        );

        self.state.sample_rate = sample_rate;
        self.state.filter.set_sample_rate(sample_rate);
        self.state.integrator.set_sample_rate(sample_rate);
        self.state.true_peak.reset();
        self.publish_all();
        Ok(())
    }

    /// Select the target; accumulated measurement is untouched
    pub fn set_content_type(&mut self, content_type: ContentType) {
        if content_type == self.state.content_type {
            return;
        }

        tracing::debug!("Content type -> {}", content_type);
        self.state.content_type = content_type;
        self.published.store_content_type(content_type);
        self.published.store_deviation(self.state.deviation_lu());
    }

    /// Select the target by index; unknown indices are ignored
    pub fn set_content_type_index(&mut self, index: i64) {
        match ContentType::try_from(index) {
            Ok(content_type) => self.set_content_type(content_type),
            Err(e) => tracing::warn!("Ignoring content type change: {}", e),
        }
    }

    /// Clear filter, integration and peak state, keeping sample rate and content type
    pub fn reset(&mut self) {
        tracing::debug!("Resetting meter");
        self.state.filter.reset();
        self.state.integrator.reset();
        self.state.true_peak.reset();
        self.publish_all();
    }

    /// Measure one stereo frame
    ///
    /// Never blocks, allocates or logs. Non-finite samples are treated as silence.
    #[inline]
    pub fn process<S: ToSample<f64>>(&mut self, left: S, right: S) {
        let left: f64 = left.to_sample_();
        let right: f64 = right.to_sample_();

        let (weighted_left, weighted_right) = self.state.filter.process(left, right);
        let energy = weighted_left * weighted_left + weighted_right * weighted_right;

        if self.state.integrator.push(energy).is_some() {
            self.publish_loudness();
        }

        if let Some(peak_db) = self.state.true_peak.process(left, right) {
            self.published.store_true_peak(peak_db);
        }
    }

    /// Measure planar buffers over their common length
    pub fn process_block<S: ToSample<f64> + Copy>(&mut self, left: &[S], right: &[S]) {
        for (&l, &r) in left.iter().zip(right) {
            self.process(l, r);
        }
    }

    /// Measure interleaved stereo frames; a trailing partial frame is ignored
    pub fn process_interleaved<S: ToSample<f64> + Copy>(&mut self, frames: &[S]) {
        for frame in frames.chunks_exact(2) {
            self.process(frame[0], frame[1]);
        }
    }

    /// Publish the latest true peak without waiting for the batch boundary
    pub fn flush(&mut self) {
        self.published.store_true_peak(self.state.true_peak.peak_db());
    }

    /// Copy of the current measurement state
    pub fn save_state(&self) -> MeterState {
        self.state
    }

    /// Replace the measurement state and republish every field from it
    pub fn restore_state(&mut self, state: MeterState) {
        self.state = state;
        self.publish_all();
    }

    fn publish_loudness(&self) {
        let integrator = &self.state.integrator;
        self.published
            .store_loudness(integrator.integrated_or_floor(), self.state.deviation_lu());
        self.published
            .store_counters(integrator.sample_sum(), integrator.total_samples_processed());
    }

    fn publish_all(&self) {
        self.publish_loudness();
        self.published.store_true_peak(self.state.true_peak.peak_db());
        self.published.store_content_type(self.state.content_type);
    }

    pub fn sample_rate(&self) -> f64 {
        self.state.sample_rate
    }

    /// Samples per integration block at the current rate
    pub fn block_size(&self) -> usize {
        self.state.integrator.block_size()
    }

    pub fn content_type(&self) -> ContentType {
        self.state.content_type
    }

    pub fn target_lufs(&self) -> f64 {
        self.state.content_type.target_lufs()
    }

    /// Published integrated loudness (LUFS)
    pub fn integrated_lufs(&self) -> f64 {
        self.published.integrated_lufs()
    }

    /// Published true peak (dBTP)
    pub fn true_peak_db(&self) -> f64 {
        self.published.true_peak_db()
    }

    /// Published deviation from target (LU)
    pub fn deviation_lu(&self) -> f64 {
        self.published.deviation_lu()
    }

    pub fn sample_sum(&self) -> u64 {
        self.state.integrator.sample_sum()
    }

    pub fn energy_sum(&self) -> f64 {
        self.state.integrator.energy_sum()
    }

    pub fn total_samples_processed(&self) -> u64 {
        self.state.integrator.total_samples_processed()
    }

    pub fn normalized_lufs(&self) -> f32 {
        self.published.normalized_lufs()
    }

    pub fn normalized_true_peak(&self) -> f32 {
        self.published.normalized_true_peak()
    }

    pub fn reading(&self) -> MeterReading {
        self.published.reading()
    }
}

impl Default for LoudnessMeter {
    fn default() -> Self {
        Self::new()
    }
}
