//! True peak detection
//!
//! Inter-sample peaks are estimated by evaluating a Catmull-Rom (cubic Hermite)
//! curve through the last four raw samples at four fractional offsets, which
//! approximates the waveform at 4x the input rate. The running peak only ever
//! rises until reset.
//!
//! The dB value is recomputed every sample but only handed out for publication
//! once per [`TRUE_PEAK_BATCH_SIZE`] samples.

use crate::level::{linear_to_db, sanitize};
use crate::{DENORM_THRESHOLD, MAX_PEAK_LINEAR, MIN_DISPLAY_DB, TRUE_PEAK_BATCH_SIZE};

/// Fractional positions evaluated between `x1` and `x2`
const OVERSAMPLE_OFFSETS: [f64; 4] = [0.0, 0.25, 0.5, 0.75];

/// Cubic Hermite interpolation between `x1` and `x2` at `t` in `[0, 1)`
///
/// `x0` and `x3` are the neighbouring samples that shape the tangents.
#[inline]
pub fn hermite_interpolate(x0: f64, x1: f64, x2: f64, x3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = -0.5 * x0 + 1.5 * x1 - 1.5 * x2 + 0.5 * x3;
    let b = x0 - 2.5 * x1 + 2.0 * x2 - 0.5 * x3;
    let c = -0.5 * x0 + 0.5 * x2;
    let d = x1;

    sanitize(a * t3 + b * t2 + c * t + d)
}

/// Largest interpolated magnitude across the window
#[inline]
fn window_peak(window: &[f64; 4]) -> f64 {
    let [x0, x1, x2, x3] = *window;
    OVERSAMPLE_OFFSETS
        .iter()
        .map(|&t| hermite_interpolate(x0, x1, x2, x3, t).abs())
        .fold(0.0, f64::max)
}

#[inline]
fn push_history(window: &mut [f64; 4], sample: f64) {
    window.copy_within(1.., 0);
    window[3] = sample;
}

/// Stereo 4x-oversampled true peak tracker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruePeakDetector {
    left_history: [f64; 4],
    right_history: [f64; 4],
    peak_left: f64,
    peak_right: f64,
    peak_max: f64,
    /// Latest dB value, waiting for the next batch boundary
    buffered_db: f64,
    batch_counter: usize,
}

impl TruePeakDetector {
    pub fn new() -> Self {
        Self {
            left_history: [0.0; 4],
            right_history: [0.0; 4],
            peak_left: 0.0,
            peak_right: 0.0,
            peak_max: 0.0,
            buffered_db: MIN_DISPLAY_DB,
            batch_counter: 0,
        }
    }

    /// Feed one raw (unweighted) sample pair
    ///
    /// Returns the peak in dB when a publication batch completes.
    #[inline]
    pub fn process(&mut self, left: f64, right: f64) -> Option<f64> {
        push_history(&mut self.left_history, sanitize(left));
        push_history(&mut self.right_history, sanitize(right));

        self.peak_left = self.peak_left.max(window_peak(&self.left_history));
        self.peak_right = self.peak_right.max(window_peak(&self.right_history));
        self.peak_max = self.peak_left.max(self.peak_right).min(MAX_PEAK_LINEAR);

        self.buffered_db = if self.peak_max <= DENORM_THRESHOLD {
            MIN_DISPLAY_DB
        } else {
            linear_to_db(self.peak_max)
        };

        self.batch_counter += 1;
        if self.batch_counter >= TRUE_PEAK_BATCH_SIZE {
            self.batch_counter = 0;
            Some(self.buffered_db)
        } else {
            None
        }
    }

    /// Latest computed peak in dB, including samples not yet published
    pub fn peak_db(&self) -> f64 {
        self.buffered_db
    }

    /// Running peak (linear) across both channels
    pub fn peak_linear(&self) -> f64 {
        self.peak_max
    }

    /// Running peaks (linear) per channel
    pub fn channel_peaks(&self) -> (f64, f64) {
        (self.peak_left, self.peak_right)
    }

    /// Samples processed since the last publication
    pub fn pending_samples(&self) -> usize {
        self.batch_counter
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for TruePeakDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_DISPLAY_DB;

    #[test]
    fn test_hermite_hits_sample_points() {
        // t = 0 returns x1 exactly
        assert_eq!(hermite_interpolate(0.1, 0.4, -0.2, 0.3, 0.0), 0.4);
    }

    #[test]
    fn test_hermite_overshoots_between_samples() {
        // Two equal samples on a rising/falling edge peak above their value
        let mid = hermite_interpolate(0.0, 0.9, 0.9, 0.0, 0.5);
        assert!(mid > 0.9, "expected inter-sample overshoot, got {mid}");
    }

    #[test]
    fn test_hermite_rejects_nan() {
        assert_eq!(hermite_interpolate(f64::NAN, 0.0, 0.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn test_silence_stays_at_floor() {
        let mut detector = TruePeakDetector::new();
        for _ in 0..1000 {
            if let Some(db) = detector.process(0.0, 0.0) {
                assert_eq!(db, MIN_DISPLAY_DB);
            }
        }
        assert_eq!(detector.peak_db(), MIN_DISPLAY_DB);
    }

    #[test]
    fn test_publishes_once_per_batch() {
        let mut detector = TruePeakDetector::new();
        let published: Vec<usize> = (0..TRUE_PEAK_BATCH_SIZE * 3)
            .filter_map(|i| detector.process(0.5, 0.5).map(|_| i))
            .collect();

        assert_eq!(
            published,
            vec![
                TRUE_PEAK_BATCH_SIZE - 1,
                2 * TRUE_PEAK_BATCH_SIZE - 1,
                3 * TRUE_PEAK_BATCH_SIZE - 1
            ]
        );
        assert_eq!(detector.pending_samples(), 0);
    }

    #[test]
    fn test_latest_value_survives_until_batch_boundary() {
        let mut detector = TruePeakDetector::new();
        for _ in 0..10 {
            detector.process(0.0, 0.0);
        }
        // The newest sample is interpolated once it reaches the window's inner pair
        detector.process(0.5, 0.0);
        detector.process(0.0, 0.0);
        detector.process(0.0, 0.0);
        assert!(detector.peak_db() > -7.0);
        assert_eq!(detector.pending_samples(), 13);

        let published = (13..TRUE_PEAK_BATCH_SIZE)
            .filter_map(|_| detector.process(0.0, 0.0))
            .last()
            .expect("batch boundary reached");
        assert_eq!(published, detector.peak_db());
    }

    #[test]
    fn test_peak_is_monotonic() {
        let mut detector = TruePeakDetector::new();
        detector.process(0.8, 0.0);
        let high = detector.peak_linear();

        for _ in 0..500 {
            detector.process(0.1, -0.1);
            assert!(detector.peak_linear() >= high);
        }
    }

    #[test]
    fn test_channels_tracked_separately() {
        let mut detector = TruePeakDetector::new();
        for _ in 0..8 {
            detector.process(0.25, -0.5);
        }
        let (left, right) = detector.channel_peaks();
        assert!(left < right);
        assert_eq!(detector.peak_linear(), right);
    }

    #[test]
    fn test_full_scale_square_detects_overs() {
        let mut detector = TruePeakDetector::new();
        for i in 0..1000 {
            let s = if i % 2 == 0 { 1.0 } else { -1.0 };
            detector.process(s, s);
        }
        assert!(detector.peak_db() >= 0.0);
        assert!(detector.peak_db() <= MAX_DISPLAY_DB);
    }

    #[test]
    fn test_huge_input_is_clamped() {
        let mut detector = TruePeakDetector::new();
        detector.process(1e300, -1e300);
        assert!(detector.peak_linear() <= MAX_PEAK_LINEAR);
        assert_eq!(detector.peak_db(), MAX_DISPLAY_DB);
    }

    #[test]
    fn test_reset() {
        let mut detector = TruePeakDetector::new();
        for _ in 0..50 {
            detector.process(0.9, 0.9);
        }
        detector.reset();
        assert_eq!(detector, TruePeakDetector::new());
    }
}
