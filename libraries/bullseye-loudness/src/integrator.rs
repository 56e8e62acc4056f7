//! Gated loudness integration
//!
//! Weighted energy is summed into sequential, non-overlapping 400 ms blocks. When a
//! block closes its loudness is compared against the gate: the absolute gate (-70)
//! until a measurement exists, afterwards the greater of the absolute gate and the
//! current integrated loudness minus 10 LU. Blocks that pass are folded into the
//! cumulative energy; integrated loudness is recomputed from the cumulative mean
//! after every block.

use crate::level::clamp_display;
use crate::{
    BLOCK_DURATION_SECS, CALIBRATION_OFFSET_DB, DENORM_THRESHOLD, GATE_ABSOLUTE_DB,
    GATE_RELATIVE_OFFSET_DB, K_OFFSET_DB, MIN_DISPLAY_DB,
};

/// Outcome of a closed block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockReport {
    /// Loudness of the block that just closed
    pub block_lufs: f64,
    /// Gate threshold the block was compared against
    pub gate_threshold: f64,
    /// Whether the block was folded into the integrated measurement
    pub passed_gate: bool,
    /// Integrated loudness after this block, `None` while nothing has passed the gate
    pub integrated_lufs: Option<f64>,
}

/// Gated integrator over fixed-size blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatedIntegrator {
    block_size: usize,
    block_accumulator: f64,
    block_count: usize,
    energy_sum: f64,
    sample_sum: u64,
    total_samples_processed: u64,
    integrated_lufs: Option<f64>,
}

impl GatedIntegrator {
    /// Create an integrator with blocks sized for `sample_rate`
    pub fn new(sample_rate: f64) -> Self {
        Self {
            block_size: block_size_for(sample_rate),
            block_accumulator: 0.0,
            block_count: 0,
            energy_sum: 0.0,
            sample_sum: 0,
            total_samples_processed: 0,
            integrated_lufs: None,
        }
    }

    /// Resize blocks for a new rate and clear all accumulated state
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        *self = Self::new(sample_rate);
    }

    /// Clear all accumulated state, keeping the block size
    pub fn reset(&mut self) {
        *self = Self {
            block_size: self.block_size,
            ..Self::new(0.0)
        };
    }

    /// Add one sample's weighted energy (sum of squared channel outputs)
    ///
    /// Returns a report when this sample completes a block.
    #[inline]
    pub fn push(&mut self, energy: f64) -> Option<BlockReport> {
        let energy = if energy.is_finite() && energy > 0.0 {
            energy
        } else {
            0.0
        };

        self.block_accumulator += energy;
        self.block_count += 1;

        if self.block_size > 0 && self.block_count >= self.block_size {
            Some(self.close_block())
        } else {
            None
        }
    }

    fn close_block(&mut self) -> BlockReport {
        let block_mean = self.block_accumulator / self.block_count as f64;
        let block_lufs = if block_mean <= DENORM_THRESHOLD {
            MIN_DISPLAY_DB
        } else {
            K_OFFSET_DB + 10.0 * block_mean.log10()
        };

        let gate_threshold = match self.integrated_lufs {
            None => GATE_ABSOLUTE_DB,
            Some(current) => GATE_ABSOLUTE_DB.max(current - GATE_RELATIVE_OFFSET_DB),
        };

        let passed_gate = block_lufs >= gate_threshold;
        if passed_gate {
            self.energy_sum += self.block_accumulator;
            self.sample_sum += self.block_count as u64;
        }
        self.total_samples_processed += self.block_count as u64;

        self.block_accumulator = 0.0;
        self.block_count = 0;

        self.integrated_lufs = self.compute_integrated();

        BlockReport {
            block_lufs,
            gate_threshold,
            passed_gate,
            integrated_lufs: self.integrated_lufs,
        }
    }

    fn compute_integrated(&self) -> Option<f64> {
        if self.sample_sum == 0 {
            return None;
        }

        let mean = (self.energy_sum / self.sample_sum as f64).max(DENORM_THRESHOLD);
        if !mean.is_finite() {
            return Some(MIN_DISPLAY_DB);
        }

        Some(clamp_display(
            K_OFFSET_DB + 10.0 * mean.log10() + CALIBRATION_OFFSET_DB,
        ))
    }

    /// Integrated loudness, `None` until a block has passed the gate
    pub fn integrated_lufs(&self) -> Option<f64> {
        self.integrated_lufs
    }

    /// Integrated loudness with the display floor standing in for "no measurement"
    pub fn integrated_or_floor(&self) -> f64 {
        self.integrated_lufs.unwrap_or(MIN_DISPLAY_DB)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Samples in the currently open block
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Cumulative energy of all gated-in blocks
    pub fn energy_sum(&self) -> f64 {
        self.energy_sum
    }

    /// Cumulative sample count of all gated-in blocks
    pub fn sample_sum(&self) -> u64 {
        self.sample_sum
    }

    /// Samples in every closed block, gated in or not
    pub fn total_samples_processed(&self) -> u64 {
        self.total_samples_processed
    }
}

/// Samples per 400 ms block, `floor(0.4 * rate)`
pub(crate) fn block_size_for(sample_rate: f64) -> usize {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        (BLOCK_DURATION_SECS * sample_rate) as usize
    } else {
        0
    }
}
