//! Behavioral tests for the loudness meter
//!
//! Covers:
//! - Silence and the display floor
//! - Analytic loudness of a steady sine
//! - True peak detection on square waves and inter-sample overs
//! - Absolute and relative gating
//! - Reset, sample rate and content type semantics

use bullseye_loudness::{
    ContentType, KWeightingFilter, LoudnessMeter, CALIBRATION_OFFSET_DB, K_OFFSET_DB,
    MAX_DEVIATION_LU, MAX_DISPLAY_DB, MIN_DISPLAY_DB, TRUE_PEAK_BATCH_SIZE,
};
use std::f64::consts::PI;

// ========== Helper Functions ==========

/// Feed a stereo sine (same signal on both channels)
fn feed_sine(meter: &mut LoudnessMeter, frequency: f64, amplitude: f64, frames: usize) {
    let sample_rate = meter.sample_rate();
    for i in 0..frames {
        let t = i as f64 / sample_rate;
        let s = amplitude * (2.0 * PI * frequency * t).sin();
        meter.process(s, s);
    }
}

/// Feed a square wave alternating every `half_period` frames
fn feed_square(meter: &mut LoudnessMeter, amplitude: f64, half_period: usize, frames: usize) {
    for i in 0..frames {
        let s = if (i / half_period) % 2 == 0 {
            amplitude
        } else {
            -amplitude
        };
        meter.process(s, s);
    }
}

fn feed_silence(meter: &mut LoudnessMeter, frames: usize) {
    for _ in 0..frames {
        meter.process(0.0_f64, 0.0_f64);
    }
}

/// Integrated loudness predicted for a steady stereo sine
fn predicted_sine_lufs(frequency: f64, amplitude: f64, sample_rate: f64) -> f64 {
    let filter = KWeightingFilter::new(sample_rate);
    let gain = 10.0_f64.powf(filter.response_db(frequency) / 20.0);
    // Two channels, each with mean square amplitude^2 / 2
    let mean_energy = amplitude * amplitude * gain * gain;
    K_OFFSET_DB + 10.0 * mean_energy.log10() + CALIBRATION_OFFSET_DB
}

// ========== Silence ==========

#[test]
fn test_silence_stays_at_floor() {
    let mut meter = LoudnessMeter::new();
    let block = meter.block_size();
    feed_silence(&mut meter, block * 5);

    assert_eq!(meter.integrated_lufs(), MIN_DISPLAY_DB);
    assert_eq!(meter.deviation_lu(), 0.0);
    assert_eq!(meter.sample_sum(), 0);
    assert_eq!(meter.total_samples_processed(), 5 * meter.block_size() as u64);

    meter.flush();
    assert_eq!(meter.true_peak_db(), MIN_DISPLAY_DB);
    assert_eq!(meter.normalized_lufs(), 0.0);
    assert_eq!(meter.normalized_true_peak(), 0.0);
}

#[test]
fn test_silence_after_measurement_keeps_integrated() {
    let mut meter = LoudnessMeter::new();
    let block = meter.block_size();
    feed_sine(&mut meter, 1000.0, 0.5, block * 2);
    let integrated = meter.integrated_lufs();
    let sample_sum = meter.sample_sum();

    feed_silence(&mut meter, block * 3);

    // Silent blocks fall under the gate and are excluded from the average
    assert_eq!(meter.integrated_lufs(), integrated);
    assert_eq!(meter.sample_sum(), sample_sum);
    assert_eq!(meter.total_samples_processed(), 5 * meter.block_size() as u64);
}

// ========== Integrated Loudness ==========

#[test]
fn test_sine_matches_analytic_prediction() {
    let mut meter = LoudnessMeter::with_sample_rate(48000.0).unwrap();
    meter.set_content_type(ContentType::MusicDrums);
    feed_sine(&mut meter, 1000.0, 0.95, 48000);

    let predicted = predicted_sine_lufs(1000.0, 0.95, 48000.0);
    let measured = meter.integrated_lufs();

    assert!(
        (measured - predicted).abs() < 1.0,
        "measured {measured:.3} LUFS, predicted {predicted:.3} LUFS"
    );
    assert!(measured < 1.0, "integrated too high: {measured}");
    assert!(measured > -5.0, "integrated too low: {measured}");
    assert!((meter.deviation_lu() - (measured + 8.0)).abs() < 1e-9);
}

#[test]
fn test_sine_at_44k1() {
    let mut meter = LoudnessMeter::with_sample_rate(44100.0).unwrap();
    feed_sine(&mut meter, 1000.0, 0.5, 44100);

    let predicted = predicted_sine_lufs(1000.0, 0.5, 44100.0);
    assert!((meter.integrated_lufs() - predicted).abs() < 1.0);
}

#[test]
fn test_louder_signal_reads_louder() {
    let mut quiet = LoudnessMeter::new();
    let mut loud = LoudnessMeter::new();
    feed_sine(&mut quiet, 1000.0, 0.1, 48000);
    feed_sine(&mut loud, 1000.0, 0.4, 48000);

    // 4x amplitude is about +12 dB
    let difference = loud.integrated_lufs() - quiet.integrated_lufs();
    assert!((difference - 12.04).abs() < 0.1, "difference {difference}");
}

#[test]
fn test_nothing_published_before_first_block() {
    let mut meter = LoudnessMeter::new();
    let block = meter.block_size();
    feed_sine(&mut meter, 1000.0, 0.9, block - 1);

    assert_eq!(meter.integrated_lufs(), MIN_DISPLAY_DB);
    assert_eq!(meter.total_samples_processed(), 0);

    meter.process(0.0_f64, 0.0_f64);
    assert!(meter.integrated_lufs() > MIN_DISPLAY_DB);
    assert_eq!(meter.total_samples_processed(), meter.block_size() as u64);
}

// ========== Gating ==========

#[test]
fn test_low_level_signal_never_passes_absolute_gate() {
    let mut meter = LoudnessMeter::new();
    let block = meter.block_size();
    // About -81 per block, well below the -70 gate
    feed_sine(&mut meter, 1000.0, 1e-4, block * 10);

    assert_eq!(meter.sample_sum(), 0);
    assert_eq!(meter.integrated_lufs(), MIN_DISPLAY_DB);
    assert_eq!(meter.deviation_lu(), 0.0);
    assert_eq!(meter.total_samples_processed(), 10 * meter.block_size() as u64);
}

#[test]
fn test_relative_gate_excludes_quiet_passages() {
    let mut meter = LoudnessMeter::new();
    let block = meter.block_size();
    feed_sine(&mut meter, 1000.0, 0.8, block * 3);
    let integrated = meter.integrated_lufs();
    let sample_sum = meter.sample_sum();

    // 40 dB down: above the absolute gate, below the relative one
    feed_sine(&mut meter, 1000.0, 0.008, block * 3);
    assert_eq!(meter.sample_sum(), sample_sum);
    assert_eq!(meter.integrated_lufs(), integrated);

    // 6 dB down: inside the relative gate, lowers the average
    feed_sine(&mut meter, 1000.0, 0.4, block * 3);
    assert_eq!(meter.sample_sum(), sample_sum * 2);
    assert!(meter.integrated_lufs() < integrated);
}

#[test]
fn test_quiet_signal_clamps_deviation() {
    let mut meter = LoudnessMeter::new();
    // Blocks sit just above the absolute gate, integrating near -67 LUFS
    feed_sine(&mut meter, 1000.0, 4e-4, 96000);

    let integrated = meter.integrated_lufs();
    assert!(meter.sample_sum() > 0);
    assert!(integrated < -60.0 && integrated > -70.0, "integrated {integrated}");

    // About 59 LU under the -8 target, held at the bound
    assert_eq!(meter.deviation_lu(), -MAX_DEVIATION_LU);
    assert_eq!(meter.reading().deviation_lu, -MAX_DEVIATION_LU);
}

// ========== True Peak ==========

#[test]
fn test_full_scale_square_detected() {
    let mut meter = LoudnessMeter::new();
    feed_square(&mut meter, 1.0, 1, 1000);
    meter.flush();
    assert!(meter.true_peak_db() >= -6.0);
}

#[test]
fn test_square_wave_overshoot() {
    let mut meter = LoudnessMeter::new();
    feed_square(&mut meter, 0.5, 24, 4800);
    meter.flush();

    // Interpolation across the edges reads above the sample peak
    assert!(meter.true_peak_db() > -6.03);
    assert!(meter.true_peak_db() < MAX_DISPLAY_DB);
}

#[test]
fn test_inter_sample_peak_of_quarter_rate_sine() {
    // fs/4 sine sampled at 45 degrees: every sample is +/-0.707, the waveform reaches 1.0
    let mut meter = LoudnessMeter::new();
    for i in 0..4800 {
        let s = (PI / 2.0 * i as f64 + PI / 4.0).sin();
        meter.process(s, s);
    }
    meter.flush();

    let sample_peak_db = 20.0 * (0.5_f64.sqrt()).log10();
    assert!(meter.true_peak_db() > sample_peak_db + 1.0);
}

#[test]
fn test_true_peak_published_in_batches() {
    let mut meter = LoudnessMeter::new();
    let handle = meter.handle();

    for _ in 0..TRUE_PEAK_BATCH_SIZE - 1 {
        meter.process(0.5_f64, 0.5_f64);
    }
    assert_eq!(handle.true_peak_db(), MIN_DISPLAY_DB);

    meter.process(0.5_f64, 0.5_f64);
    assert!(handle.true_peak_db() > -7.0);
}

#[test]
fn test_true_peak_is_monotonic() {
    let mut meter = LoudnessMeter::new();
    let handle = meter.handle();
    let mut previous = handle.true_peak_db();

    for amplitude in [0.2, 0.9, 0.1, 0.5, 0.0, 0.95] {
        feed_sine(&mut meter, 440.0, amplitude, 2400);
        let current = handle.true_peak_db();
        assert!(current >= previous, "{current} < {previous}");
        previous = current;
    }
}

// ========== Reset / Configuration ==========

#[test]
fn test_reset_returns_floor_and_keeps_configuration() {
    let mut meter = LoudnessMeter::with_sample_rate(96000.0).unwrap();
    meter.set_content_type(ContentType::CinemaTrailer);
    feed_sine(&mut meter, 1000.0, 0.7, 96000);
    meter.flush();

    meter.reset();

    assert_eq!(meter.integrated_lufs(), MIN_DISPLAY_DB);
    assert_eq!(meter.true_peak_db(), MIN_DISPLAY_DB);
    assert_eq!(meter.deviation_lu(), 0.0);
    assert_eq!(meter.content_type(), ContentType::CinemaTrailer);
    assert_eq!(meter.target_lufs(), -14.0);
    assert_eq!(meter.sample_rate(), 96000.0);
}

#[test]
fn test_reset_matches_fresh_meter() {
    let mut used = LoudnessMeter::new();
    feed_sine(&mut used, 1000.0, 0.7, 30000);
    used.reset();

    let mut fresh = LoudnessMeter::new();
    feed_sine(&mut used, 250.0, 0.3, 30000);
    feed_sine(&mut fresh, 250.0, 0.3, 30000);
    assert_eq!(used.save_state(), fresh.save_state());
}

#[test]
fn test_sample_rate_change_equals_reset() {
    let mut meter = LoudnessMeter::new();
    feed_sine(&mut meter, 1000.0, 0.7, 30000);

    meter.set_sample_rate(44100.0);
    assert_eq!(meter.sample_sum(), 0);
    assert_eq!(meter.energy_sum(), 0.0);
    assert_eq!(meter.total_samples_processed(), 0);
    assert_eq!(meter.integrated_lufs(), MIN_DISPLAY_DB);
    assert_eq!(meter.true_peak_db(), MIN_DISPLAY_DB);
    assert_eq!(meter.block_size(), 17640);
}

#[test]
fn test_same_sample_rate_twice_keeps_state() {
    let mut meter = LoudnessMeter::new();
    meter.set_sample_rate(44100.0);
    feed_sine(&mut meter, 1000.0, 0.7, 30000);
    let before = meter.save_state();

    meter.set_sample_rate(44100.0);
    assert_eq!(meter.save_state(), before);
}

#[test]
fn test_content_type_does_not_touch_accumulators() {
    let mut meter = LoudnessMeter::new();
    feed_sine(&mut meter, 1000.0, 0.7, 40000);
    let energy_sum = meter.energy_sum();
    let sample_sum = meter.sample_sum();
    let integrated = meter.integrated_lufs();

    for content in ContentType::ALL {
        meter.set_content_type(content);
        assert_eq!(meter.energy_sum(), energy_sum);
        assert_eq!(meter.sample_sum(), sample_sum);
        assert_eq!(meter.integrated_lufs(), integrated);
        assert!((meter.deviation_lu() - (integrated - content.target_lufs())).abs() < 1e-9);
    }
}

#[test]
fn test_content_type_mid_stream_continues_integration() {
    let mut switched = LoudnessMeter::new();
    let mut steady = LoudnessMeter::new();

    feed_sine(&mut switched, 1000.0, 0.6, 25000);
    feed_sine(&mut steady, 1000.0, 0.6, 25000);
    switched.set_content_type(ContentType::MusicNonDrums);
    feed_sine(&mut switched, 1000.0, 0.6, 25000);
    feed_sine(&mut steady, 1000.0, 0.6, 25000);

    assert_eq!(switched.integrated_lufs(), steady.integrated_lufs());
    assert_eq!(switched.sample_sum(), steady.sample_sum());
}

// ========== Sample Formats ==========

#[test]
fn test_i16_and_f32_input_agree() {
    let frames = 48000;
    let float: Vec<f32> = (0..frames)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / 48000.0).sin())
        .collect();
    let int: Vec<i16> = float.iter().map(|&s| (s * 32768.0) as i16).collect();

    let mut float_meter = LoudnessMeter::new();
    float_meter.process_block(&float, &float);

    let mut int_meter = LoudnessMeter::new();
    int_meter.process_block(&int, &int);

    assert!((float_meter.integrated_lufs() - int_meter.integrated_lufs()).abs() < 0.01);
}

#[test]
fn test_non_finite_samples_are_silence() {
    let mut meter = LoudnessMeter::new();
    let block = meter.block_size();
    for i in 0..block * 2 {
        let s = match i % 3 {
            0 => f64::NAN,
            1 => f64::INFINITY,
            _ => f64::NEG_INFINITY,
        };
        meter.process(s, s);
    }
    meter.flush();

    assert_eq!(meter.integrated_lufs(), MIN_DISPLAY_DB);
    assert_eq!(meter.true_peak_db(), MIN_DISPLAY_DB);
    assert_eq!(meter.sample_sum(), 0);
}
