//! Audio sources that drive a meter the way a host callback would
//!
//! Samples are handed over in fixed-size interleaved stereo buffers. Mono input is
//! duplicated to both channels.

use crate::error::{CliError, Result};
use bullseye_loudness::LoudnessMeter;
use dasp::sample::ToSample;
use std::f64::consts::PI;
use std::path::Path;

/// Shape of a measured stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: u64,
}

impl StreamInfo {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / f64::from(self.sample_rate)
    }
}

/// Measure a WAV file
///
/// The meter is switched to the file's sample rate (which clears it) before any
/// samples are fed.
pub fn analyze_wav(
    path: &Path,
    meter: &mut LoudnessMeter,
    buffer_frames: usize,
) -> Result<StreamInfo> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if !(1..=2).contains(&spec.channels) {
        return Err(CliError::UnsupportedFormat(format!(
            "{} channels (only mono and stereo are metered)",
            spec.channels
        )));
    }

    meter.try_set_sample_rate(f64::from(spec.sample_rate))?;
    tracing::info!(
        "Analyzing {:?}: {} Hz, {} ch, {}-bit {:?}",
        path,
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );

    let channels = spec.channels;
    let frames = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => {
            pump(meter, reader.into_samples::<f32>(), channels, buffer_frames)?
        }
        (hound::SampleFormat::Int, 8) => {
            pump(meter, reader.into_samples::<i8>(), channels, buffer_frames)?
        }
        (hound::SampleFormat::Int, 16) => {
            pump(meter, reader.into_samples::<i16>(), channels, buffer_frames)?
        }
        // 24-bit values are widened to full-scale i32
        (hound::SampleFormat::Int, 24) => pump(
            meter,
            reader.into_samples::<i32>().map(|s| s.map(|v| v << 8)),
            channels,
            buffer_frames,
        )?,
        (hound::SampleFormat::Int, 32) => {
            pump(meter, reader.into_samples::<i32>(), channels, buffer_frames)?
        }
        (format, bits) => {
            return Err(CliError::UnsupportedFormat(format!(
                "{}-bit {:?}",
                bits, format
            )))
        }
    };

    Ok(StreamInfo {
        sample_rate: spec.sample_rate,
        channels,
        frames,
    })
}

/// Measure a synthetic stereo sine
pub fn analyze_tone(
    meter: &mut LoudnessMeter,
    sample_rate: u32,
    frequency: f64,
    amplitude: f64,
    seconds: f64,
    buffer_frames: usize,
) -> Result<StreamInfo> {
    meter.try_set_sample_rate(f64::from(sample_rate))?;

    let total_frames = (seconds.max(0.0) * f64::from(sample_rate)) as u64;
    let rate = f64::from(sample_rate);
    let samples = (0..total_frames).map(|i| {
        let t = i as f64 / rate;
        Ok::<f64, CliError>(amplitude * (2.0 * PI * frequency * t).sin())
    });

    let frames = pump(meter, samples, 1, buffer_frames)?;

    Ok(StreamInfo {
        sample_rate,
        channels: 2,
        frames,
    })
}

/// Feed interleaved samples to the meter in host-sized buffers
///
/// Returns the number of frames measured. A trailing partial frame is dropped.
pub fn pump<S, E, I>(
    meter: &mut LoudnessMeter,
    samples: I,
    channels: u16,
    buffer_frames: usize,
) -> Result<u64>
where
    S: ToSample<f64> + Copy,
    I: IntoIterator<Item = std::result::Result<S, E>>,
    CliError: From<E>,
{
    let buffer_frames = buffer_frames.max(1);
    let mut buffer: Vec<S> = Vec::with_capacity(buffer_frames * 2);
    let mut pending: Option<S> = None;
    let mut frames = 0_u64;

    for sample in samples {
        let sample = sample?;

        if channels == 1 {
            buffer.push(sample);
            buffer.push(sample);
        } else if let Some(left) = pending.take() {
            buffer.push(left);
            buffer.push(sample);
        } else {
            pending = Some(sample);
            continue;
        }

        if buffer.len() >= buffer_frames * 2 {
            meter.process_interleaved(&buffer);
            frames += (buffer.len() / 2) as u64;
            buffer.clear();
        }
    }

    if !buffer.is_empty() {
        meter.process_interleaved(&buffer);
        frames += (buffer.len() / 2) as u64;
    }
    meter.flush();

    Ok(frames)
}
