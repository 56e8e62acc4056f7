/// BULLsEYE - loudness and true peak meter
use bullseye_cli::{analyze_tone, analyze_wav, CliConfig, DisplayMonitor, StreamInfo};
use bullseye_loudness::{LoudnessMeter, MeterReading};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bullseye")]
#[command(about = "Integrated loudness and true peak meter", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./bullseye.toml when present)
    #[arg(short, long, global = true, env = "BULLSEYE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure a WAV file
    Analyze {
        /// WAV file to measure
        path: PathBuf,
        /// Content type (music_non_drums, music_drums, cinema_trailer or a short alias)
        #[arg(short = 't', long)]
        content_type: Option<String>,
        /// Frames per simulated host buffer
        #[arg(short, long)]
        buffer_frames: Option<usize>,
        /// Print the final reading as JSON
        #[arg(long)]
        json: bool,
    },
    /// Measure a synthetic stereo sine
    Tone {
        /// Tone frequency in Hz
        #[arg(short, long, default_value_t = 1000.0)]
        frequency: f64,
        /// Peak amplitude (1.0 = full scale)
        #[arg(short, long, default_value_t = 0.95)]
        amplitude: f64,
        /// Duration in seconds
        #[arg(short, long, default_value_t = 10.0)]
        seconds: f64,
        /// Sample rate in Hz
        #[arg(short = 'r', long, default_value_t = 48000)]
        sample_rate: u32,
        /// Content type (music_non_drums, music_drums, cinema_trailer or a short alias)
        #[arg(short = 't', long)]
        content_type: Option<String>,
        /// Print the final reading as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bullseye=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CliConfig::load_from(Some(path.as_path()))?,
        None => CliConfig::load()?,
    };

    match cli.command {
        Commands::Analyze {
            path,
            content_type,
            buffer_frames,
            json,
        } => {
            config.apply_overrides(content_type, buffer_frames);
            config.validate()?;

            let mut meter = configured_meter(&config)?;
            let monitor = start_monitor(&meter, &config)?;
            let info = analyze_wav(&path, &mut meter, config.buffer_frames);
            let summary = monitor.stop();
            tracing::debug!("Display thread polled {} times", summary.polls);

            report(&info?, &meter.reading(), json)?;
        }
        Commands::Tone {
            frequency,
            amplitude,
            seconds,
            sample_rate,
            content_type,
            json,
        } => {
            config.apply_overrides(content_type, None);
            config.validate()?;

            let mut meter = configured_meter(&config)?;
            let monitor = start_monitor(&meter, &config)?;
            let info = analyze_tone(
                &mut meter,
                sample_rate,
                frequency,
                amplitude,
                seconds,
                config.buffer_frames,
            );
            let summary = monitor.stop();
            tracing::debug!("Display thread polled {} times", summary.polls);

            report(&info?, &meter.reading(), json)?;
        }
    }

    Ok(())
}

fn configured_meter(config: &CliConfig) -> anyhow::Result<LoudnessMeter> {
    let mut meter = LoudnessMeter::new();
    meter.set_content_type(config.content_type()?);
    tracing::info!("Target: {}", meter.content_type());
    Ok(meter)
}

fn start_monitor(meter: &LoudnessMeter, config: &CliConfig) -> anyhow::Result<DisplayMonitor> {
    let interval = Duration::from_millis(config.poll_interval_ms);
    Ok(DisplayMonitor::spawn(meter.handle(), interval)?)
}

fn report(info: &StreamInfo, reading: &MeterReading, json: bool) -> anyhow::Result<()> {
    if json {
        let output = serde_json::json!({
            "sample_rate": info.sample_rate,
            "channels": info.channels,
            "frames": info.frames,
            "duration_secs": info.duration_secs(),
            "reading": reading,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "{:.2} s @ {} Hz, {} ch",
            info.duration_secs(),
            info.sample_rate,
            info.channels
        );
        println!("{}", reading);
        if !reading.is_measured() {
            println!("No block passed the gate; signal is below -70 LUFS");
        }
    }
    Ok(())
}
