/// CLI configuration
use crate::error::{CliError, Result};
use bullseye_loudness::ContentType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "bullseye.toml";

/// Prefix for environment overrides (`BULLSEYE_POLL_INTERVAL_MS=250`)
pub const ENV_PREFIX: &str = "BULLSEYE";

const MIN_POLL_INTERVAL_MS: u64 = 10;
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
const MAX_BUFFER_FRAMES: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CliConfig {
    /// Content type name, any alias accepted by `ContentType::from_str`
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// How often the display thread polls the meter
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Frames handed to the meter per simulated host callback
    #[serde(default = "default_buffer_frames")]
    pub buffer_frames: usize,
}

impl CliConfig {
    /// Load from `bullseye.toml` (if present) and `BULLSEYE_*` environment variables
    pub fn load() -> Result<Self> {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::load_from(Some(&default_path))
        } else {
            Self::load_from(None)
        }
    }

    /// Load from an explicit file (which must exist) and the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            settings = settings.add_source(config::File::from(path).required(true));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of loaded values
    pub fn apply_overrides(&mut self, content_type: Option<String>, buffer_frames: Option<usize>) {
        if let Some(content_type) = content_type {
            self.content_type = content_type;
        }
        if let Some(buffer_frames) = buffer_frames {
            self.buffer_frames = buffer_frames;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.content_type()?;

        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(CliError::Config(format!(
                "poll_interval_ms must be between {} and {}, got {}",
                MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, self.poll_interval_ms
            )));
        }

        if !(1..=MAX_BUFFER_FRAMES).contains(&self.buffer_frames) {
            return Err(CliError::Config(format!(
                "buffer_frames must be between 1 and {}, got {}",
                MAX_BUFFER_FRAMES, self.buffer_frames
            )));
        }

        Ok(())
    }

    /// Parsed content type
    pub fn content_type(&self) -> Result<ContentType> {
        Ok(self.content_type.parse()?)
    }
}

fn default_content_type() -> String {
    ContentType::default().as_str().to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_buffer_frames() -> usize {
    512
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            poll_interval_ms: default_poll_interval_ms(),
            buffer_frames: default_buffer_frames(),
        }
    }
}
