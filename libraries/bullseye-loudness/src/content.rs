//! Content categories and their loudness targets

use crate::error::MeterError;
use crate::{TARGET_CINEMA_TRAILER_LUFS, TARGET_MUSIC_DRUMS_LUFS, TARGET_MUSIC_NON_DRUMS_LUFS};
use std::fmt;
use std::str::FromStr;

/// Content category selecting the target loudness for deviation readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ContentType {
    /// Music without a dominant drum bus (-11 LUFS)
    MusicNonDrums,
    /// Drum-driven music (-8 LUFS)
    #[default]
    MusicDrums,
    /// Cinema and trailer mixes (-14 LUFS)
    CinemaTrailer,
}

impl ContentType {
    /// All categories in index order
    pub const ALL: [ContentType; 3] = [
        ContentType::MusicNonDrums,
        ContentType::MusicDrums,
        ContentType::CinemaTrailer,
    ];

    /// Target loudness for this category
    pub fn target_lufs(self) -> f64 {
        match self {
            Self::MusicNonDrums => TARGET_MUSIC_NON_DRUMS_LUFS,
            Self::MusicDrums => TARGET_MUSIC_DRUMS_LUFS,
            Self::CinemaTrailer => TARGET_CINEMA_TRAILER_LUFS,
        }
    }

    /// Stable index (0-2), as stored by hosts and in the published snapshot
    pub fn index(self) -> u8 {
        match self {
            Self::MusicNonDrums => 0,
            Self::MusicDrums => 1,
            Self::CinemaTrailer => 2,
        }
    }

    /// Look up a category by index
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::MusicNonDrums),
            1 => Some(Self::MusicDrums),
            2 => Some(Self::CinemaTrailer),
            _ => None,
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::MusicNonDrums => "Music Non-drums",
            Self::MusicDrums => "Music Drums",
            Self::CinemaTrailer => "Cinema/Trailer",
        }
    }

    /// Convert to string for settings persistence
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MusicNonDrums => "music_non_drums",
            Self::MusicDrums => "music_drums",
            Self::CinemaTrailer => "cinema_trailer",
        }
    }
}

impl TryFrom<i64> for ContentType {
    type Error = MeterError;

    fn try_from(index: i64) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(MeterError::InvalidContentType(index))
    }
}

impl FromStr for ContentType {
    type Err = MeterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "music_non_drums" | "non_drums" | "non-drums" | "music" => Ok(Self::MusicNonDrums),
            "music_drums" | "drums" => Ok(Self::MusicDrums),
            "cinema_trailer" | "cinema" | "trailer" => Ok(Self::CinemaTrailer),
            _ => Err(MeterError::UnknownContentType(s.to_string())),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.0} LUFS)", self.display_name(), self.target_lufs())
    }
}
