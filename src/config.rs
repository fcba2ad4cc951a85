//! Persistent application configuration model and defaults.

use std::path::PathBuf;

/// Root configuration persisted to `shufflebox.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Track library location and size.
    #[serde(default)]
    pub library: LibraryConfig,
}

/// Track library preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LibraryConfig {
    /// Directory holding the numbered track files (`track_1.mp3`, ...).
    #[serde(default = "default_tracks_dir")]
    pub tracks_dir: PathBuf,
    /// Number of bundled tracks; the playlist is a permutation of
    /// `1..=track_count`.
    #[serde(default = "default_track_count")]
    pub track_count: u32,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            tracks_dir: default_tracks_dir(),
            track_count: default_track_count(),
        }
    }
}

fn default_tracks_dir() -> PathBuf {
    dirs::audio_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shufflebox")
}

fn default_track_count() -> u32 {
    30
}

/// Clamps loaded values into ranges the player can operate on.
pub fn sanitize_config(config: Config) -> Config {
    Config {
        library: LibraryConfig {
            tracks_dir: config.library.tracks_dir,
            track_count: config.library.track_count.clamp(1, 9_999),
        },
    }
}
