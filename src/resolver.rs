//! Track number to audio file resolution.
//!
//! Tracks are bundled as numbered files (`track_1.mp3`, `track_2.ogg`, ...)
//! inside a single directory. The resolver maps a track number to the first
//! matching file; everything past this seam works with plain paths.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extensions probed when resolving a track number, in preference order.
const TRACK_EXTENSIONS: [&str; 4] = ["mp3", "wav", "ogg", "flac"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("track {0} has no backing audio file")]
    NotFound(u32),
}

/// Maps a track number to a playable audio source.
pub trait TrackResolver {
    fn resolve(&self, track: u32) -> Result<PathBuf, ResolveError>;
}

/// Resolves `track_<n>.<ext>` files under a fixed directory.
pub struct FileTrackResolver {
    tracks_dir: PathBuf,
}

impl FileTrackResolver {
    pub fn new<P: AsRef<Path>>(tracks_dir: P) -> Self {
        FileTrackResolver {
            tracks_dir: tracks_dir.as_ref().to_path_buf(),
        }
    }
}

impl TrackResolver for FileTrackResolver {
    fn resolve(&self, track: u32) -> Result<PathBuf, ResolveError> {
        for extension in TRACK_EXTENSIONS {
            let candidate = self.tracks_dir.join(format!("track_{}.{}", track, extension));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(ResolveError::NotFound(track))
    }
}
