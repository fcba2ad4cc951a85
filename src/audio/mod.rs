//! Audio output seam.
//!
//! The playback state machine drives audio through the [`AudioOutput`]
//! trait so the engine backend stays swappable and testable. The default
//! backend is [`RodioOutput`].

mod rodio_output;

pub use rodio_output::RodioOutput;

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Failures raised by an audio output backend.
///
/// All variants are non-fatal: the caller logs them and keeps its prior
/// state.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to open audio output device: {0}")]
    Device(String),
    #[error("failed to open track file: {0}")]
    Open(#[from] std::io::Error),
    #[error("failed to decode track: {0}")]
    Decode(String),
}

/// One-track-at-a-time audio output handle.
///
/// `start` releases the previous track's handle before acquiring a fresh
/// one, so a backend never holds two tracks at once. Dropping the backend
/// releases the handle unconditionally.
pub trait AudioOutput {
    /// Releases the current handle, loads the file, and starts playback.
    fn start(&mut self, path: &Path) -> Result<(), OutputError>;

    /// Pauses playback in place. No-op without a loaded track.
    fn pause(&mut self);

    /// Resumes paused playback. No-op without a loaded track.
    fn resume(&mut self);

    /// Stops playback and releases the handle. Always succeeds.
    fn stop(&mut self);

    /// Current playback position within the loaded track.
    fn position(&self) -> Duration;

    /// Whether the loaded track has played to completion.
    fn is_finished(&self) -> bool;
}
