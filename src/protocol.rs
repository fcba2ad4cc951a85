//! Event-bus protocol shared by all runtime components.
//!
//! This module defines all message payloads exchanged between the playback
//! manager, the media-controls surface, and the console control loop.

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Playback(PlaybackMessage),
    Status(StatusMessage),
    /// Tear down all manager loops and exit.
    Shutdown,
}

/// Playback-domain commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMessage {
    /// Start playing the track at the current playlist cursor.
    Play,
    /// Toggle between playing and paused. Ignored while idle.
    PauseResume,
    /// Advance the playlist cursor and play the next track.
    Next,
    /// Stop playback and clear the surface. The process stays alive.
    Stop,
    /// The output finished the current track; treated identically to `Next`.
    TrackFinished,
}

/// Playback state notifications consumed by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMessage {
    /// A track is loaded; re-render the surface.
    NowPlaying {
        /// Track number in `[1, track_count]`.
        track: u32,
        /// Whether playback is currently paused.
        is_paused: bool,
    },
    /// Playback stopped; clear the surface.
    Cleared,
}
