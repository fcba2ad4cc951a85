//! Playback state machine.
//!
//! All playback state (playlist cursor, playing/paused flag, saved offset,
//! output handle) lives in one [`Player`] struct and is mutated only inside
//! [`Player::handle`], so every transition is a single read-modify-write
//! over exclusively owned state.

use std::time::Duration;

use log::{debug, warn};

use crate::audio::AudioOutput;
use crate::playlist::ShufflePlaylist;
use crate::protocol::{PlaybackMessage, StatusMessage};
use crate::resolver::TrackResolver;

/// Coarse playback state. `Idle` has no current track; the saved offset is
/// meaningful only while `Paused`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

pub struct Player<R, O> {
    playlist: ShufflePlaylist,
    state: PlaybackState,
    current_track: Option<u32>,
    saved_offset: Duration,
    resolver: R,
    output: O,
}

impl<R: TrackResolver, O: AudioOutput> Player<R, O> {
    pub fn new(track_count: u32, resolver: R, output: O) -> Self {
        Player {
            playlist: ShufflePlaylist::new(track_count),
            state: PlaybackState::Idle,
            current_track: None,
            saved_offset: Duration::ZERO,
            resolver,
            output,
        }
    }

    /// Applies one control signal and returns the resulting surface update,
    /// if any.
    ///
    /// Failed track loads are logged and abandoned; the prior state is kept
    /// and no update is emitted. Signals that are invalid for the current
    /// state are no-ops.
    pub fn handle(&mut self, command: PlaybackMessage) -> Option<StatusMessage> {
        match command {
            PlaybackMessage::Play => {
                self.playlist.ensure();
                self.load_track(self.playlist.current())
            }
            PlaybackMessage::PauseResume => match self.state {
                PlaybackState::Playing => {
                    self.saved_offset = self.output.position();
                    self.output.pause();
                    self.state = PlaybackState::Paused;
                    self.current_track.map(|track| StatusMessage::NowPlaying {
                        track,
                        is_paused: true,
                    })
                }
                PlaybackState::Paused => {
                    self.output.resume();
                    self.state = PlaybackState::Playing;
                    self.saved_offset = Duration::ZERO;
                    self.current_track.map(|track| StatusMessage::NowPlaying {
                        track,
                        is_paused: false,
                    })
                }
                PlaybackState::Idle => {
                    debug!("Player: pause/resume while idle, ignoring");
                    None
                }
            },
            PlaybackMessage::Next | PlaybackMessage::TrackFinished => {
                if self.state == PlaybackState::Idle {
                    debug!("Player: next while idle, ignoring");
                    return None;
                }
                self.playlist.advance();
                self.load_track(self.playlist.current())
            }
            PlaybackMessage::Stop => {
                self.output.stop();
                self.saved_offset = Duration::ZERO;
                self.current_track = None;
                if self.state == PlaybackState::Idle {
                    return None;
                }
                self.state = PlaybackState::Idle;
                Some(StatusMessage::Cleared)
            }
        }
    }

    /// Whether the output finished the current track. Only meaningful while
    /// playing; a paused or idle player never reports completion.
    pub fn finished_current_track(&self) -> bool {
        self.state == PlaybackState::Playing && self.output.is_finished()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> Option<u32> {
        self.current_track
    }

    pub fn saved_offset(&self) -> Duration {
        self.saved_offset
    }

    pub fn playlist(&self) -> &ShufflePlaylist {
        &self.playlist
    }

    fn load_track(&mut self, track: u32) -> Option<StatusMessage> {
        let path = match self.resolver.resolve(track) {
            Ok(path) => path,
            Err(e) => {
                warn!("Player: {}", e);
                return None;
            }
        };

        if let Err(e) = self.output.start(&path) {
            warn!("Player: failed to start track {}: {}", track, e);
            return None;
        }

        self.state = PlaybackState::Playing;
        self.current_track = Some(track);
        self.saved_offset = Duration::ZERO;

        Some(StatusMessage::NowPlaying {
            track,
            is_paused: false,
        })
    }
}
