//! OS media controls surface (MPRIS/SMTC/Now Playing).
//!
//! Renders the persistent playback surface (track label, playing/paused
//! indicator) after every state change, and translates inbound OS media
//! control events into bus playback commands via `souvlaki`.

use std::sync::{Arc, Mutex};

use log::{info, warn};
use souvlaki::{MediaControlEvent, MediaControls, MediaMetadata, MediaPlayback, PlatformConfig};
use tokio::sync::broadcast::{Receiver, Sender};

use crate::protocol::{Message, PlaybackMessage, StatusMessage};

const SURFACE_DISPLAY_NAME: &str = "Shufflebox";
const SURFACE_DBUS_NAME: &str = "shufflebox";

/// Last playback state pushed to (or pending for) the OS surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ControlState {
    /// Loaded track number, `None` while idle.
    track: Option<u32>,
    is_paused: bool,
}

/// Handles OS media control events and renders app playback state.
pub struct MediaControlsManager {
    bus_consumer: Receiver<Message>,
    control_state: Arc<Mutex<ControlState>>,
    controls: Option<MediaControls>,
    last_published: Option<ControlState>,
}

impl MediaControlsManager {
    /// Creates a manager and attempts to initialize platform media controls.
    pub fn new(bus_consumer: Receiver<Message>, bus_producer: Sender<Message>) -> Self {
        let control_state = Arc::new(Mutex::new(ControlState::default()));
        let controls = Self::create_controls(bus_producer, Arc::clone(&control_state));

        Self {
            bus_consumer,
            control_state,
            controls,
            last_published: None,
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn create_controls(
        bus_producer: Sender<Message>,
        control_state: Arc<Mutex<ControlState>>,
    ) -> Option<MediaControls> {
        let mut controls = match MediaControls::new(PlatformConfig {
            display_name: SURFACE_DISPLAY_NAME,
            dbus_name: SURFACE_DBUS_NAME,
            hwnd: None,
        }) {
            Ok(controls) => controls,
            Err(err) => {
                warn!(
                    "MediaControlsManager: failed to create media controls backend: {:?}",
                    err
                );
                return None;
            }
        };

        if let Err(err) = controls.attach(move |event| {
            let snapshot = match control_state.lock() {
                Ok(state) => *state,
                Err(poisoned) => *poisoned.into_inner(),
            };

            if let Some(playback_message) = Self::map_control_event(event, snapshot) {
                let _ = bus_producer.send(Message::Playback(playback_message));
            }
        }) {
            warn!(
                "MediaControlsManager: failed to attach media controls handler: {:?}",
                err
            );
            return None;
        }

        Some(controls)
    }

    #[cfg(target_os = "windows")]
    fn create_controls(
        _bus_producer: Sender<Message>,
        _control_state: Arc<Mutex<ControlState>>,
    ) -> Option<MediaControls> {
        // Souvlaki requires an HWND on Windows, and a headless process has
        // no window to offer.
        warn!("MediaControlsManager: Windows media controls are disabled (no HWND available)");
        None
    }

    fn map_control_event(event: MediaControlEvent, state: ControlState) -> Option<PlaybackMessage> {
        match event {
            MediaControlEvent::Play => {
                if state.track.is_some() && state.is_paused {
                    Some(PlaybackMessage::PauseResume)
                } else {
                    Some(PlaybackMessage::Play)
                }
            }
            MediaControlEvent::Pause => {
                if state.track.is_some() && !state.is_paused {
                    Some(PlaybackMessage::PauseResume)
                } else {
                    None
                }
            }
            MediaControlEvent::Toggle => {
                if state.track.is_some() {
                    Some(PlaybackMessage::PauseResume)
                } else {
                    Some(PlaybackMessage::Play)
                }
            }
            MediaControlEvent::Next => Some(PlaybackMessage::Next),
            MediaControlEvent::Stop => Some(PlaybackMessage::Stop),
            MediaControlEvent::Previous
            | MediaControlEvent::Seek(_)
            | MediaControlEvent::SeekBy(_, _)
            | MediaControlEvent::SetPosition(_)
            | MediaControlEvent::SetVolume(_)
            | MediaControlEvent::OpenUri(_)
            | MediaControlEvent::Raise
            | MediaControlEvent::Quit => None,
        }
    }

    fn update_control_state(&self, next: ControlState) {
        match self.control_state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Pushes the current state to the OS surface, skipping redundant
    /// publishes.
    fn render_if_needed(&mut self, state: ControlState) {
        if self.last_published == Some(state) {
            return;
        }

        let Some(controls) = self.controls.as_mut() else {
            return;
        };

        let publish_result = if let Some(track) = state.track {
            let title = format!("Track {}", track);
            let playback = if state.is_paused {
                MediaPlayback::Paused { progress: None }
            } else {
                MediaPlayback::Playing { progress: None }
            };
            controls
                .set_metadata(MediaMetadata {
                    title: Some(title.as_str()),
                    artist: Some(SURFACE_DISPLAY_NAME),
                    album: None,
                    cover_url: None,
                    duration: None,
                })
                .and_then(|_| controls.set_playback(playback))
        } else {
            controls
                .set_metadata(MediaMetadata::default())
                .and_then(|_| controls.set_playback(MediaPlayback::Stopped))
        };

        if let Err(err) = publish_result {
            warn!("MediaControlsManager: failed to publish state: {:?}", err);
            return;
        }

        self.last_published = Some(state);
    }

    fn handle_message(&mut self, message: Message) {
        match message {
            Message::Status(StatusMessage::NowPlaying { track, is_paused }) => {
                let state = ControlState {
                    track: Some(track),
                    is_paused,
                };
                self.update_control_state(state);
                self.render_if_needed(state);
            }
            Message::Status(StatusMessage::Cleared) => {
                let state = ControlState::default();
                self.update_control_state(state);
                self.render_if_needed(state);
            }
            _ => {}
        }
    }

    /// Starts the blocking manager loop.
    pub fn run(&mut self) {
        info!("MediaControlsManager: started");
        loop {
            match self.bus_consumer.blocking_recv() {
                Ok(Message::Shutdown) => break,
                Ok(message) => self.handle_message(message),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("MediaControlsManager: bus lagged by {} messages", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("MediaControlsManager: stopped");
    }
}
