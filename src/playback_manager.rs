//! Playback manager loop.
//!
//! Owns the playback state machine and is the only component that mutates
//! it. Consumes playback commands from the bus, publishes status updates
//! for the surface, and polls the output for track completion between
//! messages. Completion re-enters through the bus as `TrackFinished`, so it
//! is serialized with every other control signal.

use std::thread;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::broadcast::{error::TryRecvError, Receiver, Sender};

use crate::audio::AudioOutput;
use crate::player::Player;
use crate::protocol::{Message, PlaybackMessage};
use crate::resolver::TrackResolver;

const POLL_INTERVAL_MS: u64 = 50;

pub struct PlaybackManager<R, O> {
    player: Player<R, O>,
    bus_consumer: Receiver<Message>,
    bus_producer: Sender<Message>,
    completion_announced: bool,
}

impl<R: TrackResolver, O: AudioOutput> PlaybackManager<R, O> {
    pub fn new(
        track_count: u32,
        resolver: R,
        output: O,
        bus_consumer: Receiver<Message>,
        bus_producer: Sender<Message>,
    ) -> Self {
        Self {
            player: Player::new(track_count, resolver, output),
            bus_consumer,
            bus_producer,
            completion_announced: false,
        }
    }

    /// Starts the blocking manager loop. Returns on `Shutdown` or when the
    /// bus closes; the output handle is released when the manager drops.
    pub fn run(&mut self) {
        info!("PlaybackManager: started");
        loop {
            match self.bus_consumer.try_recv() {
                Ok(Message::Playback(command)) => self.apply(command),
                Ok(Message::Shutdown) => break,
                Ok(_) => {}
                Err(TryRecvError::Empty) => {
                    self.announce_completion_if_needed();
                    thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("PlaybackManager: bus lagged by {} messages", skipped);
                }
                Err(TryRecvError::Closed) => break,
            }
        }
        info!("PlaybackManager: stopped");
    }

    fn apply(&mut self, command: PlaybackMessage) {
        if let Some(status) = self.player.handle(command) {
            self.completion_announced = false;
            let _ = self.bus_producer.send(Message::Status(status));
        }
    }

    /// Emits `TrackFinished` once per completed track. The flag stops the
    /// poll from flooding the bus while the message is still in flight,
    /// and stays latched until some transition succeeds, so a completed
    /// track whose successor fails to load is not retried.
    fn announce_completion_if_needed(&mut self) {
        if self.completion_announced || !self.player.finished_current_track() {
            return;
        }
        self.completion_announced = true;
        let _ = self
            .bus_producer
            .send(Message::Playback(PlaybackMessage::TrackFinished));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::fakes::{FakeOutput, FakeResolver};
    use crate::protocol::StatusMessage;
    use std::thread::JoinHandle;
    use std::time::Instant;
    use tokio::sync::broadcast;

    struct PlaybackManagerHarness {
        bus_sender: Sender<Message>,
        receiver: Receiver<Message>,
        resolver: FakeResolver,
        output: FakeOutput,
        manager_thread: JoinHandle<()>,
    }

    impl PlaybackManagerHarness {
        fn new() -> Self {
            let (bus_sender, _) = broadcast::channel(4096);
            let manager_bus_sender = bus_sender.clone();
            let manager_receiver = bus_sender.subscribe();
            let resolver = FakeResolver::default();
            let manager_resolver = resolver.clone();
            let output = FakeOutput::default();
            let manager_output = output.clone();

            let manager_thread = thread::spawn(move || {
                let mut manager = PlaybackManager::new(
                    30,
                    manager_resolver,
                    manager_output,
                    manager_receiver,
                    manager_bus_sender,
                );
                manager.run();
            });

            let receiver = bus_sender.subscribe();
            Self {
                bus_sender,
                receiver,
                resolver,
                output,
                manager_thread,
            }
        }

        fn send(&self, message: Message) {
            self.bus_sender
                .send(message)
                .expect("failed to send message to bus");
        }

        fn shutdown(self) {
            self.send(Message::Shutdown);
            self.manager_thread
                .join()
                .expect("manager thread panicked");
        }
    }

    fn wait_for_message<F>(
        receiver: &mut Receiver<Message>,
        timeout: Duration,
        mut predicate: F,
    ) -> Message
    where
        F: FnMut(&Message) -> bool,
    {
        let start = Instant::now();
        loop {
            if start.elapsed() > timeout {
                panic!("timed out waiting for expected message");
            }
            match receiver.try_recv() {
                Ok(message) => {
                    if predicate(&message) {
                        return message;
                    }
                }
                Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(5)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Closed) => panic!("bus closed while waiting for message"),
            }
        }
    }

    fn assert_no_message<F>(receiver: &mut Receiver<Message>, window: Duration, mut predicate: F)
    where
        F: FnMut(&Message) -> bool,
    {
        let start = Instant::now();
        while start.elapsed() < window {
            match receiver.try_recv() {
                Ok(message) => {
                    if predicate(&message) {
                        panic!("received message that must not appear: {:?}", message);
                    }
                }
                Err(TryRecvError::Empty) => thread::sleep(Duration::from_millis(5)),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Closed) => return,
            }
        }
    }

    #[test]
    fn test_play_emits_now_playing_status() {
        let mut harness = PlaybackManagerHarness::new();

        harness.send(Message::Playback(PlaybackMessage::Play));

        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(
                message,
                Message::Status(StatusMessage::NowPlaying {
                    is_paused: false,
                    ..
                })
            )
        });
        assert_eq!(harness.output.lock().started.len(), 1);

        harness.shutdown();
    }

    #[test]
    fn test_pause_resume_round_trip_keeps_track() {
        let mut harness = PlaybackManagerHarness::new();

        harness.send(Message::Playback(PlaybackMessage::Play));
        let started = wait_for_message(
            &mut harness.receiver,
            Duration::from_secs(1),
            |message| matches!(message, Message::Status(StatusMessage::NowPlaying { .. })),
        );
        let Message::Status(StatusMessage::NowPlaying { track, .. }) = started else {
            panic!("expected NowPlaying status");
        };

        harness.send(Message::Playback(PlaybackMessage::PauseResume));
        wait_for_message(
            &mut harness.receiver,
            Duration::from_secs(1),
            |message| {
                matches!(
                    message,
                    Message::Status(StatusMessage::NowPlaying {
                        track: paused_track,
                        is_paused: true,
                    }) if *paused_track == track
                )
            },
        );

        harness.send(Message::Playback(PlaybackMessage::PauseResume));
        wait_for_message(
            &mut harness.receiver,
            Duration::from_secs(1),
            |message| {
                matches!(
                    message,
                    Message::Status(StatusMessage::NowPlaying {
                        track: resumed_track,
                        is_paused: false,
                    }) if *resumed_track == track
                )
            },
        );

        harness.shutdown();
    }

    #[test]
    fn test_stop_emits_cleared() {
        let mut harness = PlaybackManagerHarness::new();

        harness.send(Message::Playback(PlaybackMessage::Play));
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(message, Message::Status(StatusMessage::NowPlaying { .. }))
        });

        harness.send(Message::Playback(PlaybackMessage::Stop));
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(message, Message::Status(StatusMessage::Cleared))
        });
        assert!(harness.output.lock().released);

        harness.shutdown();
    }

    #[test]
    fn test_completion_auto_advances_to_next_track() {
        let mut harness = PlaybackManagerHarness::new();

        harness.send(Message::Playback(PlaybackMessage::Play));
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(message, Message::Status(StatusMessage::NowPlaying { .. }))
        });

        harness.output.lock().finished = true;

        // The completion poll announces TrackFinished on the bus...
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(
                message,
                Message::Playback(PlaybackMessage::TrackFinished)
            )
        });
        // ...and handling it starts the next track without intervention.
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(
                message,
                Message::Status(StatusMessage::NowPlaying {
                    is_paused: false,
                    ..
                })
            )
        });
        assert_eq!(harness.output.lock().started.len(), 2);

        harness.shutdown();
    }

    #[test]
    fn test_completion_with_unresolvable_next_is_not_retried() {
        use std::sync::atomic::Ordering;

        let mut harness = PlaybackManagerHarness::new();

        harness.send(Message::Playback(PlaybackMessage::Play));
        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(message, Message::Status(StatusMessage::NowPlaying { .. }))
        });

        // The track runs out, but its successor cannot be resolved.
        harness.resolver.unavailable.store(true, Ordering::Relaxed);
        harness.output.lock().finished = true;

        wait_for_message(&mut harness.receiver, Duration::from_secs(1), |message| {
            matches!(message, Message::Playback(PlaybackMessage::TrackFinished))
        });

        // The failed advance must not be announced again on later polls.
        assert_no_message(
            &mut harness.receiver,
            Duration::from_millis(300),
            |message| matches!(message, Message::Playback(PlaybackMessage::TrackFinished)),
        );
        assert_eq!(harness.output.lock().started.len(), 1);

        harness.shutdown();
    }

    #[test]
    fn test_shutdown_terminates_manager_loop() {
        let harness = PlaybackManagerHarness::new();
        harness.shutdown();
    }
}
