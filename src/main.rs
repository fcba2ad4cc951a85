mod audio;
mod config;
mod media_controls;
mod playback_manager;
mod player;
mod playlist;
mod protocol;
mod resolver;

use std::io::BufRead;
use std::thread;

use audio::RodioOutput;
use config::{sanitize_config, Config};
use log::{info, warn};
use media_controls::MediaControlsManager;
use playback_manager::PlaybackManager;
use protocol::{Message, PlaybackMessage};
use resolver::FileTrackResolver;
use tokio::sync::broadcast;

fn parse_console_command(line: &str) -> Option<Message> {
    match line.trim().to_ascii_lowercase().as_str() {
        "play" | "p" => Some(Message::Playback(PlaybackMessage::Play)),
        "pause" | "resume" => Some(Message::Playback(PlaybackMessage::PauseResume)),
        "next" | "n" => Some(Message::Playback(PlaybackMessage::Next)),
        "stop" | "s" => Some(Message::Playback(PlaybackMessage::Stop)),
        "quit" | "q" | "exit" => Some(Message::Shutdown),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut clog = colog::default_builder();
    clog.filter(None, log::LevelFilter::Info);
    clog.init();

    std::panic::set_hook(Box::new(|panic_info| {
        let current_thread = std::thread::current();
        let thread_name = current_thread.name().unwrap_or("unnamed");
        log::error!("panic in thread '{}': {}", thread_name, panic_info);
    }));

    let config_dir = dirs::config_dir().ok_or("could not determine config directory")?;
    let config_file = config_dir.join("shufflebox.toml");

    if !config_file.exists() {
        let default_config = Config::default();

        info!(
            "Config file not found. Creating default config. path={}",
            config_file.display()
        );
        std::fs::write(&config_file, toml::to_string(&default_config)?)?;
    }

    let config_content = std::fs::read_to_string(&config_file)?;
    let config = sanitize_config(toml::from_str::<Config>(&config_content).unwrap_or_default());

    info!(
        "Starting with {} tracks from {}",
        config.library.track_count,
        config.library.tracks_dir.display()
    );

    // Bus for communication between components
    let (bus_sender, _) = broadcast::channel(1024);

    // Setup PlaybackManager. The output is opened on the playback thread:
    // the device stream handle is not Send.
    let playback_bus_sender = bus_sender.clone();
    let playback_bus_receiver = bus_sender.subscribe();
    let tracks_dir = config.library.tracks_dir.clone();
    let track_count = config.library.track_count;
    let playback_thread = thread::spawn(move || {
        let resolver = FileTrackResolver::new(&tracks_dir);
        let output = match RodioOutput::new() {
            Ok(output) => output,
            Err(err) => {
                log::error!("Failed to open audio output: {}", err);
                return;
            }
        };
        let mut playback_manager = PlaybackManager::new(
            track_count,
            resolver,
            output,
            playback_bus_receiver,
            playback_bus_sender,
        );
        playback_manager.run();
    });

    // Setup media controls surface
    let controls_bus_sender = bus_sender.clone();
    let controls_bus_receiver = bus_sender.subscribe();
    let controls_thread = thread::spawn(move || {
        let mut media_controls_manager =
            MediaControlsManager::new(controls_bus_receiver, controls_bus_sender);
        media_controls_manager.run();
    });

    info!("Commands: play, pause, next, stop, quit");

    // Console control loop standing in for the host UI.
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        match parse_console_command(&line) {
            Some(Message::Shutdown) => break,
            Some(message) => {
                let _ = bus_sender.send(message);
            }
            None => {
                if !line.trim().is_empty() {
                    warn!("Unknown command: {}", line.trim());
                }
            }
        }
    }

    let _ = bus_sender.send(Message::Shutdown);
    playback_thread.join().map_err(|_| "playback manager thread panicked")?;
    controls_thread.join().map_err(|_| "media controls thread panicked")?;

    info!("Application exiting");
    Ok(())
}
