//! Default audio backend built on rodio.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use log::debug;
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink};

use super::{AudioOutput, OutputError};

/// Plays one track at a time through the default output device.
///
/// The device stream is opened once; the sink is recreated per track so
/// each track gets a fresh handle.
pub struct RodioOutput {
    stream: OutputStream,
    sink: Option<Sink>,
}

impl RodioOutput {
    pub fn new() -> Result<Self, OutputError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| OutputError::Device(e.to_string()))?;

        Ok(RodioOutput { stream, sink: None })
    }
}

impl AudioOutput for RodioOutput {
    fn start(&mut self, path: &Path) -> Result<(), OutputError> {
        // Release the previous track's handle before loading a fresh one.
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }

        let file = File::open(path)?;
        let source = Decoder::try_from(file).map_err(|e| OutputError::Decode(e.to_string()))?;

        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        sink.play();
        self.sink = Some(sink);

        debug!("RodioOutput: started {:?}", path);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn resume(&mut self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn position(&self) -> Duration {
        self.sink
            .as_ref()
            .map(|sink| sink.get_pos())
            .unwrap_or_default()
    }

    fn is_finished(&self) -> bool {
        self.sink.as_ref().map(|sink| sink.empty()).unwrap_or(false)
    }
}
