//! Audio Engine Module
//!
//! This module provides the concrete audio playback and recording services.
//! It is organized into sub-modules, each with a specific responsibility:
//!
//! - [`audio_stream`]: CPAL output stream management and real-time callback
//! - [`capture`]: microphone capture to WAV files
//! - [`constants`]: Configuration constants and limits
//! - [`errors`]: Audio-specific error types
//! - [`mixer`]: Real-time mixing engine
//! - [`sample_loader`]: Audio file loading and decoding
//! - [`slot_voice`]: the single sound a slot plays
//!
//! The main [`AudioEngine`] struct implements [`PlaybackService`] on top of
//! these: decoding happens on background threads, every other call is a
//! message pushed to the audio thread.

use crate::audio_engine::audio_stream::{AudioStreamHandle, create_audio_stream, start_stream};
use crate::audio_engine::constants::MAX_SLOTS;
use crate::audio_engine::sample_loader::decode_audio_file_to_sample_buffer;
use crate::errors::PlaybackError;
use crate::messages::{AudioMessage, ControlMessage, LoaderEvent, SoundParams};
use crate::playback::{LoadOptions, PlaybackService, SoundSource, SoundStatus};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;

mod audio_stream;
mod capture;
mod channels;
pub mod constants;
mod errors;
mod mixer;
mod sample_loader;
mod slot_voice;

pub use audio_stream::setup_logger;
pub use capture::CpalRecorder;
pub use errors::{SampleLoadError, StreamError};

/// AudioEngine drives a cpal output stream with one looping sound per slot.
pub struct AudioEngine {
    stream_handle: Option<AudioStreamHandle>,
    asset_root: PathBuf,
    loader_tx: Sender<LoaderEvent>,
    loader_rx: Receiver<LoaderEvent>,
    /// Last commanded state per slot, so status queries never touch the audio thread.
    status: [SoundStatus; MAX_SLOTS],
    pending: [Option<LoadOptions>; MAX_SLOTS],
}

impl AudioEngine {
    /// Create an engine resolving static assets against `asset_root`.
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        let (loader_tx, loader_rx) = std::sync::mpsc::channel();

        AudioEngine {
            stream_handle: None,
            asset_root: asset_root.into(),
            loader_tx,
            loader_rx,
            status: [SoundStatus::default(); MAX_SLOTS],
            pending: [None; MAX_SLOTS],
        }
    }

    /// Open the default output device and start the stream.
    pub fn run(&mut self) -> Result<(), StreamError> {
        if self.stream_handle.is_some() {
            return Ok(());
        }

        let handle = create_audio_stream()?;
        start_stream(&handle.stream)?;
        self.stream_handle = Some(handle);
        Ok(())
    }

    /// Shut down the output stream. Every slot is forgotten.
    pub fn shut_down(&mut self) {
        self.stream_handle = None;
        self.status = [SoundStatus::default(); MAX_SLOTS];
        self.pending = [None; MAX_SLOTS];
    }

    pub fn is_running(&self) -> bool {
        self.stream_handle.is_some()
    }

    fn check_id(id: usize) -> Result<(), PlaybackError> {
        if id >= MAX_SLOTS {
            return Err(PlaybackError::UnknownSlot(id));
        }
        Ok(())
    }

    fn send(&self, message: ControlMessage, what: &'static str) -> Result<(), PlaybackError> {
        let handle = self
            .stream_handle
            .as_ref()
            .ok_or(PlaybackError::NotRunning)?;

        let mut producer_guard = handle
            .producer
            .lock()
            .map_err(|_| PlaybackError::Poisoned("producer"))?;

        producer_guard
            .push(message)
            .map_err(|_| PlaybackError::QueueFull(what))
    }

    /// Drain messages from the audio thread into the status mirror.
    fn drain_audio_messages(&mut self) {
        let Some(handle) = self.stream_handle.as_mut() else {
            return;
        };

        while let Ok(message) = handle.consumer.pop() {
            match message {
                AudioMessage::Finished { id } => {
                    if let Some(status) = self.status.get_mut(id) {
                        status.playing = false;
                    }
                }
            }
        }
    }

    /// Run `apply` on the status mirror of a loaded slot after `message` was queued.
    ///
    /// Slots that hold no sound are a silent no-op.
    fn command(
        &mut self,
        id: usize,
        message: ControlMessage,
        what: &'static str,
        apply: impl FnOnce(&mut SoundStatus),
    ) -> Result<(), PlaybackError> {
        Self::check_id(id)?;
        if !self.status[id].loaded {
            return Ok(());
        }
        self.send(message, what)?;
        apply(&mut self.status[id]);
        Ok(())
    }
}

impl PlaybackService for AudioEngine {
    fn load(
        &mut self,
        id: usize,
        source: &SoundSource,
        options: LoadOptions,
    ) -> Result<(), PlaybackError> {
        Self::check_id(id)?;

        let handle = self
            .stream_handle
            .as_ref()
            .ok_or(PlaybackError::NotRunning)?;

        let loader_tx = self.loader_tx.clone();
        let producer = handle.producer.clone();
        let output_channels = handle.output_channels;
        let path = source.resolve(&self.asset_root);
        let origin = options.origin;
        self.pending[id] = Some(options);

        thread::spawn(move || {
            let _ = loader_tx.send(LoaderEvent::Started { id, origin });

            let sample = match decode_audio_file_to_sample_buffer(&path, output_channels) {
                Ok(sample) => sample,
                Err(SampleLoadError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                    let _ = loader_tx.send(LoaderEvent::Error {
                        id,
                        origin,
                        error: format!("File not found: {}", path.display()),
                    });
                    return;
                }
                Err(err) => {
                    let _ = loader_tx.send(LoaderEvent::Error {
                        id,
                        origin,
                        error: err.to_string(),
                    });
                    return;
                }
            };

            let duration_sec = sample.frames() as f32 / sample.sample_rate.max(1) as f32;

            let mut producer_guard = match producer.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    let _ = loader_tx.send(LoaderEvent::Error {
                        id,
                        origin,
                        error: "Failed to acquire producer lock".to_string(),
                    });
                    return;
                }
            };

            if producer_guard
                .push(ControlMessage::LoadSample {
                    id,
                    sample,
                    looping: options.looping,
                    volume: options.volume,
                })
                .is_err()
            {
                let _ = loader_tx.send(LoaderEvent::Error {
                    id,
                    origin,
                    error: "Failed to send LoadSample - buffer may be full".to_string(),
                });
                return;
            }

            let _ = loader_tx.send(LoaderEvent::Success {
                id,
                origin,
                duration_sec,
            });
        });

        Ok(())
    }

    fn poll_loader_event(&mut self) -> Option<LoaderEvent> {
        self.drain_audio_messages();

        let event = match self.loader_rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
        };

        match &event {
            LoaderEvent::Success { id, .. } => {
                if let Some(options) = self.pending.get_mut(*id).and_then(Option::take) {
                    self.status[*id] = SoundStatus {
                        loaded: true,
                        playing: false,
                        looping: options.looping,
                        params: SoundParams::new(1.0, options.volume),
                    };
                }
            }
            LoaderEvent::Error { id, .. } => {
                if let Some(pending) = self.pending.get_mut(*id) {
                    *pending = None;
                }
            }
            LoaderEvent::Started { .. } => {}
        }

        Some(event)
    }

    fn play(&mut self, id: usize) -> Result<(), PlaybackError> {
        Self::check_id(id)?;
        if self.status[id].playing {
            return Ok(());
        }
        self.command(id, ControlMessage::Play { id }, "Play", |s| {
            s.playing = true
        })
    }

    fn pause(&mut self, id: usize) -> Result<(), PlaybackError> {
        self.command(id, ControlMessage::Pause { id }, "Pause", |s| {
            s.playing = false
        })
    }

    fn stop(&mut self, id: usize) -> Result<(), PlaybackError> {
        self.command(id, ControlMessage::Stop { id }, "Stop", |s| {
            s.playing = false
        })
    }

    fn set_looping(&mut self, id: usize, looping: bool) -> Result<(), PlaybackError> {
        self.command(
            id,
            ControlMessage::SetLooping { id, looping },
            "SetLooping",
            |s| s.looping = looping,
        )
    }

    fn set_params(&mut self, id: usize, params: SoundParams) -> Result<(), PlaybackError> {
        if params.correct_pitch {
            return Err(PlaybackError::PitchCorrectionUnsupported);
        }
        self.command(
            id,
            ControlMessage::SetParams { id, params },
            "SetParams",
            |s| s.params = params,
        )
    }

    fn set_rate(
        &mut self,
        id: usize,
        rate: f32,
        correct_pitch: bool,
    ) -> Result<(), PlaybackError> {
        if correct_pitch {
            return Err(PlaybackError::PitchCorrectionUnsupported);
        }
        self.command(id, ControlMessage::SetRate { id, rate }, "SetRate", |s| {
            s.params.rate = rate
        })
    }

    fn set_volume(&mut self, id: usize, volume: f32) -> Result<(), PlaybackError> {
        self.command(
            id,
            ControlMessage::SetVolume { id, volume },
            "SetVolume",
            |s| s.params.volume = volume,
        )
    }

    fn status(&self, id: usize) -> SoundStatus {
        self.status.get(id).copied().unwrap_or_default()
    }

    fn unload(&mut self, id: usize) -> Result<(), PlaybackError> {
        self.command(id, ControlMessage::Unload { id }, "Unload", |s| {
            *s = SoundStatus::default()
        })
    }
}
