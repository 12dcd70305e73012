//! Message definitions for communication between the event loop and the audio thread.
//!
//! This module defines the enums that serve as the wire format for messages passed through the
//! ring buffers between the control side and the real-time audio thread, plus the events that
//! background loaders report back to the event loop.

use std::sync::Arc;

/// Immutable, pre-decoded interleaved audio shared with the audio thread.
#[derive(Debug, Clone)]
pub(crate) struct SampleBuffer {
    pub channels: usize,
    /// Sample rate the buffer was decoded at; the mixer folds the ratio to the
    /// output rate into the playback step.
    pub sample_rate: u32,
    pub samples: Arc<[f32]>,
}

impl SampleBuffer {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Playback parameters applied as one atomic update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundParams {
    /// Playback speed multiplier; also shifts pitch unless `correct_pitch` is set.
    pub rate: f32,
    /// Linear volume (0.0 to 1.0).
    pub volume: f32,
    pub correct_pitch: bool,
}

impl SoundParams {
    pub fn new(rate: f32, volume: f32) -> Self {
        Self {
            rate,
            volume,
            correct_pitch: false,
        }
    }
}

impl Default for SoundParams {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Message that is emitted from the audio thread.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioMessage {
    /// A non-looping sound reached its end and stopped by itself.
    Finished { id: usize },
}

/// Message that is emitted from the control side.
#[derive(Debug, Clone)]
pub(crate) enum ControlMessage {
    /// Publish a loaded sample into a slot, paused, with its initial parameters.
    ///
    /// Replaces whatever the slot held before.
    LoadSample {
        id: usize,
        sample: SampleBuffer,
        looping: bool,
        volume: f32,
    },

    /// Start or resume playback from the current position.
    Play { id: usize },

    /// Pause playback, keeping the current position.
    Pause { id: usize },

    /// Stop playback and rewind to the start.
    Stop { id: usize },

    /// Enable or disable looping for a slot.
    SetLooping { id: usize, looping: bool },

    /// Set rate and volume together.
    SetParams { id: usize, params: SoundParams },

    /// Set playback rate only.
    SetRate { id: usize, rate: f32 },

    /// Set volume only.
    SetVolume { id: usize, volume: f32 },

    /// Stop and drop the sample held by a slot.
    Unload { id: usize },
}

/// Where a load request came from, carried through the loader so the event
/// loop knows which transition a completion drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceOrigin {
    /// Static asset preloaded at startup.
    Preload,
    /// File chosen through the file picker.
    Import,
    /// File produced by a microphone recording.
    Recording,
}

/// Events emitted from background loading.
#[derive(Debug, Clone, PartialEq)]
pub enum LoaderEvent {
    /// Loading started for the given slot id.
    Started { id: usize, origin: SourceOrigin },

    /// Loading completed and the sample was published to the audio thread.
    Success {
        id: usize,
        origin: SourceOrigin,
        duration_sec: f32,
    },

    /// Loading failed.
    Error {
        id: usize,
        origin: SourceOrigin,
        error: String,
    },
}

