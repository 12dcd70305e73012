//! Contract of the audio playback service the orchestrator drives.
//!
//! Every call is non-blocking. Loads complete in the background and report
//! through [`PlaybackService::poll_loader_event`]; everything else is queued to
//! the audio thread in call order.

use std::path::{Path, PathBuf};

use crate::errors::PlaybackError;
use crate::messages::{LoaderEvent, SoundParams, SourceOrigin};

/// Where a sound comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// Static asset shipped with the instrument, relative to the asset root.
    Asset(&'static str),
    /// File on disk (imported or recorded).
    File(PathBuf),
}

impl SoundSource {
    /// Resolve to a filesystem path, assets relative to `asset_root`.
    pub fn resolve(&self, asset_root: &Path) -> PathBuf {
        match self {
            SoundSource::Asset(name) => asset_root.join(name),
            SoundSource::File(path) => path.clone(),
        }
    }
}

/// Initial state of a freshly loaded sound. Sounds always load paused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    pub looping: bool,
    pub volume: f32,
    pub origin: SourceOrigin,
}

/// Snapshot of a slot's sound as last commanded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoundStatus {
    pub loaded: bool,
    pub playing: bool,
    pub looping: bool,
    pub params: SoundParams,
}

pub trait PlaybackService {
    /// Start loading `source` into slot `id` in the background.
    fn load(
        &mut self,
        id: usize,
        source: &SoundSource,
        options: LoadOptions,
    ) -> Result<(), PlaybackError>;

    /// Next completed (or failed) background load, if any.
    fn poll_loader_event(&mut self) -> Option<LoaderEvent>;

    fn play(&mut self, id: usize) -> Result<(), PlaybackError>;

    fn pause(&mut self, id: usize) -> Result<(), PlaybackError>;

    /// Pause and rewind to the start.
    fn stop(&mut self, id: usize) -> Result<(), PlaybackError>;

    fn set_looping(&mut self, id: usize, looping: bool) -> Result<(), PlaybackError>;

    /// Rate, volume and pitch-correction applied as one update.
    fn set_params(&mut self, id: usize, params: SoundParams) -> Result<(), PlaybackError>;

    fn set_rate(&mut self, id: usize, rate: f32, correct_pitch: bool)
    -> Result<(), PlaybackError>;

    fn set_volume(&mut self, id: usize, volume: f32) -> Result<(), PlaybackError>;

    fn status(&self, id: usize) -> SoundStatus;

    /// Stop and release the sound held by slot `id`.
    fn unload(&mut self, id: usize) -> Result<(), PlaybackError>;
}
