//! Acquisition of new audio for the `user` and `mic` slots.
//!
//! [`AcquisitionController`] owns the recording service and the file picker.
//! It keeps the microphone exclusive and flips the audio session between
//! playback-only and play-and-record around a take. Loading the resulting
//! file into the slot is left to the orchestrator.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::errors::{CaptureError, PickError};

/// Audio session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    PlaybackOnly,
    PlayAndRecord,
}

pub trait RecordingService {
    /// Reconfigure the audio session; input capture needs `PlayAndRecord`.
    fn configure_session(&mut self, mode: SessionMode) -> Result<(), CaptureError>;

    /// Open a capture session. Fails with `SessionBusy` if one is open.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Move captured audio from the real-time side to the file.
    fn pump(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Close the session and return the finalized file.
    ///
    /// The session is closed even on error, and a failed finish leaves no
    /// file behind.
    fn finish(&mut self) -> Result<PathBuf, CaptureError>;

    /// Drop an open session without producing a file.
    fn abort(&mut self);

    fn is_recording(&self) -> bool;
}

/// Outcome of a pick. Cancellation is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Cancelled,
    Picked(PathBuf),
}

pub trait FilePicker {
    /// Ask for a single audio file.
    fn pick_audio(&mut self) -> Result<PickOutcome, PickError>;
}

/// Extensions of the formats the decoder handles.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "wav", "wave", "mp3", "flac", "ogg", "oga", "m4a", "aac", "mp4", "aif", "aiff", "caf",
];

/// Whether `path` names a file of an audio type the decoder can open.
pub fn is_audio_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// File picker fed by the host (drag and drop, a dialog, a command line).
///
/// Each [`pick_audio`](FilePicker::pick_audio) consumes one offered path; an
/// empty queue means the user cancelled.
#[derive(Debug, Default)]
pub struct QueuedPicker {
    offered: VecDeque<PathBuf>,
}

impl QueuedPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, path: impl Into<PathBuf>) {
        self.offered.push_back(path.into());
    }
}

impl FilePicker for QueuedPicker {
    fn pick_audio(&mut self) -> Result<PickOutcome, PickError> {
        let Some(path) = self.offered.pop_front() else {
            return Ok(PickOutcome::Cancelled);
        };

        if !is_audio_path(&path) {
            return Err(PickError::NotAudio(path));
        }

        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(PickOutcome::Picked(path)),
            Ok(_) => Err(PickError::NotAudio(path)),
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(PickError::PermissionDenied)
            }
            Err(_) => Err(PickError::Missing(path)),
        }
    }
}

pub struct AcquisitionController {
    recorder: Box<dyn RecordingService>,
    picker: Box<dyn FilePicker>,
    mode: SessionMode,
}

impl AcquisitionController {
    pub fn new(recorder: Box<dyn RecordingService>, picker: Box<dyn FilePicker>) -> Self {
        Self {
            recorder,
            picker,
            mode: SessionMode::PlaybackOnly,
        }
    }

    pub fn session_mode(&self) -> SessionMode {
        self.mode
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    fn set_mode(&mut self, mode: SessionMode) -> Result<(), CaptureError> {
        if self.mode != mode {
            self.recorder.configure_session(mode)?;
            self.mode = mode;
        }
        Ok(())
    }

    /// Open a recording session.
    ///
    /// On any failure the session is put back to playback-only, so a failed
    /// start leaves nothing behind.
    pub fn begin_recording(&mut self) -> Result<(), CaptureError> {
        if self.recorder.is_recording() {
            return Err(CaptureError::SessionBusy);
        }

        let started = self
            .set_mode(SessionMode::PlayAndRecord)
            .and_then(|()| self.recorder.start());

        if let Err(err) = started {
            self.recorder.abort();
            self.restore_playback();
            return Err(err);
        }

        log::info!("Recording started");
        Ok(())
    }

    /// Close the session, returning the captured file.
    ///
    /// The session goes back to playback-only whether or not finalizing worked.
    pub fn finish_recording(&mut self) -> Result<PathBuf, CaptureError> {
        if !self.recorder.is_recording() {
            return Err(CaptureError::NoSession);
        }

        let finished = self.recorder.finish();
        if finished.is_err() {
            self.recorder.abort();
        }
        let restored = self.set_mode(SessionMode::PlaybackOnly);

        let path = finished?;
        if let Err(err) = restored {
            // The take is only kept if the whole stop succeeded.
            if let Err(remove_err) = std::fs::remove_file(&path) {
                log::debug!("Could not remove take {}: {}", path.display(), remove_err);
            }
            return Err(err);
        }
        log::info!("Recording saved to {}", path.display());
        Ok(path)
    }

    /// Forward captured audio to disk; a failure aborts the take.
    pub fn pump(&mut self) -> Result<(), CaptureError> {
        if !self.recorder.is_recording() {
            return Ok(());
        }
        if let Err(err) = self.recorder.pump() {
            self.recorder.abort();
            self.restore_playback();
            return Err(err);
        }
        Ok(())
    }

    fn restore_playback(&mut self) {
        if let Err(err) = self.set_mode(SessionMode::PlaybackOnly) {
            log::warn!("Failed to restore playback-only session: {err}");
        }
    }

    /// Ask the picker for an audio file; `Ok(None)` when the user cancelled.
    pub fn pick_audio(&mut self) -> Result<Option<PathBuf>, PickError> {
        match self.picker.pick_audio()? {
            PickOutcome::Cancelled => Ok(None),
            PickOutcome::Picked(path) => Ok(Some(path)),
        }
    }
}
