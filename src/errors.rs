//! Error types for the instrument core and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by an audio playback service.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("audio engine not running")]
    NotRunning,

    #[error("slot {0} is out of range")]
    UnknownSlot(usize),

    #[error("command queue full, dropped {0}")]
    QueueFull(&'static str),

    #[error("pitch-corrected playback is not supported")]
    PitchCorrectionUnsupported,

    #[error("failed to acquire {0} lock")]
    Poisoned(&'static str),
}

/// Errors raised while capturing from the microphone.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("no audio input device found")]
    NoDevice,

    #[error("a recording session is already open")]
    SessionBusy,

    #[error("no recording session is open")]
    NoSession,

    #[error("audio session is not configured for recording")]
    PlaybackOnlySession,

    #[error("failed to open input stream: {0}")]
    Stream(String),

    #[error("failed to encode recording: {0}")]
    Encoder(#[from] hound::Error),

    #[error("recording i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a file picker. Cancellation is not an error.
#[derive(Debug, Error)]
pub enum PickError {
    #[error("file access permission denied")]
    PermissionDenied,

    #[error("not an audio file: {0}")]
    NotAudio(PathBuf),

    #[error("picked file does not exist: {0}")]
    Missing(PathBuf),
}

/// Errors raised by the ambient light sensor.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("light sensor permission denied")]
    PermissionDenied,

    #[error("no ambient light sensor available")]
    Unavailable,

    #[error("light sensor already has a subscriber")]
    AlreadySubscribed,

    #[error("light sensor i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: String,
}

impl ConfigError {
    pub(crate) fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}
