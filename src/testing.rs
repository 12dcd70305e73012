//! Test doubles for the collaborators.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::acquisition::{FilePicker, PickOutcome, RecordingService, SessionMode};
use crate::audio_engine::constants::MAX_SLOTS;
use crate::errors::{CaptureError, PickError, PlaybackError};
use crate::feedback::{FeedbackSink, HapticKind, StatusCode};
use crate::messages::{LoaderEvent, SoundParams};
use crate::playback::{LoadOptions, PlaybackService, SoundSource, SoundStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(usize, SoundSource),
    Play(usize),
    Pause(usize),
    Stop(usize),
    SetLooping(usize, bool),
    SetParams(usize, SoundParams),
    SetRate(usize, f32),
    SetVolume(usize, f32),
    Unload(usize),
}

/// Playback service that completes loads on the next poll.
pub struct FakePlayback {
    pub calls: Vec<Call>,
    /// Every call on this slot fails with `QueueFull`.
    pub fail_slot: Option<usize>,
    failing_sources: Vec<SoundSource>,
    status: [SoundStatus; MAX_SLOTS],
    pending: VecDeque<(usize, SoundSource, LoadOptions)>,
}

impl Default for FakePlayback {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            fail_slot: None,
            failing_sources: Vec::new(),
            status: [SoundStatus::default(); MAX_SLOTS],
            pending: VecDeque::new(),
        }
    }
}

impl FakePlayback {
    /// Loads of `source` will report an error.
    pub fn fail_source(&mut self, source: SoundSource) {
        self.failing_sources.push(source);
    }

    pub fn unload_count(&self, slot: usize) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == Call::Unload(slot))
            .count()
    }

    pub fn count(&self, wanted: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|call| wanted(call)).count()
    }

    fn record(&mut self, slot: usize, call: Call) -> Result<(), PlaybackError> {
        if slot >= MAX_SLOTS {
            return Err(PlaybackError::UnknownSlot(slot));
        }
        self.calls.push(call);
        if self.fail_slot == Some(slot) {
            return Err(PlaybackError::QueueFull("fake"));
        }
        Ok(())
    }

    fn loaded(&mut self, slot: usize) -> Option<&mut SoundStatus> {
        self.status.get_mut(slot).filter(|status| status.loaded)
    }
}

impl PlaybackService for FakePlayback {
    fn load(
        &mut self,
        id: usize,
        source: &SoundSource,
        options: LoadOptions,
    ) -> Result<(), PlaybackError> {
        self.record(id, Call::Load(id, source.clone()))?;
        self.pending.push_back((id, source.clone(), options));
        Ok(())
    }

    fn poll_loader_event(&mut self) -> Option<LoaderEvent> {
        let (id, source, options) = self.pending.pop_front()?;
        if self.failing_sources.contains(&source) {
            return Some(LoaderEvent::Error {
                id,
                origin: options.origin,
                error: "decode failed".to_string(),
            });
        }
        self.status[id] = SoundStatus {
            loaded: true,
            playing: false,
            looping: options.looping,
            params: SoundParams::new(1.0, options.volume),
        };
        Some(LoaderEvent::Success {
            id,
            origin: options.origin,
            duration_sec: 1.0,
        })
    }

    fn play(&mut self, id: usize) -> Result<(), PlaybackError> {
        self.record(id, Call::Play(id))?;
        if let Some(status) = self.loaded(id) {
            status.playing = true;
        }
        Ok(())
    }

    fn pause(&mut self, id: usize) -> Result<(), PlaybackError> {
        self.record(id, Call::Pause(id))?;
        if let Some(status) = self.loaded(id) {
            status.playing = false;
        }
        Ok(())
    }

    fn stop(&mut self, id: usize) -> Result<(), PlaybackError> {
        self.record(id, Call::Stop(id))?;
        if let Some(status) = self.loaded(id) {
            status.playing = false;
        }
        Ok(())
    }

    fn set_looping(&mut self, id: usize, looping: bool) -> Result<(), PlaybackError> {
        self.record(id, Call::SetLooping(id, looping))?;
        if let Some(status) = self.loaded(id) {
            status.looping = looping;
        }
        Ok(())
    }

    fn set_params(&mut self, id: usize, params: SoundParams) -> Result<(), PlaybackError> {
        self.record(id, Call::SetParams(id, params))?;
        if let Some(status) = self.loaded(id) {
            status.params = params;
        }
        Ok(())
    }

    fn set_rate(
        &mut self,
        id: usize,
        rate: f32,
        correct_pitch: bool,
    ) -> Result<(), PlaybackError> {
        self.record(id, Call::SetRate(id, rate))?;
        if let Some(status) = self.loaded(id) {
            status.params.rate = rate;
            status.params.correct_pitch = correct_pitch;
        }
        Ok(())
    }

    fn set_volume(&mut self, id: usize, volume: f32) -> Result<(), PlaybackError> {
        self.record(id, Call::SetVolume(id, volume))?;
        if let Some(status) = self.loaded(id) {
            status.params.volume = volume;
        }
        Ok(())
    }

    fn status(&self, id: usize) -> SoundStatus {
        self.status.get(id).copied().unwrap_or_default()
    }

    fn unload(&mut self, id: usize) -> Result<(), PlaybackError> {
        self.record(id, Call::Unload(id))?;
        self.status[id] = SoundStatus::default();
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecorderScript {
    pub deny_start: bool,
    pub fail_finish: bool,
    /// Switching back to playback-only fails.
    pub deny_playback_restore: bool,
    /// Real file created on start and returned by finish; `take.wav` otherwise.
    pub take: Option<PathBuf>,
}

/// Recording service driven by a script instead of a microphone.
pub struct ScriptedRecorder {
    script: RecorderScript,
    mode: SessionMode,
    recording: bool,
}

impl ScriptedRecorder {
    pub fn new(script: RecorderScript) -> Self {
        Self {
            script,
            mode: SessionMode::PlaybackOnly,
            recording: false,
        }
    }

    fn discard(&self) {
        if let Some(take) = &self.script.take {
            let _ = std::fs::remove_file(take);
        }
    }
}

impl RecordingService for ScriptedRecorder {
    fn configure_session(&mut self, mode: SessionMode) -> Result<(), CaptureError> {
        if mode == SessionMode::PlaybackOnly && self.script.deny_playback_restore {
            return Err(CaptureError::Stream("session locked".to_string()));
        }
        self.mode = mode;
        Ok(())
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        if self.recording {
            return Err(CaptureError::SessionBusy);
        }
        if self.script.deny_start {
            return Err(CaptureError::PermissionDenied);
        }
        if self.mode != SessionMode::PlayAndRecord {
            return Err(CaptureError::PlaybackOnlySession);
        }
        if let Some(take) = &self.script.take {
            std::fs::write(take, b"RIFF")?;
        }
        self.recording = true;
        Ok(())
    }

    fn finish(&mut self) -> Result<PathBuf, CaptureError> {
        if !self.recording {
            return Err(CaptureError::NoSession);
        }
        self.recording = false;
        if self.script.fail_finish {
            self.discard();
            return Err(CaptureError::Stream("encoder stalled".to_string()));
        }
        Ok(self
            .script
            .take
            .clone()
            .unwrap_or_else(|| PathBuf::from("take.wav")))
    }

    fn abort(&mut self) {
        if self.recording {
            self.discard();
        }
        self.recording = false;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }
}

/// File picker answering from a fixed list of outcomes.
#[derive(Default)]
pub struct ScriptedPicker {
    answers: VecDeque<Result<PickOutcome, PickError>>,
}

impl ScriptedPicker {
    pub fn new(answers: Vec<Result<PickOutcome, PickError>>) -> Self {
        Self {
            answers: answers.into(),
        }
    }
}

impl FilePicker for ScriptedPicker {
    fn pick_audio(&mut self) -> Result<PickOutcome, PickError> {
        self.answers
            .pop_front()
            .unwrap_or(Ok(PickOutcome::Cancelled))
    }
}

/// Feedback sink that keeps everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub status_log: Vec<StatusCode>,
    pub haptics: Vec<HapticKind>,
}

impl RecordingSink {
    pub fn statuses(&self) -> Vec<String> {
        self.status_log.iter().map(ToString::to_string).collect()
    }
}

impl FeedbackSink for RecordingSink {
    fn status(&mut self, status: &StatusCode) {
        self.status_log.push(status.clone());
    }

    fn haptic(&mut self, kind: HapticKind) {
        self.haptics.push(kind);
    }
}

/// Clonable handle to a [`RecordingSink`], so a test can read what an owner
/// of the boxed sink emitted.
#[derive(Debug, Default, Clone)]
pub struct SharedSink(pub std::rc::Rc<std::cell::RefCell<RecordingSink>>);

impl FeedbackSink for SharedSink {
    fn status(&mut self, status: &StatusCode) {
        self.0.borrow_mut().status(status);
    }

    fn haptic(&mut self, kind: HapticKind) {
        self.0.borrow_mut().haptic(kind);
    }
}
