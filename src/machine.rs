//! Slot state machine.
//!
//! [`SlotMachine::apply`] is a reducer: it takes one [`SlotEvent`], updates the
//! per-slot lifecycles and the active selection, and returns the playback
//! [`Command`]s and the [`Feedback`] the transition calls for. It never talks to
//! the audio service itself, so every rule here is testable without hardware.
//!
//! Lifecycles:
//!
//! ```text
//!            double tap              double tap
//!   IDLE ───────────────▶ HOLD ───────────────▶ IDLE
//!    │ ▲ single tap        ▲ single tap keeps HOLD
//!    ▼ │ another slot      │
//!   ACTIVE ────────────────┘ double tap
//!
//!   EMPTY ──tap (mic)──▶ RECORDING ──tap, saved, loaded──▶ IDLE
//!   EMPTY ──tap (user), picked, loaded──────────────────▶ IDLE
//!   IDLE/ACTIVE/HOLD ──long press (user, mic)──▶ EMPTY
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_VOLUME_FACTOR;
use crate::feedback::{Feedback, HapticKind, StatusCode};
use crate::messages::SourceOrigin;
use crate::slots::{SlotCategory, SlotRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Empty,
    Idle,
    Active,
    Hold,
    Recording,
}

impl Lifecycle {
    /// Whether the slot holds a playable sound.
    pub fn is_loaded(self) -> bool {
        matches!(self, Lifecycle::Idle | Lifecycle::Active | Lifecycle::Hold)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotRuntime {
    pub lifecycle: Lifecycle,
    /// In `[0, 1]`; survives stops and reloads.
    pub volume_factor: f32,
    last_tap: Option<Duration>,
    /// A recording or import is in flight; taps are ignored until it settles.
    busy: bool,
}

impl Default for SlotRuntime {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::Empty,
            volume_factor: DEFAULT_VOLUME_FACTOR,
            last_tap: None,
            busy: false,
        }
    }
}

impl SlotRuntime {
    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotEvent {
    /// Slot pressed at `at`, measured on a monotonic clock.
    Tap { slot: usize, at: Duration },
    LongPress { slot: usize },
    KillAll,
    /// Fader moved; applies to the active slot.
    SetVolumeFactor { value: f32 },
    SourceLoaded { slot: usize, origin: SourceOrigin },
    SourceFailed { slot: usize, origin: SourceOrigin },
    RecordingStarted { slot: usize },
    /// Starting or finalizing the take failed.
    RecordingFailed { slot: usize },
    RecordingSaved { slot: usize, path: PathBuf },
    FilePicked { slot: usize, path: PathBuf },
    PickCancelled { slot: usize },
    PickFailed { slot: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Enable looping and start playing.
    Loop { slot: usize },
    /// Stop, rewind and reset rate to neutral and volume to `volume`.
    StopAndReset { slot: usize, volume: f32 },
    Pause { slot: usize },
    /// Stop and reset every listed slot.
    ResetAll { volumes: Vec<(usize, f32)> },
    Unload { slot: usize },
    LoadFile {
        slot: usize,
        path: PathBuf,
        origin: SourceOrigin,
    },
    SetVolume { slot: usize, volume: f32 },
    BeginRecording { slot: usize },
    FinishRecording { slot: usize },
    OpenPicker { slot: usize },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transition {
    pub commands: Vec<Command>,
    pub feedback: Option<Feedback>,
}

impl Transition {
    fn none() -> Self {
        Self::default()
    }

    fn with(commands: Vec<Command>, feedback: Feedback) -> Self {
        Self {
            commands,
            feedback: Some(feedback),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.feedback.is_none()
    }
}

pub struct SlotMachine {
    registry: SlotRegistry,
    slots: Vec<SlotRuntime>,
    active: Option<usize>,
    double_tap_window: Duration,
}

impl SlotMachine {
    /// Every slot starts EMPTY; static slots become IDLE once preloaded.
    pub fn new(registry: SlotRegistry, double_tap_window: Duration) -> Self {
        let slots = vec![SlotRuntime::default(); registry.len()];
        Self {
            registry,
            slots,
            active: None,
            double_tap_window,
        }
    }

    pub fn registry(&self) -> &SlotRegistry {
        &self.registry
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn runtime(&self, slot: usize) -> Option<&SlotRuntime> {
        self.slots.get(slot)
    }

    pub fn lifecycle(&self, slot: usize) -> Option<Lifecycle> {
        self.slots.get(slot).map(|s| s.lifecycle)
    }

    /// `base_volume * volume_factor`.
    pub fn effective_volume(&self, slot: usize) -> f32 {
        match (self.registry.get(slot), self.slots.get(slot)) {
            (Some(desc), Some(state)) => desc.base_volume * state.volume_factor,
            _ => 0.0,
        }
    }

    pub fn apply(&mut self, event: SlotEvent) -> Transition {
        match event {
            SlotEvent::Tap { slot, at } => self.tap(slot, at),
            SlotEvent::LongPress { slot } => self.long_press(slot),
            SlotEvent::KillAll => self.kill_all(),
            SlotEvent::SetVolumeFactor { value } => self.set_volume_factor(value),
            SlotEvent::SourceLoaded { slot, origin } => self.source_loaded(slot, origin),
            SlotEvent::SourceFailed { slot, origin } => self.source_failed(slot, origin),
            SlotEvent::RecordingStarted { slot } => self.settle(slot, |state| {
                state.lifecycle = Lifecycle::Recording;
                Transition::with(
                    vec![],
                    Feedback::new(StatusCode::Recording, HapticKind::Warning),
                )
            }),
            SlotEvent::RecordingFailed { slot } => self.settle(slot, |state| {
                state.lifecycle = Lifecycle::Empty;
                Transition::with(vec![], Feedback::error())
            }),
            SlotEvent::RecordingSaved { slot, path } => {
                if self.slots.get(slot).is_none() {
                    return Transition::none();
                }
                Transition {
                    commands: vec![Command::LoadFile {
                        slot,
                        path,
                        origin: SourceOrigin::Recording,
                    }],
                    feedback: None,
                }
            }
            SlotEvent::FilePicked { slot, path } => {
                let Some(state) = self.slots.get(slot) else {
                    return Transition::none();
                };
                let mut commands = Vec::new();
                if state.lifecycle.is_loaded() {
                    commands.push(Command::Unload { slot });
                }
                commands.push(Command::LoadFile {
                    slot,
                    path,
                    origin: SourceOrigin::Import,
                });
                Transition::with(commands, Feedback::status(StatusCode::Loading))
            }
            SlotEvent::PickCancelled { slot } => self.settle(slot, |_| Transition::none()),
            SlotEvent::PickFailed { slot } => {
                self.settle(slot, |_| Transition::with(vec![], Feedback::error()))
            }
        }
    }

    /// Clear the busy flag of `slot` and run `f` on it.
    fn settle(
        &mut self,
        slot: usize,
        f: impl FnOnce(&mut SlotRuntime) -> Transition,
    ) -> Transition {
        match self.slots.get_mut(slot) {
            Some(state) => {
                state.busy = false;
                f(state)
            }
            None => Transition::none(),
        }
    }

    fn tap(&mut self, slot: usize, at: Duration) -> Transition {
        let Some(desc) = self.registry.get(slot) else {
            return Transition::none();
        };
        let (category, label, base_volume) = (desc.category, desc.label, desc.base_volume);
        let window = self.double_tap_window;

        let state = &mut self.slots[slot];
        if state.busy {
            return Transition::none();
        }

        let double = state
            .last_tap
            .is_some_and(|prev| at >= prev && at - prev < window);
        // Acquisition taps do not open a double-tap window.
        state.last_tap = match state.lifecycle {
            Lifecycle::Empty | Lifecycle::Recording => None,
            _ => Some(at),
        };

        match state.lifecycle {
            Lifecycle::Empty => match category {
                SlotCategory::Mic => {
                    state.busy = true;
                    Transition {
                        commands: vec![Command::BeginRecording { slot }],
                        feedback: None,
                    }
                }
                SlotCategory::User => {
                    state.busy = true;
                    Transition {
                        commands: vec![Command::OpenPicker { slot }],
                        feedback: None,
                    }
                }
                // Static slot whose preload failed.
                SlotCategory::Instrument | SlotCategory::Base => Transition::none(),
            },

            Lifecycle::Recording => {
                state.busy = true;
                Transition::with(
                    vec![Command::FinishRecording { slot }],
                    Feedback::status(StatusCode::Saving),
                )
            }

            Lifecycle::Hold if double => {
                state.lifecycle = Lifecycle::Idle;
                let volume = base_volume * state.volume_factor;
                if self.active == Some(slot) {
                    self.active = None;
                }
                Transition::with(
                    vec![Command::StopAndReset { slot, volume }],
                    Feedback::new(StatusCode::Stopped, HapticKind::Success),
                )
            }

            Lifecycle::Idle | Lifecycle::Active if double => {
                state.lifecycle = Lifecycle::Hold;
                let mut commands = self.select(slot);
                commands.push(Command::Loop { slot });
                Transition::with(
                    commands,
                    Feedback::new(StatusCode::Locked, HapticKind::Success),
                )
            }

            Lifecycle::Idle | Lifecycle::Active | Lifecycle::Hold => {
                if state.lifecycle != Lifecycle::Hold {
                    state.lifecycle = Lifecycle::Active;
                }
                let commands = self.select(slot);
                Transition::with(
                    commands,
                    Feedback::new(StatusCode::Slot(label), HapticKind::ImpactMedium),
                )
            }
        }
    }

    /// Make `slot` the active one, demoting any other ACTIVE slot to IDLE.
    fn select(&mut self, slot: usize) -> Vec<Command> {
        self.active = Some(slot);

        let mut commands = Vec::new();
        for (other, state) in self.slots.iter_mut().enumerate() {
            if other != slot && state.lifecycle == Lifecycle::Active {
                state.lifecycle = Lifecycle::Idle;
                commands.push(Command::Pause { slot: other });
            }
        }
        commands
    }

    fn long_press(&mut self, slot: usize) -> Transition {
        let Some(category) = self.registry.get(slot).map(|d| d.category) else {
            return Transition::none();
        };
        let haptic = match category {
            SlotCategory::User => HapticKind::ImpactHeavy,
            SlotCategory::Mic => HapticKind::ImpactMedium,
            SlotCategory::Instrument | SlotCategory::Base => return Transition::none(),
        };

        let state = &mut self.slots[slot];
        if state.busy || !state.lifecycle.is_loaded() {
            return Transition::none();
        }

        state.lifecycle = Lifecycle::Empty;
        if self.active == Some(slot) {
            self.active = None;
        }
        Transition::with(
            vec![Command::Unload { slot }],
            Feedback::new(StatusCode::Cleared, haptic),
        )
    }

    fn kill_all(&mut self) -> Transition {
        let mut volumes = Vec::new();
        for (slot, state) in self.slots.iter_mut().enumerate() {
            if matches!(state.lifecycle, Lifecycle::Active | Lifecycle::Hold) {
                state.lifecycle = Lifecycle::Idle;
            }
            if state.lifecycle.is_loaded() {
                let base = self.registry.get(slot).map_or(0.0, |d| d.base_volume);
                volumes.push((slot, base * state.volume_factor));
            }
        }
        self.active = None;

        Transition::with(
            vec![Command::ResetAll { volumes }],
            Feedback::new(StatusCode::Killed, HapticKind::Error),
        )
    }

    fn set_volume_factor(&mut self, value: f32) -> Transition {
        if value.is_nan() {
            return Transition::none();
        }
        let Some(slot) = self.active else {
            return Transition::none();
        };

        self.slots[slot].volume_factor = value.clamp(0.0, 1.0);
        let volume = self.effective_volume(slot);
        Transition {
            commands: vec![Command::SetVolume { slot, volume }],
            feedback: None,
        }
    }

    fn source_loaded(&mut self, slot: usize, origin: SourceOrigin) -> Transition {
        self.settle(slot, |state| {
            state.lifecycle = Lifecycle::Idle;
            match origin {
                SourceOrigin::Preload => Transition::none(),
                SourceOrigin::Import => Transition::with(
                    vec![],
                    Feedback::new(StatusCode::UserReady, HapticKind::Success),
                ),
                SourceOrigin::Recording => Transition::with(
                    vec![],
                    Feedback::new(StatusCode::MicReady, HapticKind::Success),
                ),
            }
        })
    }

    fn source_failed(&mut self, slot: usize, origin: SourceOrigin) -> Transition {
        let transition = self.settle(slot, |state| {
            state.lifecycle = Lifecycle::Empty;
            match origin {
                SourceOrigin::Preload => Transition::none(),
                SourceOrigin::Import | SourceOrigin::Recording => {
                    Transition::with(vec![], Feedback::error())
                }
            }
        });
        if self.active == Some(slot) {
            self.active = None;
        }
        transition
    }
}
