//! The instrument: a single-threaded event loop over the slot machine, the
//! pad, the fader and the light sensor.
//!
//! The host feeds [`InputEvent`]s to [`KaossPad::handle`] and calls
//! [`KaossPad::pump`] regularly to collect finished loads, captured audio and
//! light samples. Every handler runs to completion before the next one, and
//! every failure stops at the handler: it is logged and shows up as `ERR`.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use crate::acquisition::AcquisitionController;
use crate::arbitration::{RateArbiter, RateSource};
use crate::config::PadConfig;
use crate::control::{PadGeometry, PointerState, fader_level, fader_readout};
use crate::errors::{CaptureError, ConfigError, PickError, SensorError};
use crate::feedback::{Feedback, FeedbackSink, HapticKind, StatusCode};
use crate::light::{LightConditioner, LightReading, light_rate};
use crate::machine::{Command, Lifecycle, SlotEvent, SlotMachine};
use crate::orchestrator::PlaybackOrchestrator;
use crate::playback::PlaybackService;
use crate::sensor::{LightSample, LightSensor, SensorSubscription};
use crate::slots::SlotRegistry;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    SlotTap { slot: usize, at: Instant },
    SlotLongPress { slot: usize },
    /// Pad touched at `(x, y)`, in points.
    PadDown { x: f32, y: f32, at: Instant },
    PadMove { x: f32, y: f32, at: Instant },
    PadUp,
    /// Fader dragged to `x` points from its left edge.
    Fader { x: f32 },
    KillAll,
    SetSensorActive(bool),
}

// Field order matters: the subscription must stop before the receiver goes.
struct LightInput {
    _subscription: SensorSubscription,
    samples: Receiver<LightSample>,
}

pub struct KaossPad<P: PlaybackService> {
    config: PadConfig,
    machine: SlotMachine,
    orchestrator: PlaybackOrchestrator<P>,
    acquisition: AcquisitionController,
    feedback: Box<dyn FeedbackSink>,
    geometry: PadGeometry,
    pointer: PointerState,
    conditioner: LightConditioner,
    arbiter: RateArbiter,
    sensor: Option<Box<dyn LightSensor>>,
    light: Option<LightInput>,
    last_status: StatusCode,
    epoch: Instant,
}

impl<P: PlaybackService> KaossPad<P> {
    pub fn new(
        config: PadConfig,
        registry: SlotRegistry,
        playback: P,
        acquisition: AcquisitionController,
        feedback: Box<dyn FeedbackSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let geometry = PadGeometry::from_config(&config);
        Ok(Self {
            machine: SlotMachine::new(registry, config.double_tap_window),
            orchestrator: PlaybackOrchestrator::new(playback),
            acquisition,
            feedback,
            geometry,
            pointer: PointerState::centered(&geometry),
            conditioner: LightConditioner::new(config.light_alpha, config.light_normalization),
            arbiter: RateArbiter::new(config.arbitration),
            sensor: None,
            light: None,
            last_status: StatusCode::Ready,
            epoch: Instant::now(),
            config,
        })
    }

    pub fn with_light_sensor(mut self, sensor: Box<dyn LightSensor>) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// Queue the static sounds for loading and show `RDY`.
    pub fn start(&mut self) {
        self.orchestrator.preload(self.machine.registry());
        self.emit(&Feedback::status(StatusCode::Ready));
    }

    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::SlotTap { slot, at } => {
                let at = self.elapsed(at);
                self.dispatch(SlotEvent::Tap { slot, at });
            }
            InputEvent::SlotLongPress { slot } => self.dispatch(SlotEvent::LongPress { slot }),
            InputEvent::PadDown { x, y, at } => self.pad_down(x, y, at),
            InputEvent::PadMove { x, y, at } => {
                if self.pointer.move_to(&self.geometry, x, y) {
                    self.modulate_from_pad(at);
                }
            }
            InputEvent::PadUp => self.pad_up(),
            InputEvent::Fader { x } => {
                let value = fader_level(x, self.config.fader_width);
                self.dispatch(SlotEvent::SetVolumeFactor { value });
            }
            InputEvent::KillAll => self.dispatch(SlotEvent::KillAll),
            InputEvent::SetSensorActive(true) => self.start_light(),
            InputEvent::SetSensorActive(false) => self.stop_light(),
        }
    }

    /// Process everything that completed since the last call.
    pub fn pump(&mut self) {
        while let Some(event) = self.orchestrator.poll() {
            self.dispatch(event);
        }

        if let Err(err) = self.acquisition.pump() {
            log::warn!("Recording aborted: {err}");
            if let Some(slot) = self.recording_slot() {
                self.dispatch(SlotEvent::RecordingFailed { slot });
            }
        }

        let samples: Vec<LightSample> = match &self.light {
            Some(light) => light.samples.try_iter().collect(),
            None => Vec::new(),
        };
        for sample in samples {
            self.on_light_sample(sample);
        }
    }

    /// Stop the sensor, close any open take and release every sound.
    pub fn shutdown(&mut self) {
        self.stop_light();
        if self.acquisition.is_recording() {
            if let Err(err) = self.acquisition.finish_recording() {
                log::warn!("Failed to close recording on shutdown: {err}");
            }
        }
        self.orchestrator.shutdown();
    }

    pub fn last_status(&self) -> &StatusCode {
        &self.last_status
    }

    pub fn active_slot(&self) -> Option<usize> {
        self.machine.active()
    }

    pub fn lifecycle(&self, slot: usize) -> Option<Lifecycle> {
        self.machine.lifecycle(slot)
    }

    pub fn slot_index(&self, id: &str) -> Option<usize> {
        self.machine.registry().index_of(id)
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn machine(&self) -> &SlotMachine {
        &self.machine
    }

    pub fn orchestrator(&self) -> &PlaybackOrchestrator<P> {
        &self.orchestrator
    }

    pub fn is_sensor_active(&self) -> bool {
        self.light.is_some()
    }

    /// Latest conditioned light reading while the sensor is on.
    pub fn light_reading(&self) -> Option<LightReading> {
        self.light.as_ref().and_then(|_| self.conditioner.current())
    }

    pub fn fader_readout(&self) -> String {
        match self.machine.active() {
            Some(slot) => {
                let label = self.machine.registry().get(slot).map(|d| d.label);
                let factor = self
                    .machine
                    .runtime(slot)
                    .map_or(1.0, |state| state.volume_factor);
                fader_readout(label, factor)
            }
            None => fader_readout(None, 0.0),
        }
    }

    fn elapsed(&self, at: Instant) -> Duration {
        at.saturating_duration_since(self.epoch)
    }

    fn emit(&mut self, feedback: &Feedback) {
        self.last_status = feedback.status.clone();
        self.feedback.emit(feedback);
    }

    fn fail(&mut self, what: &str, err: &dyn std::fmt::Display) {
        log::warn!("{what} failed: {err}");
        self.emit(&Feedback::error());
    }

    /// Run `event` and every event its commands produce through the machine.
    fn dispatch(&mut self, event: SlotEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let active_before = self.machine.active();
            let transition = self.machine.apply(event);
            if self.machine.active() != active_before {
                self.arbiter.reset();
            }

            if let Some(feedback) = &transition.feedback {
                self.emit(feedback);
            }
            for command in transition.commands {
                if let Some(follow_up) = self.execute(command) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn execute(&mut self, command: Command) -> Option<SlotEvent> {
        let result = match command {
            Command::Loop { slot } => self.orchestrator.hold(slot),
            Command::StopAndReset { slot, volume } => {
                self.orchestrator.stop_and_reset(slot, volume)
            }
            Command::Pause { slot } => self.orchestrator.pause(slot),
            Command::ResetAll { volumes } => self.orchestrator.reset_all(&volumes),
            Command::Unload { slot } => self.orchestrator.unload(slot),
            Command::SetVolume { slot, volume } => self.orchestrator.set_volume(slot, volume),
            Command::LoadFile { slot, path, origin } => {
                let volume = self.machine.effective_volume(slot);
                if let Err(err) = self.orchestrator.load_file(slot, path, volume, origin) {
                    log::warn!("Failed to queue load for slot {slot}: {err}");
                    return Some(SlotEvent::SourceFailed { slot, origin });
                }
                Ok(())
            }
            Command::BeginRecording { slot } => {
                return Some(match self.acquisition.begin_recording() {
                    Ok(()) => SlotEvent::RecordingStarted { slot },
                    Err(err) => {
                        log_capture_error(&err);
                        SlotEvent::RecordingFailed { slot }
                    }
                });
            }
            Command::FinishRecording { slot } => {
                return Some(match self.acquisition.finish_recording() {
                    Ok(path) => SlotEvent::RecordingSaved { slot, path },
                    Err(err) => {
                        log_capture_error(&err);
                        SlotEvent::RecordingFailed { slot }
                    }
                });
            }
            Command::OpenPicker { slot } => {
                return Some(match self.acquisition.pick_audio() {
                    Ok(Some(path)) => SlotEvent::FilePicked { slot, path },
                    Ok(None) => SlotEvent::PickCancelled { slot },
                    Err(PickError::PermissionDenied) => {
                        log::info!("File access denied, import disabled");
                        SlotEvent::PickFailed { slot }
                    }
                    Err(err) => {
                        log::warn!("Import failed: {err}");
                        SlotEvent::PickFailed { slot }
                    }
                });
            }
        };

        if let Err(err) = result {
            self.fail("Playback command", &err);
        }
        None
    }

    fn recording_slot(&self) -> Option<usize> {
        self.machine
            .registry()
            .iter()
            .map(|(slot, _)| slot)
            .find(|&slot| self.machine.lifecycle(slot) == Some(Lifecycle::Recording))
    }

    fn pad_down(&mut self, x: f32, y: f32, at: Instant) {
        self.pointer.press(&self.geometry, x, y);
        self.feedback.haptic(HapticKind::ImpactHeavy);

        let Some(slot) = self.machine.active() else {
            return;
        };
        if let Err(err) = self.orchestrator.play(slot) {
            self.fail("Resume", &err);
            return;
        }
        self.modulate_from_pad(at);
    }

    fn pad_up(&mut self) {
        self.pointer.release();

        let Some(slot) = self.machine.active() else {
            return;
        };
        if self.machine.lifecycle(slot) == Some(Lifecycle::Hold) {
            return;
        }
        if let Err(err) = self.orchestrator.pause(slot) {
            self.fail("Pause", &err);
        }
    }

    fn modulate_from_pad(&mut self, at: Instant) {
        let Some(slot) = self.machine.active() else {
            return;
        };
        let at = self.elapsed(at);
        if !self
            .arbiter
            .admit(RateSource::Pad, at, self.pointer.pressed, self.light.is_some())
        {
            return;
        }

        let rate = self.geometry.rate_at(self.pointer.x, self.pointer.y);
        let volume = self.machine.effective_volume(slot);
        if let Err(err) = self.orchestrator.apply_modulation(slot, rate, volume) {
            self.fail("Pad modulation", &err);
        }
    }

    fn start_light(&mut self) {
        if self.light.is_some() {
            return;
        }
        let Some(sensor) = self.sensor.as_mut() else {
            log::info!("No light sensor, theremin disabled");
            return;
        };

        sensor.set_update_interval(self.config.sensor_interval);
        let (tx, samples) = mpsc::channel();
        match sensor.subscribe(tx) {
            Ok(subscription) => {
                self.conditioner.reset();
                self.light = Some(LightInput {
                    _subscription: subscription,
                    samples,
                });
            }
            Err(SensorError::PermissionDenied) => {
                log::info!("Light sensor permission denied, theremin disabled");
            }
            Err(err) => log::warn!("Light sensor unavailable: {err}"),
        }
    }

    /// Joins the poll thread; samples still queued go with the receiver.
    fn stop_light(&mut self) {
        self.light = None;
        self.conditioner.reset();
    }

    fn on_light_sample(&mut self, sample: LightSample) {
        let Some(reading) = self.conditioner.push(sample.lux) else {
            return;
        };
        let Some(slot) = self.machine.active() else {
            return;
        };

        let at = self.elapsed(sample.at);
        if !self
            .arbiter
            .admit(RateSource::Light, at, self.pointer.pressed, true)
        {
            return;
        }
        if let Err(err) = self.orchestrator.set_rate(slot, light_rate(reading.level)) {
            self.fail("Light modulation", &err);
        }
    }
}

fn log_capture_error(err: &CaptureError) {
    match err {
        CaptureError::PermissionDenied => log::info!("Microphone permission denied"),
        other => log::warn!("Recording failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::PickOutcome;
    use crate::config::ArbitrationPolicy;
    use crate::playback::SoundSource;
    use crate::sensor::PolledLightSensor;
    use crate::testing::{
        Call, FakePlayback, RecorderScript, ScriptedPicker, ScriptedRecorder, SharedSink,
    };
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    const S1: usize = 0;
    const S2: usize = 1;
    const B2: usize = 4;
    const U1: usize = 6;
    const R1: usize = 7;
    const EPS: f32 = 1e-5;

    struct Rig {
        pad: KaossPad<FakePlayback>,
        sink: SharedSink,
        t0: Instant,
    }

    impl Rig {
        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn tap(&mut self, slot: usize, ms: u64) {
            let at = self.at(ms);
            self.pad.handle(InputEvent::SlotTap { slot, at });
            self.pad.pump();
        }

        fn status(&self) -> String {
            self.pad.last_status().to_string()
        }

        fn sound(&self, slot: usize) -> crate::playback::SoundStatus {
            self.pad.orchestrator().status(slot)
        }

        fn calls(&self) -> &[Call] {
            &self.pad.orchestrator().service().calls
        }
    }

    fn rig_with(
        config: PadConfig,
        playback: FakePlayback,
        recorder: RecorderScript,
        picks: Vec<Result<PickOutcome, PickError>>,
    ) -> Rig {
        rig_with_sensor(config, playback, recorder, picks, None)
    }

    fn rig_with_sensor(
        config: PadConfig,
        playback: FakePlayback,
        recorder: RecorderScript,
        picks: Vec<Result<PickOutcome, PickError>>,
        sensor: Option<Box<dyn LightSensor>>,
    ) -> Rig {
        let sink = SharedSink::default();
        let acquisition = AcquisitionController::new(
            Box::new(ScriptedRecorder::new(recorder)),
            Box::new(ScriptedPicker::new(picks)),
        );
        let mut pad = KaossPad::new(
            config,
            SlotRegistry::default_catalog(),
            playback,
            acquisition,
            Box::new(sink.clone()),
        )
        .unwrap();
        if let Some(sensor) = sensor {
            pad = pad.with_light_sensor(sensor);
        }
        pad.start();
        pad.pump();
        Rig {
            pad,
            sink,
            t0: Instant::now(),
        }
    }

    fn rig() -> Rig {
        rig_with(
            PadConfig::default(),
            FakePlayback::default(),
            RecorderScript::default(),
            vec![],
        )
    }

    #[test]
    fn test_startup() {
        let rig = rig();
        assert_eq!(rig.status(), "RDY");
        for slot in 0..6 {
            assert_eq!(rig.pad.lifecycle(slot), Some(Lifecycle::Idle));
        }
        assert_eq!(rig.pad.lifecycle(U1), Some(Lifecycle::Empty));
        assert_eq!(rig.pad.lifecycle(R1), Some(Lifecycle::Empty));
        assert_eq!(rig.pad.fader_readout(), "SELECT CH");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PadConfig {
            light_alpha: 2.0,
            ..PadConfig::default()
        };
        let acquisition = AcquisitionController::new(
            Box::new(ScriptedRecorder::new(RecorderScript::default())),
            Box::new(ScriptedPicker::default()),
        );
        let result = KaossPad::new(
            config,
            SlotRegistry::default_catalog(),
            FakePlayback::default(),
            acquisition,
            Box::new(SharedSink::default()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_performance_scenario() {
        let mut rig = rig();

        // Select s1.
        rig.tap(S1, 1000);
        assert_eq!(rig.pad.lifecycle(S1), Some(Lifecycle::Active));
        assert_eq!(rig.status(), "CICCIO");
        assert_eq!(rig.pad.fader_readout(), "CICCIO VOL: 100%");

        // Drag to the top-left corner.
        let t = rig.at(1100);
        rig.pad.handle(InputEvent::PadDown {
            x: 170.0,
            y: 170.0,
            at: t,
        });
        assert!(rig.sound(S1).playing);
        assert!((rig.sound(S1).params.rate - 1.0).abs() < EPS);

        let t = rig.at(1150);
        rig.pad.handle(InputEvent::PadMove {
            x: 0.0,
            y: 0.0,
            at: t,
        });
        let sound = rig.sound(S1);
        assert!((sound.params.rate - 0.6).abs() < EPS);
        assert_eq!(sound.params.volume, 1.0);
        assert!(!sound.params.correct_pitch);

        // Release: not held, so it pauses.
        rig.pad.handle(InputEvent::PadUp);
        assert!(!rig.sound(S1).playing);

        // Double tap: hold and loop.
        rig.tap(S1, 2000);
        rig.tap(S1, 2200);
        assert_eq!(rig.pad.lifecycle(S1), Some(Lifecycle::Hold));
        assert_eq!(rig.status(), "LCK");
        let sound = rig.sound(S1);
        assert!(sound.playing && sound.looping);

        // Pad release does not stop a held slot.
        let t = rig.at(2300);
        rig.pad.handle(InputEvent::PadDown { x: 300.0, y: 30.0, at: t });
        rig.pad.handle(InputEvent::PadUp);
        assert!(rig.sound(S1).playing);

        // Select b2; s1 keeps looping.
        rig.tap(B2, 3000);
        assert_eq!(rig.pad.active_slot(), Some(B2));
        assert_eq!(rig.pad.lifecycle(B2), Some(Lifecycle::Active));
        assert_eq!(rig.pad.lifecycle(S1), Some(Lifecycle::Hold));
        assert!(rig.sound(S1).playing);

        let t = rig.at(3100);
        rig.pad.handle(InputEvent::PadDown { x: 315.0, y: 315.0, at: t });
        assert!((rig.sound(B2).params.rate - 1.4).abs() < EPS);
        assert!(rig.sound(B2).playing);

        // Kill all.
        rig.pad.handle(InputEvent::KillAll);
        assert_eq!(rig.status(), "KLL");
        assert_eq!(rig.pad.active_slot(), None);
        for slot in [S1, B2] {
            assert_eq!(rig.pad.lifecycle(slot), Some(Lifecycle::Idle));
            let sound = rig.sound(slot);
            assert!(!sound.playing);
            assert_eq!(sound.params.rate, 1.0);
            assert_eq!(sound.params.volume, 1.0);
        }
        for slot in 0..6 {
            assert_eq!(rig.sound(slot).params.rate, 1.0);
        }

        let haptics = rig.sink.0.borrow().haptics.clone();
        assert_eq!(haptics.last(), Some(&HapticKind::Error));
        assert!(haptics.contains(&HapticKind::ImpactHeavy));
        assert!(haptics.contains(&HapticKind::Success));
    }

    #[test]
    fn test_pad_without_active_slot_is_inert() {
        let mut rig = rig();
        let before = rig.calls().len();
        let t = rig.at(10);
        rig.pad.handle(InputEvent::PadDown { x: 10.0, y: 10.0, at: t });
        rig.pad.handle(InputEvent::PadMove { x: 20.0, y: 20.0, at: t });
        rig.pad.handle(InputEvent::PadUp);
        assert_eq!(rig.calls().len(), before);
        assert!(!rig.pad.pointer().pressed);
    }

    #[test]
    fn test_nan_fader_keeps_volume() {
        let mut rig = rig();
        rig.tap(S2, 1000);
        rig.pad.handle(InputEvent::Fader { x: 85.0 });
        let before = rig.calls().len();

        rig.pad.handle(InputEvent::Fader { x: f32::NAN });
        assert_eq!(rig.calls().len(), before);
        assert_eq!(rig.pad.fader_readout(), "BRASS VOL: 25%");
        assert!((rig.sound(S2).params.volume - 0.25).abs() < EPS);
    }

    #[test]
    fn test_fader_sets_active_volume() {
        let mut rig = rig();
        rig.pad.handle(InputEvent::Fader { x: 100.0 });
        assert_eq!(rig.pad.fader_readout(), "SELECT CH");

        rig.tap(S2, 1000);
        rig.pad.handle(InputEvent::Fader { x: 85.0 });
        assert_eq!(rig.pad.fader_readout(), "BRASS VOL: 25%");
        assert!((rig.sound(S2).params.volume - 0.25).abs() < EPS);

        // Pad updates keep the fader volume.
        let t = rig.at(1100);
        rig.pad.handle(InputEvent::PadDown { x: 170.0, y: 170.0, at: t });
        assert!((rig.sound(S2).params.volume - 0.25).abs() < EPS);

        // The factor persists across a hold release.
        rig.tap(S2, 2000);
        rig.tap(S2, 2100);
        rig.tap(S2, 3000);
        rig.tap(S2, 3100);
        assert_eq!(rig.pad.lifecycle(S2), Some(Lifecycle::Idle));
        assert!((rig.sound(S2).params.volume - 0.25).abs() < EPS);
    }

    #[test]
    fn test_failed_preload_slot_stays_silent() {
        let mut playback = FakePlayback::default();
        playback.fail_source(SoundSource::Asset("disto.mp3"));
        let mut rig = rig_with(
            PadConfig::default(),
            playback,
            RecorderScript::default(),
            vec![],
        );

        assert_eq!(rig.pad.lifecycle(2), Some(Lifecycle::Empty));
        assert_eq!(rig.status(), "RDY");

        rig.tap(2, 1000);
        rig.tap(2, 1100);
        assert_eq!(rig.pad.lifecycle(2), Some(Lifecycle::Empty));
        assert_eq!(rig.pad.active_slot(), None);
    }

    #[test]
    fn test_mic_recording() {
        let mut rig = rig();

        rig.tap(R1, 1000);
        assert_eq!(rig.pad.lifecycle(R1), Some(Lifecycle::Recording));
        assert_eq!(rig.status(), "REC");

        rig.tap(R1, 4000);
        assert_eq!(rig.pad.lifecycle(R1), Some(Lifecycle::Idle));
        assert_eq!(rig.status(), "MIC");
        assert!(rig.pad.orchestrator().is_pooled(R1));
        assert!(rig.calls().contains(&Call::Load(
            R1,
            SoundSource::File(PathBuf::from("take.wav"))
        )));
        let statuses = rig.sink.0.borrow().statuses();
        assert!(statuses.ends_with(&["REC".to_string(), "SAV".to_string(), "MIC".to_string()]));

        // Long press clears it again.
        rig.pad.handle(InputEvent::SlotLongPress { slot: R1 });
        assert_eq!(rig.pad.lifecycle(R1), Some(Lifecycle::Empty));
        assert_eq!(rig.status(), "CLR");
        assert_eq!(rig.pad.orchestrator().service().unload_count(R1), 1);
    }

    #[test]
    fn test_denied_microphone() {
        let mut rig = rig_with(
            PadConfig::default(),
            FakePlayback::default(),
            RecorderScript {
                deny_start: true,
                ..RecorderScript::default()
            },
            vec![],
        );
        rig.tap(R1, 1000);
        assert_eq!(rig.pad.lifecycle(R1), Some(Lifecycle::Empty));
        assert_eq!(rig.status(), "ERR");
    }

    #[test]
    fn test_failed_take_returns_to_empty() {
        let mut rig = rig_with(
            PadConfig::default(),
            FakePlayback::default(),
            RecorderScript {
                fail_finish: true,
                ..RecorderScript::default()
            },
            vec![],
        );
        rig.tap(R1, 1000);
        rig.tap(R1, 2000);
        assert_eq!(rig.pad.lifecycle(R1), Some(Lifecycle::Empty));
        assert_eq!(rig.status(), "ERR");
        assert!(!rig.pad.orchestrator().is_pooled(R1));
    }

    #[test]
    fn test_user_import() {
        let picked = PathBuf::from("/music/loop.flac");
        let mut rig = rig_with(
            PadConfig::default(),
            FakePlayback::default(),
            RecorderScript::default(),
            vec![
                Ok(PickOutcome::Cancelled),
                Ok(PickOutcome::Picked(picked.clone())),
            ],
        );

        rig.tap(U1, 1000);
        assert_eq!(rig.pad.lifecycle(U1), Some(Lifecycle::Empty));
        assert_eq!(rig.status(), "RDY");

        rig.tap(U1, 2000);
        assert_eq!(rig.pad.lifecycle(U1), Some(Lifecycle::Idle));
        assert_eq!(rig.status(), "USR");
        assert!(
            rig.calls()
                .contains(&Call::Load(U1, SoundSource::File(picked)))
        );

        // Now an ordinary slot.
        rig.tap(U1, 3000);
        assert_eq!(rig.pad.lifecycle(U1), Some(Lifecycle::Active));
        assert_eq!(rig.status(), "USER");

        rig.pad.handle(InputEvent::SlotLongPress { slot: U1 });
        assert_eq!(rig.pad.lifecycle(U1), Some(Lifecycle::Empty));
        assert_eq!(rig.pad.active_slot(), None);
        let haptics = rig.sink.0.borrow().haptics.clone();
        assert_eq!(haptics.last(), Some(&HapticKind::ImpactHeavy));
    }

    #[test]
    fn test_failed_import_load() {
        let mut playback = FakePlayback::default();
        playback.fail_source(SoundSource::File(PathBuf::from("broken.wav")));
        let mut rig = rig_with(
            PadConfig::default(),
            playback,
            RecorderScript::default(),
            vec![Ok(PickOutcome::Picked(PathBuf::from("broken.wav")))],
        );
        rig.tap(U1, 1000);
        assert_eq!(rig.pad.lifecycle(U1), Some(Lifecycle::Empty));
        assert_eq!(rig.status(), "ERR");
    }

    #[test]
    fn test_runtime_failure_shows_error() {
        let mut rig = rig();
        rig.tap(S1, 1000);
        rig.pad.orchestrator.service_mut().fail_slot = Some(S1);

        let t = rig.at(1100);
        rig.pad.handle(InputEvent::PadDown { x: 50.0, y: 50.0, at: t });
        assert_eq!(rig.status(), "ERR");
        // Still selected; the next gesture may work.
        assert_eq!(rig.pad.active_slot(), Some(S1));
    }

    fn light_rig(policy: ArbitrationPolicy, lux: Arc<Mutex<f32>>) -> Rig {
        let config = PadConfig {
            arbitration: policy,
            sensor_interval: Duration::from_millis(1),
            ..PadConfig::default()
        };
        let sensor = PolledLightSensor::new(move || -> Result<f32, SensorError> {
            Ok(*lux.lock().unwrap())
        });
        rig_with_sensor(
            config,
            FakePlayback::default(),
            RecorderScript::default(),
            vec![],
            Some(Box::new(sensor)),
        )
    }

    fn wait_for_light(rig: &mut Rig) -> LightReading {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            rig.pad.pump();
            if let Some(reading) = rig.pad.light_reading() {
                return reading;
            }
            assert!(Instant::now() < deadline, "no light samples");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn test_light_sets_active_rate() {
        let lux = Arc::new(Mutex::new(5000.0));
        let mut rig = light_rig(ArbitrationPolicy::LastWriterWins, lux.clone());
        rig.tap(S1, 0);

        rig.pad.handle(InputEvent::SetSensorActive(true));
        assert!(rig.pad.is_sensor_active());
        let reading = wait_for_light(&mut rig);
        assert!((reading.level - 1.0).abs() < EPS);
        assert!((rig.sound(S1).params.rate - 2.0).abs() < EPS);

        rig.pad.handle(InputEvent::SetSensorActive(false));
        assert!(!rig.pad.is_sensor_active());
        assert!(rig.pad.light_reading().is_none());

        // No samples reach the slot after the sensor is off.
        let calls = rig.calls().len();
        std::thread::sleep(Duration::from_millis(10));
        rig.pad.pump();
        assert_eq!(rig.calls().len(), calls);
    }

    #[test]
    fn test_pad_priority_blocks_light_while_pressed() {
        let lux = Arc::new(Mutex::new(0.0));
        let mut rig = light_rig(ArbitrationPolicy::PadPriority, lux);
        rig.tap(S1, 0);

        let now = Instant::now();
        rig.pad.handle(InputEvent::PadDown { x: 315.0, y: 170.0, at: now });
        rig.pad.handle(InputEvent::SetSensorActive(true));
        wait_for_light(&mut rig);
        std::thread::sleep(Duration::from_millis(10));
        rig.pad.pump();

        assert!((rig.sound(S1).params.rate - 1.5).abs() < EPS);
        let light_writes = rig
            .pad
            .orchestrator()
            .service()
            .count(|call| matches!(call, Call::SetRate(..)));
        assert_eq!(light_writes, 0);
    }

    #[test]
    fn test_sensorless_instrument_ignores_toggle() {
        let mut rig = rig();
        rig.pad.handle(InputEvent::SetSensorActive(true));
        assert!(!rig.pad.is_sensor_active());
    }

    #[test]
    fn test_shutdown_releases_pool() {
        let mut rig = rig();
        rig.pad.shutdown();
        for slot in 0..6 {
            assert_eq!(rig.pad.orchestrator().service().unload_count(slot), 1);
        }
        rig.pad.shutdown();
        assert_eq!(rig.pad.orchestrator().service().unload_count(0), 1);
    }

    #[test]
    fn test_preload_completions_are_silent() {
        let rig = rig();
        assert_eq!(rig.sink.0.borrow().statuses(), vec!["RDY"]);
        let loads = rig
            .pad
            .orchestrator()
            .service()
            .count(|call| matches!(call, Call::Load(..)));
        assert_eq!(loads, 6);
    }
}
