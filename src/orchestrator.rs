//! Playback orchestrator: owns the one-sound-per-slot pool.
//!
//! Nothing outside this module sees the playback service. Slots without a
//! pooled sound turn every operation into a no-op, so taps on a slot whose
//! preload failed never reach the engine.

use std::path::PathBuf;

use crate::audio_engine::constants::MAX_SLOTS;
use crate::constants::NEUTRAL_RATE;
use crate::errors::PlaybackError;
use crate::machine::SlotEvent;
use crate::messages::{LoaderEvent, SoundParams, SourceOrigin};
use crate::playback::{LoadOptions, PlaybackService, SoundSource, SoundStatus};
use crate::slots::SlotRegistry;

pub struct PlaybackOrchestrator<P: PlaybackService> {
    service: P,
    pooled: [bool; MAX_SLOTS],
    shut_down: bool,
}

impl<P: PlaybackService> PlaybackOrchestrator<P> {
    pub fn new(service: P) -> Self {
        Self {
            service,
            pooled: [false; MAX_SLOTS],
            shut_down: false,
        }
    }

    pub fn service(&self) -> &P {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut P {
        &mut self.service
    }

    pub fn is_pooled(&self, slot: usize) -> bool {
        self.pooled.get(slot).copied().unwrap_or(false)
    }

    pub fn status(&self, slot: usize) -> SoundStatus {
        if !self.is_pooled(slot) {
            return SoundStatus::default();
        }
        self.service.status(slot)
    }

    /// Start loading every static source, paused and looping at its base volume.
    ///
    /// Each slot loads independently; a slot that cannot even be queued is
    /// logged and skipped.
    pub fn preload(&mut self, registry: &SlotRegistry) {
        for (slot, desc) in registry.iter() {
            let Some(source) = &desc.source else {
                continue;
            };
            let options = LoadOptions {
                looping: true,
                volume: desc.base_volume,
                origin: SourceOrigin::Preload,
            };
            if let Err(err) = self.service.load(slot, source, options) {
                log::warn!("Failed to preload slot {}: {}", desc.id, err);
            }
        }
    }

    /// Load a recorded or imported file into `slot`, replacing its sound.
    pub fn load_file(
        &mut self,
        slot: usize,
        path: PathBuf,
        volume: f32,
        origin: SourceOrigin,
    ) -> Result<(), PlaybackError> {
        let options = LoadOptions {
            looping: true,
            volume,
            origin,
        };
        self.service.load(slot, &SoundSource::File(path), options)
    }

    /// Drain one completed load and turn it into a machine event.
    pub fn poll(&mut self) -> Option<SlotEvent> {
        loop {
            let event = self.service.poll_loader_event()?;
            if let Some(slot_event) = self.on_loader_event(event) {
                return Some(slot_event);
            }
        }
    }

    pub fn on_loader_event(&mut self, event: LoaderEvent) -> Option<SlotEvent> {
        match event {
            LoaderEvent::Started { id, origin } => {
                log::debug!("Loading slot {id} ({origin:?})");
                None
            }
            LoaderEvent::Success {
                id,
                origin,
                duration_sec,
            } => {
                let pooled = self.pooled.get_mut(id)?;
                *pooled = true;
                log::info!("Slot {id} loaded ({duration_sec:.2}s, {origin:?})");
                Some(SlotEvent::SourceLoaded { slot: id, origin })
            }
            LoaderEvent::Error { id, origin, error } => {
                let pooled = self.pooled.get_mut(id)?;
                *pooled = false;
                log::warn!("Failed to load slot {id} ({origin:?}): {error}");
                Some(SlotEvent::SourceFailed { slot: id, origin })
            }
        }
    }

    /// No-op when the slot is empty or already playing.
    pub fn play(&mut self, slot: usize) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) || self.service.status(slot).playing {
            return Ok(());
        }
        self.service.play(slot)
    }

    pub fn pause(&mut self, slot: usize) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) {
            return Ok(());
        }
        self.service.pause(slot)
    }

    /// Enable looping and make sure the sound is playing.
    pub fn hold(&mut self, slot: usize) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) {
            return Ok(());
        }
        self.service.set_looping(slot, true)?;
        self.play(slot)
    }

    /// Stop, rewind, and put rate and volume back to their resting values.
    pub fn stop_and_reset(&mut self, slot: usize, volume: f32) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) {
            return Ok(());
        }
        self.service.stop(slot)?;
        self.service
            .set_params(slot, SoundParams::new(NEUTRAL_RATE, volume))
    }

    /// Reset every listed slot, carrying on past failures.
    ///
    /// Returns the first error, if any.
    pub fn reset_all(&mut self, volumes: &[(usize, f32)]) -> Result<(), PlaybackError> {
        let mut first_error = None;
        for &(slot, volume) in volumes {
            if let Err(err) = self.stop_and_reset(slot, volume) {
                log::warn!("Failed to reset slot {slot}: {err}");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Rate and volume applied together, pitch following the rate.
    pub fn apply_modulation(
        &mut self,
        slot: usize,
        rate: f32,
        volume: f32,
    ) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) {
            return Ok(());
        }
        self.service.set_params(slot, SoundParams::new(rate, volume))
    }

    pub fn set_rate(&mut self, slot: usize, rate: f32) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) {
            return Ok(());
        }
        self.service.set_rate(slot, rate, false)
    }

    pub fn set_volume(&mut self, slot: usize, volume: f32) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) {
            return Ok(());
        }
        self.service.set_volume(slot, volume)
    }

    /// Release the slot's sound. The slot leaves the pool even if the
    /// service reports an error.
    pub fn unload(&mut self, slot: usize) -> Result<(), PlaybackError> {
        if !self.is_pooled(slot) {
            return Ok(());
        }
        self.pooled[slot] = false;
        self.service.unload(slot)
    }

    /// Release every pooled sound exactly once. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        for slot in 0..MAX_SLOTS {
            if let Err(err) = self.unload(slot) {
                log::warn!("Failed to release slot {slot}: {err}");
            }
        }
    }
}

impl<P: PlaybackService> Drop for PlaybackOrchestrator<P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
