//! Slot registry: the static catalog of sound slots.
//!
//! A slot's position in the registry is also its id on the playback service.

use crate::audio_engine::constants::MAX_SLOTS;
use crate::constants::DEFAULT_BASE_VOLUME;
use crate::errors::ConfigError;
use crate::playback::SoundSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCategory {
    Instrument,
    Base,
    /// Filled at runtime from an imported file.
    User,
    /// Filled at runtime from a microphone recording.
    Mic,
}

impl SlotCategory {
    /// User and mic slots have no static source and start empty.
    pub fn acquires_at_runtime(self) -> bool {
        matches!(self, SlotCategory::User | SlotCategory::Mic)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub category: SlotCategory,
    pub base_volume: f32,
    pub source: Option<SoundSource>,
}

impl SlotDescriptor {
    pub fn asset(
        id: &'static str,
        label: &'static str,
        category: SlotCategory,
        asset: &'static str,
    ) -> Self {
        Self {
            id,
            label,
            category,
            base_volume: DEFAULT_BASE_VOLUME,
            source: Some(SoundSource::Asset(asset)),
        }
    }

    pub fn runtime(id: &'static str, label: &'static str, category: SlotCategory) -> Self {
        Self {
            id,
            label,
            category,
            base_volume: DEFAULT_BASE_VOLUME,
            source: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlotRegistry {
    slots: Vec<SlotDescriptor>,
}

impl SlotRegistry {
    /// Build a registry, rejecting duplicate ids, static sources on user or
    /// mic slots, and more slots than the engine can hold.
    pub fn new(slots: Vec<SlotDescriptor>) -> Result<Self, ConfigError> {
        if slots.len() > MAX_SLOTS {
            return Err(ConfigError::new(
                "slots",
                format!("at most {MAX_SLOTS} slots are supported"),
            ));
        }

        for (i, slot) in slots.iter().enumerate() {
            if slots[..i].iter().any(|other| other.id == slot.id) {
                return Err(ConfigError::new(
                    "slots",
                    format!("duplicate slot id {}", slot.id),
                ));
            }
            if !(0.0..=1.0).contains(&slot.base_volume) {
                return Err(ConfigError::new(
                    "base_volume",
                    format!("slot {} must be in [0, 1]", slot.id),
                ));
            }
            match (slot.category.acquires_at_runtime(), slot.source.is_some()) {
                (true, true) => {
                    return Err(ConfigError::new(
                        "source",
                        format!("slot {} acquires its source at runtime", slot.id),
                    ));
                }
                (false, false) => {
                    return Err(ConfigError::new(
                        "source",
                        format!("slot {} needs a static source", slot.id),
                    ));
                }
                _ => {}
            }
        }

        Ok(Self { slots })
    }

    /// The eight factory slots.
    pub fn default_catalog() -> Self {
        use SlotCategory::*;

        Self {
            slots: vec![
                SlotDescriptor::asset("s1", "CICCIO", Instrument, "ciccio2.mp3"),
                SlotDescriptor::asset("s2", "BRASS", Instrument, "brass.mp3"),
                SlotDescriptor::asset("s3", "DIST", Instrument, "disto.mp3"),
                SlotDescriptor::asset("b1", "TREM", Base, "tremolo.mp3"),
                SlotDescriptor::asset("b2", "BOX", Base, "electrobox.mp3"),
                SlotDescriptor::asset("b3", "STUFF", Base, "stuff.mp3"),
                SlotDescriptor::runtime("u1", "USER", User),
                SlotDescriptor::runtime("r1", "MIC", Mic),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SlotDescriptor> {
        self.slots.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &SlotDescriptor)> {
        self.slots.iter().enumerate()
    }
}
