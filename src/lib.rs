//! Core of a touch-driven looping instrument: eight sound slots, an XY pad,
//! a volume fader and an ambient-light theremin.

pub mod acquisition;
pub mod arbitration;
pub mod audio_engine;
pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod feedback;
pub mod instrument;
pub mod light;
pub mod machine;
mod messages;
pub mod orchestrator;
pub mod playback;
pub mod sensor;
pub mod slots;

#[cfg(test)]
mod testing;

pub use acquisition::{AcquisitionController, QueuedPicker};
pub use audio_engine::{AudioEngine, CpalRecorder, setup_logger};
pub use config::{ArbitrationPolicy, LightNormalization, PadConfig};
pub use instrument::{InputEvent, KaossPad};
pub use messages::{LoaderEvent, SoundParams, SourceOrigin};
pub use slots::{SlotCategory, SlotDescriptor, SlotRegistry};
