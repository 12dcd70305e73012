//! Audio engine configuration constants and limits.

/// Maximum number of sound slots the engine can hold (one sound per slot).
pub const MAX_SLOTS: usize = 16;

/// Minimum playback rate multiplier.
pub const RATE_MIN: f32 = 0.1;

/// Maximum playback rate multiplier.
pub const RATE_MAX: f32 = 3.0;

/// Minimum volume level (silence).
pub const VOLUME_MIN: f32 = 0.0;

/// Maximum volume level (100%).
pub const VOLUME_MAX: f32 = 1.0;

/// Capacity of the control -> audio thread ring buffer.
pub const CONTROL_QUEUE_CAPACITY: usize = 1024;

/// Capacity of the audio thread -> control ring buffer.
pub const AUDIO_QUEUE_CAPACITY: usize = 256;

/// Capacity (in samples) of the microphone capture ring buffer.
///
/// Roughly three seconds of stereo audio at 48 kHz between two drains.
pub const CAPTURE_QUEUE_CAPACITY: usize = 1 << 18;

/// Requested output buffer size in frames.
pub const OUTPUT_BUFFER_FRAMES: u32 = 512;
