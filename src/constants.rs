//! Instrument constants: mapping coefficients and defaults.

use std::time::Duration;

pub const DEFAULT_PAD_SIZE: f32 = 340.0;
pub const DEFAULT_CURSOR_DIAMETER: f32 = 50.0;
pub const DEFAULT_FADER_WIDTH: f32 = 340.0;

/// Two taps on one slot closer than this are a double tap.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

// Pad rate mapping: rate = OCTAVE_BASE + x + (BEND_TOP - BEND_SPAN * y).
pub const OCTAVE_BASE: f32 = 0.5;
pub const OCTAVE_SPAN: f32 = 1.0;
pub const BEND_TOP: f32 = 0.1;
pub const BEND_SPAN: f32 = 0.2;

pub const PAD_RATE_MIN: f32 = 0.1;
pub const PAD_RATE_MAX: f32 = 3.0;

// Light pitch mapping: pitch = LIGHT_PITCH_MIN + n * LIGHT_PITCH_SPAN.
pub const LIGHT_PITCH_MIN: f32 = 0.1;
pub const LIGHT_PITCH_SPAN: f32 = 1.9;

pub const DEFAULT_LIGHT_ALPHA: f32 = 0.29;
pub const DEFAULT_MAX_LUX: f32 = 5000.0;
pub const DEFAULT_SENSOR_INTERVAL: Duration = Duration::from_millis(30);

pub const NEUTRAL_RATE: f32 = 1.0;
pub const DEFAULT_BASE_VOLUME: f32 = 1.0;
pub const DEFAULT_VOLUME_FACTOR: f32 = 1.0;
