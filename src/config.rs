//! Instrument configuration.

use std::time::Duration;

use crate::constants::{
    DEFAULT_CURSOR_DIAMETER, DEFAULT_FADER_WIDTH, DEFAULT_LIGHT_ALPHA, DEFAULT_MAX_LUX,
    DEFAULT_PAD_SIZE, DEFAULT_SENSOR_INTERVAL, DOUBLE_TAP_WINDOW,
};
use crate::errors::ConfigError;

/// How a smoothed lux value is mapped onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightNormalization {
    /// `ln(lux + 1) / ln(max_lux + 1)`, for sensors with a wide range.
    Logarithmic { max_lux: f32 },
    /// `lux / max_lux`, for sensors with a known narrow range.
    Linear { max_lux: f32 },
}

impl LightNormalization {
    pub fn max_lux(&self) -> f32 {
        match *self {
            LightNormalization::Logarithmic { max_lux } | LightNormalization::Linear { max_lux } => {
                max_lux
            }
        }
    }
}

/// Which control sets the active slot's rate when pad and light both fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArbitrationPolicy {
    /// The most recent event wins; older events arriving late are dropped.
    #[default]
    LastWriterWins,
    /// Light updates are ignored while the pad is pressed.
    PadPriority,
    /// Pad moves do not touch the rate while the light sensor is active.
    LightPriority,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PadConfig {
    pub pad_size: f32,
    pub cursor_diameter: f32,
    pub fader_width: f32,
    pub double_tap_window: Duration,
    pub light_alpha: f32,
    pub light_normalization: LightNormalization,
    pub sensor_interval: Duration,
    pub arbitration: ArbitrationPolicy,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            pad_size: DEFAULT_PAD_SIZE,
            cursor_diameter: DEFAULT_CURSOR_DIAMETER,
            fader_width: DEFAULT_FADER_WIDTH,
            double_tap_window: DOUBLE_TAP_WINDOW,
            light_alpha: DEFAULT_LIGHT_ALPHA,
            light_normalization: LightNormalization::Logarithmic {
                max_lux: DEFAULT_MAX_LUX,
            },
            sensor_interval: DEFAULT_SENSOR_INTERVAL,
            arbitration: ArbitrationPolicy::default(),
        }
    }
}

impl PadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.pad_size.is_finite() && self.pad_size > 0.0) {
            return Err(ConfigError::new("pad_size", "must be positive"));
        }
        if !(self.cursor_diameter.is_finite()
            && self.cursor_diameter >= 0.0
            && self.cursor_diameter < self.pad_size)
        {
            return Err(ConfigError::new(
                "cursor_diameter",
                format!("must be in [0, {})", self.pad_size),
            ));
        }
        if !(self.fader_width.is_finite() && self.fader_width > 0.0) {
            return Err(ConfigError::new("fader_width", "must be positive"));
        }
        if self.double_tap_window.is_zero() {
            return Err(ConfigError::new("double_tap_window", "must be non-zero"));
        }
        if !(self.light_alpha > 0.0 && self.light_alpha < 1.0) {
            return Err(ConfigError::new("light_alpha", "must be in (0, 1)"));
        }
        let max_lux = self.light_normalization.max_lux();
        if !(max_lux.is_finite() && max_lux > 0.0) {
            return Err(ConfigError::new("light_normalization", "max_lux must be positive"));
        }
        if self.sensor_interval.is_zero() {
            return Err(ConfigError::new("sensor_interval", "must be non-zero"));
        }
        Ok(())
    }
}
