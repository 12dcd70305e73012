//! Ambient light conditioning and the theremin mapping.

use crate::config::LightNormalization;
use crate::constants::{LIGHT_PITCH_MIN, LIGHT_PITCH_SPAN};

/// One conditioned reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightReading {
    /// Smoothed illuminance, in the sensor's unit.
    pub smoothed: f32,
    /// Smoothed value mapped to `[0, 1]`.
    pub level: f32,
}

impl LightReading {
    /// Rounded lux for display.
    pub fn display_lux(&self) -> u32 {
        self.smoothed.max(0.0).round() as u32
    }
}

/// Exponential moving average followed by normalization.
///
/// The first sample after construction or [`reset`](Self::reset) seeds the
/// average directly, so a bright room reads bright at once instead of
/// ramping up from zero over the first few samples.
#[derive(Debug, Clone)]
pub struct LightConditioner {
    alpha: f32,
    normalization: LightNormalization,
    smoothed: Option<f32>,
}

impl LightConditioner {
    pub fn new(alpha: f32, normalization: LightNormalization) -> Self {
        Self {
            alpha: alpha.clamp(f32::EPSILON, 1.0),
            normalization,
            smoothed: None,
        }
    }

    pub fn push(&mut self, raw: f32) -> Option<LightReading> {
        if !raw.is_finite() {
            return None;
        }
        let raw = raw.max(0.0);

        let smoothed = match self.smoothed {
            Some(prev) => prev + self.alpha * (raw - prev),
            None => raw,
        };
        self.smoothed = Some(smoothed);

        Some(LightReading {
            smoothed,
            level: normalize(smoothed, self.normalization),
        })
    }

    pub fn current(&self) -> Option<LightReading> {
        self.smoothed.map(|smoothed| LightReading {
            smoothed,
            level: normalize(smoothed, self.normalization),
        })
    }

    pub fn reset(&mut self) {
        self.smoothed = None;
    }
}

pub fn normalize(lux: f32, normalization: LightNormalization) -> f32 {
    let lux = lux.max(0.0);
    let level = match normalization {
        LightNormalization::Logarithmic { max_lux } => (lux + 1.0).ln() / (max_lux + 1.0).ln(),
        LightNormalization::Linear { max_lux } => lux / max_lux,
    };
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, 1.0)
}

/// Playback rate for a normalized light level: dark 0.1x, bright 2.0x.
pub fn light_rate(level: f32) -> f32 {
    LIGHT_PITCH_MIN + level.clamp(0.0, 1.0) * LIGHT_PITCH_SPAN
}
