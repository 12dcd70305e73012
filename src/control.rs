//! XY pad and volume fader mapping.
//!
//! Positions are in points, measured to the cursor's center, so the cursor
//! travels between `cursor / 2` and `pad - cursor / 2` on both axes.

use crate::config::PadConfig;
use crate::constants::{
    BEND_SPAN, BEND_TOP, OCTAVE_BASE, OCTAVE_SPAN, PAD_RATE_MAX, PAD_RATE_MIN,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PadGeometry {
    pub pad_size: f32,
    pub cursor_diameter: f32,
}

impl PadGeometry {
    pub fn new(pad_size: f32, cursor_diameter: f32) -> Self {
        Self {
            pad_size,
            cursor_diameter,
        }
    }

    pub fn from_config(config: &PadConfig) -> Self {
        Self::new(config.pad_size, config.cursor_diameter)
    }

    pub fn min_pos(&self) -> f32 {
        self.cursor_diameter / 2.0
    }

    pub fn max_pos(&self) -> f32 {
        self.pad_size - self.cursor_diameter / 2.0
    }

    pub fn travel(&self) -> f32 {
        self.pad_size - self.cursor_diameter
    }

    pub fn center(&self) -> f32 {
        self.pad_size / 2.0
    }

    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.center();
        }
        value.clamp(self.min_pos(), self.max_pos())
    }

    /// Position along one axis as a fraction of the travel, in `[0, 1]`.
    pub fn percent(&self, value: f32) -> f32 {
        let travel = self.travel();
        if travel <= 0.0 {
            return 0.5;
        }
        (self.clamp(value) - self.min_pos()) / travel
    }

    /// Playback rate for a pad position.
    pub fn rate_at(&self, x: f32, y: f32) -> f32 {
        pad_rate(self.percent(x), self.percent(y))
    }
}

/// Rate for normalized pad coordinates, `y = 0` at the top.
///
/// The horizontal axis spans 0.5x..1.5x; the vertical axis detunes by up to
/// +/-0.1 around it. Center is exactly 1.0.
pub fn pad_rate(percent_x: f32, percent_y: f32) -> f32 {
    let octave = OCTAVE_BASE + percent_x * OCTAVE_SPAN;
    let bend = BEND_TOP - percent_y * BEND_SPAN;
    (octave + bend).clamp(PAD_RATE_MIN, PAD_RATE_MAX)
}

/// Fader position in points to a volume factor in `[0, 1]`.
///
/// A NaN position stays NaN so the volume update is dropped downstream.
pub fn fader_level(x: f32, width: f32) -> f32 {
    if width <= 0.0 {
        return 0.0;
    }
    (x / width).clamp(0.0, 1.0)
}

/// Text shown over the fader.
pub fn fader_readout(label: Option<&str>, volume_factor: f32) -> String {
    match label {
        Some(label) => format!("{label} VOL: {}%", (volume_factor * 100.0).round() as i32),
        None => "SELECT CH".to_string(),
    }
}

/// Last pad touch, clamped to the pad.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
    pub pressed: bool,
}

impl PointerState {
    /// Released, resting at the center of the pad.
    pub fn centered(geometry: &PadGeometry) -> Self {
        Self {
            x: geometry.center(),
            y: geometry.center(),
            pressed: false,
        }
    }

    pub fn press(&mut self, geometry: &PadGeometry, x: f32, y: f32) {
        self.pressed = true;
        self.x = geometry.clamp(x);
        self.y = geometry.clamp(y);
    }

    /// Returns `false` when the pad is not pressed and the move is ignored.
    pub fn move_to(&mut self, geometry: &PadGeometry, x: f32, y: f32) -> bool {
        if !self.pressed {
            return false;
        }
        self.x = geometry.clamp(x);
        self.y = geometry.clamp(y);
        true
    }

    pub fn release(&mut self) {
        self.pressed = false;
    }
}
