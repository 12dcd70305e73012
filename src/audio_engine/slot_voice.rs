//! One playable sound per slot.
//!
//! A [`SlotVoice`] owns the sample a slot plays, its fractional read position
//! and the parameters the control side last set. Unlike a polyphonic voice
//! pool, a slot never plays more than one instance of its sound.

use crate::audio_engine::constants::{RATE_MAX, RATE_MIN, VOLUME_MAX, VOLUME_MIN};
use crate::messages::SampleBuffer;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Outcome of rendering one block for a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Nothing was rendered (no sample, paused or stopped).
    Silent,
    /// The voice rendered and keeps playing.
    Playing,
    /// A non-looping voice reached the end of its sample during this block.
    Finished,
}

pub struct SlotVoice {
    sample: Option<SampleBuffer>,
    position: f64,
    playing: bool,
    looping: bool,
    rate: f32,
    volume: f32,
}

impl Default for SlotVoice {
    fn default() -> Self {
        Self {
            sample: None,
            position: 0.0,
            playing: false,
            looping: true,
            rate: 1.0,
            volume: VOLUME_MAX,
        }
    }
}

impl SlotVoice {
    /// Install a new sample, paused at the start. Replaces any previous sample.
    pub fn load(&mut self, sample: SampleBuffer, looping: bool, volume: f32) {
        self.sample = Some(sample);
        self.position = 0.0;
        self.playing = false;
        self.looping = looping;
        self.rate = 1.0;
        self.volume = sanitize_volume(volume, VOLUME_MAX);
    }

    pub fn unload(&mut self) {
        *self = Self::default();
    }

    pub fn is_loaded(&self) -> bool {
        self.sample.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Resume from the current position. No-op without a sample.
    pub fn play(&mut self) {
        if self.sample.is_some() {
            self.playing = true;
        }
    }

    /// Pause playback: does not change the position.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Stop playback and rewind.
    pub fn stop(&mut self) {
        self.playing = false;
        self.position = 0.0;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Invalid rates (NaN, infinite) are ignored; valid ones are clamped to the engine range.
    pub fn set_rate(&mut self, rate: f32) {
        if rate.is_finite() {
            self.rate = rate.clamp(RATE_MIN, RATE_MAX);
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = sanitize_volume(volume, self.volume);
    }

    /// Mix this voice into `output` (interleaved, `channels` per frame).
    ///
    /// `output_rate` is the device sample rate; the read step per output frame is
    /// `rate * sample_rate / output_rate`.
    pub fn render_into(
        &mut self,
        output: &mut [f32],
        channels: usize,
        output_rate: u32,
    ) -> RenderOutcome {
        if !self.playing || channels == 0 || output_rate == 0 {
            return RenderOutcome::Silent;
        }
        let Some(sample) = self.sample.as_ref() else {
            self.playing = false;
            return RenderOutcome::Silent;
        };
        if sample.channels != channels {
            return RenderOutcome::Silent;
        }

        let frames = sample.frames();
        if frames == 0 {
            self.playing = false;
            return RenderOutcome::Silent;
        }

        let step = f64::from(self.rate) * f64::from(sample.sample_rate) / f64::from(output_rate);
        let len = frames as f64;
        let data = &sample.samples;

        for out_frame in output.chunks_exact_mut(channels) {
            if self.position >= len {
                if self.looping {
                    self.position %= len;
                } else {
                    self.playing = false;
                    self.position = 0.0;
                    return RenderOutcome::Finished;
                }
            }

            let idx = self.position as usize;
            let frac = (self.position - idx as f64) as f32;
            let next = if idx + 1 < frames {
                idx + 1
            } else if self.looping {
                0
            } else {
                idx
            };

            for (channel, out) in out_frame.iter_mut().enumerate() {
                let s0 = data[idx * channels + channel];
                let s1 = data[next * channels + channel];
                *out += lerp(s0, s1, frac) * self.volume;
            }

            self.position += step;
        }

        RenderOutcome::Playing
    }
}

fn sanitize_volume(volume: f32, fallback: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(VOLUME_MIN, VOLUME_MAX)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn ramp(frames: usize, sample_rate: u32) -> SampleBuffer {
        let samples: Vec<f32> = (0..frames).map(|i| i as f32 / frames as f32).collect();
        SampleBuffer {
            channels: 1,
            sample_rate,
            samples: Arc::from(samples.into_boxed_slice()),
        }
    }

    #[test]
    fn test_loaded_voice_starts_paused() {
        let mut voice = SlotVoice::default();
        voice.load(ramp(8, 48_000), true, 0.5);

        assert!(voice.is_loaded());
        assert!(!voice.is_playing());
        assert!((voice.volume() - 0.5).abs() < f32::EPSILON);

        let mut out = vec![0.0; 4];
        assert_eq!(voice.render_into(&mut out, 1, 48_000), RenderOutcome::Silent);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_play_without_sample_is_noop() {
        let mut voice = SlotVoice::default();
        voice.play();
        assert!(!voice.is_playing());
    }

    #[test]
    fn test_rate_two_skips_every_other_frame() {
        let mut voice = SlotVoice::default();
        voice.load(ramp(8, 48_000), true, 1.0);
        voice.set_rate(2.0);
        voice.play();

        let mut out = vec![0.0; 4];
        voice.render_into(&mut out, 1, 48_000);
        let expected = [0.0, 0.25, 0.5, 0.75];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6);
        }
    }

    #[test]
    fn test_file_rate_is_folded_into_step() {
        let mut voice = SlotVoice::default();
        voice.load(ramp(8, 24_000), true, 1.0);
        voice.play();

        // 24 kHz file on a 48 kHz device advances half a frame per output frame.
        let mut out = vec![0.0; 3];
        voice.render_into(&mut out, 1, 48_000);
        assert!((out[1] - 0.0625).abs() < 1e-6);
        assert!((out[2] - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_non_looping_voice_finishes() {
        let mut voice = SlotVoice::default();
        voice.load(ramp(4, 48_000), false, 1.0);
        voice.play();

        let mut out = vec![0.0; 16];
        assert_eq!(voice.render_into(&mut out, 1, 48_000), RenderOutcome::Finished);
        assert!(!voice.is_playing());
    }

    #[test]
    fn test_looping_voice_wraps() {
        let mut voice = SlotVoice::default();
        voice.load(ramp(4, 48_000), true, 1.0);
        voice.play();

        let mut out = vec![0.0; 8];
        assert_eq!(voice.render_into(&mut out, 1, 48_000), RenderOutcome::Playing);
        assert!((out[4] - out[0]).abs() < 1e-6);
        assert!(voice.is_playing());
    }

    #[test]
    fn test_pause_keeps_position_stop_rewinds() {
        let mut voice = SlotVoice::default();
        voice.load(ramp(8, 48_000), true, 1.0);
        voice.play();
        let mut out = vec![0.0; 2];
        voice.render_into(&mut out, 1, 48_000);

        voice.pause();
        voice.play();
        let mut resumed = vec![0.0; 1];
        voice.render_into(&mut resumed, 1, 48_000);
        assert!((resumed[0] - 0.25).abs() < 1e-6);

        voice.stop();
        voice.play();
        let mut restarted = vec![0.0; 1];
        voice.render_into(&mut restarted, 1, 48_000);
        assert!(restarted[0].abs() < 1e-6);
    }

    #[test]
    fn test_invalid_params_are_ignored_or_clamped() {
        let mut voice = SlotVoice::default();
        voice.set_rate(f32::NAN);
        assert!((voice.rate() - 1.0).abs() < f32::EPSILON);
        voice.set_rate(10.0);
        assert!((voice.rate() - RATE_MAX).abs() < f32::EPSILON);
        voice.set_volume(f32::INFINITY);
        assert!((voice.volume() - 1.0).abs() < f32::EPSILON);
        voice.set_volume(-1.0);
        assert!(voice.volume().abs() < f32::EPSILON);
    }
}
