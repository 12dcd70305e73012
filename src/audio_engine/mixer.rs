//! Real-time audio mixer implementation.
//!
//! This module provides the [`RtMixer`] struct which owns one
//! [`SlotVoice`](crate::audio_engine::slot_voice::SlotVoice) per slot and mixes
//! every playing slot into the output buffer. It operates on
//! [`SampleBuffer`](crate::messages::SampleBuffer) data decoded off the audio thread by
//! [`decode_audio_file_to_sample_buffer`](crate::audio_engine::sample_loader::decode_audio_file_to_sample_buffer).

use crate::audio_engine::constants::MAX_SLOTS;
use crate::audio_engine::slot_voice::{RenderOutcome, SlotVoice};
use crate::messages::{AudioMessage, ControlMessage, SampleBuffer};
use cpal::Sample;

/// Real-time mixer with a fixed bank of slot voices.
///
/// All operations are allocation-free and real-time safe; invalid slot ids are
/// silently ignored.
pub struct RtMixer {
    /// Number of output channels (1 for mono, 2 for stereo).
    channels: usize,

    /// Output sample rate in Hz.
    sample_rate: u32,

    /// One voice per slot.
    voices: [SlotVoice; MAX_SLOTS],
}

impl RtMixer {
    /// Creates a mixer with every slot empty.
    pub fn new(channels: usize, sample_rate: u32) -> Self {
        Self {
            channels,
            sample_rate,
            voices: std::array::from_fn(|_| SlotVoice::default()),
        }
    }

    /// Applies one control message.
    pub fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::LoadSample {
                id,
                sample,
                looping,
                volume,
            } => self.load_sample(id, sample, looping, volume),
            ControlMessage::Play { id } => self.with_voice(id, SlotVoice::play),
            ControlMessage::Pause { id } => self.with_voice(id, SlotVoice::pause),
            ControlMessage::Stop { id } => self.with_voice(id, SlotVoice::stop),
            ControlMessage::SetLooping { id, looping } => {
                self.with_voice(id, |voice| voice.set_looping(looping))
            }
            ControlMessage::SetParams { id, params } => self.with_voice(id, |voice| {
                voice.set_rate(params.rate);
                voice.set_volume(params.volume);
            }),
            ControlMessage::SetRate { id, rate } => {
                self.with_voice(id, |voice| voice.set_rate(rate))
            }
            ControlMessage::SetVolume { id, volume } => {
                self.with_voice(id, |voice| voice.set_volume(volume))
            }
            ControlMessage::Unload { id } => self.with_voice(id, SlotVoice::unload),
        }
    }

    /// Loads a sample into a slot, replacing whatever was there.
    ///
    /// Samples whose channel count does not match the mixer are rejected.
    pub fn load_sample(&mut self, id: usize, sample: SampleBuffer, looping: bool, volume: f32) {
        if sample.channels != self.channels {
            return;
        }
        if let Some(voice) = self.voices.get_mut(id) {
            voice.load(sample, looping, volume);
        }
    }

    fn with_voice(&mut self, id: usize, f: impl FnOnce(&mut SlotVoice)) {
        if let Some(voice) = self.voices.get_mut(id) {
            f(voice);
        }
    }

    /// Renders one block of interleaved frames into `output`.
    ///
    /// Slots that finish playing during the block are reported through `notify`.
    pub fn render(&mut self, output: &mut [f32], mut notify: impl FnMut(AudioMessage)) {
        output.fill(Sample::EQUILIBRIUM);

        if self.channels == 0 {
            return;
        }

        for (id, voice) in self.voices.iter_mut().enumerate() {
            if voice.render_into(output, self.channels, self.sample_rate)
                == RenderOutcome::Finished
            {
                notify(AudioMessage::Finished { id });
            }
        }
    }

    /// Gets the number of channels configured for this mixer.
    pub fn channels(&self) -> usize {
        self.channels
    }
}
