//! Audio Stream Module
//!
//! This module handles CPAL output stream management:
//! - stream initialization and configuration
//! - the real-time callback draining control messages into the mixer
//! - error reporting for the stream

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Stream, StreamConfig};
use env_logger::{Builder, Env};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::{Arc, Mutex};

use crate::audio_engine::constants::{
    AUDIO_QUEUE_CAPACITY, CONTROL_QUEUE_CAPACITY, OUTPUT_BUFFER_FRAMES,
};
use crate::audio_engine::errors::StreamError;
use crate::audio_engine::mixer::RtMixer;
use crate::messages::{AudioMessage, ControlMessage};

/// Handle to the audio stream with associated message channels
pub struct AudioStreamHandle {
    pub stream: Stream,
    /// Shared with loader threads, which publish decoded samples directly.
    pub producer: Arc<Mutex<Producer<ControlMessage>>>,
    pub consumer: Consumer<AudioMessage>,
    pub output_channels: usize,
    pub output_sample_rate: u32,
}

/// Setup and configure the logger.
///
/// Defaults to `info`; override through `RUST_LOG`, e.g. `RUST_LOG=lxxn_pad=debug`
/// to see status codes and haptic pulses.
pub fn setup_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .try_init()
        .unwrap_or(()); // Ignore initialization errors
}

/// Create and configure the output stream.
///
/// 1. Opens the default output device
/// 2. Creates the ring buffers between the control side and the audio thread
/// 3. Moves a fresh mixer into the callback
pub fn create_audio_stream() -> Result<AudioStreamHandle, StreamError> {
    setup_logger();

    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(StreamError::NoDevice)?;

    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate();
    let channels = config.channels();

    log::info!(
        "Starting audio engine... ({} ch@{} Hz)",
        channels,
        sample_rate
    );

    let (producer_in, mut consumer_in) = RingBuffer::new(CONTROL_QUEUE_CAPACITY);
    let (mut producer_out, consumer_out) = RingBuffer::new(AUDIO_QUEUE_CAPACITY);

    let mut mixer = RtMixer::new(channels as usize, sample_rate);

    let stream_config = StreamConfig {
        channels,
        sample_rate,
        buffer_size: BufferSize::Fixed(OUTPUT_BUFFER_FRAMES),
    };

    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            while let Ok(message) = consumer_in.pop() {
                mixer.handle(message);
            }

            mixer.render(data, |message| {
                let _ = producer_out.push(message);
            });
        },
        |err| {
            log::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(AudioStreamHandle {
        stream,
        producer: Arc::new(Mutex::new(producer_in)),
        consumer: consumer_out,
        output_channels: channels as usize,
        output_sample_rate: sample_rate,
    })
}

/// Start playing the audio stream
pub fn start_stream(stream: &Stream) -> Result<(), StreamError> {
    stream.play()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_setup() {
        // Only the first call takes effect; later ones must not panic.
        setup_logger();
        setup_logger();
    }

    #[test]
    fn test_audio_stream_creation() {
        // Actual stream creation requires audio hardware.
        if cpal::default_host().default_output_device().is_none() {
            return;
        }

        if let Ok(handle) = create_audio_stream() {
            assert!(handle.output_channels > 0);
            assert!(handle.output_sample_rate > 0);
        }
    }
}
