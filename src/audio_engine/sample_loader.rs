//! Audio file loading and decoding functionality.
//!
//! Static assets, imported files and microphone recordings all go through
//! [`decode_audio_file_to_sample_buffer`] before they are published to the mixer.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use symphonia::core::{
    audio::SampleBuffer as SymphoniaSampleBuffer, codecs::DecoderOptions,
    errors::Error as SymphoniaError, formats::FormatOptions, io::MediaSourceStream,
    meta::MetadataOptions, probe::Hint,
};
use symphonia::default::{get_codecs, get_probe};

use crate::audio_engine::channels::map_channels;
use crate::audio_engine::errors::SampleLoadError;
use crate::messages::SampleBuffer;

/// Decodes an audio file into a sample buffer with the given output channel count.
///
/// The file keeps its own sample rate: the mixer scales the playback step by
/// `file_rate / output_rate`, so no resampling pass is needed here.
///
/// # Errors
///
/// - the file cannot be opened
/// - the format is not recognized or the data is corrupt
/// - the channel layout cannot be mapped to `output_channels`
/// - the file decodes to no audio at all
pub fn decode_audio_file_to_sample_buffer(
    path: &Path,
    output_channels: usize,
) -> Result<SampleBuffer, SampleLoadError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or(SampleLoadError::NoDefaultTrack)?;
    let track_id = track.id;
    let file_rate_hz = track
        .codec_params
        .sample_rate
        .ok_or(SampleLoadError::MissingSampleRate)?;
    let file_channels = track
        .codec_params
        .channels
        .ok_or(SampleLoadError::MissingChannels)?
        .count();

    let mut decoder = get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let mut decoded: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(SampleLoadError::Decode(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let audio_buf = decoder.decode(&packet)?;
        let spec = *audio_buf.spec();
        let duration = audio_buf.capacity() as u64;

        let mut sample_buf = SymphoniaSampleBuffer::<f32>::new(duration, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        decoded.extend_from_slice(sample_buf.samples());
    }

    if decoded.is_empty() {
        return Err(SampleLoadError::Empty);
    }

    let mapped = map_channels(decoded, file_channels, output_channels)?;

    Ok(SampleBuffer {
        channels: output_channels,
        sample_rate: file_rate_hz,
        samples: Arc::from(mapped.into_boxed_slice()),
    })
}
