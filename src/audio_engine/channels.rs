use crate::audio_engine::errors::SampleLoadError;

/// Maps interleaved audio from one channel layout to another.
///
/// Supported layouts:
/// - same channel count: returned unchanged
/// - mono → any: the mono signal is copied to every output channel
/// - any → mono: channels are averaged
/// - multichannel → stereo: the first two channels are kept (front left/right)
///
/// Anything else (e.g. stereo → 6 channels) is rejected.
pub fn map_channels(
    samples: Vec<f32>,
    file_channels: usize,
    output_channels: usize,
) -> Result<Vec<f32>, SampleLoadError> {
    if file_channels == output_channels {
        return Ok(samples);
    }

    match (file_channels, output_channels) {
        (0, _) | (_, 0) => Err(SampleLoadError::UnsupportedChannels {
            file_channels,
            output_channels,
        }),
        (1, out) => {
            let mut mapped = Vec::with_capacity(samples.len() * out);
            for s in samples {
                mapped.extend(std::iter::repeat_n(s, out));
            }
            Ok(mapped)
        }
        (n, 1) => {
            let scale = 1.0 / n as f32;
            Ok(samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() * scale)
                .collect())
        }
        (n, 2) if n > 2 => {
            let mut mapped = Vec::with_capacity(samples.len() / n * 2);
            for frame in samples.chunks_exact(n) {
                mapped.push(frame[0]);
                mapped.push(frame[1]);
            }
            Ok(mapped)
        }
        _ => Err(SampleLoadError::UnsupportedChannels {
            file_channels,
            output_channels,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_fans_out_to_every_channel() {
        let output = map_channels(vec![0.5, -0.3], 1, 2).unwrap();
        assert_eq!(output, vec![0.5, 0.5, -0.3, -0.3]);

        let output = map_channels(vec![0.25], 1, 4).unwrap();
        assert_eq!(output, vec![0.25; 4]);
    }

    #[test]
    fn test_downmix_to_mono_averages() {
        let output = map_channels(vec![0.5, 0.3, -0.2, 0.4], 2, 1).unwrap();

        assert_eq!(output.len(), 2);
        assert!((output[0] - 0.4).abs() < 1e-6);
        assert!((output[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_surround_keeps_front_pair_for_stereo() {
        let input = vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 0.0, 0.0];
        let output = map_channels(input, 6, 2).unwrap();
        assert_eq!(output, vec![0.1, 0.2, 0.7, 0.8]);
    }

    #[test]
    fn test_same_layout_is_untouched() {
        let input = vec![0.5, -0.3, 0.8, 0.2];
        assert_eq!(map_channels(input.clone(), 2, 2).unwrap(), input);
    }

    #[test]
    fn test_upmix_from_stereo_is_rejected() {
        let result = map_channels(vec![0.5, -0.3], 2, 4);
        assert!(matches!(
            result,
            Err(SampleLoadError::UnsupportedChannels { .. })
        ));
    }
}
