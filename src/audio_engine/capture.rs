//! Microphone capture to 16-bit WAV files.
//!
//! The input callback only pushes samples into a ring buffer; the control
//! thread drains it into the WAV writer from [`RecordingService::pump`] and on
//! finish.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BuildStreamError, DefaultStreamConfigError, Stream};
use hound::{SampleFormat, WavSpec, WavWriter};
use rtrb::{Consumer, RingBuffer};

use crate::acquisition::{RecordingService, SessionMode};
use crate::audio_engine::constants::CAPTURE_QUEUE_CAPACITY;
use crate::errors::CaptureError;

struct CaptureSession {
    stream: Stream,
    consumer: Consumer<f32>,
    writer: WavWriter<BufWriter<File>>,
    path: PathBuf,
    overflowed: Arc<AtomicBool>,
}

/// Records the default input device into numbered takes under `output_dir`.
pub struct CpalRecorder {
    output_dir: PathBuf,
    mode: SessionMode,
    session: Option<CaptureSession>,
    takes: u32,
}

impl CpalRecorder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            mode: SessionMode::PlaybackOnly,
            session: None,
            takes: 0,
        }
    }

    fn next_take_path(&mut self) -> PathBuf {
        loop {
            self.takes += 1;
            let path = self.output_dir.join(format!("mic-{}.wav", self.takes));
            if !path.exists() {
                return path;
            }
        }
    }

    fn open_session(&mut self) -> Result<CaptureSession, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config().map_err(|err| match err {
            DefaultStreamConfigError::DeviceNotAvailable => CaptureError::NoDevice,
            other => CaptureError::Stream(other.to_string()),
        })?;
        let stream_config: cpal::StreamConfig = supported.into();

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.next_take_path();
        let spec = WavSpec {
            channels: stream_config.channels,
            sample_rate: stream_config.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&path, spec)?;

        let (mut producer, consumer) = RingBuffer::new(CAPTURE_QUEUE_CAPACITY);
        let overflowed = Arc::new(AtomicBool::new(false));
        let overflow_flag = overflowed.clone();

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    for &sample in data {
                        if producer.push(sample).is_err() {
                            overflow_flag.store(true, Ordering::Relaxed);
                            break;
                        }
                    }
                },
                |err| {
                    log::error!("Audio input stream error: {}", err);
                },
                None,
            )
            .map_err(|err| match err {
                BuildStreamError::DeviceNotAvailable => CaptureError::NoDevice,
                other => CaptureError::Stream(other.to_string()),
            })?;

        stream
            .play()
            .map_err(|err| CaptureError::Stream(err.to_string()))?;

        log::info!(
            "Capturing {} ch@{} Hz into {}",
            stream_config.channels,
            stream_config.sample_rate,
            path.display()
        );

        Ok(CaptureSession {
            stream,
            consumer,
            writer,
            path,
            overflowed,
        })
    }
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn drain(session: &mut CaptureSession) -> Result<(), CaptureError> {
    while let Ok(sample) = session.consumer.pop() {
        session.writer.write_sample(to_pcm16(sample))?;
    }
    if session.overflowed.swap(false, Ordering::Relaxed) {
        log::warn!("Capture buffer overflowed, samples were dropped");
    }
    Ok(())
}

/// Finalize the take, or delete it if anything before or during finalizing failed.
fn close_take<W>(
    drained: Result<(), CaptureError>,
    writer: WavWriter<W>,
    path: PathBuf,
) -> Result<PathBuf, CaptureError>
where
    W: std::io::Write + std::io::Seek,
{
    let closed = drained.and_then(|()| writer.finalize().map_err(CaptureError::from));
    match closed {
        Ok(()) => Ok(path),
        Err(err) => {
            discard_take(&path);
            Err(err)
        }
    }
}

fn discard_take(path: &Path) {
    if let Err(err) = std::fs::remove_file(path) {
        log::debug!("Could not remove take {}: {}", path.display(), err);
    }
}

impl RecordingService for CpalRecorder {
    fn configure_session(&mut self, mode: SessionMode) -> Result<(), CaptureError> {
        if mode == SessionMode::PlaybackOnly && self.session.is_some() {
            return Err(CaptureError::SessionBusy);
        }
        log::debug!("Audio session mode: {:?}", mode);
        self.mode = mode;
        Ok(())
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        if self.session.is_some() {
            return Err(CaptureError::SessionBusy);
        }
        if self.mode != SessionMode::PlayAndRecord {
            return Err(CaptureError::PlaybackOnlySession);
        }
        self.session = Some(self.open_session()?);
        Ok(())
    }

    fn pump(&mut self) -> Result<(), CaptureError> {
        match self.session.as_mut() {
            Some(session) => drain(session),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> Result<PathBuf, CaptureError> {
        let mut session = self.session.take().ok_or(CaptureError::NoSession)?;

        // Stop the callback before the final drain.
        let _ = session.stream.pause();
        let drained = drain(&mut session);

        let CaptureSession { stream, writer, path, .. } = session;
        drop(stream);
        close_take(drained, writer, path)
    }

    fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            let path = session.path.clone();
            drop(session);
            discard_take(&path);
        }
    }

    fn is_recording(&self) -> bool {
        self.session.is_some()
    }
}
