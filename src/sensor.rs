//! Ambient light sensor.
//!
//! A [`LightSensor`] delivers samples over an mpsc channel while its
//! [`SensorSubscription`] is alive. Dropping the subscription stops the poll
//! thread before returning, so nothing is sent after that point.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::constants::DEFAULT_SENSOR_INTERVAL;
use crate::errors::SensorError;

const IIO_DEVICES: &str = "/sys/bus/iio/devices";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub lux: f32,
    pub at: Instant,
}

pub trait LightSensor {
    /// Takes effect on the next subscription.
    fn set_update_interval(&mut self, interval: Duration);

    fn subscribe(&mut self, tx: Sender<LightSample>) -> Result<SensorSubscription, SensorError>;
}

/// Live sensor subscription; drop it to stop the samples.
pub struct SensorSubscription {
    stop: Arc<AtomicBool>,
    subscribed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for SensorSubscription {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("Light sensor thread panicked");
            }
        }
        self.subscribed.store(false, Ordering::SeqCst);
    }
}

/// Source of single illuminance readings.
pub trait LuxReader: Send + 'static {
    fn read_lux(&mut self) -> Result<f32, SensorError>;
}

impl<F> LuxReader for F
where
    F: FnMut() -> Result<f32, SensorError> + Send + 'static,
{
    fn read_lux(&mut self) -> Result<f32, SensorError> {
        self()
    }
}

/// Polls a [`LuxReader`] on a background thread.
pub struct PolledLightSensor<R: LuxReader> {
    reader: Arc<Mutex<R>>,
    interval: Duration,
    subscribed: Arc<AtomicBool>,
}

impl<R: LuxReader> PolledLightSensor<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Arc::new(Mutex::new(reader)),
            interval: DEFAULT_SENSOR_INTERVAL,
            subscribed: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl<R: LuxReader> LightSensor for PolledLightSensor<R> {
    fn set_update_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    fn subscribe(&mut self, tx: Sender<LightSample>) -> Result<SensorSubscription, SensorError> {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(SensorError::AlreadySubscribed);
        }

        // Probe once so a denied or missing sensor fails here instead of
        // producing a silent thread.
        let probe = self
            .reader
            .lock()
            .map_err(|_| SensorError::Unavailable)
            .and_then(|mut reader| reader.read_lux());
        if let Err(err) = probe {
            self.subscribed.store(false, Ordering::SeqCst);
            return Err(err);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let reader = self.reader.clone();
        let interval = self.interval;

        let handle = thread::spawn(move || {
            let mut warned = false;
            while !thread_stop.load(Ordering::SeqCst) {
                let reading = match reader.lock() {
                    Ok(mut reader) => reader.read_lux(),
                    Err(_) => break,
                };
                match reading {
                    Ok(lux) => {
                        warned = false;
                        let sample = LightSample {
                            lux,
                            at: Instant::now(),
                        };
                        if thread_stop.load(Ordering::SeqCst) || tx.send(sample).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        if !warned {
                            log::warn!("Light sensor read failed: {err}");
                            warned = true;
                        }
                    }
                }
                thread::park_timeout(interval);
            }
        });

        Ok(SensorSubscription {
            stop,
            subscribed: self.subscribed.clone(),
            handle: Some(handle),
        })
    }
}

/// Illuminance from a Linux IIO light sensor in sysfs.
#[derive(Debug, Clone)]
pub struct SysfsLuxReader {
    path: PathBuf,
    scale: f32,
}

impl SysfsLuxReader {
    /// First IIO device under `/sys/bus/iio/devices` exposing illuminance.
    pub fn discover() -> Result<Self, SensorError> {
        Self::discover_in(Path::new(IIO_DEVICES))
    }

    pub fn discover_in(root: &Path) -> Result<Self, SensorError> {
        let entries = std::fs::read_dir(root).map_err(map_io)?;

        let mut devices: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .collect();
        devices.sort();

        devices
            .iter()
            .find_map(|dir| Self::open(dir).ok())
            .ok_or(SensorError::Unavailable)
    }

    /// Reader for one device directory.
    ///
    /// Prefers the processed `in_illuminance_input`; falls back to
    /// `in_illuminance_raw` times `in_illuminance_scale`.
    pub fn open(device_dir: &Path) -> Result<Self, SensorError> {
        let input = device_dir.join("in_illuminance_input");
        if input.is_file() {
            return Ok(Self {
                path: input,
                scale: 1.0,
            });
        }

        let raw = device_dir.join("in_illuminance_raw");
        if raw.is_file() {
            let scale_path = device_dir.join("in_illuminance_scale");
            let scale = if scale_path.is_file() {
                read_value(&scale_path)?
            } else {
                1.0
            };
            return Ok(Self { path: raw, scale });
        }

        Err(SensorError::Unavailable)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LuxReader for SysfsLuxReader {
    fn read_lux(&mut self) -> Result<f32, SensorError> {
        Ok(read_value(&self.path)? * self.scale)
    }
}

fn read_value(path: &Path) -> Result<f32, SensorError> {
    let text = std::fs::read_to_string(path).map_err(map_io)?;
    text.trim().parse::<f32>().map_err(|err| {
        SensorError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {err}", path.display()),
        ))
    })
}

fn map_io(err: io::Error) -> SensorError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => SensorError::PermissionDenied,
        io::ErrorKind::NotFound => SensorError::Unavailable,
        _ => SensorError::Io(err),
    }
}
