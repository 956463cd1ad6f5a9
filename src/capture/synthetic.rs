//! Hardware-free capture backend for tests, demos and batch runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::CaptureError;

use super::device::{
    AcquiredMedia, AudioWindow, CameraCapabilities, CameraControl, CameraTrack, CaptureConfig,
    MediaDevice, MicrophoneTrack, TrackSettings,
};
use super::frame::RawFrame;

/// A `MediaDevice` that fabricates camera and microphone tracks in-process.
pub struct SyntheticDevice {
    capabilities: CameraCapabilities,
    settings: TrackSettings,
    produce_frames: bool,
    acquire_error: Mutex<Option<CaptureError>>,
}

impl SyntheticDevice {
    pub fn new() -> Self {
        Self::with_capabilities(CameraCapabilities {
            has_torch: true,
            has_zoom: true,
            min_zoom: 1.0,
            max_zoom: 3.0,
            zoom_step: 0.5,
        })
    }

    pub fn with_capabilities(capabilities: CameraCapabilities) -> Self {
        Self {
            capabilities,
            settings: TrackSettings {
                torch_on: false,
                zoom: capabilities.min_zoom,
            },
            produce_frames: true,
            acquire_error: Mutex::new(None),
        }
    }

    /// A device whose camera never has a frame ready, as during warm-up.
    pub fn without_frames() -> Self {
        Self {
            produce_frames: false,
            ..Self::new()
        }
    }

    /// Fail the next acquisition with the given error (permission prompts,
    /// missing devices).
    pub fn failing(error: CaptureError) -> Self {
        let device = Self::new();
        *device.acquire_error.lock().unwrap() = Some(error);
        device
    }
}

impl Default for SyntheticDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MediaDevice for SyntheticDevice {
    async fn acquire(&self, config: &CaptureConfig) -> Result<AcquiredMedia, CaptureError> {
        if let Some(error) = self.acquire_error.lock().unwrap().take() {
            return Err(error);
        }

        Ok(AcquiredMedia {
            microphone: Box::new(SyntheticMicrophone::new(config)),
            camera: Arc::new(SyntheticCamera::new(
                self.capabilities,
                self.settings,
                self.produce_frames,
            )),
        })
    }
}

/// Emits windows of a low-amplitude sine tone at the configured cadence.
pub struct SyntheticMicrophone {
    sample_rate: u32,
    window_samples: usize,
    running: Arc<AtomicBool>,
    pump: Option<JoinHandle<()>>,
}

impl SyntheticMicrophone {
    fn new(config: &CaptureConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            window_samples: config.window_samples,
            running: Arc::new(AtomicBool::new(false)),
            pump: None,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneTrack for SyntheticMicrophone {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioWindow>, CaptureError> {
        let (tx, rx) = mpsc::channel(8);

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let sample_rate = self.sample_rate;
        let window_samples = self.window_samples;
        let period = Duration::from_secs_f64(window_samples as f64 / sample_rate as f64);

        self.pump = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut phase = 0.0f32;
            let step = 440.0 * 2.0 * std::f32::consts::PI / sample_rate as f32;

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;

                let mut samples = Vec::with_capacity(window_samples);
                for _ in 0..window_samples {
                    samples.push(0.1 * phase.sin());
                    phase += step;
                }

                if tx
                    .send(AudioWindow {
                        samples,
                        sample_rate,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            debug!("Synthetic microphone pump finished");
        }));

        Ok(rx)
    }

    async fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

struct CameraState {
    torch_on: bool,
    zoom: f64,
    frame_counter: u8,
    stopped: bool,
}

/// Serves a moving gradient test pattern at 1280x720.
pub struct SyntheticCamera {
    capabilities: CameraCapabilities,
    produce_frames: bool,
    state: Mutex<CameraState>,
}

impl SyntheticCamera {
    fn new(capabilities: CameraCapabilities, settings: TrackSettings, produce_frames: bool) -> Self {
        Self {
            capabilities,
            produce_frames,
            state: Mutex::new(CameraState {
                torch_on: settings.torch_on,
                zoom: settings.zoom,
                frame_counter: 0,
                stopped: false,
            }),
        }
    }
}

impl CameraTrack for SyntheticCamera {
    fn capabilities(&self) -> CameraCapabilities {
        self.capabilities
    }

    fn settings(&self) -> TrackSettings {
        let state = self.state.lock().unwrap();
        TrackSettings {
            torch_on: state.torch_on,
            zoom: state.zoom,
        }
    }

    fn latest_frame(&self) -> Option<RawFrame> {
        let mut state = self.state.lock().unwrap();
        if state.stopped || !self.produce_frames {
            return None;
        }
        state.frame_counter = state.frame_counter.wrapping_add(1);
        let shift = state.frame_counter;

        let (width, height) = (1280u32, 720u32);
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push((x % 256) as u8);
                pixels.push((y % 256) as u8);
                pixels.push(shift);
            }
        }

        Some(RawFrame {
            width,
            height,
            pixels,
        })
    }

    fn apply(&self, control: CameraControl) -> Result<(), CaptureError> {
        let mut state = self.state.lock().unwrap();
        match control {
            CameraControl::Torch(on) => {
                if !self.capabilities.has_torch {
                    return Err(CaptureError::ControlUnsupported);
                }
                state.torch_on = on;
                Ok(())
            }
            CameraControl::Zoom(zoom) => {
                if !self.capabilities.has_zoom {
                    return Err(CaptureError::ControlUnsupported);
                }
                if zoom < self.capabilities.min_zoom || zoom > self.capabilities.max_zoom {
                    return Err(CaptureError::ControlFailed(format!(
                        "zoom {} outside {}..{}",
                        zoom, self.capabilities.min_zoom, self.capabilities.max_zoom
                    )));
                }
                state.zoom = zoom;
                Ok(())
            }
            CameraControl::ContinuousFocus => Ok(()),
            CameraControl::ContinuousExposure | CameraControl::ContinuousWhiteBalance => {
                Err(CaptureError::ControlUnsupported)
            }
        }
    }

    fn encode_jpeg(&self, frame: &RawFrame, _quality: u8) -> Result<Vec<u8>, CaptureError> {
        // JPEG-shaped envelope around the raw pixels. Synthetic frames are
        // only ever consumed by the loopback transport, never decoded.
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(&frame.width.to_be_bytes());
        jpeg.extend_from_slice(&frame.height.to_be_bytes());
        jpeg.extend_from_slice(&frame.pixels);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        Ok(jpeg)
    }

    fn stop(&self) {
        self.state.lock().unwrap().stopped = true;
    }
}
