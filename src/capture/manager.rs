use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CaptureError;

use super::device::{
    AcquiredMedia, CameraCapabilities, CameraControl, CaptureConfig, MediaChunk, MediaDevice,
};
use super::frame::f32_to_pcm16;

/// Numeric tolerance when deciding whether a zoom bound has been reached,
/// absorbing floating-point noise from the hardware layer.
const ZOOM_EPSILON: f64 = 0.01;

/// Direction of a zoom step request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Owns the acquired camera/microphone tracks and produces outbound media.
///
/// Acquisition happens at most once per session lifetime; the tracks stay
/// warm across reconnect attempts and are only released on full teardown.
pub struct CaptureManager {
    config: CaptureConfig,
    media: Option<AcquiredMedia>,
    capabilities: Option<CameraCapabilities>,
    flashlight_on: bool,
    current_zoom: f64,
}

impl CaptureManager {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            media: None,
            capabilities: None,
            flashlight_on: false,
            current_zoom: 1.0,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.media.is_some()
    }

    pub fn capabilities(&self) -> Option<CameraCapabilities> {
        self.capabilities
    }

    pub fn flashlight_on(&self) -> bool {
        self.flashlight_on
    }

    pub fn current_zoom(&self) -> f64 {
        self.current_zoom
    }

    /// Acquire camera + microphone. A no-op when already acquired, so the
    /// reconnect path never re-prompts the user.
    pub async fn acquire(&mut self, device: &dyn MediaDevice) -> Result<(), CaptureError> {
        if self.media.is_some() {
            debug!("Media already acquired, reusing warm tracks");
            return Ok(());
        }

        info!(
            "Requesting camera + microphone ({}Hz mono, {}px @ {:.1} fps)",
            self.config.sample_rate, self.config.target_resolution, self.config.frame_rate
        );

        let media = device.acquire(&self.config).await?;

        let capabilities = media.camera.capabilities();
        let settings = media.camera.settings();
        info!(
            "Camera acquired: torch={}, zoom={} ({}..{} step {})",
            capabilities.has_torch,
            capabilities.has_zoom,
            capabilities.min_zoom,
            capabilities.max_zoom,
            capabilities.zoom_step
        );

        // Continuous focus/exposure/white-balance, best-effort.
        for control in [
            CameraControl::ContinuousFocus,
            CameraControl::ContinuousExposure,
            CameraControl::ContinuousWhiteBalance,
        ] {
            match media.camera.apply(control) {
                Ok(()) => {}
                Err(CaptureError::ControlUnsupported) => {
                    debug!("Camera control {:?} not supported", control)
                }
                Err(e) => warn!("Failed to apply camera control {:?}: {}", control, e),
            }
        }

        self.capabilities = Some(capabilities);
        self.flashlight_on = settings.torch_on;
        self.current_zoom = if capabilities.has_zoom {
            settings.zoom
        } else {
            1.0
        };
        self.media = Some(media);

        Ok(())
    }

    /// Start the microphone pump: one `MediaChunk::Audio` per callback window.
    ///
    /// Runs until the track stops delivering windows or the task is aborted.
    /// Chunks that cannot be queued are dropped silently (audio is perishable).
    pub async fn start_audio(
        &mut self,
        chunks: mpsc::Sender<MediaChunk>,
    ) -> Result<JoinHandle<()>, CaptureError> {
        let media = self
            .media
            .as_mut()
            .ok_or_else(|| CaptureError::DeviceUnavailable("media not acquired".to_string()))?;

        let mut windows = media.microphone.start().await?;

        Ok(tokio::spawn(async move {
            debug!("Audio pump started");
            while let Some(window) = windows.recv().await {
                let chunk = MediaChunk::Audio {
                    pcm: f32_to_pcm16(&window.samples),
                    sample_rate: window.sample_rate,
                };
                if chunks.try_send(chunk).is_err() {
                    debug!("Dropping audio window, outbound queue full or closed");
                }
            }
            debug!("Audio pump stopped");
        }))
    }

    /// Start the frame timer: crop, scale and encode one frame per tick.
    ///
    /// Ticks where the source frame is not ready (no frame yet, zero-sized)
    /// are skipped silently; that is normal during camera warm-up.
    pub fn start_video(
        &self,
        chunks: mpsc::Sender<MediaChunk>,
    ) -> Result<JoinHandle<()>, CaptureError> {
        let media = self
            .media
            .as_ref()
            .ok_or_else(|| CaptureError::DeviceUnavailable("media not acquired".to_string()))?;

        let camera = media.camera.clone();
        let target = self.config.target_resolution;
        let quality = self.config.jpeg_quality;
        let period = Duration::from_secs_f64(1.0 / self.config.frame_rate);

        Ok(tokio::spawn(async move {
            debug!("Frame timer started, period {:?}", period);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                let Some(frame) = camera.latest_frame() else {
                    continue;
                };
                if frame.width == 0 || frame.height == 0 {
                    continue;
                }

                let scaled = frame.crop_center_square().scale_to(target);
                match camera.encode_jpeg(&scaled, quality) {
                    Ok(jpeg) => {
                        if chunks.try_send(MediaChunk::VideoFrame { jpeg }).is_err() {
                            debug!("Dropping video frame, outbound queue full or closed");
                        }
                    }
                    Err(e) => warn!("Frame encoding failed: {}", e),
                }
            }
        }))
    }

    /// Toggle the torch. A no-op when the capability is absent.
    pub fn toggle_torch(&mut self) -> bool {
        let has_torch = self.capabilities.map(|c| c.has_torch).unwrap_or(false);
        let Some(media) = &self.media else {
            return self.flashlight_on;
        };
        if !has_torch {
            return self.flashlight_on;
        }

        let next = !self.flashlight_on;
        match media.camera.apply(CameraControl::Torch(next)) {
            Ok(()) => self.flashlight_on = next,
            Err(e) => warn!("Failed to toggle torch: {}", e),
        }
        self.flashlight_on
    }

    /// Step the zoom, clamped to the capability range. A no-op when zoom is
    /// unsupported or the bound has already been reached.
    pub fn change_zoom(&mut self, direction: ZoomDirection) -> f64 {
        let Some(capabilities) = self.capabilities else {
            return self.current_zoom;
        };
        let Some(media) = &self.media else {
            return self.current_zoom;
        };
        if !capabilities.has_zoom {
            return self.current_zoom;
        }

        let target = match direction {
            ZoomDirection::In => {
                (self.current_zoom + capabilities.zoom_step).min(capabilities.max_zoom)
            }
            ZoomDirection::Out => {
                (self.current_zoom - capabilities.zoom_step).max(capabilities.min_zoom)
            }
        };

        if (target - self.current_zoom).abs() < ZOOM_EPSILON {
            return self.current_zoom;
        }

        match media.camera.apply(CameraControl::Zoom(target)) {
            Ok(()) => self.current_zoom = target,
            Err(e) => warn!("Failed to change zoom: {}", e),
        }
        self.current_zoom
    }

    /// Release all hardware: torch off if lit, stop both tracks, clear the
    /// capability snapshot. Safe to call repeatedly.
    pub async fn release(&mut self) {
        if let Some(media) = self.media.take() {
            info!("Releasing capture hardware");
            if self.flashlight_on {
                if let Err(e) = media.camera.apply(CameraControl::Torch(false)) {
                    warn!("Failed to turn off torch during release: {}", e);
                }
            }
            media.camera.stop();

            let mut microphone = media.microphone;
            microphone.stop().await;
        }

        self.capabilities = None;
        self.flashlight_on = false;
        self.current_zoom = 1.0;
    }
}
