use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::CaptureError;
use super::frame::RawFrame;

/// One outbound unit of media, ready for the transport.
///
/// Immutable once produced; ownership moves to the transport on send and the
/// chunk is discarded afterwards (frames and audio are perishable).
#[derive(Debug, Clone)]
pub enum MediaChunk {
    /// 16-bit little-endian PCM audio.
    Audio { pcm: Vec<u8>, sample_rate: u32 },
    /// A JPEG-encoded video frame.
    VideoFrame { jpeg: Vec<u8> },
}

/// A window of floating-point samples from the microphone callback.
#[derive(Debug, Clone)]
pub struct AudioWindow {
    /// Mono samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Capability snapshot of the acquired camera track.
///
/// Captured once per acquisition and immutable for the life of the track.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraCapabilities {
    pub has_torch: bool,
    pub has_zoom: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
}

impl Default for CameraCapabilities {
    fn default() -> Self {
        Self {
            has_torch: false,
            has_zoom: false,
            min_zoom: 1.0,
            max_zoom: 1.0,
            zoom_step: 0.1,
        }
    }
}

/// Torch/zoom state reported by the track right after acquisition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackSettings {
    pub torch_on: bool,
    pub zoom: f64,
}

/// Controls the capture manager may apply to the camera track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraControl {
    Torch(bool),
    Zoom(f64),
    /// Continuous autofocus, applied best-effort at acquisition.
    ContinuousFocus,
    /// Continuous auto-exposure, applied best-effort at acquisition.
    ContinuousExposure,
    /// Continuous white balance, applied best-effort at acquisition.
    ContinuousWhiteBalance,
}

/// Capture configuration (frame cadence, resolution, audio format).
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Video frames per second sent to the model.
    pub frame_rate: f64,
    /// Side length of the square frame sent to the model, in pixels.
    pub target_resolution: u32,
    /// JPEG quality in 1..=100.
    pub jpeg_quality: u8,
    /// Microphone sample rate in Hz.
    pub sample_rate: u32,
    /// Samples per audio callback window.
    pub window_samples: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            frame_rate: 1.0,         // 1 fps is enough for scene description
            target_resolution: 768,
            jpeg_quality: 80,
            sample_rate: 16000,      // 16kHz mono for the model's audio input
            window_samples: 4096,
        }
    }
}

/// Microphone side of an acquired media stream.
///
/// `start` hands back a channel that receives one `AudioWindow` per callback
/// while the audio graph is connected; `stop` disconnects the graph.
#[async_trait::async_trait]
pub trait MicrophoneTrack: Send + Sync {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioWindow>, CaptureError>;

    async fn stop(&mut self);
}

/// Camera side of an acquired media stream.
///
/// Implementations wrap the platform media track plus the 2D drawing surface
/// used for frame readback and JPEG encoding.
pub trait CameraTrack: Send + Sync {
    /// Capability snapshot, stable for the life of the track.
    fn capabilities(&self) -> CameraCapabilities;

    /// Torch/zoom state at acquisition time.
    fn settings(&self) -> TrackSettings;

    /// Most recent frame, or `None` when the source is not ready yet.
    fn latest_frame(&self) -> Option<RawFrame>;

    /// Apply a hardware control. `ControlUnsupported` is expected for
    /// capabilities the track does not have.
    fn apply(&self, control: CameraControl) -> Result<(), CaptureError>;

    /// Encode a frame to JPEG on the platform image surface.
    fn encode_jpeg(&self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>, CaptureError>;

    /// Stop the track and release the underlying hardware.
    fn stop(&self);
}

/// The pair of live tracks handed out by a device acquisition.
pub struct AcquiredMedia {
    pub microphone: Box<dyn MicrophoneTrack>,
    pub camera: Arc<dyn CameraTrack>,
}

/// The device media-capture API (camera + microphone acquisition).
///
/// Acquisition prompts the user at most once per session lifetime; the
/// returned tracks are reused warm across reconnect attempts.
#[async_trait::async_trait]
pub trait MediaDevice: Send + Sync {
    async fn acquire(&self, config: &CaptureConfig) -> Result<AcquiredMedia, CaptureError>;
}
