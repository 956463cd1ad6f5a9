//! Media capture: camera/microphone acquisition, frame production and
//! hardware controls.
//!
//! The platform media stack sits behind the [`MediaDevice`] /
//! [`MicrophoneTrack`] / [`CameraTrack`] traits; [`CaptureManager`] owns the
//! acquired tracks and turns them into outbound [`MediaChunk`]s.

pub mod device;
pub mod frame;
pub mod manager;
pub mod synthetic;

pub use device::{
    AcquiredMedia, AudioWindow, CameraCapabilities, CameraControl, CameraTrack, CaptureConfig,
    MediaChunk, MediaDevice, MicrophoneTrack, TrackSettings,
};
pub use frame::{f32_to_pcm16, RawFrame};
pub use manager::{CaptureManager, ZoomDirection};
pub use synthetic::{SyntheticCamera, SyntheticDevice, SyntheticMicrophone};
