pub mod capture;
pub mod config;
pub mod credentials;
pub mod error;
pub mod playback;
pub mod session;
pub mod transport;

pub use capture::{
    CameraCapabilities, CaptureConfig, CaptureManager, MediaChunk, MediaDevice, SyntheticDevice,
    ZoomDirection,
};
pub use config::Config;
pub use credentials::{CredentialStore, FileCredentialStore, StaticCredentials};
pub use error::{CaptureError, TransportError};
pub use playback::{AudioBuffer, AudioOutput, PlaybackClock, PlaybackScheduler};
pub use session::{
    Collaborators, RetryPolicy, RetryState, SessionConfig, SessionController, SessionSnapshot,
    SessionStatus, MAX_RETRIES,
};
pub use transport::{
    ConnectParams, LiveSession, LiveTransport, LoopbackHandle, LoopbackTransport, ServerMessage,
    SpeechSynthesizer, TransportEvent,
};
