use thiserror::Error;

/// Errors raised at the media hardware boundary.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The user (or platform) refused camera/microphone access.
    #[error("permission to access camera/microphone was denied")]
    PermissionDenied,

    /// No usable capture device, or the device disappeared mid-session.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The track does not support the requested control (torch, zoom, ...).
    #[error("camera control not supported")]
    ControlUnsupported,

    /// The track supports the control but failed to apply it.
    #[error("camera control failed: {0}")]
    ControlFailed(String),

    /// Frame encoding on the platform image surface failed.
    #[error("frame encoding failed: {0}")]
    EncodeFailed(String),
}

/// Errors raised at the transport boundary to the inference service.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The API key was rejected by the remote service. Fatal, never retried.
    #[error("invalid API credential: {0}")]
    InvalidCredential(String),

    /// The network is unreachable. Fatal until an online signal re-arms.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Connection handshake failed for a reason other than the above.
    #[error("transport handshake failed: {0}")]
    Handshake(String),

    /// The channel is closed; sends on a closed session land here.
    #[error("transport closed: {0}")]
    Closed(String),
}
