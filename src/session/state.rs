use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::CameraCapabilities;

/// Lifecycle state of the assistant session. Exactly one value at any time,
/// written only by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Connecting,
    Reconnecting,
    Active,
    Error,
}

impl SessionStatus {
    /// States in which a fresh `start_session` call is rejected.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionStatus::Connecting | SessionStatus::Reconnecting | SessionStatus::Active
        )
    }
}

/// Read-only view of the session for the surrounding UI.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,

    /// Accumulated transcript of the current model turn.
    pub transcription: String,

    /// Human-readable message for the `Error` status.
    pub error_message: Option<String>,

    /// Seconds since the session first became active.
    pub session_time_secs: u64,

    /// When the session first became active, if it ever did.
    pub started_at: Option<DateTime<Utc>>,

    pub camera_capabilities: Option<CameraCapabilities>,
    pub flashlight_on: bool,
    pub current_zoom: f64,
}
