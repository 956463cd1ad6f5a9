use crate::capture::CaptureConfig;
use crate::transport::{ConnectParams, Modality, SpeechConfig};

use super::retry::RetryPolicy;

/// Configuration for one assistant session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier, for log correlation.
    pub session_id: String,

    /// Inference model name.
    pub model: String,

    /// Prebuilt voice used for spoken responses and the greeting.
    pub voice: String,

    /// System instruction sent on every connect.
    pub system_instruction: String,

    /// Greeting synthesized out-of-band on cold start; `None` disables it.
    pub greeting: Option<String>,

    /// Reconnect backoff policy.
    pub retry: RetryPolicy,

    /// Camera/microphone capture settings.
    pub capture: CaptureConfig,

    /// Sample rate of model audio output, in Hz.
    pub output_sample_rate: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Zephyr".to_string(),
            system_instruction:
                "You are a realtime vision assistant. Describe what the camera sees, \
                 prioritizing safety, in short clear sentences."
                    .to_string(),
            greeting: Some("Hello! How can I help you today?".to_string()),
            retry: RetryPolicy::default(),
            capture: CaptureConfig::default(),
            output_sample_rate: 24000,
        }
    }
}

impl SessionConfig {
    /// Connection parameters for the next connect attempt.
    pub fn connect_params(&self, resumption: Option<String>) -> ConnectParams {
        ConnectParams {
            model: self.model.clone(),
            response_modalities: vec![Modality::Audio],
            speech_config: SpeechConfig {
                voice: self.voice.clone(),
            },
            system_instruction: self.system_instruction.clone(),
            session_resumption: resumption,
        }
    }
}
