use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::capture::MediaChunk;

/// Response media the model is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Audio,
    Text,
}

/// Voice selection for spoken responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub voice: String,
}

/// Parameters for opening a live session against the inference service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectParams {
    pub model: String,
    pub response_modalities: Vec<Modality>,
    pub speech_config: SpeechConfig,
    pub system_instruction: String,
    /// Opaque handle from a previous session, letting the service restore
    /// prior conversational context instead of starting cold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resumption: Option<String>,
}

/// One outbound realtime media payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeInput {
    /// Base64-encoded media bytes.
    pub data: String,
    pub mime_type: String,
}

impl From<MediaChunk> for RealtimeInput {
    fn from(chunk: MediaChunk) -> Self {
        let engine = base64::engine::general_purpose::STANDARD;
        match chunk {
            MediaChunk::Audio { pcm, sample_rate } => Self {
                data: engine.encode(pcm),
                mime_type: format!("audio/pcm;rate={}", sample_rate),
            },
            MediaChunk::VideoFrame { jpeg } => Self {
                data: engine.encode(jpeg),
                mime_type: "image/jpeg".to_string(),
            },
        }
    }
}

/// Session-resumption handle update carried by a server message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumptionUpdate {
    pub resumable: bool,
    pub handle: String,
}

/// Inline audio payload from the model (base64 pcm16).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineAudio {
    pub data: String,
    pub sample_rate: u32,
}

impl InlineAudio {
    /// Decode the base64 payload back to raw pcm16 bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .context("Failed to decode inline audio payload")
    }
}

/// One message from the inference service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Updated resumption handle, when the service issues one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumption: Option<ResumptionUpdate>,

    /// Incremental output transcript text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_delta: Option<String>,

    /// Marks the end of the current model turn.
    #[serde(default)]
    pub turn_complete: bool,

    /// Spoken response fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<InlineAudio>,

    /// The user barged in; all pending playback must be flushed.
    #[serde(default)]
    pub interrupted: bool,
}

impl ServerMessage {
    pub fn transcript(text: impl Into<String>) -> Self {
        Self {
            transcript_delta: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn audio_chunk(pcm: &[u8], sample_rate: u32) -> Self {
        Self {
            audio: Some(InlineAudio {
                data: base64::engine::general_purpose::STANDARD.encode(pcm),
                sample_rate,
            }),
            ..Self::default()
        }
    }

    pub fn turn_complete() -> Self {
        Self {
            turn_complete: true,
            ..Self::default()
        }
    }

    pub fn interrupted() -> Self {
        Self {
            interrupted: true,
            ..Self::default()
        }
    }

    pub fn resumption_update(handle: impl Into<String>) -> Self {
        Self {
            resumption: Some(ResumptionUpdate {
                resumable: true,
                handle: handle.into(),
            }),
            ..Self::default()
        }
    }
}
