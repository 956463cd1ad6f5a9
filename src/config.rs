use anyhow::Result;
use serde::Deserialize;

use crate::capture::CaptureConfig;
use crate::session::{RetryPolicy, SessionConfig};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub credentials: CredentialsConfig,
    pub inference: InferenceConfig,
    pub capture: CaptureSection,
    pub playback: PlaybackSection,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsConfig {
    /// Path of the file holding the single-line API key.
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct InferenceConfig {
    pub model: String,
    pub voice: String,
    pub system_instruction: String,
    pub greeting: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaptureSection {
    pub frame_rate: f64,
    pub target_resolution: u32,
    pub jpeg_quality: u8,
    pub sample_rate: u32,
    pub window_samples: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackSection {
    pub sample_rate: u32,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Assemble the per-session configuration from the loaded file.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            model: self.inference.model.clone(),
            voice: self.inference.voice.clone(),
            system_instruction: self.inference.system_instruction.clone(),
            greeting: self.inference.greeting.clone(),
            retry: RetryPolicy::default(),
            capture: CaptureConfig {
                frame_rate: self.capture.frame_rate,
                target_resolution: self.capture.target_resolution,
                jpeg_quality: self.capture.jpeg_quality,
                sample_rate: self.capture.sample_rate,
                window_samples: self.capture.window_samples,
            },
            output_sample_rate: self.playback.sample_rate,
            ..SessionConfig::default()
        }
    }
}
