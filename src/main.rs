use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use iris_live::credentials::StaticCredentials;
use iris_live::playback::{MemoryOutput, SystemClock};
use iris_live::transport::LoopbackSynthesizer;
use iris_live::{
    Collaborators, Config, CredentialStore, FileCredentialStore, LoopbackTransport, ServerMessage,
    SessionController, SyntheticDevice,
};
use tracing::info;

/// Runs a scripted assistant session against the in-process loopback
/// transport, exercising the full capture -> transport -> playback pipeline.
#[derive(Parser)]
#[command(name = "iris-live", version)]
struct Args {
    /// Configuration file (without extension), config-crate style.
    #[arg(long, default_value = "config/iris-live")]
    config: String,

    /// How long to keep the demo session running.
    #[arg(long, default_value_t = 5)]
    duration_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;
    info!("{} starting", cfg.service.name);

    let file_store = FileCredentialStore::new(&cfg.credentials.key_path);
    let credentials: Arc<dyn CredentialStore> = if file_store.api_key().is_some() {
        Arc::new(file_store)
    } else {
        info!(
            "No API key at {}, using a demo credential (loopback only)",
            cfg.credentials.key_path
        );
        Arc::new(StaticCredentials::new("demo-key"))
    };

    let session_config = cfg.session_config();
    let output_rate = session_config.output_sample_rate;

    let (transport, server) = LoopbackTransport::new();
    let output = Arc::new(MemoryOutput::new());

    let controller = SessionController::new(
        session_config,
        Collaborators {
            device: Arc::new(SyntheticDevice::new()),
            transport: Arc::new(transport),
            credentials,
            clock: Arc::new(SystemClock::new()),
            output: Arc::clone(&output) as _,
            synthesizer: Some(Arc::new(LoopbackSynthesizer::new(output_rate, 1.0))),
            on_credential_error: None,
        },
    );

    controller.start_session().await;

    // Script the server side of the conversation.
    server
        .emit_message(ServerMessage::transcript("I can see a desk with a laptop"))
        .await;
    server
        .emit_message(ServerMessage::audio_chunk(&vec![0u8; 4800], output_rate))
        .await;
    server
        .emit_message(ServerMessage::audio_chunk(&vec![0u8; 4800], output_rate))
        .await;
    tokio::time::sleep(Duration::from_secs(args.duration_secs / 2)).await;

    server.emit_message(ServerMessage::interrupted()).await;
    server
        .emit_message(ServerMessage::transcript("Sure, I will take another look"))
        .await;
    server.emit_message(ServerMessage::turn_complete()).await;
    tokio::time::sleep(Duration::from_secs(args.duration_secs.div_ceil(2))).await;

    let snapshot = controller.snapshot().await;
    info!("Session snapshot: {}", serde_json::to_string_pretty(&snapshot)?);
    info!("{} buffers scheduled", output.scheduled().len());
    info!("Client sent {} realtime chunks", server.sent().len());

    controller.stop_session().await;
    info!("Session stopped");

    Ok(())
}
