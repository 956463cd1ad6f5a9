//! The bidirectional channel to the remote inference service, modeled at its
//! boundary: connect with typed parameters, send realtime media, receive
//! typed server events.

pub mod loopback;
pub mod messages;

use tokio::sync::mpsc;

use crate::error::TransportError;

pub use loopback::{LoopbackHandle, LoopbackSynthesizer, LoopbackTransport};
pub use messages::{
    ConnectParams, InlineAudio, Modality, RealtimeInput, ResumptionUpdate, ServerMessage,
    SpeechConfig,
};

/// Events delivered by the transport to the session controller.
///
/// A typed event stream replaces per-callback wiring: the state machine's
/// transition function is the single consumer.
#[derive(Debug)]
pub enum TransportEvent {
    /// The channel is open and media may flow.
    Opened,
    /// A message from the remote service.
    Message(ServerMessage),
    /// A transport-level error. The channel may still close separately.
    Error(TransportError),
    /// The channel closed, intentionally or not.
    Closed,
}

/// An open live session.
#[async_trait::async_trait]
pub trait LiveSession: Send + Sync {
    /// Fire-and-forget media send. Failures mean the chunk is lost, which is
    /// acceptable: frames and audio windows are perishable.
    async fn send_realtime(&self, input: RealtimeInput) -> Result<(), TransportError>;

    /// Close the channel. The transport emits `Closed` afterwards.
    async fn close(&self);
}

/// Connection factory for live sessions.
#[async_trait::async_trait]
pub trait LiveTransport: Send + Sync {
    async fn connect(
        &self,
        params: ConnectParams,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn LiveSession>, TransportError>;
}

/// One-shot speech synthesis, independent of the live session. Used for the
/// proactive greeting played while the first connection is being established.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<InlineAudio, TransportError>;
}
