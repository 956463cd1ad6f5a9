//! In-process transport used by the demo binary and the controller tests:
//! records everything the client sends and lets a harness script the server
//! side of the conversation.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::TransportError;

use super::messages::{ConnectParams, InlineAudio, RealtimeInput};
use super::{LiveSession, LiveTransport, SpeechSynthesizer, TransportEvent};

#[derive(Default)]
struct LoopbackState {
    auto_open: bool,
    fail_next_connect: Option<TransportError>,
    connects: Vec<ConnectParams>,
    events: Option<mpsc::Sender<TransportEvent>>,
    sent: Vec<RealtimeInput>,
}

/// Scriptable in-process `LiveTransport`.
pub struct LoopbackTransport {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackTransport {
    /// Build a transport that emits `Opened` immediately on connect, plus the
    /// handle a harness uses to drive the server side.
    pub fn new() -> (Self, LoopbackHandle) {
        let state = Arc::new(Mutex::new(LoopbackState {
            auto_open: true,
            ..LoopbackState::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
            },
            LoopbackHandle { state },
        )
    }
}

#[async_trait::async_trait]
impl LiveTransport for LoopbackTransport {
    async fn connect(
        &self,
        params: ConnectParams,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn LiveSession>, TransportError> {
        let (auto_open, events_clone) = {
            let mut state = self.state.lock().unwrap();
            state.connects.push(params);
            if let Some(error) = state.fail_next_connect.take() {
                return Err(error);
            }
            state.events = Some(events.clone());
            (state.auto_open, events)
        };

        if auto_open {
            let _ = events_clone.send(TransportEvent::Opened).await;
        }

        Ok(Box::new(LoopbackSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct LoopbackSession {
    state: Arc<Mutex<LoopbackState>>,
}

#[async_trait::async_trait]
impl LiveSession for LoopbackSession {
    async fn send_realtime(&self, input: RealtimeInput) -> Result<(), TransportError> {
        self.state.lock().unwrap().sent.push(input);
        Ok(())
    }

    async fn close(&self) {
        debug!("Loopback session closed by client");
        let events = self.state.lock().unwrap().events.take();
        if let Some(events) = events {
            let _ = events.send(TransportEvent::Closed).await;
        }
    }
}

/// Server-side controls and observers for a [`LoopbackTransport`].
pub struct LoopbackHandle {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackHandle {
    /// Disable the automatic `Opened` event on connect.
    pub fn set_auto_open(&self, auto_open: bool) {
        self.state.lock().unwrap().auto_open = auto_open;
    }

    /// Make the next `connect` call fail with the given error.
    pub fn fail_next_connect(&self, error: TransportError) {
        self.state.lock().unwrap().fail_next_connect = Some(error);
    }

    /// Parameters of every `connect` call seen so far.
    pub fn connects(&self) -> Vec<ConnectParams> {
        self.state.lock().unwrap().connects.clone()
    }

    /// Every realtime input the client has sent on the current session.
    pub fn sent(&self) -> Vec<RealtimeInput> {
        self.state.lock().unwrap().sent.clone()
    }

    pub async fn emit(&self, event: TransportEvent) {
        let events = self.state.lock().unwrap().events.clone();
        match events {
            Some(events) => {
                let _ = events.send(event).await;
            }
            None => debug!("Loopback has no open session, dropping event"),
        }
    }

    pub async fn emit_message(&self, message: super::ServerMessage) {
        self.emit(TransportEvent::Message(message)).await;
    }

    /// Simulate an unexpected server-side closure.
    pub async fn emit_closed(&self) {
        let events = self.state.lock().unwrap().events.take();
        if let Some(events) = events {
            let _ = events.send(TransportEvent::Closed).await;
        }
    }
}

/// Synthesizes silence of a fixed duration; stands in for the out-of-band
/// TTS service in demos and tests.
pub struct LoopbackSynthesizer {
    pub sample_rate: u32,
    pub duration_secs: f64,
}

impl LoopbackSynthesizer {
    pub fn new(sample_rate: u32, duration_secs: f64) -> Self {
        Self {
            sample_rate,
            duration_secs,
        }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for LoopbackSynthesizer {
    async fn synthesize(&self, text: &str, _voice: &str) -> Result<InlineAudio, TransportError> {
        debug!("Synthesizing greeting: {:?}", text);
        let samples = (self.sample_rate as f64 * self.duration_secs) as usize;
        let pcm = vec![0u8; samples * 2];
        Ok(InlineAudio {
            data: {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD.encode(pcm)
            },
            sample_rate: self.sample_rate,
        })
    }
}
