use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureManager, MediaChunk, MediaDevice, ZoomDirection};
use crate::credentials::CredentialStore;
use crate::error::{CaptureError, TransportError};
use crate::playback::{AudioBuffer, AudioOutput, PlaybackClock, PlaybackScheduler};
use crate::transport::{
    LiveSession, LiveTransport, ServerMessage, SpeechSynthesizer, TransportEvent,
};

use super::config::SessionConfig;
use super::retry::RetryState;
use super::state::{SessionSnapshot, SessionStatus};

/// Invoked when the stored API key is missing or rejected, so the UI can
/// route the user to settings.
pub type CredentialErrorHook = Arc<dyn Fn() + Send + Sync>;

/// External collaborators injected into the controller.
pub struct Collaborators {
    pub device: Arc<dyn MediaDevice>,
    pub transport: Arc<dyn LiveTransport>,
    pub credentials: Arc<dyn CredentialStore>,
    pub clock: Arc<dyn PlaybackClock>,
    pub output: Arc<dyn AudioOutput>,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pub on_credential_error: Option<CredentialErrorHook>,
}

#[derive(Default)]
struct Tasks {
    video: Option<JoinHandle<()>>,
    audio: Option<JoinHandle<()>>,
    uplink: Option<JoinHandle<()>>,
    events: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
    reconnect: Option<JoinHandle<()>>,
}

/// Everything the controller owns, behind one lock with a single writer.
struct State {
    status: SessionStatus,
    transcription: String,
    error_message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    capture: CaptureManager,
    scheduler: PlaybackScheduler,
    session: Option<Arc<dyn LiveSession>>,
    resumption_handle: Option<String>,
    retry: RetryState,
    intentional_stop: bool,
    /// Bumped on every start/stop. Asynchronous continuations (connect
    /// results, greeting synthesis, scheduled reconnects) re-check it under
    /// the lock and discard themselves when stale.
    generation: u64,
    tasks: Tasks,
}

enum TeardownOutcome {
    /// Intentional stop: everything observable returns to the idle baseline.
    Reset,
    /// Fatal error: hardware is released but the error stays visible until
    /// the next `start_session`.
    Fatal(String),
}

struct Inner {
    config: SessionConfig,
    device: Arc<dyn MediaDevice>,
    transport: Arc<dyn LiveTransport>,
    credentials: Arc<dyn CredentialStore>,
    output: Arc<dyn AudioOutput>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    on_credential_error: Option<CredentialErrorHook>,
    session_time: AtomicU64,
    state: Mutex<State>,
}

/// Top-level state machine for one assistant session.
///
/// Owns the hardware tracks, the transport session, the playback scheduler
/// and all spawned tasks; the surrounding UI talks only to this type.
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            device,
            transport,
            credentials,
            clock,
            output,
            synthesizer,
            on_credential_error,
        } = collaborators;

        let capture = CaptureManager::new(config.capture.clone());
        let scheduler = PlaybackScheduler::new(clock, Arc::clone(&output));

        Self {
            inner: Arc::new(Inner {
                config,
                device,
                transport,
                credentials,
                output,
                synthesizer,
                on_credential_error,
                session_time: AtomicU64::new(0),
                state: Mutex::new(State {
                    status: SessionStatus::Idle,
                    transcription: String::new(),
                    error_message: None,
                    started_at: None,
                    capture,
                    scheduler,
                    session: None,
                    resumption_handle: None,
                    retry: RetryState::default(),
                    intentional_stop: false,
                    generation: 0,
                    tasks: Tasks::default(),
                }),
            }),
        }
    }

    /// Start a session. Rejected (silently, with a log) while one is already
    /// connecting, active or reconnecting. Errors surface as state, never as
    /// a return value.
    pub async fn start_session(&self) {
        Inner::start(&self.inner, false).await;
    }

    /// Intentionally stop the session and release all resources.
    pub async fn stop_session(&self) {
        let mut state = self.inner.state.lock().await;
        info!("Stopping session intentionally");
        state.intentional_stop = true;
        state.generation += 1;
        self.inner
            .full_teardown(&mut state, TeardownOutcome::Reset)
            .await;
    }

    pub async fn toggle_flashlight(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        state.capture.toggle_torch()
    }

    pub async fn change_zoom(&self, direction: ZoomDirection) -> f64 {
        let mut state = self.inner.state.lock().await;
        state.capture.change_zoom(direction)
    }

    /// OS/browser signal: the network went away. Immediate fatal, no backoff;
    /// hardware stays warm for a quick recovery.
    pub async fn network_offline(&self) {
        let mut state = self.inner.state.lock().await;
        warn!("Network offline");
        state.intentional_stop = true;
        self.inner.partial_cleanup(&mut state);
        state.status = SessionStatus::Error;
        state.error_message = Some("Lost network connection.".to_string());
    }

    /// OS/browser signal: the network came back. Re-arms a reconnect with a
    /// fresh retry budget if the session is currently idle or errored.
    pub async fn network_online(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if state.status.is_busy() {
                return;
            }
            info!("Network online, attempting to reconnect");
            state.retry.reset();
        }
        Inner::start(&self.inner, true).await;
    }

    /// Read-only view for the UI.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock().await;
        SessionSnapshot {
            status: state.status,
            transcription: state.transcription.clone(),
            error_message: state.error_message.clone(),
            session_time_secs: self.inner.session_time.load(Ordering::SeqCst),
            started_at: state.started_at,
            camera_capabilities: state.capture.capabilities(),
            flashlight_on: state.capture.flashlight_on(),
            current_zoom: state.capture.current_zoom(),
        }
    }
}

impl Inner {
    /// The connect path. `reconnect` bypasses the busy guard; it is only set
    /// by the internal reconnect/online paths.
    ///
    /// Boxed because the body recursively awaits itself from a spawned task,
    /// which an opaque `async fn` future cannot express.
    fn start<'a>(
        self: &'a Arc<Self>,
        reconnect: bool,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(self.start_impl(reconnect))
    }

    async fn start_impl(self: &Arc<Self>, reconnect: bool) {
        let mut state = self.state.lock().await;

        if !reconnect && state.status.is_busy() {
            warn!("start_session ignored, session is {:?}", state.status);
            return;
        }

        state.intentional_stop = false;
        state.generation += 1;
        let generation = state.generation;

        if self.credentials.api_key().is_none() {
            warn!("No API key available");
            state.status = SessionStatus::Error;
            state.error_message =
                Some("No API key configured. Add one in settings.".to_string());
            if let Some(hook) = &self.on_credential_error {
                hook();
            }
            return;
        }

        // Warm hardware means this is a resumption, not a cold start.
        let resuming = reconnect || state.capture.is_acquired();
        state.status = if resuming {
            SessionStatus::Reconnecting
        } else {
            SessionStatus::Connecting
        };
        state.error_message = None;

        if !state.capture.is_acquired() {
            if let Err(e) = state.capture.acquire(self.device.as_ref()).await {
                error!("Media acquisition failed: {}", e);
                let message = match &e {
                    CaptureError::PermissionDenied => {
                        "Camera/microphone permission denied.".to_string()
                    }
                    other => format!("Could not start capture: {}", other),
                };
                self.full_teardown(&mut state, TeardownOutcome::Fatal(message))
                    .await;
                return;
            }
        }

        if !resuming {
            self.spawn_greeting(generation);
        }

        let params = self.config.connect_params(state.resumption_handle.clone());
        if params.session_resumption.is_some() {
            info!("Connecting with stored resumption handle");
        } else {
            info!("Starting a new session");
        }

        let (events_tx, events_rx) = mpsc::channel(64);

        // Connect without the lock so a stop can interleave; the result is
        // re-validated against the generation afterwards.
        drop(state);
        let connected = self.transport.connect(params, events_tx).await;

        let mut state = self.state.lock().await;
        if state.generation != generation || state.intentional_stop {
            debug!("Session was stopped while connecting, discarding result");
            if let Ok(session) = connected {
                let session: Arc<dyn LiveSession> = Arc::from(session);
                tokio::spawn(async move { session.close().await });
            }
            return;
        }

        match connected {
            Ok(session) => {
                state.session = Some(Arc::from(session));
                let inner = Arc::clone(self);
                state.tasks.events = Some(tokio::spawn(async move {
                    inner.pump_events(generation, events_rx).await;
                }));
            }
            Err(e) => self.handle_connect_failure(&mut state, e).await,
        }
    }

    /// One-shot out-of-band greeting, synthesized while the first connection
    /// is still being established. Scheduled outside the streamed cursor.
    fn spawn_greeting(self: &Arc<Self>, generation: u64) {
        let (Some(synthesizer), Some(text)) =
            (self.synthesizer.clone(), self.config.greeting.clone())
        else {
            return;
        };

        let inner = Arc::clone(self);
        let voice = self.config.voice.clone();
        tokio::spawn(async move {
            match synthesizer.synthesize(&text, &voice).await {
                Ok(audio) => {
                    let buffer = match audio.decode() {
                        Ok(pcm) => AudioBuffer::from_pcm16(&pcm, audio.sample_rate),
                        Err(e) => {
                            warn!("Failed to decode greeting audio: {}", e);
                            return;
                        }
                    };
                    let mut state = inner.state.lock().await;
                    if state.generation == generation && !state.intentional_stop {
                        info!("Greeting audio ready, playing");
                        state.scheduler.play_oneshot(buffer);
                    }
                }
                Err(e) => warn!("Greeting synthesis failed: {}", e),
            }
        });
    }

    async fn pump_events(
        self: &Arc<Self>,
        generation: u64,
        mut events: mpsc::Receiver<TransportEvent>,
    ) {
        while let Some(event) = events.recv().await {
            let live = match event {
                TransportEvent::Opened => self.on_opened(generation).await,
                TransportEvent::Message(message) => self.on_message(generation, message).await,
                TransportEvent::Error(e) => self.on_transport_error(generation, e).await,
                TransportEvent::Closed => {
                    self.on_closed(generation).await;
                    false
                }
            };
            if !live {
                break;
            }
        }
        debug!("Event pump finished");
    }

    /// Transport open: reset retries, go active, start the clock and the two
    /// outbound media pumps. Returns false when the event is stale.
    async fn on_opened(self: &Arc<Self>, generation: u64) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return false;
        }

        info!("Session opened");
        state.retry.reset();
        state.status = SessionStatus::Active;
        if state.started_at.is_none() {
            state.started_at = Some(Utc::now());
        }

        // Session clock survives reconnects; start it only once.
        if state.tasks.timer.is_none() {
            self.session_time.store(0, Ordering::SeqCst);
            let inner = Arc::clone(self);
            state.tasks.timer = Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(1));
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    inner.session_time.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel::<MediaChunk>(32);
        match state.capture.start_audio(chunk_tx.clone()).await {
            Ok(handle) => state.tasks.audio = Some(handle),
            Err(e) => warn!("Failed to start audio pump: {}", e),
        }
        match state.capture.start_video(chunk_tx) {
            Ok(handle) => state.tasks.video = Some(handle),
            Err(e) => warn!("Failed to start frame timer: {}", e),
        }
        if let Some(session) = state.session.clone() {
            state.tasks.uplink = Some(tokio::spawn(uplink(session, chunk_rx)));
        }

        true
    }

    async fn on_message(self: &Arc<Self>, generation: u64, message: ServerMessage) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return false;
        }

        if let Some(update) = message.resumption {
            if update.resumable {
                debug!("Resumption handle updated");
                state.resumption_handle = Some(update.handle);
            }
        }

        if let Some(delta) = message.transcript_delta {
            state.transcription.push_str(&delta);
        }

        if message.turn_complete {
            debug!("Turn complete");
            state.transcription.clear();
        }

        if let Some(audio) = message.audio {
            match audio.decode() {
                Ok(pcm) => {
                    let buffer = AudioBuffer::from_pcm16(&pcm, audio.sample_rate);
                    state.scheduler.enqueue(buffer);
                }
                Err(e) => warn!("Failed to decode audio payload: {}", e),
            }
        }

        if message.interrupted {
            info!("Barge-in, flushing scheduled playback");
            state.scheduler.flush();
        }

        true
    }

    async fn on_transport_error(self: &Arc<Self>, generation: u64, e: TransportError) -> bool {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return false;
        }

        error!("Session error: {}", e);
        if matches!(e, TransportError::InvalidCredential(_)) {
            if let Some(hook) = &self.on_credential_error {
                hook();
            }
            // Suppress the reconnect path for the closure that follows.
            state.intentional_stop = true;
            self.full_teardown(
                &mut state,
                TeardownOutcome::Fatal(
                    "Your API key is not valid. Enter a new key in settings.".to_string(),
                ),
            )
            .await;
            return false;
        }

        true
    }

    /// Transport closed. Intentional closures are a no-op; unexpected ones go
    /// through partial cleanup and the backoff loop.
    async fn on_closed(self: &Arc<Self>, generation: u64) {
        let mut state = self.state.lock().await;
        if state.generation != generation {
            return;
        }

        if state.intentional_stop {
            debug!("Closure was intentional, not reconnecting");
            return;
        }

        info!("Transport closed unexpectedly");
        self.partial_cleanup(&mut state);

        if state.retry.exhausted(&self.config.retry) {
            error!(
                "Max retries ({}) reached, giving up",
                self.config.retry.max_attempts
            );
            state.status = SessionStatus::Error;
            state.error_message =
                Some("Could not restore the connection. Check your network.".to_string());
            return;
        }

        let attempt = state.retry.begin_attempt();
        let delay = self.config.retry.delay_for(attempt);
        info!("Reconnecting in {:?} (attempt {})", delay, attempt + 1);
        state.status = SessionStatus::Reconnecting;

        let inner = Arc::clone(self);
        let scheduled_generation = state.generation;
        state.tasks.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let state = inner.state.lock().await;
                if state.generation != scheduled_generation || state.intentional_stop {
                    debug!("Scheduled reconnect superseded, dropping it");
                    return;
                }
            }
            Inner::start(&inner, true).await;
        }));
    }

    async fn handle_connect_failure(self: &Arc<Self>, state: &mut State, e: TransportError) {
        error!("Failed to open session: {}", e);
        match e {
            TransportError::InvalidCredential(_) => {
                if let Some(hook) = &self.on_credential_error {
                    hook();
                }
                state.intentional_stop = true;
                self.full_teardown(
                    state,
                    TeardownOutcome::Fatal(
                        "Your API key is not valid. Enter a new key in settings.".to_string(),
                    ),
                )
                .await;
            }
            TransportError::NetworkUnavailable(_) => {
                // Hardware stays warm; an online signal re-arms the session.
                self.partial_cleanup(state);
                state.status = SessionStatus::Error;
                state.error_message =
                    Some("Network error. Check your connection.".to_string());
            }
            other => {
                self.full_teardown(
                    state,
                    TeardownOutcome::Fatal(format!("Could not start session: {}", other)),
                )
                .await;
            }
        }
    }

    /// Pre-reconnect cleanup: stop producing and playing media, close the
    /// transport. Hardware, output context, clock and observable state stay.
    fn partial_cleanup(&self, state: &mut State) {
        debug!("Partial cleanup, keeping hardware warm");

        for handle in [
            state.tasks.video.take(),
            state.tasks.audio.take(),
            state.tasks.uplink.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }

        if let Some(session) = state.session.take() {
            tokio::spawn(async move { session.close().await });
        }

        state.scheduler.flush();
    }

    /// Complete teardown. Idempotent: every step guards on presence, so a
    /// second call (or one on a half-initialized session) is a no-op.
    async fn full_teardown(&self, state: &mut State, outcome: TeardownOutcome) {
        info!("Full teardown");
        self.partial_cleanup(state);

        if let Some(timer) = state.tasks.timer.take() {
            timer.abort();
        }
        if let Some(reconnect) = state.tasks.reconnect.take() {
            reconnect.abort();
        }

        self.output.close();
        state.capture.release().await;

        state.resumption_handle = None;
        state.retry.reset();
        state.transcription.clear();
        state.started_at = None;
        self.session_time.store(0, Ordering::SeqCst);

        match outcome {
            TeardownOutcome::Reset => {
                state.status = SessionStatus::Idle;
                state.error_message = None;
            }
            TeardownOutcome::Fatal(message) => {
                state.status = SessionStatus::Error;
                state.error_message = Some(message);
            }
        }

        // Last: the teardown may be running on the event pump itself, and an
        // abort lands at its next await point.
        if let Some(events) = state.tasks.events.take() {
            events.abort();
        }
    }
}

/// Forwards captured media to the transport. Send failures drop the chunk:
/// frames and audio are perishable, retrying stale media is worse than loss.
async fn uplink(session: Arc<dyn LiveSession>, mut chunks: mpsc::Receiver<MediaChunk>) {
    debug!("Uplink started");
    while let Some(chunk) = chunks.recv().await {
        if let Err(e) = session.send_realtime(chunk.into()).await {
            debug!("Dropping perishable chunk: {}", e);
        }
    }
    debug!("Uplink stopped");
}
