//! Session lifecycle: the state machine that owns connection setup,
//! teardown, reconnection with backoff and jitter, resumption handles, and
//! the wiring between capture, transport and playback.

mod config;
mod controller;
mod retry;
mod state;

pub use config::SessionConfig;
pub use controller::{Collaborators, CredentialErrorHook, SessionController};
pub use retry::{RetryPolicy, RetryState, MAX_RETRIES};
pub use state::{SessionSnapshot, SessionStatus};
