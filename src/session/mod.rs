//! Consumer session core.
//!
//! A session is one backend consumer reading one topic.  The pieces, leaf
//! first:
//!
//! * [`config`]: form validation into a [`SessionConfig`] and the read URL.
//! * [`scheduler`]: the single one-shot refresh timer.
//! * [`controller`]: the Idle → Active → Disposing state machine.
//!
//! The controller never blocks.  Backend calls and timers run as tokio tasks
//! and report back as [`SessionEvent`]s; whoever owns the controller drains
//! the event channel and feeds each event to
//! [`SessionController::handle_event`].  Rendering is delegated to a
//! [`SessionUi`] passed into every operation.

mod config;
mod controller;
mod scheduler;

#[cfg(test)]
pub use config::build_config;
pub use config::{build_request_url, FormValues, SessionConfig};
pub use controller::SessionController;
pub use scheduler::TimerId;

use crate::api::{MessagePage, ReadResponse};
use crate::error::{BackendError, ValidationError};

/// Lifecycle of a [`SessionController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session configured.
    Idle,
    /// Config built; fetches and polling may run.
    Active,
    /// Backend delete in flight.
    Disposing,
}

/// Completion of something the controller started.
#[derive(Debug)]
pub enum SessionEvent {
    Fetched {
        seq: u64,
        manual: bool,
        result: Result<ReadResponse, BackendError>,
    },
    Truncated(Result<(), BackendError>),
    Disposed(Result<(), BackendError>),
    /// A consumer created by a read that completed after its session ended
    /// was deleted.
    Released {
        session_id: String,
        result: Result<(), BackendError>,
    },
    RefreshDue(TimerId),
}

/// What the session core needs from the user interface.
pub trait SessionUi {
    /// Current contents of the configuration form.
    fn form_values(&self) -> FormValues;

    /// A session was configured; the form should lock.
    fn on_config_built(&mut self, config: &SessionConfig);

    fn on_page_received(&mut self, session_id: &str, page: MessagePage);

    /// The session is gone; clear messages and unlock the form.
    fn on_disposed(&mut self);

    fn on_validation_error(&mut self, error: ValidationError);

    fn on_backend_error(&mut self, error: &BackendError);
}
