//! Session lifecycle state machine.
//!
//! ```text
//!            start / refresh            dispose
//!   ┌──────┐ ─────────────────► ┌────────┐ ──────► ┌───────────┐
//!   │ Idle │                    │ Active │         │ Disposing │
//!   └──────┘ ◄───────────────── └────────┘ ◄────── └───────────┘
//!        ▲     (no session id)        ▲     failed      │
//!        └────────────────────────────┼─────────────────┘
//!                                     │       disposed
//!                     fetch / timer / truncate
//! ```
//!
//! Operations return immediately.  Their outcome arrives later as a
//! [`SessionEvent`] that must be passed back through
//! [`SessionController::handle_event`].
//!
//! Every fetch gets a sequence number.  Only the response to the most recent
//! fetch is rendered, so a slow automatic refresh can never overwrite the
//! result of a newer manual one.
//!
//! The backend creates a consumer on the first read of a session.  A read
//! that answers after its session ended still names that consumer, so its
//! id is deleted rather than dropped with the response.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::{build_config, SessionConfig, Since};
use super::scheduler::PollScheduler;
use super::{SessionEvent, SessionState, SessionUi};
use crate::api::{ConsumerApi, ReadResponse};
use crate::error::{BackendError, SessionError, ValidationError};

/// How long [`SessionController::shutdown`] waits for the backend.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Drives one consumer session against a [`ConsumerApi`].
pub struct SessionController {
    api: Arc<dyn ConsumerApi>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: SessionState,
    config: Option<SessionConfig>,
    session_id: Option<String>,
    scheduler: PollScheduler,
    /// Sequence number of the most recently issued fetch.
    seq: u64,
    /// Fetches of the current session still waiting for a response.
    in_flight: HashSet<u64>,
    /// Fetches that outlived their session.
    orphaned: HashSet<u64>,
}

impl SessionController {
    /// Create an idle controller.
    ///
    /// Returns the receiver on which completions arrive; drain it and feed
    /// every event to [`handle_event`](Self::handle_event).
    pub fn new(api: Arc<dyn ConsumerApi>) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            api,
            events,
            state: SessionState::Idle,
            config: None,
            session_id: None,
            scheduler: PollScheduler::new(),
            seq: 0,
            in_flight: HashSet::new(),
            orphaned: HashSet::new(),
        };
        (controller, rx)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The configuration of the current (or last) session.
    #[cfg(test)]
    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    #[cfg(test)]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[cfg(test)]
    pub fn has_pending_refresh(&self) -> bool {
        self.scheduler.is_pending()
    }

    // -- operations ----------------------------------------------------------

    /// Configure a session from the current form and fetch the first page.
    pub fn start(&mut self, ui: &mut impl SessionUi) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState(self.state));
        }
        self.activate(ui)?;
        self.fetch(false);
        Ok(())
    }

    /// Fetch the current page now.
    ///
    /// From `Idle` the session is configured first.  A manual refresh cancels
    /// the pending timer and does not arm a new one.
    pub fn refresh(&mut self, manual: bool, ui: &mut impl SessionUi) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => self.activate(ui)?,
            SessionState::Active => {}
            SessionState::Disposing => return Err(SessionError::InvalidState(self.state)),
        }
        self.fetch(manual);
        Ok(())
    }

    /// Empty the backend's message buffer, then refresh manually.
    pub fn truncate(&mut self, ui: &mut impl SessionUi) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => return self.start(ui),
            SessionState::Active => {}
            SessionState::Disposing => return Err(SessionError::InvalidState(self.state)),
        }
        let session_id = self.session_id.clone().ok_or(SessionError::NoSession)?;

        debug!(%session_id, "truncating");
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.truncate(&session_id).await;
            let _ = events.send(SessionEvent::Truncated(result));
        });
        Ok(())
    }

    /// Tear the session down.
    ///
    /// The refresh timer is cancelled before this returns.  If the backend
    /// has not assigned an id yet the session ends immediately; the consumer
    /// an outstanding read creates is deleted once that read answers.
    pub fn dispose(&mut self, ui: &mut impl SessionUi) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::InvalidState(self.state));
        }
        self.scheduler.cancel();

        let Some(session_id) = self.session_id.clone() else {
            info!("disposing session without backend consumer");
            self.teardown(ui);
            return Ok(());
        };

        info!(%session_id, "disposing session");
        self.state = SessionState::Disposing;
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.dispose(&session_id).await;
            let _ = events.send(SessionEvent::Disposed(result));
        });
        Ok(())
    }

    /// Change the auto-refresh cadence.
    ///
    /// While active the pending timer is dropped; a positive interval also
    /// triggers an immediate automatic refresh so the new cadence starts now.
    pub fn set_refresh_interval(&mut self, interval: Duration) {
        if let Some(config) = self.config.as_mut() {
            config.refresh_interval = interval;
        }
        if self.state != SessionState::Active {
            return;
        }
        debug!(?interval, "refresh interval changed");
        self.scheduler.cancel();
        if !interval.is_zero() {
            self.fetch(false);
        }
    }

    /// Stop polling and release every backend consumer, waiting briefly.
    ///
    /// Reads still in flight are awaited on `events` first, since an
    /// unanswered first read may yet create a consumer.
    pub async fn shutdown(&mut self, events: &mut mpsc::UnboundedReceiver<SessionEvent>) {
        self.scheduler.cancel();
        let mut owed: Vec<String> = self.session_id.take().into_iter().collect();

        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        while !self.in_flight.is_empty() || !self.orphaned.is_empty() {
            let event = match tokio::time::timeout_at(deadline, events.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        outstanding = self.in_flight.len() + self.orphaned.len(),
                        "timed out waiting for reads on exit"
                    );
                    break;
                }
            };
            if let SessionEvent::Fetched { seq, result, .. } = event {
                let ours = self.in_flight.remove(&seq) | self.orphaned.remove(&seq);
                if let (true, Ok(resp)) = (ours, result) {
                    if !owed.contains(&resp.consumer_id) {
                        owed.push(resp.consumer_id);
                    }
                }
            }
        }

        for session_id in owed {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.api.dispose(&session_id)).await {
                Ok(Ok(())) => info!(%session_id, "released consumer on exit"),
                Ok(Err(e)) => warn!(%session_id, error = %e, "failed to release consumer on exit"),
                Err(_) => warn!(%session_id, "timed out releasing consumer on exit"),
            }
        }
        self.state = SessionState::Idle;
    }

    // -- events --------------------------------------------------------------

    /// Apply the completion of an earlier operation.
    pub fn handle_event(&mut self, event: SessionEvent, ui: &mut impl SessionUi) {
        match event {
            SessionEvent::Fetched { seq, manual, result } => self.on_fetched(seq, manual, result, ui),
            SessionEvent::Truncated(result) => match result {
                Ok(()) if self.state == SessionState::Active => self.fetch(true),
                Ok(()) => debug!(state = ?self.state, "truncated after session ended"),
                Err(e) => {
                    warn!(error = %e, "truncate failed");
                    ui.on_backend_error(&e);
                }
            },
            SessionEvent::Disposed(result) => {
                if self.state != SessionState::Disposing {
                    debug!(state = ?self.state, "ignoring unexpected dispose completion");
                    return;
                }
                match result {
                    Ok(()) => {
                        info!("session disposed");
                        self.teardown(ui);
                    }
                    Err(e) => {
                        warn!(error = %e, "dispose failed; session stays active");
                        self.state = SessionState::Active;
                        self.arm_refresh(false);
                        ui.on_backend_error(&e);
                    }
                }
            }
            SessionEvent::Released { session_id, result } => match result {
                Ok(()) => info!(%session_id, "released consumer of ended session"),
                Err(e) => warn!(%session_id, error = %e, "failed to release consumer of ended session"),
            },
            SessionEvent::RefreshDue(timer) => {
                if !self.scheduler.take_fired(timer) {
                    debug!(?timer, "ignoring stale timer");
                    return;
                }
                if self.state == SessionState::Active {
                    self.fetch(false);
                }
            }
        }
    }

    fn on_fetched(
        &mut self,
        seq: u64,
        manual: bool,
        result: Result<ReadResponse, BackendError>,
        ui: &mut impl SessionUi,
    ) {
        self.in_flight.remove(&seq);
        if self.orphaned.remove(&seq) {
            if let Ok(resp) = result {
                self.release(resp.consumer_id);
            }
            return;
        }
        if self.state != SessionState::Active {
            debug!(seq, state = ?self.state, "dropping response for inactive session");
            return;
        }
        if seq != self.seq {
            debug!(seq, latest = self.seq, "dropping stale response");
            return;
        }

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                warn!(seq, error = %e, "fetch failed");
                ui.on_backend_error(&e);
                return;
            }
        };

        let session_id = match self.session_id.clone() {
            Some(id) => {
                if id != resp.consumer_id {
                    warn!(kept = %id, got = %resp.consumer_id, "backend answered with a different consumer id");
                }
                id
            }
            None => {
                info!(session_id = %resp.consumer_id, "backend assigned session id");
                self.session_id = Some(resp.consumer_id.clone());
                resp.consumer_id
            }
        };
        ui.on_page_received(&session_id, resp.page);
        self.arm_refresh(manual);
    }

    // -- internals -----------------------------------------------------------

    fn activate(&mut self, ui: &mut impl SessionUi) -> Result<(), ValidationError> {
        let config = match build_config(&ui.form_values()) {
            Ok(config) => config,
            Err(e) => {
                debug!(error = %e, "rejected session form");
                ui.on_validation_error(e);
                return Err(e);
            }
        };
        info!(topic = %config.topic, deserializer = %config.deserializer_id, "session configured");
        ui.on_config_built(&config);
        self.config = Some(config);
        self.session_id = None;
        self.state = SessionState::Active;
        Ok(())
    }

    fn fetch(&mut self, manual: bool) {
        let Some(config) = self.config.as_mut() else {
            return;
        };
        self.scheduler.cancel();
        let previous = config.since.as_millis();
        config.since = Since::At(Utc::now());
        self.seq += 1;
        self.in_flight.insert(self.seq);

        let seq = self.seq;
        let config = config.clone();
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        debug!(seq, manual, since = previous, topic = %config.topic, "fetching");
        tokio::spawn(async move {
            let result = api.read(&config).await;
            let _ = events.send(SessionEvent::Fetched { seq, manual, result });
        });
    }

    /// Arm the next automatic refresh with the current interval.
    fn arm_refresh(&mut self, manual: bool) {
        let interval = self
            .config
            .as_ref()
            .map(|c| c.refresh_interval)
            .unwrap_or_default();
        let events = self.events.clone();
        self.scheduler.schedule_if_needed(interval, manual, move |timer| {
            let _ = events.send(SessionEvent::RefreshDue(timer));
        });
    }

    /// Delete a consumer created by a read whose session already ended.
    fn release(&mut self, session_id: String) {
        if self.session_id.as_deref() == Some(session_id.as_str()) {
            return;
        }
        info!(%session_id, "releasing consumer created after its session ended");
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = api.dispose(&session_id).await;
            let _ = events.send(SessionEvent::Released { session_id, result });
        });
    }

    fn teardown(&mut self, ui: &mut impl SessionUi) {
        self.scheduler.cancel();
        self.seq += 1;
        self.orphaned.extend(self.in_flight.drain());
        self.session_id = None;
        if let Some(config) = self.config.as_mut() {
            config.started = false;
        }
        self.state = SessionState::Idle;
        ui.on_disposed();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
