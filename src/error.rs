//! Error types shared by the session core and the backend client.
//!
//! Three families, by where they originate:
//!
//! * [`ValidationError`]: the form could not be turned into a session
//!   configuration.  Raised synchronously; never reaches the network.
//! * [`BackendError`]: an HTTP call failed.  Raised asynchronously and
//!   reported to the UI; the session stays where it was.
//! * [`SessionError`]: a controller operation was invoked in a state that
//!   does not allow it.

use thiserror::Error;

use crate::session::SessionState;

/// Why a form could not be turned into a [`SessionConfig`](crate::session::SessionConfig).
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("topic is required")]
    MissingTopic,

    #[error("a deserializer must be selected")]
    MissingDeserializer,
}

/// A failed call against the kadmin backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("backend returned HTTP {0}")]
    HttpStatus(u16),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::NetworkFailure(err.to_string())
        }
    }
}

/// A controller operation that could not run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not allowed while the session is {0:?}")]
    InvalidState(SessionState),

    #[error("the backend has not assigned a session id yet")]
    NoSession,
}
