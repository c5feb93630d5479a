//! Backend abstraction layer.
//!
//! This module defines the [`ConsumerApi`] trait, the seam between the session
//! core and the kadmin HTTP API, plus the wire types in [`message`].  The
//! production implementation is [`HttpApi`]; tests substitute an in-memory
//! fake.
//!
//! ## For contributors: adding an endpoint
//!
//! 1. Add the response type to `message.rs`.
//! 2. Add a method to [`ConsumerApi`].
//! 3. Implement it in `http.rs` and in the test fake in
//!    `session/controller.rs`.

mod http;
mod message;

pub use http::HttpApi;
pub use message::{ConsumerInfo, DeserializerInfo, MessagePage, MessageRecord, ReadResponse};

use async_trait::async_trait;

use crate::error::BackendError;
use crate::session::SessionConfig;

/// Everything the client needs from the kadmin backend.
///
/// Calls are issued from spawned tokio tasks, so implementations must be
/// [`Send`] + [`Sync`].
#[async_trait]
pub trait ConsumerApi: Send + Sync {
    /// Topic names known to the cluster at `source_url` (or the backend's
    /// default cluster).
    async fn list_topics(&self, source_url: Option<&str>) -> Result<Vec<String>, BackendError>;

    async fn list_deserializers(&self) -> Result<Vec<DeserializerInfo>, BackendError>;

    /// Read the buffered messages for the consumer described by `config`,
    /// creating the consumer on first use.
    async fn read(&self, config: &SessionConfig) -> Result<ReadResponse, BackendError>;

    /// Drop all buffered messages of a consumer.
    async fn truncate(&self, session_id: &str) -> Result<(), BackendError>;

    /// Shut a consumer down.
    async fn dispose(&self, session_id: &str) -> Result<(), BackendError>;

    async fn list_consumers(&self) -> Result<Vec<ConsumerInfo>, BackendError>;
}
