//! Background loading of the topic and deserializer lists.
//!
//! Both lists only feed the form's pickers, so they are fetched on spawned
//! tasks and delivered to the UI loop over a channel, the same way session
//! events are.
//!
//! ## For contributors
//!
//! Loads are fire-and-forget: nothing is cancelled if the user asks again
//! before the previous answer arrives.  Both answers are applied in arrival
//! order, which is harmless because each one replaces the whole list.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use crate::api::{ConsumerApi, DeserializerInfo};
use crate::error::BackendError;

/// Messages sent from catalog loads to the UI loop.
#[derive(Debug)]
pub enum CatalogMsg {
    Topics(Result<Vec<String>, BackendError>),
    Deserializers(Result<Vec<DeserializerInfo>, BackendError>),
}

/// Spawns catalog loads against one backend.
#[derive(Clone)]
pub struct CatalogLoader {
    api: Arc<dyn ConsumerApi>,
    tx: mpsc::UnboundedSender<CatalogMsg>,
}

impl CatalogLoader {
    /// Returns the loader and the receiver the main loop should drain on
    /// every tick.
    pub fn new(api: Arc<dyn ConsumerApi>) -> (Self, mpsc::UnboundedReceiver<CatalogMsg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { api, tx }, rx)
    }

    /// Fetch the topic list of `source_url` (blank means the backend default).
    pub fn load_topics(&self, source_url: Option<String>) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.list_topics(source_url.as_deref()).await;
            if let Err(e) = &result {
                warn!(error = %e, "loading topics failed");
            }
            // If the receiver is gone the UI has exited.
            let _ = tx.send(CatalogMsg::Topics(result));
        });
    }

    pub fn load_deserializers(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.list_deserializers().await;
            if let Err(e) = &result {
                warn!(error = %e, "loading deserializers failed");
            }
            let _ = tx.send(CatalogMsg::Deserializers(result));
        });
    }
}
