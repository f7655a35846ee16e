//! Broadcast hub fanning preview messages out to connected rendering contexts.

use tokio::sync::broadcast;

use crate::message::PreviewError;
use crate::transport::{Delivery, Transport};

/// Hub for broadcasting preview messages to all connected rendering contexts.
///
/// Each WebSocket connection subscribes and forwards whatever it receives.
/// Contexts that connect later miss earlier messages; the server covers that
/// by sending the current snapshot on connect.
#[derive(Debug, Clone)]
pub struct PreviewHub {
    origin: String,
    sender: broadcast::Sender<Delivery>,
}

impl PreviewHub {
    /// Create a hub whose messages are attributed to `origin`.
    pub fn new(origin: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(100);
        Self {
            origin: origin.into(),
            sender,
        }
    }

    /// Subscribe to preview messages.
    pub fn subscribe(&self) -> broadcast::Receiver<Delivery> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl Transport for PreviewHub {
    fn post(&self, data: String) -> Result<(), PreviewError> {
        // No subscribers just means no rendering context is open yet.
        let _ = self.sender.send(Delivery {
            origin: self.origin.clone(),
            data,
        });
        Ok(())
    }
}
