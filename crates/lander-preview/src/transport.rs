//! Transports carrying encoded preview messages between contexts.

use tokio::sync::mpsc;

use crate::message::PreviewError;

/// A message as seen by the receiving context: its data plus the origin the
/// transport attributes it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub origin: String,
    pub data: String,
}

/// One-way, fire-and-forget message delivery.
///
/// There is no acknowledgment and no delivery guarantee. A lost message is
/// repaired by the next mutation or by the receiver bootstrapping from
/// storage.
pub trait Transport: Send + Sync {
    /// Queue `data` for delivery.
    fn post(&self, data: String) -> Result<(), PreviewError>;
}

/// Transport to a rendering context living in the same process.
#[derive(Debug, Clone)]
pub struct InProcessTransport {
    origin: String,
    sender: mpsc::UnboundedSender<Delivery>,
}

/// Receiving end of an [`InProcessTransport`].
#[derive(Debug)]
pub struct InProcessInbox {
    receiver: mpsc::UnboundedReceiver<Delivery>,
}

/// Create a connected transport/inbox pair. Deliveries carry `origin`.
pub fn in_process(origin: impl Into<String>) -> (InProcessTransport, InProcessInbox) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        InProcessTransport {
            origin: origin.into(),
            sender,
        },
        InProcessInbox { receiver },
    )
}

impl Transport for InProcessTransport {
    fn post(&self, data: String) -> Result<(), PreviewError> {
        self.sender
            .send(Delivery {
                origin: self.origin.clone(),
                data,
            })
            .map_err(|_| PreviewError::Closed)
    }
}

impl InProcessInbox {
    /// Next pending delivery, without waiting.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next delivery. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    /// Take every pending delivery.
    pub fn drain(&mut self) -> Vec<Delivery> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_order_with_origin() {
        let (transport, mut inbox) = in_process("http://editor.test");

        transport.post("one".to_string()).unwrap();
        transport.post("two".to_string()).unwrap();

        let received = inbox.drain();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].data, "one");
        assert_eq!(received[1].origin, "http://editor.test");
        assert!(inbox.try_recv().is_none());
    }

    #[test]
    fn posting_to_dropped_inbox_fails() {
        let (transport, inbox) = in_process("http://editor.test");
        drop(inbox);

        assert!(matches!(
            transport.post("lost".to_string()),
            Err(PreviewError::Closed)
        ));
    }
}
