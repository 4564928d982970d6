//! Broadcast messaging between the background engine and its windows.
//!
//! Every message is fire-and-forget with an optional single reply. Having no
//! listener is a normal outcome and is reported as [`Reply::NoResponder`],
//! never as an error.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, trace};

/// Default time to wait for a reply before concluding nobody is listening.
pub const DEFAULT_REPLY_WAIT: Duration = Duration::from_millis(250);

const CHANNEL_CAPACITY: usize = 64;

/// Messages exchanged between contexts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "camelCase")]
pub enum Message {
    /// Focus the options page if it is open.
    Highlight,
    /// Liveness probe for slideshow windows.
    IsShowing,
    /// Ask every slideshow window to close itself.
    Close,
    /// A capacity-guarded write failed; `name` is the flag key it reset.
    StorageExceeded { name: Option<String> },
}

/// Outcome of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Response(Value),
    NoResponder,
}

impl Reply {
    pub const fn is_response(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}

/// Single-use reply handle shared by every listener that saw a message.
/// The first listener to answer wins.
#[derive(Debug, Clone)]
pub struct Responder(Arc<Mutex<Option<oneshot::Sender<Value>>>>);

impl Responder {
    fn new(tx: oneshot::Sender<Value>) -> Self {
        Self(Arc::new(Mutex::new(Some(tx))))
    }

    /// Send a reply. Returns false if another listener already replied or
    /// the requester stopped waiting.
    pub fn respond(&self, value: Value) -> bool {
        let sender = self.0.lock().ok().and_then(|mut guard| guard.take());
        sender.is_some_and(|tx| tx.send(value).is_ok())
    }
}

/// A delivered message.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub message: Message,
    /// Present only for requests that expect an answer.
    pub responder: Option<Responder>,
}

impl Envelope {
    /// Answer the message if it expects an answer.
    pub fn reply(&self, value: Value) -> bool {
        self.responder.as_ref().is_some_and(|r| r.respond(value))
    }
}

/// Broadcast transport.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Broadcast `message` and wait a bounded time for the first reply.
    async fn request(&self, message: Message) -> Reply;

    /// Broadcast `message` without waiting for anything.
    fn notify(&self, message: Message);
}

/// In-process bus built on a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct LocalBus {
    tx: broadcast::Sender<Envelope>,
    wait: Duration,
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            wait: DEFAULT_REPLY_WAIT,
        }
    }

    /// Change how long requests wait for a reply.
    #[must_use]
    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    /// Register a listener.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[async_trait]
impl MessageBus for LocalBus {
    async fn request(&self, message: Message) -> Reply {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            message: message.clone(),
            responder: Some(Responder::new(reply_tx)),
        };

        if self.tx.send(envelope).is_err() {
            trace!(?message, "No listeners for request");
            return Reply::NoResponder;
        }

        match tokio::time::timeout(self.wait, reply_rx).await {
            Ok(Ok(value)) => Reply::Response(value),
            Ok(Err(_)) | Err(_) => {
                debug!(?message, "Request went unanswered");
                Reply::NoResponder
            }
        }
    }

    fn notify(&self, message: Message) {
        let envelope = Envelope {
            message,
            responder: None,
        };
        if let Err(broadcast::error::SendError(env)) = self.tx.send(envelope) {
            trace!(message = ?env.message, "No listeners for notification");
        }
    }
}
