//! Channel Module
//!
//! Fire-and-forget publish/subscribe bus between the manager and its frames.
//! Every message carries an explicit origin instead of an ambient source context.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

pub mod events;

pub use events::{EmitOptions, StoryEvent, StoryPreparedPayload};

/// Frame a message came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Origin {
    /// Local preview (or the manager itself)
    Local,
    /// Remote ref frame
    Ref(String),
}

impl Origin {
    pub fn ref_id(&self) -> Option<&str> {
        match self {
            Origin::Local => None,
            Origin::Ref(id) => Some(id),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Local => f.write_str("local"),
            Origin::Ref(id) => write!(f, "ref:{}", id),
        }
    }
}

/// Message on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub origin: Origin,
    pub event: StoryEvent,
}

impl ChannelMessage {
    pub fn local(event: StoryEvent) -> Self {
        Self {
            origin: Origin::Local,
            event,
        }
    }

    pub fn from_ref(ref_id: &str, event: StoryEvent) -> Self {
        Self {
            origin: Origin::Ref(ref_id.to_string()),
            event,
        }
    }
}

/// Broadcast event bus
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChannelMessage>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish a message; having no subscribers is not an error
    pub fn publish(&self, message: ChannelMessage) {
        let name = message.event.name();
        match self.tx.send(message) {
            Ok(receivers) => trace!(event = name, receivers, "Event published"),
            Err(_) => trace!(event = name, "Event dropped, no subscribers"),
        }
    }

    /// Publish an event originating from the manager
    pub fn emit(&self, event: StoryEvent) {
        self.publish(ChannelMessage::local(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChannelMessage> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.tx.receiver_count())
            .finish()
    }
}
