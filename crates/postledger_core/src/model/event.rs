//! Registry notifications and the sink they are delivered to.
//!
//! # Responsibility
//! - Define the externally observable events emitted on post changes.
//! - Provide sink implementations for in-memory collection and logging.
//!
//! # Invariants
//! - Events carry the post fields as they were right after the mutation.
//! - Log output is metadata-only (ids and lengths, never titles or hashes).

use crate::model::post::PostId;
use log::info;
use serde::{Deserialize, Serialize};

/// Notification emitted after a successful post mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    PostCreated {
        id: PostId,
        title: String,
        content_hash: String,
    },
    PostUpdated {
        id: PostId,
        title: String,
        content_hash: String,
        published: bool,
    },
}

impl RegistryEvent {
    /// Stable event name used in logs and wire payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PostCreated { .. } => "post_created",
            Self::PostUpdated { .. } => "post_updated",
        }
    }

    /// Id of the post this event refers to.
    pub fn post_id(&self) -> PostId {
        match self {
            Self::PostCreated { id, .. } | Self::PostUpdated { id, .. } => *id,
        }
    }
}

/// Receiver for registry notifications.
pub trait NotificationSink {
    fn notify(&mut self, event: &RegistryEvent);
}

impl NotificationSink for Vec<RegistryEvent> {
    fn notify(&mut self, event: &RegistryEvent) {
        self.push(event.clone());
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for &mut S {
    fn notify(&mut self, event: &RegistryEvent) {
        (**self).notify(event);
    }
}

/// Sink that writes each notification to the core log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, event: &RegistryEvent) {
        info!("{}", describe(event));
    }
}

/// Metadata-only log line for `event`.
fn describe(event: &RegistryEvent) -> String {
    let (title_len, hash_len) = match event {
        RegistryEvent::PostCreated {
            title,
            content_hash,
            ..
        }
        | RegistryEvent::PostUpdated {
            title,
            content_hash,
            ..
        } => (title.chars().count(), content_hash.chars().count()),
    };
    format!(
        "event={} module=notify status=ok post_id={} title_len={} hash_len={}",
        event.name(),
        event.post_id(),
        title_len,
        hash_len
    )
}
