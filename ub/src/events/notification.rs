//! Notification wrapper - the shape every event takes while in flight

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Event;

/// Envelope data stamped on an event when it enters the bus
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique id of this occurrence
    pub id: Uuid,
    /// Event type name (`Event::NAME`)
    pub name: String,
    /// Payload schema version (`Event::VERSION`)
    pub version: u32,
    #[serde(rename = "ts")]
    pub occurred_at: DateTime<Utc>,
}

/// A typed event plus its metadata
///
/// The event is stored by value and never modified, so a handler sees every
/// field exactly as the originating module set it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification<E> {
    metadata: EventMetadata,
    event: E,
}

impl<E: Event> Notification<E> {
    /// Wrap an event, stamping a fresh id and the current time
    pub fn wrap(event: E) -> Self {
        Self {
            metadata: EventMetadata {
                id: Uuid::now_v7(),
                name: E::NAME.to_string(),
                version: E::VERSION,
                occurred_at: Utc::now(),
            },
            event,
        }
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    pub fn id(&self) -> Uuid {
        self.metadata.id
    }

    /// Unwrap, returning the original event
    pub fn into_inner(self) -> E {
        self.event
    }
}

impl<E: Event> From<E> for Notification<E> {
    fn from(event: E) -> Self {
        Self::wrap(event)
    }
}
