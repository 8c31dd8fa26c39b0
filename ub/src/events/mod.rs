//! Domain events and the notification wrapper that carries them through the bus
//!
//! An event is an immutable record of a state change that already happened in
//! one module. The bus never sees a bare event: [`Notification::wrap`] stamps it
//! with an id and timestamp, and handlers receive the typed `Notification<E>`.

mod notification;
mod types;

use std::fmt::Debug;

use serde::Serialize;

pub use notification::{EventMetadata, Notification};
pub use types::{FacultyCreated, Role, UserCreated, UserDeleted};

/// Capability marker for values that can be dispatched on the bus
///
/// The `'static` bound lets the registry key handlers by `TypeId`.
pub trait Event: Clone + Debug + Serialize + Send + Sync + 'static {
    /// Stable event name used in logs and diagnostics
    const NAME: &'static str;

    /// Schema version of the event payload
    const VERSION: u32 = 1;
}
