//! Handler trait definition

use async_trait::async_trait;

use crate::bus::DispatchContext;
use crate::error::HandlerError;
use crate::events::{Event, Notification};

/// A subscriber that reacts to one event type with a side effect
///
/// Handlers of the same event run in registration order, but callers should not
/// rely on ordering relative to handlers owned by other modules.
#[async_trait]
pub trait Handler<E: Event>: Send + Sync {
    /// Handler name for logs and failure reports
    fn name(&self) -> &str;

    /// Handle one notification
    ///
    /// Errors surface synchronously to the dispatch caller; they are not retried.
    async fn handle(&self, notification: &Notification<E>, ctx: &DispatchContext) -> Result<(), HandlerError>;
}
