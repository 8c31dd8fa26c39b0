//! Event Bus - sequential in-process dispatch to registered handlers
//!
//! `dispatch` wraps the event, looks up the handlers registered for its type,
//! and awaits each one in turn. It returns only after every handler has run or
//! the failure policy stopped delivery. Nothing is queued, retried, or rolled back.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cancel::Cancellation;
use crate::config::{BusConfig, FailurePolicy};
use crate::error::{DispatchError, HandlerFailure};
use crate::events::{Event, Notification};
use crate::registry::HandlerRegistry;

/// Outcome of a successful dispatch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_type: &'static str,
    pub event_id: Uuid,
    /// Number of handlers invoked
    pub invoked: usize,
    /// Nesting depth (0 for a top-level dispatch)
    pub depth: usize,
}

/// Central event bus shared by all platform modules
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<HandlerRegistry>,
    config: BusConfig,
}

impl EventBus {
    pub fn new(registry: Arc<HandlerRegistry>, config: BusConfig) -> Self {
        debug!(
            registrations = registry.registrations().len(),
            failure_policy = ?config.failure_policy,
            max_depth = config.max_depth,
            "EventBus::new: creating event bus"
        );
        Self { registry, config }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Deliver an event to every handler registered for its type
    ///
    /// Zero handlers is not an error. A handler failure after the caller's own
    /// write has committed still reports failure; that write is not undone.
    ///
    /// Always starts at depth 0. Only re-entry through `DispatchContext::dispatch`
    /// counts against `max_depth`.
    pub async fn dispatch<E: Event>(&self, event: E, cancel: &Cancellation) -> Result<DispatchReport, DispatchError> {
        self.dispatch_notification(Notification::wrap(event), cancel).await
    }

    /// Dispatch for callers with no cancellation signal of their own
    ///
    /// Uses a fresh token that is never cancelled.
    pub async fn publish<E: Event>(&self, event: E) -> Result<DispatchReport, DispatchError> {
        self.dispatch(event, &Cancellation::default()).await
    }

    /// Deliver an already wrapped notification
    pub async fn dispatch_notification<E: Event>(
        &self,
        notification: Notification<E>,
        cancel: &Cancellation,
    ) -> Result<DispatchReport, DispatchError> {
        let ctx = DispatchContext {
            bus: self.clone(),
            cancel: cancel.clone(),
            depth: 0,
        };
        self.deliver(notification, &ctx).await
    }

    async fn deliver<E: Event>(
        &self,
        notification: Notification<E>,
        ctx: &DispatchContext,
    ) -> Result<DispatchReport, DispatchError> {
        if ctx.depth > self.config.max_depth {
            warn!(event_type = E::NAME, depth = ctx.depth, "EventBus::deliver: max depth exceeded");
            return Err(DispatchError::DepthExceeded {
                event_type: E::NAME,
                depth: ctx.depth,
                max_depth: self.config.max_depth,
            });
        }

        let handlers = self.registry.handlers_for::<E>();
        debug!(
            event_type = E::NAME,
            event_id = %notification.id(),
            handlers = handlers.len(),
            depth = ctx.depth,
            "EventBus::deliver"
        );

        let mut invoked = 0;
        let mut failures = Vec::new();

        for handler in handlers {
            if ctx.cancel.is_cancelled() {
                debug!(event_type = E::NAME, invoked, "EventBus::deliver: cancelled");
                return Err(DispatchError::Cancelled {
                    event_type: E::NAME,
                    invoked,
                    failures,
                });
            }

            invoked += 1;
            let result = handler.call(&notification, ctx)?.await;

            if let Err(e) = result {
                warn!(event_type = E::NAME, handler = handler.name(), error = %e, "EventBus::deliver: handler failed");
                match self.config.failure_policy {
                    FailurePolicy::FailFast => {
                        return Err(DispatchError::HandlerFailed {
                            event_type: E::NAME,
                            handler: handler.name().to_string(),
                            source: e,
                        });
                    }
                    FailurePolicy::ContinueOnError => {
                        failures.push(HandlerFailure {
                            handler: handler.name().to_string(),
                            error: e,
                        });
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(DispatchError::HandlersFailed {
                event_type: E::NAME,
                failures,
            });
        }

        Ok(DispatchReport {
            event_type: E::NAME,
            event_id: notification.id(),
            invoked,
            depth: ctx.depth,
        })
    }
}

/// Per-dispatch state handed to every handler
///
/// Owned by the dispatching call, never retained by the bus.
#[derive(Clone)]
pub struct DispatchContext {
    bus: EventBus,
    cancel: Cancellation,
    depth: usize,
}

impl DispatchContext {
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Dispatch a follow-up event from inside a handler
    ///
    /// Shares the caller's cancellation token; depth grows by one.
    ///
    /// The depth bound only covers this path. A handler that calls a module
    /// service (or holds its own `EventBus`) starts a new top-level dispatch
    /// at depth 0 and is not limited by `max_depth`.
    pub async fn dispatch<E: Event>(&self, event: E) -> Result<DispatchReport, DispatchError> {
        let nested = DispatchContext {
            bus: self.bus.clone(),
            cancel: self.cancel.clone(),
            depth: self.depth + 1,
        };
        self.bus.deliver(Notification::wrap(event), &nested).await
    }
}
