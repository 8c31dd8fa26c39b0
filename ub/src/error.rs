//! Error types for handlers and dispatch

use thiserror::Error;

/// Errors a handler returns to the bus
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{message}")]
    Failed { message: String },

    #[error("Referenced {entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Handler observed cancellation")]
    Cancelled,

    #[error("Nested dispatch failed: {0}")]
    Dispatch(#[from] Box<DispatchError>),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
        }
    }
}

impl From<DispatchError> for HandlerError {
    fn from(err: DispatchError) -> Self {
        HandlerError::Dispatch(Box::new(err))
    }
}

/// One failed handler invocation
#[derive(Debug)]
pub struct HandlerFailure {
    pub handler: String,
    pub error: HandlerError,
}

/// Errors reported to the caller of `EventBus::dispatch`
///
/// Handler side effects that ran before the failure are not rolled back.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Handler '{handler}' failed for {event_type}: {source}")]
    HandlerFailed {
        event_type: &'static str,
        handler: String,
        #[source]
        source: HandlerError,
    },

    #[error("{} handler(s) failed for {event_type}", .failures.len())]
    HandlersFailed {
        event_type: &'static str,
        failures: Vec<HandlerFailure>,
    },

    /// Failures collected before cancellation (continue-on-error) are kept
    #[error("Dispatch of {event_type} cancelled after {invoked} handler(s), {} failed", .failures.len())]
    Cancelled {
        event_type: &'static str,
        invoked: usize,
        failures: Vec<HandlerFailure>,
    },

    #[error("Dispatch of {event_type} at depth {depth} exceeds max depth {max_depth}")]
    DepthExceeded {
        event_type: &'static str,
        depth: usize,
        max_depth: usize,
    },

    #[error("Handler registered for {expected} received a different notification type")]
    TypeMismatch { expected: &'static str },
}

impl DispatchError {
    /// Event type name this error was raised for, if known
    pub fn event_type(&self) -> &'static str {
        match self {
            DispatchError::HandlerFailed { event_type, .. }
            | DispatchError::HandlersFailed { event_type, .. }
            | DispatchError::Cancelled { event_type, .. }
            | DispatchError::DepthExceeded { event_type, .. } => event_type,
            DispatchError::TypeMismatch { expected } => expected,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchError::Cancelled { .. })
    }

    /// Names of the handlers that failed
    pub fn failed_handlers(&self) -> Vec<&str> {
        match self {
            DispatchError::HandlerFailed { handler, .. } => vec![handler.as_str()],
            DispatchError::HandlersFailed { failures, .. } | DispatchError::Cancelled { failures, .. } => {
                failures.iter().map(|f| f.handler.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}
