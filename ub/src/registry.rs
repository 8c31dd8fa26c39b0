//! HandlerRegistry - event type to handler lookup
//!
//! The composition root lists every registration explicitly on a
//! [`RegistryBuilder`]. Once built, the registry is immutable and shared by `Arc`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use crate::bus::DispatchContext;
use crate::error::{DispatchError, HandlerError};
use crate::events::{Event, Notification};
use crate::handler::Handler;

pub(crate) type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send + 'a>>;

/// Type-erased handler entry stored in the registry
pub(crate) trait ErasedHandler: Send + Sync {
    fn name(&self) -> &str;

    fn call<'a>(
        &'a self,
        notification: &'a (dyn Any + Send + Sync),
        ctx: &'a DispatchContext,
    ) -> Result<HandlerFuture<'a>, DispatchError>;
}

struct TypedHandler<E, H> {
    handler: H,
    _event: PhantomData<fn() -> E>,
}

impl<E, H> ErasedHandler for TypedHandler<E, H>
where
    E: Event,
    H: Handler<E> + 'static,
{
    fn name(&self) -> &str {
        self.handler.name()
    }

    fn call<'a>(
        &'a self,
        notification: &'a (dyn Any + Send + Sync),
        ctx: &'a DispatchContext,
    ) -> Result<HandlerFuture<'a>, DispatchError> {
        let notification = notification
            .downcast_ref::<Notification<E>>()
            .ok_or(DispatchError::TypeMismatch { expected: E::NAME })?;
        Ok(self.handler.handle(notification, ctx))
    }
}

/// One row of the registration table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    pub event_type: &'static str,
    pub handler: String,
}

/// Collects registrations at startup
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: HashMap<TypeId, Vec<Arc<dyn ErasedHandler>>>,
    registrations: Vec<Registration>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for event type `E`
    ///
    /// Handlers of one event type are invoked in registration order.
    pub fn register<E, H>(mut self, handler: H) -> Self
    where
        E: Event,
        H: Handler<E> + 'static,
    {
        debug!(event_type = E::NAME, handler = handler.name(), "RegistryBuilder::register");
        self.registrations.push(Registration {
            event_type: E::NAME,
            handler: handler.name().to_string(),
        });
        self.handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Arc::new(TypedHandler {
                handler,
                _event: PhantomData,
            }));
        self
    }

    pub fn build(self) -> HandlerRegistry {
        debug!(registrations = self.registrations.len(), "RegistryBuilder::build");
        HandlerRegistry {
            handlers: self.handlers,
            registrations: self.registrations,
        }
    }
}

/// Immutable mapping from event type to its ordered handlers
pub struct HandlerRegistry {
    handlers: HashMap<TypeId, Vec<Arc<dyn ErasedHandler>>>,
    registrations: Vec<Registration>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// A registry with no handlers; every dispatch is a no-op
    pub fn empty() -> Self {
        RegistryBuilder::new().build()
    }

    pub(crate) fn handlers_for<E: Event>(&self) -> &[Arc<dyn ErasedHandler>] {
        self.handlers.get(&TypeId::of::<E>()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers_for::<E>().len()
    }

    /// Handler names for `E`, in invocation order
    pub fn handler_names<E: Event>(&self) -> Vec<&str> {
        self.handlers_for::<E>().iter().map(|h| h.name()).collect()
    }

    /// Every registration, in the order it was made
    pub fn registrations(&self) -> &[Registration] {
        &self.registrations
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FacultyCreated, UserCreated, UserDeleted};
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Handler<UserCreated> for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn handle(&self, _notification: &Notification<UserCreated>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[async_trait]
    impl Handler<UserDeleted> for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn handle(&self, _notification: &Notification<UserDeleted>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = HandlerRegistry::empty();
        assert!(registry.is_empty());
        assert_eq!(registry.handler_count::<UserCreated>(), 0);
    }

    #[test]
    fn test_handlers_grouped_by_event_type() {
        let registry = HandlerRegistry::builder()
            .register::<UserCreated, _>(Named("first"))
            .register::<UserDeleted, _>(Named("deleted"))
            .register::<UserCreated, _>(Named("second"))
            .build();

        assert_eq!(registry.handler_names::<UserCreated>(), vec!["first", "second"]);
        assert_eq!(registry.handler_names::<UserDeleted>(), vec!["deleted"]);
        assert_eq!(registry.handler_count::<FacultyCreated>(), 0);
    }

    #[test]
    fn test_registrations_keep_order() {
        let registry = HandlerRegistry::builder()
            .register::<UserDeleted, _>(Named("a"))
            .register::<UserCreated, _>(Named("b"))
            .build();

        assert_eq!(
            registry.registrations(),
            &[
                Registration {
                    event_type: "UserDeleted",
                    handler: "a".to_string(),
                },
                Registration {
                    event_type: "UserCreated",
                    handler: "b".to_string(),
                },
            ]
        );
    }
}
