//! UniBus - in-process domain-event dispatch
//!
//! Modules of the university platform (identity, faculty, analytics) never call
//! each other directly. A module finishes its own state change, raises an event,
//! and the bus delivers it to every handler registered for that event type.
//!
//! # Architecture
//!
//! ```text
//!   Identity ──UserCreated──▶ ┌──────────────┐ ──▶ RoleCounterHandler   (analytics)
//!                             │   EventBus   │ ──▶ MembershipHandler    (faculty)
//!   Faculty ─FacultyCreated─▶ └──────┬───────┘
//!                                    │ lookup by event type
//!                             ┌──────▼───────┐
//!                             │HandlerRegistry│  built once by the composition root
//!                             └──────────────┘
//! ```
//!
//! Delivery is sequential, awaited, and non-transactional: a handler that fails
//! after the originating write has committed leaves that write in place.
//!
//! # Example
//!
//! ```ignore
//! use unibus::{Cancellation, Platform};
//!
//! let platform = Platform::new(Default::default());
//! let cancel = Cancellation::new();
//! platform.faculties().create_faculty("Engineering", &cancel).await?;
//! ```

pub mod bus;
pub mod cancel;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod modules;
pub mod registry;

pub use bus::{DispatchContext, DispatchReport, EventBus};
pub use cancel::Cancellation;
pub use compose::Platform;
pub use config::{BusConfig, Config, FailurePolicy};
pub use error::{DispatchError, HandlerError, HandlerFailure};
pub use events::{Event, EventMetadata, FacultyCreated, Notification, Role, UserCreated, UserDeleted};
pub use handler::Handler;
pub use registry::{HandlerRegistry, Registration, RegistryBuilder};

/// Default bound on nested dispatch depth
pub const DEFAULT_MAX_DEPTH: usize = 16;
