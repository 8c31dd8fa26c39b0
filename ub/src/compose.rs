//! Composition root - wires module state, handlers, and the bus
//!
//! Every registration is listed in [`register_modules`]; nothing is discovered
//! implicitly. Analytics is registered before faculty, so for `UserCreated` the
//! role counter runs before the roster update.

use std::sync::Arc;

use crate::bus::EventBus;
use crate::config::BusConfig;
use crate::events::{FacultyCreated, UserCreated, UserDeleted};
use crate::modules::analytics::Analytics;
use crate::modules::faculty::{FacultyRoster, FacultyService};
use crate::modules::identity::{IdentityService, UserDirectory};
use crate::registry::{HandlerRegistry, RegistryBuilder};

/// The platform's registration list
pub fn register_modules(builder: RegistryBuilder, analytics: &Analytics, roster: &FacultyRoster) -> RegistryBuilder {
    builder
        .register::<UserCreated, _>(analytics.role_counter())
        .register::<UserCreated, _>(roster.membership_handler())
        .register::<UserDeleted, _>(analytics.role_counter())
        .register::<UserDeleted, _>(roster.membership_handler())
        .register::<FacultyCreated, _>(analytics.faculty_counter())
}

/// All modules wired to one bus
pub struct Platform {
    bus: EventBus,
    identity: IdentityService,
    faculties: FacultyService,
    analytics: Analytics,
}

impl Platform {
    pub fn new(config: BusConfig) -> Self {
        Self::with_registrations(config, |builder| builder)
    }

    /// Build the platform, letting the caller append registrations after the
    /// module handlers
    pub fn with_registrations(config: BusConfig, extra: impl FnOnce(RegistryBuilder) -> RegistryBuilder) -> Self {
        let analytics = Analytics::new();
        let roster = FacultyRoster::new();
        let directory = UserDirectory::new();

        let builder = register_modules(HandlerRegistry::builder(), &analytics, &roster);
        let registry = Arc::new(extra(builder).build());
        let bus = EventBus::new(registry, config);

        Self {
            identity: IdentityService::new(directory, bus.clone()),
            faculties: FacultyService::new(roster, bus.clone()),
            analytics,
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn identity(&self) -> &IdentityService {
        &self.identity
    }

    pub fn faculties(&self) -> &FacultyService {
        &self.faculties
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }
}
