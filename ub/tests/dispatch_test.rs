//! Integration tests for dispatch through the composed platform

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use proptest::prelude::*;
use uuid::Uuid;

use unibus::modules::ModuleError;
use unibus::modules::analytics::Counts;
use unibus::modules::identity::NewUser;
use unibus::{
    BusConfig, Cancellation, DispatchContext, DispatchError, EventBus, Handler, HandlerError, HandlerRegistry,
    Notification, Platform, Role, UserCreated,
};

fn student(username: &str, faculty_id: Option<Uuid>) -> NewUser {
    NewUser {
        username: username.to_string(),
        first_name: "Stu".to_string(),
        last_name: "Dent".to_string(),
        faculty_id,
        role: Role::Student,
        index_number: Some(format!("IDX-{}", username)),
    }
}

/// Side effect that records how often it ran
#[derive(Clone, Default)]
struct Audit {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler<UserCreated> for Audit {
    fn name(&self) -> &str {
        "audit"
    }

    async fn handle(&self, _notification: &Notification<UserCreated>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Broken;

#[async_trait]
impl Handler<UserCreated> for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    async fn handle(&self, _notification: &Notification<UserCreated>, _ctx: &DispatchContext) -> Result<(), HandlerError> {
        Err(HandlerError::failed("downstream unavailable"))
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_student_created_increments_student_counter_only() {
    let platform = Platform::new(BusConfig::default());
    let cancel = Cancellation::new();

    platform.identity().create_user(student("s1", None), &cancel).await.unwrap();

    assert_eq!(
        platform.analytics().snapshot().await,
        Counts {
            students: 1,
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn test_second_handler_fails_first_effect_persists() {
    let audit = Audit::default();
    let bus = EventBus::new(
        Arc::new(
            HandlerRegistry::builder()
                .register::<UserCreated, _>(audit.clone())
                .register::<UserCreated, _>(Broken)
                .build(),
        ),
        BusConfig::default(),
    );

    let event = UserCreated {
        user_id: Uuid::now_v7(),
        username: "s2".to_string(),
        first_name: "A".to_string(),
        last_name: "B".to_string(),
        faculty_id: None,
        role: Role::Student,
        index_number: Some("1".to_string()),
    };
    let err = bus.dispatch(event, &Cancellation::new()).await.unwrap_err();

    assert!(matches!(err, DispatchError::HandlerFailed { ref handler, .. } if handler == "broken"));
    // No rollback of the first handler
    assert_eq!(audit.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_dispatch_leaves_user_committed() {
    let platform = Platform::with_registrations(BusConfig::default(), |b| b.register::<UserCreated, _>(Broken));
    let cancel = Cancellation::new();

    let err = platform
        .identity()
        .create_user(student("s3", None), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_committed());
    assert!(platform.identity().directory().find_by_username("s3").await.is_some());
    // Analytics ran before the broken handler and keeps its count
    assert_eq!(platform.analytics().snapshot().await.students, 1);
}

#[tokio::test]
async fn test_unknown_faculty_reports_failure_after_counter() {
    let platform = Platform::new(BusConfig::default());
    let cancel = Cancellation::new();

    let err = platform
        .identity()
        .create_user(student("orphan", Some(Uuid::now_v7())), &cancel)
        .await
        .unwrap_err();

    match err {
        ModuleError::Dispatch(ref e) => assert_eq!(e.failed_handlers(), vec!["faculty.membership"]),
        ref other => panic!("Expected dispatch failure, got {other:?}"),
    }
    assert_eq!(platform.analytics().snapshot().await.students, 1);
    assert_eq!(platform.identity().directory().len().await, 1);
}

#[tokio::test]
async fn test_full_lifecycle_through_platform() {
    let platform = Platform::new(BusConfig::default());
    let cancel = Cancellation::new();

    let faculty = platform.faculties().create_faculty("Mathematics", &cancel).await.unwrap();
    let s1 = platform
        .identity()
        .create_user(student("m1", Some(faculty.id)), &cancel)
        .await
        .unwrap();
    let professor = NewUser {
        role: Role::Professor,
        index_number: None,
        ..student("p1", Some(faculty.id))
    };
    platform.identity().create_user(professor, &cancel).await.unwrap();

    let roster = platform.faculties().roster().get(faculty.id).await.unwrap();
    assert_eq!(roster.students, vec![s1.id]);
    assert_eq!(roster.professors.len(), 1);

    platform.identity().delete_user(s1.id, &cancel).await.unwrap();

    let roster = platform.faculties().roster().get(faculty.id).await.unwrap();
    assert!(roster.students.is_empty());
    let counts = platform.analytics().snapshot().await;
    assert_eq!((counts.students, counts.professors, counts.faculties), (0, 1, 1));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_bus() {
    let audit = Audit::default();
    let bus = EventBus::new(
        Arc::new(HandlerRegistry::builder().register::<UserCreated, _>(audit.clone()).build()),
        BusConfig::default(),
    );

    let dispatches = (0..20).map(|i| {
        let bus = bus.clone();
        async move {
            let event = UserCreated {
                user_id: Uuid::now_v7(),
                username: format!("u{i}"),
                first_name: "F".to_string(),
                last_name: "L".to_string(),
                faculty_id: None,
                role: Role::Admin,
                index_number: None,
            };
            bus.dispatch(event, &Cancellation::new()).await
        }
    });
    let results = futures::future::join_all(dispatches).await;

    assert!(results.iter().all(|r| matches!(r, Ok(report) if report.invoked == 1)));
    assert_eq!(audit.calls.load(Ordering::SeqCst), 20);
}

#[tokio::test]
async fn test_cancelled_token_stops_platform_dispatch() {
    let platform = Platform::new(BusConfig::default());
    let cancel = Cancellation::new();
    cancel.cancel();

    let err = platform
        .identity()
        .create_user(student("late", None), &cancel)
        .await
        .unwrap_err();

    match err {
        ModuleError::Dispatch(e) => assert!(e.is_cancelled()),
        other => panic!("Expected cancelled dispatch, got {other:?}"),
    }
    assert_eq!(platform.analytics().snapshot().await.students, 0);
}

// =============================================================================
// Wrapper fidelity
// =============================================================================

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Student), Just(Role::Professor), Just(Role::Admin)]
}

proptest! {
    #[test]
    fn prop_wrap_unwrap_preserves_event(
        username in "[a-z]{1,12}",
        first_name in "\\PC{0,20}",
        last_name in "\\PC{0,20}",
        role in role_strategy(),
        index_number in proptest::option::of("[0-9]{4}/[0-9]{4}"),
        has_faculty in any::<bool>(),
    ) {
        let event = UserCreated {
            user_id: Uuid::now_v7(),
            username,
            first_name,
            last_name,
            faculty_id: has_faculty.then(Uuid::now_v7),
            role,
            index_number,
        };

        let notification = Notification::wrap(event.clone());
        prop_assert_eq!(notification.event(), &event);
        prop_assert_eq!(notification.into_inner(), event);
    }
}
