/// Full application integration tests
///
/// Wires a small request-handling application end to end: a system clock
/// contract, a per-request repository with a unit of work, controllers,
/// validation before build and diagnostics through an observer.

use scopewire::{
    DiError, DiObserver, Dispose, Injectable, Key, LoggingObserver, Resolver, ServiceCollection,
    TeardownResult, ValidationError, ValidationWarning,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Application Services =====

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock {
    ticks: AtomicU64,
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::SeqCst) + 1000
    }
}

impl Injectable for FixedClock {
    type Deps = ();
    fn inject(_: ()) -> Self {
        FixedClock { ticks: AtomicU64::new(0) }
    }
}

#[derive(Default)]
struct UnitOfWork {
    writes: Mutex<Vec<String>>,
    committed: AtomicBool,
}

impl Dispose for UnitOfWork {
    fn dispose(&self) -> TeardownResult {
        self.committed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Injectable for UnitOfWork {
    type Deps = ();
    fn inject(_: ()) -> Self {
        UnitOfWork::default()
    }
}

struct Repository {
    clock: Arc<dyn Clock>,
    uow: Arc<UnitOfWork>,
}

impl Repository {
    fn save(&self, item: &str) -> u64 {
        let at = self.clock.now();
        self.uow.writes.lock().unwrap().push(format!("{}@{}", item, at));
        at
    }
}

impl Injectable for Repository {
    type Deps = (Arc<dyn Clock>, Arc<UnitOfWork>);
    fn inject((clock, uow): Self::Deps) -> Self {
        Repository { clock, uow }
    }
}

struct OrderController {
    repo: Arc<Repository>,
}

impl Injectable for OrderController {
    type Deps = (Arc<Repository>,);
    fn inject((repo,): Self::Deps) -> Self {
        OrderController { repo }
    }
}

struct AuditController {
    repo: Arc<Repository>,
}

impl Injectable for AuditController {
    type Deps = (Arc<Repository>,);
    fn inject((repo,): Self::Deps) -> Self {
        AuditController { repo }
    }
}

fn application() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services.add_singleton_impl_as::<dyn Clock, FixedClock>(|c| c);
    services.add_scoped_disposable::<UnitOfWork>();
    services.add_scoped_impl::<Repository>();
    services.add_transient_impl::<OrderController>();
    services.add_transient_impl::<AuditController>();
    services
}

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<String>>,
}

impl DiObserver for EventLog {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, key: &Key, _duration: Duration) {
        self.events.lock().unwrap().push(format!("ok {}", short(key.display_name())));
    }

    fn failed(&self, key: &Key, _error: &DiError) {
        self.events.lock().unwrap().push(format!("err {}", short(key.display_name())));
    }
}

fn short(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ===== Tests =====

#[test]
fn test_application_graph_validates() {
    let result = application().validate();
    assert!(result.is_valid(), "{}", result.format_issues());
    assert!(!result.has_warnings());
}

#[test]
fn test_request_lifecycle() {
    let provider = application().build();

    let uow = provider.with_scope(|scope| {
        let orders = scope.get_required::<OrderController>();
        let audit = scope.get_required::<AuditController>();

        // controllers are transient, the repository is per request
        assert!(Arc::ptr_eq(&orders.repo, &audit.repo));

        orders.repo.save("order-1");
        audit.repo.save("audit-1");

        let uow = scope.get_required::<UnitOfWork>();
        assert!(!uow.committed.load(Ordering::SeqCst));
        uow
    });

    assert!(uow.committed.load(Ordering::SeqCst));
    let writes = uow.writes.lock().unwrap();
    assert_eq!(*writes, vec!["order-1@1000", "audit-1@1001"]);
}

#[test]
fn test_requests_do_not_share_units_of_work() {
    let provider = application().build();

    let first = provider.create_scope();
    let second = provider.create_scope();

    let a = first.get_required::<OrderController>();
    let b = second.get_required::<OrderController>();

    assert!(!Arc::ptr_eq(&a.repo.uow, &b.repo.uow));
    assert!(Arc::ptr_eq(&a.repo.clock, &b.repo.clock));

    first.dispose().unwrap();
    assert!(a.repo.uow.committed.load(Ordering::SeqCst));
    assert!(!b.repo.uow.committed.load(Ordering::SeqCst));
}

#[test]
fn test_controller_outside_request_fails() {
    let provider = application().build();
    match provider.get::<OrderController>() {
        Err(DiError::ScopedFromRoot(name)) => assert!(name.ends_with("Repository")),
        _ => panic!("expected ScopedFromRoot"),
    }
}

#[test]
fn test_validation_catches_broken_wiring() {
    struct Reporter {
        _repo: Arc<Repository>,
    }
    impl Injectable for Reporter {
        type Deps = (Arc<Repository>,);
        fn inject((repo,): Self::Deps) -> Self {
            Reporter { _repo: repo }
        }
    }

    struct Cached {
        _controller: Arc<OrderController>,
    }
    impl Injectable for Cached {
        type Deps = (Arc<OrderController>,);
        fn inject((controller,): Self::Deps) -> Self {
            Cached { _controller: controller }
        }
    }

    let mut services = application();
    services.add_singleton_impl::<Reporter>();
    services.add_singleton_impl::<Cached>();

    let result = services.validate();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| matches!(
        e,
        ValidationError::SingletonDependsOnScoped { singleton, .. } if singleton.ends_with("Reporter")
    )));
    assert!(result.warnings.iter().any(|w| matches!(
        w,
        ValidationWarning::SingletonDependsOnTransient { singleton, .. } if singleton.ends_with("Cached")
    )));

    let mut missing = ServiceCollection::new();
    missing.add_transient_impl::<OrderController>();
    let result = missing.validate();
    assert!(matches!(
        &result.errors[0],
        ValidationError::MissingDependency { dependency, .. } if dependency.ends_with("Repository")
    ));
    assert!(result.format_issues().starts_with("Validation Errors:"));
}

#[test]
fn test_observer_sees_nested_resolutions() {
    init_tracing();
    let log = Arc::new(EventLog::default());
    let mut services = application();
    services.add_observer(log.clone());
    services.add_observer(Arc::new(LoggingObserver::with_prefix("orders-api")));

    let provider = services.build();
    let scope = provider.create_scope();
    scope.get_required::<OrderController>();

    let events = log.events.lock().unwrap().clone();
    // innermost completes first
    assert_eq!(events.first().map(String::as_str), Some("ok Clock"));
    assert_eq!(events.last().map(String::as_str), Some("ok OrderController"));
    assert!(events.contains(&"ok UnitOfWork".to_string()));
    drop(scope);

    assert!(provider.get::<OrderController>().is_err());
    let events = log.events.lock().unwrap();
    assert_eq!(events.last().map(String::as_str), Some("err OrderController"));
}
