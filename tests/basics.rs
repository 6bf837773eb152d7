use scopewire::{
    DiError, Injectable, Lifetime, Resolver, ServiceCollection, ServiceSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[test]
fn test_concrete_singleton() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(42usize);
    sc.add_singleton("hello".to_string());

    let sp = sc.build();

    let num1 = sp.get_required::<usize>();
    let num2 = sp.get_required::<usize>();
    let str1 = sp.get_required::<String>();
    let str2 = sp.get_required::<String>();

    assert_eq!(*num1, 42);
    assert_eq!(*str1, "hello");
    assert!(Arc::ptr_eq(&num1, &num2));
    assert!(Arc::ptr_eq(&str1, &str2));
}

#[test]
fn test_factory_with_dependencies() {
    struct Config {
        port: u16,
    }

    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Config { port: 8080 });
    sc.add_singleton_factory::<Server, _>(|r| {
        Ok(Server {
            config: r.get::<Config>()?,
            name: "MyServer".to_string(),
        })
    });

    let sp = sc.build();
    let server = sp.get_required::<Server>();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
}

#[test]
fn test_transient_creates_new_instances() {
    let counter = Arc::new(AtomicUsize::new(0));
    let c = counter.clone();

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<String, _>(move |_| {
        Ok(format!("instance-{}", c.fetch_add(1, Ordering::SeqCst) + 1))
    });

    let sp = sc.build();

    let a = sp.get_required::<String>();
    let b = sp.get_required::<String>();
    let c = sp.get_required::<String>();

    assert_eq!(*a, "instance-1");
    assert_eq!(*b, "instance-2");
    assert_eq!(*c, "instance-3");
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn test_singleton_factory_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();

    let mut sc = ServiceCollection::new();
    sc.add_singleton_factory::<Vec<u8>, _>(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1, 2, 3])
    });

    let sp = sc.build();
    for _ in 0..5 {
        assert_eq!(sp.get_required::<Vec<u8>>().len(), 3);
    }
    let scope = sp.create_scope();
    scope.get_required::<Vec<u8>>();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unregistered_service() {
    struct Missing;

    let sp = ServiceCollection::new().build();
    match sp.get::<Missing>() {
        Err(DiError::NotFound(name)) => assert!(name.ends_with("Missing")),
        _ => panic!("expected NotFound"),
    }
}

#[test]
fn test_missing_transitive_dependency_names_the_leaf() {
    struct Leaf;
    struct Root;

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Root, _>(|r| {
        r.get::<Leaf>()?;
        Ok(Root)
    });

    let sp = sc.build();
    match sp.get::<Root>() {
        Err(DiError::NotFound(name)) => assert!(name.ends_with("Leaf")),
        _ => panic!("expected NotFound for the leaf"),
    }
}

#[test]
fn test_last_registration_wins() {
    let mut sc = ServiceCollection::new();
    sc.add_singleton(1u32);
    sc.add_singleton(2u32);
    sc.add_transient_factory::<u32, _>(|_| Ok(3));

    assert_eq!(sc.len(), 1);
    let sp = sc.build();
    assert_eq!(*sp.get_required::<u32>(), 3);
}

#[test]
fn test_instance_is_always_singleton() {
    let mut sc = ServiceCollection::new();
    sc.register::<String>(
        Lifetime::Transient,
        ServiceSource::instance(Arc::new("shared".to_string())),
    );
    assert_eq!(sc.descriptors()[0].lifetime, Lifetime::Singleton);

    let sp = sc.build();
    let a = sp.get_required::<String>();
    let b = sp.get_required::<String>();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_registered_instance_is_returned_itself() {
    trait Settings: Send + Sync {
        fn region(&self) -> &str;
    }

    struct Fixed(&'static str);
    impl Settings for Fixed {
        fn region(&self) -> &str {
            self.0
        }
    }

    let counter = Arc::new(Mutex::new(vec![1u32, 2, 3]));
    let settings: Arc<dyn Settings> = Arc::new(Fixed("eu-west"));

    let mut sc = ServiceCollection::new();
    sc.register_instance(counter.clone());
    sc.register_instance(settings.clone());

    let sp = sc.build();
    assert!(Arc::ptr_eq(&counter, &sp.get_required::<Mutex<Vec<u32>>>()));
    assert!(Arc::ptr_eq(&settings, &sp.get_required::<dyn Settings>()));

    let scope = sp.create_scope();
    let from_scope = scope.get_required::<Mutex<Vec<u32>>>();
    assert!(Arc::ptr_eq(&counter, &from_scope));
    assert!(Arc::ptr_eq(&settings, &scope.get_required::<dyn Settings>()));

    // mutations through the registered handle are visible to consumers
    counter.lock().unwrap().push(4);
    assert_eq!(*from_scope.lock().unwrap(), vec![1, 2, 3, 4]);
    assert_eq!(scope.get_required::<dyn Settings>().region(), "eu-west");
}

#[test]
fn test_factory_error_propagates() {
    struct Flaky;

    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Flaky, _>(|_| Err(DiError::factory::<Flaky>("connection refused")));

    let sp = sc.build();
    let err = sp.get::<Flaky>().err().unwrap();
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_implementation_resolves_dependencies_in_declaration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    struct First;
    struct Second;
    struct Third;

    struct Consumer {
        _deps: (Arc<First>, Arc<Second>, Arc<Third>),
    }
    impl Injectable for Consumer {
        type Deps = (Arc<First>, Arc<Second>, Arc<Third>);
        fn inject(deps: Self::Deps) -> Self {
            Consumer { _deps: deps }
        }
    }

    let mut sc = ServiceCollection::new();
    let l = log.clone();
    sc.add_transient_factory::<Third, _>(move |_| {
        l.lock().unwrap().push("third");
        Ok(Third)
    });
    let l = log.clone();
    sc.add_transient_factory::<First, _>(move |_| {
        l.lock().unwrap().push("first");
        Ok(First)
    });
    let l = log.clone();
    sc.add_transient_factory::<Second, _>(move |_| {
        l.lock().unwrap().push("second");
        Ok(Second)
    });
    sc.add_transient_impl::<Consumer>();

    let sp = sc.build();
    sp.get_required::<Consumer>();
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn test_trait_contract_with_implementation() {
    trait Repository: Send + Sync {
        fn find(&self, id: u32) -> String;
    }

    struct Prefix(String);

    struct PrefixedRepository {
        prefix: Arc<Prefix>,
    }
    impl Repository for PrefixedRepository {
        fn find(&self, id: u32) -> String {
            format!("{}-{}", self.prefix.0, id)
        }
    }
    impl Injectable for PrefixedRepository {
        type Deps = (Arc<Prefix>,);
        fn inject((prefix,): Self::Deps) -> Self {
            PrefixedRepository { prefix }
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton(Prefix("user".into()));
    sc.add_transient_impl_as::<dyn Repository, PrefixedRepository>(|r| r);

    let sp = sc.build();
    assert_eq!(sp.get_required::<dyn Repository>().find(7), "user-7");
}

#[test]
fn test_trait_factories_per_lifetime() {
    trait Counter: Send + Sync {
        fn id(&self) -> usize;
    }
    struct Numbered(usize);
    impl Counter for Numbered {
        fn id(&self) -> usize {
            self.0
        }
    }

    let next = Arc::new(AtomicUsize::new(0));
    let n = next.clone();

    let mut sc = ServiceCollection::new();
    sc.add_scoped_trait_factory::<dyn Counter, _>(move |_| {
        Ok(Arc::new(Numbered(n.fetch_add(1, Ordering::SeqCst))) as Arc<dyn Counter>)
    });

    let sp = sc.build();
    let s1 = sp.create_scope();
    let s2 = sp.create_scope();
    assert_eq!(s1.get_required::<dyn Counter>().id(), s1.get_required::<dyn Counter>().id());
    assert_ne!(s1.get_required::<dyn Counter>().id(), s2.get_required::<dyn Counter>().id());
}

#[test]
#[should_panic(expected = "Failed to resolve")]
fn test_get_required_panics_when_missing() {
    let sp = ServiceCollection::new().build();
    sp.get_required::<u128>();
}
