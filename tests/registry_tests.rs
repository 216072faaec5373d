use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use awesome_log::config::{with_console, with_file_rotation, with_level};
use awesome_log::{Config, ConfigOption, Error, Registry, Severity};
use tempfile::tempdir;

/// An option that counts how many times a construction applied it.
fn counting(counter: &Arc<AtomicUsize>) -> ConfigOption {
    let counter = counter.clone();
    ConfigOption::custom(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

/// Like `counting`, but holds the construction open for a while so that
/// racing callers pile up behind it.
fn slow_counting(counter: &Arc<AtomicUsize>) -> ConfigOption {
    let counter = counter.clone();
    ConfigOption::custom(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
    })
}

fn quiet() -> ConfigOption {
    with_console(false)
}

#[test]
fn test_concurrent_first_access_constructs_once() {
    let registry = Arc::new(Registry::new());
    let constructions = Arc::new(AtomicUsize::new(0));
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let registry = registry.clone();
            let constructions = constructions.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                registry
                    .get_or_create("payments", [quiet(), slow_counting(&constructions)])
                    .unwrap()
            })
        })
        .collect();

    let loggers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    for logger in &loggers[1..] {
        assert!(Arc::ptr_eq(&loggers[0], logger));
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_many_names_under_contention() {
    let registry = Arc::new(Registry::new());
    let names = ["a", "b", "c", "d", "e"];
    let counters: HashMap<&str, Arc<AtomicUsize>> = names
        .iter()
        .map(|name| (*name, Arc::new(AtomicUsize::new(0))))
        .collect();
    let counters = Arc::new(counters);
    let barrier = Arc::new(Barrier::new(20));

    let handles: Vec<_> = (0..20)
        .map(|t| {
            let registry = registry.clone();
            let counters = counters.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let mut got = Vec::new();
                for i in 0..names.len() {
                    let name = names[(t + i) % names.len()];
                    let logger = registry
                        .get_or_create(name, [quiet(), counting(&counters[name])])
                        .unwrap();
                    got.push((name, logger));
                }
                got
            })
        })
        .collect();

    let mut first: HashMap<&str, Arc<awesome_log::Logger>> = HashMap::new();
    for handle in handles {
        for (name, logger) in handle.join().unwrap() {
            let seen = first.entry(name).or_insert_with(|| logger.clone());
            assert!(Arc::ptr_eq(seen, &logger), "two instances for {name}");
        }
    }
    for name in names {
        assert_eq!(counters[name].load(Ordering::SeqCst), 1, "constructions of {name}");
    }
    assert_eq!(registry.names(), vec!["a", "b", "c", "d", "e"]);
}

#[test]
fn test_first_configuration_wins() {
    let registry = Registry::new();
    let first = registry
        .get_or_create("api", [quiet(), with_level("error")])
        .unwrap();
    let second = registry
        .get_or_create("api", [quiet(), with_level("debug")])
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.config().level, Severity::Error);
}

#[test]
fn test_lookup_never_constructs() {
    let registry = Registry::new();
    assert!(registry.lookup("ghost").is_none());
    assert!(registry.is_empty());

    let built = registry.get_or_create("ghost", [quiet()]).unwrap();
    let found = registry.lookup("ghost").unwrap();
    assert!(Arc::ptr_eq(&built, &found));
}

#[test]
fn test_inherits_default_config_as_copy() {
    let registry = Registry::new();
    registry.set_default_config(Config::from_options([quiet(), with_level("warn")]));

    let inherited = registry.get("inherits").unwrap();
    assert_eq!(inherited.config().level, Severity::Warn);

    // Explicit options beat the inherited configuration.
    let explicit = registry
        .get_or_create("explicit", [with_level("debug")])
        .unwrap();
    assert_eq!(explicit.config().level, Severity::Debug);
    assert!(!explicit.config().console);

    // Changing the default later does not touch existing loggers.
    registry.set_default_config(Config::from_options([quiet(), with_level("error")]));
    assert_eq!(inherited.config().level, Severity::Warn);
    assert_eq!(registry.get("later").unwrap().config().level, Severity::Error);
}

#[test]
fn test_builtin_defaults_without_default_config() {
    let registry = Registry::new();
    assert!(registry.default_config().is_none());
    let logger = registry.get_or_create("plain", [quiet()]).unwrap();
    assert_eq!(logger.config().level, Severity::Info);
    assert!(logger.file_path().is_none());
}

#[test]
fn test_failed_construction_leaves_name_absent() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"file").unwrap();

    let registry = Registry::new();
    let err = registry
        .get_or_create(
            "audit",
            [quiet(), with_file_rotation(blocker.join("app.log"), 1, 1, 1, false)],
        )
        .unwrap_err();
    assert!(matches!(err, Error::CreateDir { .. }), "got {err:?}");
    assert!(registry.lookup("audit").is_none());
    assert!(registry.is_empty());

    // A later call may retry with a working configuration.
    let logger = registry
        .get_or_create(
            "audit",
            [quiet(), with_file_rotation(dir.path().join("ok/app.log"), 1, 1, 1, false)],
        )
        .unwrap();
    assert_eq!(logger.file_path(), Some(dir.path().join("ok/app.audit.log").as_path()));
}

#[test]
fn test_panicking_construction_is_rolled_back() {
    let registry = Arc::new(Registry::new());
    let worker = registry.clone();
    let result = thread::spawn(move || {
        worker
            .get_or_create("fragile", [ConfigOption::custom(|_| panic!("bad option"))])
            .map(|_| ())
    })
    .join();
    assert!(result.is_err());
    assert!(registry.lookup("fragile").is_none());

    let logger = registry.get_or_create("fragile", [quiet()]).unwrap();
    assert_eq!(logger.name(), "fragile");
}

#[test]
fn test_rebuild_replaces_instance() {
    let registry = Registry::new();
    let old = registry.get_or_create("svc", [quiet()]).unwrap();
    let new = registry
        .rebuild("svc", Config::from_options([quiet(), with_level("error")]))
        .unwrap();
    assert!(!Arc::ptr_eq(&old, &new));
    assert!(Arc::ptr_eq(&new, &registry.lookup("svc").unwrap()));
    assert_eq!(Arc::strong_count(&old), 1, "registry should have released the old instance");
}

#[test]
fn test_failed_rebuild_keeps_previous() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"file").unwrap();

    let registry = Registry::new();
    let old = registry.get_or_create("svc", [quiet()]).unwrap();
    let bad = Config::from_options([quiet(), with_file_rotation(blocker.join("x.log"), 1, 1, 1, false)]);
    assert!(registry.rebuild("svc", bad).is_err());
    assert!(Arc::ptr_eq(&old, &registry.lookup("svc").unwrap()));
}

#[test]
fn test_sync_all() {
    let dir = tempdir().unwrap();
    let registry = Registry::new();
    registry.set_default_config(Config::from_options([
        quiet(),
        with_file_rotation(dir.path().join("app.log"), 1, 1, 1, false),
    ]));
    let one = registry.get("one").unwrap();
    let two = registry.get("two").unwrap();
    one.info("first");
    two.info("second");
    registry.sync_all().unwrap();

    let text = fs::read_to_string(dir.path().join("app.two.log")).unwrap();
    assert!(text.contains("second"));
}
