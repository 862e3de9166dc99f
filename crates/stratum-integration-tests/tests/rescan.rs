//! Rescans: layer replacement, generations and lifecycle notifications.

mod common;

use std::sync::Arc;

use common::*;
use stratum_layer::{Capability, ErrorClass, LayerError};
use stratum_test::PackageFixture;

#[test]
fn superset_rescan_replaces_the_plugin_domain() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);
    assert_eq!(manager.generation(), 1);
    assert!(manager.find(&ClockCapability::id()).unwrap().is_empty());

    let (old_id, old_weak) = {
        let old = &manager.registry().plugin_domains()[0];
        (old.id(), Arc::downgrade(old))
    };

    add_clock(&ws);
    manager.rescan().unwrap();
    assert_eq!(manager.generation(), 2);

    let clocks = manager.find(&ClockCapability::id()).unwrap();
    assert_eq!(clocks.len(), 1);
    assert_eq!(clocks.type_names(), vec!["demo::Utc"]);
    assert_eq!(clocks.find_first().unwrap().domain().generation(), 2);

    let domains = manager.domains();
    assert_eq!(domains.len(), 2);
    assert!(domains.iter().all(|d| d.id() != old_id));
    drop(domains);
    drop(clocks);
    assert!(old_weak.upgrade().is_none(), "old plugin domain still alive");
}

#[test]
fn rescan_redeploys_the_finder() {
    let ws = workspace();
    let manager = start(&ws);
    let before = manager.finder().unwrap();

    add_greeter(&ws);
    manager.rescan().unwrap();
    let after = manager.finder().unwrap();

    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.domain().generation(), 2);
    assert_eq!(manager.find(&GreeterCapability::id()).unwrap().len(), 2);
    // Interest declared on the new finder's module only.
    assert_eq!(before.module().interest().declared_count(), 0);
    assert_eq!(after.module().interest().declared_count(), 1);
}

#[test]
fn listeners_see_added_then_being_removed() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);

    let recorder = Arc::new(RecordingListener::default());
    manager.add_listener(Arc::clone(&recorder) as Arc<dyn stratum_layer::LayerLifecycleListener>);

    manager.rescan().unwrap();
    manager.rescan().unwrap();

    assert_eq!(
        recorder.events(),
        vec![
            ("being_removed", "plugins".to_string(), 1),
            ("added", "plugins".to_string(), 2),
            ("being_removed", "plugins".to_string(), 2),
            ("added", "plugins".to_string(), 3),
        ]
    );
}

#[test]
fn emptied_directory_notifies_removal_only() {
    let ws = workspace();
    let greeter = add_greeter(&ws);
    let manager = start(&ws);

    let recorder = Arc::new(RecordingListener::default());
    manager.add_listener(Arc::clone(&recorder) as Arc<dyn stratum_layer::LayerLifecycleListener>);

    std::fs::remove_file(greeter).unwrap();
    manager.rescan().unwrap();

    assert_eq!(
        recorder.events(),
        vec![("being_removed", "plugins".to_string(), 1)]
    );
    assert_eq!(manager.domains().len(), 1);
}

#[test]
fn missing_requirement_leaves_no_plugin_domain() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);
    let finder = manager.finder().unwrap();

    PackageFixture::new("broken-2.0.jar")
        .descriptor("[[module]]\nname = \"demo.broken\"\nrequires = [\"demo.absent\"]\n")
        .write_to(&ws.plugins())
        .unwrap();

    let err = manager.rescan().unwrap_err();
    match &err {
        LayerError::Resolution { module, requires } => {
            assert_eq!(module, "demo.broken");
            assert_eq!(requires, "demo.absent");
        },
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.class(), ErrorClass::Resolution);

    assert_eq!(manager.domains().len(), 1);
    assert!(manager.registry().plugin_domains().is_empty());
    assert!(Arc::ptr_eq(&finder, &manager.finder().unwrap()));
}

#[test]
fn initial_resolution_failure_can_be_fixed_and_retried() {
    let ws = workspace();
    let clock = add_clock(&ws);
    let host = host(&ws);

    let err = host.set_watch_directory(plugins_dir(&ws)).unwrap_err();
    assert!(matches!(err, LayerError::Resolution { .. }));
    assert!(host.manager().is_none());

    std::fs::remove_file(clock).unwrap();
    let manager = host.set_watch_directory(plugins_dir(&ws)).unwrap();
    assert_eq!(manager.domains().len(), 1);
}
