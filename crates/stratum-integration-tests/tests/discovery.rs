//! Capability lookups and type resolution through the installed finder.

mod common;

use common::*;
use stratum_layer::{Capability, CapabilityId, LayerError, ListenerCapability};
use stratum_test::PackageFixture;

#[test]
fn find_twice_declares_interest_once() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);

    let first = manager.find(&GreeterCapability::id()).unwrap();
    let second = manager.find(&GreeterCapability::id()).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(second.type_names(), first.type_names());

    let finder = manager.finder().unwrap();
    let interest = finder.module().interest();
    assert_eq!(interest.declared_count(), 1);
    assert!(interest.contains(&GreeterCapability::id()));
}

#[test]
fn find_with_no_providers_is_empty_not_an_error() {
    let ws = workspace();
    let manager = start(&ws);

    let providers = manager
        .find(&CapabilityId::new("demo.Nothing").unwrap())
        .unwrap();
    assert!(providers.is_empty());
    assert!(providers.find_first().is_none());
}

#[test]
fn providers_are_lazy_and_cached() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);

    let providers = manager.find(&GreeterCapability::id()).unwrap();
    assert!(providers.iter().all(|p| !p.is_instantiated()));

    let greetings: Vec<String> = providers
        .instances::<GreeterCapability>()
        .map(|g| g.unwrap().greet("Ada"))
        .collect();
    assert_eq!(greetings, vec!["Hello, Ada", "Bonjour, Ada"]);
    assert!(providers.iter().all(|p| p.is_instantiated()));

    // A second pass reuses the cached instances.
    let first = providers.find_first().unwrap();
    let a = first.get().unwrap();
    let b = first.get().unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert_eq!(providers.iter().count(), 2);
}

#[test]
fn typed_helpers() {
    let ws = workspace();
    add_greeter(&ws);
    add_clock(&ws);
    let manager = start(&ws);

    let greeters = manager.find_typed::<GreeterCapability>().unwrap();
    assert_eq!(greeters.len(), 2);

    let clock = manager.first::<ClockCapability>().unwrap().unwrap();
    assert_eq!(clock.zone(), "UTC");
}

#[test]
fn listeners_include_builtin_and_finder() {
    let ws = workspace();
    let manager = start(&ws);

    let listeners = manager.find(&ListenerCapability::id()).unwrap();
    let mut types = listeners.type_names();
    types.sort_unstable();
    assert_eq!(
        types,
        vec![
            stratum_finder::FINDER_TYPE,
            stratum_layer::LOGGING_LISTENER_TYPE,
        ]
    );
    // Declared statically by the finder module.
    assert_eq!(manager.finder().unwrap().module().interest().declared_count(), 0);
}

#[test]
fn resolve_type_round_trip() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);

    let handle = manager.resolve_type("demo::French").unwrap();
    assert_eq!(handle.name(), "demo::French");
    assert_eq!(handle.module().name(), "demo.greeter");
    assert_eq!(handle.domain().name(), "plugins");

    let instance = handle.instantiate().unwrap();
    let greeter = instance
        .downcast_ref::<std::sync::Arc<dyn Greeter>>()
        .unwrap();
    assert_eq!(greeter.greet("Lin"), "Bonjour, Lin");
}

#[test]
fn resolve_type_miss_probes_every_domain_once() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);

    match manager.resolve_type("demo::Klingon").unwrap_err() {
        LayerError::TypeNotFound { name, probed } => {
            assert_eq!(name, "demo::Klingon");
            assert_eq!(probed, manager.domains().len());
        },
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn finder_resolves_types_from_its_domain_and_parents() {
    let ws = workspace();
    add_greeter(&ws);
    let manager = start(&ws);
    let finder = manager.finder().unwrap();

    let handle = finder.resolve_type("demo::English").unwrap();
    assert_eq!(handle.domain().name(), "plugins");

    let err = finder.resolve_type("demo::Missing").unwrap_err();
    assert!(err.is_lookup_miss());
    match err {
        // finder-layer, then boot and plugins
        LayerError::TypeNotFound { probed, .. } => assert_eq!(probed, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn descriptorless_package_becomes_automatic_module() {
    let ws = workspace();
    PackageFixture::new("legacy-tools-3.1.zip")
        .file("README.txt", "no descriptor")
        .write_to(&ws.plugins())
        .unwrap();
    let manager = start(&ws);

    let domain = &manager.registry().plugin_domains()[0];
    let module = domain.module("legacy-tools").unwrap();
    assert!(module.is_automatic());
    assert!(module.can_use(&GreeterCapability::id()));
}

#[test]
fn hidden_packages_are_not_loaded() {
    let ws = workspace();
    PackageFixture::new("greeter-1.0.0.jar")
        .descriptor(GREETER_DESCRIPTOR)
        .write_to(&ws.plugins().join(".staging"))
        .unwrap();
    let manager = start(&ws);

    assert_eq!(manager.domains().len(), 1);
    assert!(manager.find(&GreeterCapability::id()).unwrap().is_empty());
}
