//! Shared plugin fixtures for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use stratum_layer::{
    Capability, Domain, LayerLifecycleListener, ServiceManager, StratumHost, TypeCatalog,
    WatchDirectory, into_instance,
};
use stratum_test::{PackageFixture, TestWorkspace};

pub const GREETER: &str = "demo.Greeter";
pub const CLOCK: &str = "demo.Clock";
pub const ARTIFACT_KEY: &str = "plugin-service-loader";

pub trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

pub struct GreeterCapability;

impl Capability for GreeterCapability {
    const ID: &'static str = GREETER;
    type Object = dyn Greeter;
}

pub trait Clock: Send + Sync {
    fn zone(&self) -> &'static str;
}

pub struct ClockCapability;

impl Capability for ClockCapability {
    const ID: &'static str = CLOCK;
    type Object = dyn Clock;
}

struct English;

impl Greeter for English {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {name}")
    }
}

struct French;

impl Greeter for French {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour, {name}")
    }
}

struct Utc;

impl Clock for Utc {
    fn zone(&self) -> &'static str {
        "UTC"
    }
}

pub const GREETER_DESCRIPTOR: &str = r#"
[[module]]
name = "demo.greeter"
version = "1.0.0"
exports = ["demo::English", "demo::French"]

[[module.provides]]
capability = "demo.Greeter"
with = ["demo::English", "demo::French"]
"#;

pub const CLOCK_DESCRIPTOR: &str = r#"
[[module]]
name = "demo.clock"
requires = ["demo.greeter"]
exports = ["demo::Utc"]

[[module.provides]]
capability = "demo.Clock"
with = ["demo::Utc"]
"#;

/// Catalog with the finder and every demo type registered.
pub fn catalog() -> TypeCatalog {
    let catalog = TypeCatalog::new();
    stratum_finder::register(&catalog);
    catalog.register_fn("demo::English", |_| {
        Ok(into_instance::<dyn Greeter>(Arc::new(English)))
    });
    catalog.register_fn("demo::French", |_| {
        Ok(into_instance::<dyn Greeter>(Arc::new(French)))
    });
    catalog.register_fn("demo::Utc", |_| Ok(into_instance::<dyn Clock>(Arc::new(Utc))));
    catalog
}

/// A workspace with no finder package.
pub fn bare_workspace() -> TestWorkspace {
    stratum_test::setup_test_logging("warn,stratum_layer=debug,stratum_finder=debug");
    TestWorkspace::new()
}

/// A workspace with the finder package installed under `libs/`.
pub fn workspace() -> TestWorkspace {
    let ws = bare_workspace();
    stratum_finder::write_package(&ws.libs(), ARTIFACT_KEY).unwrap();
    ws
}

pub fn add_greeter(ws: &TestWorkspace) -> PathBuf {
    PackageFixture::new("greeter-1.0.0.jar")
        .descriptor(GREETER_DESCRIPTOR)
        .write_to(&ws.plugins())
        .unwrap()
}

pub fn add_clock(ws: &TestWorkspace) -> PathBuf {
    PackageFixture::new("clock-0.3.tar.gz")
        .descriptor(CLOCK_DESCRIPTOR)
        .write_to(&ws.plugins().join("time"))
        .unwrap()
}

pub fn host(ws: &TestWorkspace) -> StratumHost {
    StratumHost::builder(ws.path()).catalog(catalog()).build()
}

pub fn plugins_dir(ws: &TestWorkspace) -> WatchDirectory {
    WatchDirectory::new("plugins", ws.plugins())
}

pub fn start(ws: &TestWorkspace) -> Arc<ServiceManager> {
    host(ws).set_watch_directory(plugins_dir(ws)).unwrap()
}

/// Records lifecycle events as `(event, layer, generation)`.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<(&'static str, String, u64)>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<(&'static str, String, u64)> {
        self.events.lock().unwrap().clone()
    }
}

impl LayerLifecycleListener for RecordingListener {
    fn layer_added(&self, name: &str, domain: &Arc<Domain>) {
        self.events
            .lock()
            .unwrap()
            .push(("added", name.to_string(), domain.generation()));
    }

    fn layer_being_removed(&self, name: &str, domain: &Arc<Domain>) {
        self.events
            .lock()
            .unwrap()
            .push(("being_removed", name.to_string(), domain.generation()));
    }
}
