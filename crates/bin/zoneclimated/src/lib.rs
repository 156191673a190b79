//! # zoneclimated
//!
//! Composition root that wires the host adapter, the event bus and the zone
//! registry together.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Seed the virtual host
//! - Build the zone registry from the configured zones and initialize it
//! - Dispatch host events until shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no decision logic belongs here.

pub mod config;
pub mod console;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;

use zoneclimate_adapter_virtual::VirtualHost;
use zoneclimate_app::event_bus::InProcessEventBus;
use zoneclimate_app::zone_registry::ZoneRegistry;
use zoneclimate_domain::event::Event;

use crate::config::Config;

/// The host implementation the daemon runs against.
pub type DaemonHost = VirtualHost<Arc<InProcessEventBus>>;

/// A fully wired, initialized daemon, ready to run.
pub struct Daemon {
    pub host: Arc<DaemonHost>,
    pub registry: ZoneRegistry<Arc<DaemonHost>>,
    events: broadcast::Receiver<Event>,
}

impl Daemon {
    /// Seed the virtual host from `config`, build the zones and initialize
    /// the registry.
    pub async fn assemble(config: &Config) -> Self {
        let bus = Arc::new(InProcessEventBus::default());
        let host = Arc::new(VirtualHost::new(Arc::clone(&bus)));
        for snapshot in config.virtual_entities() {
            host.insert(snapshot);
        }

        // subscribe before initializing so no change made meanwhile is lost
        let events = bus.subscribe();
        let mut registry = ZoneRegistry::new(Arc::clone(&host), config.globals(), config.zones());
        registry.initialize().await;

        Self {
            host,
            registry,
            events,
        }
    }

    /// Dispatch events until `shutdown` completes.
    pub async fn run(self, shutdown: impl Future<Output = ()>) {
        self.registry.run(self.events, shutdown).await;
    }
}
