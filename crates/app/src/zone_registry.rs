//! Zone registry: owns every zone and dispatches host events to them.
//!
//! The registry is the single writer of all zone state. It is driven by one
//! task ([`ZoneRegistry::run`]) that handles host events and debounce
//! expiries strictly one at a time, so no zone state is ever shared.
//!
//! Lifecycle:
//!
//! 1. [`new`](ZoneRegistry::new): take ownership of the configured zones
//! 2. [`initialize`](ZoneRegistry::initialize): check references against the
//!    host, read initial sensor values, build the routing table, evaluate
//!    every zone once
//! 3. [`run`](ZoneRegistry::run): dispatch until the bus closes or shutdown

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

use zoneclimate_domain::entity::{EntityRef, StateValue};
use zoneclimate_domain::error::{
    ClimateError, ConfigurationError, EntityNotFoundError, ValueConversionError,
};
use zoneclimate_domain::event::Event;
use zoneclimate_domain::id::ZoneId;
use zoneclimate_domain::mode::Mode;
use zoneclimate_domain::setpoint::GlobalSetpoints;
use zoneclimate_domain::signal::Signal;
use zoneclimate_domain::zone::{Zone, ZoneState};

use crate::debounce::{DebounceGate, GateOutcome};
use crate::decision_engine::ZoneDecisionEngine;
use crate::ports::Host;
use crate::timers::{DeferredTasks, Expiry};

/// What an entity's state change means for the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// Raw value of a debounced signal of zone `0`.
    Signal(usize, Signal),
    /// External temperature sensor of zone `0`.
    ExternalTemperature(usize),
    /// A setpoint or heating-limit source of zone `0`.
    Reevaluate(usize),
    /// The process-wide outdoor temperature sensor.
    Outdoor,
}

struct ZoneSlot {
    zone: Zone,
    state: ZoneState,
    gates: HashMap<Signal, DebounceGate>,
    active: bool,
}

/// Owner of all zones, their runtime state and their debounce gates.
pub struct ZoneRegistry<H> {
    host: H,
    globals: GlobalSetpoints,
    zones: Vec<ZoneSlot>,
    by_id: HashMap<ZoneId, usize>,
    routes: HashMap<EntityRef, Vec<Route>>,
    timers: DeferredTasks,
    expiries: mpsc::UnboundedReceiver<Expiry>,
}

impl<H: Host> ZoneRegistry<H> {
    /// Take ownership of `zones`.
    ///
    /// A zone whose id was already taken is reported and dropped.
    pub fn new(host: H, globals: GlobalSetpoints, zones: impl IntoIterator<Item = Zone>) -> Self {
        let (timers, expiries) = DeferredTasks::new();
        let mut registry = Self {
            host,
            globals,
            zones: Vec::new(),
            by_id: HashMap::new(),
            routes: HashMap::new(),
            timers,
            expiries,
        };
        for zone in zones {
            if registry.by_id.contains_key(&zone.id) {
                let err = ConfigurationError::DuplicateZone {
                    zone: zone.id.clone(),
                };
                report(&zone.id, &err.into());
                continue;
            }
            registry.by_id.insert(zone.id.clone(), registry.zones.len());
            registry.zones.push(ZoneSlot {
                state: ZoneState {
                    occupied: zone.occupancy.is_none(),
                    ..ZoneState::default()
                },
                zone,
                gates: HashMap::new(),
                active: true,
            });
        }
        registry
    }

    /// Validate every zone against the host, read initial values, subscribe
    /// to the relevant entities and evaluate every active zone once.
    ///
    /// Problems are logged and degrade only the zone or feature concerned.
    #[tracing::instrument(skip(self), fields(zones = self.zones.len()))]
    pub async fn initialize(&mut self) {
        self.check_global_references().await;
        for idx in 0..self.zones.len() {
            self.initialize_zone(idx).await;
        }
        self.build_routes();
        self.seed_outdoor_temperature().await;
        tracing::info!(
            active = self.active_zones(),
            configured = self.zones.len(),
            "zone registry initialized"
        );
        self.evaluate_all().await;
    }

    async fn check_global_references(&mut self) {
        let host = &self.host;
        let registry = ZoneId::new("<global>");
        retain_existing(host, &registry, &mut self.globals.outdoor_temperature).await;
        for mode in Mode::ALL {
            retain_existing(host, &registry, self.globals.sources.entities.get_mut(mode)).await;
        }
    }

    async fn initialize_zone(&mut self, idx: usize) {
        let Self {
            host,
            globals,
            zones,
            ..
        } = self;
        let slot = &mut zones[idx];
        let zone = &mut slot.zone;

        let device = zone.device().entity().clone();
        match host.entity_exists(&device).await {
            Ok(true) => {}
            Ok(false) => {
                let err = ConfigurationError::DeviceNotFound {
                    zone: zone.id.clone(),
                    entity: device,
                };
                report(&zone.id, &err.into());
                slot.active = false;
                return;
            }
            Err(err) => {
                report(&zone.id, &err);
                slot.active = false;
                return;
            }
        }

        let id = zone.id.clone();
        retain_existing(&*host, &id, &mut zone.occupancy).await;
        retain_existing(&*host, &id, &mut zone.opening).await;
        retain_existing(&*host, &id, &mut zone.external_temperature).await;
        retain_existing(&*host, &id, &mut zone.external_temperature_mirror).await;
        retain_existing(&*host, &id, &mut zone.heating_limit_entity).await;
        for mode in Mode::ALL {
            retain_existing(&*host, &id, zone.setpoints.entities.get_mut(mode)).await;
        }

        if zone.device().is_thermostat() && zone.external_temperature_mirror.is_none() {
            if let Some(sensor) = zone.external_temperature.take() {
                let err = ConfigurationError::MissingMirror {
                    zone: id.clone(),
                    sensor,
                };
                report(&id, &err.into());
            }
        }

        let state = &mut slot.state;
        state.occupied = match &zone.occupancy {
            Some(entity) => read_truthy(&*host, entity).await,
            None => true,
        };
        state.opening = match &zone.opening {
            Some(entity) => read_truthy(&*host, entity).await,
            None => false,
        };
        if let Some(entity) = &zone.external_temperature {
            state.external_temperature = read_temperature(&*host, entity).await;
            if let Some(temperature) = state.external_temperature {
                let engine = ZoneDecisionEngine::new(&*host, &*globals);
                if let Err(err) = engine.forward_external_temperature(zone, temperature).await {
                    report(&id, &err);
                }
            }
        }
        tracing::debug!(
            zone = %id,
            device = %zone.device().entity(),
            occupied = state.occupied,
            opening = state.opening,
            external_temperature = ?state.external_temperature,
            "zone initialized"
        );
    }

    fn build_routes(&mut self) {
        let mut routes: HashMap<EntityRef, Vec<Route>> = HashMap::new();
        let mut add = |entity: &EntityRef, route: Route| {
            let entry = routes.entry(entity.clone()).or_default();
            if !entry.contains(&route) {
                entry.push(route);
            }
        };

        for (idx, slot) in self.zones.iter().enumerate() {
            if !slot.active {
                continue;
            }
            let zone = &slot.zone;
            for signal in [Signal::Occupancy, Signal::Opening] {
                if let Some(entity) = zone.signal_source(signal) {
                    add(entity, Route::Signal(idx, signal));
                }
            }
            if let Some(entity) = &zone.external_temperature {
                add(entity, Route::ExternalTemperature(idx));
            }
            if let Some(entity) = &zone.heating_limit_entity {
                add(entity, Route::Reevaluate(idx));
            }
            let setpoint_entities = zone
                .setpoints
                .configured_entities()
                .chain(self.globals.sources.configured_entities());
            for entity in setpoint_entities {
                add(entity, Route::Reevaluate(idx));
            }
        }
        if let Some(entity) = &self.globals.outdoor_temperature {
            add(entity, Route::Outdoor);
        }

        tracing::debug!(entities = routes.len(), "routing table built");
        self.routes = routes;
    }

    async fn seed_outdoor_temperature(&mut self) {
        let Some(entity) = &self.globals.outdoor_temperature else {
            return;
        };
        let temperature = read_temperature(&self.host, entity).await;
        self.share_outdoor_temperature(temperature);
    }

    fn share_outdoor_temperature(&mut self, temperature: Option<f64>) {
        for slot in &mut self.zones {
            if slot.active && slot.zone.external_temperature.is_none() {
                slot.state.external_temperature = temperature;
            }
        }
    }

    /// Route one host event to every zone subscribed to its entity.
    #[tracing::instrument(
        skip(self, event),
        fields(entity = %event.entity, value = %event.new, at = %event.timestamp)
    )]
    pub async fn handle_event(&mut self, event: &Event) {
        let Some(routes) = self.routes.get(&event.entity).cloned() else {
            tracing::trace!("no zone listens to this entity");
            return;
        };
        for route in routes {
            match route {
                Route::Signal(idx, signal) => self.on_signal(idx, signal, &event.new).await,
                Route::ExternalTemperature(idx) => {
                    self.on_external_temperature(idx, &event.entity, &event.new)
                        .await;
                }
                Route::Reevaluate(idx) => self.evaluate(idx).await,
                Route::Outdoor => self.on_outdoor_temperature(&event.entity, &event.new).await,
            }
        }
    }

    async fn on_signal(&mut self, idx: usize, signal: Signal, value: &StateValue) {
        let raw = value.is_truthy();
        let slot = &mut self.zones[idx];
        let zone_id = slot.zone.id.clone();
        let delays = slot.zone.delays.for_signal(signal);
        let committed = slot.state.signal(signal);
        let gate = slot
            .gates
            .entry(signal)
            .or_insert_with(|| DebounceGate::new(delays, committed));
        let outcome = gate.on_raw_signal(raw, Instant::now());
        tracing::debug!(zone = %zone_id, %signal, raw, ?outcome, "raw signal");

        match outcome {
            GateOutcome::Committed(value) => {
                self.timers.cancel(&zone_id, signal);
                self.commit(idx, signal, value).await;
            }
            GateOutcome::Scheduled {
                delay, generation, ..
            } => self.timers.schedule(zone_id, signal, generation, delay),
            GateOutcome::Cancelled => self.timers.cancel(&zone_id, signal),
            GateOutcome::Unchanged => {}
        }
    }

    /// Commit a debounce wake-up if it is still current.
    pub async fn handle_expiry(&mut self, expiry: Expiry) {
        let Some(&idx) = self.by_id.get(&expiry.zone) else {
            return;
        };
        let Some(gate) = self.zones[idx].gates.get_mut(&expiry.signal) else {
            return;
        };
        match gate.on_deadline(expiry.generation) {
            Some(value) => {
                self.timers.cancel(&expiry.zone, expiry.signal);
                self.commit(idx, expiry.signal, value).await;
            }
            None => {
                tracing::debug!(zone = %expiry.zone, signal = %expiry.signal, "stale debounce expiry");
            }
        }
    }

    /// Wait for the next debounce wake-up and handle it.
    ///
    /// Returns `false` once no wake-up can ever arrive again.
    pub async fn process_next_expiry(&mut self) -> bool {
        match self.expiries.recv().await {
            Some(expiry) => {
                self.handle_expiry(expiry).await;
                true
            }
            None => false,
        }
    }

    async fn commit(&mut self, idx: usize, signal: Signal, value: bool) {
        let slot = &mut self.zones[idx];
        slot.state.set_signal(signal, value);
        tracing::info!(zone = %slot.zone.id, %signal, value, "signal committed");
        self.evaluate(idx).await;
    }

    async fn on_external_temperature(&mut self, idx: usize, entity: &EntityRef, value: &StateValue) {
        let temperature = parse_temperature(entity, value);
        let Self {
            host,
            globals,
            zones,
            ..
        } = self;
        let slot = &mut zones[idx];
        slot.state.external_temperature = temperature;
        if let Some(temperature) = temperature {
            let engine = ZoneDecisionEngine::new(&*host, &*globals);
            if let Err(err) = engine
                .forward_external_temperature(&slot.zone, temperature)
                .await
            {
                report(&slot.zone.id, &err);
            }
        }
        self.evaluate(idx).await;
    }

    async fn on_outdoor_temperature(&mut self, entity: &EntityRef, value: &StateValue) {
        if value.is_unusable() {
            tracing::debug!("outdoor temperature unknown, keeping previous value");
            return;
        }
        let Some(temperature) = parse_temperature(entity, value) else {
            return;
        };
        self.share_outdoor_temperature(Some(temperature));
        self.evaluate_all().await;
    }

    async fn evaluate(&mut self, idx: usize) {
        let Self {
            host,
            globals,
            zones,
            ..
        } = self;
        let slot = &mut zones[idx];
        if !slot.active {
            return;
        }
        let engine = ZoneDecisionEngine::new(&*host, &*globals);
        if let Err(err) = engine.apply(&slot.zone, &mut slot.state).await {
            report(&slot.zone.id, &err);
        }
    }

    async fn evaluate_all(&mut self) {
        for idx in 0..self.zones.len() {
            self.evaluate(idx).await;
        }
    }

    /// Re-read every source the zones listen to and feed the values through
    /// the same paths as host events, then evaluate every zone.
    ///
    /// Used when bus events were lost.
    #[tracing::instrument(skip(self))]
    pub async fn resync(&mut self) {
        for idx in 0..self.zones.len() {
            if !self.zones[idx].active {
                continue;
            }
            for signal in [Signal::Occupancy, Signal::Opening] {
                let Some(entity) = self.zones[idx].zone.signal_source(signal).cloned() else {
                    continue;
                };
                if let Some(value) = self.read_current(&entity).await {
                    self.on_signal(idx, signal, &value).await;
                }
            }
            if let Some(entity) = self.zones[idx].zone.external_temperature.clone() {
                if let Some(value) = self.read_current(&entity).await {
                    self.on_external_temperature(idx, &entity, &value).await;
                }
            }
        }
        if let Some(entity) = self.globals.outdoor_temperature.clone() {
            if let Some(value) = self.read_current(&entity).await {
                self.on_outdoor_temperature(&entity, &value).await;
            }
        }
        self.evaluate_all().await;
    }

    async fn read_current(&self, entity: &EntityRef) -> Option<StateValue> {
        match self.host.get_state(entity).await {
            Ok(Some(snapshot)) => {
                tracing::debug!(
                    %entity,
                    value = %snapshot.value,
                    last_changed = %snapshot.last_changed,
                    "source re-read"
                );
                Some(snapshot.value)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(%entity, %err, "failed to re-read source");
                None
            }
        }
    }

    /// Dispatch host events and debounce wake-ups until the bus closes or
    /// `shutdown` completes.
    pub async fn run(
        mut self,
        mut events: broadcast::Receiver<Event>,
        shutdown: impl Future<Output = ()>,
    ) {
        let mut shutdown = std::pin::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping zone registry");
                    break;
                }
                received = events.recv() => match received {
                    Ok(event) => self.handle_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event bus lagged, resynchronizing zones");
                        self.resync().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("event bus closed, stopping zone registry");
                        break;
                    }
                },
                Some(expiry) = self.expiries.recv() => self.handle_expiry(expiry).await,
            }
        }
    }

    /// Runtime state of a zone.
    #[must_use]
    pub fn state(&self, id: &ZoneId) -> Option<&ZoneState> {
        self.slot(id).map(|slot| &slot.state)
    }

    /// Configuration of a zone, as normalised during initialization.
    #[must_use]
    pub fn zone(&self, id: &ZoneId) -> Option<&Zone> {
        self.slot(id).map(|slot| &slot.zone)
    }

    /// Whether the zone takes part in decisions.
    #[must_use]
    pub fn is_active(&self, id: &ZoneId) -> bool {
        self.slot(id).is_some_and(|slot| slot.active)
    }

    #[must_use]
    pub fn active_zones(&self) -> usize {
        self.zones.iter().filter(|slot| slot.active).count()
    }

    /// Debounce wake-ups still waiting to fire.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.pending()
    }

    fn slot(&self, id: &ZoneId) -> Option<&ZoneSlot> {
        self.by_id.get(id).map(|&idx| &self.zones[idx])
    }
}

/// Clear `reference` when the host does not know the entity.
async fn retain_existing<H: Host>(host: &H, zone: &ZoneId, reference: &mut Option<EntityRef>) {
    let Some(entity) = reference.as_ref() else {
        return;
    };
    match host.entity_exists(entity).await {
        Ok(true) => {}
        Ok(false) => {
            let err = EntityNotFoundError {
                entity: entity.clone(),
            };
            report(zone, &err.into());
            *reference = None;
        }
        Err(err) => report(zone, &err),
    }
}

async fn read_truthy<H: Host>(host: &H, entity: &EntityRef) -> bool {
    match host.get_state(entity).await {
        Ok(Some(snapshot)) => snapshot.value.is_truthy(),
        Ok(None) => false,
        Err(err) => {
            tracing::warn!(%entity, %err, "failed to read initial signal value");
            false
        }
    }
}

async fn read_temperature<H: Host>(host: &H, entity: &EntityRef) -> Option<f64> {
    match host.get_state(entity).await {
        Ok(Some(snapshot)) => parse_temperature(entity, &snapshot.value),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(%entity, %err, "failed to read initial temperature");
            None
        }
    }
}

/// `unknown`/`unavailable` mean "no reading"; any other non-number is logged.
fn parse_temperature(entity: &EntityRef, value: &StateValue) -> Option<f64> {
    if value.is_unusable() {
        return None;
    }
    let temperature = value.as_f64();
    if temperature.is_none() {
        let err = ValueConversionError {
            entity: entity.clone(),
            value: value.to_string(),
        };
        tracing::warn!(%err, "ignoring temperature reading");
    }
    temperature
}

/// Log `err` at the level its class deserves.
fn report(zone: &ZoneId, err: &ClimateError) {
    match err {
        ClimateError::Configuration(_) | ClimateError::Actuation(_) => {
            tracing::error!(zone = %zone, %err, "zone error");
        }
        ClimateError::EntityNotFound(_) | ClimateError::ValueConversion(_) => {
            tracing::warn!(zone = %zone, %err, "zone degraded");
        }
    }
}
