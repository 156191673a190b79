//! # zoneclimate-adapter-virtual
//!
//! In-memory stand-in for a home-automation host.
//!
//! [`VirtualHost`] keeps an entity table, answers the [`Host`] port and turns
//! every state change, whether injected with [`VirtualHost::set_state`] or
//! caused by a service call, into an [`Event`] on its publisher.
//!
//! ## Supported services
//!
//! | Service | Effect |
//! |---------|--------|
//! | `climate.set_temperature` | stores the `temperature` attribute |
//! | `homeassistant.turn_on` / `turn_off` | value becomes `on` / `off` |
//! | `input_number.set_value` | value becomes the given number |
//!
//! ## Dependency rule
//!
//! Depends on `zoneclimate-app` (port traits) and `zoneclimate-domain` only.

mod services;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use zoneclimate_app::ports::{EventPublisher, Host};
use zoneclimate_domain::action::ServiceCall;
use zoneclimate_domain::entity::{EntityRef, EntitySnapshot, StateValue};
use zoneclimate_domain::error::{ActuationError, ClimateError};
use zoneclimate_domain::event::Event;

/// Simulated host backed by an in-memory entity table.
pub struct VirtualHost<P> {
    publisher: P,
    entities: Mutex<HashMap<EntityRef, EntitySnapshot>>,
    calls: Mutex<Vec<ServiceCall>>,
    failing: Mutex<HashSet<EntityRef>>,
}

impl<P: EventPublisher + Send + Sync> VirtualHost<P> {
    /// An empty host publishing its state changes to `publisher`.
    #[must_use]
    pub fn new(publisher: P) -> Self {
        Self {
            publisher,
            entities: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Add or replace an entity without publishing anything.
    pub fn insert(&self, snapshot: EntitySnapshot) {
        lock(&self.entities).insert(snapshot.entity.clone(), snapshot);
    }

    /// Change the value of `entity`, creating it if needed, and publish the
    /// resulting event when the value actually changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be published.
    pub async fn set_state(
        &self,
        entity: impl Into<EntityRef>,
        value: impl Into<StateValue>,
    ) -> Result<(), ClimateError> {
        let entity = entity.into();
        let value = value.into();
        let event = {
            let mut entities = lock(&self.entities);
            match entities.get_mut(&entity) {
                Some(snapshot) if snapshot.value == value => None,
                Some(snapshot) => {
                    let old = snapshot.value.clone();
                    snapshot.update_value(value.clone());
                    Some(Event::state_changed(entity.clone(), Some(old), value))
                }
                None => {
                    entities.insert(entity.clone(), EntitySnapshot::new(entity.clone(), value.clone()));
                    Some(Event::state_changed(entity.clone(), None, value))
                }
            }
        };
        match event {
            Some(event) => {
                tracing::debug!(%entity, value = %event.new, "virtual state changed");
                self.publisher.publish(event).await
            }
            None => Ok(()),
        }
    }

    /// Current snapshot of `entity`.
    #[must_use]
    pub fn snapshot(&self, entity: &str) -> Option<EntitySnapshot> {
        lock(&self.entities).get(&EntityRef::new(entity)).cloned()
    }

    /// Every service call received so far, failed ones included.
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        lock(&self.calls).clone()
    }

    /// Drain the recorded service calls.
    pub fn take_calls(&self) -> Vec<ServiceCall> {
        std::mem::take(&mut *lock(&self.calls))
    }

    /// Make service calls targeting `entity` fail (or succeed again).
    pub fn set_failing(&self, entity: impl Into<EntityRef>, failing: bool) {
        let entity = entity.into();
        let mut set = lock(&self.failing);
        if failing {
            set.insert(entity);
        } else {
            set.remove(&entity);
        }
    }

    fn perform(&self, call: &ServiceCall) -> Result<Option<Event>, ClimateError> {
        let actuation_error = |reason: String| ActuationError {
            service: call.qualified_name(),
            entity: call.entity.clone(),
            reason,
        };
        if lock(&self.failing).contains(&call.entity) {
            return Err(actuation_error("simulated device failure".to_string()).into());
        }

        let mut entities = lock(&self.entities);
        let snapshot = entities
            .get_mut(&call.entity)
            .ok_or_else(|| actuation_error("unknown entity".to_string()))?;
        let before = snapshot.clone();
        services::apply(snapshot, call).map_err(actuation_error)?;

        if *snapshot == before {
            return Ok(None);
        }
        Ok(Some(Event::state_changed(
            call.entity.clone(),
            Some(before.value),
            snapshot.value.clone(),
        )))
    }
}

impl<P: EventPublisher + Send + Sync> Host for VirtualHost<P> {
    fn get_state(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Option<EntitySnapshot>, ClimateError>> + Send {
        let snapshot = lock(&self.entities).get(entity).cloned();
        async move { Ok(snapshot) }
    }

    fn entity_exists(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<bool, ClimateError>> + Send {
        let exists = lock(&self.entities).contains_key(entity);
        async move { Ok(exists) }
    }

    fn call_service(
        &self,
        call: ServiceCall,
    ) -> impl Future<Output = Result<(), ClimateError>> + Send {
        async move {
            let outcome = self.perform(&call);
            tracing::debug!(%call, ok = outcome.is_ok(), "virtual service call");
            lock(&self.calls).push(call);
            match outcome? {
                Some(event) => self.publisher.publish(event).await,
                None => Ok(()),
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
