//! In-memory [`Host`] shared by the unit tests of this crate.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Mutex;

use zoneclimate_domain::action::ServiceCall;
use zoneclimate_domain::entity::{EntityRef, EntitySnapshot, StateValue};
use zoneclimate_domain::error::{ActuationError, ClimateError};

use crate::ports::Host;

/// Entity table plus a log of every service call received.
///
/// Successful calls are reflected into the table the way a real device
/// would report them back.
#[derive(Default)]
pub struct FakeHost {
    entities: Mutex<HashMap<EntityRef, EntitySnapshot>>,
    calls: Mutex<Vec<ServiceCall>>,
    failing: Mutex<HashSet<EntityRef>>,
}

impl FakeHost {
    pub fn with(self, entity: &str, value: impl Into<StateValue>) -> Self {
        self.set(entity, value);
        self
    }

    pub fn with_snapshot(self, snapshot: EntitySnapshot) -> Self {
        self.entities
            .lock()
            .unwrap()
            .insert(snapshot.entity.clone(), snapshot);
        self
    }

    pub fn set(&self, entity: &str, value: impl Into<StateValue>) {
        let mut entities = self.entities.lock().unwrap();
        let entity = EntityRef::new(entity);
        let value = value.into();
        entities
            .entry(entity.clone())
            .and_modify(|snapshot| snapshot.update_value(value.clone()))
            .or_insert_with(|| EntitySnapshot::new(entity, value));
    }

    pub fn snapshot(&self, entity: &str) -> Option<EntitySnapshot> {
        self.entities
            .lock()
            .unwrap()
            .get(&EntityRef::new(entity))
            .cloned()
    }

    pub fn fail_calls_for(&self, entity: &str) {
        self.failing.lock().unwrap().insert(EntityRef::new(entity));
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl Host for FakeHost {
    fn get_state(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Option<EntitySnapshot>, ClimateError>> + Send {
        let snapshot = self.entities.lock().unwrap().get(entity).cloned();
        async { Ok(snapshot) }
    }

    fn entity_exists(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<bool, ClimateError>> + Send {
        let exists = self.entities.lock().unwrap().contains_key(entity);
        async move { Ok(exists) }
    }

    fn call_service(
        &self,
        call: ServiceCall,
    ) -> impl Future<Output = Result<(), ClimateError>> + Send {
        let result = if self.failing.lock().unwrap().contains(&call.entity) {
            Err(ActuationError {
                service: call.qualified_name(),
                entity: call.entity.clone(),
                reason: "device offline".to_string(),
            }
            .into())
        } else {
            let mut entities = self.entities.lock().unwrap();
            if let Some(snapshot) = entities.get_mut(&call.entity) {
                match call.service.as_str() {
                    "set_temperature" => {
                        if let Some(value) = call.data["temperature"].as_f64() {
                            snapshot
                                .attributes
                                .insert("temperature".to_string(), StateValue::Float(value));
                        }
                    }
                    "turn_on" => snapshot.update_value(StateValue::from("on")),
                    "turn_off" => snapshot.update_value(StateValue::from("off")),
                    "set_value" => {
                        if let Some(value) = call.data["value"].as_f64() {
                            snapshot.update_value(StateValue::Float(value));
                        }
                    }
                    _ => {}
                }
            }
            Ok(())
        };
        self.calls.lock().unwrap().push(call);
        async { result }
    }
}
