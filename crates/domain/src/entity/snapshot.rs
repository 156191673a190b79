//! Point-in-time view of a host entity.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{EntityRef, StateValue};
use crate::error::ValueConversionError;
use crate::time::{Timestamp, now};

/// The current value and attributes of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity: EntityRef,
    pub value: StateValue,
    #[serde(default)]
    pub attributes: HashMap<String, StateValue>,
    pub last_changed: Timestamp,
}

impl EntitySnapshot {
    #[must_use]
    pub fn new(entity: impl Into<EntityRef>, value: impl Into<StateValue>) -> Self {
        Self {
            entity: entity.into(),
            value: value.into(),
            attributes: HashMap::new(),
            last_changed: now(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&StateValue> {
        self.attributes.get(name)
    }

    /// Replace the primary value, bumping `last_changed` only on a real change.
    pub fn update_value(&mut self, value: StateValue) {
        if self.value != value {
            self.value = value;
            self.last_changed = now();
        }
    }

    /// The primary value as a finite number.
    ///
    /// # Errors
    ///
    /// Returns [`ValueConversionError`] when the value is not numeric
    /// (including `unknown` / `unavailable`).
    pub fn numeric(&self) -> Result<f64, ValueConversionError> {
        self.value.as_f64().ok_or_else(|| ValueConversionError {
            entity: self.entity.clone(),
            value: self.value.to_string(),
        })
    }

    /// A named attribute as a finite number, `None` when absent or not numeric.
    #[must_use]
    pub fn numeric_attribute(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(StateValue::as_f64)
    }
}
