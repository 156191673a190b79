//! Actions (what a zone decision asks the device to do) and the host
//! service calls they translate into.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityRef;

/// Two temperatures closer than this are considered the same setpoint.
const TEMPERATURE_TOLERANCE: f64 = 0.01;

/// Target state for a zone's device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Action {
    /// Drive a thermostat to this setpoint, in °C.
    SetTemperature(f64),
    /// Switch a generic device on (`true`) or off (`false`).
    SetPower(bool),
}

impl Action {
    /// Whether the device already reflects this action.
    #[must_use]
    pub fn is_satisfied_by(&self, current: &Self) -> bool {
        match (self, current) {
            (Self::SetTemperature(want), Self::SetTemperature(have)) => {
                (want - have).abs() < TEMPERATURE_TOLERANCE
            }
            (Self::SetPower(want), Self::SetPower(have)) => want == have,
            _ => false,
        }
    }

    /// The host call that applies this action to `device`.
    #[must_use]
    pub fn service_call(&self, device: &EntityRef) -> ServiceCall {
        match self {
            Self::SetTemperature(value) => ServiceCall::set_temperature(device.clone(), *value),
            Self::SetPower(true) => ServiceCall::turn_on(device.clone()),
            Self::SetPower(false) => ServiceCall::turn_off(device.clone()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetTemperature(value) => write!(f, "set_temperature({value})"),
            Self::SetPower(true) => f.write_str("set_power(on)"),
            Self::SetPower(false) => f.write_str("set_power(off)"),
        }
    }
}

/// A fire-and-forget request to the host, e.g. `climate.set_temperature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub entity: EntityRef,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ServiceCall {
    #[must_use]
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        entity: EntityRef,
        data: serde_json::Value,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            entity,
            data,
        }
    }

    #[must_use]
    pub fn set_temperature(entity: EntityRef, temperature: f64) -> Self {
        Self::new(
            "climate",
            "set_temperature",
            entity,
            serde_json::json!({ "temperature": temperature }),
        )
    }

    #[must_use]
    pub fn turn_on(entity: EntityRef) -> Self {
        Self::new("homeassistant", "turn_on", entity, serde_json::json!({}))
    }

    #[must_use]
    pub fn turn_off(entity: EntityRef) -> Self {
        Self::new("homeassistant", "turn_off", entity, serde_json::json!({}))
    }

    /// Write a number into an input entity (used to mirror sensors).
    #[must_use]
    pub fn set_value(entity: EntityRef, value: f64) -> Self {
        Self::new(
            "input_number",
            "set_value",
            entity,
            serde_json::json!({ "value": value }),
        )
    }

    /// `domain.service`, as used in logs and error messages.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }
}

impl fmt::Display for ServiceCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.domain, self.service, self.entity)
    }
}
