//! Entities: host-side objects (sensors, thermostats, switches, inputs)
//! that zoneclimate reads from and acts upon.
//!
//! An [`EntityRef`] names an entity in the host's `domain.object_id` form.
//! The host reports an entity's current value as an [`EntitySnapshot`]:
//! a primary [`StateValue`] plus named attributes (a thermostat's current
//! `temperature` setpoint, for instance).

mod snapshot;
mod value;

pub use snapshot::EntitySnapshot;
pub use value::StateValue;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a host entity, e.g. `climate.living_room`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the first `.` (`climate` for `climate.office`).
    ///
    /// An identifier without a dot is its own domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(domain, _)| domain)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_extract_domain_before_first_dot() {
        assert_eq!(EntityRef::new("climate.living_room").domain(), "climate");
        assert_eq!(EntityRef::new("input_number.a.b").domain(), "input_number");
    }

    #[test]
    fn should_use_whole_identifier_as_domain_when_no_dot() {
        assert_eq!(EntityRef::new("heater").domain(), "heater");
    }

    #[test]
    fn should_deserialize_from_plain_string() {
        let entity: EntityRef = serde_json::from_str("\"switch.boiler\"").unwrap();
        assert_eq!(entity, EntityRef::from("switch.boiler"));
    }
}
