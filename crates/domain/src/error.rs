//! Common error types used across the workspace.
//!
//! Each failure class has its own typed error; [`ClimateError`] wraps them
//! through `#[from]` so that every layer can propagate with `?` and the
//! dispatcher can decide how loudly to report each class.

use crate::entity::EntityRef;
use crate::id::ZoneId;

/// Top-level error for every fallible zoneclimate operation.
#[derive(Debug, thiserror::Error)]
pub enum ClimateError {
    /// A zone or global setting is missing or inconsistent.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A referenced entity does not exist on the host.
    #[error("entity not found: {0}")]
    EntityNotFound(#[from] EntityNotFoundError),

    /// A value could not be interpreted as a temperature.
    #[error("value conversion failed: {0}")]
    ValueConversion(#[from] ValueConversionError),

    /// The host rejected or failed a service call.
    #[error("actuation failed: {0}")]
    Actuation(#[from] ActuationError),
}

/// Invalid zone or process-wide configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// The zone descriptor does not name a device entity.
    #[error("zone {zone} has no device entity")]
    MissingDevice { zone: String },

    /// The zone's device entity does not exist on the host.
    #[error("zone {zone}: device {entity} does not exist")]
    DeviceNotFound { zone: ZoneId, entity: EntityRef },

    /// Two zone descriptors resolve to the same identifier.
    #[error("zone {zone} is declared more than once")]
    DuplicateZone { zone: ZoneId },

    /// A thermostat zone declares an external sensor but no mirror input.
    #[error("zone {zone}: external temperature sensor {sensor} requires a mirror input")]
    MissingMirror { zone: ZoneId, sensor: EntityRef },

    /// A numeric setting is not a finite number.
    #[error("zone {zone}: {field} must be a finite number, got {value}")]
    NonFinite {
        zone: String,
        field: &'static str,
        value: f64,
    },
}

/// A referenced entity is absent from the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} does not exist")]
pub struct EntityNotFoundError {
    pub entity: EntityRef,
}

/// An entity value that should have been numeric was not.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} reported {value:?}, which is not a number")]
pub struct ValueConversionError {
    pub entity: EntityRef,
    pub value: String,
}

/// A service call could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{service} on {entity}: {reason}")]
pub struct ActuationError {
    pub service: String,
    pub entity: EntityRef,
    pub reason: String,
}
