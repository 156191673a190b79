//! Zone: one independently controlled climate unit.
//!
//! A zone couples exactly one actuated [`Device`] with optional sensors
//! (occupancy, opening, external temperature), optional setpoint sources and
//! the debounce delays applied to its signals. The configuration half is the
//! [`Zone`]; the runtime half that events mutate is the [`ZoneState`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::entity::EntityRef;
use crate::error::ConfigurationError;
use crate::id::ZoneId;
use crate::mode::Mode;
use crate::setpoint::SetpointSources;
use crate::signal::Signal;

/// The actuator of a zone and the capability it offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entity", rename_all = "snake_case")]
pub enum Device {
    /// Accepts a temperature setpoint (`climate.*`).
    Thermostat(EntityRef),
    /// Can only be switched on and off.
    Switch(EntityRef),
}

impl Device {
    /// Pick the capability from the entity's domain: `climate.*` entities are
    /// thermostats, everything else is treated as a switch.
    #[must_use]
    pub fn infer(entity: EntityRef) -> Self {
        if entity.domain() == "climate" {
            Self::Thermostat(entity)
        } else {
            Self::Switch(entity)
        }
    }

    #[must_use]
    pub fn entity(&self) -> &EntityRef {
        match self {
            Self::Thermostat(entity) | Self::Switch(entity) => entity,
        }
    }

    #[must_use]
    pub fn is_thermostat(&self) -> bool {
        matches!(self, Self::Thermostat(_))
    }
}

/// How long a raw signal must hold before it is committed, per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalDelays {
    pub to_true: Duration,
    pub to_false: Duration,
}

impl SignalDelays {
    #[must_use]
    pub fn new(to_true: Duration, to_false: Duration) -> Self {
        Self { to_true, to_false }
    }

    /// Both directions are immediate; every raw event is committed as is.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.to_true.is_zero() && self.to_false.is_zero()
    }

    #[must_use]
    pub fn towards(&self, value: bool) -> Duration {
        if value { self.to_true } else { self.to_false }
    }
}

/// Debounce configuration of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub to_occupied: Duration,
    pub to_unoccupied: Duration,
    pub opening_open: Duration,
    pub opening_close: Duration,
}

impl Delays {
    #[must_use]
    pub fn for_signal(&self, signal: Signal) -> SignalDelays {
        match signal {
            Signal::Occupancy => SignalDelays::new(self.to_occupied, self.to_unoccupied),
            Signal::Opening => SignalDelays::new(self.opening_open, self.opening_close),
        }
    }

    /// All four delays set to zero.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            to_occupied: Duration::ZERO,
            to_unoccupied: Duration::ZERO,
            opening_open: Duration::ZERO,
            opening_close: Duration::ZERO,
        }
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            to_occupied: Duration::from_secs(10),
            to_unoccupied: Duration::from_secs(10),
            opening_open: Duration::from_secs(300),
            opening_close: Duration::from_secs(15),
        }
    }
}

/// Static configuration of a zone.
///
/// The device is fixed at construction; the optional references may be
/// cleared during start-up when the host does not know them.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    device: Device,
    pub occupancy: Option<EntityRef>,
    pub opening: Option<EntityRef>,
    pub external_temperature: Option<EntityRef>,
    pub external_temperature_mirror: Option<EntityRef>,
    pub heating_limit_entity: Option<EntityRef>,
    pub heating_limit: Option<f64>,
    pub setpoints: SetpointSources,
    pub delays: Delays,
}

impl Zone {
    /// Create a builder for constructing a [`Zone`].
    #[must_use]
    pub fn builder() -> ZoneBuilder {
        ZoneBuilder::default()
    }

    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The sensor feeding `signal`, if any.
    #[must_use]
    pub fn signal_source(&self, signal: Signal) -> Option<&EntityRef> {
        match signal {
            Signal::Occupancy => self.occupancy.as_ref(),
            Signal::Opening => self.opening.as_ref(),
        }
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NonFinite`] when a fixed setpoint or the
    /// heating limit is NaN or infinite.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let check = |field: &'static str, value: Option<f64>| match value {
            Some(value) if !value.is_finite() => Err(ConfigurationError::NonFinite {
                zone: self.id.to_string(),
                field,
                value,
            }),
            _ => Ok(()),
        };
        check("heating_limit", self.heating_limit)?;
        check("occupied_heating_setpoint", self.setpoints.fixed(Mode::Occupied))?;
        check("away_heating_setpoint", self.setpoints.fixed(Mode::Away))?;
        check("off_heating_setpoint", self.setpoints.fixed(Mode::Off))?;
        Ok(())
    }
}

/// Step-by-step builder for [`Zone`].
#[derive(Debug, Default)]
pub struct ZoneBuilder {
    id: Option<ZoneId>,
    device: Option<Device>,
    occupancy: Option<EntityRef>,
    opening: Option<EntityRef>,
    external_temperature: Option<EntityRef>,
    external_temperature_mirror: Option<EntityRef>,
    heating_limit_entity: Option<EntityRef>,
    heating_limit: Option<f64>,
    setpoints: SetpointSources,
    delays: Option<Delays>,
}

impl ZoneBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(ZoneId::new(id));
        self
    }

    #[must_use]
    pub fn device(mut self, device: Device) -> Self {
        self.device = Some(device);
        self
    }

    #[must_use]
    pub fn occupancy(mut self, entity: impl Into<EntityRef>) -> Self {
        self.occupancy = Some(entity.into());
        self
    }

    #[must_use]
    pub fn opening(mut self, entity: impl Into<EntityRef>) -> Self {
        self.opening = Some(entity.into());
        self
    }

    #[must_use]
    pub fn external_temperature(mut self, entity: impl Into<EntityRef>) -> Self {
        self.external_temperature = Some(entity.into());
        self
    }

    #[must_use]
    pub fn external_temperature_mirror(mut self, entity: impl Into<EntityRef>) -> Self {
        self.external_temperature_mirror = Some(entity.into());
        self
    }

    #[must_use]
    pub fn heating_limit_entity(mut self, entity: impl Into<EntityRef>) -> Self {
        self.heating_limit_entity = Some(entity.into());
        self
    }

    #[must_use]
    pub fn heating_limit(mut self, limit: f64) -> Self {
        self.heating_limit = Some(limit);
        self
    }

    #[must_use]
    pub fn setpoint(mut self, mode: Mode, value: f64) -> Self {
        *self.setpoints.fixed.get_mut(mode) = Some(value);
        self
    }

    #[must_use]
    pub fn setpoint_entity(mut self, mode: Mode, entity: impl Into<EntityRef>) -> Self {
        *self.setpoints.entities.get_mut(mode) = Some(entity.into());
        self
    }

    #[must_use]
    pub fn delays(mut self, delays: Delays) -> Self {
        self.delays = Some(delays);
        self
    }

    /// Consume the builder, validate, and return a [`Zone`].
    ///
    /// The id defaults to the device entity when not given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingDevice`] without a device, or
    /// [`ConfigurationError::NonFinite`] for a NaN/infinite setting.
    pub fn build(self) -> Result<Zone, ConfigurationError> {
        let Some(device) = self.device else {
            return Err(ConfigurationError::MissingDevice {
                zone: self
                    .id
                    .map_or_else(|| "<unnamed>".to_string(), |id| id.to_string()),
            });
        };
        let zone = Zone {
            id: self
                .id
                .unwrap_or_else(|| ZoneId::new(device.entity().as_str())),
            device,
            occupancy: self.occupancy,
            opening: self.opening,
            external_temperature: self.external_temperature,
            external_temperature_mirror: self.external_temperature_mirror,
            heating_limit_entity: self.heating_limit_entity,
            heating_limit: self.heating_limit,
            setpoints: self.setpoints,
            delays: self.delays.unwrap_or_default(),
        };
        zone.validate()?;
        Ok(zone)
    }
}

/// Runtime state of a zone, each field written by exactly one handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneState {
    pub occupied: bool,
    pub opening: bool,
    pub external_temperature: Option<f64>,
    pub last_applied: Option<Action>,
}

impl ZoneState {
    #[must_use]
    pub fn signal(&self, signal: Signal) -> bool {
        match signal {
            Signal::Occupancy => self.occupied,
            Signal::Opening => self.opening,
        }
    }

    pub fn set_signal(&mut self, signal: Signal, value: bool) {
        match signal {
            Signal::Occupancy => self.occupied = value,
            Signal::Opening => self.opening = value,
        }
    }
}
