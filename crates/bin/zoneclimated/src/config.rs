//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `zoneclimate.toml` in the working directory, or the file named
//! by `ZONECLIMATE_CONFIG`. Every field has a default so the file is
//! optional, but unknown keys are rejected. Environment variables take
//! precedence over file values for logging.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use zoneclimate_domain::entity::{EntityRef, EntitySnapshot, StateValue};
use zoneclimate_domain::error::ConfigurationError;
use zoneclimate_domain::mode::Mode;
use zoneclimate_domain::setpoint::{GlobalSetpoints, SetpointSources};
use zoneclimate_domain::zone::{Delays, Device, Zone};

const DEFAULT_PATH: &str = "zoneclimate.toml";
const DEFAULT_FILTER: &str = "zoneclimated=info,zoneclimate=info";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Raise the default log level of zoneclimate crates to `debug`.
    pub debug: bool,
    /// Process-wide outdoor temperature sensor.
    pub outdoor_temperature_entity: Option<String>,
    /// Heating limit for zones without their own.
    pub outdoor_temperature_limit: Option<f64>,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Setpoints shared by every zone.
    pub setpoints: SetpointsConfig,
    /// One entry per zone.
    pub zones: Vec<ZoneDescriptor>,
    /// Seed of the in-memory host.
    #[serde(rename = "virtual")]
    pub virtual_host: VirtualConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Global setpoints, fixed values and entities.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetpointsConfig {
    pub occupied: Option<f64>,
    pub away: Option<f64>,
    pub off: Option<f64>,
    pub occupied_entity: Option<String>,
    pub away_entity: Option<String>,
    pub off_entity: Option<String>,
}

/// What the zone's device is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Thermostat,
    Switch,
}

/// Configuration of a single zone.
///
/// Delays are in seconds.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneDescriptor {
    pub name: Option<String>,
    pub climate_entity: Option<String>,
    pub device_kind: Option<DeviceKind>,
    pub occupancy_entity: Option<String>,
    pub opening_entity: Option<String>,
    pub external_temperature_entity: Option<String>,
    pub external_temperature_input: Option<String>,
    pub heating_limit_entity: Option<String>,
    pub heating_limit: Option<f64>,
    pub to_occupied_delay: Option<f64>,
    pub to_inoccupied_delay: Option<f64>,
    pub opening_delay_open: Option<f64>,
    pub opening_delay_close: Option<f64>,
    pub occupied_heating_setpoint: Option<f64>,
    pub away_heating_setpoint: Option<f64>,
    pub off_heating_setpoint: Option<f64>,
    pub occupied_heating_setpoint_entity: Option<String>,
    pub away_heating_setpoint_entity: Option<String>,
    pub off_heating_setpoint_entity: Option<String>,
}

/// Entities the in-memory host starts with.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VirtualConfig {
    pub entities: Vec<VirtualEntity>,
}

/// One seeded entity.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualEntity {
    pub entity: String,
    pub state: StateValue,
    #[serde(default)]
    pub attributes: HashMap<String, StateValue>,
}

impl Config {
    /// Load configuration from `ZONECLIMATE_CONFIG` or `zoneclimate.toml`
    /// (if present) then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed or invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("ZONECLIMATE_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ZONECLIMATE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        finite("outdoor_temperature_limit", self.outdoor_temperature_limit)?;
        finite("setpoints.occupied", self.setpoints.occupied)?;
        finite("setpoints.away", self.setpoints.away)?;
        finite("setpoints.off", self.setpoints.off)?;
        for zone in &self.zones {
            zone.validate()?;
        }
        Ok(())
    }

    /// The filter directive the subscriber should start with.
    #[must_use]
    pub fn log_filter(&self) -> String {
        if self.debug {
            format!("{},zoneclimate=debug", self.logging.filter)
        } else {
            self.logging.filter.clone()
        }
    }

    /// Process-wide setpoint sources.
    #[must_use]
    pub fn globals(&self) -> GlobalSetpoints {
        let setpoints = &self.setpoints;
        let mut sources = SetpointSources::default();
        *sources.fixed.get_mut(Mode::Occupied) = setpoints.occupied;
        *sources.fixed.get_mut(Mode::Away) = setpoints.away;
        *sources.fixed.get_mut(Mode::Off) = setpoints.off;
        *sources.entities.get_mut(Mode::Occupied) = entity(setpoints.occupied_entity.as_ref());
        *sources.entities.get_mut(Mode::Away) = entity(setpoints.away_entity.as_ref());
        *sources.entities.get_mut(Mode::Off) = entity(setpoints.off_entity.as_ref());
        GlobalSetpoints {
            sources,
            outdoor_temperature: entity(self.outdoor_temperature_entity.as_ref()),
            heating_limit: self.outdoor_temperature_limit,
        }
    }

    /// Build every valid zone. Invalid descriptors are logged and skipped.
    #[must_use]
    pub fn zones(&self) -> Vec<Zone> {
        self.zones
            .iter()
            .enumerate()
            .filter_map(|(index, descriptor)| match descriptor.to_zone() {
                Ok(zone) => Some(zone),
                Err(err) => {
                    tracing::error!(index, %err, "skipping zone");
                    None
                }
            })
            .collect()
    }

    /// Snapshots the in-memory host is seeded with.
    pub fn virtual_entities(&self) -> impl Iterator<Item = EntitySnapshot> + '_ {
        self.virtual_host.entities.iter().map(|seed| {
            seed.attributes.iter().fold(
                EntitySnapshot::new(seed.entity.as_str(), seed.state.clone()),
                |snapshot, (name, value)| snapshot.with_attribute(name.clone(), value.clone()),
            )
        })
    }
}

impl ZoneDescriptor {
    fn validate(&self) -> Result<(), ConfigError> {
        finite("heating_limit", self.heating_limit)?;
        finite("occupied_heating_setpoint", self.occupied_heating_setpoint)?;
        finite("away_heating_setpoint", self.away_heating_setpoint)?;
        finite("off_heating_setpoint", self.off_heating_setpoint)?;
        for (field, delay) in [
            ("to_occupied_delay", self.to_occupied_delay),
            ("to_inoccupied_delay", self.to_inoccupied_delay),
            ("opening_delay_open", self.opening_delay_open),
            ("opening_delay_close", self.opening_delay_close),
        ] {
            if let Some(seconds) = delay {
                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "{field} must be a non-negative number of seconds, got {seconds}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Turn the descriptor into a [`Zone`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingDevice`] without `climate_entity`
    /// and [`ConfigurationError::NonFinite`] for unusable numbers.
    pub fn to_zone(&self) -> Result<Zone, ConfigurationError> {
        let name = self.name.clone();
        let mut builder = Zone::builder();
        if let Some(name) = &name {
            builder = builder.id(name.clone());
        }
        if let Some(device) = &self.climate_entity {
            let device = EntityRef::new(device.as_str());
            builder = builder.device(match self.device_kind {
                Some(DeviceKind::Thermostat) => Device::Thermostat(device),
                Some(DeviceKind::Switch) => Device::Switch(device),
                None => Device::infer(device),
            });
        }

        if let Some(entity) = &self.occupancy_entity {
            builder = builder.occupancy(entity.as_str());
        }
        if let Some(entity) = &self.opening_entity {
            builder = builder.opening(entity.as_str());
        }
        if let Some(entity) = &self.external_temperature_entity {
            builder = builder.external_temperature(entity.as_str());
        }
        if let Some(entity) = &self.external_temperature_input {
            builder = builder.external_temperature_mirror(entity.as_str());
        }
        if let Some(entity) = &self.heating_limit_entity {
            builder = builder.heating_limit_entity(entity.as_str());
        }
        if let Some(limit) = self.heating_limit {
            builder = builder.heating_limit(limit);
        }

        let setpoints = [
            (Mode::Occupied, self.occupied_heating_setpoint, &self.occupied_heating_setpoint_entity),
            (Mode::Away, self.away_heating_setpoint, &self.away_heating_setpoint_entity),
            (Mode::Off, self.off_heating_setpoint, &self.off_heating_setpoint_entity),
        ];
        for (mode, fixed, entity) in setpoints {
            if let Some(value) = fixed {
                builder = builder.setpoint(mode, value);
            }
            if let Some(entity) = entity {
                builder = builder.setpoint_entity(mode, entity.as_str());
            }
        }

        let zone_name = || name.clone().or_else(|| self.climate_entity.clone()).unwrap_or_default();
        let seconds = |field: &'static str, value: Option<f64>, default: Duration| match value {
            None => Ok(default),
            Some(seconds) => Duration::try_from_secs_f64(seconds).map_err(|_| {
                ConfigurationError::NonFinite {
                    zone: zone_name(),
                    field,
                    value: seconds,
                }
            }),
        };
        let defaults = Delays::default();
        let delays = Delays {
            to_occupied: seconds("to_occupied_delay", self.to_occupied_delay, defaults.to_occupied)?,
            to_unoccupied: seconds(
                "to_inoccupied_delay",
                self.to_inoccupied_delay,
                defaults.to_unoccupied,
            )?,
            opening_open: seconds("opening_delay_open", self.opening_delay_open, defaults.opening_open)?,
            opening_close: seconds(
                "opening_delay_close",
                self.opening_delay_close,
                defaults.opening_close,
            )?,
        };

        builder.delays(delays).build()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
        }
    }
}

fn entity(value: Option<&String>) -> Option<EntityRef> {
    value.map(|value| EntityRef::new(value.as_str()))
}

fn finite(field: &str, value: Option<f64>) -> Result<(), ConfigError> {
    match value {
        Some(value) if !value.is_finite() => Err(ConfigError::Validation(format!(
            "{field} must be a finite number, got {value}"
        ))),
        _ => Ok(()),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
