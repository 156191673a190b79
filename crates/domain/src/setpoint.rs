//! Setpoint sources: where a mode's temperature may come from.
//!
//! A zone and the process each carry one [`SetpointSources`]: an optional
//! fixed value and an optional entity reference per [`Mode`]. The resolver
//! in the application layer walks them in precedence order.

use crate::entity::EntityRef;
use crate::mode::{Mode, PerMode};

/// Heating limit applied when neither the zone nor the process sets one, in °C.
pub const DEFAULT_HEATING_LIMIT: f64 = 19.0;

/// Fixed values and entity references, one of each per mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetpointSources {
    pub fixed: PerMode<Option<f64>>,
    pub entities: PerMode<Option<EntityRef>>,
}

impl SetpointSources {
    #[must_use]
    pub fn fixed(&self, mode: Mode) -> Option<f64> {
        *self.fixed.get(mode)
    }

    #[must_use]
    pub fn entity(&self, mode: Mode) -> Option<&EntityRef> {
        self.entities.get(mode).as_ref()
    }

    /// Every configured entity reference, in mode order.
    pub fn configured_entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.entities.iter().filter_map(|(_, entity)| entity.as_ref())
    }
}

/// Process-wide fallbacks shared by every zone; read-only after start-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalSetpoints {
    pub sources: SetpointSources,
    /// Sensor feeding zones that have no external temperature sensor of their own.
    pub outdoor_temperature: Option<EntityRef>,
    /// Heating limit used by zones that configure none.
    pub heating_limit: Option<f64>,
}
