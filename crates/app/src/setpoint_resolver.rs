//! Setpoint resolution: which temperature a zone should hold in a mode.
//!
//! Sources are tried in this order; the first usable value wins:
//!
//! 1. the zone's setpoint entity for the mode
//! 2. the zone's fixed setpoint for the mode
//! 3. the global setpoint entity for the mode
//! 4. the global fixed setpoint for the mode
//! 5. the built-in default ([`Mode::default_setpoint`])
//!
//! An entity that is missing or reports a non-numeric value is logged and
//! skipped. Resolution itself never fails.

use std::fmt;

use zoneclimate_domain::entity::EntityRef;
use zoneclimate_domain::mode::Mode;
use zoneclimate_domain::setpoint::GlobalSetpoints;
use zoneclimate_domain::zone::Zone;

use crate::ports::Host;

/// Where a resolved setpoint came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointTier {
    ZoneEntity,
    ZoneFixed,
    GlobalEntity,
    GlobalFixed,
    BuiltIn,
}

impl fmt::Display for SetpointTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ZoneEntity => "zone entity",
            Self::ZoneFixed => "zone fixed",
            Self::GlobalEntity => "global entity",
            Self::GlobalFixed => "global fixed",
            Self::BuiltIn => "built-in default",
        })
    }
}

/// A setpoint together with the tier that provided it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSetpoint {
    pub value: f64,
    pub tier: SetpointTier,
}

/// Walks the setpoint precedence chain for a zone.
pub struct SetpointResolver<'a, H> {
    host: &'a H,
    globals: &'a GlobalSetpoints,
}

impl<'a, H: Host> SetpointResolver<'a, H> {
    pub fn new(host: &'a H, globals: &'a GlobalSetpoints) -> Self {
        Self { host, globals }
    }

    /// Resolve the setpoint of `zone` for `mode`, always a finite number.
    pub async fn resolve(&self, zone: &Zone, mode: Mode) -> f64 {
        self.resolve_with_tier(zone, mode).await.value
    }

    /// Like [`resolve`](Self::resolve), also reporting the winning tier.
    pub async fn resolve_with_tier(&self, zone: &Zone, mode: Mode) -> ResolvedSetpoint {
        let resolved = |value, tier| ResolvedSetpoint { value, tier };

        if let Some(value) = self.entity_value(zone, mode, zone.setpoints.entity(mode)).await {
            return resolved(value, SetpointTier::ZoneEntity);
        }
        if let Some(value) = finite(zone.setpoints.fixed(mode)) {
            return resolved(value, SetpointTier::ZoneFixed);
        }
        let globals = &self.globals.sources;
        if let Some(value) = self.entity_value(zone, mode, globals.entity(mode)).await {
            return resolved(value, SetpointTier::GlobalEntity);
        }
        if let Some(value) = finite(globals.fixed(mode)) {
            return resolved(value, SetpointTier::GlobalFixed);
        }
        resolved(mode.default_setpoint(), SetpointTier::BuiltIn)
    }

    async fn entity_value(&self, zone: &Zone, mode: Mode, entity: Option<&EntityRef>) -> Option<f64> {
        let entity = entity?;
        match self.host.numeric_state(entity).await {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    zone = %zone.id,
                    %mode,
                    %entity,
                    %err,
                    "setpoint entity unusable, falling through"
                );
                None
            }
        }
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}
