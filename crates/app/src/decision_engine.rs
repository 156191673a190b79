//! Zone decision engine: one action per zone, applied only on change.
//!
//! Every decision is a fresh evaluation of the zone's committed state:
//!
//! - **Thermostat**: an open opening selects the `off` setpoint, otherwise
//!   occupancy selects `occupied` or `away`; the setpoint comes from the
//!   [`SetpointResolver`]. The heating limit does not apply here.
//! - **Switch**: on while occupied, unless an opening is open or the
//!   [`HeatingLimitEvaluator`] says it is warm enough outside.
//!
//! The action is sent to the host only when the device does not already
//! reflect it.

use zoneclimate_domain::action::{Action, ServiceCall};
use zoneclimate_domain::entity::StateValue;
use zoneclimate_domain::error::ClimateError;
use zoneclimate_domain::mode::Mode;
use zoneclimate_domain::setpoint::GlobalSetpoints;
use zoneclimate_domain::zone::{Device, Zone, ZoneState};

use crate::heating_limit::HeatingLimitEvaluator;
use crate::ports::Host;
use crate::setpoint_resolver::SetpointResolver;

/// Thermostat attribute holding the active setpoint.
const TEMPERATURE_ATTRIBUTE: &str = "temperature";

/// The mode a thermostat zone should be in.
#[must_use]
pub fn target_mode(state: &ZoneState) -> Mode {
    if state.opening {
        Mode::Off
    } else if state.occupied {
        Mode::Occupied
    } else {
        Mode::Away
    }
}

/// The action to send, if the device does not already reflect `desired`.
#[must_use]
pub fn plan(desired: Action, current: Option<&Action>) -> Option<Action> {
    match current {
        Some(current) if desired.is_satisfied_by(current) => None,
        _ => Some(desired),
    }
}

/// Computes and applies per-zone decisions.
pub struct ZoneDecisionEngine<'a, H> {
    host: &'a H,
    globals: &'a GlobalSetpoints,
}

impl<'a, H: Host> ZoneDecisionEngine<'a, H> {
    pub fn new(host: &'a H, globals: &'a GlobalSetpoints) -> Self {
        Self { host, globals }
    }

    /// The action the zone's device should reflect right now.
    pub async fn decide(&self, zone: &Zone, state: &ZoneState) -> Action {
        match zone.device() {
            Device::Thermostat(_) => {
                let mode = target_mode(state);
                let resolved = SetpointResolver::new(self.host, self.globals)
                    .resolve_with_tier(zone, mode)
                    .await;
                tracing::debug!(
                    zone = %zone.id,
                    %mode,
                    setpoint = resolved.value,
                    tier = %resolved.tier,
                    "thermostat decision"
                );
                Action::SetTemperature(resolved.value)
            }
            Device::Switch(_) => {
                let limit_reached = HeatingLimitEvaluator::new(self.host, self.globals)
                    .exceeds(zone, state)
                    .await;
                let blocked = state.opening || limit_reached;
                tracing::debug!(
                    zone = %zone.id,
                    occupied = state.occupied,
                    opening = state.opening,
                    limit_reached,
                    "switch decision"
                );
                Action::SetPower(state.occupied && !blocked)
            }
        }
    }

    /// What the device currently reports, as the action it corresponds to.
    ///
    /// `None` when the device reports nothing usable.
    ///
    /// # Errors
    ///
    /// Propagates host lookup failures.
    pub async fn current(&self, zone: &Zone) -> Result<Option<Action>, ClimateError> {
        let device = zone.device();
        let Some(snapshot) = self.host.get_state(device.entity()).await? else {
            return Ok(None);
        };
        let current = match device {
            Device::Thermostat(_) => snapshot
                .numeric_attribute(TEMPERATURE_ATTRIBUTE)
                .map(Action::SetTemperature),
            Device::Switch(_) => power_state(&snapshot.value).map(Action::SetPower),
        };
        Ok(current)
    }

    /// Decide, compare with the device and send the action if needed.
    ///
    /// When the device reports nothing usable the last applied action stands
    /// in for it. Returns the action that was sent, `None` for a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::Actuation`] when the host rejects the call (the
    /// zone keeps its previous `last_applied`, so the next event retries), or
    /// propagates host lookup failures.
    pub async fn apply(
        &self,
        zone: &Zone,
        state: &mut ZoneState,
    ) -> Result<Option<Action>, ClimateError> {
        let desired = self.decide(zone, state).await;
        let current = self.current(zone).await?.or(state.last_applied);

        let Some(action) = plan(desired, current.as_ref()) else {
            tracing::debug!(zone = %zone.id, %desired, "device already up to date");
            return Ok(None);
        };

        let call = action.service_call(zone.device().entity());
        self.host.call_service(call).await?;
        state.last_applied = Some(action);
        tracing::info!(zone = %zone.id, %action, "action applied");
        Ok(Some(action))
    }

    /// Copy an external temperature reading into the zone's mirror input.
    ///
    /// Only thermostat zones with a mirror forward anything; returns whether
    /// a call was made.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::Actuation`] when the host rejects the call.
    pub async fn forward_external_temperature(
        &self,
        zone: &Zone,
        temperature: f64,
    ) -> Result<bool, ClimateError> {
        let (true, Some(mirror)) = (
            zone.device().is_thermostat(),
            zone.external_temperature_mirror.as_ref(),
        ) else {
            return Ok(false);
        };
        self.host
            .call_service(ServiceCall::set_value(mirror.clone(), temperature))
            .await?;
        tracing::debug!(zone = %zone.id, %mirror, temperature, "external temperature mirrored");
        Ok(true)
    }
}

fn power_state(value: &StateValue) -> Option<bool> {
    if value.is_truthy() {
        return Some(true);
    }
    match value {
        StateValue::Bool(false) => Some(false),
        StateValue::String(text) if text == "off" => Some(false),
        _ => None,
    }
}
