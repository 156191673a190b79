//! Heating limit: suppress heating while it is warm enough outside.

use zoneclimate_domain::setpoint::{DEFAULT_HEATING_LIMIT, GlobalSetpoints};
use zoneclimate_domain::zone::{Zone, ZoneState};

use crate::ports::Host;

/// Compares a zone's external temperature with its heating limit.
pub struct HeatingLimitEvaluator<'a, H> {
    host: &'a H,
    globals: &'a GlobalSetpoints,
}

impl<'a, H: Host> HeatingLimitEvaluator<'a, H> {
    pub fn new(host: &'a H, globals: &'a GlobalSetpoints) -> Self {
        Self { host, globals }
    }

    /// The limit applying to `zone`: its limit entity if numeric, else its
    /// fixed limit, else the process-wide limit, else
    /// [`DEFAULT_HEATING_LIMIT`].
    pub async fn limit(&self, zone: &Zone) -> f64 {
        if let Some(entity) = &zone.heating_limit_entity {
            match self.host.numeric_state(entity).await {
                Ok(limit) => return limit,
                Err(err) => {
                    tracing::warn!(zone = %zone.id, %entity, %err, "heating limit entity unusable");
                }
            }
        }
        let finite = |limit: &f64| limit.is_finite();
        zone.heating_limit
            .filter(finite)
            .or(self.globals.heating_limit.filter(finite))
            .unwrap_or(DEFAULT_HEATING_LIMIT)
    }

    /// Whether the external temperature has reached the limit.
    ///
    /// An unknown external temperature never counts as exceeding.
    pub async fn exceeds(&self, zone: &Zone, state: &ZoneState) -> bool {
        let Some(temperature) = state.external_temperature else {
            return false;
        };
        let limit = self.limit(zone).await;
        temperature >= limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeHost;
    use zoneclimate_domain::entity::EntityRef;
    use zoneclimate_domain::zone::Device;

    fn switch_zone() -> zoneclimate_domain::zone::ZoneBuilder {
        Zone::builder().device(Device::Switch(EntityRef::new("switch.heater")))
    }

    fn with_external(temperature: Option<f64>) -> ZoneState {
        ZoneState {
            external_temperature: temperature,
            ..ZoneState::default()
        }
    }

    #[tokio::test]
    async fn should_never_exceed_when_external_temperature_unknown() {
        let host = FakeHost::default();
        let globals = GlobalSetpoints::default();
        let zone = switch_zone().heating_limit(-50.0).build().unwrap();

        let evaluator = HeatingLimitEvaluator::new(&host, &globals);

        assert!(!evaluator.exceeds(&zone, &with_external(None)).await);
    }

    #[tokio::test]
    async fn should_exceed_when_temperature_reaches_limit() {
        let host = FakeHost::default();
        let globals = GlobalSetpoints::default();
        let zone = switch_zone().heating_limit(19.0).build().unwrap();
        let evaluator = HeatingLimitEvaluator::new(&host, &globals);

        assert!(evaluator.exceeds(&zone, &with_external(Some(19.0))).await);
        assert!(evaluator.exceeds(&zone, &with_external(Some(25.0))).await);
        assert!(!evaluator.exceeds(&zone, &with_external(Some(18.9))).await);
    }

    #[tokio::test]
    async fn should_prefer_limit_entity_over_fixed_limit() {
        let host = FakeHost::default().with("input_number.heating_limit", 15.0);
        let globals = GlobalSetpoints::default();
        let zone = switch_zone()
            .heating_limit_entity("input_number.heating_limit")
            .heating_limit(22.0)
            .build()
            .unwrap();

        let limit = HeatingLimitEvaluator::new(&host, &globals).limit(&zone).await;

        assert!((limit - 15.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_fall_back_to_fixed_limit_when_entity_not_numeric() {
        let host = FakeHost::default().with("input_number.heating_limit", "unknown");
        let globals = GlobalSetpoints::default();
        let zone = switch_zone()
            .heating_limit_entity("input_number.heating_limit")
            .heating_limit(22.0)
            .build()
            .unwrap();

        let limit = HeatingLimitEvaluator::new(&host, &globals).limit(&zone).await;

        assert!((limit - 22.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_use_global_then_default_limit() {
        let host = FakeHost::default();
        let zone = switch_zone().build().unwrap();

        let globals = GlobalSetpoints {
            heating_limit: Some(16.0),
            ..GlobalSetpoints::default()
        };
        let limit = HeatingLimitEvaluator::new(&host, &globals).limit(&zone).await;
        assert!((limit - 16.0).abs() < f64::EPSILON);

        let globals = GlobalSetpoints::default();
        let limit = HeatingLimitEvaluator::new(&host, &globals).limit(&zone).await;
        assert!((limit - DEFAULT_HEATING_LIMIT).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_skip_non_finite_zone_limit_in_favour_of_global() {
        let host = FakeHost::default();
        let globals = GlobalSetpoints {
            heating_limit: Some(16.0),
            ..GlobalSetpoints::default()
        };
        let mut zone = switch_zone().build().unwrap();
        zone.heating_limit = Some(f64::NAN);

        let limit = HeatingLimitEvaluator::new(&host, &globals).limit(&zone).await;

        assert!((limit - 16.0).abs() < f64::EPSILON);
    }
}
