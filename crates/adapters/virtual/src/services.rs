//! How virtual entities react to service calls.

use zoneclimate_domain::action::ServiceCall;
use zoneclimate_domain::entity::{EntitySnapshot, StateValue};

/// Apply `call` to `snapshot` the way a real device of that domain would.
///
/// # Errors
///
/// Returns the reason when the call is not supported for the entity or
/// carries unusable data.
pub(crate) fn apply(snapshot: &mut EntitySnapshot, call: &ServiceCall) -> Result<(), String> {
    match (call.domain.as_str(), call.service.as_str()) {
        ("climate", "set_temperature") => {
            let temperature = number(&call.data, "temperature")?;
            snapshot
                .attributes
                .insert("temperature".to_string(), StateValue::Float(temperature));
        }
        ("homeassistant" | "switch" | "input_boolean", "turn_on") => {
            snapshot.update_value(StateValue::from("on"));
        }
        ("homeassistant" | "switch" | "input_boolean", "turn_off") => {
            snapshot.update_value(StateValue::from("off"));
        }
        ("input_number", "set_value") => {
            let value = number(&call.data, "value")?;
            snapshot.update_value(StateValue::Float(value));
        }
        (domain, service) => return Err(format!("unsupported service {domain}.{service}")),
    }
    Ok(())
}

fn number(data: &serde_json::Value, field: &str) -> Result<f64, String> {
    data.get(field)
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| format!("missing numeric `{field}`"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoneclimate_domain::entity::EntityRef;

    #[test]
    fn should_store_thermostat_setpoint_as_attribute() {
        let mut snapshot = EntitySnapshot::new("climate.office", "heat");
        let call = ServiceCall::set_temperature(EntityRef::new("climate.office"), 20.5);

        apply(&mut snapshot, &call).unwrap();

        assert_eq!(snapshot.numeric_attribute("temperature"), Some(20.5));
        assert_eq!(snapshot.value, StateValue::from("heat"));
    }

    #[test]
    fn should_switch_power_state() {
        let mut snapshot = EntitySnapshot::new("switch.heater", "off");

        apply(&mut snapshot, &ServiceCall::turn_on(EntityRef::new("switch.heater"))).unwrap();
        assert_eq!(snapshot.value, StateValue::from("on"));

        apply(&mut snapshot, &ServiceCall::turn_off(EntityRef::new("switch.heater"))).unwrap();
        assert_eq!(snapshot.value, StateValue::from("off"));
    }

    #[test]
    fn should_set_input_number_value() {
        let mut snapshot = EntitySnapshot::new("input_number.outside", 0.0);

        apply(
            &mut snapshot,
            &ServiceCall::set_value(EntityRef::new("input_number.outside"), -3.5),
        )
        .unwrap();

        assert_eq!(snapshot.value, StateValue::Float(-3.5));
    }

    #[test]
    fn should_reject_unsupported_service() {
        let mut snapshot = EntitySnapshot::new("light.kitchen", "off");
        let call = ServiceCall::new(
            "light",
            "toggle",
            EntityRef::new("light.kitchen"),
            serde_json::Value::Null,
        );

        let err = apply(&mut snapshot, &call).unwrap_err();

        assert_eq!(err, "unsupported service light.toggle");
    }

    #[test]
    fn should_reject_set_temperature_without_value() {
        let mut snapshot = EntitySnapshot::new("climate.office", "heat");
        let call = ServiceCall::new(
            "climate",
            "set_temperature",
            EntityRef::new("climate.office"),
            serde_json::json!({}),
        );

        assert!(apply(&mut snapshot, &call).is_err());
    }
}
