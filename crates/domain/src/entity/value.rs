//! Typed raw values reported by the host.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw values the host uses for "no usable reading".
const UNUSABLE: [&str; 2] = ["unknown", "unavailable"];

/// Strings that count as an active signal (occupied, open, home, …).
const TRUTHY: [&str; 3] = ["on", "home", "true"];

/// A single raw value, as the host reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl StateValue {
    /// Parse a console/config literal: numbers become [`Float`](Self::Float),
    /// anything else is kept verbatim as a string.
    #[must_use]
    pub fn from_literal(literal: &str) -> Self {
        let trimmed = literal.trim();
        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Float(number),
            _ => Self::String(trimmed.to_string()),
        }
    }

    /// Whether the value counts as an active signal.
    ///
    /// Only `"on"`, `"home"`, `"true"` (exact case) and the boolean `true`
    /// qualify; `"unknown"` and `"unavailable"` are falsy like everything else.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(flag) => *flag,
            Self::String(text) => TRUTHY.contains(&text.as_str()),
            Self::Int(_) | Self::Float(_) => false,
        }
    }

    /// Whether the host reported `unknown` or `unavailable`.
    #[must_use]
    pub fn is_unusable(&self) -> bool {
        matches!(self, Self::String(text) if UNUSABLE.contains(&text.as_str()))
    }

    /// Interpret the value as a finite number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            Self::Int(int) => *int as f64,
            Self::Float(float) => *float,
            Self::String(text) => text.trim().parse::<f64>().ok()?,
            Self::Bool(_) => return None,
        };
        number.is_finite().then_some(number)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(flag) => write!(f, "{flag}"),
            Self::Int(int) => write!(f, "{int}"),
            Self::Float(float) => write!(f, "{float}"),
            Self::String(text) => f.write_str(text),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_treat_on_home_and_true_as_truthy() {
        assert!(StateValue::from("on").is_truthy());
        assert!(StateValue::from("home").is_truthy());
        assert!(StateValue::from("true").is_truthy());
        assert!(StateValue::Bool(true).is_truthy());
    }

    #[test]
    fn should_treat_everything_else_as_falsy() {
        assert!(!StateValue::from("off").is_truthy());
        assert!(!StateValue::from("ON").is_truthy());
        assert!(!StateValue::from("unknown").is_truthy());
        assert!(!StateValue::from("unavailable").is_truthy());
        assert!(!StateValue::Bool(false).is_truthy());
        assert!(!StateValue::Float(1.0).is_truthy());
    }

    #[test]
    fn should_report_unknown_and_unavailable_as_unusable() {
        assert!(StateValue::from("unknown").is_unusable());
        assert!(StateValue::from("unavailable").is_unusable());
        assert!(!StateValue::from("off").is_unusable());
    }

    #[test]
    fn should_parse_numeric_strings() {
        assert_eq!(StateValue::from("21.5").as_f64(), Some(21.5));
        assert_eq!(StateValue::from(" 18 ").as_f64(), Some(18.0));
        assert_eq!(StateValue::Int(17).as_f64(), Some(17.0));
    }

    #[test]
    fn should_reject_non_numeric_and_non_finite_values() {
        assert_eq!(StateValue::from("unavailable").as_f64(), None);
        assert_eq!(StateValue::from("NaN").as_f64(), None);
        assert_eq!(StateValue::Float(f64::INFINITY).as_f64(), None);
        assert_eq!(StateValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn should_build_float_or_string_from_literal() {
        assert_eq!(StateValue::from_literal("22"), StateValue::Float(22.0));
        assert_eq!(StateValue::from_literal(" on "), StateValue::from("on"));
    }

    #[test]
    fn should_deserialize_untagged_json() {
        let value: StateValue = serde_json::from_str("true").unwrap();
        assert_eq!(value, StateValue::Bool(true));
        let value: StateValue = serde_json::from_str("\"home\"").unwrap();
        assert_eq!(value, StateValue::from("home"));
        let value: StateValue = serde_json::from_str("19.5").unwrap();
        assert_eq!(value, StateValue::Float(19.5));
    }
}
