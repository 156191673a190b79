//! Modes: which setpoint applies to a zone right now.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The setpoint a zone is driven towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Occupied,
    Away,
    Off,
}

impl Mode {
    pub const ALL: [Self; 3] = [Self::Occupied, Self::Away, Self::Off];

    /// Built-in setpoint used when nothing else is configured, in °C.
    #[must_use]
    pub fn default_setpoint(self) -> f64 {
        match self {
            Self::Occupied => 19.0,
            Self::Away => 17.0,
            Self::Off => 7.0,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occupied => f.write_str("occupied"),
            Self::Away => f.write_str("away"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// One value of `T` per [`Mode`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerMode<T> {
    pub occupied: T,
    pub away: T,
    pub off: T,
}

impl<T> PerMode<T> {
    #[must_use]
    pub fn get(&self, mode: Mode) -> &T {
        match mode {
            Mode::Occupied => &self.occupied,
            Mode::Away => &self.away,
            Mode::Off => &self.off,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut T {
        match mode {
            Mode::Occupied => &mut self.occupied,
            Mode::Away => &mut self.away,
            Mode::Off => &mut self.off,
        }
    }

    /// Iterate `(mode, value)` pairs in [`Mode::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Mode, &T)> {
        Mode::ALL.into_iter().map(move |mode| (mode, self.get(mode)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_provide_built_in_defaults() {
        assert!((Mode::Occupied.default_setpoint() - 19.0).abs() < f64::EPSILON);
        assert!((Mode::Away.default_setpoint() - 17.0).abs() < f64::EPSILON);
        assert!((Mode::Off.default_setpoint() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_select_value_for_mode() {
        let mut values = PerMode {
            occupied: 1,
            away: 2,
            off: 3,
        };
        assert_eq!(*values.get(Mode::Away), 2);
        *values.get_mut(Mode::Off) = 4;
        let collected: Vec<_> = values.iter().map(|(_, v)| *v).collect();
        assert_eq!(collected, vec![1, 2, 4]);
    }

    #[test]
    fn should_display_lowercase_mode() {
        assert_eq!(Mode::Occupied.to_string(), "occupied");
    }
}
