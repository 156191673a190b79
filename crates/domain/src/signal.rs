//! Debounced boolean signals feeding a zone's decision.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A boolean input that goes through a debounce gate before it is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Someone is present in the zone.
    Occupancy,
    /// A door or window of the zone is open.
    Opening,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occupancy => f.write_str("occupancy"),
            Self::Opening => f.write_str("opening"),
        }
    }
}
