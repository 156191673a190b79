//! Event: an immutable record of a host entity changing state.
//!
//! The host delivers one [`Event`] per state change of any entity; the
//! zone registry routes the ones it subscribed to.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityRef, StateValue};
use crate::id::EventId;
use crate::time::{Timestamp, now};

/// A state change reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub entity: EntityRef,
    pub old: Option<StateValue>,
    pub new: StateValue,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create a new state-change event stamped with the current time.
    #[must_use]
    pub fn state_changed(
        entity: impl Into<EntityRef>,
        old: Option<StateValue>,
        new: impl Into<StateValue>,
    ) -> Self {
        Self {
            id: EventId::new(),
            entity: entity.into(),
            old,
            new: new.into(),
            timestamp: now(),
        }
    }
}
