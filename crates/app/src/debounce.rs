//! Debounce gate: turns a noisy raw boolean into a committed one.
//!
//! A raw transition away from the committed value is only committed once it
//! has held for the delay configured for the new value. A newer transition
//! supersedes the pending one, and a return to the committed value cancels
//! it, so the gate is level-triggered: at most one commit per stable change.
//!
//! The gate only does bookkeeping. Scheduling the wake-up for a
//! [`GateOutcome::Scheduled`] is the caller's job (see
//! [`DeferredTasks`](crate::timers::DeferredTasks)); the wake-up then calls
//! [`DebounceGate::on_deadline`] with the generation it was given.

use std::time::Duration;

use tokio::time::Instant;

use zoneclimate_domain::zone::SignalDelays;

/// Result of feeding one raw value into a [`DebounceGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// The value was committed right away.
    Committed(bool),
    /// A commit of `value` is due after `delay`, valid for `generation` only.
    Scheduled {
        value: bool,
        delay: Duration,
        generation: u64,
    },
    /// A pending commit was dropped because the raw value went back.
    Cancelled,
    /// Nothing to do.
    Unchanged,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    value: bool,
    deadline: Instant,
    generation: u64,
}

/// Debounce state of one signal of one zone.
#[derive(Debug, Clone)]
pub struct DebounceGate {
    delays: SignalDelays,
    committed: bool,
    pending: Option<Pending>,
    generation: u64,
}

impl DebounceGate {
    /// A gate starting from `committed`.
    #[must_use]
    pub fn new(delays: SignalDelays, committed: bool) -> Self {
        Self {
            delays,
            committed,
            pending: None,
            generation: 0,
        }
    }

    #[must_use]
    pub fn committed(&self) -> bool {
        self.committed
    }

    /// When the pending commit is due, if one is pending.
    #[must_use]
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.deadline)
    }

    /// Feed a raw value observed at `now`.
    pub fn on_raw_signal(&mut self, raw: bool, now: Instant) -> GateOutcome {
        if self.delays.is_passthrough() {
            self.pending = None;
            self.committed = raw;
            return GateOutcome::Committed(raw);
        }

        if raw == self.committed {
            return match self.pending.take() {
                Some(_) => GateOutcome::Cancelled,
                None => GateOutcome::Unchanged,
            };
        }

        // already waiting for this very value: keep the original deadline
        if self.pending.is_some_and(|pending| pending.value == raw) {
            return GateOutcome::Unchanged;
        }

        let delay = self.delays.towards(raw);
        if delay.is_zero() {
            self.pending = None;
            self.committed = raw;
            return GateOutcome::Committed(raw);
        }

        self.generation += 1;
        self.pending = Some(Pending {
            value: raw,
            deadline: now + delay,
            generation: self.generation,
        });
        GateOutcome::Scheduled {
            value: raw,
            delay,
            generation: self.generation,
        }
    }

    /// A scheduled wake-up for `generation` fired.
    ///
    /// Returns the committed value, or `None` when the wake-up is stale
    /// (superseded or cancelled since it was scheduled).
    pub fn on_deadline(&mut self, generation: u64) -> Option<bool> {
        match self.pending {
            Some(pending) if pending.generation == generation => {
                self.pending = None;
                self.committed = pending.value;
                Some(pending.value)
            }
            _ => None,
        }
    }
}
