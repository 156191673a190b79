//! # zoneclimate-app
//!
//! Application layer: the per-zone decision engine and the **port
//! definitions** (traits) it needs from the outside world.
//!
//! ## Responsibilities
//! - Define the **driven port** adapters must implement:
//!   - `Host`: read entity state, check existence, call services
//!   - `EventPublisher`: push host state changes into the engine
//! - Resolve setpoints through their precedence chain (`SetpointResolver`)
//! - Debounce occupancy and opening signals (`DebounceGate`, `DeferredTasks`)
//! - Evaluate the external-temperature heating limit (`HeatingLimitEvaluator`)
//! - Decide and apply one action per zone (`ZoneDecisionEngine`)
//! - Own every zone and dispatch events to it (`ZoneRegistry`)
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `zoneclimate-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod debounce;
pub mod decision_engine;
pub mod event_bus;
pub mod heating_limit;
pub mod ports;
pub mod setpoint_resolver;
pub mod timers;
pub mod zone_registry;

#[cfg(test)]
mod test_support;
