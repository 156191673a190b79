//! # zoneclimate-domain
//!
//! Pure domain model for the zoneclimate controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **entity references and values** as reported by the host
//! - Define **Zones** (one device plus its optional sensors and settings)
//! - Define **Modes** and the setpoint sources configured for each of them
//! - Define **Signals** (occupancy, opening) and their truthiness rule
//! - Define **Actions** and the service calls they translate into
//! - Define **Events** (host state-change notifications)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod entity;
pub mod event;
pub mod mode;
pub mod setpoint;
pub mod signal;
pub mod zone;
