//! Host port: the home-automation platform zoneclimate runs against.
//!
//! The host owns every entity. zoneclimate only reads current values,
//! checks that configured references exist, and asks the host to act
//! through fire-and-forget service calls. State-change notifications travel
//! the other way, through an [`EventPublisher`](super::EventPublisher).

use std::future::Future;
use std::sync::Arc;

use zoneclimate_domain::action::ServiceCall;
use zoneclimate_domain::entity::{EntityRef, EntitySnapshot};
use zoneclimate_domain::error::{ClimateError, EntityNotFoundError};

/// Entity lookup and actuation provided by the host platform.
pub trait Host: Send + Sync {
    /// Current snapshot of `entity`, `None` when the host does not know it.
    fn get_state(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Option<EntitySnapshot>, ClimateError>> + Send;

    /// Whether `entity` exists on the host.
    fn entity_exists(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<bool, ClimateError>> + Send;

    /// Ask the host to perform `call`.
    ///
    /// Only success or failure is reported; the resulting state change, if
    /// any, arrives later as an event.
    fn call_service(&self, call: ServiceCall)
    -> impl Future<Output = Result<(), ClimateError>> + Send;

    /// Convenience: the primary value of `entity` as a finite number.
    ///
    /// # Errors
    ///
    /// Returns [`ClimateError::EntityNotFound`] for an unknown entity and
    /// [`ClimateError::ValueConversion`] for a non-numeric value.
    fn numeric_state(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<f64, ClimateError>> + Send {
        async move {
            let snapshot = self
                .get_state(entity)
                .await?
                .ok_or_else(|| EntityNotFoundError {
                    entity: entity.clone(),
                })?;
            Ok(snapshot.numeric()?)
        }
    }
}

impl<T: Host> Host for Arc<T> {
    fn get_state(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<Option<EntitySnapshot>, ClimateError>> + Send {
        (**self).get_state(entity)
    }

    fn entity_exists(
        &self,
        entity: &EntityRef,
    ) -> impl Future<Output = Result<bool, ClimateError>> + Send {
        (**self).entity_exists(entity)
    }

    fn call_service(
        &self,
        call: ServiceCall,
    ) -> impl Future<Output = Result<(), ClimateError>> + Send {
        (**self).call_service(call)
    }
}
