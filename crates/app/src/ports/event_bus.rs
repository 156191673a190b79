//! Event bus port: how host state changes reach the zone registry.

use std::future::Future;

use zoneclimate_domain::error::ClimateError;
use zoneclimate_domain::event::Event;

/// Publishes host state-change events to interested subscribers.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ClimateError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ClimateError>> + Send {
        (**self).publish(event)
    }
}
