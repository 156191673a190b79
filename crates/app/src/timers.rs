//! Deferred tasks: one cancellable wake-up per `(zone, signal)`.
//!
//! Each scheduled wake-up is a tokio task that sleeps for the debounce delay
//! and then reports an [`Expiry`] on a channel owned by the zone registry.
//! Scheduling again for the same key aborts the previous task first, so at
//! most one wake-up per key is ever alive.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use zoneclimate_domain::id::ZoneId;
use zoneclimate_domain::signal::Signal;

/// A debounce delay that ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    pub zone: ZoneId,
    pub signal: Signal,
    pub generation: u64,
}

/// Keyed set of pending wake-ups.
pub struct DeferredTasks {
    tasks: HashMap<(ZoneId, Signal), JoinHandle<()>>,
    sender: mpsc::UnboundedSender<Expiry>,
}

impl DeferredTasks {
    /// Create an empty set and the receiver its expiries are delivered to.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Expiry>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tasks = Self {
            tasks: HashMap::new(),
            sender,
        };
        (tasks, receiver)
    }

    /// Schedule a wake-up for `(zone, signal)` after `delay`, replacing any
    /// wake-up already pending for that key.
    pub fn schedule(&mut self, zone: ZoneId, signal: Signal, generation: u64, delay: Duration) {
        let sender = self.sender.clone();
        let expiry = Expiry {
            zone: zone.clone(),
            signal,
            generation,
        };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // receiver gone means the registry shut down
            let _ = sender.send(expiry);
        });
        if let Some(previous) = self.tasks.insert((zone, signal), handle) {
            previous.abort();
        }
    }

    /// Drop the wake-up pending for `(zone, signal)`, if any.
    pub fn cancel(&mut self, zone: &ZoneId, signal: Signal) {
        if let Some(handle) = self.tasks.remove(&(zone.clone(), signal)) {
            handle.abort();
        }
    }

    /// Number of wake-ups that have not fired yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for DeferredTasks {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn should_deliver_expiry_after_delay() {
        let (mut tasks, mut expiries) = DeferredTasks::new();
        let start = Instant::now();

        tasks.schedule(ZoneId::new("office"), Signal::Opening, 1, Duration::from_secs(300));
        let expiry = expiries.recv().await.unwrap();

        assert_eq!(expiry.generation, 1);
        assert_eq!(expiry.signal, Signal::Opening);
        assert_eq!(start.elapsed(), Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn should_replace_pending_wake_up_for_same_key() {
        let (mut tasks, mut expiries) = DeferredTasks::new();
        let zone = ZoneId::new("office");

        tasks.schedule(zone.clone(), Signal::Occupancy, 1, Duration::from_secs(10));
        tasks.schedule(zone, Signal::Occupancy, 2, Duration::from_secs(20));
        assert_eq!(tasks.pending(), 1);

        let expiry = expiries.recv().await.unwrap();
        assert_eq!(expiry.generation, 2);
        let more = tokio::time::timeout(Duration::from_secs(3600), expiries.recv()).await;
        assert!(more.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_keys_independent() {
        let (mut tasks, mut expiries) = DeferredTasks::new();
        let zone = ZoneId::new("office");

        tasks.schedule(zone.clone(), Signal::Occupancy, 1, Duration::from_secs(10));
        tasks.schedule(zone, Signal::Opening, 1, Duration::from_secs(5));

        assert_eq!(expiries.recv().await.unwrap().signal, Signal::Opening);
        assert_eq!(expiries.recv().await.unwrap().signal, Signal::Occupancy);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_deliver_cancelled_wake_up() {
        let (mut tasks, mut expiries) = DeferredTasks::new();
        let zone = ZoneId::new("office");

        tasks.schedule(zone.clone(), Signal::Opening, 1, Duration::from_secs(10));
        tasks.cancel(&zone, Signal::Opening);

        let received = tokio::time::timeout(Duration::from_secs(60), expiries.recv()).await;
        assert!(received.is_err());
        assert_eq!(tasks.pending(), 0);
    }
}
