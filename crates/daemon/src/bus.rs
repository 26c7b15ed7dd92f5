// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lifecycle event bus.
//!
//! Publishing never blocks a monitor tick: events land on an unbounded
//! channel and a single pump task drains it, delivering each event to the
//! subscribers in registration order and awaiting each delivery. That keeps
//! the delivery contract synchronous and ordered per published event, so the
//! completion handler's idempotence gate stays the only concurrency defense.
//! There are no retries and nothing is persisted.

use async_trait::async_trait;
use std::sync::Arc;
use stoker_core::Event;
use tokio::sync::mpsc;

/// Receives every event published on the bus.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    async fn on_event(&self, event: &Event);
}

/// Cloneable publishing handle.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventBus {
    /// Publish an event. Delivery happens on the pump task.
    pub fn publish(&self, event: Event) {
        tracing::info!(event = %event.log_summary(), "publishing");
        if self.tx.send(event).is_err() {
            tracing::warn!("event bus pump is gone; event dropped");
        }
    }
}

/// Dispatcher half of the bus. Owns the subscriber list.
pub struct EventPump {
    rx: mpsc::UnboundedReceiver<Event>,
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

/// Create a connected bus/pump pair.
pub fn channel() -> (EventBus, EventPump) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventBus { tx }, EventPump { rx, subscribers: Vec::new() })
}

impl EventPump {
    /// Register a subscriber. Delivery order is registration order.
    pub fn subscribe(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Drain the channel until every publisher handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            for subscriber in &self.subscribers {
                subscriber.on_event(&event).await;
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
mod recording {
    use super::EventSubscriber;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use stoker_core::Event;

    /// Subscriber that records every delivered event.
    #[derive(Clone, Default)]
    pub struct RecordingSubscriber {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl RecordingSubscriber {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }
    }

    #[async_trait]
    impl EventSubscriber for RecordingSubscriber {
        async fn on_event(&self, event: &Event) {
            self.events.lock().push(event.clone());
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::RecordingSubscriber;

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
