//! Domain event dispatch.
//!
//! Fan-out of recorded events to registered handlers, run by the
//! repository after a successful save. Fire-after-commit with
//! at-least-once semantics: a failing handler is logged and never
//! rolls back the write, so handlers must be idempotent or
//! side-effect-free.

use std::sync::Arc;

use async_trait::async_trait;

use crate::vehicle::VehicleEvent;

/// Error type returned by event handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A handler invoked for vehicle domain events after a save commits.
#[async_trait]
pub trait VehicleEventHandler: Send + Sync {
    /// Returns the handler name, used in dispatch logging.
    fn name(&self) -> &'static str;

    /// Handles a single event.
    async fn handle(&self, event: &VehicleEvent) -> Result<(), HandlerError>;
}

/// Routes events to handler lists registered per event variant.
///
/// Dispatch is a closed match over [`VehicleEvent`]; adding a variant
/// forces this router to be extended at compile time.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    status_changed: Vec<Arc<dyn VehicleEventHandler>>,
    location_updated: Vec<Arc<dyn VehicleEventHandler>>,
}

impl EventDispatcher {
    /// Creates a dispatcher with no registered handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for status-changed events.
    pub fn on_status_changed(mut self, handler: Arc<dyn VehicleEventHandler>) -> Self {
        self.status_changed.push(handler);
        self
    }

    /// Registers a handler for location-updated events.
    pub fn on_location_updated(mut self, handler: Arc<dyn VehicleEventHandler>) -> Self {
        self.location_updated.push(handler);
        self
    }

    /// Registers a handler for every event variant.
    pub fn on_any(self, handler: Arc<dyn VehicleEventHandler>) -> Self {
        self.on_status_changed(handler.clone())
            .on_location_updated(handler)
    }

    /// Returns the number of registered handler slots.
    pub fn handler_count(&self) -> usize {
        self.status_changed.len() + self.location_updated.len()
    }

    /// Dispatches one event to every handler registered for its variant.
    pub async fn dispatch(&self, event: &VehicleEvent) {
        let handlers = match event {
            VehicleEvent::StatusChanged(_) => &self.status_changed,
            VehicleEvent::LocationUpdated(_) => &self.location_updated,
        };

        for handler in handlers {
            if let Err(error) = handler.handle(event).await {
                tracing::warn!(
                    handler = handler.name(),
                    event_type = event.event_type(),
                    %error,
                    "event handler failed; write is not rolled back"
                );
            }
        }
    }

    /// Dispatches a batch of drained events in order.
    pub async fn dispatch_all(&self, events: &[VehicleEvent]) {
        for event in events {
            self.dispatch(event).await;
        }
    }
}
