//! In-memory event bus shared by plugins
//!
//! Published events are queued with the screen name they were published on.
//! A listener subscribing later still receives the queued events for its event
//! name, and every listener handles a given event at most once. Queued events
//! from other screens are dropped by [`EventManager::cleanup`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Click {
        selector: String,
    },
    UpdateValues {
        selector: Option<String>,
        values: Vec<String>,
    },
    UpdateContent {
        selector: Option<String>,
        content: Vec<String>,
    },
    Advanced {
        event_name: String,
        context: Option<Vec<String>>,
    },
}

impl EventKind {
    /// Name listeners subscribe to
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click { .. } => "ClickEvent",
            EventKind::UpdateValues { .. } => "UpdateValuesEvent",
            EventKind::UpdateContent { .. } => "UpdateContentEvent",
            EventKind::Advanced { .. } => "AdvancedEvent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    location: String,
    handled_by: Vec<String>,
}

impl Event {
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Screen name at the time the event was published
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Listener ids that already handled the event
    pub fn handled_by(&self) -> &[String] {
        &self.handled_by
    }
}

/// Callback invoked with each event a listener handles
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Subscription {
    listener_id: String,
    handler: EventHandler,
}

#[derive(Default)]
struct EventState {
    handlers_by_event: HashMap<String, Vec<Subscription>>,
    queue: Vec<Event>,
}

#[derive(Default)]
pub struct EventManager {
    state: Mutex<EventState>,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager").finish_non_exhaustive()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event published on `location` and deliver it to the
    /// listeners subscribed to its name.
    pub async fn publish(&self, kind: EventKind, location: &str) {
        let deliveries = {
            let mut state = self.state.lock().await;
            state.queue.push(Event {
                kind,
                location: location.to_string(),
                handled_by: Vec::new(),
            });
            let newest = state.queue.len() - 1;
            collect_deliveries(&mut state, Some(newest))
        };

        tracing::debug!(location = location, deliveries = deliveries.len(), "Event published");
        deliver(deliveries);
    }

    /// Subscribe a listener to an event name, then replay queued events of
    /// that name the listener has not handled yet. A listener id is only
    /// registered once per event name.
    pub async fn subscribe(&self, event_name: &str, listener_id: &str, handler: EventHandler) {
        if event_name.is_empty() {
            tracing::debug!(listener_id = listener_id, "Ignoring subscription without event name");
            return;
        }

        let deliveries = {
            let mut state = self.state.lock().await;
            let handlers = state
                .handlers_by_event
                .entry(event_name.to_string())
                .or_default();
            if !handlers.iter().any(|s| s.listener_id == listener_id) {
                handlers.push(Subscription {
                    listener_id: listener_id.to_string(),
                    handler,
                });
            }
            collect_deliveries(&mut state, None)
        };

        tracing::debug!(
            event_name = event_name,
            listener_id = listener_id,
            replayed = deliveries.len(),
            "Listener subscribed"
        );
        deliver(deliveries);
    }

    pub async fn clear_events(&self) {
        self.state.lock().await.queue.clear();
    }

    /// Remove the subscriptions of one listener, or all of them for `None`.
    pub async fn clear_event_handlers(&self, listener_id: Option<&str>) {
        let mut state = self.state.lock().await;
        match listener_id {
            Some(id) => {
                state.handlers_by_event.retain(|_, handlers| {
                    handlers.retain(|s| s.listener_id != id);
                    !handlers.is_empty()
                });
            }
            None => state.handlers_by_event.clear(),
        }
    }

    /// Drop queued events published on a screen other than `location`.
    pub async fn cleanup(&self, location: &str) {
        let mut state = self.state.lock().await;
        let before = state.queue.len();
        state.queue.retain(|event| event.location == location);

        let dropped = before - state.queue.len();
        if dropped > 0 {
            tracing::debug!(location = location, dropped = dropped, "Stale events dropped");
        }
    }

    pub async fn queued(&self) -> Vec<Event> {
        self.state.lock().await.queue.clone()
    }

    pub async fn listener_count(&self, event_name: &str) -> usize {
        self.state
            .lock()
            .await
            .handlers_by_event
            .get(event_name)
            .map_or(0, Vec::len)
    }
}

/// Mark queued events as handled for every subscribed listener that has not
/// seen them and return the calls to make once the lock is released.
fn collect_deliveries(state: &mut EventState, only: Option<usize>) -> Vec<(EventHandler, Event)> {
    let EventState {
        handlers_by_event,
        queue,
    } = state;

    let mut deliveries = Vec::new();
    for (index, event) in queue.iter_mut().enumerate() {
        if only.is_some_and(|only| only != index) {
            continue;
        }
        let Some(handlers) = handlers_by_event.get(event.name()) else {
            continue;
        };
        for subscription in handlers {
            if event.handled_by.contains(&subscription.listener_id) {
                continue;
            }
            event.handled_by.push(subscription.listener_id.clone());
            deliveries.push((subscription.handler.clone(), event.clone()));
        }
    }
    deliveries
}

fn deliver(deliveries: Vec<(EventHandler, Event)>) {
    for (handler, event) in deliveries {
        handler(&event);
    }
}
