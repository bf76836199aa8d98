use std::sync::{Arc, Mutex};

use sk_events::{EventBus, EventEnvelope};

/// Collects every event a bus publishes, in order, for assertion — the
/// test-only counterpart to the library's live subscription API. Spawns a
/// task that drains its own subscription into a shared buffer, so a test
/// can keep publishing and inspect the buffer at any point without closing
/// the bus.
pub struct RecordingSubscriber {
    events: Arc<Mutex<Vec<EventEnvelope>>>,
}

impl RecordingSubscriber {
    pub fn attach(bus: &EventBus) -> Self {
        let events: Arc<Mutex<Vec<EventEnvelope>>> = Arc::new(Mutex::new(Vec::new()));
        let mut receiver = bus.subscribe();
        let sink = events.clone();
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                sink.lock().unwrap().push(event);
            }
        });
        Self { events }
    }

    pub fn snapshot(&self) -> Vec<EventEnvelope> {
        self.events.lock().unwrap().clone()
    }
}
