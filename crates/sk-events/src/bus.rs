use std::future::Future;

use tokio::sync::broadcast;

use crate::event::EventEnvelope;
use crate::topic::Topic;

/// Default channel depth for a general-purpose bus. Grounded in the
/// teacher's `mqk-daemon` SSE bus, which uses a single broadcast channel
/// for every subscriber regardless of topic.
const DEFAULT_CAPACITY: usize = 1024;

/// A small bounded variant (§8.1) for callers that want back-pressure to
/// surface quickly rather than buffering a slow consumer indefinitely.
pub const BOUNDED_CAPACITY: usize = 25;

/// The process-wide event bus (C8). One `broadcast` channel carries every
/// topic; subscribers filter by matching on [`EventEnvelope::topic`]. A
/// subscriber that falls behind observes `RecvError::Lagged` and catches up
/// to the oldest value still buffered — it never sees out-of-order events,
/// only a gap.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _rx) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishing with no subscribers is not an error — the teacher's bus
    /// treats `send` failure (no receivers) as a no-op, and so do we.
    pub fn publish(&self, event: EventEnvelope) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            inner: self.sender.subscribe(),
        }
    }

    /// `true` if at least one subscription is live. The backtest fast path
    /// uses this to decide whether skipping per-tick iteration would drop
    /// advisory `partial-*`/`breakeven` events a caller is actually watching.
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Subscribes, waits for the first event matching `topic` and `predicate`,
    /// runs `handler` against it, then drops the subscription — an `once`
    /// registration per §4.8. Isolated in its own task so a slow or failing
    /// handler cannot block the bus or other subscribers.
    pub fn once<P, H, Fut>(&self, topic: Topic, predicate: P, handler: H)
    where
        P: Fn(&EventEnvelope) -> bool + Send + 'static,
        H: FnOnce(EventEnvelope) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if event.topic() == topic && predicate(&event) {
                    handler(event).await;
                    return;
                }
            }
        });
    }

    /// Runs `handler` over every event this subscription sees, serially —
    /// the next event is not read until the previous handler's future
    /// settles (§4.8's serialisation guarantee). A handler error is isolated:
    /// it is turned into an `error` envelope addressed like the event that
    /// triggered it and republished, and the loop continues.
    pub async fn drive<H, Fut, E>(&self, mut receiver: EventReceiver, mut handler: H)
    where
        H: FnMut(EventEnvelope) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        while let Some(event) = receiver.recv().await {
            if let Err(err) = handler(event.clone()).await {
                tracing::warn!(topic = ?event.topic(), %err, "subscriber handler failed");
                self.publish(event.error_for(err.to_string()));
            }
        }
    }
}

/// A handle to one subscription. Dropping it unsubscribes.
pub struct EventReceiver {
    inner: broadcast::Receiver<EventEnvelope>,
}

impl EventReceiver {
    /// Skips `Lagged` gaps rather than surfacing them as an error — a
    /// subscriber that falls behind still sees every event it can, just not
    /// every one that was ever published.
    pub async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.inner.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
