use std::time::Duration;

/// Tunables for the live loop (§6). `tick_ttl` is the cooperative sleep
/// between wall-clock ticks; it is process-wide and unrelated to any
/// strategy's `interval` throttle, which is enforced inside the Lifecycle
/// Engine itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveConfig {
    pub tick_ttl: Duration,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            tick_ttl: Duration::from_millis(1000),
        }
    }
}
