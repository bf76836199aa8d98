use std::sync::Arc;

use sk_domain::{KernelError, TrackedSignal};
use tokio::sync::Mutex;

use crate::adapter::PersistenceAdapter;

/// A per-`(strategy, symbol)` slot holding either nothing or one
/// `TrackedSignal` (§4.3). `load()` is singleshot: live mode calls it exactly
/// once per slot on startup; backtest mode never calls it and starts empty.
pub struct SignalStore {
    adapter: Arc<dyn PersistenceAdapter>,
    strategy_name: String,
    symbol: String,
    loaded: Mutex<bool>,
    cached: Mutex<Option<TrackedSignal>>,
}

impl SignalStore {
    pub fn new(adapter: Arc<dyn PersistenceAdapter>, strategy_name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            adapter,
            strategy_name: strategy_name.into(),
            symbol: symbol.into(),
            loaded: Mutex::new(false),
            cached: Mutex::new(None),
        }
    }

    pub fn key(&self) -> String {
        format!("{}__{}", self.strategy_name, self.symbol)
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy_name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Reads the adapter once and caches the result. Calling this a second
    /// time on the same store is a no-op that returns the cached value — the
    /// underlying adapter is never re-read after the first `load`.
    pub async fn load(&self) -> Result<Option<TrackedSignal>, KernelError> {
        let mut loaded = self.loaded.lock().await;
        if *loaded {
            return Ok(self.cached.lock().await.clone());
        }

        let raw = self.adapter.read(&self.key()).await?;
        let signal = match raw {
            None => None,
            Some(raw) => Some(self.deserialize_checked(&raw)?),
        };

        *self.cached.lock().await = signal.clone();
        *loaded = true;
        Ok(signal)
    }

    /// Returns the cached value if `load` has already run, otherwise reads
    /// through to the adapter without marking the slot as loaded (used by
    /// backtest mode, which never singleshots).
    pub async fn read(&self) -> Result<Option<TrackedSignal>, KernelError> {
        if *self.loaded.lock().await {
            return Ok(self.cached.lock().await.clone());
        }
        let raw = self.adapter.read(&self.key()).await?;
        match raw {
            None => Ok(None),
            Some(raw) => Ok(Some(self.deserialize_checked(&raw)?)),
        }
    }

    pub async fn write_atomic(&self, tracked: &TrackedSignal) -> Result<(), KernelError> {
        if tracked.strategy_name() != self.strategy_name || tracked.symbol() != self.symbol {
            return Err(KernelError::Fatal {
                message: format!(
                    "attempted to write signal for {}/{} into slot {}",
                    tracked.strategy_name(),
                    tracked.symbol(),
                    self.key()
                ),
            });
        }

        let serialized = serde_json::to_string(tracked).map_err(|e| KernelError::Fatal {
            message: format!("serializing tracked signal: {e}"),
        })?;
        self.adapter.write_atomic(&self.key(), &serialized).await?;
        *self.cached.lock().await = Some(tracked.clone());
        *self.loaded.lock().await = true;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), KernelError> {
        self.adapter.clear(&self.key()).await?;
        *self.cached.lock().await = None;
        *self.loaded.lock().await = true;
        Ok(())
    }

    /// A persisted signal whose embedded symbol/strategy don't match this
    /// slot's own key can only mean the store was pointed at the wrong file,
    /// or the file was hand-edited — neither is recoverable (§7).
    fn deserialize_checked(&self, raw: &str) -> Result<TrackedSignal, KernelError> {
        let signal: TrackedSignal = serde_json::from_str(raw).map_err(|e| KernelError::Fatal {
            message: format!("corrupt signal at slot {}: {e}", self.key()),
        })?;

        if signal.strategy_name() != self.strategy_name || signal.symbol() != self.symbol {
            return Err(KernelError::Fatal {
                message: format!(
                    "slot {} holds a signal for {}/{}",
                    self.key(),
                    signal.strategy_name(),
                    signal.symbol()
                ),
            });
        }

        Ok(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sk_domain::{Position, Scheduled, SignalCore};

    fn signal(strategy: &str, symbol: &str) -> TrackedSignal {
        TrackedSignal::Scheduled(Scheduled {
            core: SignalCore {
                id: "s1".into(),
                strategy_name: strategy.into(),
                symbol: symbol.into(),
                position: Position::Long,
                price_open: 100.0,
                price_take_profit: 110.0,
                price_stop_loss: 90.0,
                minute_estimated_time: 60,
                note: None,
            },
            scheduled_at: Utc.timestamp_opt(0, 0).unwrap(),
        })
    }

    #[tokio::test]
    async fn write_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn PersistenceAdapter> = Arc::new(crate::FsPersistenceAdapter::new(dir.path()));
        let store = SignalStore::new(adapter, "strat", "BTC");

        store.write_atomic(&signal("strat", "BTC")).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.unwrap().id(), "s1");
    }

    #[tokio::test]
    async fn empty_slot_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn PersistenceAdapter> = Arc::new(crate::FsPersistenceAdapter::new(dir.path()));
        let store = SignalStore::new(adapter, "strat", "BTC");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_is_singleshot_and_ignores_later_writes_from_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn PersistenceAdapter> = Arc::new(crate::FsPersistenceAdapter::new(dir.path()));
        let store = SignalStore::new(adapter.clone(), "strat", "BTC");

        store.load().await.unwrap();
        adapter
            .write_atomic(&store.key(), &serde_json::to_string(&signal("strat", "BTC")).unwrap())
            .await
            .unwrap();

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mismatched_slot_contents_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn PersistenceAdapter> = Arc::new(crate::FsPersistenceAdapter::new(dir.path()));
        let wrong_key_store = SignalStore::new(adapter.clone(), "other_strat", "BTC");
        wrong_key_store.write_atomic(&signal("other_strat", "BTC")).await.unwrap();

        adapter
            .write_atomic("strat__BTC", &serde_json::to_string(&signal("other_strat", "BTC")).unwrap())
            .await
            .unwrap();

        let store = SignalStore::new(adapter, "strat", "BTC");
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, KernelError::Fatal { .. }));
    }

    #[tokio::test]
    async fn clear_empties_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let adapter: Arc<dyn PersistenceAdapter> = Arc::new(crate::FsPersistenceAdapter::new(dir.path()));
        let store = SignalStore::new(adapter, "strat", "BTC");
        store.write_atomic(&signal("strat", "BTC")).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.read().await.unwrap().is_none());
    }
}
