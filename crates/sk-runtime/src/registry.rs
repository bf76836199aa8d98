use std::collections::HashMap;
use std::sync::Arc;

use sk_context::Frame;
use sk_domain::{KernelError, PortfolioSource, PortfolioView, RegistryKind};
use sk_market::Market;
use sk_risk::Risk;
use sk_store::{PersistenceAdapter, SignalStore};
use sk_strategy::Strategy;
use tokio::sync::RwLock;

/// The process-wide Registry (§6.1): every strategy, exchange, frame, and
/// risk the embedder registered before the first `run`/`background` call,
/// plus the set of Signal Stores currently live for an in-flight run — the
/// latter is how the Control Surface builds a [`PortfolioView`] without a
/// central positions manager (§9): it reads every live store whose
/// strategy shares a risk name with the caller, not an enumeration of the
/// persistence adapter's keyspace, which §6's adapter contract never
/// promises to support.
pub struct Registry {
    adapter: Arc<dyn PersistenceAdapter>,
    strategies: RwLock<HashMap<String, Arc<dyn Strategy>>>,
    exchanges: RwLock<HashMap<String, Arc<Market>>>,
    frames: RwLock<HashMap<String, Frame>>,
    risks: RwLock<HashMap<String, Arc<Risk>>>,
    active_stores: RwLock<HashMap<(String, String), Arc<SignalStore>>>,
}

impl Registry {
    pub fn new(adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self {
            adapter,
            strategies: RwLock::new(HashMap::new()),
            exchanges: RwLock::new(HashMap::new()),
            frames: RwLock::new(HashMap::new()),
            risks: RwLock::new(HashMap::new()),
            active_stores: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register_strategy(&self, strategy: Arc<dyn Strategy>) -> Result<(), KernelError> {
        let name = strategy.spec().name.clone();
        let mut strategies = self.strategies.write().await;
        if strategies.contains_key(&name) {
            return Err(KernelError::DuplicateRegistration { kind: RegistryKind::Strategy, name });
        }
        strategies.insert(name, strategy);
        Ok(())
    }

    pub async fn register_exchange(&self, name: impl Into<String>, market: Arc<Market>) -> Result<(), KernelError> {
        let name = name.into();
        let mut exchanges = self.exchanges.write().await;
        if exchanges.contains_key(&name) {
            return Err(KernelError::DuplicateRegistration { kind: RegistryKind::Exchange, name });
        }
        exchanges.insert(name, market);
        Ok(())
    }

    pub async fn register_frame(&self, frame: Frame) -> Result<(), KernelError> {
        let mut frames = self.frames.write().await;
        if frames.contains_key(&frame.name) {
            return Err(KernelError::DuplicateRegistration { kind: RegistryKind::Frame, name: frame.name });
        }
        frames.insert(frame.name.clone(), frame);
        Ok(())
    }

    pub async fn register_risk(&self, risk: Arc<Risk>) -> Result<(), KernelError> {
        let name = risk.name.clone();
        let mut risks = self.risks.write().await;
        if risks.contains_key(&name) {
            return Err(KernelError::DuplicateRegistration { kind: RegistryKind::Risk, name });
        }
        risks.insert(name, risk);
        Ok(())
    }

    pub async fn strategy(&self, name: &str) -> Result<Arc<dyn Strategy>, KernelError> {
        self.strategies
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| KernelError::NotRegistered { kind: RegistryKind::Strategy, name: name.to_string() })
    }

    pub async fn exchange(&self, name: &str) -> Result<Arc<Market>, KernelError> {
        self.exchanges
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| KernelError::NotRegistered { kind: RegistryKind::Exchange, name: name.to_string() })
    }

    pub async fn frame(&self, name: &str) -> Result<Frame, KernelError> {
        self.frames
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| KernelError::NotRegistered { kind: RegistryKind::Frame, name: name.to_string() })
    }

    /// Resolves `names` against the risk table, in order, missing names
    /// raising `NotRegistered` rather than being silently dropped.
    pub async fn risks(&self, names: &[&str]) -> Result<Vec<Arc<Risk>>, KernelError> {
        let risks = self.risks.read().await;
        names
            .iter()
            .map(|name| {
                risks
                    .get(*name)
                    .cloned()
                    .ok_or_else(|| KernelError::NotRegistered { kind: RegistryKind::Risk, name: name.to_string() })
            })
            .collect()
    }

    /// The Signal Store for `(strategy_name, symbol)`, created on first use
    /// and reused for the lifetime of the process — this is what makes a
    /// slot observable by [`Registry::portfolio_view`] while a run is live.
    pub async fn store_for(&self, strategy_name: &str, symbol: &str) -> Arc<SignalStore> {
        let key = (strategy_name.to_string(), symbol.to_string());
        if let Some(store) = self.active_stores.read().await.get(&key) {
            return store.clone();
        }
        let mut stores = self.active_stores.write().await;
        stores
            .entry(key)
            .or_insert_with(|| Arc::new(SignalStore::new(self.adapter.clone(), strategy_name, symbol)))
            .clone()
    }

    /// A snapshot of every live, non-terminal signal whose strategy shares
    /// at least one risk name with `risk_names` (§5: "the portfolio view is
    /// computed by reading all Signal Store slots matching the strategy's
    /// risk set"). Copy-on-read: concurrent writes to other slots mid-scan
    /// are acceptable, last-write-wins.
    pub async fn portfolio_view(&self, risk_names: &[&str]) -> PortfolioView {
        let stores: Vec<Arc<SignalStore>> = self.active_stores.read().await.values().cloned().collect();
        let strategies = self.strategies.read().await;

        let mut signals = Vec::new();
        for store in stores {
            let Some(strategy) = strategies.get(store.strategy_name()) else {
                continue;
            };
            let shares_risk = strategy.spec().risk_names().iter().any(|r| risk_names.contains(r));
            if !shares_risk {
                continue;
            }
            if let Ok(Some(signal)) = store.read().await {
                if !signal.is_terminal() {
                    signals.push(signal);
                }
            }
        }
        PortfolioView::from_signals(signals)
    }

    /// A [`PortfolioSource`] that rebuilds its view from this Registry on
    /// every call, scoped to `risk_names` — what a driver threads into a run
    /// so each tick sees the portfolio as it stands *then*, not as it stood
    /// when the run started (§3, §5).
    pub fn portfolio_source(&self, risk_names: Vec<String>) -> RegistryPortfolioSource<'_> {
        RegistryPortfolioSource { registry: self, risk_names }
    }
}

/// Binds a [`Registry`] and a fixed risk-name set into a [`PortfolioSource`]
/// (see [`Registry::portfolio_source`]).
pub struct RegistryPortfolioSource<'a> {
    registry: &'a Registry,
    risk_names: Vec<String>,
}

#[async_trait::async_trait]
impl PortfolioSource for RegistryPortfolioSource<'_> {
    async fn view(&self) -> PortfolioView {
        let names: Vec<&str> = self.risk_names.iter().map(String::as_str).collect();
        self.registry.portfolio_view(&names).await
    }
}
