use std::collections::HashMap;
use std::sync::Mutex;

use sk_domain::KernelError;
use sk_store::PersistenceAdapter;

/// An in-memory [`PersistenceAdapter`] for fast unit tests that don't need
/// to survive a process restart — S6's crash-recovery scenario uses the real
/// `FsPersistenceAdapter` against a scratch directory instead, since the
/// whole point there is persistence across a fresh adapter instance.
#[derive(Default)]
pub struct MemoryPersistenceAdapter {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryPersistenceAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl PersistenceAdapter for MemoryPersistenceAdapter {
    async fn read(&self, key: &str) -> Result<Option<String>, KernelError> {
        Ok(self.slots.lock().unwrap().get(key).cloned())
    }

    async fn write_atomic(&self, key: &str, value: &str) -> Result<(), KernelError> {
        self.slots.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), KernelError> {
        self.slots.lock().unwrap().remove(key);
        Ok(())
    }
}
