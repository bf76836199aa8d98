use std::path::PathBuf;

use sk_domain::KernelError;

/// The persistence capability bundle (§6): `read`/`writeAtomic` keyed by an
/// opaque string (the Signal Store always passes `(strategy, symbol)`
/// joined). Alternative adapters (a KV store, a database row) must preserve
/// atomicity — a reader must never observe a half-written value.
#[async_trait::async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, KernelError>;
    async fn write_atomic(&self, key: &str, value: &str) -> Result<(), KernelError>;
    async fn clear(&self, key: &str) -> Result<(), KernelError>;
}

/// The default adapter: local filesystem, temp-file-then-rename for
/// atomicity. `fsync`s the temp file before the rename so the write
/// survives a crash between `write` and `rename` returning.
pub struct FsPersistenceAdapter {
    base_dir: PathBuf,
}

impl FsPersistenceAdapter {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json"))
    }

    fn tmp_path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{key}.json.tmp"))
    }
}

#[async_trait::async_trait]
impl PersistenceAdapter for FsPersistenceAdapter {
    async fn read(&self, key: &str) -> Result<Option<String>, KernelError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KernelError::PersistenceError {
                message: format!("read {}: {e}", path.display()),
            }),
        }
    }

    async fn write_atomic(&self, key: &str, value: &str) -> Result<(), KernelError> {
        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| KernelError::PersistenceError {
                message: format!("create_dir_all {}: {e}", self.base_dir.display()),
            })?;

        let tmp_path = self.tmp_path_for(key);
        let final_path = self.path_for(key);

        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| KernelError::PersistenceError {
                message: format!("create {}: {e}", tmp_path.display()),
            })?;

        use tokio::io::AsyncWriteExt;
        file.write_all(value.as_bytes())
            .await
            .map_err(|e| KernelError::PersistenceError {
                message: format!("write {}: {e}", tmp_path.display()),
            })?;
        file.sync_all().await.map_err(|e| KernelError::PersistenceError {
            message: format!("fsync {}: {e}", tmp_path.display()),
        })?;
        drop(file);

        tokio::fs::rename(&tmp_path, &final_path)
            .await
            .map_err(|e| KernelError::PersistenceError {
                message: format!("rename {} -> {}: {e}", tmp_path.display(), final_path.display()),
            })?;

        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), KernelError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KernelError::PersistenceError {
                message: format!("remove {}: {e}", path.display()),
            }),
        }
    }
}
