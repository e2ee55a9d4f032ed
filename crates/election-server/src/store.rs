//! Store gateway selection.

use std::sync::Arc;

use election_core::config::{StoreConfig, StoreKind};
use election_core::store::{CandidateStore, JsonFileStore, MemoryStore};
use tracing::info;

use crate::error::AppError;

/// Open the gateway named by `config`, creating and seeding the JSON file
/// when needed.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn CandidateStore>, AppError> {
    match config.kind {
        StoreKind::Memory => {
            info!("using in-memory candidate store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::JsonFile => {
            let store = JsonFileStore::new(&config.path);
            store.initialize(config.seed).await?;
            let existing = store.count().await?;
            info!(
                path = %store.path().display(),
                existing,
                "using JSON file candidate store"
            );
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_starts_empty() {
        let config = StoreConfig {
            kind: StoreKind::Memory,
            ..StoreConfig::default()
        };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn json_store_is_created_and_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            kind: StoreKind::JsonFile,
            path: dir.path().join("data/candidates.json"),
            seed: true,
        };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
        assert!(config.path.exists());
    }

    #[tokio::test]
    async fn corrupt_json_store_is_a_startup_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        std::fs::write(&path, "{").unwrap();
        let config = StoreConfig {
            kind: StoreKind::JsonFile,
            path,
            seed: true,
        };
        assert!(matches!(
            open_store(&config).await,
            Err(AppError::Store { .. })
        ));
    }
}
