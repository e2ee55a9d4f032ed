//! Candidate store gateway.
//!
//! The generation loop only needs one persistence call: turn a
//! [`CandidateDraft`] into a stored [`Candidate`] with an assigned id and
//! timestamps. [`CandidateStore`] is that contract. Two gateways ship with
//! the service:
//!
//! - [`MemoryStore`] keeps candidates in a vector (tests, ephemeral runs).
//! - [`JsonFileStore`] keeps a pretty-printed JSON array on disk, the layout
//!   the dashboard's REST backend reads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use election_types::{Candidate, CandidateDraft};
use tokio::sync::Mutex;

/// Errors a store gateway may report.
///
/// The registry treats every variant the same way: the current
/// generation run for that connection ends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file did not hold valid candidate JSON.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract consumed by the generation registry.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Durably store a draft and return the stored form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the candidate could not be stored.
    async fn create(&self, draft: CandidateDraft) -> Result<Candidate, StoreError>;

    /// Number of stored candidates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    async fn count(&self) -> Result<usize, StoreError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process candidate store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    candidates: Mutex<Vec<Candidate>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored candidate, oldest first.
    pub async fn all(&self) -> Vec<Candidate> {
        self.candidates.lock().await.clone()
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn create(&self, draft: CandidateDraft) -> Result<Candidate, StoreError> {
        let candidate = Candidate::from_draft(draft, Utc::now());
        self.candidates.lock().await.push(candidate.clone());
        Ok(candidate)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.candidates.lock().await.len())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// Candidate store backed by a JSON array file.
///
/// Every write rewrites the whole file; an async mutex serializes the
/// read-modify-write cycle so concurrent ticks never lose an append.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store for the given file. Nothing is touched on disk until
    /// [`initialize`](Self::initialize) or the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists and, when `seed` is set and the
    /// file is absent, write the starter candidates.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or file cannot be
    /// created.
    pub async fn initialize(&self, seed: bool) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        let initial = if seed { starter_candidates() } else { Vec::new() };
        self.write_all(&initial).await?;
        tracing::info!(
            path = %self.path.display(),
            seeded = initial.len(),
            "candidate store initialized"
        );
        Ok(())
    }

    /// Read every stored candidate. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file exists but cannot be read or
    /// parsed.
    pub async fn load(&self) -> Result<Vec<Candidate>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, candidates: &[Candidate]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(candidates)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl CandidateStore for JsonFileStore {
    async fn create(&self, draft: CandidateDraft) -> Result<Candidate, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut candidates = self.load().await?;
        let candidate = Candidate::from_draft(draft, Utc::now());
        candidates.push(candidate.clone());
        self.write_all(&candidates).await?;
        Ok(candidate)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.load().await?.len())
    }
}

fn starter_candidates() -> Vec<Candidate> {
    let now = Utc::now();
    [
        (
            "Sarah Johnson",
            "https://images.unsplash.com/photo-1494790108755-2616b332c2f8?w=400&h=400&fit=crop&crop=face",
            "Progressive Alliance",
            "Former city council member with 12 years of experience in local government. \
             Advocate for environmental sustainability, affordable housing, and economic development.",
        ),
        (
            "Michael Chen",
            "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=400&h=400&fit=crop&crop=face",
            "Unity Party",
            "Small business owner and community organizer. Focuses on infrastructure improvement, \
             education reform, and supporting local businesses.",
        ),
        (
            "Elena Rodriguez",
            "https://images.unsplash.com/photo-1438761681033-6461ffad8d80?w=400&h=400&fit=crop&crop=face",
            "Citizens First",
            "Healthcare administrator and former school board president. Champions healthcare \
             access, education funding, and social services.",
        ),
    ]
    .into_iter()
    .map(|(name, image, party, description)| {
        Candidate::from_draft(
            CandidateDraft {
                name: name.to_owned(),
                image: image.to_owned(),
                party: party.to_owned(),
                description: description.to_owned(),
            },
            now,
        )
    })
    .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::factory::random_candidate;

    #[tokio::test]
    async fn memory_store_assigns_ids_and_counts() {
        let store = MemoryStore::new();
        let a = store.create(random_candidate()).await.unwrap();
        let b = store.create(random_candidate()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.created_at, a.updated_at);
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.all().await.first().map(|c| c.id), Some(a.id));
    }

    #[tokio::test]
    async fn json_store_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/candidates.json"));
        store.initialize(true).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);

        // A second initialize must not reseed or truncate.
        store.create(random_candidate()).await.unwrap();
        store.initialize(true).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn json_store_without_seed_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("candidates.json"));
        store.initialize(false).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_store_appends_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        let store = JsonFileStore::new(&path);
        let stored = store.create(random_candidate()).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        let all = reopened.load().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.first(), Some(&stored));
    }

    #[tokio::test]
    async fn json_store_concurrent_creates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonFileStore::new(dir.path().join("candidates.json")));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(random_candidate()).await.map(|c| c.id)
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(store.count().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn json_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("candidates.json");
        tokio::fs::write(&path, b"not json").await.unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(
            store.create(random_candidate()).await,
            Err(StoreError::Serialization(_))
        ));
    }
}
