use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::error::ShareError;
use super::token::TokenDigest;
use crate::hierarchy::{Forest, HierarchyStatistics};

/// What the store keeps per token. Immutable once inserted; readers share
/// it through an `Arc`, so a resolve never sees a partly written value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub forest: Forest,
    pub statistics: HierarchyStatistics,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn insert(&self, key: TokenDigest, snapshot: Arc<StoredSnapshot>) -> Result<(), ShareError>;

    async fn get(&self, key: &TokenDigest) -> Result<Option<Arc<StoredSnapshot>>, ShareError>;

    /// Returns whether anything was removed.
    async fn remove(&self, key: &TokenDigest) -> Result<bool, ShareError>;

    /// Drops every snapshot whose `expires_at` is before `cutoff`.
    async fn remove_expired_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ShareError>;

    async fn len(&self) -> Result<usize, ShareError>;
}

/// Process-local store. Snapshots are lost on restart.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<TokenDigest, Arc<StoredSnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn insert(&self, key: TokenDigest, snapshot: Arc<StoredSnapshot>) -> Result<(), ShareError> {
        self.snapshots.write().await.insert(key, snapshot);
        Ok(())
    }

    async fn get(&self, key: &TokenDigest) -> Result<Option<Arc<StoredSnapshot>>, ShareError> {
        Ok(self.snapshots.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &TokenDigest) -> Result<bool, ShareError> {
        Ok(self.snapshots.write().await.remove(key).is_some())
    }

    async fn remove_expired_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ShareError> {
        let mut snapshots = self.snapshots.write().await;
        let before = snapshots.len();
        snapshots.retain(|_, snapshot| snapshot.expires_at >= cutoff);
        Ok(before - snapshots.len())
    }

    async fn len(&self) -> Result<usize, ShareError> {
        Ok(self.snapshots.read().await.len())
    }
}

/// Store persisted as one JSON document.
///
/// The whole map lives in memory; every mutation rewrites the file through a
/// temp file and rename while the write lock is held, so the file on disk is
/// always a complete map.
pub struct FileSnapshotStore {
    path: PathBuf,
    snapshots: RwLock<HashMap<TokenDigest, Arc<StoredSnapshot>>>,
}

impl FileSnapshotStore {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ShareError> {
        let path = path.as_ref().to_path_buf();
        let snapshots = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => {
                let stored: HashMap<TokenDigest, StoredSnapshot> = serde_json::from_slice(&bytes)?;
                stored.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!("Opened share store {} ({} snapshots)", path.display(), snapshots.len());
        Ok(Self {
            path,
            snapshots: RwLock::new(snapshots),
        })
    }

    async fn persist(&self, snapshots: &HashMap<TokenDigest, Arc<StoredSnapshot>>) -> Result<(), ShareError> {
        let ordered: BTreeMap<&TokenDigest, &StoredSnapshot> =
            snapshots.iter().map(|(k, v)| (k, v.as_ref())).collect();
        let bytes = serde_json::to_vec(&ordered)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!("Persisted {} snapshots to {}", ordered.len(), self.path.display());
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn insert(&self, key: TokenDigest, snapshot: Arc<StoredSnapshot>) -> Result<(), ShareError> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(key.clone(), snapshot);
        if let Err(e) = self.persist(&snapshots).await {
            snapshots.remove(&key);
            return Err(e);
        }
        Ok(())
    }

    async fn get(&self, key: &TokenDigest) -> Result<Option<Arc<StoredSnapshot>>, ShareError> {
        Ok(self.snapshots.read().await.get(key).cloned())
    }

    // Removals write the reduced map first and only then swap it in, so a
    // failed write never leaves memory disagreeing with disk.
    async fn remove(&self, key: &TokenDigest) -> Result<bool, ShareError> {
        let mut snapshots = self.snapshots.write().await;
        if !snapshots.contains_key(key) {
            return Ok(false);
        }
        let mut next = snapshots.clone();
        next.remove(key);
        self.persist(&next).await?;
        *snapshots = next;
        Ok(true)
    }

    async fn remove_expired_before(&self, cutoff: DateTime<Utc>) -> Result<usize, ShareError> {
        let mut snapshots = self.snapshots.write().await;
        let mut next = snapshots.clone();
        next.retain(|_, snapshot| snapshot.expires_at >= cutoff);
        let removed = snapshots.len() - next.len();
        if removed > 0 {
            self.persist(&next).await?;
            *snapshots = next;
        }
        Ok(removed)
    }

    async fn len(&self) -> Result<usize, ShareError> {
        Ok(self.snapshots.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::token::ShareToken;
    use chrono::Duration;

    fn snapshot(expires_in: Duration) -> Arc<StoredSnapshot> {
        let now = Utc::now();
        Arc::new(StoredSnapshot {
            forest: Forest::default(),
            statistics: HierarchyStatistics::default(),
            created_at: now,
            expires_at: now + expires_in,
        })
    }

    #[tokio::test]
    async fn test_memory_store_insert_get_remove() {
        let store = MemorySnapshotStore::new();
        let key = ShareToken::generate().digest();

        store.insert(key.clone(), snapshot(Duration::hours(1))).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_some());
        assert!(store.remove(&key).await.unwrap());
        assert!(!store.remove(&key).await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_expired_before_keeps_live_snapshots() {
        let store = MemorySnapshotStore::new();
        store.insert(ShareToken::generate().digest(), snapshot(Duration::hours(-2))).await.unwrap();
        store.insert(ShareToken::generate().digest(), snapshot(Duration::hours(2))).await.unwrap();

        let removed = store.remove_expired_before(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shares.json");
        let key = ShareToken::generate().digest();
        let original = snapshot(Duration::hours(1));

        {
            let store = FileSnapshotStore::open(&path).await.unwrap();
            store.insert(key.clone(), original.clone()).await.unwrap();
        }

        let reopened = FileSnapshotStore::open(&path).await.unwrap();
        let loaded = reopened.get(&key).await.unwrap().unwrap();
        assert_eq!(*loaded, *original);

        assert!(reopened.remove(&key).await.unwrap());
        let again = FileSnapshotStore::open(&path).await.unwrap();
        assert_eq!(again.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_removed_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shares.json");
        let live = ShareToken::generate().digest();
        let stale = ShareToken::generate().digest();

        let store = FileSnapshotStore::open(&path).await.unwrap();
        store.insert(live.clone(), snapshot(Duration::hours(1))).await.unwrap();
        store.insert(stale.clone(), snapshot(Duration::hours(-1))).await.unwrap();

        // The temp file cannot be created while a directory sits at its path.
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(store.remove(&live).await.is_err());
        assert!(store.get(&live).await.unwrap().is_some());
        assert!(store.remove_expired_before(Utc::now()).await.is_err());
        assert!(store.get(&stale).await.unwrap().is_some());
        assert_eq!(store.len().await.unwrap(), 2);

        std::fs::remove_dir(path.with_extension("tmp")).unwrap();
        assert!(store.remove(&live).await.unwrap());
        let reopened = FileSnapshotStore::open(&path).await.unwrap();
        assert!(reopened.get(&live).await.unwrap().is_none());
        assert!(reopened.get(&stale).await.unwrap().is_some());
    }
}
