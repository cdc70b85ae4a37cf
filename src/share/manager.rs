use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::error::ShareError;
use super::store::{SnapshotStore, StoredSnapshot};
use super::token::ShareToken;
use crate::hierarchy::{Forest, HierarchyStatistics};

/// A resolved (or freshly created) public snapshot.
#[derive(Debug, Clone)]
pub struct ShareSnapshot {
    pub token: ShareToken,
    data: Arc<StoredSnapshot>,
}

impl ShareSnapshot {
    pub fn forest(&self) -> &Forest {
        &self.data.forest
    }

    pub fn statistics(&self) -> &HierarchyStatistics {
        &self.data.statistics
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.data.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.data.expires_at
    }
}

/// Mints, resolves and revokes share tokens over a [`SnapshotStore`].
///
/// Performs no authorization; callers decide who may create or revoke.
#[derive(Clone)]
pub struct ShareTokenManager {
    store: Arc<dyn SnapshotStore>,
}

impl ShareTokenManager {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Stores a structural copy of `forest`, so later changes to live staff
    /// data never show through the link. Negative TTLs count as zero.
    pub async fn create(
        &self,
        forest: &Forest,
        statistics: &HierarchyStatistics,
        ttl: Duration,
        clock: &dyn Clock,
    ) -> Result<ShareSnapshot, ShareError> {
        let ttl = ttl.max(Duration::zero());
        let created_at = clock.now();
        let data = Arc::new(StoredSnapshot {
            forest: forest.clone(),
            statistics: statistics.clone(),
            created_at,
            expires_at: created_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        });

        let token = ShareToken::generate();
        self.store.insert(token.digest(), data.clone()).await?;
        info!(
            "Created share link {:?} ({} employees, expires {})",
            token, data.statistics.total_employees, data.expires_at
        );

        Ok(ShareSnapshot { token, data })
    }

    /// Succeeds for any instant up to and including `expires_at`.
    pub async fn resolve(&self, token: &ShareToken, clock: &dyn Clock) -> Result<ShareSnapshot, ShareError> {
        let data = self
            .store
            .get(&token.digest())
            .await?
            .ok_or(ShareError::NotFound)?;

        if clock.now() > data.expires_at {
            debug!("Share link {:?} expired at {}", token, data.expires_at);
            return Err(ShareError::Expired {
                expired_at: data.expires_at,
            });
        }

        Ok(ShareSnapshot {
            token: token.clone(),
            data,
        })
    }

    /// Idempotent: revoking an unknown or already revoked token is fine.
    pub async fn revoke(&self, token: &ShareToken) -> Result<(), ShareError> {
        if self.store.remove(&token.digest()).await? {
            info!("Revoked share link {:?}", token);
        }
        Ok(())
    }

    /// Deletes snapshots that expired more than `retention` ago. Until then an
    /// expired link keeps reporting "expired" rather than "not found".
    pub async fn purge_expired(&self, clock: &dyn Clock, retention: Duration) -> Result<usize, ShareError> {
        let now = clock.now();
        let cutoff = now
            .checked_sub_signed(retention.max(Duration::zero()))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.store.remove_expired_before(cutoff).await?;
        if removed > 0 {
            info!("Purged {} expired share snapshots", removed);
        }
        Ok(removed)
    }

    pub async fn active_count(&self) -> Result<usize, ShareError> {
        self.store.len().await
    }
}

/// Periodic storage hygiene. Resolution never depends on it: expiry is
/// always checked lazily at resolve time.
pub fn spawn_expiry_sweeper(
    manager: ShareTokenManager,
    clock: Arc<dyn Clock>,
    every: StdDuration,
    retention: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = manager.purge_expired(clock.as_ref(), retention).await {
                warn!("Share sweep failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{HierarchyBuilder, StatisticsAggregator};
    use crate::share::clock::ManualClock;
    use crate::share::store::MemorySnapshotStore;
    use crate::types::EmployeeRecord;

    fn manager() -> ShareTokenManager {
        ShareTokenManager::new(Arc::new(MemorySnapshotStore::new()))
    }

    fn staff() -> Vec<EmployeeRecord> {
        vec![
            EmployeeRecord::new(1, "Ada").with_department("HR"),
            EmployeeRecord::new(2, "Bo").with_department("HR").with_manager(1),
            EmployeeRecord::new(3, "Cy").with_department("IT").with_manager(1),
        ]
    }

    fn built(records: &[EmployeeRecord]) -> (Forest, HierarchyStatistics) {
        let forest = HierarchyBuilder::build(records).unwrap();
        let stats = StatisticsAggregator::summarize(&forest);
        (forest, stats)
    }

    #[tokio::test]
    async fn test_create_then_resolve() {
        let clock = ManualClock::new(Utc::now());
        let shares = manager();
        let (forest, stats) = built(&staff());

        let created = shares.create(&forest, &stats, Duration::hours(1), &clock).await.unwrap();
        assert_eq!(created.expires_at() - created.created_at(), Duration::hours(1));

        let resolved = shares.resolve(&created.token, &clock).await.unwrap();
        assert_eq!(resolved.forest(), &forest);
        assert_eq!(resolved.statistics(), &stats);
        assert_eq!(resolved.created_at(), created.created_at());
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let clock = ManualClock::new(Utc::now());
        let err = manager()
            .resolve(&ShareToken::from_raw("nope"), &clock)
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::NotFound));
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_after_one_millisecond() {
        let clock = ManualClock::new(Utc::now());
        let shares = manager();
        let (forest, stats) = built(&staff());

        let created = shares.create(&forest, &stats, Duration::zero(), &clock).await.unwrap();
        clock.advance(Duration::milliseconds(1));

        let err = shares.resolve(&created.token, &clock).await.unwrap_err();
        assert!(matches!(err, ShareError::Expired { expired_at } if expired_at == created.expires_at()));
    }

    #[tokio::test]
    async fn test_valid_through_expiry_instant_then_expired() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let shares = manager();
        let (forest, stats) = built(&staff());
        let created = shares.create(&forest, &stats, Duration::minutes(10), &clock).await.unwrap();

        for offset in [0, 1, 299, 599, 600] {
            clock.set(start + Duration::seconds(offset));
            assert!(shares.resolve(&created.token, &clock).await.is_ok(), "offset {}", offset);
        }
        for offset_ms in [600_001, 601_000, 86_400_000] {
            clock.set(start + Duration::milliseconds(offset_ms));
            let err = shares.resolve(&created.token, &clock).await.unwrap_err();
            assert!(matches!(err, ShareError::Expired { .. }), "offset {}ms", offset_ms);
        }
    }

    #[tokio::test]
    async fn test_snapshot_ignores_later_staff_changes() {
        let clock = ManualClock::new(Utc::now());
        let shares = manager();
        let mut records = staff();
        let (forest, stats) = built(&records);
        let created = shares.create(&forest, &stats, Duration::hours(1), &clock).await.unwrap();

        records.push(EmployeeRecord::new(4, "Di").with_department("IT").with_manager(3));
        records[1].name = "Renamed".to_string();
        let (live, live_stats) = built(&records);
        assert_ne!(live, forest);

        let resolved = shares.resolve(&created.token, &clock).await.unwrap();
        assert_eq!(resolved.forest(), &forest);
        assert_eq!(resolved.statistics().total_employees, 3);
        assert_eq!(live_stats.total_employees, 4);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let clock = ManualClock::new(Utc::now());
        let shares = manager();
        let (forest, stats) = built(&staff());
        let created = shares.create(&forest, &stats, Duration::hours(1), &clock).await.unwrap();

        shares.revoke(&created.token).await.unwrap();
        shares.revoke(&created.token).await.unwrap();
        shares.revoke(&ShareToken::from_raw("never-issued")).await.unwrap();

        let err = shares.resolve(&created.token, &clock).await.unwrap_err();
        assert!(matches!(err, ShareError::NotFound));
    }

    #[tokio::test]
    async fn test_negative_ttl_counts_as_zero() {
        let clock = ManualClock::new(Utc::now());
        let shares = manager();
        let (forest, stats) = built(&staff());
        let created = shares.create(&forest, &stats, Duration::hours(-3), &clock).await.unwrap();
        assert_eq!(created.expires_at(), created.created_at());
        assert!(shares.resolve(&created.token, &clock).await.is_ok());
    }

    #[tokio::test]
    async fn test_unbounded_ttl_and_retention_saturate() {
        let clock = ManualClock::new(Utc::now());
        let shares = manager();
        let (forest, stats) = built(&staff());

        let created = shares.create(&forest, &stats, Duration::max_value(), &clock).await.unwrap();
        assert_eq!(created.expires_at(), DateTime::<Utc>::MAX_UTC);
        assert!(shares.resolve(&created.token, &clock).await.is_ok());

        assert_eq!(shares.purge_expired(&clock, Duration::max_value()).await.unwrap(), 0);
        assert_eq!(shares.active_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_purge_respects_retention() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        let shares = manager();
        let (forest, stats) = built(&staff());
        let created = shares.create(&forest, &stats, Duration::minutes(1), &clock).await.unwrap();

        clock.set(start + Duration::minutes(30));
        assert_eq!(shares.purge_expired(&clock, Duration::hours(1)).await.unwrap(), 0);
        assert!(matches!(
            shares.resolve(&created.token, &clock).await.unwrap_err(),
            ShareError::Expired { .. }
        ));

        clock.set(start + Duration::hours(2));
        assert_eq!(shares.purge_expired(&clock, Duration::hours(1)).await.unwrap(), 1);
        assert!(matches!(
            shares.resolve(&created.token, &clock).await.unwrap_err(),
            ShareError::NotFound
        ));
        assert_eq!(shares.active_count().await.unwrap(), 0);
    }
}
