use std::sync::Arc;

use chrono::Duration;
use tracing::warn;
use url::Url;

use crate::config::ShareConfig;
use crate::error::ApiError;
use crate::hierarchy::{BuildReport, Forest, HierarchyBuilder};
use crate::layout::LayoutEngine;
use crate::share::{Clock, ShareToken, ShareTokenManager};
use crate::source::EmployeeSource;

/// Shared handles injected into every handler through axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn EmployeeSource>,
    pub shares: ShareTokenManager,
    pub clock: Arc<dyn Clock>,
    pub layout: LayoutEngine,
    pub share_config: ShareConfig,
    public_base_url: Url,
}

impl AppState {
    pub fn new(
        source: Arc<dyn EmployeeSource>,
        shares: ShareTokenManager,
        clock: Arc<dyn Clock>,
        layout: LayoutEngine,
        share_config: ShareConfig,
        public_base_url: &str,
    ) -> Result<Self, url::ParseError> {
        // Url::join drops the last segment unless the base ends in '/'.
        let mut base = public_base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            source,
            shares,
            clock,
            layout,
            share_config,
            public_base_url: Url::parse(&base)?,
        })
    }

    /// Rebuilds the forest from the live source. Nothing is cached: every
    /// call sees the staff data as it is now.
    pub async fn current_hierarchy(&self) -> Result<(Forest, BuildReport), ApiError> {
        let records = self.source.fetch_employees().await?;
        let (forest, report) = HierarchyBuilder::build_with_report(&records)?;

        if !report.is_clean() {
            warn!(
                "Staff data from {} has {} manager cycle(s) and {} dangling manager reference(s)",
                self.source.describe(),
                report.cycles.len(),
                report.dangling.len()
            );
        }

        Ok((forest, report))
    }

    pub fn share_ttl(&self, requested: Option<i64>) -> Duration {
        self.share_config.ttl(requested)
    }

    pub fn share_url(&self, token: &ShareToken) -> Result<Url, ApiError> {
        self.public_base_url
            .join(&format!("public/share/{}", token.as_str()))
            .map_err(|e| ApiError::internal_server_error(format!("Failed to build share link: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::layout::LayoutConfig;
    use crate::share::{MemorySnapshotStore, SystemClock};
    use crate::source::MemoryEmployeeSource;

    fn state(base: &str) -> AppState {
        AppState::new(
            Arc::new(MemoryEmployeeSource::new(Vec::new())),
            ShareTokenManager::new(Arc::new(MemorySnapshotStore::new())),
            Arc::new(SystemClock),
            LayoutEngine::new(LayoutConfig::default()),
            AppConfig::from_env().share,
            base,
        )
        .unwrap()
    }

    #[test]
    fn test_share_url_keeps_base_path() {
        let token = ShareToken::from_raw("abc");
        assert_eq!(
            state("https://org.example.com/chart").share_url(&token).unwrap().as_str(),
            "https://org.example.com/chart/public/share/abc"
        );
        assert_eq!(
            state("http://localhost:3000/").share_url(&token).unwrap().as_str(),
            "http://localhost:3000/public/share/abc"
        );
    }

    #[tokio::test]
    async fn test_empty_source_yields_empty_forest() {
        let (forest, report) = state("http://localhost/").current_hierarchy().await.unwrap();
        assert!(forest.is_empty());
        assert!(report.is_clean());
    }
}
