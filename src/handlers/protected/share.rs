// handlers/protected/share.rs - POST /api/share, DELETE /api/share/:token

use axum::{
    extract::{Path, State},
    Extension,
};
use tracing::info;

use crate::api::{ShareCreated, ShareRequest};
use crate::hierarchy::StatisticsAggregator;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, OptionalJson};
use crate::share::ShareToken;
use crate::state::AppState;

/// POST /api/share - freeze the current hierarchy behind a public link
///
/// Expected Input (optional):
/// ```json
/// { "ttl_secs": 86400 }
/// ```
///
/// Expected Output (201):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "3f2a...",
///     "url": "https://org.example.com/public/share/3f2a...",
///     "created_at": "2026-01-01T00:00:00Z",
///     "expires_at": "2026-01-02T00:00:00Z"
///   }
/// }
/// ```
///
/// TTLs below zero count as zero; TTLs above the configured maximum are cut down to it.
pub async fn share_create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    OptionalJson(request): OptionalJson<ShareRequest>,
) -> ApiResult<ShareCreated> {
    let ttl = state.share_ttl(request.ttl_secs);

    let (forest, _) = state.current_hierarchy().await?;
    let statistics = StatisticsAggregator::summarize(&forest);
    let snapshot = state
        .shares
        .create(&forest, &statistics, ttl, state.clock.as_ref())
        .await?;
    let url = state.share_url(&snapshot.token)?;
    info!("{} created share link {:?}", user.user, snapshot.token);

    Ok(ApiResponse::created(ShareCreated {
        token: snapshot.token.to_string(),
        url: url.to_string(),
        created_at: snapshot.created_at(),
        expires_at: snapshot.expires_at(),
    }))
}

/// DELETE /api/share/:token - revoke a link; revoking twice is fine
pub async fn share_revoke(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(token): Path<String>,
) -> ApiResult<()> {
    let token = ShareToken::from_raw(token);
    state.shares.revoke(&token).await?;
    info!("{} revoked share link {:?}", user.user, token);
    Ok(ApiResponse::no_content())
}
