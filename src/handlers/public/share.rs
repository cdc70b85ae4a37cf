// handlers/public/share.rs - GET /public/share/:token, POST /public/share/:token/layout

use axum::extract::{Path, State};
use tracing::debug;

use crate::api::{LayoutRequest, SnapshotView};
use crate::middleware::{ApiResponse, ApiResult, OptionalJson};
use crate::share::{ShareSnapshot, ShareToken};
use crate::state::AppState;
use crate::viewport::RenderFrame;

async fn resolve(state: &AppState, raw: String) -> Result<ShareSnapshot, crate::error::ApiError> {
    let token = ShareToken::from_raw(raw);
    let snapshot = state.shares.resolve(&token, state.clock.as_ref()).await?;
    debug!("Resolved share link {:?}", token);
    Ok(snapshot)
}

/// GET /public/share/:token - the snapshot behind a share link
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "forest": [{ "id": "1", "name": "Ada", "level": 0, "children": [] }],
///     "statistics": { "total_employees": 1, "departments": {"HR": 1}, "max_level": 0, "root_count": 1 },
///     "created_at": "2026-01-01T00:00:00Z",
///     "expires_at": "2026-01-08T00:00:00Z"
///   }
/// }
/// ```
///
/// Unknown or revoked tokens answer 404 `NOT_FOUND`; expired ones 410 `SHARE_EXPIRED`.
pub async fn share_get(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<SnapshotView> {
    let snapshot = resolve(&state, token).await?;
    Ok(ApiResponse::success(SnapshotView::from(&snapshot)))
}

/// POST /public/share/:token/layout - lay out the snapshot's forest
pub async fn share_layout(
    State(state): State<AppState>,
    Path(token): Path<String>,
    OptionalJson(request): OptionalJson<LayoutRequest>,
) -> ApiResult<RenderFrame> {
    request.validate()?;
    let snapshot = resolve(&state, token).await?;
    Ok(ApiResponse::success(request.render(snapshot.forest(), &state.layout)))
}
