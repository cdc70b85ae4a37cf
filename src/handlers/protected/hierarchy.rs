// handlers/protected/hierarchy.rs - /api/hierarchy*

use axum::{
    extract::{Path, State},
    Extension,
};
use tracing::info;

use crate::api::{HierarchyView, LayoutRequest, SubtreeView};
use crate::error::ApiError;
use crate::hierarchy::StatisticsAggregator;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, OptionalJson};
use crate::state::AppState;
use crate::types::EmployeeId;
use crate::viewport::RenderFrame;

/// GET /api/hierarchy - the whole forest with statistics and data findings
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "forest": [...],
///     "statistics": { "total_employees": 10, "departments": {...}, "max_level": 2, "root_count": 1 },
///     "report": { "cycles": [], "dangling": [] }
///   }
/// }
/// ```
pub async fn hierarchy_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<HierarchyView> {
    let (forest, report) = state.current_hierarchy().await?;
    let statistics = StatisticsAggregator::summarize(&forest);
    info!("{} loaded hierarchy of {} employees", user.user, statistics.total_employees);

    Ok(ApiResponse::success(HierarchyView {
        forest,
        statistics,
        report,
    }))
}

/// GET /api/hierarchy/:id - one employee's subtree, re-levelled from 0
pub async fn subtree_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SubtreeView> {
    let id = EmployeeId::new(id);
    let (forest, _) = state.current_hierarchy().await?;

    let (subtree, chain_of_command) = forest
        .subtree(&id)
        .zip(forest.chain_of_command(&id))
        .ok_or_else(|| ApiError::not_found(format!("Employee '{}' not found", id)))?;

    Ok(ApiResponse::success(SubtreeView {
        statistics: StatisticsAggregator::summarize(&subtree),
        id,
        chain_of_command,
        forest: subtree,
    }))
}

/// POST /api/hierarchy/layout - geometry for the visible part of the live forest
///
/// Expected Input (all optional):
/// ```json
/// { "expanded": ["1", "4"], "expand_all": false, "commands": [{ "type": "zoom_in" }] }
/// ```
///
/// A body that does not parse, or more than `MAX_VIEW_COMMANDS` commands, answers 400 `BAD_REQUEST`.
pub async fn hierarchy_layout(
    State(state): State<AppState>,
    OptionalJson(request): OptionalJson<LayoutRequest>,
) -> ApiResult<RenderFrame> {
    request.validate()?;
    let (forest, _) = state.current_hierarchy().await?;
    Ok(ApiResponse::success(request.render(&forest, &state.layout)))
}
