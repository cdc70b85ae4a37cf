//! Request and response bodies of the HTTP surface. These are the `data`
//! part of the success envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::hierarchy::{BuildReport, Forest, HierarchyStatistics};
use crate::layout::LayoutEngine;
use crate::share::ShareSnapshot;
use crate::types::EmployeeId;
use crate::viewport::{RenderFrame, ViewCommand, ViewportController};

#[derive(Debug, Serialize)]
pub struct HierarchyView {
    pub forest: Forest,
    pub statistics: HierarchyStatistics,
    pub report: BuildReport,
}

#[derive(Debug, Serialize)]
pub struct SubtreeView {
    pub id: EmployeeId,
    /// From the top of the forest down to `id`, inclusive.
    pub chain_of_command: Vec<EmployeeId>,
    pub forest: Forest,
    pub statistics: HierarchyStatistics,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotView {
    pub forest: Forest,
    pub statistics: HierarchyStatistics,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&ShareSnapshot> for SnapshotView {
    fn from(snapshot: &ShareSnapshot) -> Self {
        Self {
            forest: snapshot.forest().clone(),
            statistics: snapshot.statistics().clone(),
            created_at: snapshot.created_at(),
            expires_at: snapshot.expires_at(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Seconds until the link stops resolving; server default when absent.
    #[serde(default)]
    pub ttl_secs: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareCreated {
    pub token: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Screen area the chart is drawn into, in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitViewport {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub padding: f32,
}

/// Most view commands one layout request may replay.
pub const MAX_VIEW_COMMANDS: usize = 1_000;

/// Which part of the forest to lay out, and how the viewer has moved since.
///
/// `expand_all` wins over `expanded`. Without either, only the roots are
/// expanded. When `fit` is given the view is first zoomed to show the whole
/// chart; `commands` are then replayed in order.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LayoutRequest {
    #[serde(default)]
    pub expanded: Option<Vec<EmployeeId>>,
    #[serde(default)]
    pub expand_all: bool,
    #[serde(default)]
    pub fit: Option<FitViewport>,
    #[serde(default)]
    pub commands: Vec<ViewCommand>,
}

impl LayoutRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.commands.len() > MAX_VIEW_COMMANDS {
            return Err(ApiError::bad_request(format!(
                "At most {} view commands per request, got {}",
                MAX_VIEW_COMMANDS,
                self.commands.len()
            )));
        }
        Ok(())
    }

    pub fn render(&self, forest: &Forest, engine: &LayoutEngine) -> RenderFrame {
        let mut view = ViewportController::new(forest);

        if self.expand_all {
            view.expand_all();
        } else if let Some(ids) = &self.expanded {
            view.collapse_all();
            for id in ids {
                if !view.is_expanded(id) {
                    view.toggle_node(id);
                }
            }
        }

        if let Some(fit) = self.fit {
            let bounds = engine.layout(forest, &view.state().expanded).bounds;
            view.fit_to(bounds, fit.width, fit.height, fit.padding);
        }

        for command in &self.commands {
            view.apply(command);
        }

        view.render(forest, engine)
    }
}
