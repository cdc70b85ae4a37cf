pub mod format;

pub use format::{
    FitViewport, HierarchyView, LayoutRequest, ShareCreated, ShareRequest, SnapshotView, SubtreeView, MAX_VIEW_COMMANDS,
};
