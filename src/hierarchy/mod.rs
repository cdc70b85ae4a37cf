pub mod builder;
pub mod node;
pub mod statistics;

pub use builder::{BuildReport, HierarchyBuilder, HierarchyError};
pub use node::{Forest, HierarchyNode};
pub use statistics::{HierarchyStatistics, StatisticsAggregator};
