use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::node::Forest;

/// Aggregate figures over one forest. Derived on every build, never stored
/// on its own (share snapshots keep the copy they were created with).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HierarchyStatistics {
    pub total_employees: usize,
    /// Department name to head count. Sorted so output is stable.
    pub departments: BTreeMap<String, usize>,
    pub max_level: u32,
    pub root_count: usize,
}

pub struct StatisticsAggregator;

impl StatisticsAggregator {
    /// Single depth-first pass; pure function of the forest.
    pub fn summarize(forest: &Forest) -> HierarchyStatistics {
        let mut stats = HierarchyStatistics {
            root_count: forest.roots().len(),
            ..HierarchyStatistics::default()
        };

        for node in forest.iter() {
            stats.total_employees += 1;
            *stats.departments.entry(node.department.clone()).or_default() += 1;
            stats.max_level = stats.max_level.max(node.level);
        }

        stats
    }
}
