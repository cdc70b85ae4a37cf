use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::node::{Forest, HierarchyNode};
use crate::types::{EmployeeId, EmployeeRecord};

/// Input that cannot be turned into a forest at all.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HierarchyError {
    #[error("Malformed hierarchy: employee id '{0}' appears more than once")]
    DuplicateEmployee(EmployeeId),
}

/// Data-quality findings from a build. None of these abort the build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    /// Each manager-reference cycle that was broken, members in discovery order.
    pub cycles: Vec<Vec<EmployeeId>>,
    /// Employees whose manager id does not exist in the input.
    pub dangling: Vec<EmployeeId>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty() && self.dangling.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    Resolving,
    Resolved,
}

/// Turns a flat staff list into a rooted forest by manager reference.
pub struct HierarchyBuilder;

impl HierarchyBuilder {
    pub fn build(records: &[EmployeeRecord]) -> Result<Forest, HierarchyError> {
        Self::build_with_report(records).map(|(forest, _)| forest)
    }

    pub fn build_with_report(
        records: &[EmployeeRecord],
    ) -> Result<(Forest, BuildReport), HierarchyError> {
        let index = Self::index(records)?;
        let mut report = BuildReport::default();

        // Arena edges: parent[i] is the record index of i's manager.
        let mut parent: Vec<Option<usize>> = records
            .iter()
            .map(|record| {
                let manager = record.manager_id.as_ref()?;
                let found = index.get(manager).copied();
                if found.is_none() {
                    debug!("Employee {} references unknown manager {}", record.id, manager);
                    report.dangling.push(record.id.clone());
                }
                found
            })
            .collect();

        Self::break_cycles(records, &mut parent, &mut report);

        let mut roots = Vec::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
        for (i, p) in parent.iter().enumerate() {
            match p {
                Some(p) => children[*p].push(i),
                None => roots.push(i),
            }
        }

        if !report.dangling.is_empty() {
            warn!(
                "{} employee(s) reference a manager outside the staff list; promoted to roots",
                report.dangling.len()
            );
        }

        let forest = Self::materialize(records, &roots, &children);
        debug!(
            "Built hierarchy: {} employees, {} roots",
            records.len(),
            forest.roots().len()
        );
        Ok((forest, report))
    }

    fn index(records: &[EmployeeRecord]) -> Result<HashMap<&EmployeeId, usize>, HierarchyError> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(&record.id, i).is_some() {
                return Err(HierarchyError::DuplicateEmployee(record.id.clone()));
            }
        }
        Ok(index)
    }

    /// Walks each manager chain once. A node met again while its own chain is
    /// still being resolved closes a cycle; every member of that cycle loses
    /// its parent edge and becomes a root. Nodes that merely lead into a
    /// cycle keep their edges.
    fn break_cycles(records: &[EmployeeRecord], parent: &mut [Option<usize>], report: &mut BuildReport) {
        let mut marks = vec![Mark::Unvisited; records.len()];
        let mut trail: Vec<usize> = Vec::new();

        for start in 0..records.len() {
            if marks[start] == Mark::Resolved {
                continue;
            }

            trail.clear();
            let mut current = Some(start);
            while let Some(i) = current {
                match marks[i] {
                    Mark::Resolved => break,
                    Mark::Resolving => {
                        if let Some(pos) = trail.iter().position(|&t| t == i) {
                            let members: Vec<EmployeeId> =
                                trail[pos..].iter().map(|&m| records[m].id.clone()).collect();
                            for &m in &trail[pos..] {
                                parent[m] = None;
                            }
                            warn!(
                                "Manager cycle detected among [{}]; promoting members to roots",
                                members.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(", ")
                            );
                            report.cycles.push(members);
                        }
                        break;
                    }
                    Mark::Unvisited => {
                        marks[i] = Mark::Resolving;
                        trail.push(i);
                        current = parent[i];
                    }
                }
            }

            for &t in &trail {
                marks[t] = Mark::Resolved;
            }
        }
    }

    /// Levels top-down breadth-first, then assemble owned nodes bottom-up so
    /// deep chains never recurse.
    fn materialize(records: &[EmployeeRecord], roots: &[usize], children: &[Vec<usize>]) -> Forest {
        let mut level = vec![0u32; records.len()];
        let mut order = Vec::with_capacity(records.len());
        let mut queue: VecDeque<usize> = roots.iter().copied().collect();
        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &c in &children[i] {
                level[c] = level[i] + 1;
                queue.push_back(c);
            }
        }

        let mut built: Vec<Option<HierarchyNode>> = vec![None; records.len()];
        for &i in order.iter().rev() {
            let mut node = HierarchyNode::from_record(&records[i], level[i]);
            node.children = children[i]
                .iter()
                .filter_map(|&c| built[c].take())
                .collect();
            built[i] = Some(node);
        }

        Forest::new(roots.iter().filter_map(|&r| built[r].take()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rec(id: i64, manager: Option<i64>, dept: &str) -> EmployeeRecord {
        let record = EmployeeRecord::new(id, format!("Employee {}", id)).with_department(dept);
        match manager {
            Some(m) => record.with_manager(m),
            None => record,
        }
    }

    fn id(n: i64) -> EmployeeId {
        EmployeeId::from(n)
    }

    #[test]
    fn test_single_root_with_two_reports() {
        let records = vec![rec(1, None, "HR"), rec(2, Some(1), "HR"), rec(3, Some(1), "IT")];
        let forest = HierarchyBuilder::build(&records).unwrap();

        assert_eq!(forest.roots().len(), 1);
        let root = &forest.roots()[0];
        assert_eq!(root.id, id(1));
        assert_eq!(root.level, 0);
        let child_ids: Vec<_> = root.children.iter().map(|c| c.id.clone()).collect();
        assert_eq!(child_ids, vec![id(2), id(3)]);
        assert!(root.children.iter().all(|c| c.level == 1));
    }

    #[test]
    fn test_every_record_appears_exactly_once() {
        // Children listed before their managers, a dangling reference and a second tree.
        let records = vec![
            rec(5, Some(4), "Ops"),
            rec(4, Some(1), "Ops"),
            rec(1, None, "Exec"),
            rec(9, Some(42), "Sales"),
            rec(7, None, "Sales"),
            rec(8, Some(7), "Sales"),
            rec(6, Some(4), "Ops"),
        ];
        let forest = HierarchyBuilder::build(&records).unwrap();

        let mut seen: HashMap<EmployeeId, usize> = HashMap::new();
        for node in forest.iter() {
            *seen.entry(node.id.clone()).or_default() += 1;
        }
        assert_eq!(seen.len(), records.len());
        assert!(seen.values().all(|&n| n == 1));
    }

    #[test]
    fn test_levels_increase_by_one_per_edge() {
        let records = vec![
            rec(1, None, "A"),
            rec(2, Some(1), "A"),
            rec(3, Some(2), "A"),
            rec(4, Some(3), "A"),
            rec(5, Some(1), "B"),
        ];
        let forest = HierarchyBuilder::build(&records).unwrap();
        for root in forest.roots() {
            assert_eq!(root.level, 0);
        }
        for node in forest.iter() {
            for child in &node.children {
                assert_eq!(child.level, node.level + 1);
            }
        }
        assert_eq!(forest.find(&id(4)).unwrap().level, 3);
    }

    #[test]
    fn test_two_node_cycle_promotes_both_to_roots() {
        let records = vec![rec(1, Some(2), "A"), rec(2, Some(1), "A")];
        let (forest, report) = HierarchyBuilder::build_with_report(&records).unwrap();

        let root_ids: Vec<_> = forest.roots().iter().map(|r| r.id.clone()).collect();
        assert_eq!(root_ids, vec![id(1), id(2)]);
        assert!(forest.roots().iter().all(|r| r.children.is_empty() && r.level == 0));
        assert_eq!(report.cycles, vec![vec![id(1), id(2)]]);
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let records = vec![rec(1, Some(1), "A"), rec(2, Some(1), "A")];
        let (forest, report) = HierarchyBuilder::build_with_report(&records).unwrap();
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.roots()[0].children.len(), 1);
        assert_eq!(report.cycles, vec![vec![id(1)]]);
    }

    #[test]
    fn test_chain_into_cycle_stays_attached() {
        // 4 -> 3 -> 1 <-> 2
        let records = vec![
            rec(4, Some(3), "A"),
            rec(3, Some(1), "A"),
            rec(1, Some(2), "A"),
            rec(2, Some(1), "A"),
        ];
        let (forest, report) = HierarchyBuilder::build_with_report(&records).unwrap();

        assert_eq!(report.cycles.len(), 1);
        assert_eq!(report.cycles[0].len(), 2);
        assert_eq!(forest.roots().len(), 2);
        assert_eq!(forest.find(&id(3)).unwrap().level, 1);
        assert_eq!(forest.find(&id(4)).unwrap().level, 2);
        assert_eq!(forest.node_count(), 4);
    }

    #[test]
    fn test_dangling_manager_becomes_root() {
        let records = vec![rec(1, Some(99), "A"), rec(2, Some(1), "A")];
        let (forest, report) = HierarchyBuilder::build_with_report(&records).unwrap();
        assert_eq!(forest.roots().len(), 1);
        assert_eq!(forest.roots()[0].id, id(1));
        assert_eq!(report.dangling, vec![id(1)]);
        assert!(report.cycles.is_empty());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let records = vec![rec(1, None, "A"), rec(2, Some(1), "A"), rec(1, None, "B")];
        let err = HierarchyBuilder::build(&records).unwrap_err();
        assert_eq!(err, HierarchyError::DuplicateEmployee(id(1)));
    }

    #[test]
    fn test_empty_input_builds_empty_forest() {
        let (forest, report) = HierarchyBuilder::build_with_report(&[]).unwrap();
        assert!(forest.is_empty());
        assert!(report.is_clean());
    }
}
