use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{EmployeeId, EmployeeRecord};

/// One employee placed in the organizational forest.
///
/// Nodes own their children outright. A forest never shares a node with
/// another forest, so cloning a `Forest` yields a structurally independent
/// copy (which is what share snapshots rely on).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub id: EmployeeId,
    pub name: String,
    pub title: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Depth from the forest root; roots are level 0.
    pub level: u32,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub(crate) fn from_record(record: &EmployeeRecord, level: u32) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            title: record.title.clone(),
            department: record.department.clone(),
            photo: record.photo.clone(),
            contact: record.contact.clone(),
            level,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn relevel(&mut self, level: u32) {
        let mut stack = vec![(self, level)];
        while let Some((node, level)) = stack.pop() {
            node.level = level;
            for child in node.children.iter_mut() {
                stack.push((child, level + 1));
            }
        }
    }
}

/// Ordered collection of disjoint rooted trees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Forest {
    roots: Vec<HierarchyNode>,
}

impl Forest {
    pub fn new(roots: Vec<HierarchyNode>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[HierarchyNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Depth-first pre-order walk over every node, roots left to right.
    pub fn iter(&self) -> ForestIter<'_> {
        ForestIter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    pub fn find(&self, id: &EmployeeId) -> Option<&HierarchyNode> {
        self.iter().find(|node| &node.id == id)
    }

    pub fn contains(&self, id: &EmployeeId) -> bool {
        self.find(id).is_some()
    }

    pub fn all_ids(&self) -> HashSet<EmployeeId> {
        self.iter().map(|node| node.id.clone()).collect()
    }

    /// Ids of nodes that have at least one child (the only ones worth expanding).
    pub fn ids_with_children(&self) -> HashSet<EmployeeId> {
        self.iter()
            .filter(|node| !node.is_leaf())
            .map(|node| node.id.clone())
            .collect()
    }

    /// Subtree rooted at `id`, re-levelled so that `id` sits at level 0.
    pub fn subtree(&self, id: &EmployeeId) -> Option<Forest> {
        let mut root = self.find(id)?.clone();
        root.relevel(0);
        Some(Forest::new(vec![root]))
    }

    /// Ids from the tree root down to `id`, inclusive.
    pub fn chain_of_command(&self, id: &EmployeeId) -> Option<Vec<EmployeeId>> {
        // (node, index of next child to visit)
        for root in &self.roots {
            let mut path: Vec<(&HierarchyNode, usize)> = vec![(root, 0)];
            while let Some(top) = path.last_mut() {
                let node = top.0;
                if &node.id == id {
                    return Some(path.iter().map(|(n, _)| n.id.clone()).collect());
                }
                match node.children.get(top.1) {
                    Some(child) => {
                        top.1 += 1;
                        path.push((child, 0));
                    }
                    None => {
                        path.pop();
                    }
                }
            }
        }
        None
    }
}

// Tear down level by level; the derived drop would recurse once per level.
impl Drop for Forest {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.roots);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

pub struct ForestIter<'a> {
    stack: Vec<&'a HierarchyNode>,
}

impl<'a> Iterator for ForestIter<'a> {
    type Item = &'a HierarchyNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
