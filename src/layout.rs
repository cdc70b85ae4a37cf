use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::hierarchy::{Forest, HierarchyNode};
use crate::types::{EmployeeId, Point};

/// Spacing constants for the layered tree layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal distance between adjacent slots.
    pub node_pitch: f32,
    /// Vertical distance between levels.
    pub row_pitch: f32,
    pub node_width: f32,
    pub node_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_pitch: 220.0,
            row_pitch: 140.0,
            node_width: 180.0,
            node_height: 80.0,
        }
    }
}

/// Placement of one visible employee. `x`/`y` is the centre of the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePlacement {
    pub id: EmployeeId,
    pub x: f32,
    pub y: f32,
    pub level: u32,
    pub name: String,
    pub title: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub is_expanded: bool,
    /// Direct reports, visible or not.
    pub child_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePlacement {
    pub from_id: EmployeeId,
    pub to_id: EmployeeId,
    /// Orthogonal elbow: parent bottom, mid row, mid row, child top.
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub nodes: Vec<NodePlacement>,
    pub edges: Vec<EdgePlacement>,
    pub bounds: Bounds,
}

impl Geometry {
    pub fn node(&self, id: &EmployeeId) -> Option<&NodePlacement> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

/// Classic layered tree layout over the visible part of a forest.
///
/// Pure: identical `(forest, expanded)` always yields identical geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

struct Pass<'a> {
    config: &'a LayoutConfig,
    expanded: &'a BTreeSet<EmployeeId>,
    next_slot: u32,
    nodes: Vec<NodePlacement>,
    edges: Vec<EdgePlacement>,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Only children of expanded nodes are emitted; a collapsed node's
    /// subtree is absent from the output, not merely hidden.
    pub fn layout(&self, forest: &Forest, expanded: &BTreeSet<EmployeeId>) -> Geometry {
        let mut pass = Pass {
            config: &self.config,
            expanded,
            next_slot: 0,
            nodes: Vec::new(),
            edges: Vec::new(),
        };

        for root in forest.roots() {
            pass.place(root);
        }

        let bounds = self.bounds(&pass.nodes);
        Geometry {
            nodes: pass.nodes,
            edges: pass.edges,
            bounds,
        }
    }

    fn bounds(&self, nodes: &[NodePlacement]) -> Bounds {
        let half_w = self.config.node_width / 2.0;
        let half_h = self.config.node_height / 2.0;
        let mut iter = nodes.iter();
        let Some(first) = iter.next() else {
            return Bounds::default();
        };

        let seed = Bounds {
            min_x: first.x - half_w,
            min_y: first.y - half_h,
            max_x: first.x + half_w,
            max_y: first.y + half_h,
        };
        iter.fold(seed, |b, n| Bounds {
            min_x: b.min_x.min(n.x - half_w),
            min_y: b.min_y.min(n.y - half_h),
            max_x: b.max_x.max(n.x + half_w),
            max_y: b.max_y.max(n.y + half_h),
        })
    }
}

enum Visit<'n> {
    Enter(&'n HierarchyNode),
    /// All children are placed; `index` is the parent's slot in `nodes`.
    Exit(&'n HierarchyNode, usize),
}

impl Pass<'_> {
    /// Post-order: children are placed first, then the parent is centred on
    /// the mean of their x. Leaves and collapsed nodes take the next slot.
    /// Walks with an explicit stack, so chain depth is bounded by memory only.
    fn place(&mut self, root: &HierarchyNode) {
        let mut stack = vec![Visit::Enter(root)];
        // x of each finished subtree whose parent is still open
        let mut xs: Vec<f32> = Vec::new();

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(node) => {
                    let is_expanded = self.expanded.contains(&node.id);
                    let y = self.row_y(node);
                    let index = self.nodes.len();
                    self.nodes.push(NodePlacement {
                        id: node.id.clone(),
                        x: 0.0,
                        y,
                        level: node.level,
                        name: node.name.clone(),
                        title: node.title.clone(),
                        department: node.department.clone(),
                        photo: node.photo.clone(),
                        contact: node.contact.clone(),
                        is_expanded,
                        child_count: node.children.len(),
                    });

                    if is_expanded && !node.is_leaf() {
                        stack.push(Visit::Exit(node, index));
                        stack.extend(node.children.iter().rev().map(Visit::Enter));
                    } else {
                        let x = self.next_slot as f32 * self.config.node_pitch;
                        self.next_slot += 1;
                        self.nodes[index].x = x;
                        xs.push(x);
                    }
                }
                Visit::Exit(node, index) => {
                    let child_xs = xs.split_off(xs.len() - node.children.len());
                    let x = child_xs.iter().sum::<f32>() / child_xs.len() as f32;
                    let y = self.row_y(node);
                    for (child, &child_x) in node.children.iter().zip(&child_xs) {
                        let points = self.elbow(Point::new(x, y), Point::new(child_x, self.row_y(child)));
                        self.edges.push(EdgePlacement {
                            from_id: node.id.clone(),
                            to_id: child.id.clone(),
                            points,
                        });
                    }
                    self.nodes[index].x = x;
                    xs.push(x);
                }
            }
        }
    }

    fn row_y(&self, node: &HierarchyNode) -> f32 {
        node.level as f32 * self.config.row_pitch
    }

    fn elbow(&self, parent: Point, child: Point) -> Vec<Point> {
        let half_h = self.config.node_height / 2.0;
        let start = Point::new(parent.x, parent.y + half_h);
        let end = Point::new(child.x, child.y - half_h);
        let mid_y = (start.y + end.y) / 2.0;
        vec![start, Point::new(start.x, mid_y), Point::new(end.x, mid_y), end]
    }
}
