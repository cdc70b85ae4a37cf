//! Interactive view state for one viewing session.
//!
//! Every input is a [`ViewCommand`]. [`ViewState::apply`] updates a state in
//! place, [`ViewState::step`] is the pure form of the same transition, and
//! [`ViewportController`] holds the current state of one session. No command
//! can fail: bad numbers are ignored or clamped.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::hierarchy::Forest;
use crate::layout::{Bounds, EdgePlacement, LayoutEngine, NodePlacement};
use crate::types::{EmployeeId, Point};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 3.0;
pub const ZOOM_IN_STEP: f32 = 1.2;
pub const ZOOM_OUT_STEP: f32 = 0.8;
/// Pan offsets are clamped to `±PAN_LIMIT` on both axes.
pub const PAN_LIMIT: f32 = 1.0e9;
const WHEEL_SENSITIVITY: f32 = 0.0015;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewCommand {
    ToggleNode { id: EmployeeId },
    ExpandAll,
    CollapseAll,
    ZoomBy { factor: f32 },
    ZoomIn,
    ZoomOut,
    PanBy { dx: f32, dy: f32 },
    ResetView,
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    PointerLeave,
    /// Active touches after the event.
    TouchStart { touches: Vec<Point> },
    TouchMove { touches: Vec<Point> },
    /// Touches still down after one or more were lifted.
    TouchEnd { touches: Vec<Point> },
    Wheel { delta_y: f32 },
}

/// In-flight pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// `anchor` = pointer position at drag start minus the pan at that moment.
    Dragging { anchor: Point },
    Pinching { distance: f32 },
}

/// Screen = layout × zoom + pan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub zoom: f32,
    pub pan_x: f32,
    pub pan_y: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f32,
    pub pan: Point,
    pub expanded: BTreeSet<EmployeeId>,
}

/// What the controller needs to know about the forest to answer commands.
#[derive(Debug, Clone, Default)]
pub struct ForestIndex {
    all_ids: BTreeSet<EmployeeId>,
    expandable: HashSet<EmployeeId>,
}

impl ForestIndex {
    pub fn of(forest: &Forest) -> Self {
        Self {
            all_ids: forest.iter().map(|n| n.id.clone()).collect(),
            expandable: forest.ids_with_children(),
        }
    }
}

impl ViewState {
    /// Zoom 1, no pan, every root expanded.
    pub fn initial(forest: &Forest) -> Self {
        Self {
            zoom: 1.0,
            pan: Point::ZERO,
            expanded: forest.roots().iter().map(|r| r.id.clone()).collect(),
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            zoom: self.zoom,
            pan_x: self.pan.x,
            pan_y: self.pan.y,
        }
    }

    /// Pure transition: returns the next state and gesture.
    pub fn step(&self, gesture: Gesture, index: &ForestIndex, command: &ViewCommand) -> (ViewState, Gesture) {
        let mut next = self.clone();
        let gesture = next.apply(gesture, index, command);
        (next, gesture)
    }

    /// Applies `command` in place and returns the gesture that follows it.
    pub fn apply(&mut self, gesture: Gesture, index: &ForestIndex, command: &ViewCommand) -> Gesture {
        let mut gesture = gesture;

        match command {
            ViewCommand::ToggleNode { id } => {
                if index.expandable.contains(id) && !self.expanded.remove(id) {
                    self.expanded.insert(id.clone());
                }
            }
            ViewCommand::ExpandAll => self.expanded.clone_from(&index.all_ids),
            ViewCommand::CollapseAll => self.expanded.clear(),
            ViewCommand::ZoomBy { factor } => self.zoom = zoomed(self.zoom, *factor),
            ViewCommand::ZoomIn => self.zoom = zoomed(self.zoom, ZOOM_IN_STEP),
            ViewCommand::ZoomOut => self.zoom = zoomed(self.zoom, ZOOM_OUT_STEP),
            ViewCommand::Wheel { delta_y } => {
                self.zoom = zoomed(self.zoom, (-delta_y * WHEEL_SENSITIVITY).exp());
            }
            ViewCommand::PanBy { dx, dy } => {
                let delta = Point::new(*dx, *dy);
                if delta.is_finite() {
                    self.pan = clamped_pan(self.pan + delta);
                }
            }
            ViewCommand::ResetView => {
                self.zoom = 1.0;
                self.pan = Point::ZERO;
            }
            ViewCommand::PointerDown { x, y } => {
                let at = Point::new(*x, *y);
                if at.is_finite() {
                    gesture = Gesture::Dragging { anchor: at - self.pan };
                }
            }
            ViewCommand::PointerMove { x, y } => {
                let at = Point::new(*x, *y);
                if let (Gesture::Dragging { anchor }, true) = (gesture, at.is_finite()) {
                    self.pan = clamped_pan(at - anchor);
                }
            }
            ViewCommand::PointerUp | ViewCommand::PointerLeave => gesture = Gesture::Idle,
            ViewCommand::TouchStart { touches } | ViewCommand::TouchEnd { touches } => {
                gesture = self.begin_touch(touches);
            }
            ViewCommand::TouchMove { touches } => match (gesture, finite_touches(touches).as_slice()) {
                (Gesture::Dragging { anchor }, [first, ..]) => self.pan = clamped_pan(*first - anchor),
                (Gesture::Pinching { distance }, [a, b, ..]) => {
                    let now = a.distance(*b);
                    if distance > 0.0 && now > 0.0 {
                        self.zoom = zoomed(self.zoom, now / distance);
                        gesture = Gesture::Pinching { distance: now };
                    }
                }
                _ => {}
            },
        }

        gesture
    }

    fn begin_touch(&self, touches: &[Point]) -> Gesture {
        match finite_touches(touches).as_slice() {
            [] => Gesture::Idle,
            [only] => Gesture::Dragging { anchor: *only - self.pan },
            [a, b, ..] => Gesture::Pinching { distance: a.distance(*b) },
        }
    }
}

fn finite_touches(touches: &[Point]) -> Vec<Point> {
    touches.iter().copied().filter(|p| p.is_finite()).collect()
}

fn clamped_pan(pan: Point) -> Point {
    Point::new(pan.x.clamp(-PAN_LIMIT, PAN_LIMIT), pan.y.clamp(-PAN_LIMIT, PAN_LIMIT))
}

fn zoomed(current: f32, factor: f32) -> f32 {
    if !factor.is_finite() || factor <= 0.0 {
        return current;
    }
    (current * factor).clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Everything a rendering surface needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub nodes: Vec<NodePlacement>,
    pub edges: Vec<EdgePlacement>,
    pub bounds: Bounds,
    pub transform: Transform,
}

/// Owns the view state of one session. Sessions never share a controller.
#[derive(Debug, Clone)]
pub struct ViewportController {
    state: ViewState,
    gesture: Gesture,
    index: ForestIndex,
}

impl ViewportController {
    pub fn new(forest: &Forest) -> Self {
        Self {
            state: ViewState::initial(forest),
            gesture: Gesture::Idle,
            index: ForestIndex::of(forest),
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn zoom(&self) -> f32 {
        self.state.zoom
    }

    pub fn pan(&self) -> Point {
        self.state.pan
    }

    pub fn is_expanded(&self, id: &EmployeeId) -> bool {
        self.state.expanded.contains(id)
    }

    pub fn apply(&mut self, command: &ViewCommand) -> &ViewState {
        self.gesture = self.state.apply(self.gesture, &self.index, command);
        &self.state
    }

    pub fn toggle_node(&mut self, id: &EmployeeId) {
        self.apply(&ViewCommand::ToggleNode { id: id.clone() });
    }

    pub fn expand_all(&mut self) {
        self.apply(&ViewCommand::ExpandAll);
    }

    pub fn collapse_all(&mut self) {
        self.apply(&ViewCommand::CollapseAll);
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.apply(&ViewCommand::ZoomBy { factor });
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.apply(&ViewCommand::PanBy { dx, dy });
    }

    pub fn reset_view(&mut self) {
        self.apply(&ViewCommand::ResetView);
    }

    /// Zoom and pan so `bounds` fills a `width` × `height` viewport with
    /// `padding` on every side. Degenerate inputs leave the view unchanged.
    pub fn fit_to(&mut self, bounds: Bounds, width: f32, height: f32, padding: f32) {
        let avail_w = width - 2.0 * padding;
        let avail_h = height - 2.0 * padding;
        if !(bounds.width() > 0.0 && bounds.height() > 0.0 && avail_w > 0.0 && avail_h > 0.0) {
            return;
        }

        let zoom = (avail_w / bounds.width())
            .min(avail_h / bounds.height())
            .clamp(MIN_ZOOM, MAX_ZOOM);
        let center = bounds.center();
        self.state.zoom = zoom;
        self.state.pan = clamped_pan(Point::new(width / 2.0 - center.x * zoom, height / 2.0 - center.y * zoom));
    }

    /// Re-targets the controller after the staff data was rebuilt. Expanded
    /// ids that no longer exist are dropped; zoom and pan stay.
    pub fn sync_forest(&mut self, forest: &Forest) {
        let index = ForestIndex::of(forest);
        self.state.expanded.retain(|id| index.all_ids.contains(id));
        self.index = index;
    }

    pub fn render(&self, forest: &Forest, engine: &LayoutEngine) -> RenderFrame {
        let geometry = engine.layout(forest, &self.state.expanded);
        RenderFrame {
            nodes: geometry.nodes,
            edges: geometry.edges,
            bounds: geometry.bounds,
            transform: self.state.transform(),
        }
    }
}
