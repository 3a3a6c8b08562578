//! Scene-graph data model for Mocko designs.
//!
//! A design is an ordered tree of drawable objects hanging off an implicit
//! root. Child order is z-order: the last child paints on top. Groups own
//! their children through graph edges; every other kind is a leaf.
//! Object geometry follows the canvas convention of a `left`/`top` origin
//! with scale and rotation (degrees) applied around it.

use crate::id::ObjectId;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Transform & Style ───────────────────────────────────────────────────

/// Placement of an object relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transform {
    pub left: f64,
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Rotation in degrees, clockwise.
    pub angle: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

impl Transform {
    pub fn at(left: f64, top: f64) -> Self {
        Self {
            left,
            top,
            ..Self::default()
        }
    }
}

/// Paint properties. Colors are kept as CSS color strings so that a loaded
/// document re-serializes exactly as it came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            opacity: 1.0,
        }
    }
}

impl Style {
    pub fn filled(color: &str) -> Self {
        Self {
            fill: Some(color.to_string()),
            ..Self::default()
        }
    }

    pub fn stroked(color: &str, width: f64) -> Self {
        Self {
            stroke: Some(color.to_string()),
            stroke_width: width,
            ..Self::default()
        }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }
}

/// Line height multiplier used to size text boxes.
pub const TEXT_LINE_HEIGHT: f64 = 1.16;

// ─── Paths ───────────────────────────────────────────────────────────────

/// A single path command in the object's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    Close,
}

impl PathCmd {
    /// The end point of the command, if it has one.
    pub fn end_point(&self) -> Option<(f64, f64)> {
        match *self {
            PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) | PathCmd::QuadTo(_, _, x, y) => {
                Some((x, y))
            }
            PathCmd::Close => None,
        }
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The kind of a scene object and its intrinsic geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The implicit canvas root. Never serialized.
    Root,
    Rect {
        width: f64,
        height: f64,
        rx: f64,
        ry: f64,
    },
    Circle {
        radius: f64,
    },
    Triangle {
        width: f64,
        height: f64,
    },
    /// Segment between two local points.
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Textbox {
        text: String,
        width: f64,
        font_size: f64,
        font_family: String,
        font_weight: String,
        text_align: TextAlign,
    },
    Image {
        src: String,
        width: f64,
        height: f64,
    },
    Path {
        commands: Vec<PathCmd>,
    },
    /// Container; its members are graph children.
    Group,
}

impl NodeKind {
    /// Canvas type tag, also used as the prefix for generated IDs.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Rect { .. } => "rect",
            NodeKind::Circle { .. } => "circle",
            NodeKind::Triangle { .. } => "triangle",
            NodeKind::Line { .. } => "line",
            NodeKind::Textbox { .. } => "textbox",
            NodeKind::Image { .. } => "image",
            NodeKind::Path { .. } => "path",
            NodeKind::Group => "group",
        }
    }
}

/// A single drawable object.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: ObjectId,
    pub kind: NodeKind,
    pub transform: Transform,
    pub style: Style,
}

impl SceneNode {
    pub fn new(id: ObjectId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            transform: Transform::default(),
            style: Style::default(),
        }
    }

    /// New node with a freshly generated ID derived from its kind.
    pub fn with_generated_id(kind: NodeKind) -> Self {
        let id = ObjectId::generate(kind.type_name());
        Self::new(id, kind)
    }

    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.transform.left = left;
        self.transform.top = top;
        self
    }

    pub fn styled(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

// ─── Scene Graph ─────────────────────────────────────────────────────────

type ChildList = SmallVec<[NodeIndex; 8]>;

/// The complete design: an ordered tree of `SceneNode` values.
///
/// Edges go from parent to child. Child order is tracked explicitly so
/// z-order survives removals and reorders.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub graph: StableDiGraph<SceneNode, ()>,
    pub root: NodeIndex,
    /// Index from ObjectId to NodeIndex for fast lookup.
    pub id_index: HashMap<ObjectId, NodeIndex>,
    /// Canvas background color.
    pub background: Option<String>,
    child_order: HashMap<NodeIndex, ChildList>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(SceneNode::new(ObjectId::root(), NodeKind::Root));

        let mut id_index = HashMap::new();
        id_index.insert(ObjectId::root(), root);

        Self {
            graph,
            root,
            id_index,
            background: None,
            child_order: HashMap::new(),
        }
    }

    /// Append a node as the topmost child of `parent`.
    pub fn add_node(&mut self, parent: NodeIndex, node: SceneNode) -> NodeIndex {
        let end = self.children(parent).len();
        self.insert_node(parent, end, node)
    }

    /// Insert a node as a child of `parent` at z-position `position`
    /// (clamped to the number of existing children).
    pub fn insert_node(&mut self, parent: NodeIndex, position: usize, node: SceneNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.id_index.insert(id, idx);
        let order = self.child_order.entry(parent).or_default();
        let position = position.min(order.len());
        order.insert(position, idx);
        idx
    }

    /// Remove a node and its whole subtree. Returns the removed node.
    pub fn remove_node(&mut self, idx: NodeIndex) -> Option<SceneNode> {
        if idx == self.root || !self.graph.contains_node(idx) {
            return None;
        }
        for child in self.children(idx).to_vec() {
            self.remove_node(child);
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|c| *c != idx);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
        }
        removed
    }

    pub fn get_by_id(&self, id: ObjectId) -> Option<&SceneNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_by_id_mut(&mut self, id: ObjectId) -> Option<&mut SceneNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: ObjectId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        !id.is_root() && self.id_index.contains_key(&id)
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of a node in z-order (bottom first).
    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order
            .get(&idx)
            .map(|order| order.as_slice())
            .unwrap_or(&[])
    }

    /// Top-level objects in z-order.
    pub fn top_level(&self) -> &[NodeIndex] {
        self.children(self.root)
    }

    /// IDs of top-level objects in z-order.
    pub fn top_level_ids(&self) -> Vec<ObjectId> {
        self.top_level().iter().map(|idx| self.graph[*idx].id).collect()
    }

    /// Z-position of a node among its siblings.
    pub fn position(&self, idx: NodeIndex) -> Option<usize> {
        let parent = self.parent(idx)?;
        self.children(parent).iter().position(|c| *c == idx)
    }

    /// Number of objects, excluding the root.
    pub fn object_count(&self) -> usize {
        self.graph.node_count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.object_count() == 0
    }

    /// Remove every object, keeping the background.
    pub fn clear(&mut self) {
        for idx in self.top_level().to_vec() {
            self.remove_node(idx);
        }
    }

    /// Move a child one step backward in z-order. Returns true if it moved.
    pub fn send_backward(&mut self, child: NodeIndex) -> bool {
        match self.position(child) {
            Some(pos) if pos > 0 => self.move_child(child, pos - 1),
            _ => false,
        }
    }

    /// Move a child one step forward in z-order. Returns true if it moved.
    pub fn bring_forward(&mut self, child: NodeIndex) -> bool {
        match self.position(child) {
            Some(pos) => self.move_child(child, pos + 1),
            None => false,
        }
    }

    pub fn send_to_back(&mut self, child: NodeIndex) -> bool {
        self.move_child(child, 0)
    }

    pub fn bring_to_front(&mut self, child: NodeIndex) -> bool {
        self.move_child(child, usize::MAX)
    }

    /// Move `child` to z-position `to` (clamped). Returns true if it moved.
    fn move_child(&mut self, child: NodeIndex, to: usize) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        let Some(order) = self.child_order.get_mut(&parent) else {
            return false;
        };
        let Some(from) = order.iter().position(|c| *c == child) else {
            return false;
        };
        let to = to.min(order.len() - 1);
        if from == to {
            return false;
        }
        let moved = order.remove(from);
        order.insert(to, moved);
        true
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// AABB overlap test.
    pub fn intersects_rect(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Minimum Euclidean distance from a point to this box (0 inside).
    pub fn distance_to_point(&self, px: f64, py: f64) -> f64 {
        let dx = (self.x - px).max(0.0).max(px - self.right());
        let dy = (self.y - py).max(0.0).max(py - self.bottom());
        dx.hypot(dy)
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}
