//! The editor engine: authoritative scene, selection and viewport.
//!
//! All edits flow through [`Editor::apply`] as [`EditorMutation`] values.
//! Each applied mutation records a [`MutationEvent`]; the history manager
//! drains those events to decide when to snapshot.

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::selection::Selection;
use crate::viewport::{CenteringLayout, ContainerMetrics, ViewportManager};
use log::{debug, warn};
use mocko_core::geometry::union_bounds;
use mocko_core::validate::{validate_color, validate_dimensions};
use mocko_core::*;
use std::collections::HashMap;

/// A change notification, emitted once per applied mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationEvent {
    ObjectAdded(ObjectId),
    ObjectRemoved(ObjectId),
    ObjectModified(ObjectId),
    /// A freehand stroke was committed as a path object.
    PathCreated(ObjectId),
    /// Canvas-level property (background) changed.
    CanvasModified,
}

impl MutationEvent {
    pub fn is_path(&self) -> bool {
        matches!(self, Self::PathCreated(_))
    }
}

/// Stacking-order change for a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZOrder {
    Forward,
    Backward,
    Front,
    Back,
}

/// An atomic edit to the scene.
#[derive(Debug, Clone)]
pub enum EditorMutation {
    AddObject {
        node: Box<SceneNode>,
        /// Parent group; `None` adds at the top level.
        parent: Option<ObjectId>,
        /// Stacking position among siblings; `None` appends on top.
        position: Option<usize>,
    },
    RemoveObject {
        id: ObjectId,
    },
    MoveObject {
        id: ObjectId,
        dx: f64,
        dy: f64,
    },
    SetPosition {
        id: ObjectId,
        left: f64,
        top: f64,
    },
    ScaleObject {
        id: ObjectId,
        scale_x: f64,
        scale_y: f64,
    },
    RotateObject {
        id: ObjectId,
        /// Degrees, clockwise.
        angle: f64,
    },
    SetStyle {
        id: ObjectId,
        style: Style,
    },
    SetText {
        id: ObjectId,
        text: String,
    },
    Reorder {
        id: ObjectId,
        order: ZOrder,
    },
    SetBackground {
        color: Option<String>,
    },
}

impl EditorMutation {
    pub fn add(node: SceneNode) -> Self {
        Self::AddObject {
            node: Box::new(node),
            parent: None,
            position: None,
        }
    }
}

pub struct Editor {
    /// The current scene (single source of truth).
    pub graph: SceneGraph,

    /// Scene-space AABBs, recomputed after every mutation.
    pub bounds: HashMap<NodeIndex, Bounds>,

    pub selection: Selection,

    pub viewport: ViewportManager,

    pub config: EditorConfig,

    width: f64,
    height: f64,

    /// Events recorded since the last drain.
    events: Vec<MutationEvent>,
}

impl Editor {
    /// Create an empty canvas of the given size.
    pub fn new(width: f64, height: f64, config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        validate_dimensions(width, height, config.min_canvas_size, config.max_canvas_size)?;
        Ok(Self::with_scene(SceneGraph::new(), width, height, config))
    }

    /// Open a stored design. Unreadable canvas data opens as an empty canvas.
    pub fn from_design(record: &DesignRecord, config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        validate_dimensions(
            record.width,
            record.height,
            config.min_canvas_size,
            config.max_canvas_size,
        )?;
        Ok(Self::with_scene(record.scene(), record.width, record.height, config))
    }

    /// Start a new design from a template.
    pub fn from_template(template: &TemplateFile, config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        let info = &template.template_info;
        validate_dimensions(info.width, info.height, config.min_canvas_size, config.max_canvas_size)?;
        Ok(Self::with_scene(template.instantiate(), info.width, info.height, config))
    }

    fn with_scene(graph: SceneGraph, width: f64, height: f64, config: EditorConfig) -> Self {
        let bounds = resolve_bounds(&graph);
        Self {
            graph,
            bounds,
            selection: Selection::None,
            viewport: ViewportManager::new(&config),
            config,
            width,
            height,
            events: Vec::new(),
        }
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Resize the canvas. Rejected sizes leave the canvas unchanged.
    pub fn resize_canvas(&mut self, width: f64, height: f64) -> EditorResult<()> {
        validate_dimensions(
            width,
            height,
            self.config.min_canvas_size,
            self.config.max_canvas_size,
        )?;
        self.width = width;
        self.height = height;
        self.recenter();
        Ok(())
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply a mutation and record its event.
    ///
    /// Returns `None` when the mutation was a no-op (unknown target, a
    /// reorder that changed nothing, text on a non-text object).
    pub fn apply(&mut self, mutation: EditorMutation) -> Option<MutationEvent> {
        let event = self.apply_inner(mutation)?;
        self.bounds = resolve_bounds(&self.graph);
        self.events.push(event);
        Some(event)
    }

    fn apply_inner(&mut self, mutation: EditorMutation) -> Option<MutationEvent> {
        match mutation {
            EditorMutation::AddObject {
                node,
                parent,
                position,
            } => {
                let id = node.id;
                if id.is_root() || self.graph.contains(id) {
                    warn!("refusing to add {id}: id already in use");
                    return None;
                }
                let parent_idx = match parent {
                    Some(pid) => self.graph.index_of(pid)?,
                    None => self.graph.root,
                };
                let is_path = matches!(node.kind, NodeKind::Path { .. });
                match position {
                    Some(pos) => self.graph.insert_node(parent_idx, pos, *node),
                    None => self.graph.add_node(parent_idx, *node),
                };
                Some(if is_path {
                    MutationEvent::PathCreated(id)
                } else {
                    MutationEvent::ObjectAdded(id)
                })
            }
            EditorMutation::RemoveObject { id } => {
                let idx = self.graph.index_of(id)?;
                self.graph.remove_node(idx)?;
                self.selection.retain_existing(&self.graph);
                Some(MutationEvent::ObjectRemoved(id))
            }
            EditorMutation::MoveObject { id, dx, dy } => {
                let node = self.object_mut(id)?;
                node.transform.left += dx;
                node.transform.top += dy;
                Some(MutationEvent::ObjectModified(id))
            }
            EditorMutation::SetPosition { id, left, top } => {
                let node = self.object_mut(id)?;
                node.transform.left = left;
                node.transform.top = top;
                Some(MutationEvent::ObjectModified(id))
            }
            EditorMutation::ScaleObject {
                id,
                scale_x,
                scale_y,
            } => {
                if !scale_x.is_finite() || !scale_y.is_finite() {
                    return None;
                }
                let node = self.object_mut(id)?;
                node.transform.scale_x = scale_x;
                node.transform.scale_y = scale_y;
                Some(MutationEvent::ObjectModified(id))
            }
            EditorMutation::RotateObject { id, angle } => {
                if !angle.is_finite() {
                    return None;
                }
                let node = self.object_mut(id)?;
                node.transform.angle = angle.rem_euclid(360.0);
                Some(MutationEvent::ObjectModified(id))
            }
            EditorMutation::SetStyle { id, style } => {
                let node = self.object_mut(id)?;
                node.style = style;
                Some(MutationEvent::ObjectModified(id))
            }
            EditorMutation::SetText { id, text } => {
                let node = self.object_mut(id)?;
                match &mut node.kind {
                    NodeKind::Textbox { text: current, .. } => *current = text,
                    _ => return None,
                }
                Some(MutationEvent::ObjectModified(id))
            }
            EditorMutation::Reorder { id, order } => {
                let idx = self.graph.index_of(id)?;
                let moved = match order {
                    ZOrder::Forward => self.graph.bring_forward(idx),
                    ZOrder::Backward => self.graph.send_backward(idx),
                    ZOrder::Front => self.graph.bring_to_front(idx),
                    ZOrder::Back => self.graph.send_to_back(idx),
                };
                moved.then_some(MutationEvent::ObjectModified(id))
            }
            EditorMutation::SetBackground { color } => {
                if self.graph.background == color {
                    return None;
                }
                self.graph.background = color;
                Some(MutationEvent::CanvasModified)
            }
        }
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneNode> {
        if id.is_root() {
            return None;
        }
        self.graph.get_by_id_mut(id)
    }

    /// Apply a mutation that must hit an existing object.
    pub fn apply_to(&mut self, mutation: EditorMutation, id: ObjectId) -> EditorResult<MutationEvent> {
        if !self.graph.contains(id) {
            return Err(EditorError::ObjectNotFound(id));
        }
        self.apply(mutation).ok_or(EditorError::ObjectNotFound(id))
    }

    /// Set an object's fill after validating the color.
    pub fn set_fill(&mut self, id: ObjectId, color: &str) -> EditorResult<()> {
        validate_color(color)?;
        let mut style = self
            .graph
            .get_by_id(id)
            .map(|node| node.style.clone())
            .ok_or(EditorError::ObjectNotFound(id))?;
        style.fill = Some(color.to_string());
        self.apply_to(EditorMutation::SetStyle { id, style }, id)?;
        Ok(())
    }

    /// Set the canvas background after validating the color.
    pub fn set_background(&mut self, color: &str) -> EditorResult<()> {
        validate_color(color)?;
        self.apply(EditorMutation::SetBackground {
            color: Some(color.to_string()),
        });
        Ok(())
    }

    /// Take all events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<MutationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select the given top-level objects. Unknown IDs and group members
    /// are ignored.
    pub fn select(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        let graph = &self.graph;
        self.selection = Selection::from_ids(ids.into_iter().filter(|id| {
            graph
                .index_of(*id)
                .is_some_and(|idx| graph.parent(idx) == Some(graph.root))
        }));
    }

    pub fn select_all(&mut self) {
        self.selection = Selection::from_ids(self.graph.top_level_ids());
    }

    pub fn deselect(&mut self) {
        self.selection = Selection::None;
    }

    pub fn object_bounds(&self, id: ObjectId) -> Option<Bounds> {
        let idx = self.graph.index_of(id)?;
        self.bounds.get(&idx).copied()
    }

    /// Union of the selected objects' bounds.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        let nodes: Vec<NodeIndex> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.graph.index_of(*id))
            .collect();
        union_bounds(&self.bounds, &nodes)
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom()
    }

    pub fn set_container(&mut self, metrics: ContainerMetrics) -> Option<CenteringLayout> {
        self.viewport.set_container(metrics);
        self.recenter()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let zoom = self.viewport.set_zoom(zoom);
        self.recenter();
        zoom
    }

    pub fn zoom_in(&mut self) -> f64 {
        let zoom = self.viewport.zoom_in();
        self.recenter();
        zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        let zoom = self.viewport.zoom_out();
        self.recenter();
        zoom
    }

    pub fn zoom_to_fit(&mut self) -> f64 {
        let zoom = self.viewport.zoom_to_fit(self.width, self.height);
        self.recenter();
        zoom
    }

    pub fn recenter(&mut self) -> Option<CenteringLayout> {
        self.viewport.center(self.width, self.height)
    }

    // ─── Serialization ───────────────────────────────────────────────────

    pub fn canvas_json(&self) -> EditorResult<String> {
        Ok(emit_canvas_json(&self.graph)?)
    }

    /// Serialize scene and zoom as a history snapshot.
    pub fn snapshot_json(&self) -> EditorResult<String> {
        Ok(Snapshot::capture(&self.graph, self.zoom()).to_json()?)
    }

    /// Replace the scene with a history snapshot, restore its zoom and
    /// re-center. The snapshot is fully parsed before anything changes, so
    /// an error leaves the editor untouched.
    pub fn load_snapshot(&mut self, json: &str) -> EditorResult<()> {
        let snapshot = Snapshot::from_json(json)?;
        let graph = parse_document(&snapshot.canvas);
        self.replace_scene(graph);
        self.viewport.set_zoom(snapshot.zoom_level);
        self.recenter();
        debug!(
            "loaded snapshot: {} objects at zoom {}",
            self.graph.object_count(),
            self.zoom()
        );
        Ok(())
    }

    /// Replace the scene with canvas JSON (e.g. opening a design).
    pub fn load_canvas_json(&mut self, json: &str) -> EditorResult<()> {
        let graph = parse_canvas_json(json)?;
        self.replace_scene(graph);
        Ok(())
    }

    fn replace_scene(&mut self, graph: SceneGraph) {
        self.graph = graph;
        self.bounds = resolve_bounds(&self.graph);
        self.selection = Selection::None;
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn editor() -> Editor {
        Editor::new(800.0, 600.0, EditorConfig::default()).unwrap()
    }

    fn rect(id: &str) -> SceneNode {
        SceneNode::new(ObjectId::intern(id), NodeKind::Rect {
            width: 100.0,
            height: 50.0,
            rx: 0.0,
            ry: 0.0,
        })
    }

    #[test]
    fn rejects_out_of_range_canvas() {
        assert!(Editor::new(10.0, 600.0, EditorConfig::default()).is_err());
        assert!(Editor::new(800.0, 6000.0, EditorConfig::default()).is_err());
    }

    #[test]
    fn add_records_event_and_bounds() {
        let mut ed = editor();
        let event = ed.apply(EditorMutation::add(rect("ed_add").at(10.0, 20.0)));
        let id = ObjectId::intern("ed_add");
        assert_eq!(event, Some(MutationEvent::ObjectAdded(id)));
        assert_eq!(ed.object_bounds(id), Some(Bounds::new(10.0, 20.0, 100.0, 50.0)));
        assert_eq!(ed.drain_events(), vec![MutationEvent::ObjectAdded(id)]);
        assert!(!ed.has_pending_events());
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let mut ed = editor();
        ed.apply(EditorMutation::add(rect("ed_dup")));
        assert_eq!(ed.apply(EditorMutation::add(rect("ed_dup"))), None);
        assert_eq!(ed.graph.object_count(), 1);
    }

    #[test]
    fn path_add_emits_path_created() {
        let mut ed = editor();
        let node = SceneNode::new(ObjectId::intern("ed_path"), NodeKind::Path {
            commands: vec![PathCmd::MoveTo(0.0, 0.0), PathCmd::LineTo(5.0, 5.0)],
        });
        let event = ed.apply(EditorMutation::add(node));
        assert!(event.is_some_and(|e| e.is_path()));
    }

    #[test]
    fn move_and_rotate_update_transform() {
        let mut ed = editor();
        let id = ObjectId::intern("ed_move");
        ed.apply(EditorMutation::add(rect("ed_move")));
        ed.apply(EditorMutation::MoveObject { id, dx: 5.0, dy: -3.0 });
        ed.apply(EditorMutation::RotateObject { id, angle: -90.0 });
        let node = ed.graph.get_by_id(id).unwrap();
        assert_eq!((node.transform.left, node.transform.top), (5.0, -3.0));
        assert_eq!(node.transform.angle, 270.0);
    }

    #[test]
    fn mutations_on_missing_objects_are_no_ops() {
        let mut ed = editor();
        let ghost = ObjectId::intern("ed_ghost");
        assert_eq!(ed.apply(EditorMutation::RemoveObject { id: ghost }), None);
        assert_eq!(
            ed.apply(EditorMutation::MoveObject {
                id: ObjectId::root(),
                dx: 1.0,
                dy: 1.0
            }),
            None
        );
        assert!(matches!(
            ed.apply_to(EditorMutation::RemoveObject { id: ghost }, ghost),
            Err(EditorError::ObjectNotFound(_))
        ));
        assert!(ed.drain_events().is_empty());
    }

    #[test]
    fn remove_prunes_selection() {
        let mut ed = editor();
        ed.apply(EditorMutation::add(rect("ed_rm_a")));
        ed.apply(EditorMutation::add(rect("ed_rm_b")));
        ed.select_all();
        ed.apply(EditorMutation::RemoveObject {
            id: ObjectId::intern("ed_rm_a"),
        });
        assert_eq!(ed.selection, Selection::Single(ObjectId::intern("ed_rm_b")));
    }

    #[test]
    fn group_members_are_not_selectable() {
        let mut ed = editor();
        let group = ObjectId::intern("ed_sel_g");
        let member = ObjectId::intern("ed_sel_m");
        ed.apply(EditorMutation::add(SceneNode::new(group, NodeKind::Group)));
        ed.apply(EditorMutation::AddObject {
            node: Box::new(rect("ed_sel_m")),
            parent: Some(group),
            position: None,
        });
        ed.select([member]);
        assert_eq!(ed.selection, Selection::None);
        ed.select([member, group]);
        assert_eq!(ed.selection, Selection::Single(group));
    }

    #[test]
    fn reorder_without_change_emits_nothing() {
        let mut ed = editor();
        ed.apply(EditorMutation::add(rect("ed_z_a")));
        ed.apply(EditorMutation::add(rect("ed_z_b")));
        ed.drain_events();
        let top = ObjectId::intern("ed_z_b");
        assert_eq!(
            ed.apply(EditorMutation::Reorder {
                id: top,
                order: ZOrder::Front
            }),
            None
        );
        ed.apply(EditorMutation::Reorder {
            id: top,
            order: ZOrder::Back,
        });
        assert_eq!(ed.graph.top_level_ids()[0], top);
    }

    #[test]
    fn invalid_colors_are_rejected_before_mutation() {
        let mut ed = editor();
        let id = ObjectId::intern("ed_color");
        ed.apply(EditorMutation::add(rect("ed_color")));
        ed.drain_events();
        assert!(ed.set_fill(id, "#12345").is_err());
        assert!(ed.set_background("not a color!").is_err());
        assert!(ed.drain_events().is_empty());
        ed.set_fill(id, "#abcdef").unwrap();
        assert_eq!(ed.graph.get_by_id(id).unwrap().style.fill.as_deref(), Some("#abcdef"));
    }

    #[test]
    fn set_text_only_applies_to_textboxes() {
        let mut ed = editor();
        let id = ObjectId::intern("ed_txt_rect");
        ed.apply(EditorMutation::add(rect("ed_txt_rect")));
        let event = ed.apply(EditorMutation::SetText {
            id,
            text: "nope".into(),
        });
        assert_eq!(event, None);
    }

    #[test]
    fn failed_snapshot_load_leaves_scene_untouched() {
        let mut ed = editor();
        ed.apply(EditorMutation::add(rect("ed_keep")));
        let before = ed.canvas_json().unwrap();
        assert!(ed.load_snapshot("{\"canvas\": 42}").is_err());
        assert_eq!(ed.canvas_json().unwrap(), before);
    }

    #[test]
    fn snapshot_restores_zoom() {
        let mut ed = editor();
        ed.set_zoom(2.0);
        let snap = ed.snapshot_json().unwrap();
        ed.set_zoom(0.5);
        ed.load_snapshot(&snap).unwrap();
        assert_eq!(ed.zoom(), 2.0);
    }

    #[test]
    fn resize_is_validated() {
        let mut ed = editor();
        assert!(ed.resize_canvas(0.0, 100.0).is_err());
        assert_eq!(ed.canvas_size(), (800.0, 600.0));
        ed.resize_canvas(1920.0, 1080.0).unwrap();
        assert_eq!(ed.canvas_size(), (1920.0, 1080.0));
    }
}
