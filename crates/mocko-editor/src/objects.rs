//! Object helpers: insert shapes/text/images, clone, delete, erase.
//!
//! New objects are centered on the canvas and become the selection.

use crate::editor::{Editor, EditorMutation};
use crate::error::{EditorError, EditorResult};
use crate::selection::Selection;
use log::debug;
use mocko_core::geometry::intrinsic_size;
use mocko_core::validate::ImageFormat;
use mocko_core::*;
use mocko_render::hit_test_circle;

/// Basic shapes offered by the elements panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
    Line,
}

impl ShapeKind {
    fn node(self) -> SceneNode {
        match self {
            Self::Rectangle => SceneNode::with_generated_id(NodeKind::Rect {
                width: 200.0,
                height: 150.0,
                rx: 0.0,
                ry: 0.0,
            })
            .styled(Style::filled("#3b82f6")),
            Self::Circle => SceneNode::with_generated_id(NodeKind::Circle { radius: 75.0 })
                .styled(Style::filled("#10b981")),
            Self::Triangle => SceneNode::with_generated_id(NodeKind::Triangle {
                width: 150.0,
                height: 150.0,
            })
            .styled(Style::filled("#f59e0b")),
            Self::Line => SceneNode::with_generated_id(NodeKind::Line {
                x1: 0.0,
                y1: 0.0,
                x2: 200.0,
                y2: 0.0,
            })
            .styled(Style::stroked("#111827", 4.0)),
        }
    }
}

/// Text presets offered by the text panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPreset {
    Heading,
    Subheading,
    Body,
}

impl TextPreset {
    fn node(self) -> SceneNode {
        let (text, width, font_size, font_weight) = match self {
            Self::Heading => ("Add a heading", 500.0, 48.0, "bold"),
            Self::Subheading => ("Add a subheading", 400.0, 32.0, "600"),
            Self::Body => ("Add a little bit of body text", 350.0, 18.0, "normal"),
        };
        SceneNode::with_generated_id(NodeKind::Textbox {
            text: text.to_string(),
            width,
            font_size,
            font_family: "Arial".to_string(),
            font_weight: font_weight.to_string(),
            text_align: TextAlign::Left,
        })
        .styled(Style::filled("#000000"))
    }
}

impl Editor {
    pub fn add_shape(&mut self, shape: ShapeKind) -> ObjectId {
        self.insert_centered(shape.node())
    }

    pub fn add_text(&mut self, preset: TextPreset) -> ObjectId {
        self.insert_centered(preset.node())
    }

    /// Add an image. `mime` is validated before anything is inserted.
    /// Images larger than the canvas are scaled down to fit inside it.
    pub fn add_image(
        &mut self,
        src: &str,
        mime: &str,
        width: f64,
        height: f64,
    ) -> EditorResult<ObjectId> {
        ImageFormat::from_mime(mime)?;
        let (cw, ch) = self.canvas_size();
        let fit = if width > 0.0 && height > 0.0 {
            (cw / width).min(ch / height).min(1.0)
        } else {
            1.0
        };
        let mut node = SceneNode::with_generated_id(NodeKind::Image {
            src: src.to_string(),
            width,
            height,
        });
        node.transform.scale_x = fit;
        node.transform.scale_y = fit;
        Ok(self.insert_centered(node))
    }

    /// Insert at the top of the stack, centered, and select it.
    pub fn insert_centered(&mut self, mut node: SceneNode) -> ObjectId {
        let (w, h) = intrinsic_size(&node.kind);
        let (cw, ch) = self.canvas_size();
        node.transform.left = (cw - w * node.transform.scale_x) / 2.0;
        node.transform.top = (ch - h * node.transform.scale_y) / 2.0;
        let id = node.id;
        self.apply(EditorMutation::add(node));
        self.selection = Selection::Single(id);
        id
    }

    // ─── Clone / Delete ──────────────────────────────────────────────────

    /// Clone the selection. Every clone is offset by the configured clone
    /// offset on both axes and added on top; the clones become the new
    /// selection.
    pub fn clone_selection(&mut self) -> EditorResult<Vec<ObjectId>> {
        if self.selection.is_empty() {
            return Err(EditorError::NothingSelected);
        }
        let sources: Vec<ObjectId> = self.selection.ids().to_vec();
        // An active selection is discarded before its members are cloned.
        self.selection = Selection::None;

        let offset = self.config.clone_offset;
        let mut clones = Vec::with_capacity(sources.len());
        for source in sources {
            let Some(idx) = self.graph.index_of(source) else {
                continue;
            };
            let mut copy = deep_copy(&self.graph, idx);
            copy.node.transform.left += offset;
            copy.node.transform.top += offset;
            clones.push(self.insert_copy(copy, None));
        }
        debug!("cloned {} object(s)", clones.len());
        self.selection = Selection::from_ids(clones.iter().copied());
        Ok(clones)
    }

    /// Remove every selected object. Returns the removed IDs.
    pub fn delete_selection(&mut self) -> EditorResult<Vec<ObjectId>> {
        if self.selection.is_empty() {
            return Err(EditorError::NothingSelected);
        }
        let targets: Vec<ObjectId> = self.selection.ids().to_vec();
        self.selection = Selection::None;
        let removed: Vec<ObjectId> = targets
            .into_iter()
            .filter(|id| self.apply(EditorMutation::RemoveObject { id: *id }).is_some())
            .collect();
        debug!("deleted {} object(s)", removed.len());
        Ok(removed)
    }

    /// Top-level objects an eraser of `radius` at `(x, y)` removes: those
    /// whose bounding box lies strictly closer than `radius`.
    pub fn erase_targets(&self, x: f64, y: f64, radius: f64) -> Vec<ObjectId> {
        hit_test_circle(&self.graph, &self.bounds, x, y, radius)
    }

    fn insert_copy(&mut self, copy: DeepCopy, parent: Option<ObjectId>) -> ObjectId {
        let id = copy.node.id;
        self.apply(EditorMutation::AddObject {
            node: Box::new(copy.node),
            parent,
            position: None,
        });
        for child in copy.children {
            self.insert_copy(child, Some(id));
        }
        id
    }
}

/// A detached subtree with fresh IDs.
struct DeepCopy {
    node: SceneNode,
    children: Vec<DeepCopy>,
}

fn deep_copy(graph: &SceneGraph, idx: NodeIndex) -> DeepCopy {
    let source = &graph.graph[idx];
    let mut node = source.clone();
    node.id = ObjectId::generate(source.kind.type_name());
    DeepCopy {
        node,
        children: graph
            .children(idx)
            .iter()
            .map(|child| deep_copy(graph, *child))
            .collect(),
    }
}
