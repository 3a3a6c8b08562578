//! Canvas JSON: the persisted and history snapshot format.
//!
//! The wire shape follows the canvas library's native serialization
//! (`{ version, objects, background }`, one flat object per entry with a
//! `type` tag) so that stored designs and templates load unchanged.
//! Emission walks the graph in z-order and is deterministic: the same scene
//! always produces byte-identical JSON.

use crate::error::CoreResult;
use crate::id::ObjectId;
use crate::model::*;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Version tag written into every emitted canvas document.
pub const CANVAS_VERSION: &str = "5.3.0";

// ─── Wire types ──────────────────────────────────────────────────────────

/// A serialized canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasDocument {
    pub version: String,
    #[serde(default)]
    pub objects: Vec<ObjectJson>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl CanvasDocument {
    pub fn empty() -> Self {
        Self {
            version: CANVAS_VERSION.to_string(),
            objects: Vec::new(),
            background: None,
        }
    }
}

/// One serialized object: type-specific fields plus shared placement/paint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectJson {
    #[serde(flatten)]
    pub shape: ShapeJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(flatten)]
    pub transform: Transform,
    #[serde(flatten)]
    pub style: Style,
}

fn default_font_weight() -> String {
    "normal".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeJson {
    Rect {
        width: f64,
        height: f64,
        #[serde(default)]
        rx: f64,
        #[serde(default)]
        ry: f64,
    },
    Circle {
        radius: f64,
    },
    Triangle {
        width: f64,
        height: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    #[serde(rename_all = "camelCase", alias = "i-text", alias = "text")]
    Textbox {
        text: String,
        width: f64,
        font_size: f64,
        font_family: String,
        #[serde(default = "default_font_weight")]
        font_weight: String,
        #[serde(default)]
        text_align: TextAlign,
    },
    Image {
        src: String,
        width: f64,
        height: f64,
    },
    Path {
        #[serde(with = "path_commands")]
        path: Vec<PathCmd>,
    },
    Group {
        #[serde(default)]
        objects: Vec<ObjectJson>,
    },
}

/// Path commands travel as `["M", x, y]` style arrays.
mod path_commands {
    use crate::model::PathCmd;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Value, json};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(cmds: &Vec<PathCmd>, serializer: S) -> Result<S::Ok, S::Error> {
        let segments: Vec<Value> = cmds
            .iter()
            .map(|cmd| match *cmd {
                PathCmd::MoveTo(x, y) => json!(["M", x, y]),
                PathCmd::LineTo(x, y) => json!(["L", x, y]),
                PathCmd::QuadTo(cx, cy, x, y) => json!(["Q", cx, cy, x, y]),
                PathCmd::Close => json!(["Z"]),
            })
            .collect();
        segments.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<PathCmd>, D::Error> {
        let segments = Vec::<Vec<Value>>::deserialize(deserializer)?;
        segments
            .iter()
            .map(|segment| {
                let (op, args) = segment
                    .split_first()
                    .ok_or_else(|| D::Error::custom("empty path segment"))?;
                let op = op
                    .as_str()
                    .ok_or_else(|| D::Error::custom("path op must be a string"))?;
                let nums = args
                    .iter()
                    .map(|v| v.as_f64().ok_or_else(|| D::Error::custom("path arg must be a number")))
                    .collect::<Result<Vec<f64>, _>>()?;
                match (op, nums.as_slice()) {
                    ("M", [x, y]) => Ok(PathCmd::MoveTo(*x, *y)),
                    ("L", [x, y]) => Ok(PathCmd::LineTo(*x, *y)),
                    ("Q", [cx, cy, x, y]) => Ok(PathCmd::QuadTo(*cx, *cy, *x, *y)),
                    ("Z" | "z", []) => Ok(PathCmd::Close),
                    _ => Err(D::Error::custom(format!("unsupported path segment `{op}`"))),
                }
            })
            .collect()
    }
}

// ─── Snapshot ────────────────────────────────────────────────────────────

/// One undo/redo history entry: the whole canvas plus the zoom it was
/// captured at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub canvas: CanvasDocument,
    pub zoom_level: f64,
}

impl Snapshot {
    pub fn capture(graph: &SceneGraph, zoom_level: f64) -> Self {
        Self {
            canvas: emit_document(graph),
            zoom_level,
        }
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ─── Document → Graph ────────────────────────────────────────────────────

/// Build a scene graph from a canvas document.
///
/// Objects without an ID, or whose ID is already taken, get a freshly
/// generated one.
pub fn parse_document(doc: &CanvasDocument) -> SceneGraph {
    let mut graph = SceneGraph::new();
    graph.background = doc.background.clone();
    let root = graph.root;
    for object in &doc.objects {
        insert_object(&mut graph, root, object);
    }
    graph
}

/// Parse canvas JSON text into a scene graph.
///
/// # Errors
/// Returns [`crate::CoreError::CanvasJson`] if the text is not a canvas document.
pub fn parse_canvas_json(json: &str) -> CoreResult<SceneGraph> {
    let doc: CanvasDocument = serde_json::from_str(json)?;
    Ok(parse_document(&doc))
}

/// Parse canvas JSON, falling back to an empty canvas when it is unusable.
pub fn load_or_default(json: &str) -> SceneGraph {
    if json.trim().is_empty() {
        return SceneGraph::new();
    }
    match parse_canvas_json(json) {
        Ok(graph) => graph,
        Err(err) => {
            log::warn!("falling back to an empty canvas: {err}");
            SceneGraph::new()
        }
    }
}

fn insert_object(graph: &mut SceneGraph, parent: NodeIndex, object: &ObjectJson) {
    let (kind, members) = match &object.shape {
        ShapeJson::Rect {
            width,
            height,
            rx,
            ry,
        } => (
            NodeKind::Rect {
                width: *width,
                height: *height,
                rx: *rx,
                ry: *ry,
            },
            None,
        ),
        ShapeJson::Circle { radius } => (NodeKind::Circle { radius: *radius }, None),
        ShapeJson::Triangle { width, height } => (
            NodeKind::Triangle {
                width: *width,
                height: *height,
            },
            None,
        ),
        ShapeJson::Line { x1, y1, x2, y2 } => (
            NodeKind::Line {
                x1: *x1,
                y1: *y1,
                x2: *x2,
                y2: *y2,
            },
            None,
        ),
        ShapeJson::Textbox {
            text,
            width,
            font_size,
            font_family,
            font_weight,
            text_align,
        } => (
            NodeKind::Textbox {
                text: text.clone(),
                width: *width,
                font_size: *font_size,
                font_family: font_family.clone(),
                font_weight: font_weight.clone(),
                text_align: *text_align,
            },
            None,
        ),
        ShapeJson::Image { src, width, height } => (
            NodeKind::Image {
                src: src.clone(),
                width: *width,
                height: *height,
            },
            None,
        ),
        ShapeJson::Path { path } => (
            NodeKind::Path {
                commands: path.clone(),
            },
            None,
        ),
        ShapeJson::Group { objects } => (NodeKind::Group, Some(objects)),
    };

    let id = match object.id {
        Some(id) if !id.is_root() && !graph.id_index.contains_key(&id) => id,
        Some(id) => {
            log::warn!("duplicate object id `{id}`, assigning a new one");
            ObjectId::generate(kind.type_name())
        }
        None => ObjectId::generate(kind.type_name()),
    };

    let node = SceneNode {
        id,
        kind,
        transform: object.transform,
        style: object.style.clone(),
    };
    let idx = graph.add_node(parent, node);
    for member in members.into_iter().flatten() {
        insert_object(graph, idx, member);
    }
}

// ─── Graph → Document ────────────────────────────────────────────────────

/// Serialize a scene graph into a canvas document.
pub fn emit_document(graph: &SceneGraph) -> CanvasDocument {
    CanvasDocument {
        version: CANVAS_VERSION.to_string(),
        objects: graph
            .top_level()
            .iter()
            .map(|idx| emit_node(graph, *idx))
            .collect(),
        background: graph.background.clone(),
    }
}

/// Serialize a single node (and its members, for groups).
pub fn emit_node(graph: &SceneGraph, idx: NodeIndex) -> ObjectJson {
    let node = &graph.graph[idx];
    let shape = match &node.kind {
        NodeKind::Rect {
            width,
            height,
            rx,
            ry,
        } => ShapeJson::Rect {
            width: *width,
            height: *height,
            rx: *rx,
            ry: *ry,
        },
        NodeKind::Circle { radius } => ShapeJson::Circle { radius: *radius },
        NodeKind::Triangle { width, height } => ShapeJson::Triangle {
            width: *width,
            height: *height,
        },
        NodeKind::Line { x1, y1, x2, y2 } => ShapeJson::Line {
            x1: *x1,
            y1: *y1,
            x2: *x2,
            y2: *y2,
        },
        NodeKind::Textbox {
            text,
            width,
            font_size,
            font_family,
            font_weight,
            text_align,
        } => ShapeJson::Textbox {
            text: text.clone(),
            width: *width,
            font_size: *font_size,
            font_family: font_family.clone(),
            font_weight: font_weight.clone(),
            text_align: *text_align,
        },
        NodeKind::Image { src, width, height } => ShapeJson::Image {
            src: src.clone(),
            width: *width,
            height: *height,
        },
        NodeKind::Path { commands } => ShapeJson::Path {
            path: commands.clone(),
        },
        NodeKind::Group | NodeKind::Root => ShapeJson::Group {
            objects: graph
                .children(idx)
                .iter()
                .map(|child| emit_node(graph, *child))
                .collect(),
        },
    };
    ObjectJson {
        shape,
        id: Some(node.id),
        transform: node.transform,
        style: node.style.clone(),
    }
}

/// Serialize a scene graph to canvas JSON text.
pub fn emit_canvas_json(graph: &SceneGraph) -> CoreResult<String> {
    Ok(serde_json::to_string(&emit_document(graph))?)
}
