//! Backend design records and template files.
//!
//! A design stores its scene as a canvas JSON string (`canvasData`); the
//! editor decodes it on open and re-encodes it on save. Templates are canvas
//! documents carrying a `templateInfo` metadata block.

use crate::error::CoreResult;
use crate::model::SceneGraph;
use crate::snapshot::{CanvasDocument, emit_canvas_json, load_or_default, parse_document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DESIGN_NAME: &str = "Untitled Design";

/// A design as returned by `GET /v1/designs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub canvas_data: String,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_name() -> String {
    DEFAULT_DESIGN_NAME.to_string()
}

impl DesignRecord {
    /// Decode the stored scene; unreadable data opens as an empty canvas.
    pub fn scene(&self) -> SceneGraph {
        load_or_default(&self.canvas_data)
    }
}

/// Body of `POST /v1/designs`. Without `designId` the backend creates a new
/// design, otherwise it updates the existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDesignRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_id: Option<String>,
    pub name: String,
    pub canvas_data: String,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SaveDesignRequest {
    /// Build a save request from the live scene.
    pub fn from_scene(
        design_id: Option<String>,
        name: &str,
        graph: &SceneGraph,
        width: f64,
        height: f64,
    ) -> CoreResult<Self> {
        let name = if name.trim().is_empty() {
            DEFAULT_DESIGN_NAME
        } else {
            name
        };
        Ok(Self {
            design_id,
            name: name.to_string(),
            canvas_data: emit_canvas_json(graph)?,
            width,
            height,
            category: None,
        })
    }
}

/// Metadata block of a template file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// A template: canvas JSON plus its `templateInfo` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFile {
    pub template_info: TemplateInfo,
    #[serde(flatten)]
    pub canvas: CanvasDocument,
}

impl TemplateFile {
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// A fresh scene built from the template's objects.
    pub fn instantiate(&self) -> SceneGraph {
        parse_document(&self.canvas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectId;
    use crate::model::{NodeKind, SceneNode};

    #[test]
    fn design_record_from_backend_json() {
        let json = r#"{
            "_id": "665f1c",
            "name": "Poster",
            "canvasData": "{\"version\":\"5.3.0\",\"objects\":[{\"type\":\"circle\",\"id\":\"d_c\",\"radius\":3}]}",
            "width": 1080,
            "height": 1350,
            "isPremium": true,
            "createdAt": "2024-05-04T10:00:00Z"
        }"#;
        let design: DesignRecord = serde_json::from_str(json).unwrap();
        assert_eq!(design.id, "665f1c");
        assert!(design.is_premium);
        assert!(design.created_at.is_some());
        assert_eq!(design.scene().object_count(), 1);
    }

    #[test]
    fn corrupt_canvas_data_opens_empty() {
        let design = DesignRecord {
            id: "x".into(),
            name: default_name(),
            canvas_data: "{\"objects\": 12}".into(),
            width: 800.0,
            height: 600.0,
            thumbnail: None,
            category: None,
            is_premium: false,
            created_at: None,
            updated_at: None,
        };
        assert!(design.scene().is_empty());
    }

    #[test]
    fn save_request_defaults_blank_name() {
        let mut graph = SceneGraph::new();
        let root = graph.root;
        graph.add_node(
            root,
            SceneNode::new(ObjectId::intern("d_dot"), NodeKind::Circle { radius: 2.0 }),
        );
        let req = SaveDesignRequest::from_scene(None, "  ", &graph, 800.0, 600.0).unwrap();
        assert_eq!(req.name, DEFAULT_DESIGN_NAME);
        assert!(req.canvas_data.contains("\"d_dot\""));

        let body = serde_json::to_string(&req).unwrap();
        assert!(!body.contains("designId"));
    }

    #[test]
    fn template_instantiates_scene() {
        let json = r##"{
            "templateInfo": {"name": "Sale Banner", "width": 1200, "height": 628, "isPremium": false},
            "version": "5.3.0",
            "objects": [{"type": "rect", "id": "t_bg", "width": 1200, "height": 628, "fill": "#111"}]
        }"##;
        let template = TemplateFile::from_json(json).unwrap();
        assert_eq!(template.template_info.name, "Sale Banner");
        let scene = template.instantiate();
        assert!(scene.contains(ObjectId::intern("t_bg")));
    }
}
