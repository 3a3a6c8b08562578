pub mod design;
pub mod error;
pub mod geometry;
pub mod id;
pub mod model;
pub mod snapshot;
pub mod validate;

pub use design::{DesignRecord, SaveDesignRequest, TemplateFile, TemplateInfo};
pub use error::{CoreError, CoreResult};
pub use geometry::{object_bounds, resolve_bounds};
pub use id::ObjectId;
pub use model::*;
pub use snapshot::{
    CANVAS_VERSION, CanvasDocument, Snapshot, emit_canvas_json, emit_document, load_or_default,
    parse_canvas_json, parse_document,
};

// Re-export petgraph/kurbo types so downstream crates don't need a direct dependency
pub use kurbo::Affine;
pub use petgraph::graph::NodeIndex;
