pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod history;
pub mod input;
pub mod objects;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod tools;
pub mod viewport;

pub use config::EditorConfig;
pub use editor::{Editor, EditorMutation, MutationEvent, ZOrder};
pub use error::{EditorError, EditorResult};
pub use export::{ExportFormat, ExportPayload};
pub use history::HistoryManager;
pub use objects::{ShapeKind, TextPreset};
pub use selection::Selection;
pub use session::EditorSession;
pub use viewport::{CenteringLayout, ContainerMetrics, ViewportManager, ZoomStyle};
