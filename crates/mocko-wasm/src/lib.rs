//! WASM bridge for Mocko — exposes the editor engine to the web UI.
//!
//! Compiled via `wasm-pack build --target web`. The host owns the DOM
//! (scroll container, `<canvas>`, file pickers, downloads, network) and
//! forwards input here; every call that takes `now_ms` expects
//! `performance.now()`.

mod render2d;

use mocko_core::{DesignRecord, SaveDesignRequest, TemplateFile};
use mocko_editor::input::{InputEvent, Modifiers};
use mocko_editor::tools::ToolKind;
use mocko_editor::{
    ContainerMetrics, Editor, EditorConfig, EditorError, EditorSession, ExportFormat,
    ExportPayload, ShapeKind, TextPreset,
};
use render2d::{ImageCache, Overlay};
use serde_json::json;
use std::time::Duration;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Holds the editing session (editor, history, tools). All interaction from
/// the web UI goes through this struct.
#[wasm_bindgen]
pub struct MockoCanvas {
    session: EditorSession,
    design_name: String,
    images: ImageCache,
    /// Clock of the most recent host call, for edits that arrive without one.
    now: Duration,
}

#[wasm_bindgen]
impl MockoCanvas {
    /// Create a blank canvas. `config_json` may be empty for defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64, config_json: &str) -> Result<MockoCanvas, JsValue> {
        init_once();
        let config = parse_config(config_json)?;
        let session = EditorSession::blank(width, height, config).map_err(js_error)?;
        Ok(Self::with_session(session, "Untitled Design"))
    }

    /// Open a design record as returned by the backend.
    pub fn from_design(record_json: &str, config_json: &str) -> Result<MockoCanvas, JsValue> {
        init_once();
        let record: DesignRecord = serde_json::from_str(record_json).map_err(js_error)?;
        let editor = Editor::from_design(&record, parse_config(config_json)?).map_err(js_error)?;
        let session = EditorSession::new(editor).map_err(js_error)?;
        Ok(Self::with_session(session, &record.name))
    }

    /// Start a new design from a template file.
    pub fn from_template(template_json: &str, config_json: &str) -> Result<MockoCanvas, JsValue> {
        init_once();
        let template: TemplateFile = serde_json::from_str(template_json).map_err(js_error)?;
        let editor =
            Editor::from_template(&template, parse_config(config_json)?).map_err(js_error)?;
        let session = EditorSession::new(editor).map_err(js_error)?;
        Ok(Self::with_session(session, &template.template_info.name))
    }

    // ─── Document ────────────────────────────────────────────────────────

    pub fn design_name(&self) -> String {
        self.design_name.clone()
    }

    pub fn set_design_name(&mut self, name: &str) {
        self.design_name = name.to_string();
    }

    pub fn canvas_width(&self) -> f64 {
        self.session.editor.canvas_size().0
    }

    pub fn canvas_height(&self) -> f64 {
        self.session.editor.canvas_size().1
    }

    /// Replace the scene with canvas JSON. Starts a fresh history.
    pub fn load_canvas_json(&mut self, json: &str) -> Result<(), JsValue> {
        let session = &mut self.session;
        session.editor.load_canvas_json(json).map_err(js_error)?;
        session.history.reset(&mut session.editor).map_err(js_error)
    }

    pub fn canvas_json(&self) -> Result<String, JsValue> {
        self.session.editor.canvas_json().map_err(js_error)
    }

    /// Body for `POST /v1/designs`, for the host's auto-save.
    pub fn save_request_json(&self, design_id: Option<String>) -> Result<String, JsValue> {
        let editor = &self.session.editor;
        let (width, height) = editor.canvas_size();
        let request =
            SaveDesignRequest::from_scene(design_id, &self.design_name, &editor.graph, width, height)
                .map_err(js_error)?;
        serde_json::to_string(&request).map_err(js_error)
    }

    pub fn resize_canvas(&mut self, width: f64, height: f64) -> Result<(), JsValue> {
        self.session
            .editor
            .resize_canvas(width, height)
            .map_err(js_error)?;
        self.observe();
        Ok(())
    }

    pub fn set_background(&mut self, color: &str) -> Result<(), JsValue> {
        self.session.editor.set_background(color).map_err(js_error)?;
        self.observe();
        Ok(())
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Draw one frame. The canvas backing store must already have the size
    /// reported by [`MockoCanvas::zoom_style_json`].
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) {
        let editor = &self.session.editor;
        render2d::sync_images(&editor.graph, &mut self.images);

        let selected: Vec<_> = editor
            .selection
            .ids()
            .iter()
            .filter_map(|id| editor.graph.index_of(*id))
            .collect();
        let overlay = Overlay {
            selected: &selected,
            bounds: &editor.bounds,
            marquee: self.session.tools.select.marquee_rect,
        };
        let (width, height) = editor.canvas_size();
        let pixel_ratio = editor.viewport.zoom_style(width, height).pixel_ratio;
        render2d::render_scene(
            ctx,
            &editor.graph,
            width,
            height,
            pixel_ratio,
            &self.images,
            &overlay,
        );
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Pointer pressed. Coordinates are relative to the scroll container's
    /// visible area.
    #[allow(clippy::too_many_arguments)]
    pub fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        pressure: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> Result<(), JsValue> {
        let (cx, cy) = self.session.editor.viewport.screen_to_canvas(x, y);
        let event = InputEvent::PointerDown {
            x: cx,
            y: cy,
            pressure,
            modifiers: modifiers(shift, ctrl, alt, meta),
        };
        self.pointer(&event, now_ms)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pointer_move(
        &mut self,
        x: f64,
        y: f64,
        pressure: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> Result<(), JsValue> {
        let (cx, cy) = self.session.editor.viewport.screen_to_canvas(x, y);
        let event = InputEvent::PointerMove {
            x: cx,
            y: cy,
            pressure,
            modifiers: modifiers(shift, ctrl, alt, meta),
        };
        self.pointer(&event, now_ms)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pointer_up(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> Result<(), JsValue> {
        let (cx, cy) = self.session.editor.viewport.screen_to_canvas(x, y);
        let event = InputEvent::up(cx, cy).with_modifiers(modifiers(shift, ctrl, alt, meta));
        self.pointer(&event, now_ms)
    }

    /// Handle a keyboard event. Returns `true` if a shortcut matched, in
    /// which case the host should `preventDefault()`.
    pub fn handle_key(
        &mut self,
        key: &str,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
        now_ms: f64,
    ) -> Result<bool, JsValue> {
        self.now = clock(now_ms);
        self.session
            .key(key, modifiers(shift, ctrl, alt, meta), self.now)
            .map_err(js_error)
    }

    /// Fire due history timers. Call once per animation frame.
    pub fn tick(&mut self, now_ms: f64) -> Result<bool, JsValue> {
        self.now = clock(now_ms);
        self.session.tick(self.now).map_err(js_error)
    }

    pub fn set_tool(&mut self, name: &str) -> bool {
        match parse_tool(name) {
            Some(kind) => {
                self.session.tools.set_active(kind);
                true
            }
            None => false,
        }
    }

    pub fn tool_name(&self) -> String {
        tool_name(self.session.tools.active()).to_string()
    }

    pub fn set_brush(&mut self, color: &str, width: f64) {
        let draw = &mut self.session.tools.draw;
        draw.color = color.to_string();
        draw.width = width;
    }

    pub fn set_eraser_radius(&mut self, radius: f64) {
        self.session.tools.eraser.radius = radius;
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Result<bool, JsValue> {
        self.session.undo().map_err(js_error)
    }

    pub fn redo(&mut self) -> Result<bool, JsValue> {
        self.session.redo().map_err(js_error)
    }

    pub fn can_undo(&self) -> bool {
        self.session.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.history.can_redo()
    }

    // ─── Objects ─────────────────────────────────────────────────────────

    /// `kind` is "rectangle", "circle", "triangle" or "line". Returns the
    /// new object's id.
    pub fn add_shape(&mut self, kind: &str) -> Result<String, JsValue> {
        let shape = parse_shape(kind)
            .ok_or_else(|| JsValue::from_str(&format!("unknown shape: {kind}")))?;
        let id = self.session.editor.add_shape(shape);
        self.observe();
        Ok(id.as_str().to_string())
    }

    /// `preset` is "heading", "subheading" or "body".
    pub fn add_text(&mut self, preset: &str) -> Result<String, JsValue> {
        let preset = parse_text_preset(preset)
            .ok_or_else(|| JsValue::from_str(&format!("unknown text preset: {preset}")))?;
        let id = self.session.editor.add_text(preset);
        self.observe();
        Ok(id.as_str().to_string())
    }

    /// Add an uploaded image (data URL or object URL) of the given natural
    /// size. Unsupported MIME types are rejected before anything changes.
    pub fn add_image(
        &mut self,
        src: &str,
        mime: &str,
        width: f64,
        height: f64,
    ) -> Result<String, JsValue> {
        let id = self
            .session
            .editor
            .add_image(src, mime, width, height)
            .map_err(js_error)?;
        self.observe();
        Ok(id.as_str().to_string())
    }

    /// Returns `false` when nothing is selected.
    pub fn duplicate_selected(&mut self) -> Result<bool, JsValue> {
        let result = self.session.editor.clone_selection();
        self.changed(result)
    }

    /// Returns `false` when nothing is selected.
    pub fn delete_selected(&mut self) -> Result<bool, JsValue> {
        let result = self.session.editor.delete_selection();
        self.changed(result)
    }

    pub fn set_fill(&mut self, color: &str) -> Result<(), JsValue> {
        let editor = &mut self.session.editor;
        for id in editor.selection.ids().to_vec() {
            editor.set_fill(id, color).map_err(js_error)?;
        }
        self.observe();
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.session.editor.select_all();
    }

    pub fn deselect(&mut self) {
        self.session.editor.deselect();
    }

    /// Selected ids as a JSON array.
    pub fn selected_ids_json(&self) -> String {
        let ids: Vec<&str> = self
            .session
            .editor
            .selection
            .ids()
            .iter()
            .map(|id| id.as_str())
            .collect();
        json!(ids).to_string()
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    /// Report the scroll container's size. Returns the centering layout
    /// (padding, phantom size, scroll offsets) as JSON.
    pub fn set_container(&mut self, width: f64, height: f64, device_pixel_ratio: f64) -> String {
        let metrics = ContainerMetrics::new(width, height).with_dpr(device_pixel_ratio);
        self.session.editor.set_container(metrics);
        self.layout_json()
    }

    /// Current centering layout as JSON, or `null` before the container is
    /// known.
    pub fn layout_json(&self) -> String {
        match self.session.editor.viewport.layout() {
            Some(layout) => json!({
                "paddingX": layout.padding_x,
                "paddingY": layout.padding_y,
                "phantomWidth": layout.phantom_width,
                "phantomHeight": layout.phantom_height,
                "scrollLeft": layout.scroll_left,
                "scrollTop": layout.scroll_top,
            })
            .to_string(),
            None => "null".to_string(),
        }
    }

    /// Record the user's scroll position.
    pub fn set_scroll(&mut self, scroll_left: f64, scroll_top: f64) {
        self.session.editor.viewport.set_scroll(scroll_left, scroll_top);
    }

    pub fn zoom(&self) -> f64 {
        self.session.editor.zoom()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.session.editor.set_zoom(zoom)
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.session.editor.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.session.editor.zoom_out()
    }

    pub fn zoom_to_fit(&mut self) -> f64 {
        self.session.editor.zoom_to_fit()
    }

    /// CSS and backing-store sizing for the `<canvas>` element, as JSON.
    pub fn zoom_style_json(&self) -> String {
        let editor = &self.session.editor;
        let (width, height) = editor.canvas_size();
        let style = editor.viewport.zoom_style(width, height);
        json!({
            "transform": style.transform,
            "transformOrigin": style.transform_origin,
            "imageRendering": style.image_rendering,
            "backingWidth": style.backing_width,
            "backingHeight": style.backing_height,
            "pixelRatio": style.pixel_ratio,
        })
        .to_string()
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Export as "png", "svg", "pdf" or "json". Returns JSON: either
    /// `{"kind":"document", ...data}` or `{"kind":"hostRender", width,
    /// height}` when the host should rasterize the canvas itself.
    pub fn export(&self, format: &str, is_premium: bool) -> Result<String, JsValue> {
        let format: ExportFormat = format.parse().map_err(js_error)?;
        let payload = self
            .session
            .editor
            .export(format, &self.design_name, is_premium)
            .map_err(js_error)?;
        Ok(payload_json(&payload))
    }
}

impl MockoCanvas {
    fn with_session(session: EditorSession, design_name: &str) -> Self {
        Self {
            session,
            design_name: design_name.to_string(),
            images: ImageCache::new(),
            now: Duration::ZERO,
        }
    }

    fn pointer(&mut self, event: &InputEvent, now_ms: f64) -> Result<(), JsValue> {
        self.now = clock(now_ms);
        self.session.pointer(event, self.now).map_err(js_error)
    }

    fn observe(&mut self) {
        let session = &mut self.session;
        session.history.observe(&mut session.editor, self.now);
    }

    fn changed<T>(&mut self, result: Result<T, EditorError>) -> Result<bool, JsValue> {
        match result {
            Ok(_) => {
                self.observe();
                Ok(true)
            }
            Err(EditorError::NothingSelected) => Ok(false),
            Err(err) => Err(js_error(err)),
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn init_once() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        #[cfg(target_arch = "wasm32")]
        {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Mocko WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            let _ = console_log::init_with_level(log::Level::Info);
        }
    });
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_config(json: &str) -> Result<EditorConfig, JsValue> {
    if json.trim().is_empty() {
        return Ok(EditorConfig::default());
    }
    EditorConfig::from_json(json).map_err(js_error)
}

/// `performance.now()` milliseconds to a monotonic clock value.
fn clock(now_ms: f64) -> Duration {
    if now_ms.is_finite() && now_ms > 0.0 {
        Duration::from_secs_f64(now_ms / 1000.0)
    } else {
        Duration::ZERO
    }
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn parse_tool(name: &str) -> Option<ToolKind> {
    match name {
        "select" => Some(ToolKind::Select),
        "draw" | "brush" => Some(ToolKind::Draw),
        "eraser" => Some(ToolKind::Eraser),
        _ => None,
    }
}

fn tool_name(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::Select => "select",
        ToolKind::Draw => "draw",
        ToolKind::Eraser => "eraser",
    }
}

fn parse_shape(kind: &str) -> Option<ShapeKind> {
    match kind {
        "rectangle" | "rect" => Some(ShapeKind::Rectangle),
        "circle" => Some(ShapeKind::Circle),
        "triangle" => Some(ShapeKind::Triangle),
        "line" => Some(ShapeKind::Line),
        _ => None,
    }
}

fn parse_text_preset(preset: &str) -> Option<TextPreset> {
    match preset {
        "heading" => Some(TextPreset::Heading),
        "subheading" => Some(TextPreset::Subheading),
        "body" => Some(TextPreset::Body),
        _ => None,
    }
}

fn payload_json(payload: &ExportPayload) -> String {
    match payload {
        ExportPayload::Document {
            format,
            file_name,
            data,
        } => json!({
            "kind": "document",
            "format": format,
            "mime": format.mime(),
            "fileName": file_name,
            "data": data,
        }),
        ExportPayload::HostRender {
            format,
            file_name,
            width,
            height,
        } => json!({
            "kind": "hostRender",
            "format": format,
            "mime": format.mime(),
            "fileName": file_name,
            "width": width,
            "height": height,
        }),
    }
    .to_string()
}
