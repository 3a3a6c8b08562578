//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into `EditorMutation`s (and
//! optionally a new selection) that the host applies through
//! [`Editor::dispatch`].
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool | Draw Tool | Eraser Tool |
//! |----------|-------------|-----------|-------------|
//! | **Shift** | Toggle / extend selection, axis-constrain drag | — | — |

use crate::editor::{Editor, EditorMutation, MutationEvent};
use crate::input::InputEvent;
use crate::selection::Selection;
use mocko_core::*;
use mocko_render::{hit_test, hit_test_rect};

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    /// Freehand brush.
    Draw,
    Eraser,
}

/// What a tool wants done in response to one event.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub mutations: Vec<EditorMutation>,
    /// Replacement selection, if the event changed it.
    pub selection: Option<Selection>,
}

impl ToolOutput {
    fn mutations(mutations: Vec<EditorMutation>) -> Self {
        Self {
            mutations,
            selection: None,
        }
    }

    fn select(selection: Selection) -> Self {
        Self {
            mutations: Vec::new(),
            selection: Some(selection),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty() && self.selection.is_none()
    }
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event against the current editor state.
    fn handle(&mut self, event: &InputEvent, editor: &Editor) -> ToolOutput;
}

impl Editor {
    /// Apply a tool's output. Returns the events it produced.
    pub fn dispatch(&mut self, output: ToolOutput) -> Vec<MutationEvent> {
        let events = output
            .mutations
            .into_iter()
            .filter_map(|m| self.apply(m))
            .collect();
        if let Some(selection) = output.selection {
            self.select(selection.ids().iter().copied());
        }
        events
    }
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SelectTool {
    dragging: bool,
    last_x: f64,
    last_y: f64,
    /// Set when pointer-down hits empty space.
    marquee_start: Option<(f64, f64)>,
    /// Current marquee rectangle, updated during drag.
    pub marquee_rect: Option<Bounds>,
    /// Selection held when an additive (shift) marquee started.
    marquee_base: Selection,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn normalize_rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Bounds {
        Bounds::new(x1.min(x2), y1.min(y2), (x2 - x1).abs(), (y2 - y1).abs())
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, editor: &Editor) -> ToolOutput {
        match event {
            InputEvent::PointerDown {
                x, y, modifiers, ..
            } => {
                self.marquee_start = None;
                self.marquee_rect = None;

                if let Some(hit_id) = hit_test(&editor.graph, &editor.bounds, *x, *y) {
                    self.dragging = true;
                    self.last_x = *x;
                    self.last_y = *y;
                    let current = &editor.selection;
                    if modifiers.shift {
                        ToolOutput::select(current.toggle(hit_id))
                    } else if !current.contains(hit_id) {
                        ToolOutput::select(Selection::Single(hit_id))
                    } else {
                        // Keep the selection so the whole group drags.
                        ToolOutput::default()
                    }
                } else {
                    self.dragging = false;
                    self.marquee_start = Some((*x, *y));
                    self.marquee_rect = Some(Bounds::new(*x, *y, 0.0, 0.0));
                    if modifiers.shift {
                        self.marquee_base = editor.selection.clone();
                        ToolOutput::default()
                    } else {
                        self.marquee_base = Selection::None;
                        ToolOutput::select(Selection::None)
                    }
                }
            }
            InputEvent::PointerMove {
                x, y, modifiers, ..
            } => {
                if let Some((sx, sy)) = self.marquee_start {
                    self.marquee_rect = Some(Self::normalize_rect(sx, sy, *x, *y));
                    return ToolOutput::default();
                }
                if !self.dragging || editor.selection.is_empty() {
                    return ToolOutput::default();
                }
                let mut dx = x - self.last_x;
                let mut dy = y - self.last_y;
                self.last_x = *x;
                self.last_y = *y;
                // Shift: constrain to dominant axis
                if modifiers.shift {
                    if dx.abs() > dy.abs() {
                        dy = 0.0;
                    } else {
                        dx = 0.0;
                    }
                }
                ToolOutput::mutations(
                    editor
                        .selection
                        .ids()
                        .iter()
                        .map(|id| EditorMutation::MoveObject { id: *id, dx, dy })
                        .collect(),
                )
            }
            InputEvent::PointerUp { .. } => {
                self.dragging = false;
                let Some(rect) = self.marquee_rect.take() else {
                    return ToolOutput::default();
                };
                self.marquee_start = None;
                if rect.width == 0.0 && rect.height == 0.0 {
                    return ToolOutput::default();
                }
                let hits = hit_test_rect(&editor.graph, &editor.bounds, &rect);
                let base = std::mem::take(&mut self.marquee_base);
                ToolOutput::select(Selection::from_ids(base.ids().iter().copied().chain(hits)))
            }
        }
    }
}

// ─── Draw Tool ───────────────────────────────────────────────────────────

/// Freehand brush. Samples collected between press and release become one
/// smoothed path object.
#[derive(Debug)]
pub struct DrawTool {
    drawing: bool,
    points: Vec<(f64, f64)>,
    pub color: String,
    pub width: f64,
}

impl DrawTool {
    pub fn new(color: &str, width: f64) -> Self {
        Self {
            drawing: false,
            points: Vec::new(),
            color: color.to_string(),
            width,
        }
    }

    /// Build the path node from the collected samples, in a frame whose
    /// origin is the stroke's top-left.
    fn finish(&mut self) -> Option<SceneNode> {
        let points = std::mem::take(&mut self.points);
        if points.len() < 2 {
            return None;
        }
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let local: Vec<(f64, f64)> = points.iter().map(|(x, y)| (x - min_x, y - min_y)).collect();
        Some(
            SceneNode::with_generated_id(NodeKind::Path {
                commands: smooth_path(&local),
            })
            .at(min_x, min_y)
            .styled(Style::stroked(&self.color, self.width)),
        )
    }
}

/// Quadratic smoothing through sample midpoints: each sample becomes a
/// control point and the curve passes through the midpoints between them.
fn smooth_path(points: &[(f64, f64)]) -> Vec<PathCmd> {
    let mut commands = Vec::with_capacity(points.len() + 1);
    let Some(&(x0, y0)) = points.first() else {
        return commands;
    };
    commands.push(PathCmd::MoveTo(x0, y0));
    for pair in points.windows(2).skip(1) {
        let (cx, cy) = pair[0];
        let (nx, ny) = pair[1];
        commands.push(PathCmd::QuadTo(cx, cy, (cx + nx) / 2.0, (cy + ny) / 2.0));
    }
    if let Some(&(lx, ly)) = points.last() {
        commands.push(PathCmd::LineTo(lx, ly));
    }
    commands
}

impl Tool for DrawTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Draw
    }

    fn handle(&mut self, event: &InputEvent, _editor: &Editor) -> ToolOutput {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.drawing = true;
                self.points.clear();
                self.points.push((*x, *y));
                ToolOutput::default()
            }
            InputEvent::PointerMove { x, y, .. } => {
                if self.drawing {
                    self.points.push((*x, *y));
                }
                ToolOutput::default()
            }
            InputEvent::PointerUp { x, y, .. } => {
                if !self.drawing {
                    return ToolOutput::default();
                }
                self.drawing = false;
                if self.points.last() != Some(&(*x, *y)) {
                    self.points.push((*x, *y));
                }
                match self.finish() {
                    Some(node) => ToolOutput::mutations(vec![EditorMutation::add(node)]),
                    None => ToolOutput::default(),
                }
            }
        }
    }
}

// ─── Eraser Tool ─────────────────────────────────────────────────────────

/// Removes whole objects touched by a circle around the cursor.
#[derive(Debug)]
pub struct EraserTool {
    active: bool,
    pub radius: f64,
}

impl EraserTool {
    pub fn new(radius: f64) -> Self {
        Self {
            active: false,
            radius,
        }
    }

    fn sample(&self, x: f64, y: f64, editor: &Editor) -> ToolOutput {
        ToolOutput::mutations(
            editor
                .erase_targets(x, y, self.radius)
                .into_iter()
                .map(|id| EditorMutation::RemoveObject { id })
                .collect(),
        )
    }
}

impl Tool for EraserTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Eraser
    }

    fn handle(&mut self, event: &InputEvent, editor: &Editor) -> ToolOutput {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.active = true;
                self.sample(*x, *y, editor)
            }
            InputEvent::PointerMove { x, y, .. } if self.active => self.sample(*x, *y, editor),
            InputEvent::PointerMove { .. } => ToolOutput::default(),
            InputEvent::PointerUp { .. } => {
                self.active = false;
                ToolOutput::default()
            }
        }
    }
}

// ─── Toolbox ─────────────────────────────────────────────────────────────

/// Holds one instance of every tool and routes events to the active one.
#[derive(Debug)]
pub struct Toolbox {
    active: ToolKind,
    pub select: SelectTool,
    pub draw: DrawTool,
    pub eraser: EraserTool,
}

impl Toolbox {
    pub fn new(editor: &Editor) -> Self {
        Self {
            active: ToolKind::Select,
            select: SelectTool::new(),
            draw: DrawTool::new(&editor.config.brush_color, editor.config.brush_width),
            eraser: EraserTool::new(editor.config.eraser_radius),
        }
    }

    pub fn active(&self) -> ToolKind {
        self.active
    }

    pub fn set_active(&mut self, kind: ToolKind) {
        self.active = kind;
    }

    pub fn tool_mut(&mut self) -> &mut dyn Tool {
        match self.active {
            ToolKind::Select => &mut self.select,
            ToolKind::Draw => &mut self.draw,
            ToolKind::Eraser => &mut self.eraser,
        }
    }

    /// Route an event to the active tool and apply its output.
    pub fn handle(&mut self, event: &InputEvent, editor: &mut Editor) -> Vec<MutationEvent> {
        let output = self.tool_mut().handle(event, editor);
        editor.dispatch(output)
    }
}
