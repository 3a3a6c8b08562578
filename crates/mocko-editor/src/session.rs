//! An editing session: editor, history and tools wired together.
//!
//! This is what the web bridge drives. Pointer drags are wrapped in a
//! history transaction so one gesture is one undo step.

use crate::config::EditorConfig;
use crate::editor::{Editor, EditorMutation, ZOrder};
use crate::error::{EditorError, EditorResult};
use crate::history::HistoryManager;
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{ToolKind, Toolbox};
use log::debug;
use std::time::Duration;

pub struct EditorSession {
    pub editor: Editor,
    pub history: HistoryManager,
    pub tools: Toolbox,
    gesture_open: bool,
}

impl EditorSession {
    pub fn new(editor: Editor) -> EditorResult<Self> {
        let history = HistoryManager::new(&editor, &editor.config)?;
        let tools = Toolbox::new(&editor);
        Ok(Self {
            editor,
            history,
            tools,
            gesture_open: false,
        })
    }

    pub fn blank(width: f64, height: f64, config: EditorConfig) -> EditorResult<Self> {
        Self::new(Editor::new(width, height, config)?)
    }

    /// Feed a pointer event to the active tool.
    ///
    /// Press opens a transaction and release commits it, so a drag or an
    /// eraser stroke becomes a single history entry. Freehand strokes are
    /// left to the path debounce window.
    pub fn pointer(&mut self, event: &InputEvent, now: Duration) -> EditorResult<()> {
        let grouped = self.tools.active() != ToolKind::Draw;
        if grouped && matches!(event, InputEvent::PointerDown { .. }) && !self.gesture_open {
            self.history.begin_transaction();
            self.gesture_open = true;
        }
        self.tools.handle(event, &mut self.editor);
        if matches!(event, InputEvent::PointerUp { .. }) && self.gesture_open {
            self.gesture_open = false;
            self.history.commit_transaction(&mut self.editor)?;
        } else {
            self.history.observe(&mut self.editor, now);
        }
        Ok(())
    }

    /// Resolve and run a keyboard shortcut. Returns whether a binding
    /// matched.
    pub fn key(&mut self, key: &str, modifiers: Modifiers, now: Duration) -> EditorResult<bool> {
        match ShortcutMap::resolve(key, modifiers) {
            Some(action) => {
                self.perform(action, now)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn perform(&mut self, action: ShortcutAction, now: Duration) -> EditorResult<()> {
        debug!("shortcut: {action:?}");
        match action {
            ShortcutAction::ToolSelect => self.tools.set_active(ToolKind::Select),
            ShortcutAction::ToolDraw => self.tools.set_active(ToolKind::Draw),
            ShortcutAction::ToolEraser => self.tools.set_active(ToolKind::Eraser),
            ShortcutAction::Undo => {
                self.history.undo(&mut self.editor)?;
            }
            ShortcutAction::Redo => {
                self.history.redo(&mut self.editor)?;
            }
            ShortcutAction::Delete => match self.editor.delete_selection() {
                Ok(_) | Err(EditorError::NothingSelected) => {}
                Err(err) => return Err(err),
            },
            ShortcutAction::Duplicate => match self.editor.clone_selection() {
                Ok(_) | Err(EditorError::NothingSelected) => {}
                Err(err) => return Err(err),
            },
            ShortcutAction::SelectAll => self.editor.select_all(),
            ShortcutAction::Deselect => self.editor.deselect(),
            ShortcutAction::ZoomIn => {
                self.editor.zoom_in();
            }
            ShortcutAction::ZoomOut => {
                self.editor.zoom_out();
            }
            ShortcutAction::ZoomToFit => {
                self.editor.zoom_to_fit();
            }
            ShortcutAction::SendBackward => self.reorder(ZOrder::Backward),
            ShortcutAction::BringForward => self.reorder(ZOrder::Forward),
            ShortcutAction::SendToBack => self.reorder(ZOrder::Back),
            ShortcutAction::BringToFront => self.reorder(ZOrder::Front),
        }
        self.history.observe(&mut self.editor, now);
        Ok(())
    }

    fn reorder(&mut self, order: ZOrder) {
        let graph = &self.editor.graph;
        let mut ids = self.editor.selection.ids().to_vec();
        ids.sort_by_key(|id| graph.index_of(*id).and_then(|idx| graph.position(idx)));
        // Walk from the side the objects move towards, so members keep
        // their relative order.
        if matches!(order, ZOrder::Forward | ZOrder::Back) {
            ids.reverse();
        }
        for id in ids {
            self.editor.apply(EditorMutation::Reorder { id, order });
        }
    }

    /// Fire due debounce timers. Call once per animation frame.
    pub fn tick(&mut self, now: Duration) -> EditorResult<bool> {
        self.history.tick(&mut self.editor, now)
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        self.history.undo(&mut self.editor)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        self.history.redo(&mut self.editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ShapeKind;
    use pretty_assertions::assert_eq;

    fn session() -> EditorSession {
        EditorSession::blank(1000.0, 800.0, EditorConfig::default()).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn drag_is_one_history_entry() {
        let mut s = session();
        let id = s.editor.add_shape(ShapeKind::Rectangle);
        s.history.flush(&mut s.editor).unwrap();
        let start = s.editor.object_bounds(id).unwrap();

        s.pointer(&InputEvent::down(500.0, 400.0), ms(0)).unwrap();
        for i in 1..=10 {
            s.pointer(&InputEvent::moved(500.0 + i as f64, 400.0), ms(i * 16)).unwrap();
        }
        s.pointer(&InputEvent::up(510.0, 400.0), ms(200)).unwrap();
        assert_eq!(s.history.undo_depth(), 3);

        s.undo().unwrap();
        assert_eq!(s.editor.object_bounds(id), Some(start));
    }

    #[test]
    fn undo_mid_drag_keeps_the_gesture() {
        let mut s = session();
        let id = s.editor.add_shape(ShapeKind::Rectangle);
        s.history.flush(&mut s.editor).unwrap();
        let start = s.editor.object_bounds(id).unwrap();
        let cmd = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };

        s.pointer(&InputEvent::down(500.0, 400.0), ms(0)).unwrap();
        s.pointer(&InputEvent::moved(600.0, 400.0), ms(16)).unwrap();
        let moved = s.editor.object_bounds(id).unwrap();
        assert!(s.key("z", cmd, ms(20)).unwrap());
        assert_eq!(s.editor.graph.object_count(), 1);
        assert_eq!(s.editor.object_bounds(id), Some(moved));
        s.pointer(&InputEvent::up(600.0, 400.0), ms(40)).unwrap();
        assert_eq!(s.history.undo_depth(), 3);

        assert!(s.undo().unwrap());
        assert_eq!(s.editor.object_bounds(id), Some(start));
        assert!(s.redo().unwrap());
        assert_eq!(s.editor.object_bounds(id), Some(moved));
    }

    #[test]
    fn click_without_change_adds_no_entry() {
        let mut s = session();
        s.pointer(&InputEvent::down(1.0, 1.0), ms(0)).unwrap();
        s.pointer(&InputEvent::up(1.0, 1.0), ms(10)).unwrap();
        assert_eq!(s.history.undo_depth(), 1);
    }

    #[test]
    fn shortcuts_drive_the_editor() {
        let mut s = session();
        s.editor.add_shape(ShapeKind::Rectangle);
        let cmd = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert!(s.key("d", cmd, ms(0)).unwrap());
        assert_eq!(s.editor.graph.object_count(), 2);
        assert!(s.key("Delete", Modifiers::NONE, ms(10)).unwrap());
        assert_eq!(s.editor.graph.object_count(), 1);
        assert!(s.key("b", Modifiers::NONE, ms(20)).unwrap());
        assert_eq!(s.tools.active(), ToolKind::Draw);
        assert!(!s.key("q", Modifiers::NONE, ms(30)).unwrap());
    }

    #[test]
    fn delete_with_empty_selection_is_quiet() {
        let mut s = session();
        s.perform(ShortcutAction::Delete, ms(0)).unwrap();
        s.perform(ShortcutAction::Duplicate, ms(0)).unwrap();
    }

    #[test]
    fn reorder_keeps_relative_order() {
        let mut s = session();
        let a = s.editor.add_shape(ShapeKind::Rectangle);
        let b = s.editor.add_shape(ShapeKind::Circle);
        let c = s.editor.add_shape(ShapeKind::Triangle);
        s.editor.select([a, b]);
        s.perform(ShortcutAction::BringToFront, ms(0)).unwrap();
        assert_eq!(s.editor.graph.top_level_ids(), vec![c, a, b]);
        s.perform(ShortcutAction::SendToBack, ms(0)).unwrap();
        assert_eq!(s.editor.graph.top_level_ids(), vec![a, b, c]);
        s.editor.select([b, c]);
        s.perform(ShortcutAction::SendBackward, ms(0)).unwrap();
        assert_eq!(s.editor.graph.top_level_ids(), vec![b, c, a]);
    }
}
