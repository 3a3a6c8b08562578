//! Undo/redo history over full-canvas snapshots.
//!
//! Each entry is the serialized [`mocko_core::Snapshot`] (scene plus zoom)
//! of one settled state. The undo stack always holds at least the initial
//! state; its top is the state currently on screen.
//!
//! Edits reach the history as [`MutationEvent`]s drained from the editor.
//! Bursts are coalesced by a debounce window per event class (paths settle
//! more slowly than other edits), or grouped explicitly with
//! [`HistoryManager::begin_transaction`]. Time is passed in by the caller,
//! so the whole manager is deterministic.

use crate::config::EditorConfig;
use crate::editor::{Editor, MutationEvent};
use crate::error::EditorResult;
use log::{debug, error, warn};
use std::collections::VecDeque;
use std::time::Duration;

const DEFAULT_SLOT: usize = 0;
const PATH_SLOT: usize = 1;

/// Linear undo/redo stack with debounced capture.
#[derive(Debug)]
pub struct HistoryManager {
    undo_stack: VecDeque<String>,
    redo_stack: Vec<String>,
    limit: usize,
    windows: [Duration; 2],
    /// Capture deadline per event class.
    deadlines: [Option<Duration>; 2],
    transaction_depth: usize,
    transaction_dirty: bool,
    performing_history: bool,
}

impl HistoryManager {
    /// Create the history with the editor's current state as its first entry.
    pub fn new(editor: &Editor, config: &EditorConfig) -> EditorResult<Self> {
        let mut history = Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: config.history_limit.max(1),
            windows: [config.debounce(), config.path_debounce()],
            deadlines: [None, None],
            transaction_depth: 0,
            transaction_dirty: false,
            performing_history: false,
        };
        history.undo_stack.push_back(editor.snapshot_json()?);
        Ok(history)
    }

    /// Forget all entries and start over from the editor's current state.
    pub fn reset(&mut self, editor: &mut Editor) -> EditorResult<()> {
        let initial = editor.snapshot_json()?;
        editor.drain_events();
        self.undo_stack.clear();
        self.undo_stack.push_back(initial);
        self.redo_stack.clear();
        self.deadlines = [None, None];
        self.transaction_depth = 0;
        self.transaction_dirty = false;
        Ok(())
    }

    // ─── Change tracking ─────────────────────────────────────────────────

    /// Register a mutation event at time `now`.
    ///
    /// Ignored while a history operation is running. Inside a transaction
    /// the event only marks the transaction dirty; otherwise it (re)starts
    /// the debounce window for its class.
    pub fn notify(&mut self, event: MutationEvent, now: Duration) {
        if self.performing_history {
            return;
        }
        if self.transaction_depth > 0 {
            self.transaction_dirty = true;
            return;
        }
        let slot = if event.is_path() { PATH_SLOT } else { DEFAULT_SLOT };
        self.deadlines[slot] = Some(now + self.windows[slot]);
    }

    /// Drain the editor's pending events into the debouncer.
    pub fn observe(&mut self, editor: &mut Editor, now: Duration) {
        for event in editor.drain_events() {
            self.notify(event, now);
        }
    }

    /// Capture if any debounce window has elapsed by `now`.
    pub fn poll(&mut self, editor: &Editor, now: Duration) -> EditorResult<bool> {
        let mut due = false;
        for deadline in &mut self.deadlines {
            if deadline.is_some_and(|at| at <= now) {
                *deadline = None;
                due = true;
            }
        }
        if due { self.capture(editor) } else { Ok(false) }
    }

    /// `observe` then `poll`: the per-frame entry point for hosts.
    pub fn tick(&mut self, editor: &mut Editor, now: Duration) -> EditorResult<bool> {
        self.observe(editor, now);
        self.poll(editor, now)
    }

    /// Capture immediately if a debounced change is pending.
    pub fn flush(&mut self, editor: &mut Editor) -> EditorResult<bool> {
        if editor.has_pending_events() {
            // Timestamps don't matter: the deadlines are cleared right below.
            self.observe(editor, Duration::ZERO);
        }
        if self.deadlines.iter().all(Option::is_none) {
            return Ok(false);
        }
        self.deadlines = [None, None];
        self.capture(editor)
    }

    /// Push the editor's current state, unless a history operation is
    /// running or the state equals the top entry. Clears the redo stack.
    pub fn capture(&mut self, editor: &Editor) -> EditorResult<bool> {
        if self.performing_history {
            return Ok(false);
        }
        let snapshot = editor.snapshot_json()?;
        if self.undo_stack.back() == Some(&snapshot) {
            debug!("history: skipped identical snapshot");
            return Ok(false);
        }
        self.undo_stack.push_back(snapshot);
        self.redo_stack.clear();
        self.enforce_limit();
        debug!("history: captured entry {}", self.undo_stack.len());
        Ok(true)
    }

    fn enforce_limit(&mut self) {
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    // ─── Transactions ────────────────────────────────────────────────────

    /// Open a transaction. Transactions nest; only the outermost commit
    /// captures.
    pub fn begin_transaction(&mut self) {
        self.transaction_depth += 1;
    }

    /// Close a transaction. The outermost commit captures exactly one entry
    /// if anything changed inside it. Returns whether an entry was added.
    pub fn commit_transaction(&mut self, editor: &mut Editor) -> EditorResult<bool> {
        if self.transaction_depth == 0 {
            warn!("history: commit without an open transaction");
            return Ok(false);
        }
        // Drain while still inside the transaction so events only mark it dirty.
        self.observe(editor, Duration::ZERO);
        self.transaction_depth -= 1;
        if self.transaction_depth > 0 || !self.transaction_dirty {
            return Ok(false);
        }
        self.transaction_dirty = false;
        self.deadlines = [None, None];
        self.capture(editor)
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_depth > 0
    }

    // ─── Undo / Redo ─────────────────────────────────────────────────────

    /// Step back one entry. Returns `Ok(false)` when there is nothing to
    /// undo, another history operation is running, or a transaction is
    /// still open (its edits have no entry to step back from yet).
    ///
    /// On failure the error is logged and returned, the stacks keep their
    /// positions and the editor keeps its current scene.
    pub fn undo(&mut self, editor: &mut Editor) -> EditorResult<bool> {
        if self.performing_history {
            debug!("history: undo ignored, operation in progress");
            return Ok(false);
        }
        if self.transaction_depth > 0 {
            debug!("history: undo ignored, transaction open");
            return Ok(false);
        }
        self.flush(editor)?;
        let len = self.undo_stack.len();
        if len < 2 {
            return Ok(false);
        }
        self.performing_history = true;
        let outcome = editor.load_snapshot(&self.undo_stack[len - 2]);
        editor.drain_events();
        self.performing_history = false;

        match outcome {
            Ok(()) => {
                if let Some(current) = self.undo_stack.pop_back() {
                    self.redo_stack.push(current);
                }
                debug!(
                    "history: undo ({} undo, {} redo)",
                    self.undo_stack.len(),
                    self.redo_stack.len()
                );
                Ok(true)
            }
            Err(err) => {
                error!("history: undo failed: {err}");
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone entry. Guarded like [`Self::undo`].
    pub fn redo(&mut self, editor: &mut Editor) -> EditorResult<bool> {
        if self.performing_history {
            debug!("history: redo ignored, operation in progress");
            return Ok(false);
        }
        if self.transaction_depth > 0 {
            debug!("history: redo ignored, transaction open");
            return Ok(false);
        }
        // A pending edit is newer than anything on the redo stack.
        self.flush(editor)?;
        let Some(next) = self.redo_stack.last() else {
            return Ok(false);
        };
        self.performing_history = true;
        let outcome = editor.load_snapshot(next);
        editor.drain_events();
        self.performing_history = false;

        match outcome {
            Ok(()) => {
                if let Some(entry) = self.redo_stack.pop() {
                    self.undo_stack.push_back(entry);
                    self.enforce_limit();
                }
                debug!(
                    "history: redo ({} undo, {} redo)",
                    self.undo_stack.len(),
                    self.redo_stack.len()
                );
                Ok(true)
            }
            Err(err) => {
                error!("history: redo failed: {err}");
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.idle() && self.undo_stack.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        self.idle() && !self.redo_stack.is_empty()
    }

    fn idle(&self) -> bool {
        !self.performing_history && self.transaction_depth == 0
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn is_performing_history(&self) -> bool {
        self.performing_history
    }

    /// True while a debounced capture is waiting for its window.
    pub fn has_pending(&self) -> bool {
        self.deadlines.iter().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorMutation;
    use mocko_core::{NodeKind, ObjectId, SceneNode};
    use pretty_assertions::assert_eq;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn setup() -> (Editor, HistoryManager) {
        let config = EditorConfig::default();
        let editor = Editor::new(400.0, 400.0, config.clone()).unwrap();
        let history = HistoryManager::new(&editor, &config).unwrap();
        (editor, history)
    }

    fn add_rect(editor: &mut Editor) -> ObjectId {
        let node = SceneNode::with_generated_id(NodeKind::Rect {
            width: 10.0,
            height: 10.0,
            rx: 0.0,
            ry: 0.0,
        });
        let id = node.id;
        editor.apply(EditorMutation::add(node));
        id
    }

    fn add_path(editor: &mut Editor) {
        let node = SceneNode::with_generated_id(NodeKind::Path {
            commands: vec![mocko_core::PathCmd::MoveTo(0.0, 0.0)],
        });
        editor.apply(EditorMutation::add(node));
    }

    #[test]
    fn starts_with_initial_entry() {
        let (_, history) = setup();
        assert_eq!(history.undo_depth(), 1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn burst_inside_window_captures_once() {
        let (mut ed, mut history) = setup();
        let id = add_rect(&mut ed);
        history.tick(&mut ed, ms(0)).unwrap();
        for t in [100, 200, 300, 400] {
            ed.apply(EditorMutation::MoveObject { id, dx: 1.0, dy: 0.0 });
            assert!(!history.tick(&mut ed, ms(t)).unwrap());
        }
        assert!(!history.poll(&ed, ms(699)).unwrap());
        assert!(history.poll(&ed, ms(700)).unwrap());
        assert_eq!(history.undo_depth(), 2);
        assert!(!history.has_pending());
    }

    #[test]
    fn path_events_wait_longer() {
        let (mut ed, mut history) = setup();
        add_path(&mut ed);
        history.observe(&mut ed, ms(0));
        assert!(!history.poll(&ed, ms(300)).unwrap());
        assert!(history.poll(&ed, ms(500)).unwrap());
    }

    #[test]
    fn transaction_groups_into_one_entry() {
        let (mut ed, mut history) = setup();
        history.begin_transaction();
        let id = add_rect(&mut ed);
        history.begin_transaction();
        ed.apply(EditorMutation::MoveObject { id, dx: 5.0, dy: 5.0 });
        assert!(!history.commit_transaction(&mut ed).unwrap());
        ed.apply(EditorMutation::RotateObject { id, angle: 45.0 });
        assert!(history.commit_transaction(&mut ed).unwrap());
        assert_eq!(history.undo_depth(), 2);
        // Timers never started for the grouped events.
        assert!(!history.poll(&ed, ms(10_000)).unwrap());
    }

    #[test]
    fn empty_transaction_captures_nothing() {
        let (mut ed, mut history) = setup();
        history.begin_transaction();
        assert!(!history.commit_transaction(&mut ed).unwrap());
        assert!(!history.commit_transaction(&mut ed).unwrap());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn identical_capture_is_skipped() {
        let (ed, mut history) = setup();
        assert!(!history.capture(&ed).unwrap());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let config = EditorConfig {
            history_limit: 3,
            ..EditorConfig::default()
        };
        let mut ed = Editor::new(400.0, 400.0, config.clone()).unwrap();
        let mut history = HistoryManager::new(&ed, &config).unwrap();
        let initial = ed.snapshot_json().unwrap();
        for _ in 0..5 {
            add_rect(&mut ed);
            history.flush(&mut ed).unwrap();
        }
        assert_eq!(history.undo_depth(), 3);
        assert!(!history.undo_stack.contains(&initial));
    }

    #[test]
    fn undo_moves_top_to_redo() {
        let (mut ed, mut history) = setup();
        add_rect(&mut ed);
        history.flush(&mut ed).unwrap();
        assert!(history.undo(&mut ed).unwrap());
        assert_eq!(ed.graph.object_count(), 0);
        assert_eq!((history.undo_depth(), history.redo_depth()), (1, 1));
        assert!(!history.undo(&mut ed).unwrap());
        assert!(history.redo(&mut ed).unwrap());
        assert_eq!(ed.graph.object_count(), 1);
        assert!(!history.redo(&mut ed).unwrap());
    }

    #[test]
    fn undo_flushes_pending_edit_first() {
        let (mut ed, mut history) = setup();
        add_rect(&mut ed);
        history.flush(&mut ed).unwrap();
        add_rect(&mut ed);
        history.observe(&mut ed, ms(0));
        // The second rect is still inside its window.
        assert!(history.undo(&mut ed).unwrap());
        assert_eq!(ed.graph.object_count(), 1);
    }

    #[test]
    fn open_transaction_blocks_undo_and_redo() {
        let (mut ed, mut history) = setup();
        let id = add_rect(&mut ed);
        history.flush(&mut ed).unwrap();
        add_rect(&mut ed);
        history.flush(&mut ed).unwrap();
        assert!(history.undo(&mut ed).unwrap());

        history.begin_transaction();
        ed.apply(EditorMutation::MoveObject { id, dx: 100.0, dy: 0.0 });
        let moved = ed.canvas_json().unwrap();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(!history.undo(&mut ed).unwrap());
        assert!(!history.redo(&mut ed).unwrap());
        assert_eq!(ed.canvas_json().unwrap(), moved);

        assert!(history.commit_transaction(&mut ed).unwrap());
        assert_eq!((history.undo_depth(), history.redo_depth()), (3, 0));
        assert!(history.undo(&mut ed).unwrap());
        assert!(history.redo(&mut ed).unwrap());
        assert_eq!(ed.canvas_json().unwrap(), moved);
    }

    #[test]
    fn guard_blocks_reentry_and_capture() {
        let (mut ed, mut history) = setup();
        add_rect(&mut ed);
        history.flush(&mut ed).unwrap();
        history.performing_history = true;
        assert!(!history.undo(&mut ed).unwrap());
        assert!(!history.redo(&mut ed).unwrap());
        add_rect(&mut ed);
        history.observe(&mut ed, ms(0));
        assert!(!history.has_pending());
        assert!(!history.capture(&ed).unwrap());
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn failed_reload_restores_positions() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (mut ed, mut history) = setup();
        add_rect(&mut ed);
        history.flush(&mut ed).unwrap();
        history.undo_stack[0] = "not a snapshot".to_string();
        let before = ed.canvas_json().unwrap();

        assert!(history.undo(&mut ed).is_err());
        assert!(!history.is_performing_history());
        assert_eq!((history.undo_depth(), history.redo_depth()), (2, 0));
        assert_eq!(ed.canvas_json().unwrap(), before);
    }
}
