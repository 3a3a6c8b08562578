//! Integration tests: clone, delete and eraser over a loaded design.
//!
//! Compares scene JSON before/after so the untouched objects are checked
//! byte-for-byte.

use mocko_core::{CanvasDocument, ObjectId, Snapshot};
use mocko_editor::input::InputEvent;
use mocko_editor::tools::{ToolKind, Toolbox};
use mocko_editor::{Editor, EditorConfig, MutationEvent, Selection};
use pretty_assertions::assert_eq;

fn make_editor() -> Editor {
    let mut editor = Editor::new(800.0, 600.0, EditorConfig::default()).unwrap();
    editor
        .load_canvas_json(include_str!("fixtures/starter.json"))
        .unwrap();
    editor
}

fn ids(names: &[&str]) -> Vec<ObjectId> {
    names.iter().map(|n| ObjectId::intern(n)).collect()
}

fn document(editor: &Editor) -> CanvasDocument {
    Snapshot::capture(&editor.graph, 1.0).canvas
}

/// One eraser click through the toolbox; returns the removed IDs.
fn erase(editor: &mut Editor, tools: &mut Toolbox, x: f64, y: f64) -> Vec<ObjectId> {
    tools.set_active(ToolKind::Eraser);
    let events = tools.handle(&InputEvent::down(x, y), editor);
    tools.handle(&InputEvent::up(x, y), editor);
    events
        .into_iter()
        .filter_map(|event| match event {
            MutationEvent::ObjectRemoved(id) => Some(id),
            _ => None,
        })
        .collect()
}

// ─── Clone ──────────────────────────────────────────────────────────────

#[test]
fn cloning_multi_selection_yields_offset_clones() {
    let mut editor = make_editor();
    let sources = ids(&["card", "dot"]);
    editor.select(sources.clone());
    assert!(editor.selection.is_active_selection());

    let clones = editor.clone_selection().unwrap();
    assert_eq!(clones.len(), 2);
    assert_eq!(editor.graph.object_count(), 5);
    assert_eq!(editor.selection, Selection::from_ids(clones.clone()));

    for (source, clone) in sources.iter().zip(&clones) {
        assert!(!sources.contains(clone));
        let a = editor.graph.get_by_id(*source).unwrap();
        let b = editor.graph.get_by_id(*clone).unwrap();
        assert_eq!(b.transform.left - a.transform.left, 20.0);
        assert_eq!(b.transform.top - a.transform.top, 20.0);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.style, b.style);
    }
    // Clones land on top, in selection order.
    assert_eq!(&editor.graph.top_level_ids()[3..], clones.as_slice());
}

#[test]
fn cloning_leaves_originals_untouched() {
    let mut editor = make_editor();
    let before = document(&editor);
    editor.select(ids(&["title"]));
    editor.clone_selection().unwrap();
    let after = document(&editor);
    assert_eq!(&after.objects[..3], &before.objects[..]);
}

// ─── Delete ─────────────────────────────────────────────────────────────

#[test]
fn deleting_multi_selection_removes_exactly_those() {
    let mut editor = make_editor();
    let before = document(&editor);
    editor.select(ids(&["card", "dot"]));

    let removed = editor.delete_selection().unwrap();
    assert_eq!(removed, ids(&["card", "dot"]));
    assert_eq!(editor.selection, Selection::None);

    let after = document(&editor);
    assert_eq!(after.objects.len(), 1);
    assert_eq!(after.objects[0], before.objects[1]);
    assert_eq!(after.background, before.background);
}

#[test]
fn deleting_single_selection() {
    let mut editor = make_editor();
    editor.select(ids(&["title"]));
    assert_eq!(editor.delete_selection().unwrap(), ids(&["title"]));
    assert_eq!(editor.graph.top_level_ids(), ids(&["card", "dot"]));
}

// ─── Eraser ─────────────────────────────────────────────────────────────

#[test]
fn eraser_removes_iff_distance_below_radius() {
    // dot: circle at (600, 400), radius 40 → AABB (600, 400)–(680, 480).
    let samples = [
        ((700.0, 440.0), true),  // 20 to the right edge: not strictly less
        ((699.0, 440.0), false), // 19
        ((640.0, 380.5), false), // 19.5 above
        ((614.0, 386.0), false), // 14 above
        ((580.0, 380.0), true),  // diagonal 28.3 from the corner
        ((590.0, 390.0), false), // diagonal 14.1
    ];
    for ((x, y), survives) in samples {
        let mut editor = make_editor();
        let mut tools = Toolbox::new(&editor);
        let erased = erase(&mut editor, &mut tools, x, y);
        let dot = ObjectId::intern("dot");
        assert_eq!(editor.graph.contains(dot), survives, "sample ({x}, {y})");
        assert_eq!(erased.contains(&dot), !survives);
    }
}

#[test]
fn eraser_only_touches_objects_in_range() {
    let mut editor = make_editor();
    let before = document(&editor);
    // Inside the card and the title, far from the dot.
    let mut tools = Toolbox::new(&editor);
    let erased = erase(&mut editor, &mut tools, 200.0, 150.0);
    assert_eq!(erased, ids(&["card", "title"]));
    let after = document(&editor);
    assert_eq!(after.objects, vec![before.objects[2].clone()]);
}

#[test]
fn eraser_follows_the_live_radius() {
    let mut editor = make_editor();
    let mut tools = Toolbox::new(&editor);
    // 14 above the dot: inside the default radius of 20.
    tools.eraser.radius = 10.0;
    assert!(erase(&mut editor, &mut tools, 614.0, 386.0).is_empty());
    assert!(editor.graph.contains(ObjectId::intern("dot")));
    tools.eraser.radius = 30.0;
    assert_eq!(erase(&mut editor, &mut tools, 614.0, 386.0), ids(&["dot"]));
}
