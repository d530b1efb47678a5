//! Integration tests: whole editing sessions through `DrawingEditor`.
//!
//! Input goes in as pointer and key events, exactly as a front end would
//! send it, and the drawing and edit history are checked afterwards.

use hd_core::{
    AttributeKey, AttributeValue, Boundable, DomError, DrawingFormat, Figure, FigureId,
    FigureKind, Rect,
};
use hd_editor::{
    DrawingEditor, EditorAction, EditorConfig, EditorError, FigureTemplate, InputEvent,
    Modifiers, ToolKind, ToolOutcome,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn editor_with(rects: &[Rect]) -> (DrawingEditor, Vec<FigureId>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let editor = DrawingEditor::new(EditorConfig::default());
    let ids = {
        let mut d = editor.drawing().lock();
        let ids: Vec<FigureId> = rects.iter().map(|r| d.add(Figure::rectangle(*r))).collect();
        d.take_edits();
        ids
    };
    (editor, ids)
}

fn send(editor: &mut DrawingEditor, events: &[InputEvent]) -> ToolOutcome {
    let mut out = ToolOutcome::Ignored;
    for e in events {
        out = editor.handle_input(e).unwrap();
    }
    out
}

fn key(editor: &mut DrawingEditor, k: &str, m: Modifiers) -> ToolOutcome {
    send(editor, &[InputEvent::key(k, m)])
}

fn bounds(editor: &DrawingEditor, id: FigureId) -> Option<Rect> {
    editor.drawing().lock().figure(id).map(Boundable::bounds)
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hd-session-{}-{name}", std::process::id()))
}

// ─── Gestures ───────────────────────────────────────────────────────────

#[test]
fn drag_is_one_undo_step() {
    let (mut editor, ids) = editor_with(&[Rect::new(10.0, 10.0, 40.0, 40.0)]);
    send(
        &mut editor,
        &[
            InputEvent::down(20.0, 20.0),
            InputEvent::drag(25.0, 22.0),
            InputEvent::drag(35.0, 30.0),
            InputEvent::up(35.0, 30.0),
        ],
    );
    assert_eq!(bounds(&editor, ids[0]), Some(Rect::new(25.0, 20.0, 55.0, 50.0)));
    assert_eq!(editor.undo().undo_len(), 1);
    assert!(editor.is_modified());

    // Cmd+Z → Undo
    assert_eq!(key(&mut editor, "z", Modifiers::META), ToolOutcome::Handled);
    assert_eq!(bounds(&editor, ids[0]), Some(Rect::new(10.0, 10.0, 40.0, 40.0)));
    // Cmd+Shift+Z → Redo
    key(&mut editor, "z", Modifiers::META | Modifiers::SHIFT);
    assert_eq!(bounds(&editor, ids[0]), Some(Rect::new(25.0, 20.0, 55.0, 50.0)));
}

#[test]
fn creation_tool_hands_back_to_selection() {
    let (mut editor, _) = editor_with(&[]);
    key(&mut editor, "r", Modifiers::empty());
    assert!(matches!(editor.tool_kind(), ToolKind::Create { .. }));

    let out = send(
        &mut editor,
        &[
            InputEvent::down(10.0, 10.0),
            InputEvent::drag(30.0, 30.0),
            InputEvent::up(50.0, 40.0),
        ],
    );
    assert_eq!(out, ToolOutcome::Done);
    assert_eq!(editor.tool_kind(), ToolKind::Select);
    let created = editor.view().selection()[0];
    assert_eq!(bounds(&editor, created), Some(Rect::new(10.0, 10.0, 50.0, 40.0)));
    assert_eq!(editor.undo().undo_presentation_name(), "Undo Create Rectangle");

    // Tab goes back to the rectangle tool.
    key(&mut editor, "Tab", Modifiers::empty());
    assert!(matches!(editor.tool_kind(), ToolKind::Create { .. }));

    key(&mut editor, "z", Modifiers::CTRL);
    assert_eq!(editor.drawing().lock().figure_count(), 0);
    assert!(editor.view().selection().is_empty());
}

#[test]
fn sticky_creation_tool_keeps_drawing_with_its_attributes() {
    let (mut editor, _) = editor_with(&[]);
    let kind = ToolKind::Create {
        template: FigureTemplate::Rectangle,
        attributes: vec![(AttributeKey::StrokeWidth, AttributeValue::Number(4.0))],
        sticky: true,
    };
    editor.perform(EditorAction::SelectTool(kind.clone())).unwrap();

    for x in [0.0, 100.0] {
        let out = send(
            &mut editor,
            &[InputEvent::down(x, 0.0), InputEvent::up(x + 20.0, 30.0)],
        );
        assert_eq!(out, ToolOutcome::Handled);
        assert_eq!(editor.tool_kind(), kind);
    }

    let d = editor.drawing().lock();
    assert_eq!(d.figure_count(), 2);
    for id in d.children() {
        assert_eq!(d.figure(*id).unwrap().attributes.stroke_width(), 4.0);
    }
    assert_eq!(editor.undo().undo_len(), 2);
}

#[test]
fn escape_cancels_a_drag() {
    let (mut editor, ids) = editor_with(&[Rect::new(10.0, 10.0, 40.0, 40.0)]);
    send(
        &mut editor,
        &[InputEvent::down(20.0, 20.0), InputEvent::drag(90.0, 90.0)],
    );
    key(&mut editor, "Escape", Modifiers::empty());
    assert_eq!(bounds(&editor, ids[0]), Some(Rect::new(10.0, 10.0, 40.0, 40.0)));
    assert_eq!(editor.undo().undo_len(), 0);
    assert!(!editor.undo().is_in_composite());
}

// ─── Actions ────────────────────────────────────────────────────────────

#[test]
fn delete_takes_attached_connections_along() {
    let (mut editor, ids) = editor_with(&[
        Rect::new(0.0, 0.0, 20.0, 20.0),
        Rect::new(100.0, 0.0, 120.0, 20.0),
    ]);
    let (a, b) = (ids[0], ids[1]);

    key(&mut editor, "c", Modifiers::empty());
    let out = send(
        &mut editor,
        &[
            InputEvent::down(10.0, 10.0),
            InputEvent::drag(60.0, 10.0),
            InputEvent::up(110.0, 10.0),
        ],
    );
    assert_eq!(out, ToolOutcome::Done);
    let conn = editor.view().selection()[0];
    assert_eq!(editor.drawing().lock().figure_count(), 3);

    editor.view_mut().set_selection([a]);
    key(&mut editor, "Delete", Modifiers::empty());
    {
        let d = editor.drawing().lock();
        assert_eq!(d.children(), &[b]);
    }
    assert_eq!(editor.undo().undo_presentation_name(), "Undo Delete");

    key(&mut editor, "z", Modifiers::CTRL);
    let d = editor.drawing().lock();
    assert_eq!(d.figure_count(), 3);
    let data = d.figure(conn).and_then(Figure::connection).unwrap();
    assert_eq!(data.start.map(|c| c.owner), Some(a));
    assert_eq!(data.end.map(|c| c.owner), Some(b));
}

#[test]
fn group_and_ungroup_round_trip() {
    let (mut editor, ids) = editor_with(&[
        Rect::new(0.0, 0.0, 10.0, 10.0),
        Rect::new(20.0, 0.0, 30.0, 10.0),
        Rect::new(40.0, 0.0, 50.0, 10.0),
    ]);
    editor.view_mut().set_selection([ids[0], ids[1]]);
    key(&mut editor, "g", Modifiers::CTRL);

    let group = editor.view().selection()[0];
    {
        let d = editor.drawing().lock();
        assert_eq!(d.children(), &[group, ids[2]]);
        let members: Vec<FigureId> = match &d.figure(group).unwrap().kind {
            FigureKind::Group { children } => children.iter().map(Figure::id).collect(),
            other => panic!("expected a group, got {other:?}"),
        };
        assert_eq!(members, vec![ids[0], ids[1]]);
    }
    assert_eq!(bounds(&editor, group), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));

    key(&mut editor, "g", Modifiers::CTRL | Modifiers::SHIFT);
    assert_eq!(editor.drawing().lock().children(), &ids[..]);
    assert_eq!(editor.view().selection(), &[ids[0], ids[1]]);

    key(&mut editor, "z", Modifiers::CTRL);
    assert_eq!(editor.drawing().lock().children(), &[group, ids[2]]);
    key(&mut editor, "z", Modifiers::CTRL);
    assert_eq!(editor.drawing().lock().children(), &ids[..]);
}

// ─── Load & Save ────────────────────────────────────────────────────────

#[test]
fn save_and_load_run_in_the_background() {
    let path = temp_path("session.json");
    let (mut editor, _) = editor_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
    key(&mut editor, "o", Modifiers::empty());
    send(
        &mut editor,
        &[InputEvent::down(50.0, 50.0), InputEvent::up(90.0, 80.0)],
    );
    assert!(editor.is_modified());

    editor.save(&path, DrawingFormat::Json).unwrap();
    assert!(!editor.view().is_enabled());
    // Input is dropped while the job runs.
    assert_eq!(key(&mut editor, "a", Modifiers::CTRL), ToolOutcome::Ignored);
    assert!(matches!(
        editor.load(&path, DrawingFormat::Json),
        Err(EditorError::Busy(_))
    ));
    editor.wait_for_worker().unwrap().unwrap();
    assert!(editor.view().is_enabled());
    assert!(!editor.is_modified());
    assert_eq!(editor.undo().undo_len(), 1);

    key(&mut editor, "a", Modifiers::CTRL);
    key(&mut editor, "Delete", Modifiers::empty());
    assert_eq!(editor.drawing().lock().figure_count(), 0);

    editor.load(&path, DrawingFormat::Json).unwrap();
    editor.wait_for_worker().unwrap().unwrap();
    assert_eq!(editor.drawing().lock().figure_count(), 2);
    assert_eq!(editor.undo().undo_len(), 0);
    assert!(editor.view().selection().is_empty());
    assert!(editor.wait_for_worker().is_none());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn failed_load_keeps_the_drawing_and_reenables_the_view() {
    let (mut editor, ids) = editor_with(&[Rect::new(0.0, 0.0, 10.0, 10.0)]);
    editor
        .load(temp_path("missing.json"), DrawingFormat::Json)
        .unwrap();
    let result = editor.wait_for_worker().unwrap();
    assert!(matches!(result, Err(EditorError::Dom(DomError::Io(_)))));
    assert!(editor.view().is_enabled());
    assert_eq!(editor.drawing().lock().children(), &ids[..]);
}
