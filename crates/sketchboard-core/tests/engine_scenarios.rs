//! End-to-end behavior of the interaction engine.

use kurbo::Point;
use pollster::block_on;
use sketchboard_core::shapes::{Rectangle, Text};
use sketchboard_core::{
    Engine, InputEvent, MemoryStore, ProjectStore, ProjectSync, SerializableColor, Shape,
    StorageError, ToolKind,
};

fn drag(engine: &mut Engine, from: (f64, f64), moves: &[(f64, f64)], to: (f64, f64)) {
    let _ = env_logger::builder().is_test(true).try_init();
    engine.handle_event(InputEvent::PointerDown {
        position: Point::new(from.0, from.1),
    });
    for &(x, y) in moves {
        engine.handle_event(InputEvent::PointerMove {
            position: Point::new(x, y),
        });
    }
    engine.handle_event(InputEvent::PointerUp {
        position: Point::new(to.0, to.1),
    });
}

#[test]
fn rect_drag_matches_final_pointer_delta() {
    let cases = [
        ((10.0, 10.0), vec![(20.0, 20.0), (30.0, 5.0)], (40.0, 25.0)),
        ((50.0, 50.0), vec![], (20.0, 10.0)),
        ((0.0, 0.0), vec![(5.0, 5.0)], (0.0, 0.0)),
    ];

    for (origin, moves, end) in cases {
        let mut engine = Engine::new();
        engine.set_tool(ToolKind::Rect);
        drag(&mut engine, origin, &moves, end);

        assert_eq!(engine.shapes().len(), 1);
        match &engine.shapes()[0] {
            Shape::Rect(rect) => {
                assert_eq!(rect.position, Point::new(origin.0, origin.1));
                assert_eq!(rect.width, end.0 - origin.0);
                assert_eq!(rect.height, end.1 - origin.1);
            }
            other => panic!("expected rect, got {other:?}"),
        }
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.tool(), ToolKind::Move);
    }
}

#[test]
fn circle_scenario() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Circle);
    drag(&mut engine, (10.0, 10.0), &[(13.0, 14.0)], (13.0, 14.0));

    assert_eq!(engine.shapes().len(), 1);
    match &engine.shapes()[0] {
        Shape::Circle(circle) => {
            assert_eq!(circle.center, Point::new(10.0, 10.0));
            assert_eq!(circle.radius, 5.0);
        }
        other => panic!("expected circle, got {other:?}"),
    }

    let entries = engine.history().entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].as_slice(), engine.shapes());
}

#[test]
fn undo_restores_previous_commits() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Rect);
    drag(&mut engine, (0.0, 0.0), &[], (10.0, 10.0));
    let after_rect = engine.snapshot();

    engine.set_tool(ToolKind::Circle);
    drag(&mut engine, (50.0, 50.0), &[], (60.0, 50.0));
    assert_eq!(engine.shapes().len(), 2);

    engine.undo();
    assert_eq!(engine.shapes(), after_rect.as_slice());
    assert!(matches!(engine.shapes()[0], Shape::Rect(_)));

    engine.undo();
    assert!(engine.shapes().is_empty());
}

#[test]
fn undo_on_empty_is_idempotent() {
    let mut engine = Engine::new();
    engine.undo();
    let first = engine.shapes().to_vec();
    engine.undo();
    assert_eq!(engine.shapes(), first.as_slice());
    assert!(first.is_empty());
    assert!(engine.history().is_empty());
}

#[test]
fn zero_length_lines_and_arrows_are_discarded() {
    for tool in [ToolKind::Line, ToolKind::Arrow] {
        let mut engine = Engine::new();
        engine.set_tool(ToolKind::Rect);
        drag(&mut engine, (0.0, 0.0), &[], (5.0, 5.0));

        engine.set_tool(tool);
        drag(&mut engine, (30.0, 30.0), &[], (30.0, 30.0));
        assert_eq!(engine.shapes().len(), 1, "{tool} left a shape behind");
        assert_eq!(engine.history().len(), 1);

        drag(&mut engine, (30.0, 30.0), &[(40.0, 40.0)], (30.0, 30.0));
        assert_eq!(engine.shapes().len(), 1, "{tool} returning to start left a shape");
    }
}

#[test]
fn arrow_tool_commits_arrowed_line() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Arrow);
    drag(&mut engine, (0.0, 0.0), &[(5.0, 5.0), (8.0, 9.0)], (10.0, 10.0));

    match &engine.shapes()[0] {
        Shape::Line(line) => {
            assert!(line.arrowed);
            assert_eq!(line.points, vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        }
        other => panic!("expected arrow, got {other:?}"),
    }
}

#[test]
fn eraser_strokes_are_erasing_freehand() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Eraser);
    drag(&mut engine, (0.0, 0.0), &[(1.0, 0.0), (2.0, 0.0)], (2.0, 0.0));

    match &engine.shapes()[0] {
        Shape::Freehand(stroke) => {
            assert!(stroke.erasing);
            assert_eq!(stroke.points.len(), 3);
        }
        other => panic!("expected eraser stroke, got {other:?}"),
    }
}

#[test]
fn text_blur_without_typing_leaves_canvas_unchanged() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Text);
    engine.handle_event(InputEvent::DoubleClick {
        position: Point::new(20.0, 20.0),
    });
    assert_eq!(engine.shapes().len(), 1);

    engine.handle_event(InputEvent::TextBlur);

    assert!(engine.shapes().is_empty());
    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.tool(), ToolKind::Move);
}

#[test]
fn text_typed_then_blurred_is_kept() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Text);
    engine.handle_event(InputEvent::DoubleClick {
        position: Point::new(20.0, 20.0),
    });
    for partial in ["H", "He", "Hell", "Hello"] {
        engine.handle_event(InputEvent::TextInput {
            content: partial.to_string(),
        });
    }
    assert!(engine.history().is_empty());

    engine.handle_event(InputEvent::TextBlur);

    assert_eq!(engine.shapes().len(), 1);
    match &engine.shapes()[0] {
        Shape::Text(text) => {
            assert_eq!(text.content, "Hello");
            assert_eq!(text.position, Point::new(20.0, 20.0));
        }
        other => panic!("expected text, got {other:?}"),
    }
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn history_entries_are_isolated_from_live_edits() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Rect);
    drag(&mut engine, (0.0, 0.0), &[], (10.0, 10.0));
    let recorded = engine.history().latest();

    engine.select_index(0);
    engine.set_color(SerializableColor::rgb(255, 0, 0));

    assert_eq!(engine.shapes()[0].style().color, SerializableColor::rgb(255, 0, 0));
    assert_eq!(recorded[0].style().color, SerializableColor::black());
    assert_eq!(
        engine.history().entries()[0][0].style().color,
        SerializableColor::black()
    );
}

#[test]
fn pointer_events_out_of_order_are_ignored() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Pencil);
    engine.handle_event(InputEvent::PointerMove {
        position: Point::new(1.0, 1.0),
    });
    engine.handle_event(InputEvent::PointerUp {
        position: Point::new(1.0, 1.0),
    });
    engine.handle_event(InputEvent::TextInput {
        content: "stray".to_string(),
    });
    engine.handle_event(InputEvent::TextBlur);

    assert!(engine.shapes().is_empty());
    assert!(engine.history().is_empty());
    assert_eq!(engine.tool(), ToolKind::Pencil);
}

#[test]
fn load_replaces_canvas_and_history_floor() {
    let store = MemoryStore::new();
    let stored = vec![
        Shape::Rect(Rectangle::new(Point::ZERO, 10.0, 10.0)),
        Shape::Text(Text::new(Point::new(5.0, 5.0), "saved")),
    ];
    block_on(store.save("board", &stored)).unwrap();
    let sync = ProjectSync::new(store, "board");

    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Circle);
    drag(&mut engine, (0.0, 0.0), &[], (3.0, 4.0));

    assert!(engine.apply_sync(block_on(sync.load())).is_none());
    assert_eq!(engine.shapes(), stored.as_slice());
    assert!(engine.history().is_empty());
    assert!(!engine.is_dirty());

    engine.undo();
    engine.undo();
    assert_eq!(engine.shapes(), stored.as_slice());
}

#[test]
fn failed_load_keeps_local_content() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Rect);
    drag(&mut engine, (0.0, 0.0), &[], (10.0, 10.0));
    let before = engine.snapshot();

    let notice = engine.apply_load(
        "board",
        Err(StorageError::Http {
            status: 500,
            body: "boom".to_string(),
        }),
    );

    assert!(notice.is_some());
    assert_eq!(engine.shapes(), before.as_slice());
    assert_eq!(engine.history().len(), 1);
}

#[test]
fn unknown_project_loads_empty() {
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Rect);
    drag(&mut engine, (0.0, 0.0), &[], (10.0, 10.0));

    let notice = engine.apply_load("new", Err(StorageError::NotFound("new".to_string())));
    assert!(notice.is_none());
    assert!(engine.shapes().is_empty());
}

#[test]
fn save_marks_clean_while_editing_continues() {
    let sync = ProjectSync::new(MemoryStore::new(), "board");
    let mut engine = Engine::new();
    engine.set_tool(ToolKind::Rect);
    drag(&mut engine, (0.0, 0.0), &[], (10.0, 10.0));

    let pending = engine.snapshot();
    engine.set_tool(ToolKind::Circle);
    drag(&mut engine, (20.0, 20.0), &[], (25.0, 20.0));

    // The save finishes after another edit: the canvas is still dirty.
    assert!(engine.apply_sync(block_on(sync.save(pending))).is_none());
    assert!(engine.is_dirty());

    let stored = block_on(sync.store().load("board")).unwrap();
    assert_eq!(stored.len(), 1);
}
