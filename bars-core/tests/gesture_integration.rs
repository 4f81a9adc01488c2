//! Integration tests for pointer input flowing through the controller into
//! the state manager and out to renderer and narrator subscribers.

use std::cell::RefCell;
use std::rc::Rc;

use bars_core::narration::{announce_bar, describe};
use bars_core::render;
use bars_core::{
    Bar, BarDraft, Command, GestureClassifier, GestureConfig, GestureIntent, InputController,
    LiveRegion, PointerEvent, PointerPhase, Priority, Renderer, SplitOrientation, StateManager,
    Tool,
};

fn event(id: u32, phase: PointerPhase, x: f32, y: f32, timestamp_ms: u64) -> PointerEvent {
    PointerEvent {
        id,
        phase,
        x,
        y,
        timestamp_ms,
    }
}

struct FrameLog(Rc<RefCell<Vec<Vec<Bar>>>>);

impl Renderer for FrameLog {
    fn render(&mut self, bars: &[Bar]) {
        self.0.borrow_mut().push(bars.to_vec());
    }
}

// ===========================================================================
// Classifier scenarios
// ===========================================================================

#[test]
fn test_classifier_reference_moves() {
    let cases = [
        ((2.0, 20.0), Some("vertical")),
        ((20.0, 2.0), Some("horizontal")),
        ((15.0, 15.0), Some("drag")),
        ((3.0, 3.0), None),
    ];
    for ((x, y), expected) in cases {
        let mut classifier = GestureClassifier::new();
        classifier.pointer_down(1, 0.0, 0.0, 0);
        let got = match classifier.pointer_move(1, x, y) {
            Some(GestureIntent::Split {
                orientation: SplitOrientation::Vertical,
                ..
            }) => Some("vertical"),
            Some(GestureIntent::Split {
                orientation: SplitOrientation::Horizontal,
                ..
            }) => Some("horizontal"),
            Some(GestureIntent::Drag { .. }) => Some("drag"),
            Some(other) => panic!("unexpected intent {other:?}"),
            None => None,
        };
        assert_eq!(got, expected, "move to ({x}, {y})");
    }
}

#[test]
fn test_tap_timing() {
    let mut classifier = GestureClassifier::new();
    classifier.pointer_down(1, 5.0, 5.0, 1_000);
    assert_eq!(
        classifier.pointer_up(1, 5.0, 5.0, 1_200),
        Some(GestureIntent::Select { x: 5.0, y: 5.0 })
    );

    classifier.pointer_down(1, 5.0, 5.0, 2_000);
    assert_eq!(classifier.pointer_up(1, 5.0, 5.0, 2_400), None);
}

#[test]
fn test_latched_classification_keeps_first_intent() {
    let mut classifier = GestureClassifier::with_config(GestureConfig {
        latch_classification: true,
        ..GestureConfig::default()
    });
    classifier.pointer_down(1, 0.0, 0.0, 0);
    assert!(matches!(
        classifier.pointer_move(1, 2.0, 20.0),
        Some(GestureIntent::Split { .. })
    ));
    // Diagonal now, but the split classification is kept.
    assert!(matches!(
        classifier.pointer_move(1, 40.0, 40.0),
        Some(GestureIntent::Split {
            orientation: SplitOrientation::Vertical,
            ..
        })
    ));
}

#[test]
fn test_pinch_then_release_reanchors_remaining_pointer() {
    let mut classifier = GestureClassifier::new();
    classifier.pointer_down(1, 0.0, 0.0, 0);
    classifier.pointer_down(2, 100.0, 0.0, 10);

    match classifier.pointer_move(2, 400.0, 0.0) {
        Some(GestureIntent::Pinch { scale, .. }) => assert!((scale - 2.0).abs() < f32::EPSILON),
        other => panic!("expected pinch, got {other:?}"),
    }
    assert_eq!(classifier.pointer_up(2, 400.0, 0.0, 50), None);

    // The remaining pointer starts fresh from where it is.
    assert_eq!(classifier.pointer_move(1, 3.0, 3.0), None);
    assert!(matches!(
        classifier.pointer_move(1, 3.0, 30.0),
        Some(GestureIntent::Split { .. })
    ));
    // Re-anchoring cost the remaining pointer its tap eligibility.
    assert_eq!(classifier.pointer_up(1, 3.0, 30.0, 60), None);
}

#[test]
fn test_three_pointers_emit_nothing() {
    let mut classifier = GestureClassifier::new();
    classifier.pointer_down(1, 0.0, 0.0, 0);
    classifier.pointer_down(2, 50.0, 0.0, 0);
    classifier.pointer_down(3, 100.0, 0.0, 0);
    assert_eq!(classifier.pointer_move(3, 200.0, 50.0), None);
    assert_eq!(classifier.active_pointers(), 3);
}

// ===========================================================================
// Controller end to end
// ===========================================================================

#[test]
fn test_pointer_script_builds_and_splits_bar() {
    let mut manager = StateManager::new();
    let frames = Rc::new(RefCell::new(Vec::new()));
    manager.subscribe(render::subscriber(FrameLog(Rc::clone(&frames))));
    let mut input = InputController::new();

    // Tap on empty canvas adds a bar at the tap point.
    for e in [
        event(0, PointerPhase::Down, 20.0, 20.0, 0),
        event(0, PointerPhase::Up, 20.0, 20.0, 80),
    ] {
        input.handle_pointer(&mut manager, &e);
    }
    assert_eq!(manager.state().bars.len(), 1);

    // Switch to the split tool and cut the bar vertically at x = 70.
    manager.dispatch(Command::ChangeTool { tool: Tool::Split });
    for e in [
        event(0, PointerPhase::Down, 70.0, 25.0, 1_000),
        event(0, PointerPhase::Move, 71.0, 45.0, 1_050),
        event(0, PointerPhase::Move, 70.0, 60.0, 1_100),
        event(0, PointerPhase::Up, 70.0, 60.0, 1_400),
    ] {
        input.handle_pointer(&mut manager, &e);
    }

    let bar = &manager.state().bars[0];
    assert_eq!(bar.splits.len(), 2);
    assert!((bar.splits[0].width - 51.0).abs() < f32::EPSILON);
    assert_eq!(describe(bar), "Bar, 2 parts");

    // Initial frame, add, tool change, split.
    let frames = frames.borrow();
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[3][0].splits.len(), 2);
}

#[test]
fn test_cancelled_pointer_dispatches_nothing() {
    let mut manager = StateManager::new();
    let mut input = InputController::new();
    input.handle_pointer(&mut manager, &event(0, PointerPhase::Down, 10.0, 10.0, 0));
    input.handle_pointer(&mut manager, &event(0, PointerPhase::Cancel, 10.0, 10.0, 20));
    assert_eq!(
        input.handle_pointer(&mut manager, &event(0, PointerPhase::Up, 10.0, 10.0, 40)),
        None
    );
    assert!(manager.state().bars.is_empty());
    assert!(!manager.can_undo());
}

#[test]
fn test_whole_drag_undoes_in_one_step() {
    let mut manager = StateManager::new();
    let draft = BarDraft::new().at(0.0, 0.0).sized(100.0, 40.0);
    let id = draft.id;
    manager.dispatch(Command::AddBar(draft));
    let mut input = InputController::new();

    input.pointer_down(&manager, 0, 10.0, 10.0, 0);
    input.pointer_move(&mut manager, 0, 30.0, 30.0);
    input.pointer_move(&mut manager, 0, 50.0, 50.0);
    input.pointer_up(&mut manager, 0, 50.0, 50.0, 600);

    let moved = manager.state().bar(id).expect("bar");
    assert!((moved.x - 40.0).abs() < f32::EPSILON);

    assert!(manager.undo());
    let back = manager.state().bar(id).expect("bar");
    assert!(back.x.abs() < f32::EPSILON);
    // Only the add is left.
    assert_eq!(manager.history_len(), 1);
}

#[test]
fn test_selection_is_announced() {
    let mut manager = StateManager::new();
    manager.dispatch(Command::AddBar(BarDraft::new().labeled("Whole")));
    let region = Rc::new(RefCell::new(LiveRegion::new()));

    let sink = Rc::clone(&region);
    manager.subscribe(move |state| {
        if let Some(bar) = state.selected_bars().last() {
            announce_bar(&mut *sink.borrow_mut(), bar, Priority::Polite);
        }
    });

    let mut input = InputController::new();
    input.pointer_down(&manager, 0, 10.0, 10.0, 0);
    input.pointer_up(&mut manager, 0, 10.0, 10.0, 50);

    let region = region.borrow();
    let shown = region.current().expect("announcement");
    assert_eq!(shown.text, "Whole");
}
