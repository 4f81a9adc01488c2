//! Property tests for the state manager's history.
//!
//! Random command sequences are dispatched against a fresh manager; the
//! undo/redo round trip, the undo-equals-prefix property and the state
//! invariants must hold for every sequence.

use std::sync::Arc;

use bars_core::{
    reduce, Action, AppState, BarChanges, BarDraft, Command, ManagerConfig, SettingsPatch,
    StateManager, Tool,
};
use proptest::prelude::*;

/// A command shape, resolved against the current state when dispatched.
#[derive(Debug, Clone)]
enum Op {
    Add { width: f32, selected: bool },
    Move { pick: usize, x: f32 },
    Select { pick: usize, selected: bool },
    Remove { pick: usize },
    Unit { pick: usize },
    Join,
    Tool(Tool),
    Grid(f32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1.0f32..300.0, any::<bool>()).prop_map(|(width, selected)| Op::Add { width, selected }),
        2 => (any::<usize>(), -50.0f32..500.0).prop_map(|(pick, x)| Op::Move { pick, x }),
        2 => (any::<usize>(), any::<bool>()).prop_map(|(pick, selected)| Op::Select { pick, selected }),
        1 => any::<usize>().prop_map(|pick| Op::Remove { pick }),
        1 => any::<usize>().prop_map(|pick| Op::Unit { pick }),
        1 => Just(Op::Join),
        1 => prop_oneof![Just(Tool::Bar), Just(Tool::Split), Just(Tool::Join), Just(Tool::Measure)]
            .prop_map(Op::Tool),
        1 => (1.0f32..50.0).prop_map(Op::Grid),
    ]
}

/// Turn an op into a concrete command for `state`.
fn resolve(op: &Op, state: &AppState) -> Command {
    let pick = |i: usize| state.bars.get(i % state.bars.len().max(1)).map(|b| b.id);
    match op {
        Op::Add { width, selected } => Command::AddBar(BarDraft {
            is_selected: Some(*selected),
            ..BarDraft::new().sized(*width, 20.0)
        }),
        Op::Move { pick: i, x } => match pick(*i) {
            Some(id) => Command::ModifyBar {
                id,
                changes: BarChanges::position(*x, 0.0),
            },
            None => Command::AddBar(BarDraft::new()),
        },
        Op::Select { pick: i, selected } => match pick(*i) {
            Some(id) => Command::ModifyBar {
                id,
                changes: BarChanges::selected(*selected),
            },
            None => Command::AddBar(BarDraft::new()),
        },
        Op::Remove { pick: i } => match pick(*i) {
            Some(id) => Command::RemoveBar { id },
            None => Command::AddBar(BarDraft::new()),
        },
        Op::Unit { pick: i } => match pick(*i) {
            Some(id) => Command::SetUnitBar { id },
            None => Command::AddBar(BarDraft::new()),
        },
        Op::Join => match (state.bars.first(), state.bars.last()) {
            (Some(a), Some(b)) if a.id != b.id => Command::JoinBars {
                source_ids: vec![a.id, b.id],
                result_bar: bars_core::geometry::join(a, b),
            },
            _ => Command::AddBar(BarDraft::new()),
        },
        Op::Tool(tool) => Command::ChangeTool { tool: *tool },
        Op::Grid(size) => Command::UpdateSettings(SettingsPatch {
            grid_size: Some(*size),
            ..SettingsPatch::default()
        }),
    }
}

/// Dispatch every op, returning the snapshot before each one and the last.
fn run(manager: &mut StateManager, ops: &[Op]) -> Vec<Arc<AppState>> {
    let mut snapshots = vec![Arc::clone(manager.state())];
    for op in ops {
        let command = resolve(op, manager.state());
        manager.dispatch(command);
        snapshots.push(Arc::clone(manager.state()));
    }
    snapshots
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_all_then_redo_all_restores_final_state(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut manager = StateManager::new();
        let snapshots = run(&mut manager, &ops);
        let last = snapshots.last().cloned().expect("final");

        for _ in 0..ops.len() {
            prop_assert!(manager.undo());
        }
        prop_assert_eq!(manager.state().as_ref(), snapshots[0].as_ref());
        prop_assert!(!manager.undo());

        for _ in 0..ops.len() {
            prop_assert!(manager.redo());
        }
        prop_assert_eq!(manager.state().as_ref(), last.as_ref());
        prop_assert!(!manager.redo());
    }

    #[test]
    fn undo_k_equals_prefix(ops in prop::collection::vec(op_strategy(), 1..40), k in 0usize..40) {
        let mut manager = StateManager::new();
        let snapshots = run(&mut manager, &ops);
        let k = k.min(ops.len());

        for _ in 0..k {
            manager.undo();
        }
        prop_assert_eq!(manager.state().as_ref(), snapshots[ops.len() - k].as_ref());
    }

    #[test]
    fn every_snapshot_satisfies_invariants(ops in prop::collection::vec(op_strategy(), 1..80)) {
        let mut manager = StateManager::new();
        for snapshot in run(&mut manager, &ops) {
            prop_assert_eq!(snapshot.validate(), Ok(()));
            prop_assert!(snapshot.bars.iter().filter(|b| b.is_unit_bar).count() <= 1);
        }
        while manager.undo() {
            prop_assert_eq!(manager.state().validate(), Ok(()));
        }
    }

    #[test]
    fn reduce_is_pure(ops in prop::collection::vec(op_strategy(), 1..30), extra in op_strategy()) {
        let mut manager = StateManager::new();
        run(&mut manager, &ops);
        let state = manager.state().as_ref().clone();
        let action = Action::new(resolve(&extra, &state), 7);

        let first = reduce(&state, &action);
        let second = reduce(&state, &action);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&state, manager.state().as_ref());
    }

    #[test]
    fn log_is_bounded(max in 1usize..20, count in 1usize..60) {
        let mut manager = StateManager::with_config(AppState::new(), ManagerConfig { max_history: max });
        for _ in 0..count {
            manager.dispatch(Command::AddBar(BarDraft::new()));
        }
        prop_assert_eq!(manager.history_len(), count.min(max));

        let mut undone = 0;
        while manager.undo() {
            undone += 1;
        }
        prop_assert_eq!(undone, count.min(max));
        prop_assert_eq!(manager.state().bars.len(), count.saturating_sub(max));
    }
}

// ===========================================================================
// Fixed scenarios
// ===========================================================================

#[test]
fn test_batch_then_undo_reverts_only_last_action() {
    let mut manager = StateManager::new();
    let notified = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let seen = Arc::clone(&notified);
    manager.subscribe(move |_| {
        seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    });

    manager.batch(|m| {
        for width in [10.0, 20.0, 30.0] {
            m.dispatch(Command::AddBar(BarDraft::new().sized(width, 10.0)));
        }
    });
    assert_eq!(notified.load(std::sync::atomic::Ordering::SeqCst), 2);

    assert!(manager.undo());
    let widths: Vec<f32> = manager.state().bars.iter().map(|b| b.width).collect();
    assert_eq!(widths, vec![10.0, 20.0]);
}

#[test]
fn test_redo_buffer_survives_partial_redo() {
    let mut manager = StateManager::new();
    for _ in 0..3 {
        manager.dispatch(Command::AddBar(BarDraft::new()));
    }
    assert!(manager.undo());
    assert!(manager.undo());
    assert!(manager.redo());
    assert!(manager.can_redo());
    assert_eq!(manager.state().bars.len(), 2);
    assert!(manager.redo());
    assert_eq!(manager.state().bars.len(), 3);
}
