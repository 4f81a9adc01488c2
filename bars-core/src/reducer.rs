//! The pure state transition function.

use crate::action::{Action, Command};
use crate::bar::{Bar, BarChanges, BarDraft, BarId, Split, DEFAULT_BAR_WIDTH};
use crate::geometry::Rect;
use crate::state::{AppState, SettingsPatch};

/// Apply `action` to `state`, returning the next state.
///
/// Never mutates its input; equal inputs give equal outputs. Commands that
/// refer to a missing bar return an unchanged copy.
#[must_use]
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    let mut next = state.clone();
    apply(&mut next, &action.command);
    next
}

/// Apply `command` in place.
pub(crate) fn apply(state: &mut AppState, command: &Command) {
    match command {
        Command::AddBar(draft) => add_bar(state, draft),
        Command::RemoveBar { id } => remove_bar(state, *id),
        Command::ModifyBar { id, changes } => modify_bar(state, *id, changes),
        Command::SplitBar { bar_id, splits } => split_bar(state, *bar_id, splits),
        Command::JoinBars {
            source_ids,
            result_bar,
        } => join_bars(state, source_ids, result_bar),
        Command::SetUnitBar { id } => set_unit_bar(state, *id),
        Command::ChangeTool { tool } => state.current_tool = *tool,
        Command::UpdateSettings(patch) => update_settings(state, patch),
    }
}

fn add_bar(state: &mut AppState, draft: &BarDraft) {
    if state.bar(draft.id).is_some() {
        tracing::trace!(bar_id = %draft.id, "ADD_BAR for existing id ignored");
        return;
    }
    let settings = &state.settings;
    let rect = Rect::new(
        draft.x.unwrap_or(0.0),
        draft.y.unwrap_or(0.0),
        draft.width.filter(|w| *w > 0.0).unwrap_or(DEFAULT_BAR_WIDTH),
        draft
            .height
            .filter(|h| *h > 0.0)
            .unwrap_or(settings.default_height),
    );
    let color = draft
        .color
        .clone()
        .unwrap_or_else(|| settings.default_color.clone());

    let mut bar = Bar::new(rect, color);
    bar.id = draft.id;
    bar.label.clone_from(&draft.label);
    bar.fraction.clone_from(&draft.fraction);
    bar.is_selected = draft.is_selected.unwrap_or(false);

    if bar.is_selected {
        state.selected_bar_ids.push(bar.id);
    }
    state.bars.push(bar);
}

fn remove_bar(state: &mut AppState, id: BarId) {
    state.bars.retain(|b| b.id != id);
    state.selected_bar_ids.retain(|sid| *sid != id);
    if state.unit_bar_id == Some(id) {
        state.unit_bar_id = None;
    }
}

fn modify_bar(state: &mut AppState, id: BarId, changes: &BarChanges) {
    let Some(bar) = state.bars.iter_mut().find(|b| b.id == id) else {
        tracing::trace!(bar_id = %id, "MODIFY_BAR for unknown bar ignored");
        return;
    };
    changes.apply_to(bar);
    let selected = bar.is_selected;
    sync_selection(state, id, selected);
}

fn split_bar(state: &mut AppState, id: BarId, splits: &[Split]) {
    if let Some(bar) = state.bars.iter_mut().find(|b| b.id == id) {
        bar.splits = splits.to_vec();
    }
}

fn join_bars(state: &mut AppState, source_ids: &[BarId], result: &Bar) {
    if source_ids.len() < 2 {
        tracing::trace!("JOIN_BARS with fewer than two sources ignored");
        return;
    }
    state.bars.retain(|b| !source_ids.contains(&b.id));
    state
        .selected_bar_ids
        .retain(|sid| !source_ids.contains(sid));
    if state
        .unit_bar_id
        .is_some_and(|unit| source_ids.contains(&unit))
    {
        state.unit_bar_id = None;
    }

    let mut bar = result.clone();
    bar.is_unit_bar = false;
    let (id, selected) = (bar.id, bar.is_selected);
    state.bars.retain(|b| b.id != id);
    state.bars.push(bar);
    sync_selection(state, id, selected);
}

fn set_unit_bar(state: &mut AppState, id: BarId) {
    if state.bar(id).is_none() {
        tracing::trace!(bar_id = %id, "SET_UNIT_BAR for unknown bar ignored");
        return;
    }
    for bar in &mut state.bars {
        bar.is_unit_bar = bar.id == id;
    }
    state.unit_bar_id = Some(id);
}

fn update_settings(state: &mut AppState, patch: &SettingsPatch) {
    patch.apply_to(&mut state.settings);
}

/// Keep `selected_bar_ids` in step with a bar's `is_selected` flag.
fn sync_selection(state: &mut AppState, id: BarId, selected: bool) {
    let listed = state.selected_bar_ids.contains(&id);
    if selected && !listed {
        state.selected_bar_ids.push(id);
    } else if !selected && listed {
        state.selected_bar_ids.retain(|sid| *sid != id);
    }
}
