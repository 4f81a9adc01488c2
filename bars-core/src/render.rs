//! Renderer boundary.

use std::sync::Arc;

use crate::bar::Bar;
use crate::state::AppState;

/// Draws the full scene from the ordered bar list.
///
/// Called on every state change; implementations redraw everything.
pub trait Renderer {
    /// Redraw all bars, back to front.
    fn render(&mut self, bars: &[Bar]);
}

/// Adapt a renderer into a [`StateManager`](crate::StateManager) subscriber.
pub fn subscriber<R>(mut renderer: R) -> impl FnMut(&Arc<AppState>)
where
    R: Renderer + 'static,
{
    move |state: &Arc<AppState>| renderer.render(&state.bars)
}
