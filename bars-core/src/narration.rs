//! Screen-reader narration of bars.

use serde::{Deserialize, Serialize};

use crate::action::current_timestamp_ms;
use crate::bar::Bar;

/// How long an announcement stays in the live region (milliseconds).
pub const CLEAR_AFTER_MS: u64 = 1000;

/// Urgency of an announcement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Read when the user is idle.
    #[default]
    Polite,
    /// Interrupts whatever is being read.
    Assertive,
}

/// Receives bar announcements for assistive technology.
pub trait Narrator {
    /// Announce `description` for `bar`.
    fn announce(&mut self, bar: &Bar, description: &str, priority: Priority);
}

/// Spoken description of a bar: its label, fraction and split count.
#[must_use]
pub fn describe(bar: &Bar) -> String {
    let mut parts = vec![bar.label.clone().unwrap_or_else(|| "Bar".to_string())];
    if bar.is_unit_bar {
        parts.push("unit bar".to_string());
    }
    if let Some(fraction) = &bar.fraction {
        parts.push(format!("fraction {fraction}"));
    }
    match bar.splits.len() {
        0 => {}
        1 => parts.push("1 part".to_string()),
        n => parts.push(format!("{n} parts")),
    }
    parts.join(", ")
}

/// Describe `bar` and hand it to `narrator`.
pub fn announce_bar(narrator: &mut dyn Narrator, bar: &Bar, priority: Priority) {
    narrator.announce(bar, &describe(bar), priority);
}

/// Text currently shown in a live region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Announced text.
    pub text: String,
    /// Urgency.
    pub priority: Priority,
    /// When it was announced (milliseconds).
    pub at_ms: u64,
}

/// A live region that empties itself shortly after each announcement, so
/// the same text can be announced again.
#[derive(Debug, Clone)]
pub struct LiveRegion {
    current: Option<Announcement>,
    clear_after_ms: u64,
}

impl LiveRegion {
    /// Create an empty region that clears after [`CLEAR_AFTER_MS`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: None,
            clear_after_ms: CLEAR_AFTER_MS,
        }
    }

    /// Show `text` as of `now_ms`.
    pub fn post(&mut self, text: impl Into<String>, priority: Priority, now_ms: u64) {
        self.current = Some(Announcement {
            text: text.into(),
            priority,
            at_ms: now_ms,
        });
    }

    /// Clear the region if its announcement has expired. Returns `true` if
    /// something was cleared.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|a| now_ms.saturating_sub(a.at_ms) >= self.clear_after_ms);
        if expired {
            self.current = None;
        }
        expired
    }

    /// The announcement being shown, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Announcement> {
        self.current.as_ref()
    }
}

impl Default for LiveRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl Narrator for LiveRegion {
    fn announce(&mut self, _bar: &Bar, description: &str, priority: Priority) {
        self.post(description, priority, current_timestamp_ms());
    }
}
