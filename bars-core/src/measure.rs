//! Measuring bars against the unit bar.

use serde::{Deserialize, Serialize};

use crate::action::Command;
use crate::bar::{Bar, BarChanges};
use crate::state::AppState;

/// Largest denominator considered when naming a measured fraction.
pub const MAX_DENOMINATOR: u32 = 24;

/// A non-negative fraction in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    /// Numerator.
    pub numerator: u32,
    /// Denominator, never zero.
    pub denominator: u32,
}

impl Fraction {
    /// Create a fraction reduced to lowest terms. A zero denominator is
    /// treated as one.
    #[must_use]
    pub fn new(numerator: u32, denominator: u32) -> Self {
        let denominator = denominator.max(1);
        let divisor = gcd(numerator, denominator).max(1);
        Self {
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        }
    }

    /// Closest fraction to `ratio` with a denominator of at most
    /// `max_denominator`; ties go to the smaller denominator.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn approximate(ratio: f32, max_denominator: u32) -> Self {
        let ratio = f64::from(ratio.max(0.0));
        let mut best = Self::new(ratio.round() as u32, 1);
        let mut best_error = (ratio - f64::from(best.numerator)).abs();

        for denominator in 2..=max_denominator.max(1) {
            let numerator = (ratio * f64::from(denominator)).round() as u32;
            let error = (ratio - f64::from(numerator) / f64::from(denominator)).abs();
            if error + f64::EPSILON < best_error {
                best = Self::new(numerator, denominator);
                best_error = error;
            }
        }
        best
    }

    /// Value as a float.
    #[must_use]
    pub fn value(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }
}

impl std::fmt::Display for Fraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{}/{}", self.numerator, self.denominator)
        }
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Length of `bar` as a fraction of `unit`, by width.
#[must_use]
pub fn fraction_of(bar: &Bar, unit: &Bar) -> Option<Fraction> {
    (unit.width > 0.0).then(|| Fraction::approximate(bar.width / unit.width, MAX_DENOMINATOR))
}

/// Commands that label every bar with its measured fraction.
///
/// Empty when no unit bar is set; bars whose label is already current are
/// skipped.
#[must_use]
pub fn measure_all(state: &AppState) -> Vec<Command> {
    let Some(unit) = state.unit_bar() else {
        return Vec::new();
    };
    state
        .bars
        .iter()
        .filter_map(|bar| {
            let text = fraction_of(bar, unit)?.to_string();
            (bar.fraction.as_deref() != Some(text.as_str())).then(|| Command::ModifyBar {
                id: bar.id,
                changes: BarChanges::fraction(text),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::bar::BarDraft;
    use crate::reducer::reduce;

    fn bar(width: f32) -> Bar {
        Bar::new(crate::geometry::Rect::new(0.0, 0.0, width, 20.0), "#000")
    }

    #[test]
    fn test_fraction_reduces() {
        let f = Fraction::new(6, 8);
        assert_eq!(f, Fraction::new(3, 4));
        assert_eq!(f.to_string(), "3/4");
        assert_eq!(Fraction::new(4, 2).to_string(), "2");
        assert_eq!(Fraction::new(0, 5).to_string(), "0");
    }

    #[test]
    fn test_approximate_common_fractions() {
        assert_eq!(Fraction::approximate(0.5, 24).to_string(), "1/2");
        assert_eq!(Fraction::approximate(0.3334, 24).to_string(), "1/3");
        assert_eq!(Fraction::approximate(1.5, 24).to_string(), "3/2");
        assert_eq!(Fraction::approximate(0.125, 24).to_string(), "1/8");
        assert_eq!(Fraction::approximate(1.0, 24).to_string(), "1");
    }

    #[test]
    fn test_fraction_of_unit() {
        let unit = bar(120.0);
        assert_eq!(fraction_of(&bar(40.0), &unit), Some(Fraction::new(1, 3)));
        assert_eq!(fraction_of(&bar(90.0), &unit), Some(Fraction::new(3, 4)));
    }

    #[test]
    fn test_measure_all_without_unit_is_empty() {
        let state = reduce(
            &AppState::new(),
            &Action::new(Command::AddBar(BarDraft::new()), 0),
        );
        assert!(measure_all(&state).is_empty());
    }

    #[test]
    fn test_measure_all_labels_bars() {
        let unit = BarDraft::new().sized(100.0, 20.0);
        let half = BarDraft::new().sized(50.0, 20.0);
        let (unit_id, half_id) = (unit.id, half.id);
        let mut state = AppState::new();
        for command in [
            Command::AddBar(unit),
            Command::AddBar(half),
            Command::SetUnitBar { id: unit_id },
        ] {
            state = reduce(&state, &Action::new(command, 0));
        }

        let commands = measure_all(&state);
        assert_eq!(commands.len(), 2);
        for command in &commands {
            state = reduce(&state, &Action::new(command.clone(), 0));
        }
        assert_eq!(
            state.bar(half_id).and_then(|b| b.fraction.as_deref()),
            Some("1/2")
        );
        assert_eq!(
            state.bar(unit_id).and_then(|b| b.fraction.as_deref()),
            Some("1")
        );
        assert!(measure_all(&state).is_empty());
    }
}
