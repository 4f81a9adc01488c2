//! Geometry helpers: distances, angles, rectangles, join and split rules.

use serde::{Deserialize, Serialize};

use crate::bar::{Bar, Split};

/// Maximum gap between two edges for them to count as adjacent.
pub const JOIN_TOLERANCE: f32 = 5.0;

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Check if a point lies inside or on the border.
    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

/// Axis along which a bar is cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitOrientation {
    /// A vertical cut line: the parts sit side by side.
    Vertical,
    /// A horizontal cut line: the parts are stacked.
    Horizontal,
}

/// Euclidean distance between two points.
#[must_use]
pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (x2 - x1).hypot(y2 - y1)
}

/// Angle in radians of the vector from the first point to the second.
#[must_use]
pub fn angle(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (y2 - y1).atan2(x2 - x1)
}

/// Whether the two rectangles share a width or a height exactly.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn dimensions_match(a: &Rect, b: &Rect) -> bool {
    a.width == b.width || a.height == b.height
}

/// Whether any facing pair of edges is within `tolerance` of each other.
#[must_use]
pub fn edges_adjacent(a: &Rect, b: &Rect, tolerance: f32) -> bool {
    let near = |p: f32, q: f32| (p - q).abs() <= tolerance;
    near(a.right(), b.x) || near(b.right(), a.x) || near(a.bottom(), b.y) || near(b.bottom(), a.y)
}

/// Whether two bars may be joined into one.
#[must_use]
pub fn can_join(a: &Bar, b: &Bar) -> bool {
    let (ra, rb) = (a.rect(), b.rect());
    dimensions_match(&ra, &rb) && edges_adjacent(&ra, &rb, JOIN_TOLERANCE)
}

/// Build the bar that replaces `first` and `second` after a join.
///
/// The result covers both bars, takes the first bar's color, starts
/// selected and has no splits.
#[must_use]
pub fn join(first: &Bar, second: &Bar) -> Bar {
    let rect = first.rect().union(&second.rect());
    let mut bar = Bar::new(rect, first.color.clone());
    bar.is_selected = true;
    bar
}

/// Cut `bar` in two at the canvas point `(x, y)`.
///
/// Returns `None` when the cut line would not fall strictly inside the bar.
#[must_use]
pub fn split_at(bar: &Bar, x: f32, y: f32, orientation: SplitOrientation) -> Option<Vec<Split>> {
    let (width, height) = (bar.width, bar.height);
    match orientation {
        SplitOrientation::Vertical => {
            let rel_x = x - bar.x;
            if rel_x <= 0.0 || rel_x >= width {
                return None;
            }
            Some(vec![
                Split::new(Rect::new(0.0, 0.0, rel_x, height), bar.color.clone()),
                Split::new(Rect::new(rel_x, 0.0, width - rel_x, height), bar.color.clone()),
            ])
        }
        SplitOrientation::Horizontal => {
            let rel_y = y - bar.y;
            if rel_y <= 0.0 || rel_y >= height {
                return None;
            }
            Some(vec![
                Split::new(Rect::new(0.0, 0.0, width, rel_y), bar.color.clone()),
                Split::new(Rect::new(0.0, rel_y, width, height - rel_y), bar.color.clone()),
            ])
        }
    }
}

/// Round `value` to the nearest multiple of `grid`.
#[must_use]
pub fn snap(value: f32, grid: f32) -> f32 {
    if grid > 0.0 {
        (value / grid).round() * grid
    } else {
        value
    }
}
