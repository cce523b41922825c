//! Geometry primitives.
//!
//! Coordinates are signed: hidden clients are parked at negative x offsets
//! and interactive moves can drag a window partially off-screen.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An x,y coordinate pair relative to the root window.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Point {
    /// An absolute x coordinate relative to the root window
    pub x: i32,
    /// An absolute y coordinate relative to the root window
    pub y: i32,
}

impl Point {
    /// Create a new Point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from(raw: (i32, i32)) -> Self {
        let (x, y) = raw;

        Self { x, y }
    }
}

/// An X window / screen position: top left corner + extent.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Rect {
    /// The x-coordinate of the top left corner of this rect
    pub x: i32,
    /// The y-coordinate of the top left corner of this rect
    pub y: i32,
    /// The width of this rect
    pub w: i32,
    /// The height of this rect
    pub h: i32,
}

impl Rect {
    /// Create a new Rect.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Rect {
        Rect { x, y, w, h }
    }

    /// The x-coordinate one past the right edge of this rect.
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// The y-coordinate one past the bottom edge of this rect.
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Check whether this Rect contains the given [Point].
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// The area (in pixels) of the intersection of this Rect with another.
    ///
    /// Used to pick the dominant monitor for a window that spans several.
    pub fn intersection_area(&self, other: &Rect) -> i32 {
        let dx = 0.max(self.right().min(other.right()) - self.x.max(other.x));
        let dy = 0.max(self.bottom().min(other.bottom()) - self.y.max(other.y));

        dx * dy
    }

    /// Whether this Rect and `other` share any pixels.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.intersection_area(other) > 0
    }

    /// A new Rect of the same size centered inside `outer`.
    pub fn centered_in(&self, outer: &Rect) -> Rect {
        Rect {
            x: outer.x + (outer.w - self.w) / 2,
            y: outer.y + (outer.h - self.h) / 2,
            w: self.w,
            h: self.h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    #[test_case(Point::new(0, 0), false; "outside")]
    #[test_case(Point::new(30, 20), true; "inside")]
    #[test_case(Point::new(10, 20), true; "top left")]
    #[test_case(Point::new(39, 59), true; "bottom right inside")]
    #[test_case(Point::new(40, 60), false; "bottom right edge is exclusive")]
    #[test]
    fn contains_point(p: Point, expected: bool) {
        let r = Rect::new(10, 20, 30, 40);

        assert_eq!(r.contains_point(p), expected);
    }

    #[test_case(Rect::new(0, 0, 100, 100), 2500; "overlapping corner")]
    #[test_case(Rect::new(50, 50, 10, 10), 100; "fully contained")]
    #[test_case(Rect::new(200, 200, 50, 50), 0; "disjoint")]
    #[test_case(Rect::new(100, 50, 50, 50), 0; "edge adjacent")]
    #[test]
    fn intersection_area(other: Rect, expected: i32) {
        let r = Rect::new(50, 50, 100, 100);

        assert_eq!(r.intersection_area(&other), expected);
    }

    #[test]
    fn centered_in() {
        let outer = Rect::new(0, 0, 100, 100);
        let inner = Rect::new(0, 0, 40, 20);

        assert_eq!(inner.centered_in(&outer), Rect::new(30, 40, 40, 20));
    }
}
