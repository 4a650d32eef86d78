//! Surface geometry in abstract units (terminal cells for the TUI)

use serde::{Deserialize, Serialize};

/// A point or displacement
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: Point) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }

    pub fn minus(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }
}

/// An axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Area {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Clamp a point into the area shrunk by `margin` on every side
    ///
    /// If the margin swallows an axis, that axis collapses onto the centre.
    pub fn clamp_inset(&self, p: Point, margin: Point) -> Point {
        fn axis(v: f32, start: f32, len: f32, margin: f32) -> f32 {
            let lo = start + margin;
            let hi = start + len - margin;
            if lo > hi {
                start + len / 2.0
            } else {
                v.clamp(lo, hi)
            }
        }
        Point::new(
            axis(p.x, self.x, self.width, margin.x),
            axis(p.y, self.y, self.height, margin.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inset() {
        let area = Area::new(0.0, 0.0, 40.0, 10.0);
        let clamped = area.clamp_inset(Point::new(-5.0, 50.0), Point::new(4.0, 1.0));
        assert_eq!(clamped, Point::new(4.0, 9.0));
    }

    #[test]
    fn test_clamp_inset_collapses_tiny_axis() {
        let area = Area::new(10.0, 0.0, 4.0, 10.0);
        let clamped = area.clamp_inset(Point::new(0.0, 5.0), Point::new(6.0, 1.0));
        assert_eq!(clamped.x, 12.0);
    }

    #[test]
    fn test_contains() {
        let area = Area::new(1.0, 1.0, 2.0, 2.0);
        assert!(area.contains(Point::new(1.0, 2.9)));
        assert!(!area.contains(Point::new(3.0, 1.0)));
    }
}
