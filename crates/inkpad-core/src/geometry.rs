//! Timestamped points and cubic Bézier segments used by the stroke engine.

use kurbo::{CubicBez, ParamCurve, Vec2};
use serde::{Deserialize, Serialize};

/// Number of uniform parameter steps used to approximate curve length.
const LENGTH_STEPS: usize = 10;

/// A sampled input point in canvas coordinates.
///
/// `time` is in milliseconds and only matters relative to neighbouring points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub time: i64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64, time: i64) -> Self {
        Self { x, y, time }
    }

    /// Create a point from a kurbo point at the given time.
    pub fn from_kurbo(point: kurbo::Point, time: i64) -> Self {
        Self::new(point.x, point.y, time)
    }

    /// Drop the timestamp.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }

    /// Euclidean distance between two points.
    pub fn distance_to(&self, other: &Point) -> f64 {
        self.to_kurbo().distance(other.to_kurbo())
    }

    /// Speed from `previous` to `self` in units per millisecond.
    ///
    /// Equal timestamps yield 1 so that widths stay stable at low sampling rates.
    /// Timestamps running backwards are treated the same way.
    pub fn velocity_from(&self, previous: &Point) -> f64 {
        if self.time <= previous.time {
            1.0
        } else {
            self.distance_to(previous) / (self.time - previous.time) as f64
        }
    }

    /// Move the point in place, keeping its timestamp.
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// A cubic Bézier segment of an ink stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierSegment {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl BezierSegment {
    pub fn new(start: Point, control1: Point, control2: Point, end: Point) -> Self {
        Self {
            start,
            control1,
            control2,
            end,
        }
    }

    /// Build the segment running from `window[1]` to `window[2]`, with control
    /// points estimated from the neighbouring points `window[0]` and `window[3]`.
    pub fn from_window(window: &[Point; 4]) -> Self {
        let (_, c2) = control_points(&window[0], &window[1], &window[2]);
        let (c3, _) = control_points(&window[1], &window[2], &window[3]);
        Self::new(window[1], c2, c3, window[2])
    }

    /// The kurbo representation (timestamps dropped).
    pub fn as_cubic(&self) -> CubicBez {
        CubicBez::new(
            self.start.to_kurbo(),
            self.control1.to_kurbo(),
            self.control2.to_kurbo(),
            self.end.to_kurbo(),
        )
    }

    /// Evaluate the curve at parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> kurbo::Point {
        self.as_cubic().eval(t)
    }

    /// Approximate arc length: sum of chords between 11 uniformly sampled points.
    pub fn length(&self) -> f64 {
        let cubic = self.as_cubic();
        let mut length = 0.0;
        let mut previous = cubic.eval(0.0);
        for i in 1..=LENGTH_STEPS {
            let current = cubic.eval(i as f64 / LENGTH_STEPS as f64);
            length += previous.distance(current);
            previous = current;
        }
        length
    }

    /// The same curve traversed end to start.
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.control2, self.control1, self.start)
    }
}

/// Estimate the two control points around `s2` for the triple `s1, s2, s3`.
///
/// The midpoints of both segments are weighted by the ratio of the segment
/// lengths and then shifted so the weighted midpoint lands on `s2`. The first
/// returned point lies on the `s1` side, the second on the `s3` side.
pub fn control_points(s1: &Point, s2: &Point, s3: &Point) -> (Point, Point) {
    let m1 = kurbo::Point::new((s1.x + s2.x) / 2.0, (s1.y + s2.y) / 2.0);
    let m2 = kurbo::Point::new((s2.x + s3.x) / 2.0, (s2.y + s3.y) / 2.0);

    let l1 = s1.distance_to(s2);
    let l2 = s2.distance_to(s3);
    let k = if l1 + l2 > 0.0 { l2 / (l1 + l2) } else { 0.0 };

    let cm = m2 + (m1 - m2) * k;
    let shift = s2.to_kurbo() - cm;

    (
        Point::from_kurbo(m1 + shift, s2.time),
        Point::from_kurbo(m2 + shift, s2.time),
    )
}
