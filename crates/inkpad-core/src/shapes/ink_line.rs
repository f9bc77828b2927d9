//! Freehand ink line shape.

use super::{Colour, ShapeKind, ShapeTrait};
use crate::config::PadOptions;
use crate::geometry::Point;
use crate::stroke::StrokeEngine;
use crate::surface::Surface;
use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A freehand stroke: the sampled points in draw order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InkLine {
    #[serde(default = "Colour::black")]
    pub colour: Colour,
    /// Colour restored on deselect.
    #[serde(skip)]
    pub(crate) original_colour: Option<Colour>,
    pub points: Vec<Point>,
}

impl InkLine {
    /// Create a new empty ink line.
    pub fn new(colour: Colour) -> Self {
        Self {
            colour,
            original_colour: Some(colour),
            points: Vec::new(),
        }
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, colour: Colour) -> Self {
        Self {
            points,
            ..Self::new(colour)
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether both lines were sampled at exactly the same points.
    pub fn same_points(&self, other: &InkLine) -> bool {
        self.points == other.points
    }
}

impl ShapeTrait for InkLine {
    fn kind(&self) -> ShapeKind {
        ShapeKind::InkLine
    }

    fn colour(&self) -> Colour {
        self.colour
    }

    fn colour_mut(&mut self) -> &mut Colour {
        &mut self.colour
    }

    fn bounds(&self) -> Rect {
        let mut points = self.points.iter().map(|p| p.to_kurbo());
        let Some(first) = points.next() else {
            return Rect::ZERO;
        };
        points.fold(Rect::from_points(first, first), |rect, p| rect.union_pt(p))
    }

    /// Closest sampled point, not the closest point on the curve.
    fn hit_distance(&self, point: kurbo::Point) -> f64 {
        self.points
            .iter()
            .map(|p| p.to_kurbo().distance(point))
            .fold(f64::INFINITY, f64::min)
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            point.translate(delta);
        }
    }

    fn draw(&self, surface: &mut dyn Surface, options: &PadOptions, colour: Colour) {
        StrokeEngine::new(options.stroke_params()).replay(&self.points, colour, surface);
    }
}
