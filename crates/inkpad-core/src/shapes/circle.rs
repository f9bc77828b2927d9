//! Circle (ellipse) shape.

use super::{Colour, ShapeKind, ShapeTrait};
use crate::config::PadOptions;
use crate::surface::Surface;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An ellipse centred on `(x, y)`; `w` and `h` are the horizontal and vertical radii.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    #[serde(default = "Colour::shape_default")]
    pub colour: Colour,
    #[serde(skip)]
    pub(crate) original_colour: Option<Colour>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Circle {
    pub fn new(center: Point, radius_x: f64, radius_y: f64, colour: Colour) -> Self {
        Self {
            colour,
            original_colour: Some(colour),
            x: center.x,
            y: center.y,
            w: radius_x,
            h: radius_y,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn radii(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }
}

impl ShapeTrait for Circle {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Circle
    }

    fn colour(&self) -> Colour {
        self.colour
    }

    fn colour_mut(&mut self) -> &mut Colour {
        &mut self.colour
    }

    fn bounds(&self) -> Rect {
        Rect::new(self.x - self.w, self.y - self.h, self.x + self.w, self.y + self.h)
    }

    fn hit_distance(&self, point: Point) -> f64 {
        self.center().distance(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn draw(&self, surface: &mut dyn Surface, _options: &PadOptions, colour: Colour) {
        surface.fill_ellipse(self.center(), self.radii(), colour.into());
    }
}
