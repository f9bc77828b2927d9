//! Square (axis-aligned rectangle) shape.

use super::{Colour, ShapeKind, ShapeTrait};
use crate::config::PadOptions;
use crate::surface::Surface;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle centred on `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Square {
    #[serde(default = "Colour::shape_default")]
    pub colour: Colour,
    #[serde(skip)]
    pub(crate) original_colour: Option<Colour>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Square {
    pub fn new(center: Point, w: f64, h: f64, colour: Colour) -> Self {
        Self {
            colour,
            original_colour: Some(colour),
            x: center.x,
            y: center.y,
            w,
            h,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl ShapeTrait for Square {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Square
    }

    fn colour(&self) -> Colour {
        self.colour
    }

    fn colour_mut(&mut self) -> &mut Colour {
        &mut self.colour
    }

    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.center(), (self.w, self.h))
    }

    fn hit_distance(&self, point: Point) -> f64 {
        self.center().distance(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn draw(&self, surface: &mut dyn Surface, _options: &PadOptions, colour: Colour) {
        surface.fill_rect(self.bounds(), colour.into());
    }
}
