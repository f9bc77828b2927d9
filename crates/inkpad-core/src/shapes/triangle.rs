//! Isosceles triangle shape.

use super::{Colour, ShapeKind, ShapeTrait};
use crate::config::PadOptions;
use crate::surface::Surface;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An upward-pointing isosceles triangle centred on `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    #[serde(default = "Colour::shape_default")]
    pub colour: Colour,
    #[serde(skip)]
    pub(crate) original_colour: Option<Colour>,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Triangle {
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

    /// Bottom-right, apex, bottom-left.
    pub fn vertices(&self) -> [Point; 3] {
        let (hw, hh) = (self.w / 2.0, self.h / 2.0);
        [
            Point::new(self.x + hw, self.y + hh),
            Point::new(self.x, self.y - hh),
            Point::new(self.x - hw, self.y + hh),
        ]
    }
}

impl ShapeTrait for Triangle {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Triangle
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
        surface.fill_polygon(&self.vertices(), colour.into());
    }
}
