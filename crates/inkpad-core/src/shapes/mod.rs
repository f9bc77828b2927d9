//! Shape definitions for the drawing surface.

mod circle;
mod ink_line;
mod square;
mod triangle;

pub use circle::Circle;
pub use ink_line::InkLine;
pub use square::Square;
pub use triangle::Triangle;

use crate::config::PadOptions;
use crate::surface::Surface;
use kurbo::{Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Serializable color (RGBA8), written to JSON as a CSS colour string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn yellow() -> Self {
        Self::rgb(255, 255, 0)
    }

    /// Fill used for geometric shapes when no colour was given.
    pub const fn shape_default() -> Self {
        Self::rgb(0xAA, 0xAA, 0xAA)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl From<Color> for Colour {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self::new(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

impl From<Colour> for Color {
    fn from(colour: Colour) -> Self {
        Color::from_rgba8(colour.r, colour.g, colour.b, colour.a)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Error returned for colour strings that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised colour: {0}")]
pub struct ColourParseError(String);

impl FromStr for Colour {
    type Err = ColourParseError;

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)`
    /// and a handful of names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ColourParseError(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2).ok_or_else(err)?, 16).map_err(|_| err());
            return match hex.len() {
                3 => {
                    let nibble = |i: usize| {
                        u8::from_str_radix(hex.get(i..i + 1).ok_or_else(err)?, 16)
                            .map(|v| v * 17)
                            .map_err(|_| err())
                    };
                    Ok(Self::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
                }
                6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
                8 => Ok(Self::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
                _ => Err(err()),
            };
        }

        let functional = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'));
        if let Some(args) = functional {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            let channel = |p: &str| p.parse::<f64>().map(|v| v.clamp(0.0, 255.0) as u8).map_err(|_| err());
            return match parts[..] {
                [r, g, b] => Ok(Self::rgb(channel(r)?, channel(g)?, channel(b)?)),
                [r, g, b, a] => {
                    let alpha = a.parse::<f64>().map_err(|_| err())?.clamp(0.0, 1.0);
                    Ok(Self::new(channel(r)?, channel(g)?, channel(b)?, (alpha * 255.0).round() as u8))
                }
                _ => Err(err()),
            };
        }

        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Self::black()),
            "white" => Ok(Self::white()),
            "yellow" => Ok(Self::yellow()),
            "green" => Ok(Self::rgb(0, 128, 0)),
            "red" => Ok(Self::rgb(255, 0, 0)),
            "blue" => Ok(Self::rgb(0, 0, 255)),
            "transparent" => Ok(Self::transparent()),
            _ => Err(err()),
        }
    }
}

impl TryFrom<String> for Colour {
    type Error = ColourParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Colour> for String {
    fn from(colour: Colour) -> Self {
        colour.to_string()
    }
}

/// Identifies the variant of a [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    InkLine,
    Square,
    Circle,
    Triangle,
}

/// Behaviour shared by every shape variant.
pub trait ShapeTrait {
    fn kind(&self) -> ShapeKind;

    /// Current fill colour.
    fn colour(&self) -> Colour;

    fn colour_mut(&mut self) -> &mut Colour;

    /// Axis-aligned bounds in canvas coordinates.
    fn bounds(&self) -> Rect;

    /// Distance used for selection. Not a boundary test.
    fn hit_distance(&self, point: kurbo::Point) -> f64;

    fn translate(&mut self, delta: Vec2);

    /// Paint the shape in `colour`.
    fn draw(&self, surface: &mut dyn Surface, options: &PadOptions, colour: Colour);
}

/// Width/height bounds applied when resizing a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub min: f64,
    pub max_width: f64,
    pub max_height: f64,
}

impl SizeLimits {
    pub fn new(min: f64, max_width: f64, max_height: f64) -> Self {
        Self {
            min,
            max_width,
            max_height,
        }
    }

    /// Limits for a shape kind on a canvas of the configured size.
    ///
    /// Triangles get a larger floor; circles store radii, so both bounds are halved.
    pub fn for_kind(kind: ShapeKind, options: &PadOptions) -> Self {
        let min = options.min_shape_size;
        let max_w = options.canvas_size.width * options.max_shape_fraction;
        let max_h = options.canvas_size.height * options.max_shape_fraction;
        match kind {
            ShapeKind::Triangle => Self::new(min * 1.5, max_w, max_h),
            ShapeKind::Circle => Self::new(min / 2.0, max_w / 2.0, max_h / 2.0),
            ShapeKind::Square | ShapeKind::InkLine => Self::new(min, max_w, max_h),
        }
    }
}

/// Apply `delta` to `value` and clamp the result into `[min, max]`.
pub(crate) fn resize_dimension(value: f64, delta: f64, min: f64, max: f64) -> f64 {
    if min > max {
        return value;
    }
    (value + delta).clamp(min, max)
}

/// Every drawable object. Persisted as a record tagged by `"kind"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Shape {
    #[serde(alias = "INKLINE")]
    InkLine(InkLine),
    #[serde(alias = "SQUARE")]
    Square(Square),
    #[serde(alias = "CIRCLE")]
    Circle(Circle),
    #[serde(alias = "TRIANGLE")]
    Triangle(Triangle),
}

impl Shape {
    /// Construct a geometric shape of `kind` centred on `center`.
    ///
    /// Circles receive half of `size` as radii so every kind fills the same box.
    /// Returns `None` for [`ShapeKind::InkLine`], which is built by the stroke engine.
    pub fn create(kind: ShapeKind, center: kurbo::Point, size: kurbo::Size, colour: Colour) -> Option<Self> {
        match kind {
            ShapeKind::Square => Some(Shape::Square(Square::new(center, size.width, size.height, colour))),
            ShapeKind::Circle => Some(Shape::Circle(Circle::new(
                center,
                size.width / 2.0,
                size.height / 2.0,
                colour,
            ))),
            ShapeKind::Triangle => Some(Shape::Triangle(Triangle::new(center, size.width, size.height, colour))),
            ShapeKind::InkLine => None,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::InkLine(s) => s.kind(),
            Shape::Square(s) => s.kind(),
            Shape::Circle(s) => s.kind(),
            Shape::Triangle(s) => s.kind(),
        }
    }

    pub fn colour(&self) -> Colour {
        match self {
            Shape::InkLine(s) => s.colour(),
            Shape::Square(s) => s.colour(),
            Shape::Circle(s) => s.colour(),
            Shape::Triangle(s) => s.colour(),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::InkLine(s) => s.bounds(),
            Shape::Square(s) => s.bounds(),
            Shape::Circle(s) => s.bounds(),
            Shape::Triangle(s) => s.bounds(),
        }
    }

    pub fn hit_distance(&self, point: kurbo::Point) -> f64 {
        match self {
            Shape::InkLine(s) => s.hit_distance(point),
            Shape::Square(s) => s.hit_distance(point),
            Shape::Circle(s) => s.hit_distance(point),
            Shape::Triangle(s) => s.hit_distance(point),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Shape::InkLine(s) => s.translate(delta),
            Shape::Square(s) => s.translate(delta),
            Shape::Circle(s) => s.translate(delta),
            Shape::Triangle(s) => s.translate(delta),
        }
    }

    /// Grow or shrink by `(delta_w, delta_h)` within `limits`.
    /// Ink lines have no box and are left untouched; returns whether anything changed.
    pub fn resize(&mut self, delta_w: f64, delta_h: f64, limits: SizeLimits) -> bool {
        let (w, h) = match self {
            Shape::InkLine(_) => return false,
            Shape::Square(s) => (&mut s.w, &mut s.h),
            Shape::Circle(s) => (&mut s.w, &mut s.h),
            Shape::Triangle(s) => (&mut s.w, &mut s.h),
        };
        let new_w = resize_dimension(*w, delta_w, limits.min, limits.max_width);
        let new_h = resize_dimension(*h, delta_h, limits.min, limits.max_height);
        let changed = new_w != *w || new_h != *h;
        *w = new_w;
        *h = new_h;
        changed
    }

    /// Draw in the shape's own colour.
    pub fn draw(&self, surface: &mut dyn Surface, options: &PadOptions) {
        self.draw_with(surface, options, self.colour());
    }

    /// Draw in an overriding colour (used for selection highlight).
    pub fn draw_with(&self, surface: &mut dyn Surface, options: &PadOptions, colour: Colour) {
        match self {
            Shape::InkLine(s) => s.draw(surface, options, colour),
            Shape::Square(s) => s.draw(surface, options, colour),
            Shape::Circle(s) => s.draw(surface, options, colour),
            Shape::Triangle(s) => s.draw(surface, options, colour),
        }
    }

    /// Change the colour permanently.
    pub fn set_colour(&mut self, colour: Colour) {
        *self.colour_mut() = colour;
        self.commit_colour();
    }

    /// Put back the colour recorded before any temporary change.
    pub fn restore_colour(&mut self) {
        let original = self.original_colour();
        *self.colour_mut() = original;
    }

    /// Record the current colour as the one restored on deselect.
    pub(crate) fn commit_colour(&mut self) {
        let colour = self.colour();
        match self {
            Shape::InkLine(s) => s.original_colour = Some(colour),
            Shape::Square(s) => s.original_colour = Some(colour),
            Shape::Circle(s) => s.original_colour = Some(colour),
            Shape::Triangle(s) => s.original_colour = Some(colour),
        }
    }

    pub fn original_colour(&self) -> Colour {
        let original = match self {
            Shape::InkLine(s) => s.original_colour,
            Shape::Square(s) => s.original_colour,
            Shape::Circle(s) => s.original_colour,
            Shape::Triangle(s) => s.original_colour,
        };
        original.unwrap_or_else(|| self.colour())
    }

    fn colour_mut(&mut self) -> &mut Colour {
        match self {
            Shape::InkLine(s) => s.colour_mut(),
            Shape::Square(s) => s.colour_mut(),
            Shape::Circle(s) => s.colour_mut(),
            Shape::Triangle(s) => s.colour_mut(),
        }
    }

    pub fn as_ink_line(&self) -> Option<&InkLine> {
        match self {
            Shape::InkLine(line) => Some(line),
            _ => None,
        }
    }

    pub fn is_ink_line(&self) -> bool {
        matches!(self, Shape::InkLine(_))
    }
}
