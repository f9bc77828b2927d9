//! Drawing pad options.

use crate::shapes::{Colour, ShapeKind};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Drawing mode, selected from the host as a small integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DrawMode {
    #[default]
    Pen = 0,
    Circle = 1,
    Square = 2,
    Triangle = 3,
}

impl DrawMode {
    /// The shape kind produced by a tap in this mode, if it is a shape mode.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            DrawMode::Pen => None,
            DrawMode::Circle => Some(ShapeKind::Circle),
            DrawMode::Square => Some(ShapeKind::Square),
            DrawMode::Triangle => Some(ShapeKind::Triangle),
        }
    }
}

impl TryFrom<u8> for DrawMode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DrawMode::Pen),
            1 => Ok(DrawMode::Circle),
            2 => Ok(DrawMode::Square),
            3 => Ok(DrawMode::Triangle),
            other => Err(other),
        }
    }
}

/// Width modulation parameters for the stroke engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeParams {
    pub min_width: f64,
    pub max_width: f64,
    /// Weight given to the newest velocity sample.
    pub velocity_filter_weight: f64,
    /// Radius of the dot drawn for a tap.
    pub dot_size: f64,
}

impl Default for StrokeParams {
    fn default() -> Self {
        PadOptions::default().stroke_params()
    }
}

/// Tunables for the drawing pad. Every field has a default, so partial JSON works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadOptions {
    pub velocity_filter_weight: f64,
    pub min_width: f64,
    pub max_width: f64,
    /// Tap dot radius; `None` uses the midpoint of the width range.
    pub dot_size: Option<f64>,
    pub pen_colour: Colour,
    /// Colour used to paint selected shapes.
    pub selected_colour: Colour,
    pub background_colour: Colour,
    /// How close a touch must be to a shape to select it.
    pub distance_threshold: f64,
    /// Box occupied by a newly tapped square, circle or triangle.
    pub default_shape_size: Size,
    /// Fill of newly tapped shapes.
    pub shape_colour: Colour,
    /// Window in which a second tap turns into a double tap.
    pub tap_timeout_ms: i64,
    /// Resize floor for squares; triangles and circles derive theirs from it.
    pub min_shape_size: f64,
    /// Resize ceiling as a fraction of the canvas size.
    pub max_shape_fraction: f64,
    pub canvas_size: Size,
}

impl Default for PadOptions {
    fn default() -> Self {
        Self {
            velocity_filter_weight: 0.7,
            min_width: 0.5,
            max_width: 2.5,
            dot_size: None,
            pen_colour: Colour::black(),
            selected_colour: Colour::yellow(),
            background_colour: Colour::transparent(),
            distance_threshold: 20.0,
            default_shape_size: Size::new(40.0, 40.0),
            shape_colour: Colour::shape_default(),
            tap_timeout_ms: 500,
            min_shape_size: 20.0,
            max_shape_fraction: 0.5,
            canvas_size: Size::new(800.0, 600.0),
        }
    }
}

impl PadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn stroke_params(&self) -> StrokeParams {
        StrokeParams {
            min_width: self.min_width,
            max_width: self.max_width,
            velocity_filter_weight: self.velocity_filter_weight,
            dot_size: self
                .dot_size
                .unwrap_or((self.min_width + self.max_width) / 2.0),
        }
    }

    /// Set the stroke width range.
    pub fn with_widths(mut self, min_width: f64, max_width: f64) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    pub fn with_dot_size(mut self, dot_size: f64) -> Self {
        self.dot_size = Some(dot_size);
        self
    }

    pub fn with_pen_colour(mut self, colour: Colour) -> Self {
        self.pen_colour = colour;
        self
    }

    pub fn with_background(mut self, colour: Colour) -> Self {
        self.background_colour = colour;
        self
    }

    pub fn with_velocity_filter_weight(mut self, weight: f64) -> Self {
        self.velocity_filter_weight = weight;
        self
    }

    pub fn with_canvas_size(mut self, width: f64, height: f64) -> Self {
        self.canvas_size = Size::new(width, height);
        self
    }

    pub fn with_tap_timeout(mut self, millis: i64) -> Self {
        self.tap_timeout_ms = millis;
        self
    }
}
