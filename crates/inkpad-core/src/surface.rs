//! Rendering surface abstraction.
//!
//! The core paints through a handful of filled primitives so any 2D raster
//! context can host it.

use crate::shapes::Colour;
use kurbo::{Point, Rect, Size, Vec2};
use peniko::Color;
use thiserror::Error;

/// Surface errors.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Read-back is not supported by this surface")]
    Unsupported,
    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// Result type for surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// A 2D raster target.
pub trait Surface {
    /// Drawable size in canvas units.
    fn size(&self) -> Size;

    /// Wipe everything and paint the background.
    fn clear(&mut self, background: Color);

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn fill_ellipse(&mut self, center: Point, radii: Vec2, color: Color);

    /// Fill a closed polygon.
    fn fill_polygon(&mut self, points: &[Point], color: Color);

    /// Encode the current contents as an image blob.
    fn read_back(&self) -> SurfaceResult<Vec<u8>> {
        Err(SurfaceError::Unsupported)
    }
}

/// A primitive recorded by [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { colour: Colour },
    Circle { center: Point, radius: f64, colour: Colour },
    Rect { rect: Rect, colour: Colour },
    Ellipse { center: Point, radii: Vec2, colour: Colour },
    Polygon { points: Vec<Point>, colour: Colour },
}

impl DrawCommand {
    pub fn colour(&self) -> Colour {
        match self {
            DrawCommand::Clear { colour }
            | DrawCommand::Circle { colour, .. }
            | DrawCommand::Rect { colour, .. }
            | DrawCommand::Ellipse { colour, .. }
            | DrawCommand::Polygon { colour, .. } => *colour,
        }
    }
}

/// Surface that keeps a list of everything painted since the last clear.
///
/// Hosts can forward the commands to a foreign 2D context; tests inspect them.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn circle_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
            .count()
    }

    /// Commands painted in `colour`, excluding clears.
    pub fn painted_in(&self, colour: Colour) -> usize {
        self.commands
            .iter()
            .filter(|c| !matches!(c, DrawCommand::Clear { .. }) && c.colour() == colour)
            .count()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self, background: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear {
            colour: background.into(),
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            colour: color.into(),
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Rect {
            rect,
            colour: color.into(),
        });
    }

    fn fill_ellipse(&mut self, center: Point, radii: Vec2, color: Color) {
        self.commands.push(DrawCommand::Ellipse {
            center,
            radii,
            colour: color.into(),
        });
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            colour: color.into(),
        });
    }
}
