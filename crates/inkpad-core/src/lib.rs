//! Inkpad Core Library
//!
//! Platform-agnostic stroke smoothing, shape model and gesture handling for the
//! inkpad drawing surface.

pub mod canvas;
pub mod config;
pub mod geometry;
pub mod input;
pub mod shapes;
pub mod storage;
pub mod stroke;
pub mod surface;

pub use canvas::{Canvas, CanvasDocument, Outcome};
pub use config::{DrawMode, PadOptions, StrokeParams};
pub use geometry::{BezierSegment, Point};
pub use input::{Command, GestureRouter, GestureState, InputEvent, MouseButton};
pub use shapes::{Colour, InkLine, Shape, ShapeKind, SizeLimits};
pub use storage::{MemoryStorage, Storage, StorageError, StorageResult};
pub use stroke::StrokeEngine;
pub use surface::{DrawCommand, RecordingSurface, Surface, SurfaceError, SurfaceResult};
