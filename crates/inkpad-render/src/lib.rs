//! Inkpad Render Library
//!
//! Software raster implementation of the inkpad drawing surface, with PNG
//! read-back used for snapshots and export.

mod raster;

pub use raster::{RasterSurface, RenderError, RenderResult};
