//! CPU rasterizer backing a [`Surface`].

use inkpad_core::surface::{Surface, SurfaceError, SurfaceResult};
use kurbo::{BezPath, Circle, Ellipse, Point, Rect, Shape, Size, Vec2};
use peniko::Color;
use std::path::Path;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// An RGBA8 pixel buffer (straight alpha, row-major).
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidSize { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.offset(x, y);
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Encode the buffer as PNG bytes.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        let mut png_data = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_data, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);

            let mut writer = encoder
                .write_header()
                .map_err(|e| RenderError::Encode(format!("header: {}", e)))?;
            writer
                .write_image_data(&self.pixels)
                .map_err(|e| RenderError::Encode(format!("data: {}", e)))?;
        }
        Ok(png_data)
    }

    /// Encode and write a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let data = self.encode_png()?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Paint every pixel whose centre lies inside `shape`.
    fn fill_shape(&mut self, shape: &impl Shape, color: Color) {
        let rgba = color.to_rgba8();
        if rgba.a == 0 {
            return;
        }
        let canvas = Rect::new(0.0, 0.0, self.width as f64, self.height as f64);
        let area = shape.bounding_box().intersect(canvas);
        if area.width() <= 0.0 || area.height() <= 0.0 {
            return;
        }

        let x0 = area.x0.floor() as u32;
        let y0 = area.y0.floor() as u32;
        let x1 = (area.x1.ceil() as u32).min(self.width);
        let y1 = (area.y1.ceil() as u32).min(self.height);
        let src = [rgba.r, rgba.g, rgba.b, rgba.a];

        for y in y0..y1 {
            for x in x0..x1 {
                if shape.contains(Point::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    let i = self.offset(x, y);
                    blend_over(&mut self.pixels[i..i + 4], src);
                }
            }
        }
    }
}

/// Source-over compositing of straight-alpha RGBA8.
fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    if src[3] == 255 {
        dst.copy_from_slice(&src);
        return;
    }
    let sa = src[3] as f64 / 255.0;
    let da = dst[3] as f64 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        dst.fill(0);
        return;
    }
    for c in 0..3 {
        let value = (src[c] as f64 * sa + dst[c] as f64 * da * (1.0 - sa)) / out_a;
        dst[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }

    fn clear(&mut self, background: Color) {
        let rgba = background.to_rgba8();
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[rgba.r, rgba.g, rgba.b, rgba.a]);
        }
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        self.fill_shape(&Circle::new(center, radius), color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_shape(&rect, color);
    }

    fn fill_ellipse(&mut self, center: Point, radii: Vec2, color: Color) {
        self.fill_shape(&Ellipse::new(center, radii, 0.0), color);
    }

    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        let mut path = BezPath::new();
        path.move_to(*first);
        for point in rest {
            path.line_to(*point);
        }
        path.close_path();
        self.fill_shape(&path, color);
    }

    fn read_back(&self) -> SurfaceResult<Vec<u8>> {
        self.encode_png().map_err(|e| SurfaceError::Encode(e.to_string()))
    }
}
