//! Incremental stroke smoothing.
//!
//! Raw input points are fitted with cubic Bézier segments over a sliding window
//! of four points, and each segment is painted as a run of dots whose radius
//! follows the pen velocity: fast movement gives thin ink, slow movement thick.

use crate::config::StrokeParams;
use crate::geometry::{BezierSegment, Point};
use crate::shapes::{Colour, InkLine};
use crate::surface::Surface;

/// Window capacity needed to fit one segment.
const WINDOW: usize = 4;

/// Upper bound on dots painted for one segment.
const MAX_SEGMENT_DOTS: usize = 16_384;

/// Smooths one stroke at a time.
#[derive(Debug, Clone)]
pub struct StrokeEngine {
    params: StrokeParams,
    window: Vec<Point>,
    last_velocity: f64,
    last_width: f64,
    colour: Colour,
    /// Line being recorded; `None` while replaying or idle.
    line: Option<InkLine>,
    raw_points: usize,
    segments: usize,
}

impl StrokeEngine {
    pub fn new(params: StrokeParams) -> Self {
        Self {
            params,
            window: Vec::with_capacity(WINDOW),
            last_velocity: 0.0,
            last_width: (params.min_width + params.max_width) / 2.0,
            colour: Colour::black(),
            line: None,
            raw_points: 0,
            segments: 0,
        }
    }

    pub fn params(&self) -> &StrokeParams {
        &self.params
    }

    pub fn set_params(&mut self, params: StrokeParams) {
        self.params = params;
        self.reset();
    }

    /// Forget the in-progress stroke, if any.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_velocity = 0.0;
        self.last_width = (self.params.min_width + self.params.max_width) / 2.0;
        self.line = None;
        self.raw_points = 0;
        self.segments = 0;
    }

    /// Whether a stroke has begun and not yet ended.
    pub fn is_active(&self) -> bool {
        self.line.is_some()
    }

    /// Segments painted since the last reset.
    pub fn segments_emitted(&self) -> usize {
        self.segments
    }

    /// The line recorded so far.
    pub fn current_line(&self) -> Option<&InkLine> {
        self.line.as_ref()
    }

    /// Start a new stroke at `point`.
    pub fn begin(&mut self, point: Point, colour: Colour, surface: &mut dyn Surface) {
        self.reset();
        self.colour = colour;
        self.line = Some(InkLine::new(colour));
        self.update(point, surface);
    }

    /// Feed the next raw point; returns the segment painted, if one was completed.
    pub fn update(&mut self, point: Point, surface: &mut dyn Surface) -> Option<BezierSegment> {
        let Some(line) = self.line.as_mut() else {
            log::trace!("point ({}, {}) ignored outside a stroke", point.x, point.y);
            return None;
        };
        line.add_point(point);
        self.push_point(point, surface)
    }

    /// Finish the stroke and hand back the recorded line.
    ///
    /// A stroke too short to fit a curve is painted as a single dot.
    pub fn end(&mut self, surface: &mut dyn Surface) -> Option<InkLine> {
        let line = self.line.take()?;
        if self.raw_points < 3 {
            if let Some(first) = line.points.first() {
                self.draw_dot(first, surface);
            }
        }
        self.window.clear();
        Some(line)
    }

    /// Paint an existing point sequence with the same smoothing used while drawing.
    pub fn replay(&mut self, points: &[Point], colour: Colour, surface: &mut dyn Surface) {
        self.reset();
        self.colour = colour;
        for point in points {
            self.push_point(*point, surface);
        }
        if points.len() < 3 {
            if let Some(first) = points.first() {
                self.draw_dot(first, surface);
            }
        }
        self.window.clear();
    }

    /// Width for a (smoothed) velocity.
    pub fn stroke_width(&self, velocity: f64) -> f64 {
        (self.params.max_width / (velocity.max(0.0) + 1.0)).max(self.params.min_width)
    }

    fn push_point(&mut self, point: Point, surface: &mut dyn Surface) -> Option<BezierSegment> {
        self.raw_points += 1;
        self.window.push(point);
        if self.window.len() < 3 {
            return None;
        }
        // Duplicate the first point so the first segment is drawn after three points.
        if self.window.len() == 3 {
            self.window.insert(0, self.window[0]);
        }

        let window: [Point; WINDOW] = [self.window[0], self.window[1], self.window[2], self.window[3]];
        let curve = BezierSegment::from_window(&window);
        self.emit_segment(&curve, surface);
        self.window.remove(0);
        Some(curve)
    }

    fn emit_segment(&mut self, curve: &BezierSegment, surface: &mut dyn Surface) {
        let weight = self.params.velocity_filter_weight;
        let velocity = weight * curve.end.velocity_from(&curve.start) + (1.0 - weight) * self.last_velocity;
        let width = self.stroke_width(velocity);

        self.draw_curve(curve, self.last_width, width, surface);

        self.last_velocity = velocity;
        self.last_width = width;
        self.segments += 1;
    }

    fn draw_curve(&self, curve: &BezierSegment, start_width: f64, end_width: f64, surface: &mut dyn Surface) {
        let steps = (curve.length().floor() as usize).min(MAX_SEGMENT_DOTS);
        let delta = end_width - start_width;
        for i in 0..steps {
            let t = i as f64 / steps as f64;
            let width = start_width + t * t * t * delta;
            surface.fill_circle(curve.point_at(t), width, self.colour.into());
        }
    }

    fn draw_dot(&self, point: &Point, surface: &mut dyn Surface) {
        surface.fill_circle(point.to_kurbo(), self.params.dot_size, self.colour.into());
    }
}
