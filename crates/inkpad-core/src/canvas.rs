//! Canvas document and drawing surface controller.

use crate::config::{DrawMode, PadOptions};
use crate::geometry::Point;
use crate::input::{Command, GestureRouter, InputEvent};
use crate::shapes::{Colour, InkLine, Shape, ShapeKind, SizeLimits};
use crate::storage::{BoxFuture, Storage, StorageResult};
use crate::stroke::StrokeEngine;
use crate::surface::{Surface, SurfaceResult};
use kurbo::{Rect, Size, Vec2};
use serde::de::Error as _;

/// Two-finger vectors flatter than this many degrees resize horizontally.
const HORIZONTAL_MAX_DEGREES: f64 = 20.0;
/// Vectors steeper than this resize vertically; in between, both dimensions.
const DIAGONAL_MAX_DEGREES: f64 = 70.0;

/// The persisted part of a drawing: its shapes in draw order and the undone stack.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasDocument {
    shapes: Vec<Shape>,
    undone: Vec<Shape>,
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        Self {
            shapes,
            undone: Vec::new(),
        }
    }

    /// Shapes in draw order (back to front).
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub(crate) fn shape_mut(&mut self, index: usize) -> Option<&mut Shape> {
        self.shapes.get_mut(index)
    }

    /// Shapes removed by undo, most recent last.
    pub fn undone(&self) -> &[Shape] {
        &self.undone
    }

    /// Append a newly committed shape and return its index.
    ///
    /// A new shape starts a fresh history branch, so the undone stack is dropped.
    pub fn add_shape(&mut self, mut shape: Shape) -> usize {
        shape.commit_colour();
        self.shapes.push(shape);
        self.undone.clear();
        self.shapes.len() - 1
    }

    /// Move the last shape onto the undone stack.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.shapes.pop() {
            Some(shape) => {
                self.undone.push(shape);
                true
            }
            None => false,
        }
    }

    /// Move the most recently undone shape back.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.undone.pop() {
            Some(shape) => {
                self.shapes.push(shape);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.shapes.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Drop every shape and the undone stack.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.undone.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .iter()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Whether an ink line with exactly these points is already stored.
    pub fn contains_ink_line(&self, line: &InkLine) -> bool {
        self.shapes
            .iter()
            .filter_map(Shape::as_ink_line)
            .any(|existing| existing.same_points(line))
    }

    /// Serialize the shape list as a JSON array of shape records.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.shapes)
    }

    /// Parse a JSON array of shape records.
    ///
    /// Records that are not valid shapes are logged and skipped; only a
    /// top level that is not an array is an error.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let records = value
            .as_array()
            .ok_or_else(|| serde_json::Error::custom("expected an array of shape records"))?;

        let mut shapes = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            match serde_json::from_value::<Shape>(record.clone()) {
                Ok(mut shape) => {
                    shape.commit_colour();
                    shapes.push(shape);
                }
                Err(e) => log::warn!("Skipping shape record {}: {}", index, e),
            }
        }
        Ok(Self::from_shapes(shapes))
    }
}

/// What an applied command did to the drawing.
///
/// Returned from [`Canvas::handle_event`] and [`Canvas::tick`] so hosts can
/// hook the start and end of strokes, shape placement and selection edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// An ink stroke started at this point.
    StrokeBegan(Point),
    /// The stroke ended; `committed` is the index of the stored line, or
    /// `None` when it duplicated an existing one.
    StrokeEnded { committed: Option<usize> },
    /// A shape was placed and committed.
    ShapeCreated { index: usize, kind: ShapeKind },
    /// A double tap picked this shape, or nothing within reach.
    Selected(Option<usize>),
    SelectionMoved,
    SelectionResized,
}

/// Puts the enabled flag back when a load finishes or is dropped midway.
struct RestoreEnabled<'a> {
    flag: &'a mut bool,
    value: bool,
}

impl Drop for RestoreEnabled<'_> {
    fn drop(&mut self) {
        *self.flag = self.value;
    }
}

/// Runtime drawing state: the document plus selection, mode, input routing and
/// the surface everything is painted on.
pub struct Canvas<S: Surface> {
    /// The document being edited.
    pub document: CanvasDocument,
    surface: S,
    options: PadOptions,
    mode: DrawMode,
    pen_colour: Colour,
    /// Indices into the document's shape list, in selection order.
    selection: Vec<usize>,
    stroke: StrokeEngine,
    router: GestureRouter,
    enabled: bool,
    dirty: bool,
}

impl<S: Surface> Canvas<S> {
    /// Create a canvas painting onto `surface`.
    pub fn new(surface: S, options: PadOptions) -> Self {
        let mut canvas = Self {
            document: CanvasDocument::new(),
            stroke: StrokeEngine::new(options.stroke_params()),
            router: GestureRouter::new(options.tap_timeout_ms),
            pen_colour: options.pen_colour,
            surface,
            options,
            mode: DrawMode::default(),
            selection: Vec::new(),
            enabled: true,
            dirty: false,
        };
        canvas.clear();
        canvas
    }

    pub fn options(&self) -> &PadOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn router(&self) -> &GestureRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut GestureRouter {
        &mut self.router
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DrawMode) {
        log::debug!("Draw mode set to {:?}", mode);
        self.mode = mode;
    }

    /// Set the mode from its numeric code (`0=Pen, 1=Circle, 2=Square, 3=Triangle`).
    pub fn set_mode_code(&mut self, code: u8) -> Result<(), u8> {
        self.set_mode(DrawMode::try_from(code)?);
        Ok(())
    }

    pub fn pen_colour(&self) -> Colour {
        self.pen_colour
    }

    /// Change the ink colour. Selected shapes take the new colour permanently.
    pub fn set_pen_colour(&mut self, colour: Colour) {
        self.pen_colour = colour;
        if self.selection.is_empty() {
            return;
        }
        for &index in &self.selection {
            if let Some(shape) = self.document.shape_mut(index) {
                shape.set_colour(colour);
            }
        }
        self.dirty = true;
        self.redraw();
    }

    /// Resume handling input.
    pub fn on(&mut self) {
        self.enabled = true;
    }

    /// Stop handling input; shapes are kept.
    pub fn off(&mut self) {
        self.enabled = false;
        self.router.cancel();
        self.stroke.reset();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Route one input event. Ignored while the canvas is switched off.
    pub fn handle_event(&mut self, event: InputEvent) -> Vec<Outcome> {
        if !self.enabled {
            log::trace!("Input ignored while canvas is off: {:?}", event);
            return Vec::new();
        }
        let commands = self.router.handle(event, !self.selection.is_empty());
        commands.into_iter().filter_map(|command| self.apply(command)).collect()
    }

    /// Drive the tap timer. Call at (or after) [`GestureRouter::next_deadline`].
    pub fn tick(&mut self, now: i64) -> Vec<Outcome> {
        if !self.enabled {
            return Vec::new();
        }
        let commands = self.router.poll_timer(now);
        commands.into_iter().filter_map(|command| self.apply(command)).collect()
    }

    /// Perform one routed command.
    pub fn apply(&mut self, command: Command) -> Option<Outcome> {
        match command {
            Command::Begin(point) => match self.mode.shape_kind() {
                Some(kind) => self
                    .create_shape(kind, point)
                    .map(|index| Outcome::ShapeCreated { index, kind }),
                None => {
                    self.begin_stroke(point);
                    Some(Outcome::StrokeBegan(point))
                }
            },
            Command::Update(point) => {
                if self.mode == DrawMode::Pen {
                    self.update_stroke(point);
                }
                None
            }
            Command::End => {
                if self.mode != DrawMode::Pen || !self.stroke.is_active() {
                    return None;
                }
                let committed = self.end_stroke().then(|| self.document.len() - 1);
                Some(Outcome::StrokeEnded { committed })
            }
            Command::Select(point) => {
                let index = self.select(point.to_kurbo());
                self.highlight_selection();
                Some(Outcome::Selected(index))
            }
            Command::Drag(delta) => self.drag_selection(delta).then_some(Outcome::SelectionMoved),
            Command::Pinch { previous, current } => self
                .resize_selection_by_gesture(previous, current)
                .then_some(Outcome::SelectionResized),
        }
    }

    /// Start an ink stroke in the pen colour.
    pub fn begin_stroke(&mut self, point: Point) {
        self.stroke.begin(point, self.pen_colour, &mut self.surface);
    }

    pub fn update_stroke(&mut self, point: Point) {
        self.stroke.update(point, &mut self.surface);
    }

    /// Finish the stroke and commit it. Returns whether a new line was stored.
    pub fn end_stroke(&mut self) -> bool {
        let Some(line) = self.stroke.end(&mut self.surface) else {
            return false;
        };
        if line.is_empty() {
            return false;
        }
        if self.document.contains_ink_line(&line) {
            log::debug!("Duplicate ink line with {} points ignored", line.len());
            return false;
        }
        log::debug!("Committed ink line with {} points", line.len());
        self.document.add_shape(Shape::InkLine(line));
        self.dirty = true;
        true
    }

    /// Place a geometric shape centred on `center` and paint it.
    pub fn create_shape(&mut self, kind: ShapeKind, center: Point) -> Option<usize> {
        let shape = Shape::create(
            kind,
            center.to_kurbo(),
            self.options.default_shape_size,
            self.options.shape_colour,
        )?;
        shape.draw(&mut self.surface, &self.options);
        let index = self.document.add_shape(shape);
        log::debug!("Created {:?} at ({:.1}, {:.1})", kind, center.x, center.y);
        self.dirty = true;
        Some(index)
    }

    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    pub fn has_selection(&self) -> bool {
        !self.selection.is_empty()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.contains(&index)
    }

    /// Add the closest unselected shape within the distance threshold to the selection.
    ///
    /// Ties go to the shape drawn first.
    pub fn select(&mut self, point: kurbo::Point) -> Option<usize> {
        let threshold = self.options.distance_threshold;
        let mut closest: Option<(usize, f64)> = None;
        for (index, shape) in self.document.shapes().iter().enumerate() {
            if self.selection.contains(&index) {
                continue;
            }
            let distance = shape.hit_distance(point);
            if distance > threshold {
                continue;
            }
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((index, distance));
            }
        }

        let (index, distance) = closest?;
        log::debug!("Selected shape {} at distance {:.1}", index, distance);
        self.selection.push(index);
        Some(index)
    }

    /// Repaint with unselected shapes in their own colour and selected ones highlighted.
    pub fn highlight_selection(&mut self) {
        self.surface.clear(self.options.background_colour.into());
        let highlight = self.options.selected_colour;
        for (index, shape) in self.document.shapes().iter().enumerate() {
            if !self.selection.contains(&index) {
                shape.draw(&mut self.surface, &self.options);
            }
        }
        for &index in &self.selection {
            if let Some(shape) = self.document.shapes().get(index) {
                shape.draw_with(&mut self.surface, &self.options, highlight);
            }
        }
    }

    /// Restore selected shapes' colours and empty the selection.
    pub fn deselect(&mut self) {
        for index in std::mem::take(&mut self.selection) {
            if let Some(shape) = self.document.shape_mut(index) {
                shape.restore_colour();
            }
        }
        self.redraw();
    }

    /// Move every selected shape by `delta`. Returns false without a selection.
    pub fn drag_selection(&mut self, delta: Vec2) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        for &index in &self.selection {
            if let Some(shape) = self.document.shape_mut(index) {
                shape.translate(delta);
            }
        }
        self.dirty = true;
        self.redraw();
        true
    }

    /// Resize selected shapes from two successive two-finger vectors.
    ///
    /// The angle of `current` picks the dimension (horizontal, diagonal or
    /// vertical); the change in span length is the signed amount. Ink lines
    /// are skipped. Returns whether any shape changed size.
    pub fn resize_selection_by_gesture(&mut self, previous: Vec2, current: Vec2) -> bool {
        let amount = current.hypot() - previous.hypot();
        if amount == 0.0 || self.selection.is_empty() {
            return false;
        }
        let angle = current.y.abs().atan2(current.x.abs()).to_degrees();
        let (delta_w, delta_h) = if angle <= HORIZONTAL_MAX_DEGREES {
            (amount, 0.0)
        } else if angle <= DIAGONAL_MAX_DEGREES {
            (amount, amount)
        } else {
            (0.0, amount)
        };

        let mut changed = false;
        for &index in &self.selection {
            if let Some(shape) = self.document.shape_mut(index) {
                let limits = SizeLimits::for_kind(shape.kind(), &self.options);
                changed |= shape.resize(delta_w, delta_h, limits);
            }
        }
        if changed {
            self.dirty = true;
            self.redraw();
        }
        changed
    }

    /// Remove the last shape. No-op on an empty canvas.
    pub fn undo(&mut self) -> bool {
        let last = self.document.len().checked_sub(1);
        if !self.document.undo() {
            return false;
        }
        if let Some(last) = last {
            self.selection.retain(|&index| index != last);
        }
        log::debug!("Undo: {} shapes remain", self.document.len());
        self.dirty = true;
        self.redraw();
        true
    }

    /// Bring back the last undone shape. No-op when nothing was undone.
    pub fn redo(&mut self) -> bool {
        if !self.document.redo() {
            return false;
        }
        log::debug!("Redo: {} shapes", self.document.len());
        self.dirty = true;
        self.redraw();
        true
    }

    /// Repaint the background only. Shapes and history are kept.
    pub fn clear(&mut self) {
        self.surface.clear(self.options.background_colour.into());
        self.stroke.reset();
    }

    /// Destructive reset: drops shapes, history and selection.
    ///
    /// Callers are expected to have asked the user for confirmation.
    pub fn clear_all(&mut self) {
        log::info!("Clearing all {} shapes", self.document.len());
        self.document.clear();
        self.selection.clear();
        self.dirty = true;
        self.clear();
    }

    /// Clear and paint every shape, honouring the selection highlight.
    pub fn redraw(&mut self) {
        if !self.selection.is_empty() {
            self.highlight_selection();
            return;
        }
        self.surface.clear(self.options.background_colour.into());
        for shape in self.document.shapes() {
            shape.draw(&mut self.surface, &self.options);
        }
    }

    /// The shape list as a JSON array of shape records.
    pub fn serialize(&self) -> Result<String, serde_json::Error> {
        self.document.to_json()
    }

    /// Append the shapes in `json` and repaint. Returns how many were added.
    pub fn deserialize(&mut self, json: &str) -> Result<usize, serde_json::Error> {
        let parsed = CanvasDocument::from_json(json)?;
        let count = parsed.len();
        for shape in parsed.shapes {
            self.document.add_shape(shape);
        }
        if count > 0 {
            self.dirty = true;
        }
        self.redraw();
        Ok(count)
    }

    pub fn shapes(&self) -> &[Shape] {
        self.document.shapes()
    }

    pub fn ink_lines(&self) -> impl Iterator<Item = &InkLine> {
        self.document.shapes().iter().filter_map(Shape::as_ink_line)
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Encode the current surface contents as an image.
    pub fn snapshot(&self) -> SurfaceResult<Vec<u8>> {
        self.surface.read_back()
    }

    /// Record a new canvas size; resize limits follow it.
    pub fn set_canvas_size(&mut self, size: Size) {
        self.options.canvas_size = size;
    }

    /// Whether anything changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Read and reset the unsaved-changes flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Persist a copy of the document under `id`.
    ///
    /// The returned future borrows only `storage`, so input keeps flowing
    /// while the save is in flight. The dirty flag is left to the caller.
    pub fn save_to<'s, T: Storage + ?Sized>(&self, storage: &'s T, id: &str) -> BoxFuture<'s, StorageResult<()>> {
        log::info!("Saving {} shapes to '{}'", self.document.len(), id);
        storage.save(id, &self.document)
    }

    /// Replace the document with the one stored under `id` and repaint.
    ///
    /// Input is switched off while the load is in flight. The previous on/off
    /// state comes back when the load completes, fails or is dropped.
    pub async fn load_from<T: Storage + ?Sized>(&mut self, storage: &T, id: &str) -> StorageResult<usize> {
        let was_enabled = self.enabled;
        self.off();
        let result = {
            let _restore = RestoreEnabled {
                flag: &mut self.enabled,
                value: was_enabled,
            };
            storage.load(id).await
        };

        let document = result?;
        self.selection.clear();
        self.document = document;
        self.dirty = false;
        self.redraw();
        log::info!("Loaded {} shapes from '{}'", self.document.len(), id);
        Ok(self.document.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;
    use crate::shapes::Square;
    use crate::storage::{MemoryStorage, StorageError, block_on};
    use crate::surface::RecordingSurface;

    fn canvas() -> Canvas<RecordingSurface> {
        Canvas::new(RecordingSurface::new(800.0, 600.0), PadOptions::default())
    }

    fn square(x: f64, y: f64) -> Shape {
        Shape::Square(Square::new(kurbo::Point::new(x, y), 40.0, 40.0, Colour::shape_default()))
    }

    fn line(points: &[(f64, f64)]) -> Shape {
        let points = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(x, y, i as i64 * 10))
            .collect();
        Shape::InkLine(InkLine::from_points(points, Colour::black()))
    }

    fn mouse(canvas: &mut Canvas<RecordingSurface>, points: &[(f64, f64)]) {
        let Some((&(x, y), rest)) = points.split_first() else {
            return;
        };
        canvas.handle_event(InputEvent::MouseDown {
            position: kurbo::Point::new(x, y),
            button: MouseButton::Left,
            time: 0,
        });
        for (i, &(x, y)) in rest.iter().enumerate() {
            canvas.handle_event(InputEvent::MouseMove {
                position: kurbo::Point::new(x, y),
                time: (i as i64 + 1) * 10,
            });
        }
        canvas.handle_event(InputEvent::MouseUp {
            position: kurbo::Point::ZERO,
            button: MouseButton::Left,
            time: 1000,
        });
    }

    #[test]
    fn test_document_creation() {
        let doc = CanvasDocument::new();
        assert!(doc.is_empty());
        assert!(!doc.can_undo());
        assert!(!doc.can_redo());
        assert!(doc.bounds().is_none());
    }

    #[test]
    fn test_undo_redo_restores_list() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(square(10.0, 10.0));
        doc.add_shape(line(&[(0.0, 0.0), (5.0, 5.0)]));
        doc.add_shape(square(50.0, 50.0));
        let before = doc.shapes().to_vec();

        assert!(doc.undo());
        assert_eq!(doc.len(), 2);
        assert!(doc.can_redo());
        assert!(doc.redo());
        assert_eq!(doc.shapes(), before.as_slice());

        assert!(doc.undo());
        assert!(doc.undo());
        assert!(doc.redo());
        assert!(doc.redo());
        assert_eq!(doc.shapes(), before.as_slice());
    }

    #[test]
    fn test_undo_redo_empty_is_noop() {
        let mut doc = CanvasDocument::new();
        assert!(!doc.undo());
        assert!(!doc.redo());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_new_shape_clears_redo() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(square(10.0, 10.0));
        doc.add_shape(square(20.0, 20.0));
        doc.undo();
        assert_eq!(doc.undone().len(), 1);

        doc.add_shape(square(30.0, 30.0));
        assert!(!doc.can_redo());
        assert!(!doc.redo());
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let mut doc = CanvasDocument::new();
        doc.add_shape(line(&[(0.0, 0.0), (10.5, 3.25), (20.0, 7.0)]));
        doc.add_shape(square(100.0, 100.0));
        doc.add_shape(Shape::create(ShapeKind::Circle, kurbo::Point::new(5.0, 6.0), Size::new(40.0, 30.0), Colour::rgb(1, 2, 3)).unwrap());
        doc.add_shape(Shape::create(ShapeKind::Triangle, kurbo::Point::new(7.0, 8.0), Size::new(40.0, 40.0), Colour::white()).unwrap());

        let json = doc.to_json().unwrap();
        let loaded = CanvasDocument::from_json(&json).unwrap();

        assert_eq!(loaded.len(), doc.len());
        let kinds: Vec<_> = loaded.shapes().iter().map(Shape::kind).collect();
        assert_eq!(kinds, vec![ShapeKind::InkLine, ShapeKind::Square, ShapeKind::Circle, ShapeKind::Triangle]);
        assert_eq!(loaded.shapes(), doc.shapes());
    }

    #[test]
    fn test_from_json_skips_malformed_records() {
        let json = r##"[
            {"kind": "Square", "colour": "#aaaaaa", "x": 1, "y": 2, "w": 30, "h": 40},
            {"kind": "Hexagon", "x": 1, "y": 2},
            {"kind": "Circle", "x": 1},
            {"kind": "INKLINE", "colour": "rgb(0, 0, 255)", "points": [{"x": 1, "y": 2, "time": 3}]},
            "not a shape"
        ]"##;
        let doc = CanvasDocument::from_json(json).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.shapes()[0].kind(), ShapeKind::Square);
        assert_eq!(doc.shapes()[1].colour(), Colour::rgb(0, 0, 255));
    }

    #[test]
    fn test_from_json_requires_array() {
        assert!(CanvasDocument::from_json(r#"{"kind": "Square"}"#).is_err());
        assert!(CanvasDocument::from_json("not json").is_err());
        assert!(CanvasDocument::from_json("[]").unwrap().is_empty());
    }

    #[test]
    fn test_mouse_stroke_commits_line() {
        let mut canvas = canvas();
        mouse(&mut canvas, &[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);

        let lines: Vec<_> = canvas.ink_lines().collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 4);
        assert_eq!(lines[0].points[3], Point::new(30.0, 0.0, 30));
        assert!(canvas.is_dirty());
        assert!(canvas.surface().circle_count() > 0);
    }

    #[test]
    fn test_tap_commits_single_point_line() {
        let mut canvas = canvas();
        mouse(&mut canvas, &[(40.0, 40.0)]);
        assert_eq!(canvas.ink_lines().count(), 1);
        assert_eq!(canvas.surface().circle_count(), 1);
    }

    #[test]
    fn test_duplicate_stroke_suppressed() {
        let mut canvas = canvas();
        let points = [(0.0, 0.0), (10.0, 5.0), (20.0, 0.0)];
        mouse(&mut canvas, &points);
        mouse(&mut canvas, &points);
        assert_eq!(canvas.shapes().len(), 1);

        mouse(&mut canvas, &[(0.0, 0.0), (10.0, 5.0), (21.0, 0.0)]);
        assert_eq!(canvas.shapes().len(), 2);
    }

    #[test]
    fn test_shape_mode_creates_shape() {
        let mut canvas = canvas();
        canvas.set_mode_code(2).unwrap();
        assert_eq!(canvas.mode(), DrawMode::Square);
        mouse(&mut canvas, &[(100.0, 100.0), (120.0, 120.0)]);

        assert_eq!(canvas.shapes().len(), 1);
        let bounds = canvas.shapes()[0].bounds();
        assert_eq!(bounds.center(), kurbo::Point::new(100.0, 100.0));
        assert!((bounds.width() - 40.0).abs() < f64::EPSILON);
        assert_eq!(canvas.ink_lines().count(), 0);
        assert_eq!(canvas.set_mode_code(7), Err(7));
    }

    #[test]
    fn test_select_closest_within_threshold() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.document.add_shape(square(130.0, 100.0));

        assert_eq!(canvas.select(kurbo::Point::new(200.0, 200.0)), None);
        assert_eq!(canvas.select(kurbo::Point::new(125.0, 100.0)), Some(1));
        assert!(canvas.is_selected(1));
        // Already selected shapes are skipped.
        assert_eq!(canvas.select(kurbo::Point::new(125.0, 100.0)), None);
        assert_eq!(canvas.select(kurbo::Point::new(110.0, 100.0)), Some(0));
        assert_eq!(canvas.selection(), &[1, 0]);
    }

    #[test]
    fn test_select_tie_goes_to_first() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.document.add_shape(square(120.0, 100.0));
        assert_eq!(canvas.select(kurbo::Point::new(110.0, 100.0)), Some(0));
    }

    #[test]
    fn test_select_threshold_is_inclusive() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        assert_eq!(canvas.select(kurbo::Point::new(120.0, 100.0)), Some(0));
    }

    #[test]
    fn test_select_uses_center_distance() {
        // Touching inside a large square near its edge misses: selection measures
        // distance to the centre, not to the boundary.
        let mut canvas = canvas();
        canvas.document.add_shape(Shape::Square(Square::new(
            kurbo::Point::new(100.0, 100.0),
            200.0,
            200.0,
            Colour::shape_default(),
        )));
        assert!(canvas.shapes()[0].bounds().contains(kurbo::Point::new(190.0, 100.0)));
        assert_eq!(canvas.select(kurbo::Point::new(190.0, 100.0)), None);
    }

    #[test]
    fn test_select_ink_line_by_nearest_point() {
        let mut canvas = canvas();
        canvas.document.add_shape(line(&[(0.0, 0.0), (50.0, 0.0), (100.0, 0.0)]));
        assert_eq!(canvas.select(kurbo::Point::new(52.0, 10.0)), Some(0));
    }

    #[test]
    fn test_highlight_leaves_colours() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.document.add_shape(square(300.0, 300.0));
        canvas.apply(Command::Select(Point::new(100.0, 100.0, 0)));

        let surface = canvas.surface();
        assert_eq!(surface.painted_in(Colour::yellow()), 1);
        assert_eq!(surface.painted_in(Colour::shape_default()), 1);
        assert_eq!(canvas.shapes()[0].colour(), Colour::shape_default());

        canvas.deselect();
        assert!(!canvas.has_selection());
        assert_eq!(canvas.surface().painted_in(Colour::shape_default()), 2);
        assert_eq!(canvas.surface().painted_in(Colour::yellow()), 0);
    }

    #[test]
    fn test_set_pen_colour_recolours_selection() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.select(kurbo::Point::new(100.0, 100.0));
        canvas.set_pen_colour(Colour::rgb(255, 0, 0));
        canvas.deselect();

        assert_eq!(canvas.shapes()[0].colour(), Colour::rgb(255, 0, 0));
        assert_eq!(canvas.pen_colour(), Colour::rgb(255, 0, 0));
    }

    #[test]
    fn test_drag_selection() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.document.add_shape(line(&[(0.0, 0.0), (10.0, 0.0)]));
        canvas.select(kurbo::Point::new(100.0, 100.0));
        canvas.select(kurbo::Point::new(10.0, 0.0));
        canvas.drag_selection(Vec2::new(5.0, -5.0));

        assert_eq!(canvas.shapes()[0].bounds().center(), kurbo::Point::new(105.0, 95.0));
        let line = canvas.shapes()[1].as_ink_line().unwrap();
        assert_eq!(line.points[1], Point::new(15.0, -5.0, 10));
    }

    #[test]
    fn test_drag_without_selection_is_noop() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.drag_selection(Vec2::new(5.0, 5.0));
        assert_eq!(canvas.shapes()[0].bounds().center(), kurbo::Point::new(100.0, 100.0));
        assert!(!canvas.is_dirty());
    }

    #[test]
    fn test_pinch_resize_buckets() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.select(kurbo::Point::new(100.0, 100.0));

        // Horizontal spread grows width only.
        canvas.resize_selection_by_gesture(Vec2::new(100.0, 0.0), Vec2::new(110.0, 0.0));
        let b = canvas.shapes()[0].bounds();
        assert!((b.width() - 50.0).abs() < 1e-9);
        assert!((b.height() - 40.0).abs() < 1e-9);

        // Vertical pinch shrinks height only.
        canvas.resize_selection_by_gesture(Vec2::new(0.0, 100.0), Vec2::new(0.0, 95.0));
        let b = canvas.shapes()[0].bounds();
        assert!((b.width() - 50.0).abs() < 1e-9);
        assert!((b.height() - 35.0).abs() < 1e-9);

        // Diagonal touches both.
        canvas.resize_selection_by_gesture(Vec2::new(30.0, 40.0), Vec2::new(60.0, 80.0));
        let b = canvas.shapes()[0].bounds();
        assert!((b.width() - 100.0).abs() < 1e-9);
        assert!((b.height() - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_resize_clamped() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.document.add_shape(line(&[(100.0, 100.0), (110.0, 100.0)]));
        canvas.select(kurbo::Point::new(100.0, 100.0));
        canvas.select(kurbo::Point::new(110.0, 100.0));

        canvas.resize_selection_by_gesture(Vec2::new(1000.0, 0.0), Vec2::new(1.0, 0.0));
        let b = canvas.shapes()[0].bounds();
        assert!((b.width() - 20.0).abs() < 1e-9);

        canvas.resize_selection_by_gesture(Vec2::new(0.0, 1.0), Vec2::new(0.0, 5000.0));
        let b = canvas.shapes()[0].bounds();
        assert!((b.height() - 300.0).abs() < 1e-9);

        assert_eq!(canvas.shapes()[1].as_ink_line().map(InkLine::len), Some(2));
    }

    #[test]
    fn test_undo_drops_selected_index() {
        let mut canvas = canvas();
        canvas.document.add_shape(square(100.0, 100.0));
        canvas.document.add_shape(square(300.0, 300.0));
        canvas.select(kurbo::Point::new(100.0, 100.0));
        canvas.select(kurbo::Point::new(300.0, 300.0));

        assert!(canvas.undo());
        assert_eq!(canvas.selection(), &[0]);
        assert!(canvas.redo());
        assert_eq!(canvas.shapes().len(), 2);
        assert!(!canvas.redo());
    }

    #[test]
    fn test_clear_keeps_history() {
        let mut canvas = canvas();
        mouse(&mut canvas, &[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        canvas.clear();
        assert_eq!(canvas.surface().commands().len(), 1);
        assert_eq!(canvas.shapes().len(), 1);

        canvas.clear_all();
        assert!(canvas.is_empty());
        assert!(!canvas.document.can_redo());
        assert!(!canvas.undo());
    }

    #[test]
    fn test_off_ignores_input() {
        let mut canvas = canvas();
        canvas.off();
        mouse(&mut canvas, &[(0.0, 0.0), (10.0, 0.0)]);
        assert!(canvas.is_empty());
        canvas.on();
        mouse(&mut canvas, &[(0.0, 0.0), (10.0, 0.0)]);
        assert_eq!(canvas.shapes().len(), 1);
    }

    #[test]
    fn test_serialize_deserialize_appends() {
        let mut source = canvas();
        source.document.add_shape(square(1.0, 2.0));
        source.document.add_shape(line(&[(3.0, 4.0), (5.0, 6.0)]));
        let json = source.serialize().unwrap();

        let mut target = canvas();
        target.document.add_shape(square(9.0, 9.0));
        assert_eq!(target.deserialize(&json).unwrap(), 2);
        assert_eq!(target.shapes().len(), 3);
        assert_eq!(&target.shapes()[1..], source.shapes());
    }

    /// Storage whose loads never complete.
    struct StalledStorage;

    impl Storage for StalledStorage {
        fn save(&self, _id: &str, _document: &CanvasDocument) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(std::future::pending::<StorageResult<()>>())
        }

        fn load(&self, _id: &str) -> BoxFuture<'_, StorageResult<CanvasDocument>> {
            Box::pin(std::future::pending::<StorageResult<CanvasDocument>>())
        }

        fn delete(&self, _id: &str) -> BoxFuture<'_, StorageResult<()>> {
            Box::pin(std::future::pending::<StorageResult<()>>())
        }

        fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
            Box::pin(std::future::pending::<StorageResult<Vec<String>>>())
        }

        fn exists(&self, _id: &str) -> BoxFuture<'_, StorageResult<bool>> {
            Box::pin(std::future::pending::<StorageResult<bool>>())
        }
    }

    fn poll_once<F: std::future::Future>(f: F) -> std::task::Poll<F::Output> {
        let waker = std::task::Waker::noop();
        let mut cx = std::task::Context::from_waker(waker);
        let mut f = std::pin::pin!(f);
        f.as_mut().poll(&mut cx)
    }

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let mut canvas = canvas();
        canvas.document.add_shape(square(1.0, 2.0));
        block_on(canvas.save_to(&storage, "drawing")).unwrap();

        let mut other = Canvas::new(RecordingSurface::new(100.0, 100.0), PadOptions::default());
        assert_eq!(block_on(other.load_from(&storage, "drawing")).unwrap(), 1);
        assert_eq!(other.shapes(), canvas.shapes());
        assert!(other.is_enabled());
    }

    #[test]
    fn test_input_flows_while_saving() {
        let storage = MemoryStorage::new();
        let mut canvas = canvas();
        canvas.document.add_shape(square(1.0, 2.0));

        let save = canvas.save_to(&storage, "drawing");
        mouse(&mut canvas, &[(100.0, 100.0), (110.0, 100.0), (120.0, 100.0)]);
        block_on(save).unwrap();

        // The save holds the document as it was when requested.
        assert_eq!(canvas.shapes().len(), 2);
        let saved = block_on(storage.load("drawing")).unwrap();
        assert_eq!(saved.len(), 1);
    }

    #[test]
    fn test_failed_load_turns_input_back_on() {
        let storage = MemoryStorage::new();
        let mut canvas = canvas();
        canvas.document.add_shape(square(1.0, 2.0));

        let result = block_on(canvas.load_from(&storage, "missing"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(canvas.is_enabled());
        assert_eq!(canvas.shapes().len(), 1);
    }

    #[test]
    fn test_dropped_load_restores_input() {
        let mut canvas = canvas();
        {
            let load = canvas.load_from(&StalledStorage, "drawing");
            assert!(poll_once(load).is_pending());
        }
        assert!(canvas.is_enabled());

        mouse(&mut canvas, &[(5.0, 5.0)]);
        assert_eq!(canvas.ink_lines().count(), 1);
    }

    #[test]
    fn test_load_keeps_canvas_off() {
        let storage = MemoryStorage::new();
        block_on(storage.save("drawing", &CanvasDocument::from_shapes(vec![square(1.0, 2.0)]))).unwrap();

        let mut canvas = canvas();
        canvas.off();
        assert_eq!(block_on(canvas.load_from(&storage, "drawing")).unwrap(), 1);
        assert!(!canvas.is_enabled());
    }

    #[test]
    fn test_outcomes_report_stroke_lifecycle() {
        let mut canvas = canvas();
        let began = canvas.handle_event(InputEvent::MouseDown {
            position: kurbo::Point::new(1.0, 2.0),
            button: MouseButton::Left,
            time: 0,
        });
        assert_eq!(began, vec![Outcome::StrokeBegan(Point::new(1.0, 2.0, 0))]);

        let moved = canvas.handle_event(InputEvent::MouseMove {
            position: kurbo::Point::new(9.0, 2.0),
            time: 10,
        });
        assert!(moved.is_empty());

        let up = InputEvent::MouseUp {
            position: kurbo::Point::new(9.0, 2.0),
            button: MouseButton::Left,
            time: 20,
        };
        assert_eq!(canvas.handle_event(up.clone()), vec![Outcome::StrokeEnded { committed: Some(0) }]);
        assert!(canvas.handle_event(up).is_empty());
    }

    #[test]
    fn test_outcomes_report_duplicate_and_shapes() {
        let mut canvas = canvas();
        let points = [(0.0, 0.0), (10.0, 5.0), (20.0, 0.0)];
        mouse(&mut canvas, &points);

        canvas.apply(Command::Begin(Point::new(0.0, 0.0, 0)));
        canvas.apply(Command::Update(Point::new(10.0, 5.0, 10)));
        canvas.apply(Command::Update(Point::new(20.0, 0.0, 20)));
        assert_eq!(canvas.apply(Command::End), Some(Outcome::StrokeEnded { committed: None }));

        canvas.set_mode(DrawMode::Triangle);
        canvas.handle_event(InputEvent::TouchStart {
            touches: vec![kurbo::Point::new(200.0, 200.0)],
            time: 100,
        });
        let fired = canvas.tick(600);
        assert_eq!(
            fired,
            vec![Outcome::ShapeCreated {
                index: 1,
                kind: ShapeKind::Triangle,
            }]
        );

        assert_eq!(
            canvas.apply(Command::Select(Point::new(200.0, 200.0, 700))),
            Some(Outcome::Selected(Some(1)))
        );
        assert_eq!(canvas.apply(Command::Drag(Vec2::new(1.0, 0.0))), Some(Outcome::SelectionMoved));
        assert_eq!(
            canvas.apply(Command::Pinch {
                previous: Vec2::new(50.0, 0.0),
                current: Vec2::new(60.0, 0.0),
            }),
            Some(Outcome::SelectionResized)
        );
        canvas.deselect();
        assert_eq!(canvas.apply(Command::Drag(Vec2::new(1.0, 0.0))), None);
    }

    #[test]
    fn test_snapshot_unsupported_on_recording_surface() {
        assert!(canvas().snapshot().is_err());
    }
}
