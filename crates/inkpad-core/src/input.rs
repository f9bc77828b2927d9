//! Pointer and touch gesture classification.
//!
//! [`GestureRouter`] turns raw mouse/touch events into drawing intents. It owns
//! the single-tap timer as an explicit deadline: hosts call
//! [`GestureRouter::poll_timer`] (for instance from a scheduled callback at
//! [`GestureRouter::next_deadline`]) and apply whatever commands come back.

use crate::geometry::Point;
use kurbo::Vec2;
use serde::{Deserialize, Serialize};

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

/// Default tap-vs-double-tap window in milliseconds.
pub const DEFAULT_TAP_TIMEOUT_MS: i64 = 500;

/// Wall-clock milliseconds, for hosts that do not supply event timestamps.
pub fn timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Raw input in client coordinates. `time` is in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    MouseDown {
        position: kurbo::Point,
        button: MouseButton,
        time: i64,
    },
    MouseMove {
        position: kurbo::Point,
        time: i64,
    },
    MouseUp {
        position: kurbo::Point,
        button: MouseButton,
        time: i64,
    },
    /// `touches` lists every finger currently on the surface.
    TouchStart {
        touches: Vec<kurbo::Point>,
        time: i64,
    },
    TouchMove {
        touches: Vec<kurbo::Point>,
        time: i64,
    },
    /// `touches` lists the fingers still down; `on_canvas` is false when the
    /// touch ended over some other element.
    TouchEnd {
        touches: Vec<kurbo::Point>,
        time: i64,
        on_canvas: bool,
    },
}

/// Intent produced by the router, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Start a stroke, or place a shape in shape modes.
    Begin(Point),
    /// Continue the stroke.
    Update(Point),
    /// Finish the stroke or shape.
    End,
    /// Select the shape closest to this point.
    Select(Point),
    /// Move the selection.
    Drag(Vec2),
    /// Two-finger span changed from `previous` to `current`.
    Pinch { previous: Vec2, current: Vec2 },
}

/// Router state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    AwaitingSingleTapTimeout,
    Drawing,
    TwoTouchActive,
    DraggingSelection,
}

/// Pending single-tap decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TapTimer {
    /// Time at which the tap is treated as a single tap.
    pub deadline: i64,
    /// Where the tap landed, in canvas coordinates.
    pub point: Point,
    /// Whether the finger has already lifted.
    pub released: bool,
}

/// Classifies input sequences into [`Command`]s.
#[derive(Debug, Clone)]
pub struct GestureRouter {
    state: GestureState,
    /// Client position of the canvas' top-left corner.
    origin: kurbo::Point,
    tap_timeout_ms: i64,
    timer: Option<TapTimer>,
    mouse_down: bool,
    last_touch: Option<kurbo::Point>,
    /// Separation of the two touches at the previous sample.
    pinch_span: Option<Vec2>,
    /// Set after a double tap so the matching touch end does nothing.
    suppress_end: bool,
}

impl Default for GestureRouter {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_TIMEOUT_MS)
    }
}

impl GestureRouter {
    pub fn new(tap_timeout_ms: i64) -> Self {
        Self {
            state: GestureState::Idle,
            origin: kurbo::Point::ZERO,
            tap_timeout_ms,
            timer: None,
            mouse_down: false,
            last_touch: None,
            pinch_span: None,
            suppress_end: false,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn origin(&self) -> kurbo::Point {
        self.origin
    }

    /// Update the canvas' client position (e.g. after layout or scroll).
    pub fn set_origin(&mut self, origin: kurbo::Point) {
        self.origin = origin;
    }

    pub fn set_tap_timeout(&mut self, millis: i64) {
        self.tap_timeout_ms = millis;
    }

    /// The pending tap timer, if armed.
    pub fn pending_tap(&self) -> Option<&TapTimer> {
        self.timer.as_ref()
    }

    /// When [`poll_timer`](Self::poll_timer) should next be called.
    pub fn next_deadline(&self) -> Option<i64> {
        self.timer.map(|t| t.deadline)
    }

    /// Client to canvas coordinates.
    pub fn to_canvas(&self, client: kurbo::Point) -> kurbo::Point {
        kurbo::Point::new(client.x - self.origin.x, client.y - self.origin.y)
    }

    /// Drop any in-flight gesture and the pending timer.
    pub fn cancel(&mut self) {
        self.state = GestureState::Idle;
        self.timer = None;
        self.mouse_down = false;
        self.last_touch = None;
        self.pinch_span = None;
        self.suppress_end = false;
    }

    fn canvas_point(&self, client: kurbo::Point, time: i64) -> Point {
        Point::from_kurbo(self.to_canvas(client), time)
    }

    /// Feed one event. `has_selection` routes single-finger moves to dragging
    /// and two-finger moves to pinch-resizing.
    pub fn handle(&mut self, event: InputEvent, has_selection: bool) -> Vec<Command> {
        match event {
            InputEvent::MouseDown { position, button, time } => {
                if button != MouseButton::Left {
                    return Vec::new();
                }
                self.mouse_down = true;
                self.state = GestureState::Drawing;
                vec![Command::Begin(self.canvas_point(position, time))]
            }
            InputEvent::MouseMove { position, time } => {
                if !self.mouse_down {
                    return Vec::new();
                }
                vec![Command::Update(self.canvas_point(position, time))]
            }
            InputEvent::MouseUp { button, .. } => {
                if button != MouseButton::Left || !self.mouse_down {
                    return Vec::new();
                }
                self.mouse_down = false;
                self.state = GestureState::Idle;
                vec![Command::End]
            }
            InputEvent::TouchStart { touches, time } => self.touch_start(&touches, time),
            InputEvent::TouchMove { touches, time } => self.touch_move(&touches, time, has_selection),
            InputEvent::TouchEnd { touches, on_canvas, .. } => self.touch_end(&touches, on_canvas),
        }
    }

    fn touch_start(&mut self, touches: &[kurbo::Point], time: i64) -> Vec<Command> {
        match touches {
            [] => Vec::new(),
            [touch] => {
                let point = self.canvas_point(*touch, time);
                self.last_touch = Some(point.to_kurbo());
                let mut commands = Vec::new();
                if let Some(timer) = self.timer.take() {
                    if time < timer.deadline {
                        log::debug!("double tap at ({:.1}, {:.1})", point.x, point.y);
                        self.suppress_end = true;
                        self.state = GestureState::Idle;
                        return vec![Command::Select(point)];
                    }
                    // Expired but never polled: the earlier touch was a single tap.
                    commands.extend([Command::Begin(timer.point), Command::End]);
                }
                self.timer = Some(TapTimer {
                    deadline: time + self.tap_timeout_ms,
                    point,
                    released: false,
                });
                self.state = GestureState::AwaitingSingleTapTimeout;
                commands
            }
            [first, second, ..] => {
                self.timer = None;
                self.last_touch = Some(self.to_canvas(*first));
                self.pinch_span = Some(*second - *first);
                self.state = GestureState::TwoTouchActive;
                Vec::new()
            }
        }
    }

    fn touch_move(&mut self, touches: &[kurbo::Point], time: i64, has_selection: bool) -> Vec<Command> {
        let Some(first) = touches.first() else {
            return Vec::new();
        };

        if has_selection {
            // A pending tap would otherwise start a stroke under the moving selection.
            self.timer = None;
            if let [first, second, ..] = touches {
                let current = *second - *first;
                let previous = self.pinch_span.unwrap_or(current);
                self.pinch_span = Some(current);
                self.state = GestureState::TwoTouchActive;
                return vec![Command::Pinch { previous, current }];
            }
            let position = self.to_canvas(*first);
            let delta = position - self.last_touch.unwrap_or(position);
            self.last_touch = Some(position);
            self.state = GestureState::DraggingSelection;
            return vec![Command::Drag(delta)];
        }

        if touches.len() >= 2 {
            self.pinch_span = Some(touches[1] - touches[0]);
            return Vec::new();
        }

        let point = self.canvas_point(*first, time);
        self.last_touch = Some(point.to_kurbo());
        if let Some(timer) = self.timer.take() {
            // The finger is dragging: this is a live stroke, not a tap.
            self.state = GestureState::Drawing;
            return vec![Command::Begin(timer.point), Command::Update(point)];
        }
        if self.state == GestureState::Drawing {
            vec![Command::Update(point)]
        } else {
            Vec::new()
        }
    }

    fn touch_end(&mut self, touches: &[kurbo::Point], on_canvas: bool) -> Vec<Command> {
        if touches.len() < 2 {
            self.pinch_span = None;
        }
        // A lifted finger must not leave a stale drag origin behind.
        self.last_touch = touches.first().map(|touch| self.to_canvas(*touch));
        if self.suppress_end {
            self.suppress_end = false;
            return Vec::new();
        }
        if let Some(timer) = self.timer.as_mut() {
            timer.released = true;
            return Vec::new();
        }
        if !on_canvas {
            return Vec::new();
        }
        match self.state {
            GestureState::Drawing => {
                self.state = GestureState::Idle;
                vec![Command::End]
            }
            GestureState::TwoTouchActive if touches.len() >= 2 => Vec::new(),
            GestureState::TwoTouchActive | GestureState::DraggingSelection => {
                self.state = GestureState::Idle;
                Vec::new()
            }
            GestureState::Idle | GestureState::AwaitingSingleTapTimeout => Vec::new(),
        }
    }

    /// Fire the tap timer if its deadline has passed.
    ///
    /// A tap still held down begins a stroke; one already released yields a
    /// complete begin/end pair.
    pub fn poll_timer(&mut self, now: i64) -> Vec<Command> {
        match self.timer {
            Some(timer) if timer.deadline <= now => {
                self.timer = None;
                if timer.released {
                    self.state = GestureState::Idle;
                    vec![Command::Begin(timer.point), Command::End]
                } else {
                    self.state = GestureState::Drawing;
                    vec![Command::Begin(timer.point)]
                }
            }
            _ => Vec::new(),
        }
    }
}
