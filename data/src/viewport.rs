//! Coordinate transform and viewport state.
//!
//! Three spaces are involved:
//! - screen pixels, relative to the widget's top-left corner;
//! - logical units, the grid plane the viewport looks at (x grows right,
//!   y grows up, one grid square is `grid_square` logical units wide);
//! - domain time in seconds and domain values in sensor units.
//!
//! Screen pixels are logical units scaled by the pixel zoom. Everything here
//! is recomputed from the current state on every call.

use crate::config::ViewportConfig;

use serde::{Deserialize, Serialize};

/// Smallest allowed grid square component, exclusive.
pub const MIN_GRID_SQUARE: f64 = 8.0;
pub const MAX_PIXEL_ZOOM: u32 = 4;
/// Distance in logical units under which the mouse is on a probe or point.
pub const HIT_RADIUS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Edges of a rectangle in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub left: f64,
    pub right: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Window {
    fn grown(self, by: Coord) -> Self {
        Self {
            left: self.left - by.x,
            right: self.right + by.x,
            upper: self.upper + by.y,
            lower: self.lower - by.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

impl ScrollDirection {
    pub fn from_delta(delta: f64) -> Option<Self> {
        if delta > 0.0 {
            Some(ScrollDirection::Up)
        } else if delta < 0.0 {
            Some(ScrollDirection::Down)
        } else {
            None
        }
    }
}

/// What a wheel step does, picked from the held modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomMode {
    PixelZoom,
    TimeDensity,
    GridDensity,
    ValueScale,
    Pan,
}

impl ZoomMode {
    /// Earlier rules win.
    pub fn from_modifiers(shift: bool, control: bool, tab: bool) -> Self {
        if shift && !control {
            ZoomMode::PixelZoom
        } else if control && tab {
            ZoomMode::TimeDensity
        } else if control && !shift {
            ZoomMode::GridDensity
        } else if shift && control {
            ZoomMode::ValueScale
        } else {
            ZoomMode::Pan
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    center: Coord,
    grid_square: Coord,
    time_per_square: f64,
    value_per_square: f64,
    zoom: u32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::from_config(&ViewportConfig::default())
    }
}

impl ViewportState {
    /// Invalid configured scales fall back to the built-in ones.
    pub fn from_config(config: &ViewportConfig) -> Self {
        let fallback = ViewportConfig {
            grid_square: 64.0,
            time_per_square: 0.5,
            value_per_square: 1.0,
        };

        let grid_square = if config.grid_square > MIN_GRID_SQUARE && config.grid_square.is_finite()
        {
            config.grid_square
        } else {
            log::warn!("Ignoring grid square {}", config.grid_square);
            fallback.grid_square
        };
        let time_per_square = positive(config.time_per_square).unwrap_or_else(|| {
            log::warn!("Ignoring time per square {}", config.time_per_square);
            fallback.time_per_square
        });
        let value_per_square = positive(config.value_per_square).unwrap_or_else(|| {
            log::warn!("Ignoring value per square {}", config.value_per_square);
            fallback.value_per_square
        });

        Self {
            center: Coord::default(),
            grid_square: Coord::new(grid_square, grid_square),
            time_per_square,
            value_per_square,
            zoom: 1,
        }
    }

    pub fn center(&self) -> Coord {
        self.center
    }

    pub fn grid_square(&self) -> Coord {
        self.grid_square
    }

    pub fn time_per_square(&self) -> f64 {
        self.time_per_square
    }

    pub fn value_per_square(&self) -> f64 {
        self.value_per_square
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    // transform

    pub fn time_to_x(&self, time: f64) -> f64 {
        time / self.time_per_square * self.grid_square.x
    }

    pub fn x_to_time(&self, x: f64) -> f64 {
        x / self.grid_square.x * self.time_per_square
    }

    pub fn value_to_y(&self, value: f64) -> f64 {
        value * self.grid_square.y / self.value_per_square
    }

    pub fn y_to_value(&self, y: f64) -> f64 {
        y / self.grid_square.y * self.value_per_square
    }

    /// The logical rectangle covered by a widget of `size` screen pixels.
    pub fn window(&self, size: Dimensions) -> Window {
        let zoom = f64::from(self.zoom);
        let half_w = size.width / (2.0 * zoom);
        let half_h = size.height / (2.0 * zoom);

        Window {
            left: self.center.x - half_w,
            right: self.center.x + half_w,
            upper: self.center.y + half_h,
            lower: self.center.y - half_h,
        }
    }

    /// The window grown by one grid square on each side.
    pub fn bounds(&self, size: Dimensions) -> Window {
        self.window(size).grown(self.grid_square)
    }

    pub fn left_bound_time(&self, size: Dimensions) -> f64 {
        self.x_to_time(self.bounds(size).left)
    }

    pub fn right_bound_time(&self, size: Dimensions) -> f64 {
        self.x_to_time(self.bounds(size).right)
    }

    pub fn center_time(&self) -> f64 {
        self.x_to_time(self.center.x)
    }

    /// Logical coordinates of a mouse offset given in logical pixels.
    pub fn mouse_position(&self, size: Dimensions, offset: Coord) -> Coord {
        let window = self.window(size);
        Coord::new(window.left + offset.x, window.upper - offset.y)
    }

    /// Whether a logical mouse x lies on the vertical line at `time`.
    pub fn hits_time(&self, time: f64, mouse_x: f64) -> bool {
        (mouse_x - self.time_to_x(time)).abs() < HIT_RADIUS
    }

    pub fn to_screen(&self, size: Dimensions, point: Coord) -> (f64, f64) {
        let window = self.window(size);
        let zoom = f64::from(self.zoom);
        ((point.x - window.left) * zoom, (window.upper - point.y) * zoom)
    }

    pub fn from_screen(&self, size: Dimensions, x: f64, y: f64) -> Coord {
        let zoom = f64::from(self.zoom);
        self.mouse_position(size, Coord::new(x / zoom, y / zoom))
    }

    /// Sampling density requested from sources for the current scale.
    pub fn draw_resolution(&self) -> u32 {
        let per_second = (self.grid_square.x / self.time_per_square).ceil() * 2.0;
        if per_second >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            per_second.max(0.0) as u32
        }
    }

    // transitions

    pub fn go_to(&mut self, time: f64) {
        self.center.x = self.time_to_x(time);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.center.x += dx;
        self.center.y += dy;
    }

    pub fn pan_left(&mut self) {
        self.pan(-self.grid_square.x / 2.0, 0.0);
    }

    pub fn pan_right(&mut self) {
        self.pan(self.grid_square.x / 2.0, 0.0);
    }

    pub fn pan_up(&mut self) {
        self.pan(0.0, self.grid_square.y / 2.0);
    }

    pub fn pan_down(&mut self) {
        self.pan(0.0, -self.grid_square.y / 2.0);
    }

    /// Moves the view with a mouse drag of `(dx, dy)` logical pixels, screen
    /// y pointing down.
    pub fn drag_by(&mut self, dx: f64, dy: f64) {
        self.center.x -= dx;
        self.center.y += dy;
    }

    /// Applies one wheel step.
    ///
    /// Zooming keeps the time under the horizontal center fixed and returns
    /// the new draw resolution. A zoom step that would break a limit is
    /// ignored and returns `None`, as does panning.
    pub fn scroll(&mut self, mode: ZoomMode, direction: ScrollDirection) -> Option<u32> {
        let up = direction == ScrollDirection::Up;

        match mode {
            ZoomMode::PixelZoom => self.pivoted(|vp| {
                let zoom = if up { vp.zoom * 2 } else { vp.zoom / 2 };
                if (1..=MAX_PIXEL_ZOOM).contains(&zoom) {
                    vp.zoom = zoom;
                    true
                } else {
                    false
                }
            }),
            ZoomMode::TimeDensity => self.pivoted(|vp| {
                let tps = if up {
                    vp.time_per_square * 2.0
                } else {
                    vp.time_per_square / 2.0
                };
                positive(tps).map(|tps| vp.time_per_square = tps).is_some()
            }),
            ZoomMode::GridDensity => self.pivoted(|vp| {
                let square = if up {
                    Coord::new(vp.grid_square.x * 2.0, vp.grid_square.y * 2.0)
                } else {
                    Coord::new(vp.grid_square.x / 2.0, vp.grid_square.y / 2.0)
                };
                let valid = |v: f64| v > MIN_GRID_SQUARE && v.is_finite();
                if valid(square.x) && valid(square.y) {
                    vp.grid_square = square;
                    true
                } else {
                    false
                }
            }),
            ZoomMode::ValueScale => self.pivoted(|vp| {
                let vps = if up {
                    vp.value_per_square * 2.0
                } else {
                    vp.value_per_square / 2.0
                };
                positive(vps).map(|vps| vp.value_per_square = vps).is_some()
            }),
            ZoomMode::Pan => {
                if up {
                    self.pan_right();
                } else {
                    self.pan_left();
                }
                None
            }
        }
    }

    fn pivoted(&mut self, change: impl FnOnce(&mut Self) -> bool) -> Option<u32> {
        let pivot = self.center_time();
        if !change(self) {
            return None;
        }
        self.center.x = self.time_to_x(pivot);
        Some(self.draw_resolution())
    }
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}
