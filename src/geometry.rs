// ABOUTME: Screen-space geometry primitives shared by the placement logic and the platform backends
// ABOUTME: Uses AppKit's convention of a bottom-left origin with y growing upward

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. `origin` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Builds a rectangle of `size` whose top-left corner sits at `top_left`.
    pub fn from_top_left(top_left: Point, size: Size) -> Self {
        Self::new(top_left.x, top_left.y - size.height, size.width, size.height)
    }

    pub fn min_x(&self) -> f64 {
        self.origin.x
    }

    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    pub fn min_y(&self) -> f64 {
        self.origin.y
    }

    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    pub fn mid_x(&self) -> f64 {
        self.origin.x + self.size.width / 2.0
    }

    pub fn mid_y(&self) -> f64 {
        self.origin.y + self.size.height / 2.0
    }
}

/// A display as reported by the window server.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    /// Full display bounds.
    pub frame: Rect,
    /// Bounds minus the menu bar and Dock.
    pub visible_frame: Rect,
}

impl ScreenGeometry {
    pub fn new(frame: Rect, visible_frame: Rect) -> Self {
        Self {
            frame,
            visible_frame,
        }
    }
}
