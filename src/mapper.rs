use serde::{Deserialize, Serialize};

/// Logical extent of the normalized annotation grid on both axes.
pub const NORMALIZED_EXTENT: f32 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Overlay size in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    pub fn is_drawable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 1.0 && self.height >= 1.0
    }

    pub fn scale(self) -> Scale {
        Scale::for_viewport(self)
    }
}

/// Maps a normalized value onto an axis of `extent` pixels.
///
/// No clamping: values outside `0..=1000` land outside the surface and are
/// clipped by the surface itself.
pub fn to_pixel(value: f32, extent: f32) -> f32 {
    value * extent / NORMALIZED_EXTENT
}

/// Per-axis mapping for one render pass. Built from the current viewport and
/// never reused after a resize.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    width: f32,
    height: f32,
}

impl Scale {
    pub fn for_viewport(viewport: Viewport) -> Self {
        Self {
            width: viewport.width,
            height: viewport.height,
        }
    }

    pub fn factor_x(self) -> f32 {
        self.width / NORMALIZED_EXTENT
    }

    pub fn factor_y(self) -> f32 {
        self.height / NORMALIZED_EXTENT
    }

    pub fn x(self, value: f32) -> f32 {
        to_pixel(value, self.width)
    }

    pub fn y(self, value: f32) -> f32 {
        to_pixel(value, self.height)
    }

    pub fn point(self, point: Point) -> Point {
        Point::new(self.x(point.x), self.y(point.y))
    }

    /// Scalar lengths (circle radius) always use the horizontal axis, so
    /// non-square viewports see the same radius for any height.
    pub fn length(self, value: f32) -> f32 {
        self.x(value)
    }
}
