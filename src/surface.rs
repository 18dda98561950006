use crate::mapper::Point;
use crate::theme::{HaloTokens, OverlayTheme, Rgba};

/// Axis-aligned rectangle in pixels. Width and height may be negative; the
/// rectangle then extends left/up from its origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Corners in drawing order, starting at the origin.
    pub fn corners(self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.x + self.width, self.y),
            Point::new(self.x + self.width, self.y + self.height),
            Point::new(self.x, self.y + self.height),
        ]
    }
}

/// Shared state set once at the start of a render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawDefaults {
    pub line_width: f32,
    pub halo: Option<HaloTokens>,
    pub font_px: f32,
}

impl DrawDefaults {
    pub fn from_theme(theme: &OverlayTheme) -> Self {
        Self {
            line_width: theme.stroke.line_width,
            halo: theme.stroke.halo.clone(),
            font_px: theme.label.font_px,
        }
    }
}

/// Drawing target of a render pass. Strokes use the line width from the last
/// `apply_defaults`; text uses its font size.
pub trait Surface {
    fn clear(&mut self);
    fn apply_defaults(&mut self, defaults: &DrawDefaults);
    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba);
    fn stroke_rect(&mut self, rect: PixelRect, color: Rgba);
    fn fill_rect(&mut self, rect: PixelRect, color: Rgba);
    fn stroke_circle(&mut self, center: Point, radius: f32, color: Rgba);
    fn fill_triangle(&mut self, points: [Point; 3], color: Rgba);
    fn measure_text(&self, text: &str) -> f32;
    /// `origin` is the left end of the text baseline.
    fn fill_text(&mut self, text: &str, origin: Point, color: Rgba);
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCall {
    Clear,
    Defaults(DrawDefaults),
    StrokeLine {
        from: Point,
        to: Point,
        color: Rgba,
    },
    StrokeRect {
        rect: PixelRect,
        color: Rgba,
    },
    FillRect {
        rect: PixelRect,
        color: Rgba,
    },
    StrokeCircle {
        center: Point,
        radius: f32,
        color: Rgba,
    },
    FillTriangle {
        points: [Point; 3],
        color: Rgba,
    },
    FillText {
        text: String,
        origin: Point,
        color: Rgba,
    },
}

impl DrawCall {
    pub fn is_drawing(&self) -> bool {
        !matches!(self, Self::Clear | Self::Defaults(_))
    }
}

/// Surface that keeps the calls issued since the last clear. Text is measured
/// with a fixed advance per character.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
    advance: f32,
}

impl RecordingSurface {
    pub fn new(advance: f32) -> Self {
        Self {
            calls: Vec::new(),
            advance,
        }
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn drawing_calls(&self) -> Vec<&DrawCall> {
        self.calls.iter().filter(|call| call.is_drawing()).collect()
    }
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(8.0)
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self) {
        self.calls.clear();
        self.calls.push(DrawCall::Clear);
    }

    fn apply_defaults(&mut self, defaults: &DrawDefaults) {
        self.calls.push(DrawCall::Defaults(defaults.clone()));
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba) {
        self.calls.push(DrawCall::StrokeLine { from, to, color });
    }

    fn stroke_rect(&mut self, rect: PixelRect, color: Rgba) {
        self.calls.push(DrawCall::StrokeRect { rect, color });
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        self.calls.push(DrawCall::FillRect { rect, color });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Rgba) {
        self.calls.push(DrawCall::StrokeCircle {
            center,
            radius,
            color,
        });
    }

    fn fill_triangle(&mut self, points: [Point; 3], color: Rgba) {
        self.calls.push(DrawCall::FillTriangle { points, color });
    }

    fn measure_text(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }

    fn fill_text(&mut self, text: &str, origin: Point, color: Rgba) {
        self.calls.push(DrawCall::FillText {
            text: text.to_string(),
            origin,
            color,
        });
    }
}
