use std::path::Path;

use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbaImage};
use thiserror::Error;
use tiny_skia::{
    Color, ColorU8, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::annotation::AnnotationSet;
use crate::layer::{render_pass, RenderStats};
use crate::mapper::{Point, Viewport};
use crate::surface::{DrawDefaults, PixelRect, Surface};
use crate::theme::{HaloTokens, OverlayTheme, Rgba};

#[derive(Debug, Error, PartialEq)]
pub enum SurfaceError {
    #[error("viewport {width}x{height} cannot back a drawing surface")]
    Unavailable { width: f32, height: f32 },
}

/// Transparent tiny-skia pixmap the size of the viewport.
pub struct PixmapSurface {
    pixmap: Pixmap,
    font: Option<FontArc>,
    line_width: f32,
    font_px: f32,
    halo: Option<HaloTokens>,
}

impl PixmapSurface {
    pub fn new(viewport: Viewport, font: Option<FontArc>) -> Result<Self, SurfaceError> {
        let unavailable = SurfaceError::Unavailable {
            width: viewport.width,
            height: viewport.height,
        };
        if !viewport.is_drawable() {
            return Err(unavailable);
        }
        let pixmap = Pixmap::new(viewport.width.round() as u32, viewport.height.round() as u32)
            .ok_or(unavailable)?;
        let defaults = DrawDefaults::from_theme(&OverlayTheme::default());

        Ok(Self {
            pixmap,
            font,
            line_width: defaults.line_width,
            font_px: defaults.font_px,
            halo: None,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        pixmap_to_image(&self.pixmap)
    }

    fn stroke_path(&mut self, path: &tiny_skia::Path, color: Rgba) {
        if let Some(halo) = &self.halo {
            let stroke = Stroke {
                width: self.line_width + halo.spread * 2.0,
                ..Default::default()
            };
            self.pixmap
                .stroke_path(path, &solid(halo.color), &stroke, Transform::identity(), None);
        }

        let stroke = Stroke {
            width: self.line_width,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(path, &solid(color), &stroke, Transform::identity(), None);
    }

    fn fill_path(&mut self, path: &tiny_skia::Path, color: Rgba) {
        self.pixmap.fill_path(
            path,
            &solid(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = true;
    paint
}

fn polygon_path(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    pb.close();
    pb.finish()
}

fn layout_glyphs(font: &FontArc, scale: PxScale, text: &str) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = 0.0;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push((id, caret));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    (glyphs, caret)
}

/// Glyph outlines for `text` as one fillable path, baseline at `origin`.
fn text_path(font: &FontArc, scale: PxScale, text: &str, origin: Point) -> Option<tiny_skia::Path> {
    let factor = font.as_scaled(scale).scale_factor();
    let (glyphs, _) = layout_glyphs(font, scale, text);
    let mut pb = PathBuilder::new();

    for (id, offset) in glyphs {
        let Some(outline) = font.outline(id) else {
            continue;
        };
        // Font units are y-up.
        let px = |p: ab_glyph::Point| {
            (
                origin.x + offset + p.x * factor.horizontal,
                origin.y - p.y * factor.vertical,
            )
        };

        let mut cursor: Option<ab_glyph::Point> = None;
        for curve in &outline.curves {
            let (from, to) = match *curve {
                OutlineCurve::Line(a, b) => (a, b),
                OutlineCurve::Quad(a, _, b) => (a, b),
                OutlineCurve::Cubic(a, _, _, b) => (a, b),
            };
            if cursor != Some(from) {
                if cursor.is_some() {
                    pb.close();
                }
                let (x, y) = px(from);
                pb.move_to(x, y);
            }
            match *curve {
                OutlineCurve::Line(_, b) => {
                    let (x, y) = px(b);
                    pb.line_to(x, y);
                }
                OutlineCurve::Quad(_, c, b) => {
                    let ((cx, cy), (x, y)) = (px(c), px(b));
                    pb.quad_to(cx, cy, x, y);
                }
                OutlineCurve::Cubic(_, c1, c2, b) => {
                    let ((x1, y1), (x2, y2), (x, y)) = (px(c1), px(c2), px(b));
                    pb.cubic_to(x1, y1, x2, y2, x, y);
                }
            }
            cursor = Some(to);
        }
        if cursor.is_some() {
            pb.close();
        }
    }

    pb.finish()
}

impl Surface for PixmapSurface {
    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn apply_defaults(&mut self, defaults: &DrawDefaults) {
        self.line_width = defaults.line_width;
        self.font_px = defaults.font_px;
        self.halo = defaults.halo.clone();
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: Rgba) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.x, from.y);
        pb.line_to(to.x, to.y);
        if let Some(path) = pb.finish() {
            self.stroke_path(&path, color);
        }
    }

    fn stroke_rect(&mut self, rect: PixelRect, color: Rgba) {
        if let Some(path) = polygon_path(&rect.corners()) {
            self.stroke_path(&path, color);
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Rgba) {
        if let Some(path) = polygon_path(&rect.corners()) {
            self.fill_path(&path, color);
        }
    }

    fn stroke_circle(&mut self, center: Point, radius: f32, color: Rgba) {
        if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
            self.stroke_path(&path, color);
        }
    }

    fn fill_triangle(&mut self, points: [Point; 3], color: Rgba) {
        if let Some(path) = polygon_path(&points) {
            self.fill_path(&path, color);
        }
    }

    fn measure_text(&self, text: &str) -> f32 {
        match &self.font {
            Some(font) => layout_glyphs(font, PxScale::from(self.font_px), text).1,
            None => 0.0,
        }
    }

    fn fill_text(&mut self, text: &str, origin: Point, color: Rgba) {
        let Some(font) = &self.font else {
            return;
        };
        if let Some(path) = text_path(font, PxScale::from(self.font_px), text, origin) {
            self.fill_path(&path, color);
        }
    }
}

/// Renders the overlay alone on a transparent surface of `viewport` size.
pub fn render_overlay(
    annotations: Option<&AnnotationSet>,
    viewport: Viewport,
    theme: &OverlayTheme,
    font: Option<FontArc>,
) -> Result<(PixmapSurface, RenderStats), SurfaceError> {
    let mut surface = PixmapSurface::new(viewport, font)?;
    let stats = render_pass(&mut surface, annotations, viewport, theme);
    Ok((surface, stats))
}

/// Composites the overlay onto `photo` at the photo's own resolution. If the
/// overlay surface cannot be created the photo comes back unannotated.
pub fn flatten(
    photo: &DynamicImage,
    annotations: Option<&AnnotationSet>,
    theme: &OverlayTheme,
    font: Option<FontArc>,
) -> Result<DynamicImage> {
    let viewport = Viewport::from_pixels(photo.width(), photo.height());
    let mut base = pixmap_from_image(photo)?;

    match render_overlay(annotations, viewport, theme, font) {
        Ok((overlay, stats)) => {
            log::debug!("flattened {} annotations onto photo", stats.drawn);
            base.draw_pixmap(
                0,
                0,
                overlay.pixmap().as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        Err(err) => log::warn!("overlay skipped: {err}"),
    }

    Ok(DynamicImage::ImageRgba8(pixmap_to_image(&base)?))
}

pub fn resize_photo(photo: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if photo.width() == width && photo.height() == height {
        return photo.clone();
    }
    photo.resize_exact(width, height, FilterType::Triangle)
}

/// Writes PNG unless the extension asks for JPEG.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|item| item.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();

    if ext == "jpg" || ext == "jpeg" {
        image
            .to_rgb8()
            .save_with_format(path, ImageFormat::Jpeg)
            .with_context(|| format!("cannot save jpeg to {}", path.display()))?;
    } else {
        image
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("cannot save png to {}", path.display()))?;
    }
    Ok(())
}

fn pixmap_from_image(image: &DynamicImage) -> Result<Pixmap> {
    let rgba = image.to_rgba8();
    let mut pixmap = Pixmap::new(rgba.width(), rgba.height())
        .ok_or_else(|| anyhow!("cannot allocate {}x{} pixmap", rgba.width(), rgba.height()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Ok(pixmap)
}

fn pixmap_to_image(pixmap: &Pixmap) -> Result<RgbaImage> {
    let mut raw = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let color = px.demultiply();
        raw.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .ok_or_else(|| anyhow!("cannot construct output image"))
}
