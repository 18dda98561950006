use crate::annotation::{Annotation, BoxCoords, Shape};
use crate::label::draw_label;
use crate::mapper::{Point, Scale};
use crate::surface::{PixelRect, Surface};
use crate::theme::OverlayTheme;

/// Maps a normalized box onto the surface. Width and height keep their sign.
pub fn box_rect(coords: BoxCoords, scale: Scale) -> PixelRect {
    PixelRect::new(
        scale.x(coords.xmin),
        scale.y(coords.ymin),
        scale.x(coords.width()),
        scale.y(coords.height()),
    )
}

/// Wing points of an arrowhead at `end`, each `length` pixels back along the
/// shaft and rotated by `angle_deg` to either side of it.
pub fn arrow_head(start: Point, end: Point, length: f32, angle_deg: f32) -> [Point; 2] {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let spread = angle_deg.to_radians();
    let wing = |theta: f32| {
        Point::new(
            end.x - length * theta.cos(),
            end.y - length * theta.sin(),
        )
    };
    [wing(angle - spread), wing(angle + spread)]
}

/// Baseline origin of the label for `shape`, clear of the shape's outline.
pub fn label_anchor(shape: &Shape, scale: Scale, theme: &OverlayTheme) -> Point {
    let anchors = &theme.anchors;
    match shape {
        Shape::Box(coords) | Shape::Highlight(coords) => {
            let rect = box_rect(*coords, scale);
            Point::new(rect.x, rect.y - anchors.box_gap)
        }
        Shape::Circle { center, radius } => {
            let center = scale.point(*center);
            let radius = scale.length(*radius);
            Point::new(
                center.x - anchors.circle_shift_x,
                center.y - radius - anchors.circle_gap,
            )
        }
        Shape::Arrow { start, .. } => {
            let start = scale.point(*start);
            Point::new(start.x, start.y - anchors.arrow_gap)
        }
    }
}

/// Draws one annotation and its label in the type color.
pub fn draw_annotation<S: Surface + ?Sized>(
    surface: &mut S,
    annotation: &Annotation,
    scale: Scale,
    theme: &OverlayTheme,
) {
    let color = theme.color_for(Some(annotation.kind()));

    match &annotation.shape {
        Shape::Box(coords) => {
            surface.stroke_rect(box_rect(*coords, scale), color);
        }
        Shape::Highlight(coords) => {
            let rect = box_rect(*coords, scale);
            surface.fill_rect(rect, theme.highlight_fill());
            surface.stroke_rect(rect, color);
        }
        Shape::Circle { center, radius } => {
            surface.stroke_circle(scale.point(*center), scale.length(*radius), color);
        }
        Shape::Arrow { start, end } => {
            let start = scale.point(*start);
            let end = scale.point(*end);
            surface.stroke_line(start, end, color);
            let [left, right] = arrow_head(
                start,
                end,
                theme.stroke.arrow_head_length,
                theme.stroke.arrow_head_angle_deg,
            );
            surface.fill_triangle([end, left, right], color);
        }
    }

    let anchor = label_anchor(&annotation.shape, scale, theme);
    draw_label(surface, &annotation.label, anchor, color, theme);
}
