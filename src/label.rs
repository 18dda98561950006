use crate::mapper::Point;
use crate::surface::{PixelRect, Surface};
use crate::theme::{LabelTokens, OverlayTheme, Rgba};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelPlate {
    pub rect: PixelRect,
    pub text_origin: Point,
}

/// Backing plate for a label of `text_width` pixels whose baseline starts at
/// `anchor`.
pub fn plate_geometry(text_width: f32, anchor: Point, tokens: &LabelTokens) -> LabelPlate {
    LabelPlate {
        rect: PixelRect::new(
            anchor.x - tokens.padding_x,
            anchor.y - tokens.baseline_offset,
            text_width + tokens.padding_x * 2.0,
            tokens.plate_height,
        ),
        text_origin: anchor,
    }
}

/// Draws `text` in `color` over a dark plate. Empty text still gets its
/// (padding-only) plate.
pub fn draw_label<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    anchor: Point,
    color: Rgba,
    theme: &OverlayTheme,
) {
    let width = surface.measure_text(text);
    let plate = plate_geometry(width, anchor, &theme.label);
    surface.fill_rect(plate.rect, theme.label.plate_color);
    surface.fill_text(text, plate.text_origin, color);
}

#[cfg(test)]
mod tests {
    use super::{draw_label, plate_geometry};
    use crate::mapper::Point;
    use crate::surface::{DrawCall, PixelRect, RecordingSurface};
    use crate::theme::overlay_theme;

    #[test]
    fn plate_wraps_text_with_padding() {
        let theme = overlay_theme();
        let plate = plate_geometry(40.0, Point::new(100.0, 50.0), &theme.label);
        assert_eq!(plate.rect, PixelRect::new(94.0, 32.0, 52.0, 24.0));
        assert_eq!(plate.text_origin, Point::new(100.0, 50.0));
    }

    #[test]
    fn plate_is_drawn_before_text() {
        let theme = overlay_theme();
        let mut surface = RecordingSurface::new(10.0);
        draw_label(&mut surface, "Bolt", Point::new(20.0, 40.0), [1, 2, 3, 255], &theme);

        assert_eq!(
            surface.calls(),
            &[
                DrawCall::FillRect {
                    rect: PixelRect::new(14.0, 22.0, 52.0, 24.0),
                    color: theme.label.plate_color,
                },
                DrawCall::FillText {
                    text: "Bolt".to_string(),
                    origin: Point::new(20.0, 40.0),
                    color: [1, 2, 3, 255],
                },
            ]
        );
    }

    #[test]
    fn empty_label_still_gets_a_plate() {
        let theme = overlay_theme();
        let mut surface = RecordingSurface::new(10.0);
        draw_label(&mut surface, "", Point::new(0.0, 30.0), [1, 2, 3, 255], &theme);
        assert!(matches!(
            surface.calls()[0],
            DrawCall::FillRect { rect, .. } if rect.width == 12.0
        ));
        assert_eq!(surface.calls().len(), 2);
    }
}
