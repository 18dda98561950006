use crate::annotation::AnnotationSet;
use crate::mapper::Viewport;
use crate::shape::draw_annotation;
use crate::surface::{DrawDefaults, Surface};
use crate::theme::OverlayTheme;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub drawn: usize,
    /// Descriptors dropped while decoding the current set.
    pub skipped: usize,
}

/// One full pass: clear, rescale, set defaults, then draw every annotation in
/// list order. `None` leaves the surface cleared.
pub fn render_pass<S: Surface + ?Sized>(
    surface: &mut S,
    annotations: Option<&AnnotationSet>,
    viewport: Viewport,
    theme: &OverlayTheme,
) -> RenderStats {
    surface.clear();

    let Some(annotations) = annotations else {
        return RenderStats::default();
    };

    let scale = viewport.scale();
    surface.apply_defaults(&DrawDefaults::from_theme(theme));

    for annotation in annotations {
        draw_annotation(surface, annotation, scale, theme);
    }

    RenderStats {
        drawn: annotations.len(),
        skipped: annotations.rejected(),
    }
}

/// Holds the current annotation set and viewport and knows when the overlay
/// is stale.
#[derive(Clone, Debug)]
pub struct AnnotationLayer {
    annotations: Option<AnnotationSet>,
    viewport: Viewport,
    theme: OverlayTheme,
    dirty: bool,
}

impl AnnotationLayer {
    pub fn new(theme: OverlayTheme) -> Self {
        Self {
            annotations: None,
            viewport: Viewport::new(0.0, 0.0),
            theme,
            dirty: true,
        }
    }

    pub fn annotations(&self) -> Option<&AnnotationSet> {
        self.annotations.as_ref()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn theme(&self) -> &OverlayTheme {
        &self.theme
    }

    pub fn set_annotations(&mut self, annotations: Option<AnnotationSet>) {
        self.annotations = annotations;
        self.dirty = true;
    }

    pub fn clear_annotations(&mut self) {
        self.set_annotations(None);
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            self.viewport = viewport;
            self.dirty = true;
        }
    }

    pub fn needs_repaint(&self) -> bool {
        self.dirty
    }

    /// Records that no surface could back the current state. The next
    /// annotation or viewport change makes the layer stale again.
    pub fn skip_pass(&mut self) {
        if self.dirty {
            log::debug!(
                "overlay pass skipped at {}x{}",
                self.viewport.width,
                self.viewport.height
            );
        }
        self.dirty = false;
    }

    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S) -> RenderStats {
        let stats = render_pass(
            surface,
            self.annotations.as_ref(),
            self.viewport,
            &self.theme,
        );
        self.dirty = false;
        log::debug!(
            "overlay pass at {}x{}: {} drawn, {} skipped",
            self.viewport.width,
            self.viewport.height,
            stats.drawn,
            stats.skipped
        );
        stats
    }
}

impl Default for AnnotationLayer {
    fn default() -> Self {
        Self::new(OverlayTheme::default())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_pass, AnnotationLayer};
    use crate::annotation::AnnotationSet;
    use crate::mapper::{Point, Viewport};
    use crate::surface::{DrawCall, PixelRect, RecordingSurface, Surface};
    use crate::theme::overlay_theme;

    fn sample_set() -> AnnotationSet {
        AnnotationSet::from_value(&json!([
            {"type": "highlight", "label": "Worn seal", "box_2d": [100, 100, 400, 500]},
            {"type": "box", "label": "Bad", "box_2d": [1, 2, 3]},
            {"type": "circle", "label": "Crack", "center": [500, 500]},
            {"type": "arrow", "label": "Twist", "start": [100, 900], "end": [400, 600]},
            {"type": "box", "label": "Screw", "box_2d": [600, 600, 700, 700]}
        ]))
        .expect("list")
    }

    #[test]
    fn pass_starts_with_clear_and_defaults() {
        let theme = overlay_theme();
        let mut surface = RecordingSurface::default();
        render_pass(
            &mut surface,
            Some(&sample_set()),
            Viewport::new(800.0, 600.0),
            &theme,
        );
        assert_eq!(surface.calls()[0], DrawCall::Clear);
        assert!(matches!(surface.calls()[1], DrawCall::Defaults(ref d) if d.line_width == 3.0));
    }

    #[test]
    fn missing_list_only_clears() {
        let mut surface = RecordingSurface::default();
        surface.fill_rect(PixelRect::new(0.0, 0.0, 5.0, 5.0), [0, 0, 0, 255]);
        let stats = render_pass(&mut surface, None, Viewport::new(800.0, 600.0), &overlay_theme());
        assert_eq!(surface.calls(), &[DrawCall::Clear]);
        assert_eq!(stats.drawn, 0);
    }

    #[test]
    fn unknown_types_issue_no_drawing_calls() {
        let set = AnnotationSet::from_value(&json!([
            {"type": "star", "label": "x", "box_2d": [1, 2, 3, 4]},
            {"type": "", "label": "y"},
            {"label": "z"}
        ]))
        .expect("list");
        let mut surface = RecordingSurface::default();
        let stats = render_pass(&mut surface, Some(&set), Viewport::new(300.0, 300.0), &overlay_theme());
        assert!(surface.drawing_calls().is_empty());
        assert_eq!(stats.skipped, 3);
    }

    #[test]
    fn malformed_entry_does_not_stop_later_ones() {
        let theme = overlay_theme();
        let mut surface = RecordingSurface::default();
        let stats = render_pass(
            &mut surface,
            Some(&sample_set()),
            Viewport::new(1000.0, 1000.0),
            &theme,
        );
        assert_eq!(stats.drawn, 4);
        assert_eq!(stats.skipped, 1);

        let texts: Vec<&str> = surface
            .calls()
            .iter()
            .filter_map(|call| match call {
                DrawCall::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Worn seal", "Crack", "Twist", "Screw"]);
        assert!(surface.calls().contains(&DrawCall::StrokeRect {
            rect: PixelRect::new(600.0, 600.0, 100.0, 100.0),
            color: theme.palette.box_outline,
        }));
    }

    #[test]
    fn repeated_passes_are_identical() {
        let set = sample_set();
        let theme = overlay_theme();
        let viewport = Viewport::new(1366.0, 768.0);

        let mut first = RecordingSurface::default();
        render_pass(&mut first, Some(&set), viewport, &theme);
        let mut second = first.clone();
        render_pass(&mut second, Some(&set), viewport, &theme);
        assert_eq!(first.calls(), second.calls());
    }

    #[test]
    fn resize_scales_every_shape_and_keeps_order() {
        let set = sample_set();
        let theme = overlay_theme();

        let mut small = RecordingSurface::default();
        render_pass(&mut small, Some(&set), Viewport::new(500.0, 400.0), &theme);
        let mut large = RecordingSurface::default();
        render_pass(&mut large, Some(&set), Viewport::new(1000.0, 800.0), &theme);

        let kinds = |surface: &RecordingSurface| {
            surface
                .calls()
                .iter()
                .map(std::mem::discriminant)
                .collect::<Vec<_>>()
        };
        assert_eq!(kinds(&small), kinds(&large));

        let circle_centers: Vec<Point> = [&small, &large]
            .iter()
            .flat_map(|surface| {
                surface.calls().iter().filter_map(|call| match call {
                    DrawCall::StrokeCircle { center, .. } => Some(*center),
                    _ => None,
                })
            })
            .collect();
        assert_eq!(circle_centers, vec![Point::new(250.0, 200.0), Point::new(500.0, 400.0)]);
    }

    #[test]
    fn layer_tracks_staleness() {
        let mut layer = AnnotationLayer::default();
        let mut surface = RecordingSurface::default();
        assert!(layer.needs_repaint());

        layer.set_viewport(Viewport::new(640.0, 480.0));
        layer.set_annotations(Some(sample_set()));
        let stats = layer.render(&mut surface);
        assert_eq!(stats.drawn, 4);
        assert!(!layer.needs_repaint());

        layer.set_viewport(Viewport::new(640.0, 480.0));
        assert!(!layer.needs_repaint());

        layer.set_viewport(Viewport::new(800.0, 480.0));
        assert!(layer.needs_repaint());
        layer.render(&mut surface);

        layer.clear_annotations();
        assert!(layer.needs_repaint());
        layer.render(&mut surface);
        assert!(surface.drawing_calls().is_empty());
    }

    #[test]
    fn skipped_pass_waits_for_next_change() {
        let mut layer = AnnotationLayer::default();
        layer.set_annotations(Some(sample_set()));
        layer.skip_pass();
        assert!(!layer.needs_repaint());

        layer.set_viewport(Viewport::new(0.0, 0.0));
        assert!(!layer.needs_repaint());
        layer.set_viewport(Viewport::new(320.0, 240.0));
        assert!(layer.needs_repaint());
    }
}
