use crate::annotation::AnnotationType;

/// Straight (non-premultiplied) RGBA.
pub type Rgba = [u8; 4];

pub fn with_alpha(color: Rgba, alpha: f32) -> Rgba {
    let alpha = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    [color[0], color[1], color[2], alpha]
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayTheme {
    pub palette: PaletteTokens,
    pub stroke: StrokeTokens,
    pub label: LabelTokens,
    pub anchors: AnchorTokens,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaletteTokens {
    pub arrow: Rgba,
    pub circle: Rgba,
    pub box_outline: Rgba,
    pub highlight: Rgba,
    pub fallback: Rgba,
    pub highlight_fill_alpha: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeTokens {
    pub line_width: f32,
    pub arrow_head_length: f32,
    pub arrow_head_angle_deg: f32,
    pub halo: Option<HaloTokens>,
}

/// Dark rim under every stroke so markers stay visible on bright photos.
#[derive(Clone, Debug, PartialEq)]
pub struct HaloTokens {
    pub color: Rgba,
    pub spread: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelTokens {
    pub font_px: f32,
    pub padding_x: f32,
    pub plate_height: f32,
    /// Distance from the plate top to the text baseline.
    pub baseline_offset: f32,
    pub plate_color: Rgba,
}

/// Label anchor offsets per shape, in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorTokens {
    pub box_gap: f32,
    pub circle_shift_x: f32,
    pub circle_gap: f32,
    pub arrow_gap: f32,
}

impl OverlayTheme {
    pub fn color_for(&self, kind: Option<AnnotationType>) -> Rgba {
        match kind {
            Some(AnnotationType::Box) => self.palette.box_outline,
            Some(AnnotationType::Highlight) => self.palette.highlight,
            Some(AnnotationType::Circle) => self.palette.circle,
            Some(AnnotationType::Arrow) => self.palette.arrow,
            None => self.palette.fallback,
        }
    }

    pub fn highlight_fill(&self) -> Rgba {
        with_alpha(self.palette.highlight, self.palette.highlight_fill_alpha)
    }
}

impl Default for OverlayTheme {
    fn default() -> Self {
        overlay_theme()
    }
}

pub fn overlay_theme() -> OverlayTheme {
    OverlayTheme {
        palette: PaletteTokens {
            arrow: [255, 214, 10, 255],
            circle: [255, 59, 48, 255],
            box_outline: [0, 200, 83, 255],
            highlight: [255, 145, 0, 255],
            fallback: [10, 132, 255, 255],
            highlight_fill_alpha: 0.25,
        },
        stroke: StrokeTokens {
            line_width: 3.0,
            arrow_head_length: 15.0,
            arrow_head_angle_deg: 30.0,
            halo: Some(HaloTokens {
                color: [0, 0, 0, 110],
                spread: 1.5,
            }),
        },
        label: LabelTokens {
            font_px: 14.0,
            padding_x: 6.0,
            plate_height: 24.0,
            baseline_offset: 18.0,
            plate_color: [0, 0, 0, 204],
        },
        anchors: AnchorTokens {
            box_gap: 10.0,
            circle_shift_x: 20.0,
            circle_gap: 10.0,
            arrow_gap: 20.0,
        },
    }
}
