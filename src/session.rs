use egui::{ColorImage, Context as EguiContext, TextureHandle, TextureOptions, Vec2};
use image::DynamicImage;

use crate::diagnosis::Diagnosis;
use crate::layer::AnnotationLayer;
use crate::theme::OverlayTheme;

/// Captured photo plus its GPU texture. The texture lives exactly as long as
/// the photo does.
pub struct Photo {
    pub image: DynamicImage,
    texture: Option<TextureHandle>,
}

impl Photo {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            texture: None,
        }
    }

    pub fn size_vec2(&self) -> Vec2 {
        Vec2::new(self.image.width() as f32, self.image.height() as f32)
    }

    pub fn texture(&mut self, ctx: &EguiContext) -> &TextureHandle {
        self.texture.get_or_insert_with(|| {
            let rgba = self.image.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let color = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
            ctx.load_texture("photo", color, TextureOptions::LINEAR)
        })
    }
}

pub struct Analysis {
    pub photo: Photo,
    pub diagnosis: Diagnosis,
}

pub enum SessionState {
    Idle,
    Ready(Box<Analysis>),
}

/// One photo and its diagnosis at a time; the overlay layer always mirrors
/// the current analysis.
pub struct Session {
    state: SessionState,
    layer: AnnotationLayer,
}

impl Session {
    pub fn new(theme: OverlayTheme) -> Self {
        Self {
            state: SessionState::Idle,
            layer: AnnotationLayer::new(theme),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, SessionState::Idle)
    }

    pub fn analysis(&self) -> Option<&Analysis> {
        match &self.state {
            SessionState::Ready(analysis) => Some(analysis.as_ref()),
            SessionState::Idle => None,
        }
    }

    pub fn layer(&self) -> &AnnotationLayer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut AnnotationLayer {
        &mut self.layer
    }

    pub fn parts_mut(&mut self) -> (Option<&mut Analysis>, &mut AnnotationLayer) {
        let analysis = match &mut self.state {
            SessionState::Ready(analysis) => Some(analysis.as_mut()),
            SessionState::Idle => None,
        };
        (analysis, &mut self.layer)
    }

    /// Starts a new analysis, dropping the previous photo and overlay.
    pub fn begin(&mut self, image: DynamicImage, diagnosis: Diagnosis) {
        log::info!(
            "session ready: {}x{} photo, {} repair steps",
            image.width(),
            image.height(),
            diagnosis.steps.len()
        );
        self.layer.set_annotations(diagnosis.annotation_set());
        self.state = SessionState::Ready(Box::new(Analysis {
            photo: Photo::new(image),
            diagnosis,
        }));
    }

    /// Swaps in a new diagnosis for the current photo. Returns `false` when
    /// there is no photo to attach it to.
    pub fn replace_diagnosis(&mut self, diagnosis: Diagnosis) -> bool {
        let SessionState::Ready(analysis) = &mut self.state else {
            return false;
        };
        self.layer.set_annotations(diagnosis.annotation_set());
        analysis.diagnosis = diagnosis;
        log::info!("diagnosis replaced");
        true
    }

    pub fn reset(&mut self) {
        if !self.is_idle() {
            log::info!("session reset to idle");
        }
        self.state = SessionState::Idle;
        self.layer.clear_annotations();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(OverlayTheme::default())
    }
}
