use std::path::PathBuf;

use ab_glyph::FontArc;
use anyhow::{Context as _, Result};
use chrono::Local;
use eframe::egui::{
    self, Color32, ColorImage, Context as EguiContext, Key, Pos2, Rect, RichText, Sense,
    TextureHandle, TextureOptions, TopBottomPanel,
};
use eframe::{App, Frame};

use snapfix::diagnosis::Diagnosis;
use snapfix::mapper::Viewport;
use snapfix::raster::{self, PixmapSurface};
use snapfix::session::Session;
use snapfix::settings::UserSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    OpenPhoto,
    OpenDiagnosis,
    Export,
    Reset,
}

pub struct SnapFixApp {
    session: Session,
    settings: UserSettings,
    font: Option<FontArc>,
    overlay: Option<TextureHandle>,
    status: Option<String>,
}

impl SnapFixApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        session: Session,
        settings: UserSettings,
        font: Option<FontArc>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            session,
            settings,
            font,
            overlay: None,
            status: None,
        }
    }

    fn handle_shortcuts(&mut self, ctx: &EguiContext) -> Option<Action> {
        if ctx.input(|input| input.key_pressed(Key::Escape)) {
            return Some(Action::Reset);
        }

        let cmd = ctx.input(|input| input.modifiers.command || input.modifiers.ctrl);
        if !cmd {
            return None;
        }

        if ctx.input(|input| input.key_pressed(Key::O)) {
            return Some(Action::OpenPhoto);
        }
        if ctx.input(|input| input.key_pressed(Key::D)) {
            return Some(Action::OpenDiagnosis);
        }
        if ctx.input(|input| input.key_pressed(Key::S)) {
            return Some(Action::Export);
        }
        None
    }

    fn run_action(&mut self, action: Action) {
        let result = match action {
            Action::OpenPhoto => self.open_photo(),
            Action::OpenDiagnosis => self.open_diagnosis(),
            Action::Export => self.save_to_file(),
            Action::Reset => {
                self.reset();
                Ok(())
            }
        };

        if let Err(err) = result {
            log::error!("{action:?} failed: {err:#}");
            self.status = Some(format!("{err:#}"));
        }
    }

    fn dialog(&self) -> rfd::FileDialog {
        let dialog = rfd::FileDialog::new();
        match &self.settings.last_open_dir {
            Some(dir) => dialog.set_directory(dir),
            None => dialog,
        }
    }

    fn open_photo(&mut self) -> Result<()> {
        let file = self
            .dialog()
            .set_title("Open photo")
            .add_filter("Images", &["png", "jpg", "jpeg"])
            .pick_file();
        let Some(path) = file else {
            return Ok(());
        };

        let image =
            image::open(&path).with_context(|| format!("cannot open photo {}", path.display()))?;
        self.settings.remember_open_dir(&path);
        self.session.begin(image, Diagnosis::default());
        self.status = Some(format!("Loaded {}", path.display()));
        Ok(())
    }

    fn open_diagnosis(&mut self) -> Result<()> {
        let file = self
            .dialog()
            .set_title("Open diagnosis")
            .add_filter("JSON", &["json"])
            .pick_file();
        let Some(path) = file else {
            return Ok(());
        };

        let diagnosis = Diagnosis::load(&path)?;
        self.settings.remember_open_dir(&path);
        if self.session.replace_diagnosis(diagnosis) {
            self.status = Some(format!("Loaded {}", path.display()));
        } else {
            self.status = Some("Open a photo before its diagnosis".to_string());
        }
        Ok(())
    }

    fn save_to_file(&mut self) -> Result<()> {
        let Some(analysis) = self.session.analysis() else {
            return Ok(());
        };

        let default_name = format!("Repair {}.png", Local::now().format("%Y-%m-%d at %H.%M.%S"));
        let mut dialog = rfd::FileDialog::new()
            .set_title("Export annotated photo")
            .set_file_name(&default_name)
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"]);
        if let Some(dir) = &self.settings.export_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return Ok(());
        };

        let flattened = raster::flatten(
            &analysis.photo.image,
            self.session.layer().annotations(),
            self.session.layer().theme(),
            self.font.clone(),
        )
        .context("flatten failed")?;
        raster::save_image(&flattened, &path)?;

        self.settings.export_dir = path.parent().map(PathBuf::from);
        if let Err(err) = self.settings.save() {
            log::warn!("cannot persist settings: {err:#}");
        }
        log::info!("exported {}", path.display());
        self.status = Some(format!("Saved {}", path.display()));
        Ok(())
    }

    fn reset(&mut self) {
        self.session.reset();
        self.overlay = None;
        self.status = None;
    }

    fn show_toolbar(&self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;
        ui.horizontal_centered(|ui| {
            if ui.button("Open photo…").clicked() {
                action = Some(Action::OpenPhoto);
            }
            if ui.button("Open diagnosis…").clicked() {
                action = Some(Action::OpenDiagnosis);
            }
            let ready = !self.session.is_idle();
            if ui.add_enabled(ready, egui::Button::new("Export…")).clicked() {
                action = Some(Action::Export);
            }
            if ui.add_enabled(ready, egui::Button::new("Reset")).clicked() {
                action = Some(Action::Reset);
            }
        });
        action
    }

    fn show_diagnosis(&self, ui: &mut egui::Ui) {
        let Some(analysis) = self.session.analysis() else {
            ui.label(RichText::new("No analysis yet").color(Color32::GRAY));
            return;
        };
        let diagnosis = &analysis.diagnosis;

        egui::ScrollArea::vertical().show(ui, |ui| {
            if !diagnosis.title.is_empty() {
                ui.heading(&diagnosis.title);
                ui.add_space(6.0);
            }
            if !diagnosis.diagnosis.is_empty() {
                ui.label(&diagnosis.diagnosis);
                ui.add_space(10.0);
            }
            if !diagnosis.steps.is_empty() {
                ui.label(RichText::new("Repair steps").strong());
                for (index, step) in diagnosis.steps.iter().enumerate() {
                    ui.label(format!("{}. {step}", index + 1));
                }
            }
        });
    }

    fn show_photo(&mut self, ui: &mut egui::Ui, ctx: &EguiContext) {
        let available = ui.available_size();
        let (canvas_rect, _) = ui.allocate_exact_size(available, Sense::hover());
        let painter = ui.painter_at(canvas_rect);

        let (analysis, layer) = self.session.parts_mut();
        let Some(analysis) = analysis else {
            painter.text(
                canvas_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Open a photo (Cmd+O)",
                egui::FontId::proportional(19.0),
                Color32::GRAY,
            );
            return;
        };

        let image_size = analysis.photo.size_vec2();
        let zoom = (available.x / image_size.x)
            .min(available.y / image_size.y)
            .max(0.01);
        let image_rect = Rect::from_center_size(canvas_rect.center(), image_size * zoom);
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
        painter.image(
            analysis.photo.texture(ctx).id(),
            image_rect,
            uv,
            Color32::WHITE,
        );

        let pixels_per_point = ctx.pixels_per_point();
        layer.set_viewport(Viewport::new(
            (image_rect.width() * pixels_per_point).round(),
            (image_rect.height() * pixels_per_point).round(),
        ));

        if layer.needs_repaint() {
            match PixmapSurface::new(layer.viewport(), self.font.clone()) {
                Ok(mut surface) => {
                    layer.render(&mut surface);
                    let pixmap = surface.pixmap();
                    let image = ColorImage::from_rgba_premultiplied(
                        [pixmap.width() as usize, pixmap.height() as usize],
                        pixmap.data(),
                    );
                    match &mut self.overlay {
                        Some(texture) => texture.set(image, TextureOptions::LINEAR),
                        None => {
                            self.overlay =
                                Some(ctx.load_texture("overlay", image, TextureOptions::LINEAR));
                        }
                    }
                }
                Err(err) => {
                    log::debug!("{err}");
                    layer.skip_pass();
                    self.overlay = None;
                }
            }
        }

        if let Some(overlay) = &self.overlay {
            painter.image(overlay.id(), image_rect, uv, Color32::WHITE);
        }
    }
}

impl App for SnapFixApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut Frame) {
        let mut action = self.handle_shortcuts(ctx);

        TopBottomPanel::top("toolbar")
            .exact_height(40.0)
            .show(ctx, |ui| {
                if let Some(clicked) = self.show_toolbar(ui) {
                    action = Some(clicked);
                }
            });

        TopBottomPanel::bottom("status")
            .exact_height(24.0)
            .show(ctx, |ui| {
                if let Some(status) = &self.status {
                    ui.label(RichText::new(status).small());
                }
            });

        egui::SidePanel::right("diagnosis")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.show_diagnosis(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::from_rgb(20, 22, 26)))
            .show(ctx, |ui| self.show_photo(ui, ctx));

        if let Some(action) = action {
            self.run_action(action);
        }
    }
}
