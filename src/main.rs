mod app;

use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use image::DynamicImage;

use snapfix::diagnosis::Diagnosis;
use snapfix::font;
use snapfix::mapper::Viewport;
use snapfix::raster;
use snapfix::session::Session;
use snapfix::settings::UserSettings;
use snapfix::theme::OverlayTheme;

#[derive(Parser, Debug)]
#[command(
    name = "snapfix",
    version,
    about = "Show repair diagnoses as annotated photos"
)]
struct Cli {
    /// Label font (TTF/OTF); overrides the saved setting
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the viewer window, optionally with a photo and its diagnosis
    View {
        photo: Option<PathBuf>,
        diagnosis: Option<PathBuf>,
    },
    /// Write the annotated photo to a file without opening a window
    Render {
        photo: PathBuf,
        diagnosis: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Output width in pixels (defaults to the photo's)
        #[arg(long)]
        width: Option<u32>,
        /// Output height in pixels (defaults to the photo's)
        #[arg(long)]
        height: Option<u32>,
        /// Write only the transparent overlay
        #[arg(long)]
        overlay_only: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = UserSettings::load_or_default();
    let font_path = cli.font.clone().or_else(|| settings.font_path.clone());
    let font = font::load_label_font(font_path.as_deref());

    match cli.command {
        Some(Command::Render {
            photo,
            diagnosis,
            output,
            width,
            height,
            overlay_only,
        }) => {
            let request = RenderRequest {
                photo,
                diagnosis,
                output,
                width,
                height,
                overlay_only,
            };
            run_render(&request, font)
        }
        Some(Command::View { photo, diagnosis }) => {
            run_viewer(photo.as_deref(), diagnosis.as_deref(), settings, font)
        }
        None => run_viewer(None, None, settings, font),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn open_photo(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("cannot open photo {}", path.display()))
}

fn run_viewer(
    photo: Option<&Path>,
    diagnosis: Option<&Path>,
    settings: UserSettings,
    font: Option<FontArc>,
) -> Result<()> {
    let mut session = Session::new(OverlayTheme::default());
    if let Some(photo) = photo {
        let diagnosis = match diagnosis {
            Some(path) => Diagnosis::load(path)?,
            None => Diagnosis::default(),
        };
        session.begin(open_photo(photo)?, diagnosis);
    }

    let viewport = egui::ViewportBuilder::default()
        .with_title("SnapFix")
        .with_inner_size([1180.0, 780.0])
        .with_min_inner_size([640.0, 480.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "SnapFix",
        options,
        Box::new(move |cc| Box::new(app::SnapFixApp::new(cc, session, settings, font))),
    )
    .map_err(|err| anyhow!("viewer failed: {err}"))
}

struct RenderRequest {
    photo: PathBuf,
    diagnosis: PathBuf,
    output: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    overlay_only: bool,
}

fn run_render(request: &RenderRequest, font: Option<FontArc>) -> Result<()> {
    let photo = open_photo(&request.photo)?;
    let diagnosis = Diagnosis::load(&request.diagnosis)?;
    let theme = OverlayTheme::default();

    let width = request.width.unwrap_or(photo.width());
    let height = request.height.unwrap_or(photo.height());
    let annotations = diagnosis.annotation_set();
    match &annotations {
        Some(set) if set.rejected() > 0 => {
            log::warn!("{} of {} annotations dropped", set.rejected(), set.len() + set.rejected())
        }
        Some(_) => {}
        None => log::warn!("diagnosis has no annotation list, rendering photo only"),
    }

    let output = if request.overlay_only {
        let (surface, _) = raster::render_overlay(
            annotations.as_ref(),
            Viewport::from_pixels(width, height),
            &theme,
            font,
        )
        .context("overlay surface unavailable")?;
        DynamicImage::ImageRgba8(surface.to_rgba_image()?)
    } else {
        let photo = raster::resize_photo(&photo, width, height);
        raster::flatten(&photo, annotations.as_ref(), &theme, font)?
    };

    raster::save_image(&output, &request.output)?;
    log::info!("wrote {}", request.output.display());
    Ok(())
}
