use std::path::{Path, PathBuf};

use ab_glyph::FontArc;
use anyhow::{Context, Result};

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Helvetica.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn load_font_file(path: &Path) -> Result<FontArc> {
    let bytes =
        std::fs::read(path).with_context(|| format!("cannot read font {}", path.display()))?;
    FontArc::try_from_vec(bytes).with_context(|| format!("{} is not a usable font", path.display()))
}

/// Picks the label font: `preferred` first, then well-known system fonts.
/// Returns `None` when nothing loads; labels then render as bare plates.
pub fn load_label_font(preferred: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = preferred {
        match load_font_file(path) {
            Ok(font) => return Some(font),
            Err(err) => log::warn!("{err:#}, falling back to system fonts"),
        }
    }

    let found = SYSTEM_FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .filter(|path| path.is_file())
        .find_map(|path| load_font_file(&path).ok());

    if found.is_none() {
        log::warn!("no label font found, labels will render without text");
    }
    found
}
