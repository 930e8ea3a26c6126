//! Font registration for the `ab_glyph` text path.
//!
//! `ab_glyph` does not discover OS fonts, so one TTF/OTF/TTC is registered
//! under `sans-serif` before the first chart is drawn. Candidates, in order:
//! the configured path, `$CASE_TRENDS_FONT`, then well-known system fonts
//! with CJK coverage. Without any of them charts are drawn without text.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment override for the chart font.
pub const FONT_ENV: &str = "CASE_TRENDS_FONT";

const SYSTEM_FONTS: [&str; 9] = [
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/Library/Fonts/Arial Unicode.ttf",
    "C:\\Windows\\Fonts\\msjh.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

static REGISTERED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Register a chart font once per process. Returns whether text can be drawn.
///
/// Only the first call picks the font; later calls report that outcome.
pub fn ensure_fonts_registered(configured: Option<&Path>) -> bool {
    REGISTERED
        .get_or_init(|| {
            let env = std::env::var_os(FONT_ENV).map(PathBuf::from);
            let candidates = configured
                .map(Path::to_path_buf)
                .into_iter()
                .chain(env)
                .chain(SYSTEM_FONTS.iter().map(PathBuf::from));
            for path in candidates {
                if try_register(&path) {
                    log::info!("chart font: {}", path.display());
                    return Some(path);
                }
            }
            log::warn!("no usable chart font found; charts are drawn without text (set {FONT_ENV})");
            None
        })
        .is_some()
}

fn try_register(path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    if ab_glyph::FontRef::try_from_slice(&bytes).is_err() {
        log::debug!("not a usable font: {}", path.display());
        return false;
    }
    // plotters keeps a reference for the lifetime of the process, so only
    // parsed fonts are leaked
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    plotters::style::register_font("sans-serif", plotters::style::FontStyle::Normal, bytes).is_ok()
}
