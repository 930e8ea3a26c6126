//! Turn a displayed chart figure into image bytes.
//!
//! The figure the UI holds still carries display-only fields on its x axis.
//! Export clones it, strips those fields, decodes the result strictly back into
//! a [`ChartSpec`] and renders that. The on-screen figure is never touched.

use crate::chart::ChartSpec;
use crate::config::DashboardConfig;
use crate::models::ChartKind;
use crate::render::{RenderOptions, RgbFrame, render_rgb, render_svg};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// JSON pointers of the fields a display layer adds to a figure.
pub const DISPLAY_ONLY_FIELDS: [(&str, &str); 2] = [
    ("/layout/xaxis", "_template"),
    ("/layout/xaxis/rangeslider", "yaxis"),
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("figure is not a chart: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
    #[error("writing {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Encoded image ready to be offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub kind: ChartKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportedImage {
    /// Write into `dir` under [`ExportedImage::file_name`].
    pub fn write_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf, ExportError> {
        let path = dir.as_ref().join(&self.file_name);
        self.write_to(&path)?;
        Ok(path)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, &self.bytes).map_err(|source| ExportError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Render options for exports taken from the dashboard configuration.
pub fn export_options(config: &DashboardConfig) -> RenderOptions {
    RenderOptions {
        width: config.export.width.clamp(200, 3000),
        height: config.export.height.clamp(200, 3000),
        scale: config.export.scale.clamp(1, 4),
        locale: config.locale.clone(),
        font_path: config.font_path.clone(),
    }
}

/// On-screen geometry: the export size at scale 1.
pub fn screen_options(config: &DashboardConfig) -> RenderOptions {
    RenderOptions {
        scale: 1,
        ..export_options(config)
    }
}

/// Copy of `figure` without the display-only fields. Everything else,
/// including unknown fields elsewhere, is kept as is.
pub fn sanitize_figure(figure: &Value) -> Value {
    let mut out = figure.clone();
    for (parent, key) in DISPLAY_ONLY_FIELDS {
        if let Some(obj) = out.pointer_mut(parent).and_then(Value::as_object_mut) {
            obj.remove(key);
        }
    }
    out
}

/// Strict decode of a sanitized figure.
pub fn decode_figure(figure: &Value) -> Result<ChartSpec, ExportError> {
    Ok(serde_json::from_value(figure.clone())?)
}

/// Encode an RGB frame as PNG.
pub fn encode_png(frame: &RgbFrame) -> Result<Vec<u8>, ExportError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, frame.width, frame.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&frame.pixels)?;
        writer.finish()?;
    }
    Ok(out)
}

pub fn chart_png(spec: &ChartSpec, opts: &RenderOptions) -> Result<Vec<u8>, ExportError> {
    let frame = render_rgb(spec, opts).map_err(|e| ExportError::Draw(format!("{e:#}")))?;
    encode_png(&frame)
}

pub fn chart_svg(spec: &ChartSpec, opts: &RenderOptions) -> Result<String, ExportError> {
    render_svg(spec, opts).map_err(|e| ExportError::Draw(format!("{e:#}")))
}

/// Export the figure currently on display.
///
/// `None` (nothing rendered yet) is a no-op and yields `Ok(None)`.
pub fn export_png(
    figure: Option<&Value>,
    opts: &RenderOptions,
) -> Result<Option<ExportedImage>, ExportError> {
    let Some(figure) = figure else {
        log::debug!("export requested before any chart was rendered");
        return Ok(None);
    };
    let spec = decode_figure(&sanitize_figure(figure))?;
    let bytes = chart_png(&spec, opts)?;
    log::info!(
        "exported {} ({} traces, {} bytes)",
        spec.kind.export_file_name(),
        spec.trace_count(),
        bytes.len()
    );
    Ok(Some(ExportedImage {
        kind: spec.kind,
        file_name: spec.kind.export_file_name().to_string(),
        bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartTexts;
    use crate::models::RegionSelection;
    use crate::series::DailySeries;
    use crate::view::build_view;
    use chrono::NaiveDate;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn spec() -> ChartSpec {
        let s = DailySeries::from_rows([
            (d("2021-05-01"), "A", 3),
            (d("2021-05-02"), "A", 5),
            (d("2021-05-03"), "A", 1),
        ])
        .unwrap();
        build_view(
            &s,
            &RegionSelection::from_labels(["A"]),
            s.extent(),
            &ChartTexts::default(),
        )
        .daily
    }

    fn small() -> RenderOptions {
        RenderOptions {
            width: 320,
            height: 240,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn sanitize_removes_exactly_the_display_fields() {
        let spec = spec();
        let figure = spec.to_figure();
        let before = figure.clone();
        let clean = sanitize_figure(&figure);
        assert_eq!(figure, before);
        assert_eq!(clean, serde_json::to_value(&spec).unwrap());
        assert!(figure["layout"]["xaxis"].get("_template").is_some());
    }

    #[test]
    fn unsanitized_figure_does_not_decode() {
        let figure = spec().to_figure();
        assert!(matches!(decode_figure(&figure), Err(ExportError::Decode(_))));
        assert_eq!(decode_figure(&sanitize_figure(&figure)).unwrap(), spec());
    }

    #[test]
    fn no_figure_is_a_no_op() {
        assert!(export_png(None, &small()).unwrap().is_none());
    }

    #[test]
    fn export_yields_png_bytes() {
        let figure = spec().to_figure();
        let img = export_png(Some(&figure), &small()).unwrap().unwrap();
        assert_eq!(img.kind, ChartKind::Daily);
        assert_eq!(img.file_name, "daily_confirmed.png");
        assert_eq!(&img.bytes[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn options_clamp_the_configured_geometry() {
        let mut cfg = DashboardConfig::default();
        cfg.export.width = 10;
        cfg.export.scale = 9;
        let o = export_options(&cfg);
        assert_eq!((o.width, o.height, o.scale), (200, 560, 4));
    }

    #[test]
    fn screen_options_are_clamped_at_scale_one() {
        let mut cfg = DashboardConfig::default();
        cfg.export.width = 100_000;
        cfg.export.height = 50;
        cfg.export.scale = 3;
        let o = screen_options(&cfg);
        assert_eq!((o.width, o.height, o.scale), (3000, 200, 1));
        assert_eq!(o.pixel_size(), (3000, 200));
    }
}
