//! Draw a [`ChartSpec`] with plotters: to an in-memory RGB buffer (GUI
//! textures, PNG export) or to an SVG string.
//!
//! Layout from top to bottom: title, plot with date axis, range slider
//! overview, legend band. All pixel constants scale with
//! [`RenderOptions::scale`] so a 2x export looks like a sharper 1x render.

pub mod fonts;
pub mod legend;
pub mod text;
pub mod util;

use crate::chart::ChartSpec;
use anyhow::{Result, anyhow};
use chrono::NaiveDate;
use num_format::Locale;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::LineSeries;
use plotters::style::FontFamily;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::ops::Range;
use std::path::PathBuf;

use legend::{draw_legend_band, estimate_legend_height_px};
use util::{
    compute_left_label_area_px, date_from_day_number, day_number, format_count, map_locale,
    office_color, parse_hex, y_axis_top,
};

const MARGIN: u32 = 16;
const Y_LABEL_COUNT: usize = 8;

/// Canvas geometry and text settings for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Logical size; the pixel size is `width * scale` by `height * scale`.
    pub width: u32,
    pub height: u32,
    pub scale: u32,
    pub locale: String,
    pub font_path: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 560,
            scale: 1,
            locale: "en".to_string(),
            font_path: None,
        }
    }
}

impl RenderOptions {
    pub fn pixel_size(&self) -> (u32, u32) {
        let s = self.scale.max(1);
        (self.width.max(200) * s, self.height.max(200) * s)
    }
}

/// Where the plot landed on the canvas, so pointer positions can be mapped
/// back to dates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFrame {
    /// Pixel columns of the plotting area.
    pub px: Range<i32>,
    /// Pixel rows of the plotting area.
    pub py: Range<i32>,
    /// X data range in day numbers (see [`util::day_number`]).
    pub x_range: Range<f64>,
}

impl PlotFrame {
    /// Date under pixel column `x`, clamped to the plotted range.
    pub fn date_at(&self, x: f32) -> Option<NaiveDate> {
        let span_px = (self.px.end - self.px.start).max(1) as f64;
        let t = ((x as f64 - self.px.start as f64) / span_px).clamp(0.0, 1.0);
        let span = self.x_range.end - self.x_range.start;
        date_from_day_number(self.x_range.start + t * span)
    }
}

/// Rendered RGB pixels (row-major, 3 bytes per pixel).
#[derive(Debug, Clone)]
pub struct RgbFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub frame: PlotFrame,
}

/// Render to an RGB buffer.
pub fn render_rgb(spec: &ChartSpec, opts: &RenderOptions) -> Result<RgbFrame> {
    let (width, height) = opts.pixel_size();
    let mut pixels = vec![255u8; (width as usize) * (height as usize) * 3];
    let frame = {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        let frame = draw_chart(&root, spec, opts)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
        frame
    };
    Ok(RgbFrame {
        width,
        height,
        pixels,
        frame,
    })
}

/// Render to an SVG document.
pub fn render_svg(spec: &ChartSpec, opts: &RenderOptions) -> Result<String> {
    let (width, height) = opts.pixel_size();
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, (width, height)).into_drawing_area();
        draw_chart(&root, spec, opts)?;
        root.present().map_err(|e| anyhow!("{:?}", e))?;
    }
    Ok(out)
}

/// Draw `spec` onto `root`.
pub fn draw_chart<DB>(
    root: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    opts: &RenderOptions,
) -> Result<PlotFrame>
where
    DB: DrawingBackend,
{
    let with_text = fonts::ensure_fonts_registered(opts.font_path.as_deref());
    let s = opts.scale.max(1);
    let locale: &Locale = map_locale(&opts.locale);

    root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;

    // ----------------------------
    // 1) Data ranges
    // ----------------------------
    let window = spec
        .layout
        .xaxis
        .window()
        .ok_or_else(|| anyhow!("inverted x range in chart spec"))?;
    let (mut x_min, mut x_max) = (day_number(window.start), day_number(window.end));
    if x_max - x_min < 1.0 {
        x_min -= 0.5;
        x_max += 0.5;
    }
    let y_top = y_axis_top(spec.y_max());

    let series: Vec<(String, RGBAColor, Vec<(f64, f64)>)> = spec
        .data
        .iter()
        .enumerate()
        .map(|(idx, t)| {
            let color = parse_hex(&t.line.color).unwrap_or_else(|| office_color(idx));
            let pts = t
                .x
                .iter()
                .zip(t.y.iter())
                .map(|(d, v)| (day_number(*d), *v as f64))
                .collect();
            (t.name.clone(), color, pts)
        })
        .collect();

    // ----------------------------
    // 2) Split areas: plot | slider | legend
    // ----------------------------
    let font_px = spec.layout.font.size.max(8) * s;
    let tick_px = (font_px * 6 / 7).max(8);
    let left_label_px = if with_text {
        compute_left_label_area_px(y_top, Y_LABEL_COUNT, tick_px, locale)
    } else {
        12 * s
    };
    let axis_x_start = (MARGIN * s + left_label_px) as i32;

    let (root_w, root_h) = root.dim_in_pixel();
    let legend_h = if with_text {
        let labels: Vec<String> = series.iter().map(|(n, _, _)| n.clone()).collect();
        estimate_legend_height_px(
            &labels,
            &spec.layout.legend.title,
            axis_x_start,
            root_w as i32,
            font_px,
        )
    } else {
        0
    };
    let slider_h = if spec.layout.xaxis.rangeslider.visible {
        (root_h as i32 / 9).max(24 * s as i32)
    } else {
        0
    };
    let plot_h = (root_h as i32 - legend_h - slider_h).max(80);
    let (plot_area, rest) = root.split_vertically(plot_h);
    let (slider_area, legend_area) = rest.split_vertically(slider_h);

    // ----------------------------
    // 3) Main chart
    // ----------------------------
    let x_label_fmt = |x: &f64| {
        date_from_day_number(*x)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    let y_label_fmt = |v: &f64| format_count(*v, locale);
    let x_label_count = (window.days() as usize).clamp(2, 8);

    let mut builder = ChartBuilder::on(&plot_area);
    builder.margin(MARGIN * s);
    if with_text {
        builder
            .caption(spec.layout.title.as_str(), (FontFamily::SansSerif, 22 * s))
            .set_label_area_size(LabelAreaPosition::Left, left_label_px)
            .set_label_area_size(LabelAreaPosition::Bottom, font_px * 3);
    } else {
        builder
            .set_label_area_size(LabelAreaPosition::Left, left_label_px)
            .set_label_area_size(LabelAreaPosition::Bottom, 12 * s);
    }
    let mut chart = builder
        .build_cartesian_2d(x_min..x_max, 0f64..y_top)
        .map_err(|e| anyhow!("{:?}", e))?;

    {
        let mut mesh = chart.configure_mesh();
        if with_text {
            mesh.x_desc(spec.layout.xaxis.title.as_str())
                .y_desc(spec.layout.yaxis.title.as_str())
                .x_labels(x_label_count)
                .y_labels(Y_LABEL_COUNT)
                .x_label_formatter(&x_label_fmt)
                .y_label_formatter(&y_label_fmt)
                .label_style((FontFamily::SansSerif, tick_px))
                .axis_desc_style((FontFamily::SansSerif, font_px));
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw().map_err(|e| anyhow!("{:?}", e))?;
    }

    let stroke = 2 * s;
    for (_, color, pts) in &series {
        let style = ShapeStyle {
            color: *color,
            filled: false,
            stroke_width: stroke,
        };
        chart
            .draw_series(LineSeries::new(pts.clone(), style))
            .map_err(|e| anyhow!("{:?}", e))?;
        // a lone day would otherwise be invisible
        if pts.len() == 1 {
            chart
                .draw_series(
                    pts.iter()
                        .map(|(x, y)| Circle::new((*x, *y), (3 * s) as i32, color.filled())),
                )
                .map_err(|e| anyhow!("{:?}", e))?;
        }
    }

    let (px, py) = chart.plotting_area().get_pixel_range();
    let frame = PlotFrame {
        px,
        py,
        x_range: x_min..x_max,
    };

    // ----------------------------
    // 4) Range slider overview
    // ----------------------------
    if slider_h > 0 {
        let mut slider = ChartBuilder::on(&slider_area)
            .margin_left(MARGIN * s)
            .margin_right(MARGIN * s)
            .margin_top(2 * s)
            .margin_bottom(4 * s)
            .set_label_area_size(LabelAreaPosition::Left, left_label_px)
            .build_cartesian_2d(x_min..x_max, 0f64..y_top)
            .map_err(|e| anyhow!("{:?}", e))?;
        slider
            .plotting_area()
            .fill(&RGBColor(246, 246, 246))
            .map_err(|e| anyhow!("{:?}", e))?;
        for (_, color, pts) in &series {
            slider
                .draw_series(LineSeries::new(pts.clone(), color.stroke_width(s)))
                .map_err(|e| anyhow!("{:?}", e))?;
        }
        slider
            .draw_series(std::iter::once(Rectangle::new(
                [(x_min, 0.0), (x_max, y_top)],
                RGBColor(170, 170, 170).stroke_width(s),
            )))
            .map_err(|e| anyhow!("{:?}", e))?;
    }

    // ----------------------------
    // 5) Legend
    // ----------------------------
    if legend_h > 0 {
        let items: Vec<(String, RGBAColor)> =
            series.iter().map(|(n, c, _)| (n.clone(), *c)).collect();
        draw_legend_band(
            &legend_area,
            &items,
            &spec.layout.legend.title,
            axis_x_start,
            font_px,
        )?;
    }

    Ok(frame)
}
