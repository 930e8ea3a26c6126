//! Legend band below the chart: an optional title followed by one
//! marker + label block per trace, flowing into as many rows as needed.

use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::text::{estimate_text_width_px, truncate_to_width};

/// Layout constants shared by the estimator and the painter, in unscaled px.
#[derive(Debug, Clone, Copy)]
struct Metrics {
    font_px: u32,
    line_h: i32,
    row_gap: i32,
    pad_band: i32,
    marker_radius: i32,
    marker_to_text_gap: i32,
    trailing_gap: i32,
}

impl Metrics {
    fn new(font_px: u32) -> Self {
        let unit = (font_px as i32 / 14).max(1);
        Self {
            font_px,
            line_h: font_px as i32 + 4 * unit,
            row_gap: 4 * unit,
            pad_band: 8 * unit,
            marker_radius: 4 * unit,
            marker_to_text_gap: 12 * unit,
            trailing_gap: 14 * unit,
        }
    }

    fn block_width(&self, text: &str) -> i32 {
        self.marker_to_text_gap
            + self.marker_radius
            + estimate_text_width_px(text, self.font_px) as i32
            + self.trailing_gap
    }
}

/// Place title and items into rows. Returns `(rows, title_width)` where each
/// row holds `(x, display_text, item_index)`.
fn flow(
    labels: &[String],
    title: &str,
    start_x: i32,
    total_w: i32,
    m: &Metrics,
) -> (Vec<Vec<(i32, String, usize)>>, i32) {
    let usable_w = (total_w - m.pad_band).max(start_x + 80);
    let per_item_cap = (((usable_w - start_x) as f32) * 0.35).max(120.0) as u32;
    let title_w = if title.trim().is_empty() {
        0
    } else {
        estimate_text_width_px(title, m.font_px) as i32 + m.trailing_gap
    };

    let mut rows: Vec<Vec<(i32, String, usize)>> = Vec::new();
    let mut cur: Vec<(i32, String, usize)> = Vec::new();
    let mut x = start_x + title_w;
    for (idx, label) in labels.iter().enumerate() {
        let text = truncate_to_width(label, m.font_px, per_item_cap);
        let block_w = m.block_width(&text);
        if x + block_w > usable_w && !cur.is_empty() {
            rows.push(std::mem::take(&mut cur));
            x = start_x + title_w;
        }
        cur.push((x + m.marker_to_text_gap + m.marker_radius, text, idx));
        x += block_w;
    }
    if !cur.is_empty() {
        rows.push(cur);
    }
    (rows, title_w)
}

/// Height the band needs for `labels`, mirroring [`draw_legend_band`].
pub fn estimate_legend_height_px(
    labels: &[String],
    title: &str,
    start_x: i32,
    total_w: i32,
    font_px: u32,
) -> i32 {
    if labels.is_empty() {
        return 0;
    }
    let m = Metrics::new(font_px);
    let (rows, _) = flow(labels, title, start_x, total_w, &m);
    let n = rows.len().max(1) as i32;
    m.pad_band * 2 + n * m.line_h + (n - 1) * m.row_gap
}

/// Draw the legend band. `start_x` aligns the first block with the plot's
/// x-axis start.
pub fn draw_legend_band<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    items: &[(String, RGBAColor)],
    title: &str,
    start_x: i32,
    font_px: u32,
) -> Result<()> {
    area.fill(&WHITE).map_err(|e| anyhow::anyhow!("{:?}", e))?;
    if items.is_empty() {
        return Ok(());
    }
    let (w, _) = area.dim_in_pixel();
    let m = Metrics::new(font_px);
    let labels: Vec<String> = items.iter().map(|(l, _)| l.clone()).collect();
    let (rows, title_w) = flow(&labels, title, start_x, w as i32, &m);

    let style: TextStyle =
        TextStyle::from((FontFamily::SansSerif, m.font_px)).pos(Pos::new(HPos::Left, VPos::Center));

    let mut y_center = m.pad_band + m.line_h / 2;
    for (ri, row) in rows.iter().enumerate() {
        if ri == 0 && title_w > 0 {
            area.draw(&Text::new(title, (start_x, y_center), style.clone()))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        for (text_x, text, idx) in row {
            let color = items[*idx].1;
            let dot_x = (text_x - m.marker_to_text_gap).max(0);
            area.draw(&Circle::new((dot_x, y_center), m.marker_radius, color.filled()))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            area.draw(&Text::new(text.as_str(), (*text_x, y_center), style.clone()))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        y_center += m.line_h + m.row_gap;
    }
    Ok(())
}
