//! Colors, number formatting and axis helpers shared by the renderer and the
//! view builder.

use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};
use plotters::prelude::*;

use super::text::estimate_text_width_px;

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green, Dark Blue, Dark Orange, Dark Gray, Brownish Gold.
const OFFICE10: [(u8, u8, u8); 10] = [
    (68, 114, 196),  // blue      (#4472C4)
    (237, 125, 49),  // orange    (#ED7D31)
    (165, 165, 165), // gray      (#A5A5A5)
    (255, 192, 0),   // gold      (#FFC000)
    (91, 155, 213),  // light blue(#5B9BD5)
    (112, 173, 71),  // green     (#70AD47)
    (38, 68, 120),   // dark blue (#264478)
    (158, 72, 14),   // dark org. (#9E480E)
    (99, 99, 99),    // dark gray (#636363)
    (153, 115, 0),   // brownish  (#997300)
];

/// Get a color from the Office palette.
#[inline]
pub fn office_color(idx: usize) -> RGBAColor {
    let (r, g, b) = OFFICE10[idx % OFFICE10.len()];
    RGBColor(r, g, b).to_rgba()
}

/// Office palette entry as `#RRGGBB`, the form stored in chart specs.
pub fn office_hex(idx: usize) -> String {
    let (r, g, b) = OFFICE10[idx % OFFICE10.len()];
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Parse `#RRGGBB` (case-insensitive).
pub fn parse_hex(s: &str) -> Option<RGBAColor> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?).to_rgba())
}

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `de`, `fr`, `es`, `it`, `pt`,
/// `nl`, `zh`. Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        "zh" | "zh_tw" | "zh_hant" => &Locale::zh,
        _ => &Locale::en,
    }
}

/// Whole-number tick label with thousands separators.
pub fn format_count(v: f64, locale: &Locale) -> String {
    if v < 0.0 {
        return String::new();
    }
    (v.round() as u64).to_formatted_string(locale)
}

/// X coordinate of a date (days since 0001-01-01).
#[inline]
pub fn day_number(d: NaiveDate) -> f64 {
    f64::from(d.num_days_from_ce())
}

/// Inverse of [`day_number`], rounding to the nearest day.
pub fn date_from_day_number(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Upper end of the value axis: a little headroom above the largest value.
pub fn y_axis_top(max: u64) -> f64 {
    if max == 0 { 1.0 } else { max as f64 * 1.05 }
}

/// Left label area width for the value axis, based on the widest formatted
/// tick label between 0 and `y_top`.
pub fn compute_left_label_area_px(y_top: f64, ticks: usize, font_px: u32, locale: &Locale) -> u32 {
    let mut max_px = 0u32;
    for i in 0..=ticks {
        let t = if ticks == 0 { 0.0 } else { i as f64 / ticks as f64 };
        let s = format_count(y_top * t, locale);
        max_px = max_px.max(estimate_text_width_px(&s, font_px));
    }
    // tick marks, the rotated axis title and some breathing room
    let with_padding = max_px.saturating_add(font_px * 2 + 12);
    with_padding.clamp(48, 220)
}
