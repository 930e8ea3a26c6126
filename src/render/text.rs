//! Text measurement and truncation for legend layout.
//!
//! Plotters cannot measure text before a font is loaded, so widths are
//! estimated. Region names are mostly CJK, which renders at roughly the full
//! em width, while Latin text averages a bit over half of it.

/// True for characters typically drawn at full em width.
fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA000..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}

/// Heuristic pixel width of `text` at `font_px`.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    let em: f32 = text
        .chars()
        .map(|ch| if is_wide(ch) { 1.0 } else { 0.60 })
        .sum();
    (em * font_px as f32).ceil() as u32
}

/// Truncate to fit `max_px` and add a single ellipsis if needed.
pub fn truncate_to_width(text: &str, font_px: u32, max_px: u32) -> String {
    if estimate_text_width_px(text, font_px) <= max_px {
        return text.to_string();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let next = format!("{out}{ch}…");
        if estimate_text_width_px(&next, font_px) > max_px {
            break;
        }
        out.push(ch);
    }
    if out.is_empty() {
        return String::new();
    }
    out.push('…');
    out
}
