//! Chart specifications: traces plus layout, in the JSON shape browser
//! plotting layers understand (`{"data": [...], "layout": {...}}`).
//!
//! A [`ChartSpec`] is the portable form. The display layer wraps it into a
//! *figure* ([`ChartSpec::to_figure`]) that carries extra back-reference
//! fields on the x axis; those have to be stripped again before export (see
//! [`crate::export::sanitize_figure`]). Axis structs reject unknown fields so a
//! figure that still carries them does not decode.

use crate::config::ChartTexts;
use crate::models::{ChartKind, DateWindow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// One line per displayed region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub mode: String,
    pub x: Vec<NaiveDate>,
    pub y: Vec<u64>,
    pub line: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    /// `#RRGGBB`
    pub color: String,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: String,
    pub font: FontSpec,
    pub xaxis: XAxis,
    pub yaxis: YAxis,
    pub legend: LegendSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendSpec {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XAxis {
    pub title: String,
    #[serde(rename = "type")]
    pub axis_type: String,
    /// Inclusive visible range, equal to the active window.
    pub range: [NaiveDate; 2],
    pub rangeslider: RangeSlider,
    pub rangeselector: RangeSelector,
}

impl XAxis {
    pub fn window(&self) -> Option<DateWindow> {
        DateWindow::new(self.range[0], self.range[1])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSelector {
    pub buttons: Vec<RangeButton>,
}

/// Quick-range button: `count` `step`s back from the end of the data, or the
/// whole extent for `step = "all"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeButton {
    pub label: String,
    pub step: RangeStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeStep {
    Day,
    Month,
    All,
}

impl RangeButton {
    /// Window this button selects, counting back from `extent.end`.
    pub fn window(&self, extent: DateWindow) -> DateWindow {
        let count = self.count.unwrap_or(1);
        let start = match self.step {
            RangeStep::All => extent.start,
            RangeStep::Day => extent.end - chrono::Duration::days(i64::from(count)),
            RangeStep::Month => extent
                .end
                .checked_sub_months(chrono::Months::new(count))
                .unwrap_or(extent.start),
        };
        DateWindow {
            start: start.max(extent.start),
            end: extent.end,
        }
    }
}

impl RangeSelector {
    /// Last 7 days, last month and everything, labelled from `texts`.
    pub fn from_texts(texts: &ChartTexts) -> Self {
        Self {
            buttons: vec![
                RangeButton {
                    label: texts.week_button.clone(),
                    step: RangeStep::Day,
                    count: Some(7),
                },
                RangeButton {
                    label: texts.month_button.clone(),
                    step: RangeStep::Month,
                    count: Some(1),
                },
                RangeButton {
                    label: texts.all_button.clone(),
                    step: RangeStep::All,
                    count: None,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct YAxis {
    pub title: String,
    /// Always anchored at zero for counts.
    pub rangemode: String,
}

impl ChartSpec {
    pub fn trace_count(&self) -> usize {
        self.data.len()
    }

    /// Largest y value over all traces (0 for an empty chart).
    pub fn y_max(&self) -> u64 {
        self.data
            .iter()
            .flat_map(|t| t.y.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Display form held by the UI.
    ///
    /// Adds the theme back-reference (`xaxis._template`) and the range slider's
    /// own y axis (`xaxis.rangeslider.yaxis`), the way a browser plotting layer
    /// annotates a figure after drawing it.
    pub fn to_figure(&self) -> Value {
        let mut fig = match serde_json::to_value(self) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("chart spec not serializable: {e}");
                return Value::Null;
            }
        };
        if let Some(xaxis) = fig.pointer_mut("/layout/xaxis").and_then(Value::as_object_mut) {
            xaxis.insert(
                "_template".to_string(),
                json!({ "layout": { "xaxis": { "gridcolor": "white", "linecolor": "white" } } }),
            );
            if let Some(slider) = xaxis.get_mut("rangeslider").and_then(Value::as_object_mut) {
                slider.insert("yaxis".to_string(), json!({ "rangemode": "match" }));
            }
        }
        fig
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn extent() -> DateWindow {
        DateWindow::new(d("2021-01-01"), d("2021-06-30")).unwrap()
    }

    #[test]
    fn preset_buttons_count_back_from_the_end() {
        let sel = RangeSelector::from_texts(&ChartTexts::default());
        let w: Vec<DateWindow> = sel.buttons.iter().map(|b| b.window(extent())).collect();
        assert_eq!(w[0].start, d("2021-06-23"));
        assert_eq!(w[1].start, d("2021-05-30"));
        assert_eq!(w[2], extent());
        assert!(w.iter().all(|w| w.end == d("2021-06-30")));
    }

    #[test]
    fn button_labels_come_from_the_texts() {
        let texts = ChartTexts {
            week_button: "7d".into(),
            month_button: "30d".into(),
            all_button: "All".into(),
            ..ChartTexts::default()
        };
        let labels: Vec<String> = RangeSelector::from_texts(&texts)
            .buttons
            .into_iter()
            .map(|b| b.label)
            .collect();
        assert_eq!(labels, vec!["7d", "30d", "All"]);
    }

    #[test]
    fn preset_never_starts_before_the_data() {
        let short = DateWindow::new(d("2021-06-28"), d("2021-06-30")).unwrap();
        let b = RangeButton {
            label: "1月".into(),
            step: RangeStep::Month,
            count: Some(1),
        };
        assert_eq!(b.window(short), short);
    }

    #[test]
    fn button_json_omits_missing_count() {
        let v = serde_json::to_value(RangeSelector::from_texts(&ChartTexts::default())).unwrap();
        assert_eq!(v["buttons"][0]["label"], "1週");
        assert_eq!(v["buttons"][0]["count"], 7);
        assert_eq!(v["buttons"][0]["step"], "day");
        assert!(v["buttons"][2].get("count").is_none());
    }
}
