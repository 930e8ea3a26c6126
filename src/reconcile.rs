//! Decide the active date window from competing inputs.
//!
//! Three sources compete for the window of a render: the two manual text
//! fields, a zoom/pan on the daily chart and a zoom/pan on the cumulative
//! chart. The manual fields win unless the interaction that caused this
//! render was a zoom on one specific chart whose payload carries an x-axis
//! range. Every path ends in a valid window; the full data extent is the
//! fallback.

use crate::models::{ChartKind, DateWindow, format_date, parse_date};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload key of the lower bound in the two-key shape.
pub const RANGE_START_KEY: &str = "xaxis.range[0]";
/// Payload key of the upper bound in the two-key shape.
pub const RANGE_END_KEY: &str = "xaxis.range[1]";
/// Payload key of the list shape.
pub const RANGE_KEY: &str = "xaxis.range";
/// Payload key a chart emits when the user resets its axes.
pub const AUTORANGE_KEY: &str = "xaxis.autorange";

/// The interaction that caused the current render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Trigger {
    /// First render after startup.
    Initial,
    UpdateButton,
    /// Zoom, pan, range slider or preset on one chart.
    Chart(ChartKind),
    /// Region dropdown `0..4` changed.
    RegionSelector(usize),
}

/// Relayout payload emitted by a chart after zoom/pan: a flat JSON object such
/// as `{"xaxis.range[0]": "2021-06-01", "xaxis.range[1]": "2021-06-10"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayoutEvent(pub Map<String, Value>);

impl RelayoutEvent {
    /// Two separately keyed bounds.
    pub fn with_bounds(start: &str, end: &str) -> Self {
        let mut map = Map::new();
        map.insert(RANGE_START_KEY.to_string(), Value::from(start));
        map.insert(RANGE_END_KEY.to_string(), Value::from(end));
        Self(map)
    }

    /// One two-element list.
    pub fn with_range_list(start: &str, end: &str) -> Self {
        let mut map = Map::new();
        map.insert(
            RANGE_KEY.to_string(),
            Value::Array(vec![Value::from(start), Value::from(end)]),
        );
        Self(map)
    }

    /// Axis reset (double click). Carries no range.
    pub fn autorange() -> Self {
        let mut map = Map::new();
        map.insert(AUTORANGE_KEY.to_string(), Value::Bool(true));
        Self(map)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw bound values, if the payload has one of the accepted shapes.
    ///
    /// Both shapes are equally valid; the two-key shape is looked at first.
    fn range_values(&self) -> Option<(&Value, &Value)> {
        if let (Some(a), Some(b)) = (self.0.get(RANGE_START_KEY), self.0.get(RANGE_END_KEY)) {
            return Some((a, b));
        }
        match self.0.get(RANGE_KEY) {
            Some(Value::Array(items)) if items.len() >= 2 => Some((&items[0], &items[1])),
            _ => None,
        }
    }

    /// Parsed x-axis range, `None` if absent or any bound is unparsable.
    pub fn x_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let (a, b) = self.range_values()?;
        Some((bound_date(a)?, bound_date(b)?))
    }
}

/// A bound is a date string or a number of epoch milliseconds.
fn bound_date(v: &Value) -> Option<NaiveDate> {
    match v {
        Value::String(s) => parse_date(s),
        Value::Number(n) => {
            let ms = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

/// Everything the reconciler looks at, passed explicitly.
#[derive(Debug, Clone, Copy)]
pub struct RangeInputs<'a> {
    pub trigger: Trigger,
    pub daily_event: Option<&'a RelayoutEvent>,
    pub cumulative_event: Option<&'a RelayoutEvent>,
    pub start_text: &'a str,
    pub end_text: &'a str,
    /// Full data range, the fallback of every invalid path.
    pub extent: DateWindow,
}

/// Which input determined the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeSource {
    Manual,
    Zoom(ChartKind),
    Fallback,
}

/// Validated window plus the text to write back into the manual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciled {
    pub window: DateWindow,
    pub start_text: String,
    pub end_text: String,
    pub source: RangeSource,
}

/// Resolve the active window.
///
/// 1. Both manual fields parse → working bounds, else the extent.
/// 2. If a chart triggered and its own payload has an x range in one of the
///    accepted shapes, that range replaces the working bounds. A payload that
///    does not parse leaves them untouched.
/// 3. Missing or inverted bounds reset to the extent.
pub fn reconcile(inputs: &RangeInputs<'_>) -> Reconciled {
    let manual = match (parse_date(inputs.start_text), parse_date(inputs.end_text)) {
        (Some(s), Some(e)) => Some((s, e)),
        _ => None,
    };
    let (mut working, mut source) = match manual {
        Some(bounds) => (Some(bounds), RangeSource::Manual),
        None => (
            Some((inputs.extent.start, inputs.extent.end)),
            RangeSource::Fallback,
        ),
    };

    if let Trigger::Chart(kind) = inputs.trigger {
        let event = match kind {
            ChartKind::Daily => inputs.daily_event,
            ChartKind::Cumulative => inputs.cumulative_event,
        };
        if let Some(range) = event.and_then(RelayoutEvent::x_range) {
            working = Some(range);
            source = RangeSource::Zoom(kind);
        }
    }

    let window = match working.and_then(|(s, e)| DateWindow::new(s, e)) {
        Some(w) => w,
        None => {
            source = RangeSource::Fallback;
            inputs.extent
        }
    };

    log::debug!(
        "reconciled {:?} -> {} via {:?}",
        inputs.trigger,
        window,
        source
    );

    Reconciled {
        window,
        start_text: format_date(window.start),
        end_text: format_date(window.end),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn extent() -> DateWindow {
        DateWindow::new(d("2021-01-01"), d("2021-12-31")).unwrap()
    }

    fn inputs<'a>(
        trigger: Trigger,
        daily: Option<&'a RelayoutEvent>,
        cum: Option<&'a RelayoutEvent>,
        start: &'a str,
        end: &'a str,
    ) -> RangeInputs<'a> {
        RangeInputs {
            trigger,
            daily_event: daily,
            cumulative_event: cum,
            start_text: start,
            end_text: end,
            extent: extent(),
        }
    }

    #[test]
    fn valid_manual_bounds_pass_through() {
        let r = reconcile(&inputs(Trigger::UpdateButton, None, None, "2021-03-01", "2021-03-31"));
        assert_eq!(r.window, DateWindow::new(d("2021-03-01"), d("2021-03-31")).unwrap());
        assert_eq!(r.source, RangeSource::Manual);
        assert_eq!(r.start_text, "2021-03-01");
        assert_eq!(r.end_text, "2021-03-31");
    }

    #[test]
    fn single_day_window_is_valid() {
        let r = reconcile(&inputs(Trigger::Initial, None, None, "2021-03-01", "2021-03-01"));
        assert_eq!(r.window.days(), 1);
        assert_eq!(r.source, RangeSource::Manual);
    }

    #[test]
    fn inverted_manual_bounds_reset_to_extent() {
        let r = reconcile(&inputs(Trigger::UpdateButton, None, None, "2021-07-01", "2021-06-01"));
        assert_eq!(r.window, extent());
        assert_eq!(r.source, RangeSource::Fallback);
        assert_eq!(r.start_text, "2021-01-01");
        assert_eq!(r.end_text, "2021-12-31");
    }

    #[test]
    fn one_unparsable_field_resets_both() {
        let r = reconcile(&inputs(Trigger::UpdateButton, None, None, "2021-03-01", "soon"));
        assert_eq!(r.window, extent());
        let r = reconcile(&inputs(Trigger::UpdateButton, None, None, "", "2021-03-01"));
        assert_eq!(r.window, extent());
    }

    #[test]
    fn daily_zoom_with_two_keys_overrides_manual_fields() {
        let ev = RelayoutEvent::with_bounds("2021-06-01", "2021-06-10");
        let r = reconcile(&inputs(
            Trigger::Chart(ChartKind::Daily),
            Some(&ev),
            None,
            "2021-02-01",
            "2021-02-28",
        ));
        assert_eq!(r.window, DateWindow::new(d("2021-06-01"), d("2021-06-10")).unwrap());
        assert_eq!(r.source, RangeSource::Zoom(ChartKind::Daily));
        assert_eq!(r.start_text, "2021-06-01");
        assert_eq!(r.end_text, "2021-06-10");
    }

    #[test]
    fn cumulative_zoom_with_list_shape_is_accepted() {
        let ev: RelayoutEvent = serde_json::from_value(json!({
            "xaxis.range": ["2021-04-02 06:00:00.5", "2021-04-20 18:30"]
        }))
        .unwrap();
        let r = reconcile(&inputs(
            Trigger::Chart(ChartKind::Cumulative),
            None,
            Some(&ev),
            "2021-02-01",
            "2021-02-28",
        ));
        assert_eq!(r.window, DateWindow::new(d("2021-04-02"), d("2021-04-20")).unwrap());
        assert_eq!(r.source, RangeSource::Zoom(ChartKind::Cumulative));
    }

    #[test]
    fn payload_of_the_other_chart_is_ignored() {
        let ev = RelayoutEvent::with_bounds("2021-06-01", "2021-06-10");
        let r = reconcile(&inputs(
            Trigger::Chart(ChartKind::Cumulative),
            Some(&ev),
            None,
            "2021-02-01",
            "2021-02-28",
        ));
        assert_eq!(r.window, DateWindow::new(d("2021-02-01"), d("2021-02-28")).unwrap());
        assert_eq!(r.source, RangeSource::Manual);
    }

    #[test]
    fn zoom_payload_without_trigger_is_ignored() {
        let ev = RelayoutEvent::with_bounds("2021-06-01", "2021-06-10");
        let r = reconcile(&inputs(
            Trigger::RegionSelector(2),
            Some(&ev),
            Some(&ev),
            "2021-02-01",
            "2021-02-28",
        ));
        assert_eq!(r.source, RangeSource::Manual);
    }

    #[test]
    fn unparsable_zoom_keeps_working_values() {
        let ev: RelayoutEvent = serde_json::from_value(json!({
            "xaxis.range[0]": "2021-06-01",
            "xaxis.range[1]": "garbage"
        }))
        .unwrap();
        let r = reconcile(&inputs(
            Trigger::Chart(ChartKind::Daily),
            Some(&ev),
            None,
            "2021-02-01",
            "2021-02-28",
        ));
        assert_eq!(r.window, DateWindow::new(d("2021-02-01"), d("2021-02-28")).unwrap());
        assert_eq!(r.source, RangeSource::Manual);
    }

    #[test]
    fn autorange_and_short_lists_carry_no_range() {
        assert_eq!(RelayoutEvent::autorange().x_range(), None);
        let short: RelayoutEvent =
            serde_json::from_value(json!({"xaxis.range": ["2021-06-01"]})).unwrap();
        assert_eq!(short.x_range(), None);
        let not_list: RelayoutEvent =
            serde_json::from_value(json!({"xaxis.range": "2021-06-01"})).unwrap();
        assert_eq!(not_list.x_range(), None);
    }

    #[test]
    fn inverted_zoom_falls_back_to_extent() {
        let ev = RelayoutEvent::with_range_list("2021-06-10", "2021-06-01");
        let r = reconcile(&inputs(
            Trigger::Chart(ChartKind::Daily),
            Some(&ev),
            None,
            "2021-02-01",
            "2021-02-28",
        ));
        assert_eq!(r.window, extent());
        assert_eq!(r.source, RangeSource::Fallback);
    }

    #[test]
    fn epoch_millisecond_bounds_are_dates() {
        // 2021-06-01T00:00:00Z and 2021-06-10T12:00:00Z
        let ev: RelayoutEvent = serde_json::from_value(json!({
            "xaxis.range[0]": 1622505600000i64,
            "xaxis.range[1]": 1623326400000.0
        }))
        .unwrap();
        assert_eq!(ev.x_range(), Some((d("2021-06-01"), d("2021-06-10"))));
    }

    #[test]
    fn trigger_round_trips_through_json() {
        let t: Trigger = serde_json::from_value(json!({"type": "chart", "value": "daily"})).unwrap();
        assert_eq!(t, Trigger::Chart(ChartKind::Daily));
        let t: Trigger = serde_json::from_value(json!({"type": "update_button"})).unwrap();
        assert_eq!(t, Trigger::UpdateButton);
    }
}
