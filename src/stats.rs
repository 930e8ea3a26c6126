use crate::models::{DateWindow, ViewRow, format_date};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary of one label over the visible window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub label: String,
    /// Days with at least one reported case.
    pub days: usize,
    pub total: u64,
    pub peak_date: Option<String>,
    pub peak: u64,
    /// Average per calendar day of the window, including days without rows.
    pub mean_per_day: f64,
    pub median: Option<f64>,
}

/// Per-label summaries, in the order labels first appear in `rows`.
pub fn window_summary(rows: &[ViewRow], window: DateWindow) -> Vec<Summary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: BTreeMap<&str, Vec<&ViewRow>> = BTreeMap::new();
    for r in rows {
        if !groups.contains_key(r.label.as_str()) {
            order.push(&r.label);
        }
        groups.entry(&r.label).or_default().push(r);
    }

    let span = window.days().max(1) as f64;
    let mut out = Vec::with_capacity(order.len());
    for label in order {
        let group = &groups[label];
        let total: u64 = group.iter().map(|r| r.cases).sum();
        // earliest day wins a tie
        let peak_row = group
            .iter()
            .max_by(|a, b| a.cases.cmp(&b.cases).then(b.date.cmp(&a.date)));
        let mut vals: Vec<u64> = group.iter().map(|r| r.cases).collect();
        vals.sort_unstable();
        let n = vals.len();
        let median = match n {
            0 => None,
            _ if n % 2 == 1 => Some(vals[n / 2] as f64),
            _ => Some((vals[n / 2 - 1] + vals[n / 2]) as f64 / 2.0),
        };
        out.push(Summary {
            label: label.to_string(),
            days: group.iter().filter(|r| r.cases > 0).count(),
            total,
            peak_date: peak_row.map(|r| format_date(r.date)),
            peak: peak_row.map_or(0, |r| r.cases),
            mean_per_day: total as f64 / span,
            median,
        });
    }
    out
}
