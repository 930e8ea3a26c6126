//! The canonical daily series: one summed count per (date, displayed label).

use crate::models::DateWindow;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Grouping key of the daily table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey {
    pub date: NaiveDate,
    pub label: String,
}

/// Read-only mapping `(date, label) -> cases`, built once at startup.
///
/// Iteration is ordered by date, then label. The extent is the min/max date
/// over all rows and always exists (an empty series cannot be constructed
/// through the loader).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySeries {
    counts: BTreeMap<DayKey, u64>,
    extent: DateWindow,
}

impl DailySeries {
    /// Sum `(date, label, cases)` triples; repeated keys accumulate.
    ///
    /// Returns `None` when there are no rows.
    pub fn from_rows<I, S>(rows: I) -> Option<Self>
    where
        I: IntoIterator<Item = (NaiveDate, S, u64)>,
        S: Into<String>,
    {
        let mut counts: BTreeMap<DayKey, u64> = BTreeMap::new();
        for (date, label, cases) in rows {
            *counts
                .entry(DayKey {
                    date,
                    label: label.into(),
                })
                .or_default() += cases;
        }
        let min = counts.keys().map(|k| k.date).min()?;
        let max = counts.keys().map(|k| k.date).max()?;
        Some(Self {
            counts,
            extent: DateWindow { start: min, end: max },
        })
    }

    /// Full data range (global min/max date).
    pub fn extent(&self) -> DateWindow {
        self.extent
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn get(&self, date: NaiveDate, label: &str) -> Option<u64> {
        self.counts
            .get(&DayKey {
                date,
                label: label.to_string(),
            })
            .copied()
    }

    /// Rows of one label inside `window`, ordered by date.
    pub fn label_rows<'a>(
        &'a self,
        label: &'a str,
        window: DateWindow,
    ) -> impl Iterator<Item = (NaiveDate, u64)> + 'a {
        self.counts
            .range(
                DayKey {
                    date: window.start,
                    label: String::new(),
                }..,
            )
            .take_while(move |(k, _)| k.date <= window.end)
            .filter(move |(k, _)| k.label == label)
            .map(|(k, v)| (k.date, *v))
    }

    /// Distinct labels present in the data, sorted.
    pub fn labels(&self) -> BTreeSet<&str> {
        self.counts.keys().map(|k| k.label.as_str()).collect()
    }

    /// First and last date on which `label` has a row.
    pub fn label_extent(&self, label: &str) -> Option<DateWindow> {
        let mut dates = self
            .counts
            .keys()
            .filter(|k| k.label == label)
            .map(|k| k.date);
        let first = dates.next()?;
        let last = dates.last().unwrap_or(first);
        Some(DateWindow {
            start: first,
            end: last,
        })
    }

    /// Total cases of `label` over the whole series.
    pub fn label_total(&self, label: &str) -> u64 {
        self.counts
            .iter()
            .filter(|(k, _)| k.label == label)
            .map(|(_, v)| *v)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> DailySeries {
        DailySeries::from_rows([
            (d("2021-05-02"), "A", 5),
            (d("2021-05-01"), "A", 3),
            (d("2021-05-01"), "B", 1),
            (d("2021-05-01"), "A", 2),
            (d("2021-05-04"), "B", 7),
        ])
        .unwrap()
    }

    #[test]
    fn repeated_keys_are_summed() {
        let s = sample();
        assert_eq!(s.len(), 4);
        assert_eq!(s.get(d("2021-05-01"), "A"), Some(5));
        assert_eq!(s.get(d("2021-05-03"), "A"), None);
    }

    #[test]
    fn extent_spans_all_labels() {
        let s = sample();
        assert_eq!(s.extent().start, d("2021-05-01"));
        assert_eq!(s.extent().end, d("2021-05-04"));
        assert_eq!(
            s.label_extent("A"),
            Some(DateWindow {
                start: d("2021-05-01"),
                end: d("2021-05-02")
            })
        );
        assert_eq!(s.label_extent("Z"), None);
    }

    #[test]
    fn label_rows_respect_window() {
        let s = sample();
        let w = DateWindow::new(d("2021-05-02"), d("2021-05-04")).unwrap();
        let b: Vec<_> = s.label_rows("B", w).collect();
        assert_eq!(b, vec![(d("2021-05-04"), 7)]);
        let a: Vec<_> = s.label_rows("A", w).collect();
        assert_eq!(a, vec![(d("2021-05-02"), 5)]);
    }

    #[test]
    fn empty_input_has_no_series() {
        let rows: Vec<(NaiveDate, String, u64)> = Vec::new();
        assert!(DailySeries::from_rows(rows).is_none());
    }

    #[test]
    fn totals_and_labels() {
        let s = sample();
        assert_eq!(s.label_total("A"), 10);
        assert_eq!(s.labels().into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
