use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Column headers of the source extract.
pub mod columns {
    pub const DATE: &str = "個案研判日";
    pub const REGION: &str = "縣市";
    pub const SUB_REGION: &str = "鄉鎮";
    pub const IMPORTED: &str = "是否為境外移入";
    pub const CASES: &str = "確定病例數";

    /// Headers the loader cannot work without.
    pub const REQUIRED: [&str; 5] = [DATE, REGION, SUB_REGION, IMPORTED, CASES];
}

/// Raw row as it appears in the CSV (position-independent, header-keyed).
///
/// The date stays a string here so the loader can report the offending row
/// when it is malformed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "個案研判日")]
    pub date: String,
    #[serde(rename = "縣市")]
    pub region: String,
    #[serde(rename = "鄉鎮", default)]
    pub sub_region: String,
    #[serde(rename = "是否為境外移入", deserialize_with = "de_flag")]
    pub imported: bool,
    #[serde(rename = "確定病例數")]
    pub cases: u64,
}

/// Serde helper: the imported flag shows up as `0`/`1`, as a boolean, or as
/// one of a handful of spellings depending on who exported the file.
fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a 0/1 flag, a boolean, or one of true/false/是/否/Y/N")
        }

        fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match v {
                0 => Ok(false),
                1 => Ok(true),
                other => Err(E::custom(format!("flag out of range: {other}"))),
            }
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("negative flag"));
            }
            self.visit_u64(v as u64)
        }

        fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            match s.trim().to_ascii_lowercase().as_str() {
                "0" | "false" | "n" | "no" | "否" => Ok(false),
                "1" | "true" | "y" | "yes" | "是" => Ok(true),
                other => Err(E::custom(format!("unrecognized flag: {other:?}"))),
            }
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

/// One parsed row of the source file. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub date: NaiveDate,
    pub region: String,
    pub sub_region: String,
    pub imported: bool,
    pub cases: u64,
}

/// Parse a calendar date the way users and chart layers write them.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`, any of those followed by a
/// time of day, and RFC 3339 timestamps. The time of day is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Canonical `YYYY-MM-DD` form used in text fields and chart payloads.
pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Inclusive calendar window. `start <= end` always holds for values built
/// through [`DateWindow::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Returns `None` when the bounds are inverted.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn contains(&self, d: NaiveDate) -> bool {
        self.start <= d && d <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", format_date(self.start), format_date(self.end))
    }
}

/// Maximum number of regions shown at once (one per selector).
pub const MAX_SELECTED_REGIONS: usize = 4;

/// Up to four distinct displayed-region labels.
///
/// Empty entries are discarded and duplicates collapsed; the first occurrence
/// decides the legend position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionSelection {
    labels: Vec<String>,
}

impl RegionSelection {
    pub fn from_selectors<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut labels: Vec<String> = Vec::new();
        for s in selectors.into_iter().flatten() {
            let s = s.as_ref().trim();
            if s.is_empty() || labels.iter().any(|l| l == s) {
                continue;
            }
            if labels.len() == MAX_SELECTED_REGIONS {
                break;
            }
            labels.push(s.to_string());
        }
        Self { labels }
    }

    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_selectors(labels.into_iter().map(Some))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

/// Which of the two charts a spec, event or export refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Daily,
    Cumulative,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Daily, ChartKind::Cumulative];

    /// Default download name of the exported image.
    pub fn export_file_name(&self) -> &'static str {
        match self {
            ChartKind::Daily => "daily_confirmed.png",
            ChartKind::Cumulative => "cumulative_confirmed.png",
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            ChartKind::Daily => "daily_confirmed",
            ChartKind::Cumulative => "cumulative_confirmed",
        }
    }
}

/// One visible row: a (date, label) pair with its daily count and the running
/// total of that label inside the active window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    pub date: NaiveDate,
    pub label: String,
    pub cases: u64,
    pub cumulative: u64,
}
