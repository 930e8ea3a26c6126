//! Dashboard configuration: which regions exist, how one of them is split into
//! a legacy sub-division, chart texts and export geometry.
//!
//! Defaults reproduce the shipped Taiwan dashboard. A TOML file can override
//! any subset of the fields:
//!
//! ```toml
//! data_path = "Day_Confirmation_Age_County_Gender_19CoV.csv"
//! regions = ["台北市", "新北市"]
//!
//! [legacy]
//! region = "高雄市"
//! label = "舊高雄市"
//! sub_regions = ["鹽埕區", "鼓山區"]
//! parent_includes_legacy = true
//!
//! [texts]
//! daily_title = "Daily domestic cases"
//! range_prefix = "Showing "
//! all_button = "All"
//!
//! [export]
//! width = 1000
//! height = 560
//! scale = 2
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "Day_Confirmation_Age_County_Gender_19CoV.csv";

/// Open-data page the case extract is published on.
pub const DATA_SOURCE_URL: &str = "https://data.gov.tw/dataset/120711";

const TAIWAN_COUNTIES: [&str; 22] = [
    "基隆市", "台北市", "新北市", "桃園市", "新竹市", "新竹縣", "苗栗縣", "台中市", "彰化縣",
    "南投縣", "雲林縣", "嘉義市", "嘉義縣", "台南市", "高雄市", "屏東縣", "台東縣", "花蓮縣",
    "宜蘭縣", "澎湖縣", "金門縣", "連江縣",
];

const OLD_KAOHSIUNG_DISTRICTS: [&str; 11] = [
    "鹽埕區", "鼓山區", "左營區", "楠梓區", "三民區", "新興區", "前金區", "苓雅區", "前鎮區",
    "旗津區", "小港區",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Source extract, relative paths resolve against the working directory.
    pub data_path: PathBuf,
    /// Allow-list of raw region names, in dropdown order.
    pub regions: Vec<String>,
    /// Optional split of one region into a historical sub-division.
    pub legacy: Option<LegacySplit>,
    /// Region preselected in the first selector.
    pub default_region: Option<String>,
    pub texts: ChartTexts,
    pub export: ExportConfig,
    /// TTF/OTF used for chart text. Falls back to common system fonts.
    pub font_path: Option<PathBuf>,
    /// Thousands-separator locale for the value axis (`en`, `de`, `fr`, ...).
    pub locale: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_FILE),
            regions: TAIWAN_COUNTIES.iter().map(|s| s.to_string()).collect(),
            legacy: Some(LegacySplit::default()),
            default_region: Some(TAIWAN_COUNTIES[0].to_string()),
            texts: ChartTexts::default(),
            export: ExportConfig::default(),
            font_path: None,
            locale: "en".to_string(),
        }
    }
}

/// Rows of `region` whose sub-region is listed get `label` as displayed region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacySplit {
    /// `enabled = false` in a config file turns the split off.
    pub enabled: bool,
    pub region: String,
    pub label: String,
    pub sub_regions: Vec<String>,
    /// Keep counting legacy rows under `region` as well, so the parent series
    /// stays the full region total and the legacy series is an overlay.
    pub parent_includes_legacy: bool,
}

impl Default for LegacySplit {
    fn default() -> Self {
        Self {
            enabled: true,
            region: "高雄市".to_string(),
            label: "舊高雄市".to_string(),
            sub_regions: OLD_KAOHSIUNG_DISTRICTS.iter().map(|s| s.to_string()).collect(),
            parent_includes_legacy: true,
        }
    }
}

impl LegacySplit {
    pub fn matches(&self, region: &str, sub_region: &str) -> bool {
        region == self.region && self.sub_regions.iter().any(|s| s == sub_region)
    }
}

/// Titles and axis labels for both charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartTexts {
    pub daily_title: String,
    pub cumulative_title: String,
    pub x_title: String,
    pub daily_y_title: String,
    pub cumulative_y_title: String,
    pub legend_title: String,
    pub font_family: String,
    pub font_size: u32,
    /// Prefix of the range line shown above the charts, used verbatim.
    pub range_prefix: String,
    /// Labels of the quick-range buttons (last 7 days, last month, everything).
    pub week_button: String,
    pub month_button: String,
    pub all_button: String,
}

impl Default for ChartTexts {
    fn default() -> Self {
        Self {
            daily_title: "台灣目標縣市每日本土確診數".to_string(),
            cumulative_title: "台灣目標縣市累積本土確診數".to_string(),
            x_title: "日期".to_string(),
            daily_y_title: "每日本土確診數".to_string(),
            cumulative_y_title: "累積本土確診數".to_string(),
            legend_title: "縣市".to_string(),
            font_family: "Microsoft JhengHei".to_string(),
            font_size: 14,
            range_prefix: "顯示日期區間：".to_string(),
            week_button: "1週".to_string(),
            month_button: "1月".to_string(),
            all_button: "全部".to_string(),
        }
    }
}

/// Raster geometry of exported images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub width: u32,
    pub height: u32,
    /// Pixel multiplier applied on top of `width`/`height`.
    pub scale: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 560,
            scale: 2,
        }
    }
}

impl DashboardConfig {
    /// Read a TOML file; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path` when given, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Where to get the extract, naming the file the dashboard expects.
    pub fn usage_text(&self) -> String {
        let file = self
            .data_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
        format!("使用方式：請至資料來源下載「{file}」，並以參數或設定檔指定其路徑")
    }

    /// The legacy split, if configured and enabled.
    pub fn active_legacy(&self) -> Option<&LegacySplit> {
        self.legacy.as_ref().filter(|l| l.enabled)
    }

    /// Every label a selector may offer: the raw regions plus the legacy label.
    pub fn selectable_labels(&self) -> Vec<String> {
        let mut out = self.regions.clone();
        if let Some(legacy) = self.active_legacy() {
            if !out.contains(&legacy.region) {
                out.push(legacy.region.clone());
            }
            if !out.contains(&legacy.label) {
                out.push(legacy.label.clone());
            }
        }
        out
    }

    /// True when rows of `region` survive the allow-list filter.
    pub fn allows_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
            || self.active_legacy().is_some_and(|l| l.region == region)
    }
}
