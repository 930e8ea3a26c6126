//! Build the two charts of one render from the series, the selection and the
//! reconciled window. Pure: identical inputs give identical output.

use crate::chart::{
    ChartSpec, FontSpec, Layout, LegendSpec, LineStyle, RangeSelector, RangeSlider, Trace, XAxis,
    YAxis,
};
use crate::config::ChartTexts;
use crate::models::{ChartKind, DateWindow, RegionSelection, ViewRow};
use crate::render::util::office_hex;
use crate::series::DailySeries;
use serde::{Deserialize, Serialize};

/// Output of one interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub window: DateWindow,
    pub daily: ChartSpec,
    pub cumulative: ChartSpec,
    /// Filtered rows with running totals, ordered by label (selection order)
    /// then date.
    pub rows: Vec<ViewRow>,
    /// Line shown above the charts, e.g. `顯示日期區間：2021-05-01 ~ 2021-06-30`.
    pub range_text: String,
}

impl DashboardView {
    pub fn chart(&self, kind: ChartKind) -> &ChartSpec {
        match kind {
            ChartKind::Daily => &self.daily,
            ChartKind::Cumulative => &self.cumulative,
        }
    }
}

/// Rows of the selected labels inside `window`, each with its running total.
///
/// An empty selection yields no rows. Totals restart at the window start, so
/// the last running total of a label equals the sum of its counts in the
/// window.
pub fn filter_rows(
    series: &DailySeries,
    selection: &RegionSelection,
    window: DateWindow,
) -> Vec<ViewRow> {
    let mut out = Vec::new();
    for label in selection.labels() {
        let mut running = 0u64;
        for (date, cases) in series.label_rows(label, window) {
            running += cases;
            out.push(ViewRow {
                date,
                label: label.clone(),
                cases,
                cumulative: running,
            });
        }
    }
    out
}

/// Build both chart specs for one render.
pub fn build_view(
    series: &DailySeries,
    selection: &RegionSelection,
    window: DateWindow,
    texts: &ChartTexts,
) -> DashboardView {
    let rows = filter_rows(series, selection, window);
    let daily = build_chart(ChartKind::Daily, selection, &rows, window, texts);
    let cumulative = build_chart(ChartKind::Cumulative, selection, &rows, window, texts);
    DashboardView {
        window,
        daily,
        cumulative,
        rows,
        range_text: format!("{}{}", texts.range_prefix, window),
    }
}

fn build_chart(
    kind: ChartKind,
    selection: &RegionSelection,
    rows: &[ViewRow],
    window: DateWindow,
    texts: &ChartTexts,
) -> ChartSpec {
    let mut data = Vec::new();
    // Color follows the position in the selection, also for labels without
    // rows, so a label keeps its color when an earlier one has no data.
    for (idx, label) in selection.labels().iter().enumerate() {
        let points: Vec<&ViewRow> = rows.iter().filter(|r| &r.label == label).collect();
        if points.is_empty() {
            continue;
        }
        data.push(Trace {
            name: label.clone(),
            mode: "lines".to_string(),
            x: points.iter().map(|r| r.date).collect(),
            y: points
                .iter()
                .map(|r| match kind {
                    ChartKind::Daily => r.cases,
                    ChartKind::Cumulative => r.cumulative,
                })
                .collect(),
            line: LineStyle {
                color: office_hex(idx),
                width: 2,
            },
        });
    }

    let (title, y_title) = match kind {
        ChartKind::Daily => (&texts.daily_title, &texts.daily_y_title),
        ChartKind::Cumulative => (&texts.cumulative_title, &texts.cumulative_y_title),
    };

    ChartSpec {
        kind,
        data,
        layout: Layout {
            title: title.clone(),
            font: FontSpec {
                family: texts.font_family.clone(),
                size: texts.font_size,
            },
            xaxis: XAxis {
                title: texts.x_title.clone(),
                axis_type: "date".to_string(),
                range: [window.start, window.end],
                rangeslider: RangeSlider { visible: true },
                rangeselector: RangeSelector::from_texts(texts),
            },
            yaxis: YAxis {
                title: y_title.clone(),
                rangemode: "tozero".to_string(),
            },
            legend: LegendSpec {
                title: texts.legend_title.clone(),
            },
        },
    }
}
