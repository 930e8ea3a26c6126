//! Per-session dashboard state.
//!
//! A [`Dashboard`] owns everything one viewer can change: the four region
//! selectors, the two date text fields, the last zoom payload of each chart and
//! the figures currently on display. [`Dashboard::interact`] applies one
//! [`Interaction`]; all interactions except editing a text field recompute the
//! view. The loaded series is shared read-only behind an `Arc`.

use crate::chart::RangeSelector;
use crate::config::{ChartTexts, DashboardConfig};
use crate::export::{ExportError, ExportedImage, export_png};
use crate::models::{ChartKind, DateWindow, MAX_SELECTED_REGIONS, RegionSelection, format_date};
use crate::reconcile::{RangeInputs, Reconciled, RelayoutEvent, Trigger, reconcile};
use crate::render::RenderOptions;
use crate::series::DailySeries;
use crate::view::{DashboardView, build_view};
use serde_json::Value;
use std::sync::Arc;

/// One user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// First render after startup.
    Initial,
    /// Selector `slot` now shows `label` (`None` clears it).
    SelectRegion { slot: usize, label: Option<String> },
    /// Typing into the start field. Read on the next recompute.
    EditStart(String),
    /// Typing into the end field. Read on the next recompute.
    EditEnd(String),
    ClickUpdate,
    /// Zoom or pan reported by one chart.
    Relayout { chart: ChartKind, event: RelayoutEvent },
    /// Range selector button `button` of one chart.
    Preset { chart: ChartKind, button: usize },
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    series: Arc<DailySeries>,
    texts: ChartTexts,
    presets: RangeSelector,
    choices: Vec<String>,
    selectors: [Option<String>; MAX_SELECTED_REGIONS],
    start_text: String,
    end_text: String,
    daily_event: Option<RelayoutEvent>,
    cumulative_event: Option<RelayoutEvent>,
    last: Option<Reconciled>,
    view: Option<DashboardView>,
    daily_figure: Option<Value>,
    cumulative_figure: Option<Value>,
}

impl Dashboard {
    /// Fresh session: fields at the data extent, first selector on the
    /// configured default region. Nothing is rendered until the first
    /// interaction.
    pub fn new(series: Arc<DailySeries>, config: &DashboardConfig) -> Self {
        let extent = series.extent();
        let present = series.labels();
        let choices: Vec<String> = config
            .selectable_labels()
            .into_iter()
            .filter(|l| present.contains(l.as_str()))
            .collect();
        let mut selectors: [Option<String>; MAX_SELECTED_REGIONS] = Default::default();
        selectors[0] = config
            .default_region
            .clone()
            .filter(|r| choices.contains(r))
            .or_else(|| choices.first().cloned());
        Self {
            texts: config.texts.clone(),
            presets: RangeSelector::from_texts(&config.texts),
            choices,
            selectors,
            start_text: format_date(extent.start),
            end_text: format_date(extent.end),
            daily_event: None,
            cumulative_event: None,
            last: None,
            view: None,
            daily_figure: None,
            cumulative_figure: None,
            series,
        }
    }

    /// Apply one interaction. Returns `true` when the view was recomputed.
    pub fn interact(&mut self, interaction: Interaction) -> bool {
        let trigger = match interaction {
            Interaction::Initial => Trigger::Initial,
            Interaction::EditStart(text) => {
                self.start_text = text;
                return false;
            }
            Interaction::EditEnd(text) => {
                self.end_text = text;
                return false;
            }
            Interaction::SelectRegion { slot, label } => {
                let Some(sel) = self.selectors.get_mut(slot) else {
                    log::warn!("ignoring selector {slot}: only {MAX_SELECTED_REGIONS} exist");
                    return false;
                };
                *sel = label.filter(|l| !l.trim().is_empty());
                Trigger::RegionSelector(slot)
            }
            Interaction::ClickUpdate => Trigger::UpdateButton,
            Interaction::Relayout { chart, event } => {
                *self.event_slot(chart) = Some(event);
                Trigger::Chart(chart)
            }
            Interaction::Preset { chart, button } => {
                let Some(b) = self.presets.buttons.get(button) else {
                    log::warn!("ignoring unknown range preset {button}");
                    return false;
                };
                let w = b.window(self.series.extent());
                *self.event_slot(chart) = Some(RelayoutEvent::with_bounds(
                    &format_date(w.start),
                    &format_date(w.end),
                ));
                Trigger::Chart(chart)
            }
        };
        self.recompute(trigger);
        true
    }

    fn event_slot(&mut self, chart: ChartKind) -> &mut Option<RelayoutEvent> {
        match chart {
            ChartKind::Daily => &mut self.daily_event,
            ChartKind::Cumulative => &mut self.cumulative_event,
        }
    }

    fn recompute(&mut self, trigger: Trigger) {
        let reconciled = reconcile(&RangeInputs {
            trigger,
            daily_event: self.daily_event.as_ref(),
            cumulative_event: self.cumulative_event.as_ref(),
            start_text: &self.start_text,
            end_text: &self.end_text,
            extent: self.series.extent(),
        });
        let view = build_view(
            &self.series,
            &self.selection(),
            reconciled.window,
            &self.texts,
        );
        self.start_text.clone_from(&reconciled.start_text);
        self.end_text.clone_from(&reconciled.end_text);
        self.daily_figure = Some(view.daily.to_figure());
        self.cumulative_figure = Some(view.cumulative.to_figure());
        self.view = Some(view);
        self.last = Some(reconciled);
    }

    pub fn selection(&self) -> RegionSelection {
        RegionSelection::from_selectors(self.selectors.iter().map(Option::as_deref))
    }

    pub fn selectors(&self) -> &[Option<String>] {
        &self.selectors
    }

    /// Labels a selector may offer (configured labels present in the data).
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn presets(&self) -> &RangeSelector {
        &self.presets
    }

    pub fn start_text(&self) -> &str {
        &self.start_text
    }

    pub fn end_text(&self) -> &str {
        &self.end_text
    }

    pub fn extent(&self) -> DateWindow {
        self.series.extent()
    }

    pub fn series(&self) -> &Arc<DailySeries> {
        &self.series
    }

    pub fn view(&self) -> Option<&DashboardView> {
        self.view.as_ref()
    }

    pub fn last_reconciled(&self) -> Option<&Reconciled> {
        self.last.as_ref()
    }

    /// Figure currently displayed for `kind`, `None` before the first render.
    pub fn figure(&self, kind: ChartKind) -> Option<&Value> {
        match kind {
            ChartKind::Daily => self.daily_figure.as_ref(),
            ChartKind::Cumulative => self.cumulative_figure.as_ref(),
        }
    }

    /// Export the displayed figure of `kind` as PNG.
    pub fn export(
        &self,
        kind: ChartKind,
        opts: &RenderOptions,
    ) -> Result<Option<ExportedImage>, ExportError> {
        export_png(self.figure(kind), opts)
    }
}
