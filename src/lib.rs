//! case_trends
//!
//! Regional daily case counts from a CSV extract, turned into a pair of
//! linked time-series charts (daily and cumulative). Pairs with the `cases`
//! CLI and the `cases-gui` dashboard.
//!
//! ### Features
//! - Load and aggregate domestic cases per (date, region), with an optional
//!   legacy sub-division of one region
//! - Reconcile typed date bounds with zoom/pan payloads of either chart
//! - Build both chart specs for up to four regions
//! - Export the displayed charts as PNG (or SVG from the CLI)
//! - Save the visible rows as CSV or JSON, quick per-region summaries
//!
//! ### Example
//! ```no_run
//! use std::sync::Arc;
//! use case_trends::{ChartKind, Dashboard, DashboardConfig, Interaction};
//!
//! let config = DashboardConfig::default();
//! let series = case_trends::loader::load_daily_series(&config.data_path, &config)?;
//! let mut dashboard = Dashboard::new(Arc::new(series), &config);
//! dashboard.interact(Interaction::Initial);
//! let opts = case_trends::export::export_options(&config);
//! if let Some(img) = dashboard.export(ChartKind::Daily, &opts)? {
//!     img.write_to_dir(".")?;
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod export;
pub mod loader;
pub mod models;
pub mod reconcile;
pub mod render;
pub mod series;
pub mod stats;
pub mod storage;
pub mod view;

pub use chart::ChartSpec;
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, Interaction};
pub use loader::{LoadError, load_daily_series};
pub use models::{ChartKind, DateWindow, RegionSelection, ViewRow};
pub use reconcile::{RelayoutEvent, Trigger, reconcile};
pub use series::DailySeries;
pub use view::{DashboardView, build_view};
