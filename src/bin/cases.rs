use anyhow::{Context, Result};
use case_trends::export::{chart_svg, export_options};
use case_trends::{ChartKind, Dashboard, DashboardConfig, Interaction};
use case_trends::{loader, stats, storage};
use clap::{Args, Parser, Subcommand, ValueEnum};
use num_format::ToFormattedString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "cases",
    version,
    about = "Render daily and cumulative regional case charts from a CSV extract"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render both charts (and optionally dump the chart spec, rows and stats).
    Render(RenderArgs),
    /// List the selectable regions with their date range and total.
    Regions(SourceArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ImageFormat {
    Png,
    Svg,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Case extract (CSV). Defaults to the file named in the config.
    #[arg(long)]
    data: Option<PathBuf>,
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Region label, repeatable or comma separated (at most 4 are shown).
    #[arg(short, long = "region")]
    regions: Vec<String>,
    /// First day (YYYY-MM-DD). Invalid or inverted bounds fall back to the full range.
    #[arg(long)]
    start: Option<String>,
    /// Last day (YYYY-MM-DD).
    #[arg(long)]
    end: Option<String>,
    /// Directory for the chart images.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    format: ImageFormat,
    /// Logical width of the images (config default 1000).
    #[arg(long)]
    width: Option<u32>,
    /// Logical height of the images (config default 560).
    #[arg(long)]
    height: Option<u32>,
    /// Write both chart specs as JSON to this file.
    #[arg(long)]
    spec_json: Option<PathBuf>,
    /// Write the visible rows to this file (.csv or .json).
    #[arg(long)]
    rows: Option<PathBuf>,
    /// Print per-region statistics for the visible window.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

fn parse_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .flat_map(|s| s.split([',', ';']))
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Regions(args) => cmd_regions(args),
    }
}

fn load(source: &SourceArgs) -> Result<(DashboardConfig, Dashboard)> {
    let mut config = DashboardConfig::load(source.config.as_deref())?;
    if let Some(p) = &source.data {
        config.data_path = p.clone();
    }
    let series = loader::load_daily_series(&config.data_path, &config)
        .with_context(|| format!("loading {}", config.data_path.display()))?;
    let dashboard = Dashboard::new(Arc::new(series), &config);
    Ok((config, dashboard))
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let (mut config, mut dashboard) = load(&args.source)?;
    if let Some(w) = args.width {
        config.export.width = w;
    }
    if let Some(h) = args.height {
        config.export.height = h;
    }

    let regions = parse_list(&args.regions);
    if !regions.is_empty() {
        for slot in 0..dashboard.selectors().len() {
            dashboard.interact(Interaction::SelectRegion {
                slot,
                label: regions.get(slot).cloned(),
            });
        }
        for r in regions.iter().filter(|r| !dashboard.choices().contains(*r)) {
            log::warn!("region {r:?} has no rows in the data");
        }
    }
    if let Some(s) = &args.start {
        dashboard.interact(Interaction::EditStart(s.clone()));
    }
    if let Some(e) = &args.end {
        dashboard.interact(Interaction::EditEnd(e.clone()));
    }
    dashboard.interact(Interaction::ClickUpdate);
    let view = dashboard
        .view()
        .context("no view after update")?
        .clone();
    eprintln!("{}", view.range_text);

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let opts = export_options(&config);
    for kind in ChartKind::ALL {
        let path = match args.format {
            ImageFormat::Png => {
                let Some(img) = dashboard.export(kind, &opts)? else {
                    continue;
                };
                img.write_to_dir(&args.out_dir)?
            }
            ImageFormat::Svg => {
                let path = args.out_dir.join(format!("{}.svg", kind.file_stem()));
                let svg = chart_svg(view.chart(kind), &opts)?;
                std::fs::write(&path, svg)
                    .with_context(|| format!("writing {}", path.display()))?;
                path
            }
        };
        eprintln!("Wrote {} chart to {}", kind.file_stem(), path.display());
    }

    if let Some(path) = args.spec_json.as_ref() {
        write_spec_json(&view, path)?;
        eprintln!("Wrote chart specs to {}", path.display());
    }

    if let Some(path) = args.rows.as_ref() {
        storage::save_rows(&view.rows, path)?;
        eprintln!("Saved {} rows to {}", view.rows.len(), path.display());
    }

    if args.stats {
        let locale = case_trends::render::util::map_locale(&config.locale);
        for s in stats::window_summary(&view.rows, view.window) {
            println!(
                "{}  total={} days={} peak={} on {} mean/day={:.2} median={}",
                s.label,
                s.total.to_formatted_string(locale),
                s.days,
                s.peak.to_formatted_string(locale),
                s.peak_date.as_deref().unwrap_or("NA"),
                s.mean_per_day,
                s.median.map_or_else(|| "NA".to_string(), |m| format!("{m}"))
            );
        }
    }

    Ok(())
}

fn write_spec_json(view: &case_trends::DashboardView, path: &Path) -> Result<()> {
    let doc = serde_json::json!({
        "range_text": view.range_text,
        "daily": view.daily,
        "cumulative": view.cumulative,
    });
    let text = serde_json::to_string_pretty(&doc)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn cmd_regions(args: SourceArgs) -> Result<()> {
    let (config, dashboard) = load(&args)?;
    let locale = case_trends::render::util::map_locale(&config.locale);
    let series = dashboard.series();
    for label in dashboard.choices() {
        let Some(extent) = series.label_extent(label) else {
            continue;
        };
        println!(
            "{}\t{}\t{}",
            label,
            extent,
            series.label_total(label).to_formatted_string(locale)
        );
    }
    Ok(())
}
