/*!
 * Desktop dashboard for case-trends
 *
 * - Four region selectors, two date fields and an update button
 * - Daily and cumulative charts: drag to zoom, scroll to zoom around the
 *   pointer, double click to show everything, preset range buttons
 * - PNG export of either chart
 */

use anyhow::{Context, Result, anyhow};
use case_trends::config::DATA_SOURCE_URL;
use case_trends::export::{export_options, screen_options};
use case_trends::render::{PlotFrame, RenderOptions, render_rgb};
use case_trends::render::util::{date_from_day_number, day_number};
use case_trends::models::format_date;
use case_trends::{ChartKind, Dashboard, DashboardConfig, Interaction, RelayoutEvent, loader};
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "cases-gui", version, about = "Interactive regional case dashboard")]
struct GuiArgs {
    /// Case extract (CSV). Defaults to the file named in the config.
    data: Option<PathBuf>,
    /// TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = GuiArgs::parse();

    let mut config = DashboardConfig::load(args.config.as_deref())?;
    if let Some(p) = args.data {
        config.data_path = p;
    }
    let series = loader::load_daily_series(&config.data_path, &config)
        .with_context(|| format!("loading {}", config.data_path.display()))?;
    let title = format!("Case trends - {}", config.data_path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 900.0])
            .with_min_inner_size([700.0, 500.0])
            .with_title(title),
        ..Default::default()
    };

    eframe::run_native(
        "Case trends",
        options,
        Box::new(move |_cc| Ok(Box::new(CasesApp::new(Arc::new(series), config)))),
    )
    .map_err(|e| anyhow!("{e}"))
}

/// What the UI asked for during one frame, applied after painting.
enum UiAction {
    Dashboard(Interaction),
    Export(ChartKind),
}

/// Rendered chart plus what is needed to map pointer positions to dates.
struct ChartTexture {
    handle: egui::TextureHandle,
    frame: PlotFrame,
    width: f32,
}

struct CasesApp {
    dashboard: Dashboard,
    config: DashboardConfig,
    screen: RenderOptions,

    // Text field buffers, written back after every recompute
    start_buf: String,
    end_buf: String,

    daily: Option<ChartTexture>,
    cumulative: Option<ChartTexture>,
    needs_render: bool,
    drag_from: Option<(ChartKind, f32)>,

    export_dir: PathBuf,
    status_message: String,
    error_message: String,
}

impl CasesApp {
    fn new(series: Arc<case_trends::DailySeries>, config: DashboardConfig) -> Self {
        let mut dashboard = Dashboard::new(series, &config);
        dashboard.interact(Interaction::Initial);
        let screen = screen_options(&config);
        let export_dir = dirs::download_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            start_buf: dashboard.start_text().to_string(),
            end_buf: dashboard.end_text().to_string(),
            dashboard,
            config,
            screen,
            daily: None,
            cumulative: None,
            needs_render: true,
            drag_from: None,
            export_dir,
            status_message: String::new(),
            error_message: String::new(),
        }
    }

    fn apply(&mut self, actions: Vec<UiAction>) {
        let mut changed = false;
        for action in actions {
            match action {
                UiAction::Dashboard(interaction) => changed |= self.dashboard.interact(interaction),
                UiAction::Export(kind) => self.export(kind),
            }
        }
        if changed {
            self.start_buf = self.dashboard.start_text().to_string();
            self.end_buf = self.dashboard.end_text().to_string();
            self.needs_render = true;
        }
    }

    fn render_textures(&mut self, ctx: &egui::Context) {
        self.needs_render = false;
        let Some(view) = self.dashboard.view() else {
            return;
        };
        for kind in ChartKind::ALL {
            let texture = match render_rgb(view.chart(kind), &self.screen) {
                Ok(rgb) => {
                    let size = [rgb.width as usize, rgb.height as usize];
                    let image = egui::ColorImage::from_rgb(size, &rgb.pixels);
                    Some(ChartTexture {
                        handle: ctx.load_texture(kind.file_stem(), image, egui::TextureOptions::LINEAR),
                        frame: rgb.frame,
                        width: rgb.width as f32,
                    })
                }
                Err(err) => {
                    self.error_message = format!("Failed to draw chart: {err:#}");
                    None
                }
            };
            match kind {
                ChartKind::Daily => self.daily = texture,
                ChartKind::Cumulative => self.cumulative = texture,
            }
        }
    }

    fn export(&mut self, kind: ChartKind) {
        let opts = export_options(&self.config);
        let image = match self.dashboard.export(kind, &opts) {
            Ok(Some(image)) => image,
            Ok(None) => return,
            Err(err) => {
                self.error_message = format!("Export failed: {err}");
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .set_directory(&self.export_dir)
            .set_file_name(&image.file_name)
            .add_filter("PNG", &["png"])
            .save_file()
        else {
            return;
        };
        match image.write_to(&path) {
            Ok(()) => {
                if let Some(dir) = path.parent() {
                    self.export_dir = dir.to_path_buf();
                }
                self.status_message = format!("Saved {}", path.display());
                self.error_message.clear();
            }
            Err(err) => self.error_message = format!("Export failed: {err}"),
        }
    }

    fn chart_ui(&mut self, ui: &mut egui::Ui, kind: ChartKind, actions: &mut Vec<UiAction>) {
        ui.horizontal(|ui| {
            for (idx, button) in self.dashboard.presets().buttons.iter().enumerate() {
                if ui.small_button(&button.label).clicked() {
                    actions.push(UiAction::Dashboard(Interaction::Preset {
                        chart: kind,
                        button: idx,
                    }));
                }
            }
            ui.separator();
            if ui.button("Export PNG").clicked() {
                actions.push(UiAction::Export(kind));
            }
        });

        let texture = match kind {
            ChartKind::Daily => self.daily.as_ref(),
            ChartKind::Cumulative => self.cumulative.as_ref(),
        };
        let Some(texture) = texture else {
            ui.label("Nothing rendered yet");
            return;
        };

        let image = egui::Image::new(&texture.handle)
            .max_width(ui.available_width())
            .sense(egui::Sense::click_and_drag());
        let response = ui.add(image);
        let rect = response.rect;
        let to_px = |x: f32| (x - rect.min.x) * texture.width / rect.width().max(1.0);
        let to_screen = |px: f32| rect.min.x + px * rect.width() / texture.width;

        if response.double_clicked() {
            let all = self.dashboard.presets().buttons.len().saturating_sub(1);
            actions.push(UiAction::Dashboard(Interaction::Preset {
                chart: kind,
                button: all,
            }));
        } else if response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.drag_from = Some((kind, to_px(pos.x)));
            }
        } else if response.drag_stopped() {
            if let (Some((from_kind, from)), Some(pos)) =
                (self.drag_from.take(), response.interact_pointer_pos())
                && from_kind == kind
                && let (Some(a), Some(b)) =
                    (texture.frame.date_at(from), texture.frame.date_at(to_px(pos.x)))
                && a != b
            {
                let (start, end) = if a < b { (a, b) } else { (b, a) };
                actions.push(UiAction::Dashboard(Interaction::Relayout {
                    chart: kind,
                    event: RelayoutEvent::with_bounds(&format_date(start), &format_date(end)),
                }));
            }
        } else if response.dragged()
            && let (Some((from_kind, from)), Some(pos)) =
                (self.drag_from, response.interact_pointer_pos())
            && from_kind == kind
        {
            let (x0, x1) = (to_screen(from), pos.x);
            let band = egui::Rect::from_x_y_ranges(x0.min(x1)..=x0.max(x1), rect.y_range());
            ui.painter()
                .rect_filled(band, 0.0, egui::Color32::from_rgba_unmultiplied(68, 114, 196, 40));
        }

        if response.hovered() {
            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0
                && let Some(pos) = response.hover_pos()
                && let Some(event) = zoom_event(&texture.frame, to_px(pos.x), scroll > 0.0)
            {
                actions.push(UiAction::Dashboard(Interaction::Relayout { chart: kind, event }));
            }
        }
    }
}

/// Zoom the x range around pixel column `px`, in when `zoom_in`.
fn zoom_event(frame: &PlotFrame, px: f32, zoom_in: bool) -> Option<RelayoutEvent> {
    let center = day_number(frame.date_at(px)?);
    let factor = if zoom_in { 0.8 } else { 1.25 };
    let lo = center - (center - frame.x_range.start) * factor;
    let hi = center + (frame.x_range.end - center) * factor;
    let (start, end) = (date_from_day_number(lo)?, date_from_day_number(hi)?);
    (start < end).then(|| RelayoutEvent::with_range_list(&format_date(start), &format_date(end)))
}

impl eframe::App for CasesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.needs_render {
            self.render_textures(ctx);
        }

        let mut actions: Vec<UiAction> = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Domestic confirmed cases by region");
                ui.label(self.config.usage_text());
                ui.horizontal(|ui| {
                    ui.label("資料來源：");
                    ui.hyperlink_to("政府資料開放平台", DATA_SOURCE_URL);
                });
                ui.add_space(10.0);

                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        for slot in 0..self.dashboard.selectors().len() {
                            let current = self.dashboard.selectors()[slot].clone();
                            let mut picked: Option<Option<String>> = None;
                            egui::ComboBox::from_id_salt(("region", slot))
                                .selected_text(current.as_deref().unwrap_or("-"))
                                .show_ui(ui, |ui| {
                                    if ui.selectable_label(current.is_none(), "-").clicked() {
                                        picked = Some(None);
                                    }
                                    for label in self.dashboard.choices() {
                                        let selected = current.as_deref() == Some(label.as_str());
                                        if ui.selectable_label(selected, label).clicked() {
                                            picked = Some(Some(label.clone()));
                                        }
                                    }
                                });
                            if let Some(label) = picked
                                && label != current
                            {
                                actions.push(UiAction::Dashboard(Interaction::SelectRegion { slot, label }));
                            }
                        }
                    });

                    ui.horizontal(|ui| {
                        ui.label("From:");
                        if ui.text_edit_singleline(&mut self.start_buf).changed() {
                            actions.push(UiAction::Dashboard(Interaction::EditStart(
                                self.start_buf.clone(),
                            )));
                        }
                        ui.label("to");
                        if ui.text_edit_singleline(&mut self.end_buf).changed() {
                            actions.push(UiAction::Dashboard(Interaction::EditEnd(
                                self.end_buf.clone(),
                            )));
                        }
                        if ui.button("Update").clicked() {
                            actions.push(UiAction::Dashboard(Interaction::ClickUpdate));
                        }
                    });

                    if let Some(view) = self.dashboard.view() {
                        ui.label(&view.range_text);
                    }
                });

                ui.add_space(10.0);
                for kind in ChartKind::ALL {
                    ui.group(|ui| self.chart_ui(ui, kind, &mut actions));
                    ui.add_space(10.0);
                }

                if !self.status_message.is_empty() {
                    ui.colored_label(egui::Color32::DARK_GREEN, &self.status_message);
                }
                if !self.error_message.is_empty() {
                    ui.colored_label(egui::Color32::RED, &self.error_message);
                }
            });
        });

        self.apply(actions);
        if self.needs_render {
            ctx.request_repaint();
        }
    }
}
