//! Main application entry point

use anyhow::Result;
use eframe::egui::{self, Context};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use lv_data::CsvSource;
use lv_views::{
    Clock, LinkedSession, ParallelCoordinatesConfig, ParallelCoordinatesView, ScatterPlotConfig, ScatterPlotView,
    SystemClock,
};

mod config;
mod theme;

use config::AppConfig;

/// Config file read when no path is given on the command line
const DEFAULT_CONFIG: &str = "housing-views.json";

/// Main application state
struct HousingViewsApp {
    session: LinkedSession,
    data_path: PathBuf,
    /// Selection summary written by the selection hook
    selection_summary: Arc<Mutex<String>>,
    status: Option<String>,
}

impl HousingViewsApp {
    fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        theme::apply_theme(&cc.egui_ctx);

        let dataset = config.dataset;
        let mut session = LinkedSession::new(dataset.schema.clone());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

        let scatter = ScatterPlotView::new(
            ScatterPlotConfig {
                x_column: dataset.scatter.x.clone(),
                y_column: dataset.scatter.y.clone(),
                base_color: lv_views::plots::colors::color_from_rgba(config.highlight.scatter_point),
                style: config.highlight.scatter_style(),
                ..ScatterPlotConfig::default()
            },
            session.coordinator().clone(),
            clock.clone(),
        );
        let parallel = ParallelCoordinatesView::new(
            ParallelCoordinatesConfig {
                dimensions: dataset.parallel_dimensions.clone(),
                color_column: dataset.color_dimension.clone(),
                color_categories: dataset.color_categories.clone(),
                style: config.highlight.parallel_style(),
                ..ParallelCoordinatesConfig::default()
            },
            session.coordinator().clone(),
            clock,
        );
        session.register_view(Box::new(scatter));
        session.register_view(Box::new(parallel));

        let selection_summary = Arc::new(Mutex::new("No selection".to_string()));
        let summary = selection_summary.clone();
        let repaint = cc.egui_ctx.clone();
        session.on_selection_changed(move |selection| {
            *summary.lock() = match selection.len() {
                Some(n) => format!("{} houses selected", n),
                None => "No selection".to_string(),
            };
            repaint.request_repaint();
        });

        let mut app = Self {
            session,
            data_path: dataset.path,
            selection_summary,
            status: None,
        };
        app.reload();
        app
    }

    /// Read the CSV again and swap it in. A bad file leaves the current
    /// dataset in place.
    fn reload(&mut self) {
        let result = CsvSource::new(&self.data_path)
            .read_rows()
            .and_then(|rows| self.session.reload(rows));
        self.status = match result {
            Ok(records) => {
                info!("Showing {} houses from {}", records.len(), self.data_path.display());
                None
            }
            Err(e) => {
                error!("Failed to load {}: {}", self.data_path.display(), e);
                Some(format!("Failed to load {}: {}", self.data_path.display(), e))
            }
        };
    }
}

impl eframe::App for HousingViewsApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Reload").clicked() {
                    self.reload();
                }
                if ui.button("Clear brushes").clicked() {
                    for view in self.session.views_mut() {
                        view.clear_brushes();
                    }
                }
                ui.separator();
                ui.label(format!("{} houses", self.session.records().len()));
                ui.separator();
                ui.label(self.selection_summary.lock().clone());
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(250, 100, 100), status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let views = self.session.views_mut();
            ui.columns(views.len().max(1), |columns| {
                for (column, view) in columns.iter_mut().zip(views.iter_mut()) {
                    column.heading(view.title());
                    view.ui(column);
                }
            });
        });
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = AppConfig::load(Path::new(&config_path))?;

    info!("Starting housing views with data from {}", config.dataset.path.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(config.window_size)
            .with_min_inner_size([800.0, 480.0]),
        default_theme: eframe::Theme::Dark,
        ..Default::default()
    };

    eframe::run_native(
        "Housing Views",
        options,
        Box::new(move |cc| Box::new(HousingViewsApp::new(cc, config))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
