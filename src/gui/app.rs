//! Result Charts Main Application
//! Main window with control panel and result card viewer.

use crate::charts::export_cards;
use crate::config::Settings;
use crate::data::{ResultCard, ResultLoader};
use crate::download::{
    DialogNotifier, DialogSink, DirectorySink, DownloadManager, DownloadOutcome, PortalClient,
    ReportSink,
};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// Loading result from background thread
enum LoadResult {
    Complete { cards: Vec<ResultCard>, source: String },
    Error(String),
}

/// Main application window.
pub struct ResultChartsApp {
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    portal: Arc<PortalClient>,
    downloads: DownloadManager,

    // Async file loading and portal fetches
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl ResultChartsApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        settings: Settings,
        portal: PortalClient,
        input: Option<PathBuf>,
    ) -> Self {
        let portal = Arc::new(portal);
        let downloads = DownloadManager::new(
            settings.download_strategy,
            portal.clone(),
            Self::make_sink(settings.download_dir.clone()),
        );

        let mut control_panel = ControlPanel::new();
        control_panel.options = settings.chart_options();
        control_panel.strategy = settings.download_strategy;
        control_panel.base_url = portal.base_url().to_string();

        let mut app = Self {
            control_panel,
            chart_viewer: ChartViewer::new(settings.chart_options()),
            portal,
            downloads,
            load_rx: None,
            is_loading: false,
        };

        if let Some(path) = input {
            app.start_file_load(path);
        }
        app
    }

    fn make_sink(download_dir: Option<PathBuf>) -> Box<dyn ReportSink> {
        match download_dir {
            Some(dir) => Box::new(DirectorySink::new(dir)),
            None => Box::new(DialogSink),
        }
    }

    /// Handle JSON file selection
    fn handle_open_file(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Result JSON", &["json"])
            .pick_file()
        {
            self.start_file_load(path);
        }
    }

    fn start_file_load(&mut self, path: PathBuf) {
        self.control_panel.file_path = Some(path.clone());
        self.begin_loading("Loading result file...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let mut loader = ResultLoader::new();
            let message = match loader.load_file(&path) {
                Ok(cards) => LoadResult::Complete {
                    cards: cards.to_vec(),
                    source: path.display().to_string(),
                },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(message);
        });
    }

    /// Fetch the student's launched results from the portal
    fn handle_fetch_results(&mut self) {
        if self.is_loading {
            return;
        }
        let Some(student_id) = self.control_panel.parsed_student_id() else {
            self.control_panel.set_status("Error: student id must be a number");
            return;
        };

        self.begin_loading(&format!("Fetching results for student {}...", student_id));

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let portal = Arc::clone(&self.portal);

        thread::spawn(move || {
            let message = match portal.launched_results(student_id) {
                Ok(cards) => LoadResult::Complete {
                    cards,
                    source: format!("student {}", student_id),
                },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(message);
        });
    }

    fn begin_loading(&mut self, status: &str) {
        self.downloads
            .cancel_all(self.chart_viewer.cards.iter_mut().map(|view| &mut view.control));
        self.chart_viewer.clear();
        self.control_panel.export_enabled = false;
        self.control_panel.busy = true;
        self.control_panel.set_status(status);
        self.is_loading = true;
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { cards, source }) => {
                let count = cards.len();
                match self.chart_viewer.set_cards(cards) {
                    Ok(()) => {
                        info!(cards = count, %source, "results loaded");
                        self.control_panel
                            .set_status(&format!("Loaded {} result(s) from {}", count, source));
                        self.control_panel.export_enabled = count > 0;
                    }
                    Err(e) => {
                        error!(error = %e, "failed to render result charts");
                        self.control_panel.set_status(&format!("Error: {}", e));
                    }
                }
                self.finish_loading();
            }
            Ok(LoadResult::Error(e)) => {
                warn!(error = %e, "failed to load results");
                self.control_panel.set_status(&format!("Error: {}", e));
                self.finish_loading();
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel.set_status("Error: loader stopped unexpectedly");
                self.finish_loading();
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;
    }

    fn handle_options_changed(&mut self) {
        if let Err(e) = self.chart_viewer.set_options(self.control_panel.options) {
            error!(error = %e, "failed to re-render charts");
            self.control_panel.set_status(&format!("Error: {}", e));
        }
    }

    fn handle_strategy_changed(&mut self) {
        self.downloads.set_strategy(self.control_panel.strategy);
        info!(strategy = ?self.control_panel.strategy, "download strategy changed");
    }

    /// Handle SVG export of every card's charts
    fn handle_export_svg(&mut self) {
        if self.chart_viewer.is_empty() {
            self.control_panel.set_status("No charts to export");
            return;
        }

        let Some(out_dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let cards = self.chart_viewer.card_data();
        match export_cards(&cards, &out_dir, self.control_panel.options) {
            Ok(paths) => {
                self.control_panel.set_status(&format!(
                    "Exported {} chart file(s) to {}",
                    paths.len(),
                    out_dir.display()
                ));
            }
            Err(e) => {
                error!(error = %e, "svg export failed");
                self.control_panel.set_status(&format!("Error: {}", e));
            }
        }
    }

    fn handle_download_clicked(&mut self, index: usize) {
        let Some(view) = self.chart_viewer.cards.get_mut(index) else {
            return;
        };
        let Some(request) = view.report_request() else {
            warn!(index, "download requested for a card without a student id");
            return;
        };

        if let Some(outcome) = self.downloads.download_pdf(request, &mut view.control) {
            Self::report_outcome(&mut self.control_panel, &outcome);
        }
    }

    /// Finish downloads whose responses have arrived
    fn check_downloads(&mut self) {
        if !self.downloads.has_pending() {
            return;
        }
        for view in &mut self.chart_viewer.cards {
            if let Some(outcome) = self.downloads.poll(&mut view.control, &DialogNotifier) {
                Self::report_outcome(&mut self.control_panel, &outcome);
            }
        }
    }

    fn report_outcome(panel: &mut ControlPanel, outcome: &DownloadOutcome) {
        let status = match outcome {
            DownloadOutcome::Saved(path) => format!("Saved {}", path.display()),
            DownloadOutcome::Declined => "Download cancelled".to_string(),
            DownloadOutcome::Cancelled => "Download superseded".to_string(),
            DownloadOutcome::Opened(url) => format!("Opened {}", url),
            DownloadOutcome::Failed(e) => format!("Error: {}", e),
        };
        panel.set_status(&status);
    }
}

impl eframe::App for ResultChartsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_downloads();

        if self.is_loading || self.downloads.has_pending() {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::OpenFile => self.handle_open_file(),
                        ControlPanelAction::FetchResults => self.handle_fetch_results(),
                        ControlPanelAction::OptionsChanged => self.handle_options_changed(),
                        ControlPanelAction::StrategyChanged => self.handle_strategy_changed(),
                        ControlPanelAction::ExportSvg => self.handle_export_svg(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        let mut clicked = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            clicked = self.chart_viewer.show(ui);
        });

        for index in clicked {
            self.handle_download_clicked(index);
        }
    }
}
