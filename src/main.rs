//! Result Charts - Student Result Visualization & Report Download
//!
//! Desktop viewer by default; `render` and `download` run headless.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use result_charts::charts::export_cards;
use result_charts::config::Settings;
use result_charts::data::ResultLoader;
use result_charts::download::{
    ConsoleNotifier, DirectorySink, DownloadControl, DownloadManager, DownloadOutcome,
    DownloadStrategy, PortalClient, ReportRequest, DOWNLOAD_LABEL,
};
use result_charts::gui::ResultChartsApp;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "result-charts")]
#[command(about = "Chart student results and download their PDF reports")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to result-charts.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Result portal address, e.g. http://localhost:5000
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the desktop viewer
    View {
        /// Result JSON to load on startup
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Write every card's charts as SVG files
    Render {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Download one PDF report
    Download {
        #[arg(long)]
        launch_id: i64,
        #[arg(long)]
        student_id: i64,
        /// Directory to save into (defaults to download_dir, then the current directory)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Open the report URL in the browser instead of saving it
        #[arg(long)]
        navigate: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    settings.apply_base_url_override(cli.base_url);
    settings.validate()?;

    let portal = PortalClient::new(&settings.base_url, settings.request_timeout())
        .context("creating portal client")?;

    match cli.command.unwrap_or(Command::View { input: None }) {
        Command::View { input } => run_viewer(settings, portal, input),
        Command::Render { input, out } => run_render(&settings, input, out),
        Command::Download {
            launch_id,
            student_id,
            out,
            navigate,
        } => run_download(
            settings,
            portal,
            ReportRequest::new(launch_id, student_id),
            out,
            navigate,
        ),
    }
}

fn run_viewer(settings: Settings, portal: PortalClient, input: Option<PathBuf>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Result Charts"),
        ..Default::default()
    };

    eframe::run_native(
        "Result Charts",
        options,
        Box::new(move |cc| Ok(Box::new(ResultChartsApp::new(cc, settings, portal, input)))),
    )
    .map_err(|e| anyhow!("viewer failed: {}", e))
}

fn run_render(settings: &Settings, input: PathBuf, out: PathBuf) -> Result<()> {
    let mut loader = ResultLoader::new();
    let cards = loader
        .load_file(&input)
        .with_context(|| format!("loading {}", input.display()))?;

    let paths = export_cards(cards, &out, settings.chart_options())?;
    for path in &paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn run_download(
    settings: Settings,
    portal: PortalClient,
    request: ReportRequest,
    out: Option<PathBuf>,
    navigate: bool,
) -> Result<()> {
    let strategy = if navigate {
        DownloadStrategy::Navigate
    } else {
        settings.download_strategy
    };
    let dir = out
        .or(settings.download_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut manager =
        DownloadManager::new(strategy, Arc::new(portal), Box::new(DirectorySink::new(dir)));
    let mut control = DownloadControl::new("cli", DOWNLOAD_LABEL);

    let outcome = match manager.download_pdf(request, &mut control) {
        Some(outcome) => outcome,
        None => manager
            .wait(&mut control, &ConsoleNotifier)
            .ok_or_else(|| anyhow!("download was never started"))?,
    };

    match outcome {
        DownloadOutcome::Saved(path) => {
            info!(path = %path.display(), "report saved");
            println!("{}", path.display());
            Ok(())
        }
        DownloadOutcome::Opened(url) => {
            println!("{}", url);
            Ok(())
        }
        DownloadOutcome::Declined | DownloadOutcome::Cancelled => Ok(()),
        DownloadOutcome::Failed(e) => bail!("download failed: {}", e),
    }
}
