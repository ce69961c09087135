//! Download module - PDF report fetching and saving

mod client;
mod control;
mod manager;

pub use client::{PortalClient, ReportRequest, ReportSource};
pub use control::{DownloadControl, BUSY_LABEL, DOWNLOAD_LABEL};
pub use manager::{
    ConsoleNotifier, DialogNotifier, DialogSink, DirectorySink, DownloadManager,
    DownloadOutcome, DownloadStrategy, Notifier, ReportSink, FAILURE_NOTICE,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Report endpoint returned HTTP {0}")]
    Status(u16),
    #[error("Report request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Failed to save report: {0}")]
    Save(#[from] std::io::Error),
    #[error("Failed to open report URL: {0}")]
    Navigate(String),
    #[error("Portal returned unusable data: {0}")]
    Portal(String),
    #[error("Download worker stopped before answering")]
    Interrupted,
}
