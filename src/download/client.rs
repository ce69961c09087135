//! Portal Client
//! Blocking HTTP client for the result portal's report and result endpoints.

use crate::data::{PortalEnvelope, ResultCard, ResultLoader};
use crate::download::DownloadError;
use reqwest::blocking::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

/// Identifies one student's report for one result launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportRequest {
    pub launch_id: i64,
    pub student_id: i64,
}

impl ReportRequest {
    pub fn new(launch_id: i64, student_id: i64) -> Self {
        Self {
            launch_id,
            student_id,
        }
    }

    pub fn path(&self) -> String {
        format!("/api/download-pdf/{}/{}", self.launch_id, self.student_id)
    }

    /// `Result_<studentId>_<launchId>.pdf`
    pub fn file_name(&self) -> String {
        format!("Result_{}_{}.pdf", self.student_id, self.launch_id)
    }
}

/// Anything that can produce the PDF bytes of a report.
pub trait ReportSource: Send + Sync {
    fn report_url(&self, request: &ReportRequest) -> String;

    fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<u8>, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct PortalClient {
    client: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DownloadError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All active launched results of a student.
    pub fn launched_results(&self, student_id: i64) -> Result<Vec<ResultCard>, DownloadError> {
        let url = format!("{}/api/launched-results/{}", self.base_url, student_id);
        debug!(%url, "fetching launched results");

        let response = Self::check_status(self.client.get(&url).send()?)?;
        let body: serde_json::Value = response.json()?;
        let mut cards = ResultLoader::cards_from_value(body)
            .map_err(|e| DownloadError::Portal(e.to_string()))?;
        for card in &mut cards {
            card.student_id.get_or_insert(student_id);
        }
        info!(student_id, cards = cards.len(), "fetched launched results");
        Ok(cards)
    }

    /// Pass successful responses through; otherwise surface the portal's own
    /// `{"success": false, "error": ...}` message when the body carries one.
    fn check_status(response: Response) -> Result<Response, DownloadError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(status_error(status.as_u16(), &body))
    }
}

fn status_error(status: u16, body: &str) -> DownloadError {
    match serde_json::from_str::<PortalEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
    {
        Some(message) => DownloadError::Portal(format!("HTTP {}: {}", status, message)),
        None => DownloadError::Status(status),
    }
}

impl ReportSource for PortalClient {
    fn report_url(&self, request: &ReportRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }

    fn fetch_report(&self, request: &ReportRequest) -> Result<Vec<u8>, DownloadError> {
        let url = self.report_url(request);
        debug!(%url, "requesting report");

        let response = Self::check_status(self.client.get(&url).send()?)?;
        Ok(response.bytes()?.to_vec())
    }
}
