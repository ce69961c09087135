//! Download Manager
//! Runs report downloads for download controls, one live request per control.
//!
//! Fetch-and-save requests run on a background thread and report back through
//! a channel; the caller polls every frame and the save happens on the
//! polling thread so file dialogs stay on the UI thread.

use crate::download::{
    DownloadControl, DownloadError, ReportRequest, ReportSource, BUSY_LABEL,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info, warn};

pub const FAILURE_NOTICE: &str = "Failed to download PDF. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStrategy {
    /// Fetch the PDF, then save it under `Result_<student>_<launch>.pdf`.
    #[default]
    FetchAndSave,
    /// Hand the report URL to the system browser.
    Navigate,
}

/// Where fetched reports end up.
pub trait ReportSink {
    /// Save the report; `Ok(None)` means the user declined to pick a location.
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<Option<PathBuf>>;
}

/// Saves every report into one directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<Option<PathBuf>> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(Some(path))
    }
}

/// Asks for a location with a native save dialog.
pub struct DialogSink;

impl ReportSink for DialogSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<Option<PathBuf>> {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PDF", &["pdf"])
            .set_file_name(file_name)
            .save_file()
        else {
            return Ok(None);
        };
        std::fs::write(&path, bytes)?;
        Ok(Some(path))
    }
}

/// Shows failure notices to the user.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Blocking native message box.
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn notify(&self, message: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("Download failed")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

/// Prints notices to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    /// The user dismissed the save dialog.
    Declined,
    /// The report URL was handed to the browser.
    Opened(String),
    /// The request was superseded before it answered.
    Cancelled,
    Failed(String),
}

struct PendingDownload {
    request: ReportRequest,
    cancelled: Arc<AtomicBool>,
    rx: Receiver<Result<Vec<u8>, DownloadError>>,
}

pub struct DownloadManager {
    strategy: DownloadStrategy,
    source: Arc<dyn ReportSource>,
    sink: Box<dyn ReportSink>,
    in_flight: HashMap<String, PendingDownload>,
    /// Controls whose request was cancelled without the control at hand.
    cancelled: HashSet<String>,
}

impl DownloadManager {
    pub fn new(
        strategy: DownloadStrategy,
        source: Arc<dyn ReportSource>,
        sink: Box<dyn ReportSink>,
    ) -> Self {
        Self {
            strategy,
            source,
            sink,
            in_flight: HashMap::new(),
            cancelled: HashSet::new(),
        }
    }

    pub fn strategy(&self) -> DownloadStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: DownloadStrategy) {
        self.strategy = strategy;
    }

    pub fn set_sink(&mut self, sink: Box<dyn ReportSink>) {
        self.sink = sink;
    }

    pub fn has_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    pub fn is_pending(&self, control_id: &str) -> bool {
        self.in_flight.contains_key(control_id)
    }

    /// Drop every in-flight request; late responses are discarded.
    ///
    /// The given controls are restored right away. Any other busy control is
    /// restored by its next [`poll`](Self::poll) or [`wait`](Self::wait),
    /// which reports [`DownloadOutcome::Cancelled`].
    pub fn cancel_all<'a>(&mut self, controls: impl IntoIterator<Item = &'a mut DownloadControl>) {
        for control in controls {
            if let Some(pending) = self.in_flight.remove(control.id()) {
                Self::cancel(control.id(), pending);
                control.restore();
            }
        }
        for (id, pending) in self.in_flight.drain() {
            Self::cancel(&id, pending);
            self.cancelled.insert(id);
        }
    }

    fn cancel(control_id: &str, pending: PendingDownload) {
        pending.cancelled.store(true, Ordering::SeqCst);
        debug!(
            control = control_id,
            launch_id = pending.request.launch_id,
            "download cancelled"
        );
    }

    /// Restore a control whose request was cancelled behind its back.
    fn take_cancelled(&mut self, control: &mut DownloadControl) -> Option<DownloadOutcome> {
        if !self.cancelled.remove(control.id()) || !control.is_busy() {
            return None;
        }
        control.restore();
        Some(DownloadOutcome::Cancelled)
    }

    /// Start a download triggered by `control`.
    ///
    /// Navigation finishes immediately and returns its outcome. Fetch-and-save
    /// marks the control busy and returns `None`; the outcome arrives through
    /// [`poll`](Self::poll) or [`wait`](Self::wait). Triggering a control that
    /// already has a request in flight cancels the earlier request.
    pub fn download_pdf(
        &mut self,
        request: ReportRequest,
        control: &mut DownloadControl,
    ) -> Option<DownloadOutcome> {
        match self.strategy {
            DownloadStrategy::Navigate => Some(self.navigate(&request)),
            DownloadStrategy::FetchAndSave => {
                self.start_fetch(request, control);
                None
            }
        }
    }

    fn navigate(&self, request: &ReportRequest) -> DownloadOutcome {
        let url = self.source.report_url(request);
        match open::that(&url) {
            Ok(()) => {
                info!(%url, "opened report in browser");
                DownloadOutcome::Opened(url)
            }
            Err(e) => {
                let err = DownloadError::Navigate(e.to_string());
                error!(%url, error = %err, "failed to open report");
                DownloadOutcome::Failed(err.to_string())
            }
        }
    }

    fn start_fetch(&mut self, request: ReportRequest, control: &mut DownloadControl) {
        self.cancelled.remove(control.id());
        if let Some(previous) = self.in_flight.remove(control.id()) {
            previous.cancelled.store(true, Ordering::SeqCst);
            warn!(
                control = control.id(),
                launch_id = previous.request.launch_id,
                "cancelling earlier download"
            );
        }

        control.begin_busy(BUSY_LABEL);
        info!(
            control = control.id(),
            launch_id = request.launch_id,
            student_id = request.student_id,
            "downloading report"
        );

        let (tx, rx) = channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let source = Arc::clone(&self.source);
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || {
            let result = source.fetch_report(&request);
            if !flag.load(Ordering::SeqCst) {
                let _ = tx.send(result);
            }
        });

        self.in_flight.insert(
            control.id().to_string(),
            PendingDownload {
                request,
                cancelled,
                rx,
            },
        );
    }

    /// Finish the control's download if its response has arrived.
    pub fn poll(
        &mut self,
        control: &mut DownloadControl,
        notifier: &dyn Notifier,
    ) -> Option<DownloadOutcome> {
        if let Some(outcome) = self.take_cancelled(control) {
            return Some(outcome);
        }
        let result = match self.in_flight.get(control.id())?.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(DownloadError::Interrupted),
        };
        let pending = self.in_flight.remove(control.id())?;
        Some(self.finish(pending.request, result, control, notifier))
    }

    /// Block until the control's download finishes.
    pub fn wait(
        &mut self,
        control: &mut DownloadControl,
        notifier: &dyn Notifier,
    ) -> Option<DownloadOutcome> {
        if let Some(outcome) = self.take_cancelled(control) {
            return Some(outcome);
        }
        let pending = self.in_flight.remove(control.id())?;
        let result = pending.rx.recv().unwrap_or(Err(DownloadError::Interrupted));
        Some(self.finish(pending.request, result, control, notifier))
    }

    fn finish(
        &self,
        request: ReportRequest,
        result: Result<Vec<u8>, DownloadError>,
        control: &mut DownloadControl,
        notifier: &dyn Notifier,
    ) -> DownloadOutcome {
        let saved = result.and_then(|bytes| {
            self.sink
                .save(&request.file_name(), &bytes)
                .map_err(DownloadError::from)
        });
        control.restore();

        match saved {
            Ok(Some(path)) => {
                info!(path = %path.display(), "saved report");
                DownloadOutcome::Saved(path)
            }
            Ok(None) => {
                info!(launch_id = request.launch_id, "save declined");
                DownloadOutcome::Declined
            }
            Err(err) => {
                error!(
                    launch_id = request.launch_id,
                    student_id = request.student_id,
                    error = %err,
                    "report download failed"
                );
                notifier.notify(FAILURE_NOTICE);
                DownloadOutcome::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DOWNLOAD_LABEL;
    use std::cell::RefCell;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FixedSource(Result<Vec<u8>, u16>);

    impl ReportSource for FixedSource {
        fn report_url(&self, request: &ReportRequest) -> String {
            format!("http://portal.test{}", request.path())
        }

        fn fetch_report(&self, _request: &ReportRequest) -> Result<Vec<u8>, DownloadError> {
            self.0.clone().map_err(DownloadError::Status)
        }
    }

    /// Returns its bodies in order, the first one after a delay.
    struct SlowThenFast {
        calls: Mutex<usize>,
    }

    impl ReportSource for SlowThenFast {
        fn report_url(&self, request: &ReportRequest) -> String {
            request.path()
        }

        fn fetch_report(&self, _request: &ReportRequest) -> Result<Vec<u8>, DownloadError> {
            let call = {
                let mut calls = self.calls.lock().unwrap();
                *calls += 1;
                *calls
            };
            if call == 1 {
                thread::sleep(Duration::from_millis(200));
                Ok(b"first".to_vec())
            } else {
                Ok(b"second".to_vec())
            }
        }
    }

    #[derive(Default)]
    struct Notices(RefCell<Vec<String>>);

    impl Notifier for Notices {
        fn notify(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    #[test]
    fn test_fetch_and_save_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DownloadManager::new(
            DownloadStrategy::FetchAndSave,
            Arc::new(FixedSource(Ok(b"%PDF-1.4".to_vec()))),
            Box::new(DirectorySink::new(dir.path())),
        );
        let mut control = DownloadControl::new("card-0", DOWNLOAD_LABEL);
        let notices = Notices::default();

        assert_eq!(manager.download_pdf(ReportRequest::new(5, 77), &mut control), None);
        assert_eq!(control.label(), BUSY_LABEL);
        assert!(!control.is_enabled());
        assert!(manager.is_pending("card-0"));

        let outcome = manager.wait(&mut control, &notices).unwrap();
        let expected = dir.path().join("Result_77_5.pdf");
        assert_eq!(outcome, DownloadOutcome::Saved(expected.clone()));
        assert_eq!(std::fs::read(expected).unwrap(), b"%PDF-1.4");
        assert_eq!(control.label(), DOWNLOAD_LABEL);
        assert!(control.is_enabled());
        assert!(notices.0.borrow().is_empty());
        assert!(!manager.has_pending());
    }

    #[test]
    fn test_retrigger_cancels_earlier_request() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = DownloadManager::new(
            DownloadStrategy::FetchAndSave,
            Arc::new(SlowThenFast {
                calls: Mutex::new(0),
            }),
            Box::new(DirectorySink::new(dir.path())),
        );
        let mut control = DownloadControl::new("card-3", DOWNLOAD_LABEL);
        let notices = Notices::default();

        manager.download_pdf(ReportRequest::new(1, 2), &mut control);
        thread::sleep(Duration::from_millis(20));
        manager.download_pdf(ReportRequest::new(1, 2), &mut control);

        let outcome = manager.wait(&mut control, &notices).unwrap();
        assert!(matches!(outcome, DownloadOutcome::Saved(_)));
        assert_eq!(
            std::fs::read(dir.path().join("Result_2_1.pdf")).unwrap(),
            b"second"
        );
        assert_eq!(control.label(), DOWNLOAD_LABEL);
        assert!(manager.wait(&mut control, &notices).is_none());
    }

    #[test]
    fn test_poll_without_request_is_none() {
        let mut manager = DownloadManager::new(
            DownloadStrategy::FetchAndSave,
            Arc::new(FixedSource(Err(404))),
            Box::new(DirectorySink::new("unused")),
        );
        let mut control = DownloadControl::new("idle", DOWNLOAD_LABEL);
        assert!(manager.poll(&mut control, &Notices::default()).is_none());
    }
}
