use result_charts::download::{
    DirectorySink, DownloadControl, DownloadError, DownloadManager, DownloadOutcome,
    DownloadStrategy, Notifier, ReportRequest, ReportSink, ReportSource, BUSY_LABEL,
    DOWNLOAD_LABEL, FAILURE_NOTICE,
};
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Answers every report request with a fixed HTTP status.
struct StatusSource {
    status: u16,
    calls: AtomicUsize,
}

impl StatusSource {
    fn new(status: u16) -> Self {
        Self {
            status,
            calls: AtomicUsize::new(0),
        }
    }
}

impl ReportSource for StatusSource {
    fn report_url(&self, request: &ReportRequest) -> String {
        format!("http://portal.test{}", request.path())
    }

    fn fetch_report(&self, _request: &ReportRequest) -> Result<Vec<u8>, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if (200..300).contains(&self.status) {
            Ok(b"%PDF-1.7 test".to_vec())
        } else {
            Err(DownloadError::Status(self.status))
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    notices: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.notices.borrow_mut().push(message.to_string());
    }
}

/// A save dialog the user always dismisses.
struct DecliningSink;

impl ReportSink for DecliningSink {
    fn save(&self, _file_name: &str, _bytes: &[u8]) -> io::Result<Option<PathBuf>> {
        Ok(None)
    }
}

struct BrokenSink;

impl ReportSink for BrokenSink {
    fn save(&self, _file_name: &str, _bytes: &[u8]) -> io::Result<Option<PathBuf>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
    }
}

fn poll_until_done(
    manager: &mut DownloadManager,
    control: &mut DownloadControl,
    notifier: &dyn Notifier,
) -> DownloadOutcome {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(outcome) = manager.poll(control, notifier) {
            return outcome;
        }
        assert!(Instant::now() < deadline, "download never finished");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn server_error_restores_control_and_notifies_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(StatusSource::new(500));
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        source.clone(),
        Box::new(DirectorySink::new(dir.path())),
    );
    let mut control = DownloadControl::new("download0", DOWNLOAD_LABEL);
    let notifier = RecordingNotifier::default();

    assert!(manager
        .download_pdf(ReportRequest::new(3, 1042), &mut control)
        .is_none());
    assert_eq!(control.label(), BUSY_LABEL);
    assert!(!control.is_enabled());

    let outcome = poll_until_done(&mut manager, &mut control, &notifier);

    assert!(matches!(outcome, DownloadOutcome::Failed(ref e) if e.contains("500")));
    assert_eq!(control.label(), DOWNLOAD_LABEL);
    assert!(control.is_enabled());
    assert_eq!(*notifier.notices.borrow(), vec![FAILURE_NOTICE.to_string()]);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());

    // Nothing left to report
    assert!(manager.poll(&mut control, &notifier).is_none());
    assert_eq!(notifier.notices.borrow().len(), 1);
}

#[test]
fn successful_download_lands_in_directory() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        Arc::new(StatusSource::new(200)),
        Box::new(DirectorySink::new(dir.path().join("reports"))),
    );
    let mut control = DownloadControl::new("download1", DOWNLOAD_LABEL);
    let notifier = RecordingNotifier::default();

    manager.download_pdf(ReportRequest::new(9, 77), &mut control);
    let outcome = poll_until_done(&mut manager, &mut control, &notifier);

    let expected = dir.path().join("reports").join("Result_77_9.pdf");
    assert_eq!(outcome, DownloadOutcome::Saved(expected.clone()));
    assert_eq!(std::fs::read(&expected).unwrap(), b"%PDF-1.7 test");
    assert!(notifier.notices.borrow().is_empty());
    assert!(control.is_enabled());
}

#[test]
fn declined_save_is_not_a_failure() {
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        Arc::new(StatusSource::new(200)),
        Box::new(DecliningSink),
    );
    let mut control = DownloadControl::new("download2", DOWNLOAD_LABEL);
    let notifier = RecordingNotifier::default();

    manager.download_pdf(ReportRequest::new(1, 1), &mut control);
    let outcome = manager.wait(&mut control, &notifier).unwrap();

    assert_eq!(outcome, DownloadOutcome::Declined);
    assert!(notifier.notices.borrow().is_empty());
    assert_eq!(control.label(), DOWNLOAD_LABEL);
}

#[test]
fn save_error_is_reported_like_fetch_error() {
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        Arc::new(StatusSource::new(200)),
        Box::new(BrokenSink),
    );
    let mut control = DownloadControl::new("download3", DOWNLOAD_LABEL);
    let notifier = RecordingNotifier::default();

    manager.download_pdf(ReportRequest::new(1, 2), &mut control);
    let outcome = manager.wait(&mut control, &notifier).unwrap();

    assert!(matches!(outcome, DownloadOutcome::Failed(_)));
    assert_eq!(notifier.notices.borrow().len(), 1);
    assert!(control.is_enabled());
}

#[test]
fn controls_download_independently() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        Arc::new(StatusSource::new(200)),
        Box::new(DirectorySink::new(dir.path())),
    );
    let mut first = DownloadControl::new("download0", DOWNLOAD_LABEL);
    let mut second = DownloadControl::new("download1", DOWNLOAD_LABEL);
    let notifier = RecordingNotifier::default();

    manager.download_pdf(ReportRequest::new(1, 5), &mut first);
    manager.download_pdf(ReportRequest::new(2, 5), &mut second);
    assert!(manager.is_pending("download0"));
    assert!(manager.is_pending("download1"));

    manager.wait(&mut second, &notifier).unwrap();
    manager.wait(&mut first, &notifier).unwrap();

    assert!(dir.path().join("Result_5_1.pdf").is_file());
    assert!(dir.path().join("Result_5_2.pdf").is_file());
    assert!(!manager.has_pending());
}

#[test]
fn cancel_all_restores_given_controls() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        Arc::new(StatusSource::new(200)),
        Box::new(DirectorySink::new(dir.path())),
    );
    let mut control = DownloadControl::new("download0", DOWNLOAD_LABEL);

    manager.download_pdf(ReportRequest::new(1, 5), &mut control);
    assert!(!control.is_enabled());
    manager.cancel_all([&mut control]);

    assert!(!manager.has_pending());
    assert!(control.is_enabled());
    assert_eq!(control.label(), DOWNLOAD_LABEL);

    thread::sleep(Duration::from_millis(100));
    let notifier = RecordingNotifier::default();
    assert!(manager.poll(&mut control, &notifier).is_none());
    assert!(manager.wait(&mut control, &notifier).is_none());
    assert!(!dir.path().join("Result_5_1.pdf").exists());
}

#[test]
fn cancel_all_without_controls_restores_on_next_poll() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        Arc::new(StatusSource::new(200)),
        Box::new(DirectorySink::new(dir.path())),
    );
    let mut first = DownloadControl::new("download0", DOWNLOAD_LABEL);
    let mut second = DownloadControl::new("download1", DOWNLOAD_LABEL);
    let notifier = RecordingNotifier::default();

    manager.download_pdf(ReportRequest::new(1, 5), &mut first);
    manager.download_pdf(ReportRequest::new(2, 5), &mut second);
    manager.cancel_all(std::iter::empty::<&mut DownloadControl>());
    assert!(!manager.has_pending());
    thread::sleep(Duration::from_millis(100));

    assert_eq!(
        manager.poll(&mut first, &notifier),
        Some(DownloadOutcome::Cancelled)
    );
    assert!(first.is_enabled());
    assert_eq!(first.label(), DOWNLOAD_LABEL);

    assert_eq!(
        manager.wait(&mut second, &notifier),
        Some(DownloadOutcome::Cancelled)
    );
    assert!(second.is_enabled());

    // Reported once, and no failure notice
    assert!(manager.poll(&mut first, &notifier).is_none());
    assert!(notifier.notices.borrow().is_empty());
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn new_download_clears_cancelled_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = DownloadManager::new(
        DownloadStrategy::FetchAndSave,
        Arc::new(StatusSource::new(200)),
        Box::new(DirectorySink::new(dir.path())),
    );
    let mut control = DownloadControl::new("download0", DOWNLOAD_LABEL);
    let notifier = RecordingNotifier::default();

    manager.download_pdf(ReportRequest::new(1, 5), &mut control);
    manager.cancel_all(std::iter::empty::<&mut DownloadControl>());
    manager.download_pdf(ReportRequest::new(1, 5), &mut control);

    let outcome = manager.wait(&mut control, &notifier).unwrap();
    assert!(matches!(outcome, DownloadOutcome::Saved(_)));
    assert!(control.is_enabled());
}
