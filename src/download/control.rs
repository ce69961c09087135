//! Download Control
//! State of the button that triggers a report download.

pub const DOWNLOAD_LABEL: &str = "📄 Download PDF";
pub const BUSY_LABEL: &str = "⏳ Generating PDF...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadControl {
    id: String,
    label: String,
    original_label: Option<String>,
    enabled: bool,
}

impl DownloadControl {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            original_label: None,
            enabled: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_busy(&self) -> bool {
        self.original_label.is_some()
    }

    /// Disable the control and show `busy_label`, remembering the idle label.
    pub fn begin_busy(&mut self, busy_label: &str) {
        if self.original_label.is_none() {
            self.original_label = Some(std::mem::replace(&mut self.label, busy_label.to_string()));
        } else {
            self.label = busy_label.to_string();
        }
        self.enabled = false;
    }

    /// Put back the idle label and re-enable.
    pub fn restore(&mut self) {
        if let Some(label) = self.original_label.take() {
            self.label = label;
        }
        self.enabled = true;
    }
}
