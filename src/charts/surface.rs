//! Chart Surface
//! The seam between the renderer and whatever actually draws charts.

use crate::charts::ChartSpec;
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write chart '{anchor}': {source}")]
    Io {
        anchor: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Chart backend failed for '{anchor}': {message}")]
    Backend { anchor: String, message: String },
}

impl RenderError {
    pub fn backend(anchor: &str, err: impl Display) -> Self {
        RenderError::Backend {
            anchor: anchor.to_string(),
            message: err.to_string(),
        }
    }

    pub fn io(anchor: &str, source: std::io::Error) -> Self {
        RenderError::Io {
            anchor: anchor.to_string(),
            source,
        }
    }
}

/// A set of named anchors that can each hold one chart or one placeholder.
pub trait ChartSurface {
    /// Draw `spec` into `anchor`. The renderer guarantees the anchor holds no
    /// live chart when this is called.
    fn create_chart(&mut self, anchor: &str, spec: &ChartSpec) -> Result<(), RenderError>;

    /// Tear down the chart bound to `anchor`.
    fn destroy_chart(&mut self, anchor: &str);

    /// Replace the anchor's content with a "no data" message.
    fn show_placeholder(&mut self, anchor: &str, message: &str) -> Result<(), RenderError>;
}
