//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::ResultChartsApp;
pub use chart_viewer::{CardView, ChartViewer};
pub use control_panel::{ControlPanel, ControlPanelAction};
