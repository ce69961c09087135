//! Charts module - Chart descriptions, rendering and drawing backends

mod chart_spec;
mod export;
mod plotter;
mod renderer;
mod surface;

pub use chart_spec::{
    slice_angles, slice_at, ChartColor, ChartKind, ChartOptions, ChartSpec, Dataset, ExamTooltip,
    PassFailLegend, EXAM_PALETTE,
};
pub use export::{export_cards, SvgExporter};
pub use plotter::{to_color32, AnchorContent, ChartBoard, ChartPlotter};
pub use renderer::{
    card_anchors, exam_type_anchor, pass_fail_anchor, subject_anchor, ChartRenderer,
    NO_EXAM_MARKS, NO_EXAM_TYPE_DATA, NO_PASS_FAIL_DATA, NO_SUBJECT_DATA,
};
pub use surface::{ChartSurface, RenderError};
