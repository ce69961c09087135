//! Data module - result payload loading and aggregation

mod aggregator;
mod loader;
mod model;

pub use aggregator::{
    ExamTypeSeries, PassFailCounts, ResultAggregator, SubjectSeries, SUBJECT_MAX_MARKS,
};
pub use loader::{LoaderError, ResultLoader};
pub use model::{
    coerce_number, parse_leading_float, ExamScore, LaunchedResult, Overall, PortalEnvelope,
    ResultCard, ResultData, StudentInfo, Subject, NO_GRADE, UNKNOWN_LABEL,
};
