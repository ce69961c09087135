//! Result Charts - Student Result Visualization & Report Download
//!
//! Turns per-student result payloads into subject, exam-type and pass/fail
//! charts, and downloads the PDF report of a result launch.

pub mod charts;
pub mod config;
pub mod data;
pub mod download;
pub mod gui;
