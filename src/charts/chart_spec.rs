//! Chart Description Module
//! Backend-neutral description of a chart: kind, labels, datasets, colors and
//! the tooltip text of every data point.

use crate::data::{ExamTypeSeries, PassFailCounts, SubjectSeries, SUBJECT_MAX_MARKS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ChartColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn alpha(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

pub const OBTAINED_FILL: ChartColor = ChartColor::new(102, 126, 234, 204);
pub const OBTAINED_BORDER: ChartColor = ChartColor::new(102, 126, 234, 255);
pub const MAX_FILL: ChartColor = ChartColor::new(200, 200, 200, 77);
pub const MAX_BORDER: ChartColor = ChartColor::new(200, 200, 200, 128);
pub const PASSED_FILL: ChartColor = ChartColor::new(76, 175, 80, 204);
pub const FAILED_FILL: ChartColor = ChartColor::new(244, 67, 54, 204);
pub const SLICE_BORDER: ChartColor = ChartColor::new(255, 255, 255, 255);
pub const PLACEHOLDER_TEXT: ChartColor = ChartColor::new(102, 102, 102, 255);

/// Exam-type slice colors, reused cyclically.
pub const EXAM_PALETTE: [ChartColor; 7] = [
    ChartColor::new(102, 126, 234, 204),
    ChartColor::new(118, 75, 162, 204),
    ChartColor::new(237, 100, 166, 204),
    ChartColor::new(255, 154, 158, 204),
    ChartColor::new(250, 208, 196, 204),
    ChartColor::new(99, 205, 218, 204),
    ChartColor::new(205, 220, 57, 204),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Doughnut,
    Pie,
}

impl ChartKind {
    pub fn is_circular(&self) -> bool {
        matches!(self, ChartKind::Doughnut | ChartKind::Pie)
    }
}

/// How exam-type slices describe themselves on hover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamTooltip {
    /// `Midterm: 40.00 marks (47.1%)`
    #[default]
    ValueAndPercent,
    /// `Midterm: 40 marks`
    ValueOnly,
}

/// Whether zero-count pass/fail categories stay in the chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassFailLegend {
    #[default]
    AlwaysShow,
    HideZero,
}

/// Presentation choices that differ between result pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub exam_tooltip: ExamTooltip,
    pub pass_fail_legend: PassFailLegend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
    /// One color for the whole dataset, or one per data point.
    pub colors: Vec<ChartColor>,
    pub border: ChartColor,
    pub tooltips: Vec<String>,
}

impl Dataset {
    pub fn color_at(&self, index: usize) -> ChartColor {
        if self.colors.is_empty() {
            OBTAINED_FILL
        } else {
            self.colors[index % self.colors.len()]
        }
    }

    pub fn tooltip_at(&self, index: usize) -> &str {
        self.tooltips.get(index).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub y_max: Option<f64>,
}

impl ChartSpec {
    /// Obtained vs. maximum marks per subject.
    pub fn subject_performance(series: &SubjectSeries) -> Self {
        let obtained_tips = series
            .totals
            .iter()
            .zip(series.grades.iter())
            .map(|(total, grade)| format!("Obtained: {:.0}/100 ({})", total, grade))
            .collect();
        let max_tips = series
            .maxima
            .iter()
            .map(|max| format!("Max: {}", max))
            .collect();

        Self {
            kind: ChartKind::Bar,
            title: "Subject-wise Performance".to_string(),
            labels: series.names.clone(),
            datasets: vec![
                Dataset {
                    label: "Obtained".to_string(),
                    values: series.totals.clone(),
                    colors: vec![OBTAINED_FILL],
                    border: OBTAINED_BORDER,
                    tooltips: obtained_tips,
                },
                Dataset {
                    label: format!("Max ({})", SUBJECT_MAX_MARKS),
                    values: series.maxima.clone(),
                    colors: vec![MAX_FILL],
                    border: MAX_BORDER,
                    tooltips: max_tips,
                },
            ],
            x_title: Some("Subjects".to_string()),
            y_title: Some("Marks".to_string()),
            y_max: Some(series.value_ceiling()),
        }
    }

    /// Doughnut of summed marks per exam type.
    pub fn exam_distribution(series: &ExamTypeSeries, tooltip: ExamTooltip) -> Self {
        let total = series.total();
        let tooltips = series
            .iter()
            .map(|(name, value)| match tooltip {
                ExamTooltip::ValueAndPercent => format!(
                    "{}: {:.2} marks ({:.1}%)",
                    name,
                    value,
                    percentage(value, total)
                ),
                ExamTooltip::ValueOnly => format!("{}: {:.0} marks", name, value),
            })
            .collect();

        Self {
            kind: ChartKind::Doughnut,
            title: "Marks Distribution by Exam Type".to_string(),
            labels: series.names(),
            datasets: vec![Dataset {
                label: "Marks".to_string(),
                values: series.values(),
                colors: EXAM_PALETTE.to_vec(),
                border: SLICE_BORDER,
                tooltips,
            }],
            x_title: None,
            y_title: None,
            y_max: None,
        }
    }

    /// Pie of passed vs. failed subjects.
    pub fn pass_fail(counts: &PassFailCounts, legend: PassFailLegend) -> Self {
        let total = counts.total();
        let categories = [
            ("Passed", counts.passed, PASSED_FILL),
            ("Failed", counts.failed, FAILED_FILL),
        ];

        let mut labels = Vec::new();
        let mut values = Vec::new();
        let mut colors = Vec::new();
        let mut tooltips = Vec::new();
        for (label, count, color) in categories {
            if legend == PassFailLegend::HideZero && count == 0 {
                continue;
            }
            labels.push(label.to_string());
            values.push(count as f64);
            colors.push(color);
            tooltips.push(format!(
                "{}: {} subject{} ({:.1}%)",
                label,
                count,
                if count == 1 { "" } else { "s" },
                percentage(count as f64, total as f64)
            ));
        }

        Self {
            kind: ChartKind::Pie,
            title: format!("Pass/Fail Overview ({}/{} Passed)", counts.passed, total),
            labels,
            datasets: vec![Dataset {
                label: "Subjects".to_string(),
                values,
                colors,
                border: SLICE_BORDER,
                tooltips,
            }],
            x_title: None,
            y_title: None,
            y_max: None,
        }
    }

    /// Legend rows: dataset labels for bars, category labels for slices.
    pub fn legend_entries(&self) -> Vec<(String, ChartColor)> {
        if self.kind.is_circular() {
            let Some(dataset) = self.datasets.first() else {
                return Vec::new();
            };
            self.labels
                .iter()
                .enumerate()
                .map(|(i, label)| (label.clone(), dataset.color_at(i)))
                .collect()
        } else {
            self.datasets
                .iter()
                .map(|d| (d.label.clone(), d.color_at(0)))
                .collect()
        }
    }
}

fn percentage(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total * 100.0
    } else {
        0.0
    }
}

/// Start/end angles (degrees, clockwise from 12 o'clock) of each slice.
pub fn slice_angles(values: &[f64]) -> Vec<(f64, f64)> {
    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    let mut start = 0.0;
    values
        .iter()
        .map(|&v| {
            let sweep = if total > 0.0 && v > 0.0 {
                v / total * 360.0
            } else {
                0.0
            };
            let span = (start, start + sweep);
            start += sweep;
            span
        })
        .collect()
}

/// Index of the slice under a clockwise angle, if any.
pub fn slice_at(values: &[f64], clockwise_degrees: f64) -> Option<usize> {
    let angle = clockwise_degrees.rem_euclid(360.0);
    slice_angles(values)
        .iter()
        .position(|&(start, end)| end > start && angle >= start && angle < end)
}
