//! Chart Renderer
//! Binds aggregated result data to the anchors of a chart surface.
//!
//! Each result card owns three anchors:
//! - `subjectChart<index>`: obtained vs. maximum marks per subject
//! - `examTypeChart<index>`: marks distribution by exam type
//! - `passFailChart<index>`: passed vs. failed subjects
//!
//! Any chart already bound to an anchor is destroyed before the anchor is
//! redrawn, so rendering the same card twice never leaves a stale chart.

use crate::charts::{ChartOptions, ChartSpec, ChartSurface, RenderError};
use crate::data::{ExamTypeSeries, PassFailCounts, ResultAggregator, ResultData, SubjectSeries};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const NO_SUBJECT_DATA: &str = "No subject data available";
pub const NO_EXAM_TYPE_DATA: &str = "No exam type data available";
pub const NO_EXAM_MARKS: &str = "No exam marks available";
pub const NO_PASS_FAIL_DATA: &str = "No pass/fail data available";

pub fn subject_anchor(index: usize) -> String {
    format!("subjectChart{}", index)
}

pub fn exam_type_anchor(index: usize) -> String {
    format!("examTypeChart{}", index)
}

pub fn pass_fail_anchor(index: usize) -> String {
    format!("passFailChart{}", index)
}

/// The three anchors of a card, in drawing order.
pub fn card_anchors(index: usize) -> [String; 3] {
    [
        subject_anchor(index),
        exam_type_anchor(index),
        pass_fail_anchor(index),
    ]
}

pub struct ChartRenderer<S: ChartSurface> {
    surface: S,
    options: ChartOptions,
    live: HashSet<String>,
}

impl<S: ChartSurface> ChartRenderer<S> {
    pub fn new(surface: S, options: ChartOptions) -> Self {
        Self {
            surface,
            options,
            live: HashSet::new(),
        }
    }

    pub fn options(&self) -> ChartOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ChartOptions) {
        self.options = options;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Whether a chart (not a placeholder) is currently bound to `anchor`.
    pub fn has_chart(&self, anchor: &str) -> bool {
        self.live.contains(anchor)
    }

    pub fn live_chart_count(&self) -> usize {
        self.live.len()
    }

    /// Render all three charts of the card at `index`.
    ///
    /// A failing anchor does not stop the others; the first error is returned
    /// once every anchor has been attempted.
    pub fn initialize_charts(&mut self, index: usize, result: &ResultData) -> Result<(), RenderError> {
        let subjects = &result.subjects;
        debug!(index, subjects = subjects.len(), "initializing card charts");

        let series = ResultAggregator::compute_subject_series(subjects);
        let subject = self.render_subject_chart(&subject_anchor(index), &series);

        let exam_anchor = exam_type_anchor(index);
        let exam = if subjects.is_empty() {
            self.bind_placeholder(&exam_anchor, NO_EXAM_TYPE_DATA)
        } else {
            let exams = ResultAggregator::compute_exam_type_series(subjects);
            self.render_exam_type_chart(&exam_anchor, &exams)
        };

        let counts = ResultAggregator::compute_pass_fail(subjects);
        let pass_fail = self.render_pass_fail_chart(&pass_fail_anchor(index), &counts);

        for outcome in [&subject, &exam, &pass_fail] {
            if let Err(e) = outcome {
                warn!(index, error = %e, "chart failed to render");
            }
        }
        subject.and(exam).and(pass_fail)
    }

    pub fn render_subject_chart(
        &mut self,
        anchor: &str,
        series: &SubjectSeries,
    ) -> Result<(), RenderError> {
        if series.is_empty() {
            return self.bind_placeholder(anchor, NO_SUBJECT_DATA);
        }
        self.bind_chart(anchor, ChartSpec::subject_performance(series))
    }

    pub fn render_exam_type_chart(
        &mut self,
        anchor: &str,
        series: &ExamTypeSeries,
    ) -> Result<(), RenderError> {
        // Hand-built series may still sum to zero
        if series.is_empty() || series.total() <= 0.0 {
            return self.bind_placeholder(anchor, NO_EXAM_MARKS);
        }
        self.bind_chart(
            anchor,
            ChartSpec::exam_distribution(series, self.options.exam_tooltip),
        )
    }

    pub fn render_pass_fail_chart(
        &mut self,
        anchor: &str,
        counts: &PassFailCounts,
    ) -> Result<(), RenderError> {
        if counts.is_empty() {
            return self.bind_placeholder(anchor, NO_PASS_FAIL_DATA);
        }
        self.bind_chart(
            anchor,
            ChartSpec::pass_fail(counts, self.options.pass_fail_legend),
        )
    }

    /// Destroy every live chart.
    pub fn clear(&mut self) {
        for anchor in std::mem::take(&mut self.live) {
            self.surface.destroy_chart(&anchor);
        }
    }

    fn bind_chart(&mut self, anchor: &str, spec: ChartSpec) -> Result<(), RenderError> {
        self.release(anchor);
        debug!(anchor, kind = ?spec.kind, "creating chart");
        self.surface.create_chart(anchor, &spec)?;
        self.live.insert(anchor.to_string());
        Ok(())
    }

    fn bind_placeholder(&mut self, anchor: &str, message: &str) -> Result<(), RenderError> {
        self.release(anchor);
        debug!(anchor, text = message, "showing placeholder");
        self.surface.show_placeholder(anchor, message)
    }

    fn release(&mut self, anchor: &str) {
        if self.live.remove(anchor) {
            self.surface.destroy_chart(anchor);
        }
    }
}
