//! Result Aggregator Module
//! Turns subject records into the three chart-ready datasets.

use crate::data::model::Subject;
use indexmap::IndexMap;

/// Every subject is scored out of 100.
pub const SUBJECT_MAX_MARKS: f64 = 100.0;

/// Parallel per-subject arrays for the performance bar chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectSeries {
    pub names: Vec<String>,
    pub totals: Vec<f64>,
    pub grades: Vec<String>,
    pub maxima: Vec<f64>,
}

impl SubjectSeries {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Largest weighted total, never below the per-subject maximum.
    pub fn value_ceiling(&self) -> f64 {
        self.totals
            .iter()
            .copied()
            .fold(SUBJECT_MAX_MARKS, f64::max)
    }
}

/// Summed marks per exam type, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExamTypeSeries {
    sums: IndexMap<String, f64>,
}

impl ExamTypeSeries {
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    pub fn get(&self, exam_name: &str) -> Option<f64> {
        self.sums.get(exam_name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.sums.iter().map(|(name, sum)| (name.as_str(), *sum))
    }

    pub fn names(&self) -> Vec<String> {
        self.sums.keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.sums.values().copied().collect()
    }

    pub fn total(&self) -> f64 {
        self.sums.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassFailCounts {
    pub passed: usize,
    pub failed: usize,
}

impl PassFailCounts {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Aggregation over a result's subjects. Never fails: malformed fields were
/// already coerced to neutral values when the payload was read.
pub struct ResultAggregator;

impl ResultAggregator {
    /// One entry per subject: name, weighted total, grade, fixed maximum.
    pub fn compute_subject_series(subjects: &[Subject]) -> SubjectSeries {
        let mut series = SubjectSeries {
            names: Vec::with_capacity(subjects.len()),
            totals: Vec::with_capacity(subjects.len()),
            grades: Vec::with_capacity(subjects.len()),
            maxima: Vec::with_capacity(subjects.len()),
        };

        for subject in subjects {
            let total = if subject.weighted_total.is_finite() {
                subject.weighted_total
            } else {
                0.0
            };
            series.names.push(subject.display_name().to_string());
            series.totals.push(total);
            series.grades.push(subject.display_grade().to_string());
            series.maxima.push(SUBJECT_MAX_MARKS);
        }

        series
    }

    /// Sum obtained marks by exam name across all subjects, dropping any
    /// exam type whose sum is not positive.
    pub fn compute_exam_type_series(subjects: &[Subject]) -> ExamTypeSeries {
        let mut sums: IndexMap<String, f64> = IndexMap::new();

        for exam in subjects.iter().flat_map(|s| s.exam_types.iter()) {
            let obtained = if exam.obtained.is_finite() {
                exam.obtained
            } else {
                0.0
            };
            *sums.entry(exam.display_name().to_string()).or_insert(0.0) += obtained;
        }

        sums.retain(|_, sum| *sum > 0.0);
        ExamTypeSeries { sums }
    }

    pub fn compute_pass_fail(subjects: &[Subject]) -> PassFailCounts {
        let passed = subjects.iter().filter(|s| s.passed).count();
        PassFailCounts {
            passed,
            failed: subjects.len() - passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ResultData;
    use serde_json::json;

    fn subjects(value: serde_json::Value) -> Vec<Subject> {
        serde_json::from_value::<ResultData>(json!({ "subjects": value }))
            .unwrap()
            .subjects
    }

    #[test]
    fn test_reference_scenario() {
        let subjects = subjects(json!([{
            "subject_name": "Math",
            "weighted_total": "85",
            "grade": "A",
            "passed": true,
            "exam_types": [
                { "exam_name": "Midterm", "obtained": "40" },
                { "exam_name": "Final", "obtained": "45" }
            ]
        }]));

        let series = ResultAggregator::compute_subject_series(&subjects);
        assert_eq!(series.names, vec!["Math"]);
        assert_eq!(series.totals, vec![85.0]);
        assert_eq!(series.grades, vec!["A"]);
        assert_eq!(series.maxima, vec![100.0]);

        let exams = ResultAggregator::compute_exam_type_series(&subjects);
        assert_eq!(exams.names(), vec!["Midterm", "Final"]);
        assert_eq!(exams.values(), vec![40.0, 45.0]);

        let counts = ResultAggregator::compute_pass_fail(&subjects);
        assert_eq!(counts, PassFailCounts { passed: 1, failed: 0 });
    }

    #[test]
    fn test_subject_series_defaults() {
        let subjects = subjects(json!([
            { "weighted_total": "abc" },
            { "subject_name": "Chemistry" },
            { "subject_name": "Biology", "weighted_total": 104.5, "grade": "A+" }
        ]));

        let series = ResultAggregator::compute_subject_series(&subjects);
        assert_eq!(series.len(), 3);
        assert_eq!(series.names, vec!["Unknown", "Chemistry", "Biology"]);
        assert_eq!(series.totals, vec![0.0, 0.0, 104.5]);
        assert_eq!(series.grades, vec!["N/A", "N/A", "A+"]);
        assert_eq!(series.value_ceiling(), 104.5);
    }

    #[test]
    fn test_exam_types_sum_across_subjects_and_drop_non_positive() {
        let subjects = subjects(json!([
            { "exam_types": [
                { "exam_name": "Quiz", "obtained": 0 },
                { "exam_name": "Lab", "obtained": "12.5" },
                { "obtained": 3 }
            ]},
            { "exam_types": [
                { "exam_name": "Lab", "obtained": 7.5 },
                { "exam_name": "Quiz", "obtained": "x" },
                { "exam_name": "Penalty", "obtained": -4 }
            ]}
        ]));

        let exams = ResultAggregator::compute_exam_type_series(&subjects);
        assert_eq!(exams.names(), vec!["Lab", "Unknown"]);
        assert_eq!(exams.get("Lab"), Some(20.0));
        assert_eq!(exams.get("Unknown"), Some(3.0));
        assert_eq!(exams.get("Quiz"), None);
        assert_eq!(exams.get("Penalty"), None);
        assert!(exams.iter().all(|(_, sum)| sum > 0.0));
        assert_eq!(exams.total(), 23.0);
    }

    #[test]
    fn test_pass_fail_accepts_bool_and_true_string_only() {
        let subjects = subjects(json!([
            { "passed": true },
            { "passed": "true" },
            { "passed": "True" },
            { "passed": 1 },
            { "passed": false },
            {}
        ]));

        let counts = ResultAggregator::compute_pass_fail(&subjects);
        assert_eq!(counts.passed, 2);
        assert_eq!(counts.failed, 4);
        assert_eq!(counts.total(), subjects.len());
    }

    #[test]
    fn test_empty_subjects() {
        assert!(ResultAggregator::compute_subject_series(&[]).is_empty());
        assert!(ResultAggregator::compute_exam_type_series(&[]).is_empty());
        assert!(ResultAggregator::compute_pass_fail(&[]).is_empty());
    }
}
