//! Result Payload Model
//! Typed view of the result JSON published by the portal.
//!
//! Every field is read leniently: numbers may arrive as strings, text may be
//! missing, lists may be absent. Coercion happens while deserializing so the
//! rest of the crate only sees plain values.

use serde::Deserialize;

/// Fallback label for subjects and exam types without a name.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Fallback label for a missing grade.
pub const NO_GRADE: &str = "N/A";

/// One student's result for a launch: the subjects plus optional summary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultData {
    #[serde(default, deserialize_with = "lenient::list")]
    pub subjects: Vec<Subject>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub student_info: Option<StudentInfo>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub overall: Option<Overall>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Subject {
    #[serde(default, deserialize_with = "lenient::text")]
    pub subject_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub weighted_total: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub passed: bool,
    #[serde(default, deserialize_with = "lenient::list")]
    pub exam_types: Vec<ExamScore>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub max_marks: Option<f64>,
}

impl Subject {
    pub fn display_name(&self) -> &str {
        self.subject_name.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    pub fn display_grade(&self) -> &str {
        self.grade.as_deref().unwrap_or(NO_GRADE)
    }
}

/// Marks obtained in one exam component of a subject.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExamScore {
    #[serde(default, deserialize_with = "lenient::text")]
    pub exam_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub obtained: f64,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub weightage: Option<f64>,
}

impl ExamScore {
    pub fn display_name(&self) -> &str {
        self.exam_name.as_deref().unwrap_or(UNKNOWN_LABEL)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StudentInfo {
    #[serde(default, alias = "id", deserialize_with = "lenient::integer")]
    pub student_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub roll_number: Option<String>,
}

/// Whole-result summary shown in the card header.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Overall {
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub cgpa: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub grade: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub total_obtained: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub total_max: Option<f64>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_passing: bool,
}

/// A result as listed by `/api/launched-results/{student_id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LaunchedResult {
    #[serde(default, alias = "id", deserialize_with = "lenient::integer")]
    pub launch_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub student_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub launch_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub launch_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub section_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::embedded")]
    pub result_data: ResultData,
}

/// Portal response wrapper: `{ "success": true, "results": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortalEnvelope {
    #[serde(default = "default_success", deserialize_with = "lenient::flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient::list")]
    pub results: Vec<LaunchedResult>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub error: Option<String>,
}

fn default_success() -> bool {
    true
}

/// One result card: a launched result ready to be charted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultCard {
    /// Unknown for bare payloads loaded from disk.
    pub launch_id: Option<i64>,
    pub student_id: Option<i64>,
    pub launch_name: String,
    pub launch_date: Option<String>,
    pub section_name: Option<String>,
    pub result: ResultData,
}

impl ResultCard {
    /// Card for a bare result payload that carries no launch metadata.
    pub fn standalone(result: ResultData) -> Self {
        Self {
            launch_id: None,
            student_id: None,
            launch_name: "Result".to_string(),
            launch_date: None,
            section_name: None,
            result,
        }
    }

    /// Student the report belongs to, from the card or the payload itself.
    pub fn resolved_student_id(&self) -> Option<i64> {
        self.student_id.or_else(|| {
            self.result
                .student_info
                .as_ref()
                .and_then(|info| info.student_id)
        })
    }
}

impl From<LaunchedResult> for ResultCard {
    fn from(launched: LaunchedResult) -> Self {
        let launch_name = launched.launch_name.unwrap_or_else(|| match launched.launch_id {
            Some(id) => format!("Launch {}", id),
            None => "Result".to_string(),
        });
        Self {
            launch_id: launched.launch_id,
            student_id: launched.student_id,
            launch_name,
            launch_date: launched.launch_date,
            section_name: launched.section_name,
            result: launched.result_data,
        }
    }
}

/// Coerce a JSON value to a finite number, defaulting to 0.
pub fn coerce_number(value: &serde_json::Value) -> f64 {
    use serde_json::Value;

    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_leading_float(s).unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Parse the longest numeric prefix of `text` ("85.5 marks" -> 85.5).
pub fn parse_leading_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when digits follow it
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Field deserializers that never fail on a shape mismatch.
mod lenient {
    use super::{coerce_number, parse_leading_float, ResultData};
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce_number(&value))
    }

    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match &value {
            Value::Number(_) | Value::String(_) => Some(coerce_number(&value)),
            _ => None,
        })
    }

    pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .ok()
                .or_else(|| parse_leading_float(&s).map(|f| f as i64)),
            _ => None,
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// `true` or the literal string `"true"`; anything else is false.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::String(s) => s == "true",
            _ => false,
        })
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        })
    }

    /// Result payload stored either as an object or as a JSON string column.
    pub fn embedded<'de, D>(deserializer: D) -> Result<ResultData, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => ResultData::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("85"), Some(85.0));
        assert_eq!(parse_leading_float("  92.5 marks"), Some(92.5));
        assert_eq!(parse_leading_float("-3e2x"), Some(-300.0));
        assert_eq!(parse_leading_float("7e"), Some(7.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float("."), None);
    }

    #[test]
    fn test_coerce_number_defaults_to_zero() {
        assert_eq!(coerce_number(&json!(null)), 0.0);
        assert_eq!(coerce_number(&json!(true)), 0.0);
        assert_eq!(coerce_number(&json!("n/a")), 0.0);
        assert_eq!(coerce_number(&json!([1, 2])), 0.0);
        assert_eq!(coerce_number(&json!("1e400")), 0.0);
        assert_eq!(coerce_number(&json!("40")), 40.0);
        assert_eq!(coerce_number(&json!(12.25)), 12.25);
    }

    #[test]
    fn test_subject_with_malformed_fields() {
        let subject: Subject = serde_json::from_value(json!({
            "subject_name": null,
            "weighted_total": "not a number",
            "grade": 7,
            "passed": "yes",
            "exam_types": "none"
        }))
        .unwrap();

        assert_eq!(subject.display_name(), UNKNOWN_LABEL);
        assert_eq!(subject.weighted_total, 0.0);
        assert_eq!(subject.display_grade(), "7");
        assert!(!subject.passed);
        assert!(subject.exam_types.is_empty());
    }

    #[test]
    fn test_subjects_not_a_list() {
        let data: ResultData = serde_json::from_value(json!({ "subjects": { "a": 1 } })).unwrap();
        assert!(data.subjects.is_empty());

        let data: ResultData = serde_json::from_value(json!({})).unwrap();
        assert!(data.subjects.is_empty());
        assert!(data.overall.is_none());
    }

    #[test]
    fn test_non_object_subject_becomes_default() {
        let data: ResultData =
            serde_json::from_value(json!({ "subjects": [42, { "subject_name": "Math" }] }))
                .unwrap();
        assert_eq!(data.subjects.len(), 2);
        assert_eq!(data.subjects[0], Subject::default());
        assert_eq!(data.subjects[1].display_name(), "Math");
    }

    #[test]
    fn test_launched_result_with_string_payload() {
        let launched: LaunchedResult = serde_json::from_value(json!({
            "id": 12,
            "launch_name": "Midterm Results",
            "result_data": "{\"subjects\": [{\"subject_name\": \"Physics\", \"weighted_total\": 71}]}"
        }))
        .unwrap();

        let card = ResultCard::from(launched);
        assert_eq!(card.launch_id, Some(12));
        assert_eq!(card.launch_name, "Midterm Results");
        assert_eq!(card.result.subjects[0].weighted_total, 71.0);
    }

    #[test]
    fn test_resolved_student_id_falls_back_to_payload() {
        let result: ResultData = serde_json::from_value(json!({
            "student_info": { "id": "31", "name": "A. Student" }
        }))
        .unwrap();
        let card = ResultCard::standalone(result);
        assert_eq!(card.resolved_student_id(), Some(31));
        assert_eq!(card.launch_id, None);
    }

    #[test]
    fn test_launched_result_without_id_keeps_launch_unknown() {
        let launched: LaunchedResult =
            serde_json::from_value(json!({ "student_id": 8, "result_data": {} })).unwrap();
        let card = ResultCard::from(launched);
        assert_eq!(card.launch_id, None);
        assert_eq!(card.launch_name, "Result");

        let named: LaunchedResult = serde_json::from_value(json!({ "id": "6" })).unwrap();
        assert_eq!(ResultCard::from(named).launch_name, "Launch 6");
    }
}
