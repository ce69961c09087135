use result_charts::config::Settings;
use result_charts::data::{LoaderError, ResultAggregator, ResultLoader};
use result_charts::download::DownloadStrategy;
use serde_json::json;

#[test]
fn load_file_reads_single_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.json");
    std::fs::write(
        &path,
        json!({
            "student_info": { "id": 1042, "name": "Asha" },
            "overall": { "cgpa": "8.4", "grade": "A", "is_passing": "true" },
            "subjects": [
                { "subject_name": "Math", "weighted_total": "85", "grade": "A", "passed": true,
                  "exam_types": [
                      { "exam_name": "Midterm", "obtained": "40" },
                      { "exam_name": "Final", "obtained": "45" }
                  ] }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let mut loader = ResultLoader::new();
    let cards = loader.load_file(&path).unwrap();
    assert_eq!(cards.len(), 1);

    let card = &cards[0];
    assert_eq!(card.resolved_student_id(), Some(1042));
    let overall = card.result.overall.as_ref().unwrap();
    assert_eq!(overall.cgpa, Some(8.4));
    assert!(overall.is_passing);

    let series = ResultAggregator::compute_subject_series(&card.result.subjects);
    assert_eq!(series.names, vec!["Math"]);
    assert_eq!(series.totals, vec![85.0]);
    let exams = ResultAggregator::compute_exam_type_series(&card.result.subjects);
    assert_eq!(exams.names(), vec!["Midterm", "Final"]);
    assert_eq!(exams.values(), vec![40.0, 45.0]);
    let counts = ResultAggregator::compute_pass_fail(&card.result.subjects);
    assert_eq!((counts.passed, counts.failed), (1, 0));

    assert_eq!(loader.get_file_path(), Some(&path));
    assert_eq!(loader.card_count(), 1);
}

#[test]
fn failed_envelope_is_an_error() {
    let err = ResultLoader::parse_cards(r#"{"success": false, "results": [], "error": "Student not found"}"#)
        .unwrap_err();
    match err {
        LoaderError::Portal(message) => assert_eq!(message, "Student not found"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_json_is_rejected() {
    assert!(matches!(
        ResultLoader::parse_cards("<html>oops</html>"),
        Err(LoaderError::Json(_))
    ));
    assert!(matches!(
        ResultLoader::parse_cards("42"),
        Err(LoaderError::NoData)
    ));
}

#[test]
fn settings_file_round_into_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result-charts.toml");
    std::fs::write(
        &path,
        "base_url = \"https://portal.example.edu/\"\ndownload_strategy = \"navigate\"\n",
    )
    .unwrap();

    let settings = Settings::from_file(&path).unwrap();
    assert_eq!(settings.download_strategy, DownloadStrategy::Navigate);
    assert!(settings.validate().is_ok());
}
