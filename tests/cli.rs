//! CLI integration tests using assert_cmd.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn careerprep() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("careerprep-insights").unwrap();
    cmd.env_remove("CAREERPREP_RESULT_DELAYS");
    cmd
}

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const ATTEMPT: &str = r#"{
  "questions": [
    { "id": 1, "section": "A", "correctIndex": 0 },
    { "id": 2, "section": "A", "correctIndex": 1 },
    { "id": 3, "section": "B", "correctIndex": 2 },
    { "id": 4, "section": "B", "correctIndex": 3 }
  ],
  "answers": [
    { "questionId": 1, "selectedIndex": 0 },
    { "questionId": 2, "selectedIndex": 2 },
    { "questionId": 3, "selectedIndex": 2 },
    { "questionId": 4, "selectedIndex": 0 }
  ],
  "timeTakenSec": 360
}"#;

const REQUEST: &str = r#"{
  "userProfile": { "targetExam": "Placements", "learningStyle": "Interactive" },
  "analytics": { "topicMastery": [] },
  "usageCounts": [["kt", 1]],
  "placementAttempts": []
}"#;

#[test]
fn recommend_prints_ranked_tools() {
    let dir = TempDir::new().unwrap();
    let request = write(&dir, "request.json", REQUEST);

    careerprep()
        .arg("recommend")
        .arg("--request")
        .arg(&request)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recommended tools:"))
        .stdout(predicate::str::contains("1. quizzes (score 5.00)"))
        .stdout(predicate::str::contains("2. placement (score 5.00)"));
}

#[test]
fn recommend_json_lists_five_identifiers() {
    let dir = TempDir::new().unwrap();
    let request = write(&dir, "request.json", REQUEST);

    let output = careerprep()
        .arg("recommend")
        .arg("--request")
        .arg(&request)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let tools: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tools, vec!["quizzes", "placement", "tutor", "math", "viva"]);
}

#[test]
fn evaluate_prints_summary() {
    let dir = TempDir::new().unwrap();
    let attempt = write(&dir, "attempt.json", ATTEMPT);

    careerprep()
        .arg("evaluate")
        .arg("--attempt")
        .arg(&attempt)
        .assert()
        .success()
        .stdout(predicate::str::contains("Score 50% (2/4 correct, 4 attempted), pace Balanced"))
        .stdout(predicate::str::contains("Readiness: Developing"))
        .stdout(predicate::str::contains("Focus areas: A, B"));
}

#[test]
fn evaluate_json_uses_camel_case_fields() {
    let dir = TempDir::new().unwrap();
    let attempt = write(&dir, "attempt.json", ATTEMPT);

    let output = careerprep()
        .arg("evaluate")
        .arg("--attempt")
        .arg(&attempt)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["scorePercent"], 50);
    assert_eq!(result["incorrectAnswers"], 2);
    assert_eq!(result["readinessBand"], "Developing");
    assert_eq!(result["sectionBreakdown"][0]["coverageAccuracy"], 50);
}

#[test]
fn evaluate_missing_file_fails() {
    careerprep()
        .arg("evaluate")
        .arg("--attempt")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn predict_uses_default_history() {
    careerprep()
        .arg("predict")
        .arg("--exam-date")
        .arg("2025-06-01")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Results expected between 2025-06-29 and 2025-07-12 (most likely 2025-07-05), confidence 84%.",
        ));
}

#[test]
fn predict_reads_delays_from_env_and_csv() {
    let dir = TempDir::new().unwrap();
    let csv = write(
        &dir,
        "delays.csv",
        "exam,delay_days,exam_date,declared_on\nWinter,,2024-11-01,2024-12-11\n",
    );

    let output = careerprep()
        .env("CAREERPREP_RESULT_DELAYS", "30")
        .arg("predict")
        .arg("--exam-date")
        .arg("2025-06-01")
        .arg("--delays-csv")
        .arg(&csv)
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let window: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(window["delaysUsed"], serde_json::json!([30.0, 40.0]));
    assert_eq!(window["startLabel"], "2025-07-01");
    assert_eq!(window["endLabel"], "2025-07-11");
    assert_eq!(window["confidencePercent"], 88);
}

#[test]
fn predict_rejects_unparsable_date() {
    careerprep()
        .arg("predict")
        .arg("--exam-date")
        .arg("not-a-date")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse exam date"));
}

#[test]
fn report_writes_markdown() {
    let dir = TempDir::new().unwrap();
    let attempt = write(&dir, "attempt.json", ATTEMPT);
    let request = write(&dir, "request.json", REQUEST);
    let out = dir.path().join("report.md");

    careerprep()
        .arg("report")
        .arg("--attempt")
        .arg(&attempt)
        .arg("--request")
        .arg(&request)
        .arg("--exam-date")
        .arg("2025-06-01")
        .arg("--label")
        .arg("Avery Lee")
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Report written to"));

    let report = fs::read_to_string(&out).unwrap();
    assert!(report.contains("Generated for Avery Lee (2 of 4 correct, 4 attempted)"));
    assert!(report.contains("1. quizzes"));
    assert!(report.contains("## Result Window"));
}
