use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Study tools the personalization scorer ranks.
///
/// Declaration order is the tie-break order when two tools end up with the
/// same score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Tutor,
    Summaries,
    Quizzes,
    Gpa,
    Project,
    Curriculum,
    Placement,
    Kt,
    Paper,
    Viva,
    StudyPlan,
    Math,
}

impl Tool {
    pub const ALL: [Tool; 12] = [
        Tool::Tutor,
        Tool::Summaries,
        Tool::Quizzes,
        Tool::Gpa,
        Tool::Project,
        Tool::Curriculum,
        Tool::Placement,
        Tool::Kt,
        Tool::Paper,
        Tool::Viva,
        Tool::StudyPlan,
        Tool::Math,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Tutor => "tutor",
            Tool::Summaries => "summaries",
            Tool::Quizzes => "quizzes",
            Tool::Gpa => "gpa",
            Tool::Project => "project",
            Tool::Curriculum => "curriculum",
            Tool::Placement => "placement",
            Tool::Kt => "kt",
            Tool::Paper => "paper",
            Tool::Viva => "viva",
            Tool::StudyPlan => "study-plan",
            Tool::Math => "math",
        }
    }

    pub fn from_key(key: &str) -> Option<Tool> {
        Tool::ALL.into_iter().find(|tool| tool.as_str() == key)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient")]
    pub target_exam: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub learning_style: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMastery {
    #[serde(default, deserialize_with = "lenient")]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub topic_mastery: Vec<TopicMastery>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementAttempt {
    #[serde(default, deserialize_with = "lenient_number")]
    pub accuracy: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub score_percent: Option<f64>,
}

impl PlacementAttempt {
    pub fn effective_accuracy(&self) -> f64 {
        self.accuracy.or(self.score_percent).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub tool: String,
    #[serde(default)]
    pub count: Value,
}

/// Usage counts as callers send them: a plain object, or a list whose
/// elements are `[tool, count]` pairs or `{tool, count}` records.
///
/// Malformed list elements are dropped one at a time.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UsageSource {
    Object(HashMap<String, Value>),
    List(Vec<UsageRecord>),
}

impl<'de> Deserialize<'de> for UsageSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(UsageSource::Object(map.into_iter().collect())),
            Value::Array(items) => Ok(UsageSource::List(
                items.into_iter().filter_map(usage_record).collect(),
            )),
            other => Err(de::Error::custom(format!(
                "expected usage object or list, got {other}"
            ))),
        }
    }
}

fn usage_record(value: Value) -> Option<UsageRecord> {
    if let Ok((tool, count)) = serde_json::from_value::<(String, Value)>(value.clone()) {
        return Some(UsageRecord { tool, count });
    }
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(%err, "skipping malformed usage entry");
            None
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub section: Option<String>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub correct_index: Option<i64>,
}

impl Question {
    pub fn section_name(&self) -> &str {
        match self.section.as_deref() {
            Some(section) if !section.is_empty() => section,
            _ => "General",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub question_id: Option<String>,
    #[serde(default)]
    pub selected_index: Value,
}

/// Answers either keyed by question id or as a list of answer records.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnswerSource {
    Map(HashMap<String, Value>),
    Records(Vec<AnswerRecord>),
}

impl<'de> Deserialize<'de> for AnswerSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(AnswerSource::Map(map.into_iter().collect())),
            Value::Array(items) => Ok(AnswerSource::Records(elements(items))),
            other => Err(de::Error::custom(format!(
                "expected answer map or list, got {other}"
            ))),
        }
    }
}

/// A normalized answer choice. Null selections never become a `Selection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Index(i64),
    /// Something was selected but it is not an option index.
    Unrecognized,
}

impl Selection {
    pub fn from_value(value: &Value) -> Option<Selection> {
        match value {
            Value::Null => None,
            other => Some(
                integer_from_value(other)
                    .map(Selection::Index)
                    .unwrap_or(Selection::Unrecognized),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(default, deserialize_with = "lenient")]
    pub user_profile: Option<UserProfile>,
    #[serde(default, deserialize_with = "lenient")]
    pub analytics: Option<AnalyticsSnapshot>,
    #[serde(default, deserialize_with = "lenient")]
    pub usage_counts: Option<UsageSource>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub placement_attempts: Vec<PlacementAttempt>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRequest {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub questions: Vec<Question>,
    #[serde(default, deserialize_with = "lenient")]
    pub answers: Option<AnswerSource>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub time_taken_sec: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBreakdown {
    pub section: String,
    pub total: u32,
    pub attempted: u32,
    pub correct: u32,
    pub accuracy: u32,
    pub coverage_accuracy: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pace {
    Fast,
    Balanced,
    Slow,
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Pace::Fast => "Fast",
            Pace::Balanced => "Balanced",
            Pace::Slow => "Slow",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Readiness {
    High,
    Medium,
    Developing,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Readiness::High => "High",
            Readiness::Medium => "Medium",
            Readiness::Developing => "Developing",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub total_questions: u32,
    pub attempted_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub score_percent: u32,
    pub pace: Pace,
    pub time_taken_sec: f64,
    pub section_breakdown: Vec<SectionBreakdown>,
    pub focus_areas: Vec<String>,
    pub readiness_band: Readiness,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEstimate {
    pub exam_date: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub likely_date: DateTime<Utc>,
    pub start_label: NaiveDate,
    pub end_label: NaiveDate,
    pub likely_label: NaiveDate,
    pub confidence_percent: u32,
    pub delays_used: Vec<f64>,
}

/// Reads a finite number out of a JSON value. Numeric strings count.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

pub fn integer_from_value(value: &Value) -> Option<i64> {
    let number = number_from_value(value)?;
    (number.fract() == 0.0 && number.abs() < i64::MAX as f64).then_some(number as i64)
}

/// Canonical string form of a question id, so `0` and `"0"` compare equal.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) => Some(match integer_from_value(value) {
            Some(integer) => integer.to_string(),
            None => value.to_string(),
        }),
        _ => None,
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Keeps the list elements that deserialize, dropping the rest.
fn elements<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(position, item)| match serde_json::from_value(item) {
            Ok(element) => Some(element),
            Err(err) => {
                warn!(position, %err, "skipping malformed list element");
                None
            }
        })
        .collect()
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(elements(items)),
        _ => Ok(Vec::new()),
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(integer_from_value))
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_keys_round_trip_through_wire_names() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_key(tool.as_str()), Some(tool));
            let encoded = serde_json::to_value(tool).unwrap();
            assert_eq!(encoded, json!(tool.as_str()));
        }
        assert_eq!(Tool::from_key("flashcards"), None);
    }

    #[test]
    fn malformed_fields_fall_back_to_defaults() {
        let request: RecommendRequest = serde_json::from_value(json!({
            "userProfile": { "targetExam": 42, "learningStyle": "Visual" },
            "analytics": "nope",
            "usageCounts": 7,
            "placementAttempts": { "accuracy": 80 }
        }))
        .unwrap();

        let profile = request.user_profile.unwrap();
        assert_eq!(profile.target_exam, None);
        assert_eq!(profile.learning_style.as_deref(), Some("Visual"));
        assert!(request.analytics.is_none());
        assert!(request.usage_counts.is_none());
        assert!(request.placement_attempts.is_empty());
    }

    #[test]
    fn usage_accepts_every_shape() {
        let object: UsageSource = serde_json::from_value(json!({ "tutor": 3 })).unwrap();
        assert!(matches!(object, UsageSource::Object(_)));

        let entries: UsageSource = serde_json::from_value(json!([["tutor", 3]])).unwrap();
        assert!(matches!(&entries, UsageSource::List(list) if list[0].tool == "tutor"));

        let records: UsageSource =
            serde_json::from_value(json!([{ "tool": "tutor", "count": 3 }])).unwrap();
        assert!(matches!(&records, UsageSource::List(list) if list[0].count == json!(3)));

        assert!(serde_json::from_value::<UsageSource>(json!(7)).is_err());
    }

    #[test]
    fn bad_list_elements_are_dropped_individually() {
        let request: RecommendRequest = serde_json::from_value(json!({
            "analytics": { "topicMastery": [{ "topic": "graphs", "accuracy": 10 }, 5] },
            "usageCounts": [["kt", 3], null, { "tool": "viva", "count": 2 }, 7],
            "placementAttempts": [{ "accuracy": 30 }, "oops"]
        }))
        .unwrap();

        assert_eq!(request.analytics.unwrap().topic_mastery.len(), 1);
        assert_eq!(request.placement_attempts.len(), 1);
        let Some(UsageSource::List(usage)) = request.usage_counts else {
            panic!("usage should parse as a list");
        };
        let tools: Vec<&str> = usage.iter().map(|record| record.tool.as_str()).collect();
        assert_eq!(tools, vec!["kt", "viva"]);

        let attempt: AttemptRequest = serde_json::from_value(json!({
            "questions": [
                { "id": 1, "section": "A", "correctIndex": 0 },
                { "id": 2, "section": "A", "correctIndex": 0 },
                null
            ],
            "answers": [{ "questionId": 1, "selectedIndex": 0 }, null]
        }))
        .unwrap();

        assert_eq!(attempt.questions.len(), 2);
        assert!(matches!(&attempt.answers, Some(AnswerSource::Records(records)) if records.len() == 1));
    }

    #[test]
    fn question_ids_are_canonicalized() {
        let question: Question =
            serde_json::from_value(json!({ "id": 0, "correctIndex": "2" })).unwrap();
        assert_eq!(question.id.as_deref(), Some("0"));
        assert_eq!(question.correct_index, Some(2));
        assert_eq!(question.section_name(), "General");
    }

    #[test]
    fn selections_distinguish_null_from_unrecognized() {
        assert_eq!(Selection::from_value(&Value::Null), None);
        assert_eq!(Selection::from_value(&json!(1)), Some(Selection::Index(1)));
        assert_eq!(
            Selection::from_value(&json!("b")),
            Some(Selection::Unrecognized)
        );
    }
}
