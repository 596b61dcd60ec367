use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::{
    number_from_value, AnalyticsSnapshot, PlacementAttempt, Tool, UsageSource, UserProfile,
};

pub const WEAK_TOPIC_ACCURACY: f64 = 65.0;

pub const MAX_RECOMMENDATIONS: usize = 5;

type Weights = &'static [(Tool, f64)];

const EXAM_WEIGHTS: &[(&str, Weights)] = &[
    (
        "Placements",
        &[
            (Tool::Placement, 5.0),
            (Tool::Math, 4.0),
            (Tool::Quizzes, 2.0),
            (Tool::Tutor, 2.0),
        ],
    ),
    (
        "GATE",
        &[
            (Tool::Math, 4.0),
            (Tool::Paper, 3.0),
            (Tool::Quizzes, 3.0),
            (Tool::Tutor, 2.0),
        ],
    ),
    (
        "Semester Exams",
        &[
            (Tool::Summaries, 3.0),
            (Tool::Paper, 3.0),
            (Tool::Kt, 2.0),
            (Tool::Viva, 2.0),
            (Tool::Gpa, 1.0),
        ],
    ),
];

const STYLE_WEIGHTS: &[(&str, Weights)] = &[
    (
        "visual",
        &[
            (Tool::Curriculum, 2.0),
            (Tool::StudyPlan, 2.0),
            (Tool::Summaries, 1.0),
        ],
    ),
    ("text", &[(Tool::Summaries, 3.0), (Tool::Paper, 2.0)]),
    (
        "interactive",
        &[(Tool::Quizzes, 3.0), (Tool::Tutor, 2.0), (Tool::Viva, 1.0)],
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ToolScores([f64; 12]);

impl Default for ToolScores {
    fn default() -> Self {
        ToolScores([0.0; 12])
    }
}

impl ToolScores {
    pub fn add(&mut self, tool: Tool, weight: f64) {
        if weight.is_finite() {
            self.0[tool.index()] += weight;
        }
    }

    fn add_all(&mut self, weights: Weights) {
        for &(tool, weight) in weights {
            self.add(tool, weight);
        }
    }

    pub fn get(&self, tool: Tool) -> f64 {
        self.0[tool.index()]
    }

    /// All tools, highest score first. Ties keep declaration order.
    pub fn ranked(&self) -> Vec<(Tool, f64)> {
        let mut ranked: Vec<(Tool, f64)> = Tool::ALL
            .into_iter()
            .map(|tool| (tool, self.get(tool)))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

/// Collapses any accepted usage shape into one tool-keyed map of counts.
///
/// Counts that are missing, non-numeric or negative become zero. Repeated
/// keys in list shapes accumulate.
pub fn to_plain_usage(usage: Option<&UsageSource>) -> HashMap<String, f64> {
    let mut plain: HashMap<String, f64> = HashMap::new();
    let mut push = |tool: &str, count: &serde_json::Value| {
        let value = number_from_value(count).unwrap_or(0.0).max(0.0);
        *plain.entry(tool.to_string()).or_insert(0.0) += value;
    };

    match usage {
        None => {}
        Some(UsageSource::Object(map)) => {
            for (tool, count) in map {
                push(tool, count);
            }
        }
        Some(UsageSource::List(records)) => {
            for record in records {
                push(&record.tool, &record.count);
            }
        }
    }

    plain
}

pub fn placement_risk(attempts: &[PlacementAttempt]) -> u8 {
    let Some(latest) = attempts.first() else {
        return 0;
    };

    match latest.effective_accuracy() {
        accuracy if accuracy >= 75.0 => 0,
        accuracy if accuracy >= 60.0 => 1,
        _ => 2,
    }
}

pub fn weak_topic_count(analytics: Option<&AnalyticsSnapshot>) -> usize {
    analytics
        .map(|analytics| {
            analytics
                .topic_mastery
                .iter()
                .filter(|topic| topic.accuracy.is_some_and(|a| a < WEAK_TOPIC_ACCURACY))
                .count()
        })
        .unwrap_or(0)
}

pub fn usage_bonus(count: f64) -> f64 {
    (count * 0.2).min(4.0)
}

pub fn score_tools(
    profile: Option<&UserProfile>,
    analytics: Option<&AnalyticsSnapshot>,
    usage: Option<&UsageSource>,
    attempts: &[PlacementAttempt],
) -> ToolScores {
    let mut scores = ToolScores::default();

    if let Some(profile) = profile {
        if let Some(exam) = profile.target_exam.as_deref() {
            if let Some((_, weights)) = EXAM_WEIGHTS.iter().find(|(name, _)| *name == exam) {
                scores.add_all(weights);
            }
        }

        if let Some(style) = profile.learning_style.as_deref() {
            let style = style.to_lowercase();
            if let Some((_, weights)) = STYLE_WEIGHTS.iter().find(|(name, _)| *name == style) {
                scores.add_all(weights);
            }
        }
    }

    let weak_topics = weak_topic_count(analytics);
    if weak_topics > 0 {
        let boost = 1.0 + weak_topics.min(2) as f64;
        scores.add(Tool::Tutor, boost);
        scores.add(Tool::Quizzes, boost);
        scores.add(Tool::StudyPlan, 1.0);
    }

    let risk = placement_risk(attempts);
    if risk > 0 {
        scores.add(Tool::Placement, f64::from(risk) * 2.0);
        scores.add(Tool::Math, f64::from(risk));
    }

    for (key, count) in to_plain_usage(usage) {
        match Tool::from_key(&key) {
            Some(tool) => scores.add(tool, usage_bonus(count)),
            None => warn!(tool = %key, "ignoring usage for unknown tool"),
        }
    }

    debug!(weak_topics, risk, "scored study tools");
    scores
}

pub fn recommend_tools(
    profile: Option<&UserProfile>,
    analytics: Option<&AnalyticsSnapshot>,
    usage: Option<&UsageSource>,
    attempts: &[PlacementAttempt],
) -> Vec<Tool> {
    score_tools(profile, analytics, usage, attempts)
        .ranked()
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(tool, _)| tool)
        .collect()
}
