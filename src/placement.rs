use std::collections::HashMap;

use tracing::{debug, warn};

use crate::models::{
    AnswerSource, AttemptResult, Pace, Question, Readiness, SectionBreakdown, Selection,
};

pub const SECONDS_PER_QUESTION: f64 = 90.0;

const MAX_FOCUS_AREAS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessBand {
    pub min_score: u32,
    pub readiness: Readiness,
    pub message: &'static str,
}

pub static READINESS_BANDS: [ReadinessBand; 3] = [
    ReadinessBand {
        min_score: 85,
        readiness: Readiness::High,
        message: "You are interview-ready. Keep momentum with timed mock drives.",
    },
    ReadinessBand {
        min_score: 70,
        readiness: Readiness::Medium,
        message: "You are close. Drill your focus areas with sectional practice before the next mock.",
    },
    ReadinessBand {
        min_score: 0,
        readiness: Readiness::Developing,
        message: "Build fundamentals first. Work through concept refreshers and untimed practice in your focus areas.",
    },
];

pub fn readiness_for(score_percent: u32) -> &'static ReadinessBand {
    READINESS_BANDS
        .iter()
        .filter(|band| score_percent >= band.min_score)
        .max_by_key(|band| band.min_score)
        .unwrap_or(&READINESS_BANDS[READINESS_BANDS.len() - 1])
}

pub fn classify_pace(time_taken_sec: f64, total_questions: u32) -> Pace {
    let expected = f64::from(total_questions) * SECONDS_PER_QUESTION;
    let ratio = if expected > 0.0 {
        time_taken_sec / expected
    } else {
        1.0
    };

    if ratio <= 0.85 {
        Pace::Fast
    } else if ratio <= 1.15 {
        Pace::Balanced
    } else {
        Pace::Slow
    }
}

/// Keys answers by question id. Later records for the same question win and
/// a null selection clears an earlier one.
pub fn normalize_answers(answers: Option<&AnswerSource>) -> HashMap<String, Selection> {
    let mut selections = HashMap::new();

    match answers {
        None => {}
        Some(AnswerSource::Map(map)) => {
            for (question_id, selected) in map {
                if let Some(selection) = Selection::from_value(selected) {
                    selections.insert(question_id.clone(), selection);
                }
            }
        }
        Some(AnswerSource::Records(records)) => {
            for record in records {
                let Some(question_id) = record.question_id.as_ref() else {
                    warn!("skipping answer record without a question id");
                    continue;
                };
                match Selection::from_value(&record.selected_index) {
                    Some(selection) => {
                        selections.insert(question_id.clone(), selection);
                    }
                    None => {
                        selections.remove(question_id);
                    }
                }
            }
        }
    }

    selections
}

fn percent(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
}

#[derive(Default)]
struct SectionTally {
    total: u32,
    attempted: u32,
    correct: u32,
}

pub fn evaluate_attempt(
    questions: &[Question],
    answers: Option<&AnswerSource>,
    time_taken_sec: Option<f64>,
) -> AttemptResult {
    let selections = normalize_answers(answers);

    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, SectionTally> = HashMap::new();

    for question in questions {
        let section = question.section_name();
        let tally = tallies.entry(section.to_string()).or_insert_with(|| {
            order.push(section.to_string());
            SectionTally::default()
        });
        tally.total += 1;

        let selection = question.id.as_ref().and_then(|id| selections.get(id));
        if let Some(selection) = selection {
            tally.attempted += 1;
            let is_correct = match (selection, question.correct_index) {
                (Selection::Index(picked), Some(correct)) => *picked == correct,
                _ => false,
            };
            if is_correct {
                tally.correct += 1;
            }
        }
    }

    let section_breakdown: Vec<SectionBreakdown> = order
        .into_iter()
        .filter_map(|section| {
            let tally = tallies.remove(&section)?;
            Some(SectionBreakdown {
                accuracy: percent(tally.correct, tally.attempted),
                coverage_accuracy: percent(tally.correct, tally.total),
                total: tally.total,
                attempted: tally.attempted,
                correct: tally.correct,
                section,
            })
        })
        .collect();

    let total_questions: u32 = section_breakdown.iter().map(|s| s.total).sum();
    let attempted_questions: u32 = section_breakdown.iter().map(|s| s.attempted).sum();
    let correct_answers: u32 = section_breakdown.iter().map(|s| s.correct).sum();
    let score_percent = percent(correct_answers, total_questions);

    let mut ranked: Vec<(usize, &SectionBreakdown)> = section_breakdown
        .iter()
        .filter(|section| section.total > 0)
        .enumerate()
        .collect();
    ranked.sort_by_key(|(position, section)| (section.coverage_accuracy, *position));
    let focus_areas: Vec<String> = ranked
        .into_iter()
        .take(MAX_FOCUS_AREAS)
        .map(|(_, section)| section.section.clone())
        .collect();

    let time_taken_sec = time_taken_sec
        .filter(|seconds| seconds.is_finite())
        .unwrap_or(0.0)
        .max(0.0);
    let pace = classify_pace(time_taken_sec, total_questions);
    let band = readiness_for(score_percent);

    debug!(
        total_questions,
        attempted_questions,
        correct_answers,
        score_percent,
        "evaluated placement attempt"
    );

    AttemptResult {
        total_questions,
        attempted_questions,
        correct_answers,
        incorrect_answers: attempted_questions.saturating_sub(correct_answers),
        score_percent,
        pace,
        time_taken_sec,
        section_breakdown,
        focus_areas,
        readiness_band: band.readiness,
        recommendation: band.message.to_string(),
    }
}
