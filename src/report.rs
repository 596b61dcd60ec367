use std::fmt::Write;

use crate::models::{AttemptResult, SectionBreakdown, Tool, WindowEstimate};

pub fn rank_sections(result: &AttemptResult) -> Vec<&SectionBreakdown> {
    let mut sections: Vec<&SectionBreakdown> = result.section_breakdown.iter().collect();
    sections.sort_by(|a, b| b.coverage_accuracy.cmp(&a.coverage_accuracy));
    sections
}

pub fn build_report(
    label: Option<&str>,
    result: &AttemptResult,
    tools: &[Tool],
    window: Option<&WindowEstimate>,
) -> String {
    let mut output = String::new();
    let label = label.unwrap_or("latest attempt");

    let _ = writeln!(output, "# Placement Readiness Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} of {} correct, {} attempted)",
        label, result.correct_answers, result.total_questions, result.attempted_questions
    );
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Score **{}%**, pace {} ({:.0}s)",
        result.score_percent, result.pace, result.time_taken_sec
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Readiness");
    let _ = writeln!(
        output,
        "**{}**: {}",
        result.readiness_band, result.recommendation
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Section Breakdown");

    if result.section_breakdown.is_empty() {
        let _ = writeln!(output, "No questions in this attempt.");
    } else {
        let _ = writeln!(output, "| Section | Correct | Attempted | Accuracy | Coverage |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for section in rank_sections(result) {
            let _ = writeln!(
                output,
                "| {} | {}/{} | {} | {}% | {}% |",
                section.section,
                section.correct,
                section.total,
                section.attempted,
                section.accuracy,
                section.coverage_accuracy
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Focus Areas");

    if result.focus_areas.is_empty() {
        let _ = writeln!(output, "No focus areas for this attempt.");
    } else {
        for area in &result.focus_areas {
            let _ = writeln!(output, "- {}", area);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommended Tools");

    if tools.is_empty() {
        let _ = writeln!(output, "No learner profile supplied.");
    } else {
        for (rank, tool) in tools.iter().enumerate() {
            let _ = writeln!(output, "{}. {}", rank + 1, tool);
        }
    }

    if let Some(window) = window {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Result Window");
        let _ = writeln!(
            output,
            "Results expected between {} and {}, most likely around {} ({}% confidence).",
            window.start_label, window.end_label, window.likely_label, window.confidence_percent
        );
    }

    output
}
