use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use careerprep_insights::models::{
    AttemptRequest, AttemptResult, RecommendRequest, Tool, WindowEstimate,
};
use careerprep_insights::{input, personalize, placement, report, result_window};

#[derive(Parser)]
#[command(name = "careerprep-insights")]
#[command(about = "Study recommendations, placement grading and result windows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank study tools for a learner
    Recommend {
        #[arg(long)]
        request: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Grade a placement test attempt
    Evaluate {
        #[arg(long)]
        attempt: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Estimate when exam results will be declared
    Predict {
        #[arg(long)]
        exam_date: String,
        #[arg(long, env = "CAREERPREP_RESULT_DELAYS", value_delimiter = ',')]
        delays: Vec<f64>,
        #[arg(long)]
        delays_csv: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown readiness report
    Report {
        #[arg(long)]
        attempt: PathBuf,
        #[arg(long)]
        request: Option<PathBuf>,
        #[arg(long)]
        exam_date: Option<String>,
        #[arg(long, env = "CAREERPREP_RESULT_DELAYS", value_delimiter = ',')]
        delays: Vec<f64>,
        #[arg(long)]
        delays_csv: Option<PathBuf>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CAREERPREP_LOG")
        .unwrap_or_else(|_| EnvFilter::new("careerprep_insights=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn gather_delays(mut delays: Vec<f64>, csv: Option<&Path>) -> anyhow::Result<Option<Vec<f64>>> {
    if let Some(path) = csv {
        let imported = input::import_delays_csv(path)
            .with_context(|| format!("failed to import delays from {}", path.display()))?;
        delays.extend(imported);
    }
    Ok((!delays.is_empty()).then_some(delays))
}

fn window_for(exam_date: &str, delays: Option<&[f64]>) -> anyhow::Result<WindowEstimate> {
    result_window::predict_window(&Value::String(exam_date.to_string()), delays)
        .with_context(|| format!("could not parse exam date {exam_date:?}"))
}

fn grade(path: &Path) -> anyhow::Result<AttemptResult> {
    let request: AttemptRequest = input::load_json(path).context("failed to load attempt")?;
    Ok(placement::evaluate_attempt(
        &request.questions,
        request.answers.as_ref(),
        request.time_taken_sec,
    ))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Recommend { request, json } => {
            let request: RecommendRequest =
                input::load_json(&request).context("failed to load recommendation request")?;
            let scores = personalize::score_tools(
                request.user_profile.as_ref(),
                request.analytics.as_ref(),
                request.usage_counts.as_ref(),
                &request.placement_attempts,
            );
            let ranked: Vec<(Tool, f64)> = scores
                .ranked()
                .into_iter()
                .take(personalize::MAX_RECOMMENDATIONS)
                .collect();
            info!(count = ranked.len(), "ranked study tools");

            if json {
                let tools: Vec<Tool> = ranked.iter().map(|(tool, _)| *tool).collect();
                println!("{}", serde_json::to_string_pretty(&tools)?);
                return Ok(());
            }

            println!("Recommended tools:");
            for (rank, (tool, score)) in ranked.iter().enumerate() {
                println!("{}. {} (score {:.2})", rank + 1, tool, score);
            }
        }
        Commands::Evaluate { attempt, json } => {
            let result = grade(&attempt)?;
            info!(score = result.score_percent, "graded attempt");

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            println!(
                "Score {}% ({}/{} correct, {} attempted), pace {}",
                result.score_percent,
                result.correct_answers,
                result.total_questions,
                result.attempted_questions,
                result.pace
            );
            println!("Readiness: {} - {}", result.readiness_band, result.recommendation);
            if result.section_breakdown.is_empty() {
                println!("No questions in this attempt.");
            }
            for section in &result.section_breakdown {
                println!(
                    "- {}: {}/{} correct (accuracy {}%, coverage {}%)",
                    section.section,
                    section.correct,
                    section.total,
                    section.accuracy,
                    section.coverage_accuracy
                );
            }
            if !result.focus_areas.is_empty() {
                println!("Focus areas: {}", result.focus_areas.join(", "));
            }
        }
        Commands::Predict {
            exam_date,
            delays,
            delays_csv,
            json,
        } => {
            let delays = gather_delays(delays, delays_csv.as_deref())?;
            let window = window_for(&exam_date, delays.as_deref())?;
            info!(confidence = window.confidence_percent, "predicted result window");

            if json {
                println!("{}", serde_json::to_string_pretty(&window)?);
                return Ok(());
            }

            println!(
                "Results expected between {} and {} (most likely {}), confidence {}%.",
                window.start_label,
                window.end_label,
                window.likely_label,
                window.confidence_percent
            );
        }
        Commands::Report {
            attempt,
            request,
            exam_date,
            delays,
            delays_csv,
            label,
            out,
        } => {
            let result = grade(&attempt)?;
            let tools = match request {
                Some(path) => {
                    let request: RecommendRequest = input::load_json(&path)
                        .context("failed to load recommendation request")?;
                    personalize::recommend_tools(
                        request.user_profile.as_ref(),
                        request.analytics.as_ref(),
                        request.usage_counts.as_ref(),
                        &request.placement_attempts,
                    )
                }
                None => Vec::new(),
            };
            let window = match exam_date {
                Some(exam_date) => {
                    let delays = gather_delays(delays, delays_csv.as_deref())?;
                    Some(window_for(&exam_date, delays.as_deref())?)
                }
                None => None,
            };

            let report = report::build_report(label.as_deref(), &result, &tools, window.as_ref());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
