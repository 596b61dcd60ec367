use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::WindowEstimate;

pub const DEFAULT_DELAYS_DAYS: [f64; 3] = [28.0, 34.0, 41.0];

/// Samples longer than this are not declaration delays.
pub const MAX_DELAY_DAYS: f64 = 3650.0;

const MIN_CONFIDENCE: f64 = 55.0;
const MAX_CONFIDENCE: f64 = 95.0;

pub fn parse_exam_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_date_str(raw.trim()),
        Value::Number(n) => {
            let millis = n.as_f64().filter(|m| m.is_finite())?;
            Utc.timestamp_millis_opt(millis as i64).single()
        }
        _ => None,
    }
}

pub fn parse_date_str(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Keeps finite positive samples up to [`MAX_DELAY_DAYS`], falling back to
/// the default history.
pub fn sanitize_delays(delays: &[f64]) -> Vec<f64> {
    let usable: Vec<f64> = delays
        .iter()
        .copied()
        .filter(|delay| delay.is_finite() && *delay > 0.0 && *delay <= MAX_DELAY_DAYS)
        .collect();

    if usable.len() < delays.len() {
        warn!(
            dropped = delays.len() - usable.len(),
            "ignoring non-positive, non-finite or out-of-range delay samples"
        );
    }

    if usable.is_empty() {
        DEFAULT_DELAYS_DAYS.to_vec()
    } else {
        usable
    }
}

pub fn confidence_percent(min_delay: f64, max_delay: f64) -> u32 {
    let spread = (max_delay - min_delay).max(1.0);
    (100.0 - 1.25 * spread)
        .round()
        .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) as u32
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

// saturates at the end of the representable calendar
fn shift(exam_date: DateTime<Utc>, delay: f64) -> DateTime<Utc> {
    let offset = Duration::milliseconds((delay * 86_400_000.0).round() as i64);
    exam_date
        .checked_add_signed(offset)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Estimates when results will be declared for an exam.
///
/// Returns `None` when the exam date cannot be read; no estimate is made up
/// in that case.
pub fn predict_window(
    exam_date: &Value,
    historical_delays: Option<&[f64]>,
) -> Option<WindowEstimate> {
    let Some(exam_date) = parse_exam_date(exam_date) else {
        warn!(input = %exam_date, "unparsable exam date");
        return None;
    };

    let delays_used = sanitize_delays(historical_delays.unwrap_or_default());
    let mut sorted = delays_used.clone();
    sorted.sort_by(f64::total_cmp);
    let min_delay = sorted[0];
    let max_delay = sorted[sorted.len() - 1];

    let start_date = shift(exam_date, min_delay);
    let end_date = shift(exam_date, max_delay);
    let likely_date = shift(exam_date, median(&sorted));
    let confidence_percent = confidence_percent(min_delay, max_delay);

    debug!(%exam_date, min_delay, max_delay, confidence_percent, "predicted result window");

    Some(WindowEstimate {
        exam_date,
        start_label: start_date.date_naive(),
        end_label: end_date.date_naive(),
        likely_label: likely_date.date_naive(),
        start_date,
        end_date,
        likely_date,
        confidence_percent,
        delays_used,
    })
}
