use std::path::Path;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::InputError;

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, InputError> {
    let raw = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| InputError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads historical declaration delays from a CSV file.
///
/// Each row either carries `delay_days` directly or an `exam_date` and
/// `declared_on` pair the delay is derived from. Rows with neither are
/// skipped.
pub fn import_delays_csv(path: &Path) -> Result<Vec<f64>, InputError> {
    #[derive(Deserialize)]
    struct CsvRow {
        #[serde(default)]
        delay_days: Option<String>,
        #[serde(default)]
        exam_date: Option<NaiveDate>,
        #[serde(default)]
        declared_on: Option<NaiveDate>,
    }

    let csv_error = |source| InputError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut delays = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.map_err(csv_error)?;
        let direct = row
            .delay_days
            .as_deref()
            .and_then(|value| value.trim().parse::<f64>().ok());
        let derived = match (row.exam_date, row.declared_on) {
            (Some(exam), Some(declared)) => Some((declared - exam).num_days() as f64),
            _ => None,
        };

        match direct.or(derived) {
            Some(delay) => delays.push(delay),
            None => warn!(row = line + 1, "skipping delay row without a usable delay"),
        }
    }

    debug!(count = delays.len(), path = %path.display(), "imported delay history");
    Ok(delays)
}
