//! Case-count loader for the semicolon-delimited case file.
//!
//! Expected layout (extra columns are ignored, `#` starts a comment line):
//!
//! ```text
//! # region;date;cases
//! region;date;cases
//! china;2020-01-22;548
//! china;2020-01-23;643
//! ```
//!
//! Rows are filtered by exact `region` match and kept in file order.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{debug, info};

use crate::error::{AppError, ModelError};

/// Default case file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "case_numbers.csv";

/// Load the observed case series for `region` from `path`.
pub fn load_region_cases(path: &Path, region: &str) -> Result<Vec<f64>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(1, format!("Failed to open case file '{}': {e}", path.display()))
    })?;
    let cases = read_region_cases(file, region)?;
    info!(path = %path.display(), region, n = cases.len(), "loaded case series");
    Ok(cases)
}

/// Reader-level variant of [`load_region_cases`].
pub fn read_region_cases<R: Read>(reader: R, region: &str) -> Result<Vec<f64>, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(1, format!("Failed to read case file headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let region_idx = column(&header_map, "region")?;
    let cases_idx = column(&header_map, "cases")?;

    let mut cases = Vec::new();
    let mut rows_read = 0usize;
    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record =
            result.map_err(|e| AppError::new(1, format!("CSV parse error near line {line}: {e}")))?;
        if record.get(region_idx) != Some(region) {
            continue;
        }

        let raw = record.get(cases_idx).unwrap_or("");
        let value = raw.parse::<f64>().map_err(|_| {
            AppError::new(1, format!("Invalid `cases` value '{raw}' for region '{region}' (line {line})"))
        })?;
        cases.push(value);
    }

    debug!(rows_read, rows_used = cases.len(), "filtered case rows");

    if cases.is_empty() {
        return Err(ModelError::NoDataFound {
            region: region.to_string(),
        }
        .into());
    }
    Ok(cases)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes carry a UTF-8 BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn column(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::new(1, format!("Missing required column: `{name}`")))
}
