//! Export artifact handling: ZIP extraction and CSV normalization.
//!
//! The portal wraps its CSV in a ZIP archive and prefixes the table with a
//! free-text banner (station name, units, disclaimers). The table proper
//! starts at the line beginning with [`HEADER_KEYWORD`].

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use eisbach_types::parse_decimal;
use tracing::{debug, warn};

use crate::error::{ExportError, Result};

/// First column of the table header.
pub const HEADER_KEYWORD: &str = "Datum";

/// Column holding the daily mean temperature.
pub const MEAN_COLUMN: &str = "Mittelwert";

/// One CSV row keyed by header name.
pub type Record = HashMap<String, String>;

/// Read the single `.csv` entry of the archive at `path`.
pub fn extract_csv(path: &Path) -> Result<String> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;

    let Some(name) = archive
        .file_names()
        .find(|name| name.to_ascii_lowercase().ends_with(".csv"))
        .map(str::to_string)
    else {
        let entries: Vec<String> = archive.file_names().map(str::to_string).collect();
        warn!(?entries, "Archive holds no CSV file");
        return Err(ExportError::MissingCsv { entries });
    };

    let mut entry = archive.by_name(&name)?;
    let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
    entry.read_to_end(&mut bytes)?;
    debug!(%name, bytes = bytes.len(), "Extracted CSV");
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Drop the banner lines preceding the table header.
pub fn strip_banner(text: &str) -> Result<&str> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with(HEADER_KEYWORD) {
            return Ok(&text[offset..]);
        }
        offset += line.len();
    }
    Err(ExportError::parse("CSV header not found"))
}

/// Parse a `;`-delimited table with a header row.
///
/// Empty lines are skipped and fields trimmed. Rows may be shorter than the
/// header.
pub fn parse_records(table: &str) -> Result<Vec<Record>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(table.trim_start_matches('\u{feff}').as_bytes());

    let mut records = Vec::new();
    for row in reader.deserialize::<Record>() {
        records.push(row?);
    }
    debug!(rows = records.len(), "Parsed CSV rows");
    Ok(records)
}

/// Normalize the raw CSV text of an export into records.
pub fn normalize(text: &str) -> Result<Vec<Record>> {
    parse_records(strip_banner(text)?)
}

/// Mean temperature of the most recent row.
pub fn latest_temperature(records: &[Record]) -> Result<f64> {
    let raw = records
        .last()
        .and_then(|row| row.get(MEAN_COLUMN))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ExportError::parse("No temperature data found"))?;
    parse_decimal(raw)
        .map_err(|_| ExportError::parse(format!("Invalid {MEAN_COLUMN} value '{raw}'")))
}
