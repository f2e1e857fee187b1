//! Parser for IDE CSV files.
//!
//! Lines are pre-filtered before the CSV tokenizer sees them:
//! ```text
//! # comment lines are dropped
//!
//! 2011-06-01 08:30:00              <- standalone timestamp, dropped (kept on IdeFile)
//! mlepSmsPersonId,mlepFirstName    <- first remaining row is the header
//! 1001,Harry
//! ```

use crate::error::{Error, Result};
use crate::record::{IdeFile, IdeRecord};
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static TIMESTAMP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d\d-\d\d \d\d:\d\d:\d\d$").expect("timestamp pattern is valid")
});

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an IDE file from a path.
pub fn parse_file(path: &Path) -> Result<IdeFile> {
    if !path.is_file() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let mut file = parse_str(&content)?;
    file.path = Some(path.to_path_buf());
    Ok(file)
}

/// Parse an IDE file from a string.
pub fn parse_str(content: &str) -> Result<IdeFile> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut file = IdeFile::default();
    let kept = filter_lines(content, &mut file);

    let joined = kept
        .iter()
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(joined.as_bytes());

    for (idx, row) in reader.records().enumerate() {
        let original_line = kept.get(idx).map_or(0, |(n, _)| *n);
        let row = row.map_err(|e| Error::Csv {
            line: original_line,
            message: e.to_string(),
        })?;

        if file.header.is_empty() {
            file.header = row.iter().map(str::to_string).collect();
            continue;
        }

        // Short rows simply lack the trailing fields; extra cells are ignored.
        let mut record = IdeRecord::new(original_line);
        for (field, value) in file.header.iter().zip(row.iter()) {
            record.insert(field.as_str(), value);
        }
        file.records.push(record);
    }

    if file.header.is_empty() {
        return Err(Error::MissingHeader);
    }

    log::debug!(
        "parsed IDE file: {} fields, {} records",
        file.header.len(),
        file.records.len()
    );
    Ok(file)
}

/// Drop comment, blank and timestamp lines, returning `(line number, text)`.
fn filter_lines<'a>(content: &'a str, file: &mut IdeFile) -> Vec<(usize, &'a str)> {
    let mut kept = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if TIMESTAMP_LINE.is_match(line) {
            log::info!("found timestamp: {line}");
            if file.timestamp.is_none() {
                file.timestamp = NaiveDateTime::parse_from_str(line, TIMESTAMP_FORMAT).ok();
            }
            continue;
        }

        kept.push((idx + 1, line));
    }

    kept
}
