//! In-memory CSV tables and file output

use crate::error::{Error, Result};
use crate::schema::FieldSet;
use crate::types::AccountRecord;
use ide::IdeRecord;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A header row plus data rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Pad the header and every row with empty cells up to the widest row
    pub fn pad(&mut self) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or_default();

        self.header.resize(width, String::new());
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    /// Serialize to any writer
    pub fn write_to<W: Write>(&self, writer: W) -> std::result::Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .flexible(true)
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(writer);

        csv_writer.write_record(&self.header)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to `dir/name`, creating `dir` if needed
    pub fn write_file(&self, dir: &Path, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        let path = dir.join(name);
        let file = std::fs::File::create(&path).map_err(|e| Error::io(&path, e))?;
        self.write_to(std::io::BufWriter::new(file))
            .map_err(|e| Error::csv(&path, e))?;

        log::info!("wrote {} ({} rows)", path.display(), self.len());
        Ok(path)
    }
}

/// Build a user row for the given columns.
///
/// `username` and `password` come from the new account, `deleted` is `1`
/// when `mark_deleted` is set, and every other column copies its IDE source.
pub fn user_row(
    fields: &FieldSet,
    account: &AccountRecord,
    record: &IdeRecord,
    mark_deleted: bool,
) -> Vec<String> {
    fields
        .iter()
        .map(|(target, source)| match target {
            "username" => account.username.clone(),
            "password" => account.password.clone(),
            "deleted" if mark_deleted => "1".to_string(),
            _ => record.get(source).unwrap_or_default().to_string(),
        })
        .collect()
}
