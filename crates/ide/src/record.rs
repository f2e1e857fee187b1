//! Loaded IDE records.

use crate::error::{Error, Result};
use crate::fields;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One person from an IDE file: a mapping from field name to trimmed value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeRecord {
    line: usize,
    values: BTreeMap<String, String>,
}

impl IdeRecord {
    /// Create an empty record originating from the given 1-based line.
    pub fn new(line: usize) -> Self {
        Self {
            line,
            values: BTreeMap::new(),
        }
    }

    /// Build a record from `(field, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new(0);
        for (field, value) in pairs {
            record.insert(field, value);
        }
        record
    }

    /// Line the record was read from (0 when built in memory).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Set a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    /// Get a field value, if the field is present.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    /// Get a field value only when it is present and non-empty.
    pub fn non_empty(&self, field: &str) -> Option<&str> {
        self.get(field).filter(|v| !v.is_empty())
    }

    /// Whether the field is present (possibly empty).
    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Iterate over `(field, value)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The SMS person identifier. Every usable record carries one.
    pub fn person_id(&self) -> Result<&str> {
        self.non_empty(fields::SMS_PERSON_ID)
            .ok_or_else(|| Error::missing_field(self.line, fields::SMS_PERSON_ID))
    }

    /// Given name.
    pub fn first_name(&self) -> Option<&str> {
        self.get(fields::FIRST_NAME)
    }

    /// Family name.
    pub fn last_name(&self) -> Option<&str> {
        self.get(fields::LAST_NAME)
    }

    /// Email address.
    pub fn email(&self) -> Option<&str> {
        self.get(fields::EMAIL)
    }

    /// School role, when present and non-empty.
    pub fn role(&self) -> Option<&str> {
        self.non_empty(fields::ROLE)
    }

    /// Raw group membership list, when present and non-empty.
    pub fn group_membership(&self) -> Option<&str> {
        self.non_empty(fields::GROUP_MEMBERSHIP)
    }

    /// Per-person password column. An empty value still counts as supplied.
    pub fn password(&self) -> Option<&str> {
        self.get(fields::PASSWORD)
    }
}

/// A parsed IDE file.
#[derive(Debug, Clone, Default)]
pub struct IdeFile {
    /// Where the file was read from, if it came from disk.
    pub path: Option<PathBuf>,
    /// Export timestamp line, if the file carried one.
    pub timestamp: Option<NaiveDateTime>,
    /// Header field names, in file order.
    pub header: Vec<String>,
    /// Data records, in file order.
    pub records: Vec<IdeRecord>,
}

impl IdeFile {
    /// Number of data records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the file has no data records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the header names the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.header.iter().any(|h| h == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let record = IdeRecord::from_pairs([
            ("mlepSmsPersonId", "1001"),
            ("mlepFirstName", "Harry"),
            ("mlepRole", ""),
            ("password", ""),
        ]);

        assert_eq!(record.person_id().unwrap(), "1001");
        assert_eq!(record.first_name(), Some("Harry"));
        assert_eq!(record.last_name(), None);
        assert_eq!(record.role(), None);
        assert_eq!(record.password(), Some(""));
    }

    #[test]
    fn test_person_id_missing() {
        let mut record = IdeRecord::new(12);
        record.insert("mlepFirstName", "Ron");

        match record.person_id() {
            Err(Error::MissingField { line, field }) => {
                assert_eq!(line, 12);
                assert_eq!(field, "mlepSmsPersonId");
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_file_has_field() {
        let file = IdeFile {
            header: vec!["mlepSmsPersonId".into(), "mlepEmail".into()],
            ..Default::default()
        };
        assert!(file.has_field("mlepEmail"));
        assert!(!file.has_field("password"));
        assert!(file.is_empty());
    }
}
