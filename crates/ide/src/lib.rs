//! # ide
//!
//! Reader for the IDE (Identity Data Extract) CSV format that New Zealand
//! student management systems generate to describe users for the school
//! user directory.
//!
//! An IDE file is plain comma-separated text with a header row. Before the
//! header (and between records) it may carry:
//! - `#` comment lines
//! - blank lines
//! - a single `YYYY-MM-DD HH:MM:SS` timestamp line
//!
//! These are discarded before tokenizing. Every field value is trimmed.
//!
//! ## Example
//!
//! ```
//! let content = "\
//! ## exported from the SMS
//! 2011-06-01 08:30:00
//! mlepSmsPersonId,mlepFirstName,mlepLastName,mlepRole
//! 1001,Harry,Potter,Student
//! ";
//!
//! let file = ide::parse_str(content).unwrap();
//! assert_eq!(file.len(), 1);
//! assert_eq!(file.records[0].person_id().unwrap(), "1001");
//! assert!(file.timestamp.is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fields;
pub mod reader;
pub mod record;

pub use error::{Error, Result};
pub use reader::{parse_file, parse_str};
pub use record::{IdeFile, IdeRecord};
