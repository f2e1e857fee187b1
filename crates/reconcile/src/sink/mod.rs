//! Sinks consume a [`ChangeSet`]
//!
//! A sink either serializes the change set into bulk-upload CSV tables or
//! turns it into remote calls. The CSV sinks live here; the remote sink
//! lives with its transport.

mod mahara_csv;
mod moodle_csv;
mod table;

pub use mahara_csv::{GROUPS_FILE, GROUP_MEMBERS_FILE, MaharaCsvOptions, MaharaCsvSink, USERS_FILE};
pub use moodle_csv::{COURSES_FILE, MOODLE_USERS_FILE, MoodleCsvOptions, MoodleCsvSink};
pub use table::CsvTable;

use crate::changes::ChangeSet;
use anyhow::Result;
use std::path::PathBuf;

/// Destination for a change set
pub trait Sink {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    /// Emit the change set
    fn emit(&mut self, changes: &ChangeSet) -> Result<EmitSummary>;
}

/// What a sink did with a change set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    /// Phases not run because they were not requested
    pub skipped: Vec<String>,
    /// Files written
    pub files: Vec<PathBuf>,
}

impl EmitSummary {
    /// Total number of changes applied or written
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    /// Record a skipped phase
    pub fn skip(&mut self, phase: impl Into<String>) {
        let phase = phase.into();
        log::info!("{phase} skipped");
        self.skipped.push(phase);
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: EmitSummary) {
        self.created += other.created;
        self.modified += other.modified;
        self.removed += other.removed;
        self.skipped.extend(other.skipped);
        self.files.extend(other.files);
    }
}
