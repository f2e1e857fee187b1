//! Mahara bulk-upload CSV output

use super::table::{CsvTable, user_row};
use super::{EmitSummary, Sink};
use crate::changes::ChangeSet;
use crate::schema::FieldSet;
use crate::types::COURSE_GROUP_TYPE;
use anyhow::Result;
use std::path::PathBuf;

pub const USERS_FILE: &str = "mahara-users.csv";
pub const GROUPS_FILE: &str = "mahara-groups.csv";
pub const GROUP_MEMBERS_FILE: &str = "mahara-groups-members.csv";

const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Default)]
pub struct MaharaCsvOptions {
    /// Directory the files are written to
    pub output_dir: PathBuf,
    /// Write the user file
    pub users: bool,
    /// Write the group and group member files
    pub groups: bool,
    /// Account added to every group as its admin
    pub admin: String,
}

/// Writes Mahara's user, group and group member upload files
#[derive(Debug, Clone)]
pub struct MaharaCsvSink {
    fields: FieldSet,
    options: MaharaCsvOptions,
}

impl MaharaCsvSink {
    pub fn new(fields: FieldSet, options: MaharaCsvOptions) -> Self {
        Self { fields, options }
    }

    /// User table: one row per new account
    pub fn users_table(&self, changes: &ChangeSet) -> CsvTable {
        let mut table = CsvTable::new(self.fields.targets());
        for create in &changes.users.create {
            table.push(user_row(&self.fields, &create.account, &create.record, false));
        }
        table
    }

    /// Group and group member tables
    pub fn group_tables(&self, changes: &ChangeSet) -> (CsvTable, CsvTable) {
        let mut groups = CsvTable::new(["shortname", "displayname", "description", "roles", "request"]);
        let mut members = CsvTable::new(["shortname", "username", "role"]);

        let created = changes.groups.iter().flat_map(|g| g.create.iter());
        for group in created {
            groups.push(vec![
                group.shortname.clone(),
                group.name.clone(),
                group.description.clone(),
                COURSE_GROUP_TYPE.to_string(),
                group.request.to_string(),
            ]);
            members.push(vec![
                group.shortname.clone(),
                self.options.admin.clone(),
                ADMIN_ROLE.to_string(),
            ]);
            for member in &group.members {
                members.push(vec![
                    group.shortname.clone(),
                    member.username.clone(),
                    member.role.mahara_label().to_string(),
                ]);
            }
        }

        (groups, members)
    }
}

impl Sink for MaharaCsvSink {
    fn name(&self) -> &'static str {
        "mahara-csv"
    }

    fn emit(&mut self, changes: &ChangeSet) -> Result<EmitSummary> {
        let mut summary = EmitSummary::default();
        let dir = &self.options.output_dir;

        let users = self.users_table(changes);
        log::info!("user records: {}", users.len());
        if self.options.users {
            summary.files.push(users.write_file(dir, USERS_FILE)?);
            summary.created += users.len();
        } else {
            summary.skip("user file");
        }

        let (groups, members) = self.group_tables(changes);
        log::info!("group records: {}", groups.len());
        log::info!("group member records: {}", members.len());
        if self.options.groups {
            summary.files.push(groups.write_file(dir, GROUPS_FILE)?);
            summary.files.push(members.write_file(dir, GROUP_MEMBERS_FILE)?);
            summary.created += groups.len();
        } else {
            summary.skip("group files");
        }

        Ok(summary)
    }
}
