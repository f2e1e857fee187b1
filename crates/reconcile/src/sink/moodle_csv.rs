//! Moodle bulk-upload CSV output

use super::table::{CsvTable, user_row};
use super::{EmitSummary, Sink};
use crate::changes::ChangeSet;
use crate::groups::GroupExtractor;
use crate::schema::FieldSet;
use anyhow::Result;
use std::path::PathBuf;

pub const MOODLE_USERS_FILE: &str = "moodle-users.csv";
pub const COURSES_FILE: &str = "moodle-courses.csv";

#[derive(Debug, Clone, Default)]
pub struct MoodleCsvOptions {
    pub output_dir: PathBuf,
    /// Write the user file
    pub users: bool,
    /// Write the course file
    pub courses: bool,
    /// Append `course{N}`/`type{N}` enrolment columns to the user file
    pub enrol: bool,
    /// Set `deleted` to `1` on every row
    pub mark_deleted: bool,
}

/// Writes Moodle's user and course upload files
#[derive(Debug, Clone)]
pub struct MoodleCsvSink {
    fields: FieldSet,
    extractor: GroupExtractor,
    options: MoodleCsvOptions,
}

impl MoodleCsvSink {
    pub fn new(fields: FieldSet, extractor: GroupExtractor, options: MoodleCsvOptions) -> Self {
        Self {
            fields,
            extractor,
            options,
        }
    }

    /// User table, with enrolment columns when enabled
    pub fn users_table(&self, changes: &ChangeSet) -> CsvTable {
        let mut table = CsvTable::new(self.fields.targets());
        let mut course_max = 0;

        for create in &changes.users.create {
            let mut row = user_row(
                &self.fields,
                &create.account,
                &create.record,
                self.options.mark_deleted,
            );

            if self.options.enrol {
                let courses = self.extractor.groups(&create.record);
                let kind = self.extractor.role(&create.record).moodle_type();
                course_max = course_max.max(courses.len());
                for course in courses {
                    row.push(course);
                    row.push(kind.to_string());
                }
            }
            table.push(row);
        }

        for n in 1..=course_max {
            table.header.push(format!("course{n}"));
            table.header.push(format!("type{n}"));
        }
        table.pad();
        table
    }

    /// Course table: one course per group
    pub fn courses_table(&self, changes: &ChangeSet) -> CsvTable {
        let mut table = CsvTable::new([
            "fullname",
            "shortname",
            "category",
            "sortorder",
            "idnumber",
            "summary",
        ]);

        let created = changes.groups.iter().flat_map(|g| g.create.iter());
        for (i, group) in created.enumerate() {
            table.push(vec![
                group.name.clone(),
                group.shortname.clone(),
                group.shortname.clone(),
                String::new(),
                (i + 1).to_string(),
                group.description.clone(),
            ]);
        }
        table
    }
}

impl Sink for MoodleCsvSink {
    fn name(&self) -> &'static str {
        "moodle-csv"
    }

    fn emit(&mut self, changes: &ChangeSet) -> Result<EmitSummary> {
        let mut summary = EmitSummary::default();
        let dir = &self.options.output_dir;

        let users = self.users_table(changes);
        log::info!("user records: {}", users.len());
        if self.options.users {
            summary.files.push(users.write_file(dir, MOODLE_USERS_FILE)?);
            summary.created += users.len();
        } else {
            summary.skip("user file");
        }

        let courses = self.courses_table(changes);
        log::info!("courses records: {}", courses.len());
        if self.options.courses {
            summary.files.push(courses.write_file(dir, COURSES_FILE)?);
            summary.created += courses.len();
        } else {
            summary.skip("course file");
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groups::{GroupMembership, PrivilegePattern, reconcile_groups};
    use crate::password::PasswordPolicy;
    use crate::schema::{FieldMap, SyntheticFields};
    use crate::users::{ExistingAccounts, SourceIndex, UserReconciler};
    use tempfile::TempDir;

    fn build(content: &str, passwords: PasswordPolicy) -> (ide::IdeFile, ChangeSet) {
        let file = ide::parse_str(content).unwrap();
        let source = SourceIndex::from_records(&file.records).unwrap();
        let users = UserReconciler::new("school.nz")
            .passwords(passwords)
            .reconcile(&source, &ExistingAccounts::default())
            .unwrap();
        let extractor = GroupExtractor::new(PrivilegePattern::TEACH);
        let membership = GroupMembership::collect(&users, &extractor);
        let groups = reconcile_groups(&membership, &[], "");
        (
            file,
            ChangeSet {
                users,
                groups: Some(groups),
            },
        )
    }

    const IDE: &str = "mlepSmsPersonId,mlepFirstName,mlepRole,mlepGroupMembership\n\
                       a,Albus,TeachingStaff,Charms#Potions\n\
                       b,Bill,Student,\n";

    fn make_sink(file: &ide::IdeFile, options: MoodleCsvOptions, synthetic: SyntheticFields) -> MoodleCsvSink {
        let fields = FieldMap::moodle_users()
            .unwrap()
            .available(&file.header, synthetic);
        MoodleCsvSink::new(fields, GroupExtractor::new(PrivilegePattern::TEACH), options)
    }

    #[test]
    fn test_enrolment_columns_are_padded() {
        let (file, changes) = build(IDE, PasswordPolicy::default());
        let sink = make_sink(
            &file,
            MoodleCsvOptions {
                enrol: true,
                ..Default::default()
            },
            SyntheticFields::default(),
        );

        let table = sink.users_table(&changes);
        assert_eq!(
            table.header,
            vec![
                "firstname", "idnumber", "course1", "type1", "course2", "type2", "course3",
                "type3"
            ]
        );
        assert_eq!(
            table.rows[0],
            vec![
                "Albus",
                "a",
                "Charms",
                "2",
                "Potions",
                "2",
                "TeachingStaff",
                "2"
            ]
        );
        assert_eq!(
            table.rows[1],
            vec!["Bill", "b", "Student", "1", "", "", "", ""]
        );
    }

    #[test]
    fn test_delete_and_empty_password() {
        let (file, changes) = build(
            IDE,
            PasswordPolicy {
                empty: true,
                ..Default::default()
            },
        );
        let sink = make_sink(
            &file,
            MoodleCsvOptions {
                mark_deleted: true,
                ..Default::default()
            },
            SyntheticFields {
                password: true,
                deleted: true,
            },
        );

        let table = sink.users_table(&changes);
        assert_eq!(
            table.header,
            vec!["password", "firstname", "idnumber", "deleted"]
        );
        assert_eq!(table.rows[0], vec!["", "Albus", "a", "1"]);
    }

    #[test]
    fn test_courses_file() {
        let tmp = TempDir::new().unwrap();
        let (file, changes) = build(IDE, PasswordPolicy::default());
        let mut sink = make_sink(
            &file,
            MoodleCsvOptions {
                output_dir: tmp.path().to_path_buf(),
                courses: true,
                ..Default::default()
            },
            SyntheticFields::default(),
        );

        let summary = sink.emit(&changes).unwrap();
        assert_eq!(summary.skipped, vec!["user file"]);

        let courses = std::fs::read_to_string(tmp.path().join(COURSES_FILE)).unwrap();
        assert_eq!(
            courses,
            "fullname,shortname,category,sortorder,idnumber,summary\n\
             Charms,Charms,Charms,,1,Charms\n\
             Potions,Potions,Potions,,2,Potions\n\
             Student,Student,Student,,3,Student\n\
             TeachingStaff,TeachingStaff,TeachingStaff,,4,TeachingStaff\n"
        );
    }
}
