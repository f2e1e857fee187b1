// Web-service sync
pub mod mahara;

// Bulk-upload CSV outputs
pub mod mahara_csv;
pub mod moodle_csv;

use anyhow::{Context, Result, bail};
use ide::IdeFile;
use reconcile::{
    ChangeSet, ExistingAccounts, GroupExtractor, GroupMembership, PasswordPolicy,
    PrivilegePattern, SourceIndex, UserReconciler, reconcile_groups,
};
use std::path::Path;

/// Take a required option from the command line or the config file.
pub fn require(flag: Option<&str>, config: Option<&str>, what: &str) -> Result<String> {
    match flag.or(config).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => {
            log::error!("You must specify the {what}.");
            bail!("You must specify the {what}.")
        }
    }
}

/// Load the IDE file, failing when it does not exist.
pub fn load_input(path: &Path) -> Result<IdeFile> {
    log::info!("CSV file to process: {}", path.display());
    if !path.is_file() {
        log::error!("CSV file not found: {}", path.display());
        bail!("CSV file not found: {}", path.display());
    }
    ide::parse_file(path).with_context(|| format!("Could not load {}", path.display()))
}

/// Load the IDE file for a CSV output; `None` when it holds no records.
pub fn load_csv_input(path: &Path) -> Result<Option<IdeFile>> {
    let file = match load_input(path) {
        Ok(file) => file,
        Err(err) if matches!(err.downcast_ref::<ide::Error>(), Some(ide::Error::MissingHeader)) => {
            log::info!("CSV file is empty");
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    if file.is_empty() {
        log::info!("CSV file is empty");
        return Ok(None);
    }
    Ok(Some(file))
}

/// Reconcile a file against an empty target, as the CSV outputs do.
///
/// Every record becomes a create and every group a new group.
pub fn offline_changes(
    file: &IdeFile,
    domain: &str,
    passwords: PasswordPolicy,
    pattern: PrivilegePattern,
) -> Result<ChangeSet> {
    let source = SourceIndex::from_records(&file.records)?;
    let users = UserReconciler::new(domain)
        .passwords(passwords)
        .reconcile(&source, &ExistingAccounts::default())?;

    let membership = GroupMembership::collect(&users, &GroupExtractor::new(pattern));
    let groups = reconcile_groups(&membership, &[], "");

    Ok(ChangeSet {
        users,
        groups: Some(groups),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_require_prefers_flag() {
        assert_eq!(require(Some("a"), Some("b"), "domain").unwrap(), "a");
        assert_eq!(require(None, Some("b"), "domain").unwrap(), "b");
    }

    #[test]
    fn test_require_missing() {
        let err = require(None, None, "school domain").unwrap_err();
        assert_eq!(err.to_string(), "You must specify the school domain.");
        assert!(require(Some("  "), None, "school domain").is_err());
    }

    #[test]
    fn test_load_input_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = load_input(&tmp.path().join("ide.csv")).unwrap_err();
        assert!(err.to_string().contains("CSV file not found"));
    }

    #[test]
    fn test_load_csv_input_empty() {
        let tmp = TempDir::new().unwrap();

        let blank = tmp.path().join("blank.csv");
        std::fs::write(&blank, "# nothing yet\n\n").unwrap();
        assert!(load_csv_input(&blank).unwrap().is_none());

        let header_only = tmp.path().join("header.csv");
        std::fs::write(&header_only, "mlepSmsPersonId,mlepFirstName\n").unwrap();
        assert!(load_csv_input(&header_only).unwrap().is_none());
    }

    #[test]
    fn test_offline_changes() {
        let file = ide::parse_str(
            "mlepSmsPersonId,mlepRole,mlepGroupMembership\n\
             t1,TeachingStaff,Year 7\n\
             s1,Student,Year 7\n",
        )
        .unwrap();

        let changes = offline_changes(
            &file,
            "school.nz",
            PasswordPolicy::default(),
            PrivilegePattern::TEACH,
        )
        .unwrap();

        assert_eq!(changes.users.create.len(), 2);
        assert!(changes.users.update.is_empty() && changes.users.delete.is_empty());

        let groups = changes.groups.unwrap();
        let year7 = groups
            .create
            .iter()
            .find(|g| g.shortname == "Year_7")
            .unwrap();
        assert_eq!(year7.members.len(), 2);
        assert!(
            year7
                .members
                .iter()
                .any(|m| m.username == "t1@school.nz" && m.role.is_privileged())
        );
    }
}
