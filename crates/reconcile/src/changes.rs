//! Change sets produced by reconciliation

use crate::types::{
    AccountRecord, AccountRef, AccountUpdate, GroupCreate, GroupRef, GroupUpdate, IdentityKey,
};
use ide::IdeRecord;

/// A source record with no matching account
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub key: IdentityKey,
    /// Account to create
    pub account: AccountRecord,
    /// Source record the account was built from
    pub record: IdeRecord,
}

/// A source record matched to an existing account
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub key: IdentityKey,
    /// Name of the existing account
    pub username: String,
    /// Changed fields, or `None` when the account is already current
    pub changes: Option<AccountUpdate>,
    /// Source record
    pub record: IdeRecord,
}

/// An existing account with no source record
#[derive(Debug, Clone)]
pub struct UserDelete {
    pub key: IdentityKey,
    pub account: AccountRef,
}

/// User partitions, each sorted by identity key
#[derive(Debug, Clone, Default)]
pub struct UserChangeSet {
    pub create: Vec<UserCreate>,
    pub update: Vec<UserUpdate>,
    pub delete: Vec<UserDelete>,
}

impl UserChangeSet {
    /// Updates that actually change something
    pub fn pending_updates(&self) -> impl Iterator<Item = &AccountUpdate> {
        self.update.iter().filter_map(|u| u.changes.as_ref())
    }

    pub fn summary(&self) -> ChangeSummary {
        let modifications = self.pending_updates().count();
        ChangeSummary {
            additions: self.create.len(),
            modifications,
            removals: self.delete.len(),
            unchanged: self.update.len() - modifications,
        }
    }

    /// Check if applying this set would change nothing
    pub fn is_empty(&self) -> bool {
        !self.summary().has_changes()
    }
}

/// Group partitions, each sorted by short name
#[derive(Debug, Clone, Default)]
pub struct GroupChangeSet {
    pub create: Vec<GroupCreate>,
    pub update: Vec<GroupUpdate>,
    pub delete: Vec<GroupRef>,
}

impl GroupChangeSet {
    pub fn summary(&self) -> ChangeSummary {
        let modifications = self.update.iter().filter(|g| !g.members.is_empty()).count();
        ChangeSummary {
            additions: self.create.len(),
            modifications,
            removals: self.delete.len(),
            unchanged: self.update.len() - modifications,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.summary().has_changes()
    }
}

/// Everything a sink consumes
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub users: UserChangeSet,
    /// Absent when group processing was not requested
    pub groups: Option<GroupChangeSet>,
}

impl ChangeSet {
    /// Combined summary of users and groups
    pub fn summary(&self) -> ChangeSummary {
        let mut summary = self.users.summary();
        if let Some(groups) = &self.groups {
            summary.merge(&groups.summary());
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        !self.summary().has_changes()
    }
}

/// Change set statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Entries to create
    pub additions: usize,
    /// Entries to modify
    pub modifications: usize,
    /// Entries to delete
    pub removals: usize,
    /// Entries matched on both sides with nothing to do
    pub unchanged: usize,
}

impl ChangeSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.modifications + self.removals
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }

    /// Merge another summary into this one
    pub fn merge(&mut self, other: &ChangeSummary) {
        self.additions += other.additions;
        self.modifications += other.modifications;
        self.removals += other.removals;
        self.unchanged += other.unchanged;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(key: &str, changes: Option<AccountUpdate>) -> UserUpdate {
        UserUpdate {
            key: IdentityKey::new(key),
            username: format!("{key}@school.nz"),
            changes,
            record: IdeRecord::default(),
        }
    }

    #[test]
    fn test_user_summary_counts_unchanged() {
        let mut changed = AccountUpdate::new("1@school.nz");
        changed.email = Some("new@school.nz".to_string());

        let set = UserChangeSet {
            update: vec![update("1", Some(changed)), update("2", None)],
            delete: vec![UserDelete {
                key: IdentityKey::new("3"),
                account: AccountRef {
                    username: "3@school.nz".to_string(),
                },
            }],
            ..Default::default()
        };

        let summary = set.summary();
        assert_eq!(summary.modifications, 1);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.removals, 1);
        assert_eq!(summary.total(), 2);
    }

    #[test]
    fn test_unchanged_only_is_empty() {
        let set = UserChangeSet {
            update: vec![update("1", None)],
            ..Default::default()
        };
        assert!(set.is_empty());
    }

    #[test]
    fn test_change_set_merges_groups() {
        let set = ChangeSet {
            users: UserChangeSet::default(),
            groups: Some(GroupChangeSet {
                delete: vec![GroupRef {
                    shortname: "Old".to_string(),
                    institution: "school".to_string(),
                }],
                ..Default::default()
            }),
        };
        assert_eq!(set.summary().removals, 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_summary_merge() {
        let mut a = ChangeSummary {
            additions: 1,
            ..Default::default()
        };
        a.merge(&ChangeSummary {
            additions: 2,
            removals: 1,
            ..Default::default()
        });
        assert_eq!(a.additions, 3);
        assert_eq!(a.total(), 4);
    }
}
