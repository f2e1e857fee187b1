//! Group extraction and group reconciliation
//!
//! Groups are implicit in the IDE: each `#`-separated token of
//! `mlepGroupMembership` names a group, and the `mlepRole` value is one more
//! group. A member's role inside every group is derived from `mlepRole`.

use crate::changes::{GroupChangeSet, UserChangeSet};
use crate::types::{
    COURSE_GROUP_TYPE, ExistingGroup, GroupCreate, GroupMember, GroupRef, GroupUpdate,
    MemberAction, Role,
};
use ide::IdeRecord;
use ide::fields::GROUP_SEPARATOR;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Role prefix marking teaching staff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegePattern(&'static str);

impl PrivilegePattern {
    /// Used when syncing through the API
    pub const TEACHER: Self = Self("Teacher");
    /// Used by the bulk-upload exports
    pub const TEACH: Self = Self("Teach");

    pub fn prefix(self) -> &'static str {
        self.0
    }

    /// Case-sensitive prefix match
    pub fn matches(self, role: &str) -> bool {
        role.starts_with(self.0)
    }
}

impl Default for PrivilegePattern {
    fn default() -> Self {
        Self::TEACHER
    }
}

/// Trim a group token and replace each whitespace character with `_`
pub fn normalize_group_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Derives group names and roles from records
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupExtractor {
    pattern: PrivilegePattern,
}

impl GroupExtractor {
    pub fn new(pattern: PrivilegePattern) -> Self {
        Self { pattern }
    }

    /// Groups a record belongs to, de-duplicated in first-seen order
    pub fn groups(&self, record: &IdeRecord) -> Vec<String> {
        let memberships = record
            .group_membership()
            .into_iter()
            .flat_map(|m| m.split(GROUP_SEPARATOR));

        let mut seen = BTreeSet::new();
        memberships
            .chain(record.role())
            .map(normalize_group_name)
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    pub fn role(&self, record: &IdeRecord) -> Role {
        match record.role() {
            Some(role) if self.pattern.matches(role) => Role::Privileged,
            _ => Role::Ordinary,
        }
    }
}

/// New group membership after the user changes apply
#[derive(Debug, Clone, Default)]
pub struct GroupMembership {
    groups: BTreeMap<String, BTreeMap<String, Role>>,
    roster: HashMap<String, Role>,
}

impl GroupMembership {
    /// Accumulate groups over the users that will exist afterwards.
    ///
    /// Only creates and updates contribute, so a deleted user never lands in
    /// a group.
    pub fn collect(changes: &UserChangeSet, extractor: &GroupExtractor) -> Self {
        let mut membership = Self::default();

        let created = changes
            .create
            .iter()
            .map(|c| (c.account.username.as_str(), &c.record));
        let updated = changes
            .update
            .iter()
            .map(|u| (u.username.as_str(), &u.record));

        for (username, record) in created.chain(updated) {
            let role = extractor.role(record);
            membership
                .roster
                .insert(username.to_lowercase(), role);
            for group in extractor.groups(record) {
                membership.add_member(&group, username, role);
            }
        }

        log::debug!("groups in source: {:?}", membership.groups.keys());
        membership
    }

    pub fn add_member(&mut self, group: &str, username: &str, role: Role) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(username.to_string(), role);
    }

    /// Members of a group, sorted by account name
    pub fn members(&self, group: &str) -> Option<&BTreeMap<String, Role>> {
        self.groups.get(group)
    }

    /// Group names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Role of a source user, by case-insensitive account name
    pub fn source_role(&self, username: &str) -> Option<Role> {
        self.roster.get(&username.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Diff new membership against the target's groups.
///
/// Existing members are only removed when they are ordinary source users;
/// staff and accounts the source does not know are left in place. Every new
/// member is (re-)added with its current role.
pub fn reconcile_groups(
    membership: &GroupMembership,
    existing: &[ExistingGroup],
    institution: &str,
) -> GroupChangeSet {
    let existing: BTreeMap<&str, &ExistingGroup> =
        existing.iter().map(|g| (g.shortname.as_str(), g)).collect();

    let mut changes = GroupChangeSet::default();

    for (name, members) in &membership.groups {
        match existing.get(name.as_str()) {
            None => changes.create.push(GroupCreate {
                shortname: name.clone(),
                institution: institution.to_string(),
                name: name.clone(),
                description: name.clone(),
                grouptype: COURSE_GROUP_TYPE.to_string(),
                request: 1,
                members: members
                    .iter()
                    .map(|(username, role)| GroupMember {
                        username: username.clone(),
                        role: *role,
                    })
                    .collect(),
            }),
            Some(group) => changes.update.push(update_group(membership, group, members)),
        }
    }

    for (name, group) in &existing {
        if !membership.groups.contains_key(*name) {
            changes.delete.push(GroupRef {
                shortname: group.shortname.clone(),
                institution: group.institution.clone(),
            });
        }
    }

    log::info!("New groups to process: {}", changes.create.len());
    log::info!("Update groups to process: {}", changes.update.len());
    log::info!("Delete groups to process: {}", changes.delete.len());

    changes
}

fn update_group(
    membership: &GroupMembership,
    group: &ExistingGroup,
    members: &BTreeMap<String, Role>,
) -> GroupUpdate {
    let wanted: BTreeSet<String> = members.keys().map(|u| u.to_lowercase()).collect();

    let removals = group
        .members
        .iter()
        .filter(|m| !wanted.contains(&m.username.to_lowercase()))
        .filter(|m| membership.source_role(&m.username) == Some(Role::Ordinary))
        .filter(|m| !m.holds_privileged_role())
        .map(|m| MemberAction::Remove {
            username: m.username.clone(),
        });

    let additions = members.iter().map(|(username, role)| MemberAction::Add {
        username: username.clone(),
        role: *role,
    });

    GroupUpdate {
        shortname: group.shortname.clone(),
        institution: group.institution.clone(),
        members: removals.chain(additions).collect(),
    }
}
