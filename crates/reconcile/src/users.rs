//! User reconciliation
//!
//! Source records and existing accounts are both keyed on [`IdentityKey`]:
//! the source on `mlepSmsPersonId`, the target on the `remoteuser` of the
//! account's internal auth instance. The three partitions fall out of plain
//! set differences over those keys.

use crate::changes::{UserChangeSet, UserCreate, UserDelete, UserUpdate};
use crate::error::{Error, Result};
use crate::password::PasswordPolicy;
use crate::types::{
    AccountRecord, AccountRef, AccountUpdate, ExistingAccount, INTERNAL_AUTH, IdentityKey,
};
use ide::IdeRecord;
use std::collections::{BTreeMap, HashSet};

/// Source records indexed by identity key
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    records: BTreeMap<IdentityKey, IdeRecord>,
}

impl SourceIndex {
    /// Index records on their person identifier.
    ///
    /// A later record with the same key replaces the earlier one.
    pub fn from_records<'a, I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a IdeRecord>,
    {
        let mut index = BTreeMap::new();
        for record in records {
            let key = IdentityKey::new(record.person_id()?);
            if index.insert(key.clone(), record.clone()).is_some() {
                log::warn!(
                    "duplicate person id {key} at line {}, keeping the later record",
                    record.line()
                );
            }
        }
        Ok(Self { records: index })
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&IdeRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IdentityKey, &IdeRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Existing accounts indexed by linked remote user
#[derive(Debug, Clone, Default)]
pub struct ExistingAccounts {
    linked: BTreeMap<IdentityKey, ExistingAccount>,
    usernames: HashSet<String>,
}

impl ExistingAccounts {
    /// Index accounts on their internal auth instance
    pub fn new(accounts: Vec<ExistingAccount>) -> Self {
        Self::with_auth(accounts, INTERNAL_AUTH)
    }

    /// Index accounts on the remote user of the named auth instance.
    ///
    /// Accounts without that instance take no part in reconciliation but
    /// their names still count for collision checks.
    pub fn with_auth(accounts: Vec<ExistingAccount>, auth: &str) -> Self {
        let mut linked = BTreeMap::new();
        let mut usernames = HashSet::new();

        for account in accounts {
            usernames.insert(account.username.to_lowercase());
            if let Some(remote) = account.remote_user(auth) {
                linked.insert(IdentityKey::new(remote), account);
            }
        }

        log::debug!(
            "existing accounts: {} known, {} linked via {auth}",
            usernames.len(),
            linked.len()
        );
        Self { linked, usernames }
    }

    /// Case-insensitive check against every known account name
    pub fn contains_username(&self, username: &str) -> bool {
        self.usernames.contains(&username.to_lowercase())
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&ExistingAccount> {
        self.linked.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.linked.keys()
    }

    pub fn len(&self) -> usize {
        self.linked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.linked.is_empty()
    }
}

/// Computes user change sets
#[derive(Debug, Clone)]
pub struct UserReconciler {
    domain: String,
    institution: String,
    passwords: PasswordPolicy,
}

impl UserReconciler {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            institution: String::new(),
            passwords: PasswordPolicy::default(),
        }
    }

    /// Institution assigned to new accounts
    #[must_use]
    pub fn institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = institution.into();
        self
    }

    #[must_use]
    pub fn passwords(mut self, passwords: PasswordPolicy) -> Self {
        self.passwords = passwords;
        self
    }

    /// Account name synthesized for a person
    pub fn account_name(&self, person_id: &str) -> String {
        format!("{person_id}@{}", self.domain)
    }

    /// Partition `source` and `existing` into create, update and delete.
    ///
    /// Fails without building anything if a new account name is taken.
    pub fn reconcile(
        &self,
        source: &SourceIndex,
        existing: &ExistingAccounts,
    ) -> Result<UserChangeSet> {
        if self.domain.trim().is_empty() {
            return Err(Error::config("a school domain is required"));
        }

        let create_keys: Vec<_> = source.keys().filter(|k| existing.get(k).is_none()).collect();
        let update_keys: Vec<_> = source.keys().filter(|k| existing.get(k).is_some()).collect();
        let delete_keys: Vec<_> = existing.keys().filter(|k| !source.contains(k)).collect();

        log::info!("New users to process: {}", create_keys.len());
        log::info!("Update users to process: {}", update_keys.len());
        log::info!("Delete users to process: {}", delete_keys.len());
        log::debug!("create users: {create_keys:?}");
        log::debug!("update users: {update_keys:?}");
        log::debug!("delete users: {delete_keys:?}");

        let mut changes = UserChangeSet::default();

        for key in &create_keys {
            if let Some(record) = source.get(key) {
                let username = self.account_name(record.person_id()?);
                if existing.contains_username(&username) {
                    return Err(Error::Collision {
                        username,
                        key: key.to_string(),
                    });
                }
            }
        }

        for key in create_keys {
            if let Some(record) = source.get(key) {
                changes.create.push(UserCreate {
                    key: key.clone(),
                    account: self.build_account(record)?,
                    record: record.clone(),
                });
            }
        }

        for key in update_keys {
            if let (Some(record), Some(account)) = (source.get(key), existing.get(key)) {
                let update = self.diff_account(record, account)?;
                changes.update.push(UserUpdate {
                    key: key.clone(),
                    username: account.username.clone(),
                    changes: (!update.is_empty()).then_some(update),
                    record: record.clone(),
                });
            }
        }

        for key in delete_keys {
            if let Some(account) = existing.get(key) {
                changes.delete.push(UserDelete {
                    key: key.clone(),
                    account: AccountRef {
                        username: account.username.clone(),
                    },
                });
            }
        }

        Ok(changes)
    }

    fn build_account(&self, record: &IdeRecord) -> Result<AccountRecord> {
        let person_id = record.person_id()?;
        let firstname = record.first_name().unwrap_or_default();
        let lastname = record.last_name().unwrap_or_default();

        Ok(AccountRecord {
            username: self.account_name(person_id),
            password: self.passwords.resolve(record),
            firstname: firstname.to_string(),
            lastname: lastname.to_string(),
            email: record.email().unwrap_or_default().to_string(),
            auth: INTERNAL_AUTH.to_string(),
            institution: self.institution.clone(),
            studentid: person_id.to_string(),
            preferredname: preferred_name(firstname, lastname),
            remoteuser: person_id.to_string(),
        })
    }

    /// Fields the source supplies that differ from the account.
    ///
    /// A field the source does not carry is left alone. Auth and institution
    /// are only compared when the target reports them.
    fn diff_account(&self, record: &IdeRecord, account: &ExistingAccount) -> Result<AccountUpdate> {
        let person_id = record.person_id()?;
        let mut update = AccountUpdate::new(account.username.clone());

        update.firstname = changed(record.first_name(), account.firstname.as_deref());
        update.lastname = changed(record.last_name(), account.lastname.as_deref());
        update.email = changed(record.email(), account.email.as_deref());
        update.studentid = changed(Some(person_id), account.studentid.as_deref());

        if let (Some(first), Some(last)) = (record.first_name(), record.last_name()) {
            update.preferredname = changed(
                Some(preferred_name(first, last).as_str()),
                account.preferredname.as_deref(),
            );
        }

        if account.auth.is_some() {
            update.auth = changed(Some(INTERNAL_AUTH), account.auth.as_deref());
        }
        if account.institution.is_some() && !self.institution.is_empty() {
            update.institution = changed(Some(self.institution.as_str()), account.institution.as_deref());
        }

        Ok(update)
    }
}

fn preferred_name(first: &str, last: &str) -> String {
    format!("{first} {last}").trim().to_string()
}

fn changed(new: Option<&str>, current: Option<&str>) -> Option<String> {
    let new = new?;
    (new != current.unwrap_or_default()).then(|| new.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AuthInstance;
    use std::collections::BTreeSet;

    fn person(id: &str, first: &str, last: &str) -> IdeRecord {
        let email = format!("{}@hogwarts.school.nz", first.to_lowercase());
        IdeRecord::from_pairs([
            ("mlepSmsPersonId", id),
            ("mlepFirstName", first),
            ("mlepLastName", last),
            ("mlepEmail", email.as_str()),
        ])
    }

    fn account(username: &str, remote: &str, first: &str, last: &str) -> ExistingAccount {
        ExistingAccount {
            username: username.to_string(),
            firstname: Some(first.to_string()),
            lastname: Some(last.to_string()),
            email: Some(format!("{}@hogwarts.school.nz", first.to_lowercase())),
            auth: Some(INTERNAL_AUTH.to_string()),
            institution: Some("hogwarts".to_string()),
            studentid: Some(remote.to_string()),
            preferredname: Some(format!("{first} {last}")),
            auths: vec![AuthInstance {
                auth: INTERNAL_AUTH.to_string(),
                remoteuser: Some(remote.to_string()),
            }],
        }
    }

    fn reconciler() -> UserReconciler {
        UserReconciler::new("hogwarts.school.nz").institution("hogwarts")
    }

    fn keys<'a>(iter: impl Iterator<Item = &'a IdentityKey>) -> BTreeSet<String> {
        iter.map(ToString::to_string).collect()
    }

    #[test]
    fn test_partitions_cover_union() {
        let records = vec![
            person("S1", "Harry", "Potter"),
            person("s2", "Ron", "Weasley"),
        ];
        let source = SourceIndex::from_records(&records).unwrap();
        let existing = ExistingAccounts::new(vec![
            account("s2@hogwarts.school.nz", "S2", "Ron", "Weasley"),
            account("s3@hogwarts.school.nz", "s3", "Draco", "Malfoy"),
        ]);

        let changes = reconciler().reconcile(&source, &existing).unwrap();

        let create = keys(changes.create.iter().map(|c| &c.key));
        let update = keys(changes.update.iter().map(|u| &u.key));
        let delete = keys(changes.delete.iter().map(|d| &d.key));

        assert_eq!(create, BTreeSet::from(["s1".to_string()]));
        assert_eq!(update, BTreeSet::from(["s2".to_string()]));
        assert_eq!(delete, BTreeSet::from(["s3".to_string()]));
        assert_eq!(changes.delete[0].account.username, "s3@hogwarts.school.nz");
    }

    #[test]
    fn test_create_account_fields() {
        let records = vec![person("1001", "Harry", "Potter")];
        let source = SourceIndex::from_records(&records).unwrap();
        let changes = reconciler()
            .passwords(PasswordPolicy {
                default: Some("secret".to_string()),
                ..Default::default()
            })
            .reconcile(&source, &ExistingAccounts::default())
            .unwrap();

        let account = &changes.create[0].account;
        assert_eq!(account.username, "1001@hogwarts.school.nz");
        assert_eq!(account.password, "secret");
        assert_eq!(account.auth, "internal");
        assert_eq!(account.institution, "hogwarts");
        assert_eq!(account.studentid, "1001");
        assert_eq!(account.remoteuser, "1001");
        assert_eq!(account.preferredname, "Harry Potter");
    }

    #[test]
    fn test_identical_snapshots_are_idempotent() {
        let records = vec![person("1001", "Harry", "Potter")];
        let source = SourceIndex::from_records(&records).unwrap();
        let existing = ExistingAccounts::new(vec![account(
            "1001@hogwarts.school.nz",
            "1001",
            "Harry",
            "Potter",
        )]);

        let changes = reconciler().reconcile(&source, &existing).unwrap();

        assert!(changes.create.is_empty());
        assert!(changes.delete.is_empty());
        assert_eq!(changes.update.len(), 1);
        assert!(changes.update[0].changes.is_none());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_update_carries_only_changed_field() {
        let records = vec![person("1001", "Harry", "Potter")];
        let source = SourceIndex::from_records(&records).unwrap();
        let mut current = account("hpotter", "1001", "Harry", "Potter");
        current.email = Some("old@hogwarts.school.nz".to_string());
        let existing = ExistingAccounts::new(vec![current]);

        let changes = reconciler().reconcile(&source, &existing).unwrap();
        let update = changes.update[0].changes.as_ref().unwrap();

        assert_eq!(update.username, "hpotter");
        assert_eq!(update.changed_fields(), vec!["email"]);
        assert_eq!(update.email.as_deref(), Some("harry@hogwarts.school.nz"));
    }

    #[test]
    fn test_absent_source_field_is_unchanged() {
        let records = vec![IdeRecord::from_pairs([
            ("mlepSmsPersonId", "1001"),
            ("mlepFirstName", "Harry"),
        ])];
        let source = SourceIndex::from_records(&records).unwrap();
        let existing = ExistingAccounts::new(vec![account(
            "1001@hogwarts.school.nz",
            "1001",
            "Harry",
            "Potter",
        )]);

        let changes = reconciler().reconcile(&source, &existing).unwrap();
        assert!(changes.update[0].changes.is_none());
    }

    #[test]
    fn test_other_auth_accounts_are_ignored() {
        let records = vec![person("1001", "Harry", "Potter")];
        let source = SourceIndex::from_records(&records).unwrap();
        let mut ldap = account("potterh", "1001", "Harry", "Potter");
        ldap.auths[0].auth = "ldap".to_string();
        let existing = ExistingAccounts::new(vec![ldap]);

        let changes = reconciler().reconcile(&source, &existing).unwrap();

        assert_eq!(changes.create.len(), 1);
        assert!(changes.delete.is_empty());
    }

    #[test]
    fn test_collision_aborts() {
        let records = vec![person("1001", "Harry", "Potter")];
        let source = SourceIndex::from_records(&records).unwrap();
        let mut other = account("1001@Hogwarts.School.NZ", "x", "Someone", "Else");
        other.auths.clear();
        let existing = ExistingAccounts::new(vec![other]);

        let result = reconciler().reconcile(&source, &existing);
        match result {
            Err(Error::Collision { username, key }) => {
                assert_eq!(username, "1001@hogwarts.school.nz");
                assert_eq!(key, "1001");
            }
            other => panic!("Expected Collision, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_domain_is_configuration_error() {
        let result = UserReconciler::new("  ")
            .reconcile(&SourceIndex::default(), &ExistingAccounts::default());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_duplicate_source_keeps_later() {
        let records = vec![
            person("1001", "Harry", "Potter"),
            person("1001", "Harold", "Potter"),
        ];
        let source = SourceIndex::from_records(&records).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(
            source.get(&IdentityKey::new("1001")).unwrap().first_name(),
            Some("Harold")
        );
    }

    #[test]
    fn test_missing_person_id_is_error() {
        let records = vec![IdeRecord::from_pairs([("mlepFirstName", "Nobody")])];
        assert!(matches!(
            SourceIndex::from_records(&records),
            Err(Error::Record(_))
        ));
    }

    #[test]
    fn test_output_sorted_by_key() {
        let records = vec![
            person("c", "C", "C"),
            person("a", "A", "A"),
            person("b", "B", "B"),
        ];
        let source = SourceIndex::from_records(&records).unwrap();
        let changes = reconciler()
            .reconcile(&source, &ExistingAccounts::default())
            .unwrap();

        let order: Vec<_> = changes.create.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
