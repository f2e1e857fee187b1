//! Planning a sync against a live Mahara site.
//!
//! Planning only reads: it fetches the institution context, the accounts and
//! (when requested) the groups, then reconciles the IDE file against them.
//! A username collision fails here, before any mutating call can be made.

use crate::Client;
use crate::error::Result;
use ide::IdeFile;
use reconcile::{
    ChangeSet, ExistingAccounts, GroupExtractor, GroupMembership, PasswordPolicy,
    PrivilegePattern, SourceIndex, UserReconciler, reconcile_groups,
};

/// What to plan
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// School domain used to synthesize account names
    pub domain: String,
    pub passwords: PasswordPolicy,
    /// Also reconcile groups
    pub groups: bool,
}

impl SyncOptions {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn passwords(mut self, passwords: PasswordPolicy) -> Self {
        self.passwords = passwords;
        self
    }

    #[must_use]
    pub fn groups(mut self, groups: bool) -> Self {
        self.groups = groups;
        self
    }
}

/// A computed change set and the institution it applies to
#[derive(Debug, Clone)]
pub struct Plan {
    pub institution: String,
    pub changes: ChangeSet,
}

/// Reconcile `file` against the site behind `client`.
pub fn plan(client: &Client, file: &IdeFile, options: &SyncOptions) -> Result<Plan> {
    let institution = client.context()?;
    log::info!("institution context: {institution}");

    let existing = ExistingAccounts::new(client.users()?);
    log::debug!("existing accounts: {}", existing.len());

    let source = SourceIndex::from_records(&file.records)?;
    let users = UserReconciler::new(options.domain.as_str())
        .institution(institution.as_str())
        .passwords(options.passwords.clone())
        .reconcile(&source, &existing)?;

    let groups = if options.groups {
        let existing_groups = client.groups()?;
        log::debug!(
            "existing groups: {:?}",
            existing_groups.iter().map(|g| &g.shortname).collect::<Vec<_>>()
        );

        let membership =
            GroupMembership::collect(&users, &GroupExtractor::new(PrivilegePattern::TEACHER));
        Some(reconcile_groups(&membership, &existing_groups, &institution))
    } else {
        None
    };

    Ok(Plan {
        institution,
        changes: ChangeSet { users, groups },
    })
}
