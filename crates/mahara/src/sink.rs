//! Applies a change set through the web services.

use crate::Client;
use reconcile::{ChangeSet, EmitSummary, Sink};

/// Which phases to apply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Phases {
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub groups: bool,
}

impl Phases {
    /// Every phase enabled
    pub fn all() -> Self {
        Self {
            create: true,
            update: true,
            delete: true,
            groups: true,
        }
    }
}

/// Sink that calls the Mahara web services.
///
/// Phases run in a fixed order: create, update and delete users, then
/// create, update and delete groups. There is no rollback; a failed call
/// leaves earlier phases applied.
pub struct ApiSink<'a> {
    client: &'a Client,
    phases: Phases,
}

impl<'a> ApiSink<'a> {
    pub fn new(client: &'a Client, phases: Phases) -> Self {
        Self { client, phases }
    }
}

impl Sink for ApiSink<'_> {
    fn name(&self) -> &'static str {
        "mahara"
    }

    fn emit(&mut self, changes: &ChangeSet) -> anyhow::Result<EmitSummary> {
        let mut summary = EmitSummary::default();
        let users = &changes.users;

        let creates: Vec<_> = users.create.iter().map(|c| c.account.clone()).collect();
        if self.phases.create && !creates.is_empty() {
            self.client.create_users(&creates)?;
            summary.created += creates.len();
        } else {
            summary.skip("create users");
        }

        let updates: Vec<_> = users.pending_updates().collect();
        if self.phases.update && !updates.is_empty() {
            self.client.update_users(&updates)?;
            summary.modified += updates.len();
        } else {
            summary.skip("update users");
        }

        let deletes: Vec<_> = users.delete.iter().map(|d| &d.account).collect();
        if self.phases.delete && !deletes.is_empty() {
            self.client.delete_users(&deletes)?;
            summary.removed += deletes.len();
        } else {
            summary.skip("delete users");
        }

        let groups = match (&changes.groups, self.phases.groups) {
            (Some(groups), true) => groups,
            _ => {
                summary.skip("group processing");
                return Ok(summary);
            }
        };

        log::info!("processing groups");
        if !groups.create.is_empty() {
            log::info!("processing group creates");
            self.client.create_groups(&groups.create)?;
            summary.created += groups.create.len();
        }

        let updates: Vec<_> = groups.update.iter().filter(|g| !g.members.is_empty()).collect();
        if !updates.is_empty() {
            log::info!("processing group updates");
            self.client.update_group_members(&updates)?;
            summary.modified += updates.len();
        }

        if !groups.delete.is_empty() {
            log::info!("processing group deletes");
            self.client.delete_groups(&groups.delete)?;
            summary.removed += groups.delete.len();
        }

        Ok(summary)
    }
}
