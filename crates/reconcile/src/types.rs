//! Core types for user and group reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Auth instance whose `remoteuser` links an account to a source record
pub const INTERNAL_AUTH: &str = "internal";

/// Group type assigned to groups created from IDE memberships
pub const COURSE_GROUP_TYPE: &str = "course";

/// Normalized identity of a person across source and target
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Normalize a raw identifier (trimmed, lower-cased)
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role of a member within a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Teaching staff
    #[serde(rename = "tutor")]
    Privileged,
    /// Everyone else
    #[serde(rename = "member")]
    Ordinary,
}

impl Role {
    /// Role name in Mahara group payloads and CSV
    pub fn mahara_label(self) -> &'static str {
        match self {
            Self::Privileged => "tutor",
            Self::Ordinary => "member",
        }
    }

    /// Enrolment type in Moodle user CSV
    pub fn moodle_type(self) -> &'static str {
        match self {
            Self::Privileged => "2",
            Self::Ordinary => "1",
        }
    }

    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Privileged)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mahara_label())
    }
}

/// A complete account to create on the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    pub username: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub auth: String,
    pub institution: String,
    pub studentid: String,
    pub preferredname: String,
    pub remoteuser: String,
}

/// Sparse account update: only changed fields plus the account name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountUpdate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub studentid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferredname: Option<String>,
}

impl AccountUpdate {
    /// Start an empty update addressed to `username`
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    /// Names of the fields this update changes
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("email", &self.email),
            ("auth", &self.auth),
            ("institution", &self.institution),
            ("studentid", &self.studentid),
            ("preferredname", &self.preferredname),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(name, _)| name)
        .collect()
    }

    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }
}

/// Address of an account to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    pub username: String,
}

/// An auth instance attached to an existing account
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthInstance {
    pub auth: String,
    #[serde(default)]
    pub remoteuser: Option<String>,
}

/// An account as reported by the target
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExistingAccount {
    pub username: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub studentid: Option<String>,
    #[serde(default)]
    pub preferredname: Option<String>,
    #[serde(default)]
    pub auths: Vec<AuthInstance>,
}

impl ExistingAccount {
    /// Remote user linked through the given auth instance (last one wins)
    pub fn remote_user(&self, auth: &str) -> Option<&str> {
        self.auths
            .iter()
            .rev()
            .filter(|a| a.auth == auth)
            .find_map(|a| a.remoteuser.as_deref())
    }
}

/// A member of an existing group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExistingMember {
    pub username: String,
    #[serde(default)]
    pub role: String,
}

impl ExistingMember {
    /// Whether the target already treats this member as staff
    pub fn holds_privileged_role(&self) -> bool {
        matches!(self.role.as_str(), "tutor" | "admin")
    }
}

/// A group as reported by the target
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExistingGroup {
    pub shortname: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub members: Vec<ExistingMember>,
}

/// A member in a new group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub username: String,
    pub role: Role,
}

/// A group to create on the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCreate {
    pub shortname: String,
    pub institution: String,
    pub name: String,
    pub description: String,
    pub grouptype: String,
    pub request: u8,
    pub members: Vec<GroupMember>,
}

/// Incremental membership change on an existing group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum MemberAction {
    /// Add the member, or reassign its role
    Add { username: String, role: Role },
    /// Remove the member
    Remove { username: String },
}

impl MemberAction {
    pub fn username(&self) -> &str {
        match self {
            Self::Add { username, .. } | Self::Remove { username } => username,
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }
}

/// Membership changes for an existing group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupUpdate {
    pub shortname: String,
    pub institution: String,
    pub members: Vec<MemberAction>,
}

/// Address of a group to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRef {
    pub shortname: String,
    pub institution: String,
}
