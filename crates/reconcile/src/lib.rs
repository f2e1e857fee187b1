//! # Reconcile
//!
//! Reconciliation of IDE source records against a target directory of user
//! accounts and groups.
//!
//! ## Core Concepts
//!
//! - **IdentityKey**: the normalized person identifier both sides are keyed on
//! - **FieldMap / FieldSet**: target schema tables and the columns a run can populate
//! - **GroupExtractor**: groups and roles implied by a record
//! - **UserReconciler**: create/update/delete partitions for accounts
//! - **reconcile_groups**: create/update/delete partitions for groups
//! - **Sink**: consumes a [`ChangeSet`] (CSV files or remote calls)
//!
//! ## Example
//!
//! ```
//! use reconcile::{
//!     ChangeSet, ExistingAccounts, GroupExtractor, GroupMembership, SourceIndex,
//!     UserReconciler, reconcile_groups,
//! };
//!
//! let file = ide::parse_str(
//!     "mlepSmsPersonId,mlepRole,mlepGroupMembership\ns1,Teacher,Math#Science\n",
//! )?;
//! let source = SourceIndex::from_records(&file.records)?;
//!
//! let users = UserReconciler::new("school.nz")
//!     .reconcile(&source, &ExistingAccounts::default())?;
//! let membership = GroupMembership::collect(&users, &GroupExtractor::default());
//! let groups = reconcile_groups(&membership, &[], "school");
//!
//! let changes = ChangeSet { users, groups: Some(groups) };
//! assert_eq!(changes.users.create.len(), 1);
//! assert_eq!(changes.groups.as_ref().map(|g| g.create.len()), Some(3));
//! # Ok::<(), reconcile::Error>(())
//! ```

pub mod changes;
pub mod error;
pub mod groups;
pub mod password;
pub mod schema;
pub mod sink;
pub mod types;
pub mod users;

// Re-export main types at crate root
pub use changes::{
    ChangeSet, ChangeSummary, GroupChangeSet, UserChangeSet, UserCreate, UserDelete, UserUpdate,
};
pub use error::{Error, Result};
pub use groups::{
    GroupExtractor, GroupMembership, PrivilegePattern, normalize_group_name, reconcile_groups,
};
pub use password::{PasswordPolicy, generate_password};
pub use schema::{FieldMap, FieldSet, SyntheticFields};
pub use sink::{EmitSummary, Sink};
pub use types::{
    AccountRecord, AccountRef, AccountUpdate, AuthInstance, ExistingAccount, ExistingGroup,
    ExistingMember, GroupCreate, GroupMember, GroupRef, GroupUpdate, INTERNAL_AUTH, IdentityKey,
    MemberAction, Role,
};
pub use users::{ExistingAccounts, SourceIndex, UserReconciler};
