//! Well-known IDE field names.

/// Unique person identifier assigned by the SMS.
pub const SMS_PERSON_ID: &str = "mlepSmsPersonId";

/// Login name, when the SMS exports one.
pub const USERNAME: &str = "mlepUsername";

/// Given name.
pub const FIRST_NAME: &str = "mlepFirstName";

/// Family name.
pub const LAST_NAME: &str = "mlepLastName";

/// Email address.
pub const EMAIL: &str = "mlepEmail";

/// Role in the school (e.g. `Student`, `TeachingStaff`).
pub const ROLE: &str = "mlepRole";

/// Multi-valued group membership, separated by [`GROUP_SEPARATOR`].
pub const GROUP_MEMBERSHIP: &str = "mlepGroupMembership";

/// Optional per-person initial password.
pub const PASSWORD: &str = "password";

/// Optional deletion marker.
pub const DELETED: &str = "deleted";

/// Separator between groups in [`GROUP_MEMBERSHIP`].
pub const GROUP_SEPARATOR: char = '#';
