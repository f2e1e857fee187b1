//! Initial passwords for new accounts

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use ide::IdeRecord;
use rand::{RngCore, rngs::OsRng};

/// Generate a throwaway initial password.
///
/// 72 random bits (URL-safe base64) followed by the current unix time, so
/// two runs never hand out the same value.
pub fn generate_password() -> String {
    let mut bytes = [0u8; 9];
    OsRng.fill_bytes(&mut bytes);
    format!("pass{}{}", URL_SAFE_NO_PAD.encode(bytes), Utc::now().timestamp())
}

/// How the password of a new account is chosen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Fallback password when the record carries none
    pub default: Option<String>,
    /// Always generate, ignoring record and default
    pub generate: bool,
    /// Always leave the password empty
    pub empty: bool,
}

impl PasswordPolicy {
    /// Whether any option supplies passwords without a source column
    pub fn is_active(&self) -> bool {
        self.default.is_some() || self.generate || self.empty
    }

    /// Resolve the password for one record.
    ///
    /// Precedence: empty flag, generate flag, the record's own `password`
    /// column, the default, and finally a generated value.
    pub fn resolve(&self, record: &IdeRecord) -> String {
        if self.empty {
            return String::new();
        }
        if self.generate {
            return generate_password();
        }
        if let Some(password) = record.password() {
            return password.to_string();
        }
        self.default.clone().unwrap_or_else(generate_password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_password(password: &str) -> IdeRecord {
        IdeRecord::from_pairs([("mlepSmsPersonId", "1"), ("password", password)])
    }

    #[test]
    fn test_generated_passwords_differ() {
        let a = generate_password();
        let b = generate_password();
        assert!(a.starts_with("pass"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_beats_default() {
        let policy = PasswordPolicy {
            default: Some("default".to_string()),
            ..Default::default()
        };
        assert_eq!(policy.resolve(&record_with_password("mine")), "mine");
    }

    #[test]
    fn test_default_when_record_has_none() {
        let policy = PasswordPolicy {
            default: Some("default".to_string()),
            ..Default::default()
        };
        let record = IdeRecord::from_pairs([("mlepSmsPersonId", "1")]);
        assert_eq!(policy.resolve(&record), "default");
    }

    #[test]
    fn test_generated_when_nothing_given() {
        let policy = PasswordPolicy::default();
        let record = IdeRecord::from_pairs([("mlepSmsPersonId", "1")]);
        assert!(policy.resolve(&record).starts_with("pass"));
        assert!(!policy.is_active());
    }

    #[test]
    fn test_flags_override_record() {
        let record = record_with_password("mine");

        let generate = PasswordPolicy {
            generate: true,
            ..Default::default()
        };
        assert_ne!(generate.resolve(&record), "mine");

        let empty = PasswordPolicy {
            generate: true,
            empty: true,
            ..Default::default()
        };
        assert_eq!(empty.resolve(&record), "");
    }
}
