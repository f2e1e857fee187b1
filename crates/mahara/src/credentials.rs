//! Persisted OAuth access token.
//!
//! The token lives in a two-line file (token, then token secret). A
//! [`CredentialStore`] is handed to whoever needs the token; nothing reads
//! the file behind its back.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default token file, relative to the working directory.
pub const DEFAULT_TOKEN_FILE: &str = "oauth_token/mahara.oauth";

/// An OAuth token and its secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Token file on disk.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored token, if there is one.
    pub fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.is_file() {
            return Ok(None);
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let mut lines = content.lines().map(str::trim);

        match (lines.next(), lines.next()) {
            (Some(token), Some(secret)) if !token.is_empty() && !secret.is_empty() => {
                Ok(Some(Credentials::new(token, secret)))
            }
            _ => Err(Error::Credentials {
                path: self.path.clone(),
                message: "expected the token and the token secret on two lines".to_string(),
            }),
        }
    }

    /// Write the token, creating the parent directory.
    pub fn save(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let content = format!("{}\n{}\n", credentials.token, credentials.secret);
        std::fs::write(&self.path, content).map_err(|e| Error::io(&self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| Error::io(&self.path, e))?;
        }

        log::info!("saved OAuth token to {}", self.path.display());
        Ok(())
    }

    /// Remove the stored token. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }

    /// Load the stored token, or run `authorize` once and store its result.
    pub fn acquire(&self, authorize: impl FnOnce() -> Result<Credentials>) -> Result<Credentials> {
        if let Some(credentials) = self.load()? {
            log::debug!("using OAuth token from {}", self.path.display());
            return Ok(credentials);
        }

        log::info!("no OAuth token at {}, authorizing", self.path.display());
        let credentials = authorize()?;
        self.save(&credentials)?;
        Ok(credentials)
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("oauth_token/mahara.oauth"));

        assert!(store.load().unwrap().is_none());

        let credentials = Credentials::new("token", "secret");
        store.save(&credentials).unwrap();

        assert_eq!(
            std::fs::read_to_string(store.path()).unwrap(),
            "token\nsecret\n"
        );
        assert_eq!(store.load().unwrap(), Some(credentials));
    }

    #[test]
    fn test_load_rejects_single_line() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mahara.oauth");
        std::fs::write(&path, "token-only\n").unwrap();

        let result = CredentialStore::new(&path).load();
        assert!(matches!(result, Err(Error::Credentials { .. })));
    }

    #[test]
    fn test_acquire_authorizes_once() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("mahara.oauth"));

        let first = store
            .acquire(|| Ok(Credentials::new("t1", "s1")))
            .unwrap();
        assert_eq!(first.token, "t1");

        let second = store
            .acquire(|| panic!("should reuse the stored token"))
            .unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_acquire_propagates_failure() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("mahara.oauth"));

        let result = store.acquire(|| Err(Error::Authorization("denied".to_string())));
        assert!(result.is_err());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_clear() {
        let tmp = TempDir::new().unwrap();
        let store = CredentialStore::new(tmp.path().join("mahara.oauth"));
        store.clear().unwrap();

        store.save(&Credentials::new("t", "s")).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", Credentials::new("t", "very-secret"));
        assert!(!debug.contains("very-secret"));
    }
}
