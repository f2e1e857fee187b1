use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the default config file path
pub fn default_path() -> Result<PathBuf> {
    let dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(dir.join("ide-sync").join("config.toml"))
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

// ============================================================================
// Config File
// ============================================================================

/// Defaults read from `config.toml`; command-line flags win over these.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// School domain
    pub domain: Option<String>,
    /// Group admin for the CSV outputs
    pub admin: Option<String>,
    /// Default password for new accounts
    pub password: Option<String>,
    pub mahara: MaharaConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MaharaConfig {
    pub url: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub token_file: Option<String>,
}

impl Config {
    /// Load the config file.
    ///
    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => expand_path(&path.to_string_lossy()),
            None => {
                let path = default_path()?;
                if !path.is_file() {
                    log::debug!("no config file at {}", path.display());
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Token file location, expanded
    pub fn token_file(&self) -> Option<PathBuf> {
        self.mahara.token_file.as_deref().map(expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_explicit() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
domain = "hogwarts.school.nz"
admin = "admin"

[mahara]
url = "https://mahara.hogwarts.school.nz"
consumer_key = "key"
token_file = "~/.ide-sync/mahara.oauth"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.domain.as_deref(), Some("hogwarts.school.nz"));
        assert_eq!(config.admin.as_deref(), Some("admin"));
        assert!(config.password.is_none());
        assert_eq!(config.mahara.consumer_key.as_deref(), Some("key"));
        assert!(config.mahara.consumer_secret.is_none());

        let token_file = config.token_file().unwrap();
        assert!(!token_file.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_empty_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.domain.is_none());
        assert!(config.mahara.url.is_none());
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load(Some(&tmp.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "domian = \"typo\"\n").unwrap();

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_expand_path_plain() {
        assert_eq!(expand_path("out/dir"), PathBuf::from("out/dir"));
    }
}
