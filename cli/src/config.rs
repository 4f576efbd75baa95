//! `scholar.toml` configuration

use anyhow::{bail, Context, Result};
use scholar_core::{DEFAULT_STORAGE_KEY, DEFAULT_TOKEN_BALANCE};
use scholar_storage::BUS_CAPACITY;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    #[default]
    File,
    Sled,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScholarConfig {
    pub storage: StorageConfig,
    pub tokens: TokenConfig,
    pub notifier: NotifierConfig,
    pub seed: SeedConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// Data directory for the file and sled backends; `$HOME` is expanded
    /// by [`load_config`]
    pub path: String,
    pub key: String,
    pub max_conflict_retries: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            path: "$HOME/.icp-scholar".to_string(),
            key: DEFAULT_STORAGE_KEY.to_string(),
            max_conflict_retries: 8,
        }
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Balance of a principal that has never been written
    pub default_balance: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            default_balance: DEFAULT_TOKEN_BALANCE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub bus_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            bus_capacity: BUS_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Write the default peer notes into an empty store
    pub enabled: bool,
    /// List the built-in courses next to stored ones
    pub include_courses: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_courses: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub principal: String,
    pub student_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            principal: "mock-principal".to_string(),
            student_name: scholar_core::DEFAULT_STUDENT_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Read the config at `path`, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ScholarConfig> {
    let mut config = match path {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => ScholarConfig::default(),
    };
    let home = std::env::var("HOME").ok();
    config.storage.path = expand_path(&config.storage.path, home.as_deref())?;
    Ok(config)
}

fn expand_path(path: &str, home: Option<&str>) -> Result<String> {
    if !path.contains("$HOME") {
        return Ok(path.to_string());
    }
    match home {
        Some(home) if !home.is_empty() => Ok(path.replace("$HOME", home)),
        _ => bail!("storage path {} needs $HOME, which is not set", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = ScholarConfig::default();
        assert_eq!(config.storage.backend, Backend::File);
        assert_eq!(config.storage.key, "icp_scholar_global_data");
        assert_eq!(config.tokens.default_balance, 100);
        assert_eq!(config.notifier.bus_capacity, BUS_CAPACITY);
        assert!(config.seed.enabled);
        assert_eq!(config.storage.path, "$HOME/.icp-scholar");
    }

    #[test]
    fn test_home_expansion() {
        assert_eq!(
            expand_path("$HOME/.icp-scholar", Some("/home/ada")).unwrap(),
            "/home/ada/.icp-scholar"
        );
        assert_eq!(expand_path("/srv/scholar", None).unwrap(), "/srv/scholar");
        assert!(expand_path("$HOME/.icp-scholar", None).is_err());
        assert!(expand_path("$HOME/.icp-scholar", Some("")).is_err());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\nbackend = \"sled\"\npath = \"/tmp/scholar\"\n\n[tokens]\ndefault_balance = 250"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.storage.backend, Backend::Sled);
        assert_eq!(config.storage.data_dir(), PathBuf::from("/tmp/scholar"));
        assert_eq!(config.storage.max_conflict_retries, 8);
        assert_eq!(config.tokens.default_balance, 250);
        assert_eq!(config.notifier.bus_capacity, BUS_CAPACITY);
        assert_eq!(config.identity.principal, "mock-principal");
    }

    #[test]
    fn test_bad_backend_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[storage]\nbackend = \"postgres\"").unwrap();
        assert!(load_config(Some(file.path())).is_err());
    }
}
