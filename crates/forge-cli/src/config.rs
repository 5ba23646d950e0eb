//! Configuration file management for forge.
//!
//! Provides a TOML-based config file at `~/.config/forge/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default. The model
//! API key is never stored here; it is read from `ANTHROPIC_API_KEY` only.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use forge_core::llm::anthropic::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use forge_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub model: ModelSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_model_base_url(),
        }
    }
}

fn default_model_name() -> String {
    DEFAULT_MODEL.to_owned()
}

fn default_model_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the forge config directory: `$XDG_CONFIG_HOME/forge` or
/// `~/.config/forge`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("forge");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("forge")
}

/// Return the path to the forge config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct ForgeConfig {
    pub db_config: DbConfig,
    pub model: ModelSection,
}

impl ForgeConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `FORGE_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - Model: `config_file.model` > built-in defaults
    pub fn resolve(cli_db_url: Option<&str>) -> Self {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_owned()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_owned()
        };

        let model = file_config.map(|cfg| cfg.model).unwrap_or_default();

        Self {
            db_config: DbConfig::new(db_url),
            model,
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point `XDG_CONFIG_HOME` at a temp dir for the duration of `f`.
    fn with_xdg<T>(f: impl FnOnce(&std::path::Path) -> T) -> T {
        let tmp = tempfile::TempDir::new().unwrap();
        let orig = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        let out = f(tmp.path());
        match orig {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }
        out
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        with_xdg(|root| {
            let original = ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://testhost:5432/testdb".to_owned(),
                },
                model: ModelSection {
                    name: "claude-test".to_owned(),
                    base_url: "http://localhost:8080".to_owned(),
                },
            };
            let path = save_config(&original).unwrap();
            assert_eq!(path, root.join("forge").join("config.toml"));
            assert_eq!(load_config().unwrap(), original);
        });
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        with_xdg(|_| {
            let path = save_config(&ConfigFile {
                database: DatabaseSection {
                    url: DbConfig::DEFAULT_URL.to_owned(),
                },
                model: ModelSection::default(),
            })
            .unwrap();
            let meta = std::fs::metadata(&path).unwrap();
            assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        });
    }

    #[test]
    fn model_section_is_optional() {
        let cfg: ConfigFile = toml::from_str("[database]\nurl = \"postgresql://h/db\"\n").unwrap();
        assert_eq!(cfg.model.name, DEFAULT_MODEL);
        assert_eq!(cfg.model.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();

        unsafe { std::env::set_var("FORGE_DATABASE_URL", "postgresql://env:5432/envdb") };
        let config = ForgeConfig::resolve(Some("postgresql://cli:5432/clidb"));
        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
        unsafe { std::env::remove_var("FORGE_DATABASE_URL") };
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        with_xdg(|_| {
            save_config(&ConfigFile {
                database: DatabaseSection {
                    url: "postgresql://file:5432/filedb".to_owned(),
                },
                model: ModelSection::default(),
            })
            .unwrap();

            unsafe { std::env::set_var("FORGE_DATABASE_URL", "postgresql://env:5432/envdb") };
            let config = ForgeConfig::resolve(None);
            unsafe { std::env::remove_var("FORGE_DATABASE_URL") };
            assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");

            let config = ForgeConfig::resolve(None);
            assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
        });
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        unsafe { std::env::remove_var("FORGE_DATABASE_URL") };
        with_xdg(|_| {
            let config = ForgeConfig::resolve(None);
            assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
            assert_eq!(config.model, ModelSection::default());
        });
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("forge/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
