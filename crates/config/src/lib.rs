//! Layered configuration for exegete.
//!
//! Sources are merged in order, later ones winning:
//! 1. Built-in defaults.
//! 2. An optional configuration file (TOML, YAML or JSON, chosen by extension).
//! 3. Environment variables prefixed with `EXEGETE_`, e.g. `EXEGETE_STEM=false`.

pub mod error;

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "EXEGETE_";
pub const DATABASE_FILENAME: &str = "exegete.sqlite";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Path of the SQLite module database.
    pub database: PathBuf,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub max_connections: u32,
    /// Attach snowball stems to words during ingest, for adapters that
    /// support it.
    pub stem: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            log_level: "info".to_string(),
            max_connections: 5,
            stem: true,
        }
    }
}

fn default_database() -> PathBuf {
    ProjectDirs::from("org", "exegete", "exegete")
        .map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
        .unwrap_or_else(|| PathBuf::from(DATABASE_FILENAME))
}

impl Config {
    /// Merges defaults, the optional file and the environment, then validates.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(file)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            if !path.is_file() {
                exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", path.display())));
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file_exact(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path)),
                Some("json") => figment.merge(Json::file_exact(path)),
                _ => exn::bail!(ErrorKind::Invalid(format!(
                    "unsupported config file format: {}",
                    path.display()
                ))),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            exn::bail!(ErrorKind::Invalid("max_connections must be at least 1".to_string()));
        }
        if self.log_level.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("log_level must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(None).unwrap();
            assert_eq!(config.log_level, "info");
            assert_eq!(config.max_connections, 5);
            assert!(config.stem);
            assert!(config.database.ends_with(DATABASE_FILENAME));
            Ok(())
        });
    }

    #[rstest]
    #[case::toml("exegete.toml", "max_connections = 2\nstem = false\n")]
    #[case::yaml("exegete.yaml", "max_connections: 2\nstem: false\n")]
    #[case::json("exegete.json", r#"{"max_connections": 2, "stem": false}"#)]
    fn test_file_formats(#[case] name: &str, #[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        Jail::expect_with(|_jail| {
            let config = Config::load(Some(&path)).unwrap();
            assert_eq!(config.max_connections, 2);
            assert!(!config.stem);
            assert_eq!(config.log_level, "info");
            Ok(())
        });
    }

    #[test]
    fn test_environment_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("exegete.toml", "log_level = \"warn\"\ndatabase = \"from-file.sqlite\"\n")?;
            jail.set_env("EXEGETE_DATABASE", "from-env.sqlite");
            let config = Config::load(Some(Path::new("exegete.toml"))).unwrap();
            assert_eq!(config.log_level, "warn");
            assert_eq!(config.database, PathBuf::from("from-env.sqlite"));
            Ok(())
        });
    }

    #[test]
    fn test_zero_connections_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("EXEGETE_MAX_CONNECTIONS", "0");
            let err = Config::load(None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Invalid(_)));
            Ok(())
        });
    }

    #[test]
    fn test_bad_value_fails_to_load() {
        Jail::expect_with(|jail| {
            jail.set_env("EXEGETE_MAX_CONNECTIONS", "many");
            let err = Config::load(None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Load));
            Ok(())
        });
    }

    #[rstest]
    #[case::missing("missing.toml")]
    #[case::unsupported("exegete.ini")]
    fn test_rejected_files(#[case] name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        if name.ends_with(".ini") {
            std::fs::write(&path, "stem = false").unwrap();
        }
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }
}
