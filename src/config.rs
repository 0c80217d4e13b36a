// ABOUTME: Endpoint and run configuration read once at startup
// ABOUTME: Builds immutable configs from environment variables and an optional TOML file

use crate::readiness::RetryPolicy;
use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service name of the destination database container
pub const DEST_DB_HOST: &str = "destination_postgres";

pub const DEFAULT_DEST_DB_USER: &str = "postgres";
pub const DEFAULT_DEST_DB_PASSWORD: &str = "secret";
pub const DEFAULT_DEST_DB_NAME: &str = "destination_db";

pub const DEFAULT_DUMP_FILE: &str = "data_dump.sql";
pub const DEFAULT_LOG_FILE: &str = "/app/logs/elt_script.log";

/// Which side of the transfer an endpoint is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Source,
    Destination,
}

impl fmt::Display for EndpointRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointRole::Source => write!(f, "source"),
            EndpointRole::Destination => write!(f, "destination"),
        }
    }
}

/// Connection parameters for one database
#[derive(Debug)]
pub struct EndpointConfig {
    pub role: EndpointRole,
    pub host: String,
    pub user: String,
    pub password: SecretString,
    pub database: String,
}

impl EndpointConfig {
    /// Read the source endpoint. All four variables are required.
    pub fn source_from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => bail!(
                    "Missing required environment variable {}.\n\
                     The source database is configured through \
                     SOURCE_DB_HOST, SOURCE_DB_USER, SOURCE_DB_PASSWORD and SOURCE_DB_NAME.",
                    key
                ),
            }
        };

        Ok(Self {
            role: EndpointRole::Source,
            host: required("SOURCE_DB_HOST")?,
            user: required("SOURCE_DB_USER")?,
            password: SecretString::new(required("SOURCE_DB_PASSWORD")?),
            database: required("SOURCE_DB_NAME")?,
        })
    }

    /// Read the destination endpoint. The host is fixed; the rest fall back to defaults.
    pub fn destination_from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            role: EndpointRole::Destination,
            host: DEST_DB_HOST.to_string(),
            user: or_default("DEST_DB_USER", DEFAULT_DEST_DB_USER),
            password: SecretString::new(or_default("DEST_DB_PASSWORD", DEFAULT_DEST_DB_PASSWORD)),
            database: or_default("DEST_DB_NAME", DEFAULT_DEST_DB_NAME),
        }
    }
}

/// Tunables that do not come from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub retry: RetryPolicy,
    pub dump_path: PathBuf,
    pub log_path: PathBuf,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            dump_path: PathBuf::from(DEFAULT_DUMP_FILE),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    retry: RetrySection,
    #[serde(default)]
    paths: PathsSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RetrySection {
    max_retries: Option<u32>,
    base_delay_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PathsSection {
    dump_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl RunSettings {
    /// Defaults overlaid with whatever the TOML file at `path` sets
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("Failed to parse TOML config at {}", path.display()))
    }

    fn from_toml(raw: &str) -> Result<Self> {
        let parsed: FileConfig = toml::from_str(raw)?;
        let mut settings = Self::default();

        if let Some(max_retries) = parsed.retry.max_retries {
            settings.retry.max_retries = max_retries;
        }
        if let Some(secs) = parsed.retry.base_delay_secs {
            settings.retry.base_delay = Duration::from_secs(secs);
        }
        if let Some(dump_file) = parsed.paths.dump_file {
            settings.dump_path = dump_file;
        }
        if let Some(log_file) = parsed.paths.log_file {
            settings.log_path = log_file;
        }

        Ok(settings)
    }
}

/// Everything the pipeline needs, fixed for the lifetime of the process
#[derive(Debug)]
pub struct PipelineConfig {
    pub source: EndpointConfig,
    pub destination: EndpointConfig,
    pub retry: RetryPolicy,
    pub dump_path: PathBuf,
}

impl PipelineConfig {
    pub fn from_env(settings: &RunSettings) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), settings)
    }

    pub fn from_lookup<F>(lookup: F, settings: &RunSettings) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            source: EndpointConfig::source_from_lookup(&lookup)
                .context("Invalid source database configuration")?,
            destination: EndpointConfig::destination_from_lookup(&lookup),
            retry: settings.retry,
            dump_path: settings.dump_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn full_source() -> Vec<(&'static str, &'static str)> {
        vec![
            ("SOURCE_DB_HOST", "source_postgres"),
            ("SOURCE_DB_USER", "postgres"),
            ("SOURCE_DB_PASSWORD", "secret"),
            ("SOURCE_DB_NAME", "source_db"),
        ]
    }

    #[test]
    fn test_destination_defaults() {
        let dest = EndpointConfig::destination_from_lookup(lookup_from(&[]));

        assert_eq!(dest.role, EndpointRole::Destination);
        assert_eq!(dest.host, "destination_postgres");
        assert_eq!(dest.user, "postgres");
        assert_eq!(dest.password.expose_secret(), "secret");
        assert_eq!(dest.database, "destination_db");
    }

    #[test]
    fn test_destination_host_ignores_environment() {
        let dest = EndpointConfig::destination_from_lookup(lookup_from(&[
            ("DEST_DB_HOST", "elsewhere"),
            ("DEST_DB_USER", "loader"),
            ("DEST_DB_NAME", "warehouse"),
        ]));

        assert_eq!(dest.host, DEST_DB_HOST);
        assert_eq!(dest.user, "loader");
        assert_eq!(dest.database, "warehouse");
    }

    #[test]
    fn test_source_requires_every_variable() {
        for missing in [
            "SOURCE_DB_HOST",
            "SOURCE_DB_USER",
            "SOURCE_DB_PASSWORD",
            "SOURCE_DB_NAME",
        ] {
            let vars: Vec<_> = full_source()
                .into_iter()
                .filter(|(k, _)| *k != missing)
                .collect();
            let err = EndpointConfig::source_from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(
                err.to_string().contains(missing),
                "error should name {}: {}",
                missing,
                err
            );
        }
    }

    #[test]
    fn test_source_rejects_blank_host() {
        let mut vars = full_source();
        vars[0] = ("SOURCE_DB_HOST", "  ");
        assert!(EndpointConfig::source_from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn test_password_not_in_debug_output() {
        let config =
            PipelineConfig::from_lookup(lookup_from(&full_source()), &RunSettings::default())
                .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("source_postgres"));
        assert!(!debug.contains("\"secret\""));
    }

    #[test]
    fn test_pipeline_config_takes_run_settings() {
        let settings = RunSettings {
            retry: RetryPolicy::new(2, Duration::from_millis(5)),
            dump_path: PathBuf::from("/tmp/x.sql"),
            log_path: PathBuf::from("/tmp/x.log"),
        };
        let config = PipelineConfig::from_lookup(lookup_from(&full_source()), &settings).unwrap();

        assert_eq!(config.retry, settings.retry);
        assert_eq!(config.dump_path, PathBuf::from("/tmp/x.sql"));
        assert_eq!(config.source.database, "source_db");
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = RunSettings::from_toml(
            r#"
            [retry]
            max_retries = 8
            base_delay_secs = 2

            [paths]
            dump_file = "/data/dump.sql"
            "#,
        )
        .unwrap();

        assert_eq!(settings.retry.max_retries, 8);
        assert_eq!(settings.retry.base_delay, Duration::from_secs(2));
        assert_eq!(settings.dump_path, PathBuf::from("/data/dump.sql"));
        assert_eq!(settings.log_path, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_settings_reject_unknown_keys() {
        assert!(RunSettings::from_toml("[retry]\njitter = true\n").is_err());
    }

    #[test]
    fn test_settings_from_file() {
        use std::io::Write;
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, "[paths]\nlog_file = \"/tmp/elt.log\"\n").unwrap();

        let settings = RunSettings::from_file(tmp.path()).unwrap();
        assert_eq!(settings.log_path, PathBuf::from("/tmp/elt.log"));
        assert_eq!(settings.retry, RetryPolicy::default());
    }

    #[test]
    fn test_settings_from_missing_file() {
        let err = RunSettings::from_file(Path::new("/nonexistent/elt.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
