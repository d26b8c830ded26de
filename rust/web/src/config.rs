//! Layered service configuration.
//!
//! Values resolve in this order, later layers winning:
//! built-in defaults, the TOML file named by `SOLVEGATE_CONFIG`, then
//! `SOLVEGATE_*` environment variables. Command-line flags are applied on top
//! by the caller through [`ConfigResolved::override_host`] and friends.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_CONFIG: &str = "SOLVEGATE_CONFIG";
pub const ENV_HOST: &str = "SOLVEGATE_HOST";
pub const ENV_PORT: &str = "SOLVEGATE_PORT";
pub const ENV_ENGINE_PATH: &str = "SOLVEGATE_ENGINE_PATH";
pub const ENV_ENGINE_ROOT: &str = "SOLVEGATE_ENGINE_ROOT";
pub const ENV_TIMEOUT_SECS: &str = "SOLVEGATE_TIMEOUT_SECS";
pub const ENV_MAX_TIMEOUT_SECS: &str = "SOLVEGATE_MAX_TIMEOUT_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Explicit engine executable; searched before every other candidate.
    pub engine_path: Option<PathBuf>,
    /// Directory holding the engine checkout or build.
    pub engine_root: PathBuf,
    pub default_timeout_secs: u64,
    pub max_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            engine_path: None,
            engine_root: PathBuf::from("TexasSolver"),
            default_timeout_secs: 120,
            max_timeout_secs: 600,
        }
    }
}

impl Config {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn max_timeout(&self) -> Duration {
        Duration::from_secs(self.max_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".into()));
        }
        if self.default_timeout_secs == 0 || self.max_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be >= 1 second".into()));
        }
        if self.default_timeout_secs > self.max_timeout_secs {
            return Err(ConfigError::Invalid(format!(
                "default_timeout_secs ({}) exceeds max_timeout_secs ({})",
                self.default_timeout_secs, self.max_timeout_secs
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigSources {
    pub host: ValueSource,
    pub port: ValueSource,
    pub engine_path: ValueSource,
    pub engine_root: ValueSource,
    pub default_timeout_secs: ValueSource,
    pub max_timeout_secs: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            host: ValueSource::Default,
            port: ValueSource::Default,
            engine_path: ValueSource::Default,
            engine_root: ValueSource::Default,
            default_timeout_secs: ValueSource::Default,
            max_timeout_secs: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: Config,
    pub sources: ConfigSources,
}

impl ConfigResolved {
    pub fn override_host(&mut self, host: impl Into<String>) {
        self.config.host = host.into();
        self.sources.host = ValueSource::Flag;
    }

    pub fn override_port(&mut self, port: u16) {
        self.config.port = port;
        self.sources.port = ValueSource::Flag;
    }

    pub fn override_engine_path(&mut self, path: impl Into<PathBuf>) {
        self.config.engine_path = Some(path.into());
        self.sources.engine_path = ValueSource::Flag;
    }

    pub fn override_default_timeout(&mut self, secs: u64) -> Result<(), ConfigError> {
        self.config.default_timeout_secs = secs;
        self.sources.default_timeout_secs = ValueSource::Flag;
        self.config.validate()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    engine_path: Option<PathBuf>,
    #[serde(default)]
    engine_root: Option<PathBuf>,
    #[serde(default)]
    default_timeout_secs: Option<u64>,
    #[serde(default)]
    max_timeout_secs: Option<u64>,
}

/// Resolves configuration from the process environment.
pub fn load() -> Result<ConfigResolved, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Resolves configuration using `env` to look up variables.
pub fn load_from<F>(env: F) -> Result<ConfigResolved, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = Config::default();
    let mut sources = ConfigSources::default();
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(path) = lookup(ENV_CONFIG) {
        let text = fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&text)?;
        if let Some(v) = file.host {
            cfg.host = v;
            sources.host = ValueSource::File;
        }
        if let Some(v) = file.port {
            cfg.port = v;
            sources.port = ValueSource::File;
        }
        if let Some(v) = file.engine_path {
            cfg.engine_path = Some(v);
            sources.engine_path = ValueSource::File;
        }
        if let Some(v) = file.engine_root {
            cfg.engine_root = v;
            sources.engine_root = ValueSource::File;
        }
        if let Some(v) = file.default_timeout_secs {
            cfg.default_timeout_secs = v;
            sources.default_timeout_secs = ValueSource::File;
        }
        if let Some(v) = file.max_timeout_secs {
            cfg.max_timeout_secs = v;
            sources.max_timeout_secs = ValueSource::File;
        }
    }

    if let Some(host) = lookup(ENV_HOST) {
        cfg.host = host;
        sources.host = ValueSource::Env;
    }
    if let Some(port) = lookup(ENV_PORT) {
        cfg.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{ENV_PORT}=`{port}` is not a port")))?;
        sources.port = ValueSource::Env;
    }
    if let Some(path) = lookup(ENV_ENGINE_PATH) {
        cfg.engine_path = Some(PathBuf::from(path));
        sources.engine_path = ValueSource::Env;
    }
    if let Some(root) = lookup(ENV_ENGINE_ROOT) {
        cfg.engine_root = PathBuf::from(root);
        sources.engine_root = ValueSource::Env;
    }
    if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
        cfg.default_timeout_secs = parse_secs(ENV_TIMEOUT_SECS, &secs)?;
        sources.default_timeout_secs = ValueSource::Env;
    }
    if let Some(secs) = lookup(ENV_MAX_TIMEOUT_SECS) {
        cfg.max_timeout_secs = parse_secs(ENV_MAX_TIMEOUT_SECS, &secs)?;
        sources.max_timeout_secs = ValueSource::Env;
    }

    cfg.validate()?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}=`{value}` is not a number of seconds")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let resolved = load_from(env_of(&[])).expect("defaults");
        assert_eq!(resolved.config, Config::default());
        assert_eq!(resolved.sources, ConfigSources::default());
    }

    #[test]
    fn env_overrides_file_and_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "port = 9100\nengine_root = \"/opt/solver\"\ndefault_timeout_secs = 30"
        )
        .expect("write config");
        let path = file.path().to_string_lossy().to_string();

        let resolved = load_from(env_of(&[
            (ENV_CONFIG, path.as_str()),
            (ENV_PORT, "9200"),
        ]))
        .expect("load");

        assert_eq!(resolved.config.port, 9200);
        assert_eq!(resolved.sources.port, ValueSource::Env);
        assert_eq!(resolved.config.engine_root, PathBuf::from("/opt/solver"));
        assert_eq!(resolved.sources.engine_root, ValueSource::File);
        assert_eq!(resolved.config.default_timeout_secs, 30);
        assert_eq!(resolved.sources.host, ValueSource::Default);
    }

    #[test]
    fn rejects_unknown_file_keys() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "prot = 1").expect("write config");
        let path = file.path().to_string_lossy().to_string();
        let err = load_from(env_of(&[(ENV_CONFIG, path.as_str())])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_bad_env_values() {
        assert!(load_from(env_of(&[(ENV_PORT, "eighty")])).is_err());
        assert!(load_from(env_of(&[(ENV_TIMEOUT_SECS, "0")])).is_err());
        assert!(load_from(env_of(&[(ENV_TIMEOUT_SECS, "900")])).is_err());
        assert!(load_from(env_of(&[
            (ENV_TIMEOUT_SECS, "900"),
            (ENV_MAX_TIMEOUT_SECS, "1200")
        ]))
        .is_ok());
    }

    #[test]
    fn flags_win_over_everything() {
        let mut resolved = load_from(env_of(&[(ENV_HOST, "0.0.0.0")])).unwrap();
        resolved.override_host("10.0.0.1");
        resolved.override_port(1234);
        assert_eq!(resolved.config.host, "10.0.0.1");
        assert_eq!(resolved.sources.host, ValueSource::Flag);
        assert_eq!(resolved.sources.port, ValueSource::Flag);
        assert!(resolved.override_default_timeout(10_000).is_err());
    }
}
