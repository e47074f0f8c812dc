use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "WAKECODE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "wakecode.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WakeConfig {
    pub host: IpAddr,
    pub port: u16,
    pub challenges_dir: PathBuf,
    pub event_capacity: usize,
    /// Also write logs to this file, without ANSI colors. Stderr logging
    /// stays on either way.
    pub log_file: Option<PathBuf>,
    pub scheduler: SchedulerConfig,
    pub harness: HarnessConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    pub tick_interval_ms: u64,
    /// Idle time before an active session starts alerting. Zero alerts at once.
    pub idle_threshold_secs: u64,
    pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub timeout_ms: u64,
    pub memory_limit_bytes: usize,
    pub max_stack_bytes: usize,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 4830,
            challenges_dir: PathBuf::from("challenges"),
            event_capacity: 256,
            log_file: None,
            scheduler: SchedulerConfig::default(),
            harness: HarnessConfig::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            idle_threshold_secs: 30,
            shutdown_grace_ms: 3_000,
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            memory_limit_bytes: 32 * 1024 * 1024,
            max_stack_bytes: 512 * 1024,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl HarnessConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl WakeConfig {
    /// Reads `$WAKECODE_CONFIG` or `./wakecode.toml` when present, then
    /// applies `WAKECODE_*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("WAKECODE_PORT") {
            self.port = parse_env("WAKECODE_PORT", &value)?;
        }
        if let Some(value) = lookup("WAKECODE_HOST") {
            self.host = parse_env("WAKECODE_HOST", &value)?;
        }
        if let Some(value) = lookup("WAKECODE_CHALLENGES_DIR") {
            self.challenges_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("WAKECODE_LOG_FILE") {
            self.log_file = (!value.trim().is_empty()).then(|| PathBuf::from(value));
        }
        if let Some(value) = lookup("WAKECODE_IDLE_THRESHOLD_SECS") {
            self.scheduler.idle_threshold_secs = parse_env("WAKECODE_IDLE_THRESHOLD_SECS", &value)?;
        }
        if let Some(value) = lookup("WAKECODE_HARNESS_TIMEOUT_MS") {
            self.harness.timeout_ms = parse_env("WAKECODE_HARNESS_TIMEOUT_MS", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.tick_interval_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.harness.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "harness.timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "event_capacity",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err: T::Err| ConfigError::InvalidValue {
            key,
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_yields_defaults() {
        let config = WakeConfig::from_toml_str("").unwrap();
        assert_eq!(config, WakeConfig::default());
        assert_eq!(config.scheduler.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = WakeConfig::from_toml_str(
            r#"
port = 9000

[scheduler]
idle_threshold_secs = 0

[harness]
timeout_ms = 250
"#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.scheduler.idle_threshold_secs, 0);
        assert_eq!(config.scheduler.tick_interval_ms, 1_000);
        assert_eq!(config.harness.timeout_ms, 250);
        assert_eq!(config.harness.memory_limit_bytes, 32 * 1024 * 1024);
    }

    #[test]
    fn log_file_is_optional() {
        assert_eq!(WakeConfig::default().log_file, None);
        let config = WakeConfig::from_toml_str(r#"log_file = "logs/wakecode.log""#).unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("logs/wakecode.log")));
    }

    #[test]
    fn log_file_env_sets_and_blank_env_clears() {
        let path = "/var/log/wakecode.log";
        let mut config = WakeConfig::default();
        config
            .apply_env(|key| (key == "WAKECODE_LOG_FILE").then(|| path.to_string()))
            .unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from(path)));

        config
            .apply_env(|key| (key == "WAKECODE_LOG_FILE").then(String::new))
            .unwrap();
        assert_eq!(config.log_file, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = WakeConfig::from_toml_str("prot = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WAKECODE_PORT", "5001"),
            ("WAKECODE_CHALLENGES_DIR", "/srv/challenges"),
            ("WAKECODE_IDLE_THRESHOLD_SECS", "0"),
        ]);
        let mut config = WakeConfig::default();
        config
            .apply_env(|key| env.get(key).map(|value| (*value).to_string()))
            .unwrap();
        assert_eq!(config.port, 5001);
        assert_eq!(config.challenges_dir, PathBuf::from("/srv/challenges"));
        assert_eq!(config.scheduler.idle_threshold(), Duration::ZERO);
    }

    #[test]
    fn bad_env_value_names_the_key() {
        let mut config = WakeConfig::default();
        let err = config
            .apply_env(|key| (key == "WAKECODE_PORT").then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "WAKECODE_PORT", .. }));
    }

    #[test]
    fn zero_tick_interval_is_invalid() {
        let config = WakeConfig::from_toml_str("[scheduler]\ntick_interval_ms = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
