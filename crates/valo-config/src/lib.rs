//! Configuration for valo.
//!
//! Merges built-in defaults, an optional `config.toml` in the platform
//! config directory, and `VALO_APP_*` environment variables, then
//! validates the result into a `valo_core::GatewayConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use valo_core::GatewayConfig;
use valo_core::config::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_SUPER_GROUP_NAME,
};

/// Prefix for every environment variable read by [`load_config`].
pub const ENV_PREFIX: &str = "VALO_APP_";

const MASK: &str = "********";

/// Settings read verbatim from the environment, never parsed as numbers.
const STRING_KEYS: [&str; 3] = [
    "gateway_address",
    "gateway_security_code",
    "super_group_name",
];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing {key}: set VALO_APP_{env} or `{key}` in config.toml", env = .key.to_uppercase())]
    Missing { key: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Config ──────────────────────────────────────────────────────────

/// Raw, unvalidated settings as read from file and environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Gateway host or IP.
    pub gateway_address: Option<String>,

    /// Pairing security code printed on the gateway.
    pub gateway_security_code: Option<String>,

    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_super_group_name")]
    pub super_group_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_address: None,
            gateway_security_code: None,
            command_timeout_secs: default_command_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            super_group_name: default_super_group_name(),
        }
    }
}

fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT.as_secs()
}
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_super_group_name() -> String {
    DEFAULT_SUPER_GROUP_NAME.into()
}

impl Config {
    /// Validate and convert into the runtime gateway configuration.
    pub fn resolve(&self) -> Result<GatewayConfig, ConfigError> {
        let address = required(self.gateway_address.as_deref(), "gateway_address")?;
        let code = required(
            self.gateway_security_code.as_deref(),
            "gateway_security_code",
        )?;
        let command_timeout = positive_secs(self.command_timeout_secs, "command_timeout_secs")?;
        let connect_timeout = positive_secs(self.connect_timeout_secs, "connect_timeout_secs")?;
        let super_group_name = self.super_group_name.trim();
        if super_group_name.is_empty() {
            return Err(ConfigError::Validation {
                field: "super_group_name",
                reason: "must not be empty".into(),
            });
        }

        Ok(GatewayConfig::new(address, SecretString::from(code.to_owned()))
            .with_command_timeout(command_timeout)
            .with_connect_timeout(connect_timeout)
            .with_super_group_name(super_group_name))
    }

    /// Copy with the security code replaced by a fixed mask.
    pub fn masked(&self) -> Self {
        Self {
            gateway_security_code: self.gateway_security_code.as_ref().map(|_| MASK.into()),
            ..self.clone()
        }
    }
}

fn required<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { key })
}

fn positive_secs(secs: u64, field: &'static str) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field,
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "valo", "valo").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("valo");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file is not an error.
///
/// String settings keep the exact environment value, so a security code
/// like `0123456789` is not turned into a number.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).filter(|key| !is_string_key(key.as_str())));
    for key in STRING_KEYS {
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}{}", key.to_uppercase())) {
            figment = figment.merge(Serialized::default(key, value));
        }
    }
    let config: Config = figment.extract()?;
    Ok(config)
}

fn is_string_key(key: &str) -> bool {
    STRING_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use figment::Jail;
    use secrecy::ExposeSecret;

    use super::*;

    fn load(jail: &Jail) -> Result<Config, figment::Error> {
        load_config_from(&jail.directory().join("config.toml")).map_err(|e| e.to_string().into())
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        Jail::expect_with(|jail| {
            let config = load(jail)?;
            assert_eq!(config, Config::default());
            assert_eq!(config.command_timeout_secs, 10);
            assert_eq!(config.connect_timeout_secs, 30);
            assert_eq!(config.super_group_name, "SuperGroup");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                    gateway_address = "192.168.1.20"
                    gateway_security_code = "from-file"
                    command_timeout_secs = 4
                "#,
            )?;
            jail.set_env("VALO_APP_GATEWAY_SECURITY_CODE", "from-env");
            jail.set_env("VALO_APP_CONNECT_TIMEOUT_SECS", "12");

            let config = load(jail)?;
            assert_eq!(config.gateway_address.as_deref(), Some("192.168.1.20"));
            assert_eq!(config.gateway_security_code.as_deref(), Some("from-env"));
            assert_eq!(config.command_timeout_secs, 4);
            assert_eq!(config.connect_timeout_secs, 12);
            Ok(())
        });
    }

    #[test]
    fn numeric_security_code_from_env_stays_a_string() {
        Jail::expect_with(|jail| {
            jail.set_env("VALO_APP_GATEWAY_ADDRESS", "10.0.0.2");
            jail.set_env("VALO_APP_GATEWAY_SECURITY_CODE", "0123456789");
            jail.set_env("VALO_APP_SUPER_GROUP_NAME", "2024");
            jail.set_env("VALO_APP_COMMAND_TIMEOUT_SECS", "7");

            let config = load(jail)?;
            assert_eq!(config.gateway_security_code.as_deref(), Some("0123456789"));
            assert_eq!(config.super_group_name, "2024");
            assert_eq!(config.command_timeout_secs, 7);

            let resolved = config.resolve().map_err(|e| e.to_string())?;
            assert_eq!(resolved.security_code.expose_secret(), "0123456789");
            Ok(())
        });
    }

    #[test]
    fn resolves_into_gateway_config() {
        let config = Config {
            gateway_address: Some(" 10.0.0.2 ".into()),
            gateway_security_code: Some("abc123".into()),
            command_timeout_secs: 3,
            ..Config::default()
        };
        let resolved = config.resolve().expect("valid");
        assert_eq!(resolved.address, "10.0.0.2");
        assert_eq!(resolved.security_code.expose_secret(), "abc123");
        assert_eq!(resolved.command_timeout, Duration::from_secs(3));
        assert_eq!(resolved.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_address_or_code_is_fatal() {
        let err = Config::default().resolve().expect_err("nothing configured");
        assert!(matches!(
            err,
            ConfigError::Missing {
                key: "gateway_address"
            }
        ));
        assert_eq!(
            err.to_string(),
            "missing gateway_address: set VALO_APP_GATEWAY_ADDRESS or `gateway_address` in config.toml"
        );

        let blank_code = Config {
            gateway_address: Some("10.0.0.2".into()),
            gateway_security_code: Some("   ".into()),
            ..Config::default()
        };
        assert!(matches!(
            blank_code.resolve(),
            Err(ConfigError::Missing {
                key: "gateway_security_code"
            })
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            gateway_address: Some("10.0.0.2".into()),
            gateway_security_code: Some("abc".into()),
            connect_timeout_secs: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::Validation {
                field: "connect_timeout_secs",
                ..
            })
        ));
    }

    #[test]
    fn masked_hides_security_code() {
        let config = Config {
            gateway_security_code: Some("abc123".into()),
            ..Config::default()
        };
        assert_eq!(config.masked().gateway_security_code.as_deref(), Some(MASK));
        assert_eq!(Config::default().masked().gateway_security_code, None);
    }
}
