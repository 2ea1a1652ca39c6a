//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use valo_config::ConfigError;
use valo_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CONFIG: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Gateway ──────────────────────────────────────────────────────
    #[error("Could not connect to gateway at {address}")]
    #[diagnostic(
        code(valo::connection_failed),
        help(
            "{reason}\n\
             Check that the gateway is powered on and reachable, and that the\n\
             security code matches the label on the gateway."
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Gateway command to {target} failed")]
    #[diagnostic(
        code(valo::command_failed),
        help("{reason}\nThe session was reset; retrying the command opens a new one.")
    )]
    CommandFailed { target: String, reason: String },

    #[error("{operation} timed out after {seconds}s")]
    #[diagnostic(
        code(valo::timeout),
        help("Increase the timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout { operation: String, seconds: u64 },

    #[error("No gateway transport is available for {address}")]
    #[diagnostic(
        code(valo::no_transport),
        help(
            "This build talks to gateways only through the built-in simulator.\n\
             Try: valo --simulate groups list"
        )
    )]
    NoTransport { address: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(valo::not_found),
        help("Run: valo {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("A {resource_type} named '{identifier}' already exists")]
    #[diagnostic(
        code(valo::conflict),
        help("Names are compared case-insensitively; pick a different one.")
    )]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("Super group '{name}' is missing from the gateway topology")]
    #[diagnostic(
        code(valo::super_group_missing),
        help("Set super_group_name in config.toml if your gateway names it differently.")
    )]
    SuperGroupMissing { name: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(valo::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Gateway is not configured: {key} is missing")]
    #[diagnostic(
        code(valo::missing_config),
        help(
            "Set {env}, pass the matching flag, or add `{key}` to {path}.\n\
             To try valo without a gateway: valo --simulate groups list"
        )
    )]
    MissingConfig {
        key: String,
        env: String,
        path: String,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(valo::config))]
    InvalidConfig { message: String },

    #[error(transparent)]
    #[diagnostic(code(valo::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON rendering failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML rendering failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML rendering failed: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::CommandFailed { .. } | Self::NoTransport { .. } => {
                exit_code::CONNECTION
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::MissingConfig { .. } | Self::InvalidConfig { .. } | Self::Config(_) => {
                exit_code::CONFIG
            }
            Self::SuperGroupMissing { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Yaml(_)
            | Self::Toml(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { address, reason } => {
                Self::ConnectionFailed { address, reason }
            }

            CoreError::CommandFailed { target, reason } => Self::CommandFailed { target, reason },

            CoreError::Timeout {
                operation,
                timeout_secs,
            } => Self::Timeout {
                operation,
                seconds: timeout_secs,
            },

            CoreError::GroupNotFound { id } => Self::NotFound {
                resource_type: "group".into(),
                identifier: id.to_string(),
                list_command: "groups list".into(),
            },

            CoreError::BulbNotFound { id } => Self::NotFound {
                resource_type: "bulb".into(),
                identifier: id.to_string(),
                list_command: "bulbs list <GROUP>".into(),
            },

            CoreError::SuperGroupMissing { name } => Self::SuperGroupMissing { name },

            CoreError::DuplicateName { kind, name } => Self::Conflict {
                resource_type: kind.to_string(),
                identifier: name,
            },

            CoreError::ValidationFailed { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing { key } => Self::MissingConfig {
                key: key.into(),
                env: format!("{}{}", valo_config::ENV_PREFIX, key.to_uppercase()),
                path: valo_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => Self::InvalidConfig {
                message: format!("{field}: {reason}"),
            },
            ConfigError::Figment(e) => Self::Config(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use valo_core::RecordKind;

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (CoreError::GroupNotFound { id: 3 }, exit_code::NOT_FOUND),
            (
                CoreError::DuplicateName {
                    kind: RecordKind::Bulb,
                    name: "Desk".into(),
                },
                exit_code::CONFLICT,
            ),
            (
                CoreError::ValidationFailed {
                    message: "alpha".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::CommandFailed {
                    target: "device 1".into(),
                    reason: "closed".into(),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::Timeout {
                    operation: "Session setup".into(),
                    timeout_secs: 30,
                },
                exit_code::TIMEOUT,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn missing_config_names_the_env_var() {
        let err = CliError::from(ConfigError::Missing {
            key: "gateway_address",
        });
        assert_eq!(err.exit_code(), exit_code::CONFIG);
        let CliError::MissingConfig { env, .. } = err else {
            panic!("expected MissingConfig");
        };
        assert_eq!(env, "VALO_APP_GATEWAY_ADDRESS");
    }
}
