// ── Runtime gateway configuration ──
//
// Describes *how* to reach the gateway. Carries the pairing code and
// timeout tuning but never touches disk; `valo-config` builds it.

use std::time::Duration;

use secrecy::SecretString;

/// Default bound on a single gateway command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on the whole authenticate + connect + topology sequence.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Name the gateway uses for its all-devices group.
pub const DEFAULT_SUPER_GROUP_NAME: &str = "SuperGroup";

/// Configuration for one gateway session manager.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway network address (host or IP).
    pub address: String,
    /// Pairing security code printed on the gateway.
    pub security_code: SecretString,
    /// Upper bound for any single command.
    pub command_timeout: Duration,
    /// Upper bound for session initialization.
    pub connect_timeout: Duration,
    /// Group name that identifies the super group.
    pub super_group_name: String,
}

impl GatewayConfig {
    pub fn new(address: impl Into<String>, security_code: SecretString) -> Self {
        Self {
            address: address.into(),
            security_code,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            super_group_name: DEFAULT_SUPER_GROUP_NAME.into(),
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_super_group_name(mut self, name: impl Into<String>) -> Self {
        self.super_group_name = name.into();
        self
    }
}
