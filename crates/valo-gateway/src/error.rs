use thiserror::Error;

/// Top-level error type for the `valo-gateway` crate.
///
/// Covers every failure mode a transport can report: pairing,
/// connection setup, topology observation, and command delivery.
/// `valo-core` maps these into session-level failures.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The gateway refused the security code.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Connection ──────────────────────────────────────────────────
    /// Could not establish the secured connection with the issued identity.
    #[error("Connection to {address} failed: {reason}")]
    Connect { address: String, reason: String },

    /// The connection was closed (by us or by the gateway).
    #[error("Connection closed")]
    Closed,

    // ── Topology ────────────────────────────────────────────────────
    /// Observing groups or devices failed part-way.
    #[error("Topology observation failed: {message}")]
    Topology { message: String },

    // ── Commands ────────────────────────────────────────────────────
    /// The gateway rejected an accepted command.
    #[error("Command rejected by gateway: {message}")]
    CommandRejected { message: String },
}

impl Error {
    /// Returns `true` if the underlying connection is known to be gone.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
