// ── Core error types ──
//
// User-facing errors from valo-core. Transport detail is folded into
// `reason` strings; callers branch on the variant, never on gateway
// internals. Each variant maps to one stable `ErrorCategory`.

use strum::{Display, IntoStaticStr};
use thiserror::Error;

use crate::model::{BulbId, GroupId};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Session errors ───────────────────────────────────────────────
    #[error("Cannot connect to gateway at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Gateway command to {target} failed: {reason}")]
    CommandFailed { target: String, reason: String },

    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout {
        operation: String,
        timeout_secs: u64,
    },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Group with ID {id} not found")]
    GroupNotFound { id: GroupId },

    #[error("Bulb with ID {id} not found")]
    BulbNotFound { id: BulbId },

    #[error("Could not find super group '{name}'")]
    SuperGroupMissing { name: String },

    // ── Validation errors ────────────────────────────────────────────
    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: RecordKind, name: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Which record collection a name clash happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Group,
    Bulb,
}

/// Stable failure categories surfaced to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum ErrorCategory {
    #[strum(serialize = "Not found")]
    NotFound,
    #[strum(serialize = "Name already in use")]
    Conflict,
    #[strum(serialize = "Invalid request")]
    InvalidArgument,
    #[strum(serialize = "Gateway unavailable")]
    Unavailable,
    #[strum(serialize = "Internal server error")]
    Internal,
}

impl CoreError {
    /// Returns `true` if this failure means the session can no longer be
    /// trusted and must be torn down before the next operation.
    pub fn resets_session(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::CommandFailed { .. } | Self::Timeout { .. }
        )
    }

    /// Returns `true` if retrying the same call later may succeed.
    ///
    /// Session failures are retryable by the caller of the next
    /// operation, never within the failing call.
    pub fn is_retryable(&self) -> bool {
        self.resets_session()
    }

    /// The stable category this error is reported under.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GroupNotFound { .. } | Self::BulbNotFound { .. } => ErrorCategory::NotFound,
            Self::DuplicateName { .. } => ErrorCategory::Conflict,
            Self::ValidationFailed { .. } => ErrorCategory::InvalidArgument,
            Self::ConnectionFailed { .. } | Self::CommandFailed { .. } | Self::Timeout { .. } => {
                ErrorCategory::Unavailable
            }
            Self::SuperGroupMissing { .. } => ErrorCategory::Internal,
        }
    }

    /// HTTP-style status code for the route layer.
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::NotFound => 404,
            ErrorCategory::Conflict => 409,
            ErrorCategory::InvalidArgument => 400,
            ErrorCategory::Unavailable => 503,
            ErrorCategory::Internal => 500,
        }
    }

    /// Short user-facing description: the category, plus the message for
    /// caller-correctable failures. Gateway detail is never included.
    pub fn public_message(&self) -> String {
        let category = self.category();
        match category {
            ErrorCategory::NotFound | ErrorCategory::Conflict | ErrorCategory::InvalidArgument => {
                format!("{category} ({self})")
            }
            ErrorCategory::Unavailable | ErrorCategory::Internal => category.to_string(),
        }
    }
}
