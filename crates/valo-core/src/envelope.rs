// ── Response envelope ──
//
// Wire shape shared by every front end:
//   success: { "status": "ok", ...payload }
//   failure: { "status": "error", "error": "<public message>" }
// Failure detail is logged here and never serialized.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{CoreError, ErrorCategory};
use crate::model::{BulbDto, GroupDto};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse<T> {
    Ok(T),
    Error { error: String },
}

impl<T> ApiResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self::Ok(payload)
    }

    pub fn from_error(err: &CoreError) -> Self {
        match err.category() {
            ErrorCategory::Internal | ErrorCategory::Unavailable => {
                error!(error = %err, status = err.status_code(), "request failed");
            }
            _ => warn!(error = %err, status = err.status_code(), "request rejected"),
        }
        Self::Error {
            error: err.public_message(),
        }
    }

    pub fn from_result(result: Result<T, CoreError>) -> (u16, Self) {
        match result {
            Ok(payload) => (200, Self::ok(payload)),
            Err(e) => (e.status_code(), Self::from_error(&e)),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

// ── Payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupsPayload {
    pub groups: Vec<GroupDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPayload {
    pub group: GroupDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulbsPayload {
    pub bulbs: Vec<BulbDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulbPayload {
    pub bulb: BulbDto,
}
