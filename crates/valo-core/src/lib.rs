//! Session management, device cache, and light operations for a
//! smart-lighting gateway.
//!
//! Sits between a front end (the `valo` CLI, or any route layer) and a
//! [`valo_gateway::GatewayTransport`]:
//!
//! - **[`Controller`]**: the facade. Lists and renames groups and bulbs,
//!   sets light state per bulb or per group, switches everything on/off.
//! - **[`SessionManager`]**: lazily establishes a single shared gateway
//!   session, shares one initialization across concurrent callers, and
//!   tears the session down after a failed command.
//! - **[`DeviceCache`]**: lock-free snapshot of groups and bulbs. Group
//!   light state is derived from members, never stored.
//! - **[`codec`]**: `LightState` ⇄ `rrggbb` hex + dimmer percent.
//! - **[`ApiResponse`]**: `{status: "ok" | "error"}` envelope with
//!   stable status codes per [`ErrorCategory`].

pub mod codec;
pub mod config;
pub mod controller;
mod convert;
pub mod envelope;
pub mod error;
pub mod model;
pub mod session;
pub mod store;

pub use codec::DecodeError;
pub use config::GatewayConfig;
pub use controller::Controller;
pub use envelope::{ApiResponse, BulbPayload, BulbsPayload, GroupPayload, GroupsPayload};
pub use error::{CoreError, ErrorCategory, RecordKind};
pub use model::{BulbDto, BulbId, BulbRecord, GroupDto, GroupId, GroupRecord, LightState, Rgba};
pub use session::{Session, SessionManager, SessionPhase};
pub use store::{DeviceCache, RenameCheck};
