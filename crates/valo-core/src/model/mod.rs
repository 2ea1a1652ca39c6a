// ── Domain model ──

pub mod bulb;
pub mod group;
pub mod light;

pub use bulb::{BulbDto, BulbRecord};
pub use group::{GroupDto, GroupRecord};
pub use light::{LightState, Rgba};

/// Stable gateway identifier of a bulb.
pub type BulbId = valo_gateway::DeviceId;

/// Stable gateway identifier of a group.
pub type GroupId = valo_gateway::GroupId;
