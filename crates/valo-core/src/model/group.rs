// ── Group domain types ──

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::bulb::BulbDto;
use super::light::LightState;
use super::{BulbId, GroupId};

/// A cached group. Its light state is never stored; see
/// [`DeviceCache::group_dto`](crate::store::DeviceCache::group_dto).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
    /// Member bulb ids in gateway order.
    pub member_bulb_ids: IndexSet<BulbId>,
}

/// Externally visible projection of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDto {
    pub name: String,
    pub id: GroupId,
    /// Members sorted case-insensitively by name.
    pub bulbs: Vec<BulbDto>,
    pub light_state: LightState,
}
