// ── Gateway → domain conversion ──
//
// Turns raw topology observations into cache records. Devices without a
// light (remotes, sensors) are skipped; bulbs with undecodable color
// data are kept with a neutral state so they stay listable.

use tracing::warn;
use valo_gateway::{DeviceInfo, GroupInfo};

use crate::codec;
use crate::model::{BulbRecord, GroupRecord, LightState};

impl From<GroupInfo> for GroupRecord {
    fn from(group: GroupInfo) -> Self {
        Self {
            id: group.id,
            name: group.name,
            member_bulb_ids: group.device_ids.into_iter().collect(),
        }
    }
}

/// Convert an observed device into a bulb record, if it is a light.
pub(crate) fn bulb_from_device(device: DeviceInfo) -> Option<BulbRecord> {
    let reading = device.light?;
    let light = codec::from_device_state(&reading.color, reading.dimmer, reading.on)
        .unwrap_or_else(|e| {
            warn!(bulb_id = device.id, error = %e, "undecodable light state, using neutral");
            LightState::NEUTRAL.with_on(reading.on)
        });
    Some(BulbRecord {
        id: device.id,
        name: device.name,
        light,
        online: device.alive,
        last_seen_unix_timestamp: device.last_seen,
    })
}
