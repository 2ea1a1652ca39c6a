// ── Bulb domain types ──

use serde::{Deserialize, Serialize};

use super::BulbId;
use super::light::{LightState, Rgba};

/// A cached light bulb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulbRecord {
    pub id: BulbId,
    pub name: String,
    pub light: LightState,
    pub online: bool,
    pub last_seen_unix_timestamp: i64,
}

impl BulbRecord {
    pub fn to_dto(&self) -> BulbDto {
        BulbDto::from(self)
    }
}

/// Externally visible projection of a bulb.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulbDto {
    pub name: String,
    pub accessory_id: BulbId,
    pub is_on: bool,
    pub is_online: bool,
    pub last_seen_unix_timestamp: i64,
    pub rgba: Rgba,
}

impl From<&BulbRecord> for BulbDto {
    fn from(bulb: &BulbRecord) -> Self {
        Self {
            name: bulb.name.clone(),
            accessory_id: bulb.id,
            is_on: bulb.light.on,
            is_online: bulb.online,
            last_seen_unix_timestamp: bulb.last_seen_unix_timestamp,
            rgba: Rgba::from(bulb.light),
        }
    }
}

impl BulbDto {
    /// Rebuild the light state this DTO was projected from.
    pub fn light_state(&self) -> LightState {
        LightState::new(
            self.rgba.red,
            self.rgba.green,
            self.rgba.blue,
            self.rgba.alpha,
            self.is_on,
        )
    }
}
