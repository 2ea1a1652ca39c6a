// ── Gateway wire types ──
//
// Shapes exchanged with the gateway transport. These stay close to what
// the gateway reports; `valo-core` converts them into domain records.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Gateway-side identifier of a device (accessory).
pub type DeviceId = u32;

/// Gateway-side identifier of a group.
pub type GroupId = u32;

/// Credentials issued by the gateway in exchange for the security code.
///
/// The pre-shared key never leaves this struct in clear text.
#[derive(Debug, Clone)]
pub struct Identity {
    pub identity: String,
    pub psk: SecretString,
}

/// A group as reported by topology observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: GroupId,
    pub name: String,
    /// Member device ids, in the order the gateway lists them.
    pub device_ids: Vec<DeviceId>,
}

/// A device as reported by topology observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    pub alive: bool,
    /// Unix timestamp (seconds) of the last time the gateway heard from it.
    pub last_seen: i64,
    /// Present only for light bulbs; remotes and sensors carry `None`.
    pub light: Option<LightReading>,
}

/// Raw light values in the gateway's native representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightReading {
    /// Six hex digits, `rrggbb`. Not validated at this layer.
    pub color: String,
    /// Brightness as an integer percentage.
    pub dimmer: u8,
    pub on: bool,
}

/// A light command. Fields left as `None` are not touched by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightOperation {
    pub on: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimmer: Option<u8>,
}

impl LightOperation {
    /// A bare on/off switch that leaves color and brightness alone.
    pub fn switch(on: bool) -> Self {
        Self {
            on,
            color: None,
            dimmer: None,
        }
    }

    /// Returns `true` if this operation carries no color or brightness.
    pub fn is_switch_only(&self) -> bool {
        self.color.is_none() && self.dimmer.is_none()
    }
}

/// Target of an issued command, used by the simulator's command log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTarget {
    Device(DeviceId),
    Group(GroupId),
}

impl fmt::Display for CommandTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device(id) => write!(f, "device {id}"),
            Self::Group(id) => write!(f, "group {id}"),
        }
    }
}
