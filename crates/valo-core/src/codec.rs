// ── Color/state codec ──
//
// Pure translation between the normalized `LightState` and the gateway's
// native representation: `rrggbb` hex, integer dimmer percent, on flag.

use thiserror::Error;
use valo_gateway::LightOperation;

use crate::model::LightState;

/// Malformed light data received from the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid color '{color}': expected exactly 6 hex digits")]
    InvalidColor { color: String },
}

/// Encode a light state as a gateway command.
///
/// Turning a light off, or to an intensity that rounds to a 0% dimmer,
/// emits the bare off switch: no color, no dimmer.
pub fn to_device_operation(state: &LightState) -> LightOperation {
    let dimmer = dimmer_percent(state.intensity);
    if !state.on || dimmer == 0 {
        return LightOperation::switch(false);
    }
    LightOperation {
        on: true,
        color: Some(color_hex(state.red, state.green, state.blue)),
        dimmer: Some(dimmer),
    }
}

/// Decode the gateway's native light values.
pub fn from_device_state(color: &str, dimmer: u8, on: bool) -> Result<LightState, DecodeError> {
    let (red, green, blue) = parse_color_hex(color)?;
    Ok(LightState {
        red,
        green,
        blue,
        intensity: f64::from(dimmer.min(100)) / 100.0,
        on,
    })
}

/// Lowercase `rrggbb`.
pub fn color_hex(red: u8, green: u8, blue: u8) -> String {
    format!("{red:02x}{green:02x}{blue:02x}")
}

/// Parse `rrggbb` (any letter case) into channels.
pub fn parse_color_hex(color: &str) -> Result<(u8, u8, u8), DecodeError> {
    let invalid = || DecodeError::InvalidColor {
        color: color.to_owned(),
    };
    if color.len() != 6 || !color.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        color
            .get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
            .ok_or_else(invalid)
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn dimmer_percent(intensity: f64) -> u8 {
    // Clamped to [0, 100] first, so the cast is exact.
    (intensity * 100.0).round().clamp(0.0, 100.0) as u8
}
