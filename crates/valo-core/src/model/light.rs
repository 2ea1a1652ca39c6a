// ── Light state ──

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Normalized light state: 8-bit RGB, intensity in `[0, 1]`, on/off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightState {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    #[serde(rename = "alpha")]
    pub intensity: f64,
    #[serde(rename = "isOn")]
    pub on: bool,
}

impl LightState {
    /// Reported for groups without members and for bulbs whose color
    /// could not be decoded.
    pub const NEUTRAL: Self = Self {
        red: 0,
        green: 0,
        blue: 0,
        intensity: 1.0,
        on: true,
    };

    pub fn new(red: u8, green: u8, blue: u8, intensity: f64, on: bool) -> Self {
        Self {
            red,
            green,
            blue,
            intensity,
            on,
        }
    }

    /// Check the ranges the channel types cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.intensity.is_finite() || !(0.0..=1.0).contains(&self.intensity) {
            return Err(CoreError::ValidationFailed {
                message: format!("alpha must be between 0 and 1, got {}", self.intensity),
            });
        }
        Ok(())
    }

    /// Same color and intensity, different power flag.
    pub fn with_on(self, on: bool) -> Self {
        Self { on, ..self }
    }
}

impl Default for LightState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// RGB + intensity without the power flag, as shown on bulb DTOs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
}

impl From<LightState> for Rgba {
    fn from(state: LightState) -> Self {
        Self {
            red: state.red,
            green: state.green,
            blue: state.blue,
            alpha: state.intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_bounds() {
        assert!(LightState::new(0, 0, 0, 0.0, true).validate().is_ok());
        assert!(LightState::new(255, 255, 255, 1.0, true).validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_intensity() {
        for intensity in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            let state = LightState::new(1, 2, 3, intensity, true);
            assert!(
                matches!(state.validate(), Err(CoreError::ValidationFailed { .. })),
                "intensity {intensity} should be rejected"
            );
        }
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let json = serde_json::to_value(LightState::NEUTRAL).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"red": 0, "green": 0, "blue": 0, "alpha": 1.0, "isOn": true})
        );
    }
}
