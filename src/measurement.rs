//! Measurement keys and the result payload returned by the inference service.

use serde::{Deserialize, Serialize};

use crate::error::RemoteServiceError;

/// The fixed set of body measurements the service reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKey {
    Height,
    Shoulder,
    Hip,
    ArmLength,
    LegInseam,
}

impl MeasurementKey {
    /// Display order used everywhere results are listed.
    pub const ALL: [MeasurementKey; 5] = [
        MeasurementKey::Height,
        MeasurementKey::Shoulder,
        MeasurementKey::Hip,
        MeasurementKey::ArmLength,
        MeasurementKey::LegInseam,
    ];

    /// JSON key used by the service and by persisted history.
    pub fn wire_key(self) -> &'static str {
        match self {
            MeasurementKey::Height => "Estimated Height (cm)",
            MeasurementKey::Shoulder => "Shoulder (cm)",
            MeasurementKey::Hip => "Hip (cm)",
            MeasurementKey::ArmLength => "Arm Length (cm)",
            MeasurementKey::LegInseam => "Leg / Inseam (cm)",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MeasurementKey::Height => "Height",
            MeasurementKey::Shoulder => "Shoulder",
            MeasurementKey::Hip => "Hip",
            MeasurementKey::ArmLength => "Arm Length",
            MeasurementKey::LegInseam => "Leg/Inseam",
        }
    }

    /// Compact label for history rows and the change grid.
    pub fn short_label(self) -> &'static str {
        match self {
            MeasurementKey::Height => "Height",
            MeasurementKey::Shoulder => "Shoulder",
            MeasurementKey::Hip => "Hip",
            MeasurementKey::ArmLength => "Arm",
            MeasurementKey::LegInseam => "Leg",
        }
    }
}

/// Centimeter values reported by the inference service.
///
/// Every field is optional: a key the service omits stays `None` and is
/// rendered as absent, never as zero. Older service builds report height
/// under `"Height (cm)"`, which is accepted on input; output always uses the
/// canonical key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireMeasurements")]
pub struct MeasurementResult {
    #[serde(rename = "Estimated Height (cm)", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,

    #[serde(rename = "Shoulder (cm)", skip_serializing_if = "Option::is_none")]
    pub shoulder: Option<f64>,

    #[serde(rename = "Hip (cm)", skip_serializing_if = "Option::is_none")]
    pub hip: Option<f64>,

    #[serde(rename = "Arm Length (cm)", skip_serializing_if = "Option::is_none")]
    pub arm_length: Option<f64>,

    #[serde(rename = "Leg / Inseam (cm)", skip_serializing_if = "Option::is_none")]
    pub leg_inseam: Option<f64>,
}

/// Input shape. The legacy height key is a separate field so a body that
/// carries both keys still parses; the canonical key wins.
#[derive(Deserialize)]
struct WireMeasurements {
    #[serde(rename = "Estimated Height (cm)", default)]
    estimated_height: Option<f64>,
    #[serde(rename = "Height (cm)", default)]
    legacy_height: Option<f64>,
    #[serde(rename = "Shoulder (cm)", default)]
    shoulder: Option<f64>,
    #[serde(rename = "Hip (cm)", default)]
    hip: Option<f64>,
    #[serde(rename = "Arm Length (cm)", default)]
    arm_length: Option<f64>,
    #[serde(rename = "Leg / Inseam (cm)", default)]
    leg_inseam: Option<f64>,
}

impl From<WireMeasurements> for MeasurementResult {
    fn from(wire: WireMeasurements) -> Self {
        Self {
            height: wire.estimated_height.or(wire.legacy_height),
            shoulder: wire.shoulder,
            hip: wire.hip,
            arm_length: wire.arm_length,
            leg_inseam: wire.leg_inseam,
        }
    }
}

impl MeasurementResult {
    pub fn get(&self, key: MeasurementKey) -> Option<f64> {
        match key {
            MeasurementKey::Height => self.height,
            MeasurementKey::Shoulder => self.shoulder,
            MeasurementKey::Hip => self.hip,
            MeasurementKey::ArmLength => self.arm_length,
            MeasurementKey::LegInseam => self.leg_inseam,
        }
    }

    /// Builder-style setter, mostly useful for fixtures.
    pub fn with(mut self, key: MeasurementKey, value: f64) -> Self {
        let slot = match key {
            MeasurementKey::Height => &mut self.height,
            MeasurementKey::Shoulder => &mut self.shoulder,
            MeasurementKey::Hip => &mut self.hip,
            MeasurementKey::ArmLength => &mut self.arm_length,
            MeasurementKey::LegInseam => &mut self.leg_inseam,
        };
        *slot = Some(value);
        self
    }

    /// True when none of the known keys carry a value.
    pub fn is_empty(&self) -> bool {
        MeasurementKey::ALL.iter().all(|k| self.get(*k).is_none())
    }

    /// Parse a success-status response body from the inference service.
    ///
    /// A body that is not a JSON object, has non-numeric values for known
    /// keys, or carries none of the known keys is a malformed payload.
    pub fn from_response_body(body: &[u8]) -> Result<Self, RemoteServiceError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| RemoteServiceError::MalformedPayload(e.to_string()))?;
        if !value.is_object() {
            return Err(RemoteServiceError::MalformedPayload(
                "response body is not a JSON object".to_string(),
            ));
        }

        let result: MeasurementResult = serde_json::from_value(value)
            .map_err(|e| RemoteServiceError::MalformedPayload(e.to_string()))?;

        if result.is_empty() {
            return Err(RemoteServiceError::MalformedPayload(
                "response contained none of the expected measurement keys".to_string(),
            ));
        }
        Ok(result)
    }
}
