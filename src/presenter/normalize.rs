use serde::Serialize;

use crate::measurement::{MeasurementKey, MeasurementResult};

pub const UNIT: &str = "cm";

/// One display line of a measurement result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRow {
    pub key: MeasurementKey,
    pub label: &'static str,
    /// `None` when the service did not report this key.
    pub value: Option<f64>,
}

impl MeasurementRow {
    /// Value to one decimal place, or `None` if absent.
    pub fn formatted_value(&self) -> Option<String> {
        self.value.map(|v| format!("{:.1}", v))
    }
}

/// Rows in the fixed display order: Height, Shoulder, Hip, Arm Length,
/// Leg/Inseam. Missing values stay `None`.
pub fn normalize(raw: &MeasurementResult) -> Vec<MeasurementRow> {
    MeasurementKey::ALL
        .iter()
        .map(|key| MeasurementRow {
            key: *key,
            label: key.label(),
            value: raw.get(*key),
        })
        .collect()
}
