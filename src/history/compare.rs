//! Change classification between two recorded measurements.

use serde::Serialize;

use crate::measurement::{MeasurementKey, MeasurementResult};

/// Differences smaller than this (in cm) are reported as no change.
pub const CHANGE_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Increase,
    Decrease,
    Negligible,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change {
    pub direction: ChangeDirection,
    /// `current - previous`, unrounded.
    pub delta: f64,
}

impl Change {
    /// Signed delta to one decimal ("+1.2", "-0.8"), or "0" when negligible.
    pub fn display(&self) -> String {
        match self.direction {
            ChangeDirection::Negligible => "0".to_string(),
            ChangeDirection::Increase => format!("+{:.1}", self.delta),
            ChangeDirection::Decrease => format!("{:.1}", self.delta),
        }
    }
}

pub fn classify_change(current: f64, previous: f64) -> Change {
    let delta = current - previous;
    let direction = if delta.abs() < CHANGE_EPSILON {
        ChangeDirection::Negligible
    } else if delta > 0.0 {
        ChangeDirection::Increase
    } else {
        ChangeDirection::Decrease
    };
    Change { direction, delta }
}

/// Change for one measurement key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementChange {
    pub key: MeasurementKey,
    pub label: &'static str,
    pub change: Change,
}

/// Compare every key present on both sides, in display order.
pub fn changes_between(
    current: &MeasurementResult,
    previous: &MeasurementResult,
) -> Vec<MeasurementChange> {
    MeasurementKey::ALL
        .iter()
        .filter_map(|key| {
            let (cur, prev) = (current.get(*key)?, previous.get(*key)?);
            Some(MeasurementChange {
                key: *key,
                label: key.short_label(),
                change: classify_change(cur, prev),
            })
        })
        .collect()
}
