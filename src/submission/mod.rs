//! Submitting a complete image set to the measurement service.

mod client;
mod controller;
mod session;

pub use client::{build_form, HttpMeasurementClient, MeasurementRequest, MeasurementService};
pub use controller::{parse_height, HeightPolicy, SubmissionController};
pub use session::{Session, SharedSession};
