//! Display rows and the shareable results card for a measurement result.

mod artifact;
mod export;
mod normalize;

pub use artifact::{build_shareable_artifact, ArtifactRow, RenderableDocument};
pub use export::{export_to, share_or_copy, ArtifactExporter, ExportTarget};
pub use normalize::{normalize, MeasurementRow, UNIT};
