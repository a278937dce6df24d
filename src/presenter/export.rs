//! Export seam for rendered result cards.
//!
//! Rasterizing, naming files, and calling platform share/clipboard APIs
//! belong to the host. This module only defines the contract and the
//! share-then-clipboard fallback order.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use tracing::{info, warn};

use super::artifact::RenderableDocument;
use crate::error::UnsupportedExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    Download,
    Share,
    Clipboard,
}

impl ExportTarget {
    /// What to suggest when this target is unavailable.
    pub fn fallback(self) -> Option<ExportTarget> {
        match self {
            ExportTarget::Share => Some(ExportTarget::Clipboard),
            ExportTarget::Clipboard => Some(ExportTarget::Download),
            ExportTarget::Download => None,
        }
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportTarget::Download => "download",
            ExportTarget::Share => "share",
            ExportTarget::Clipboard => "clipboard",
        })
    }
}

/// Host-side exporter: rasterizes the document to PNG and delivers it.
pub trait ArtifactExporter {
    /// Whether the platform offers this target at all.
    fn supports(&self, target: ExportTarget) -> bool;

    fn export(
        &self,
        document: &RenderableDocument,
        target: ExportTarget,
    ) -> impl Future<Output = Result<(), UnsupportedExportError>> + Send;
}

/// Export to one target, refusing up front if the platform lacks it.
pub async fn export_to<E: ArtifactExporter>(
    exporter: &E,
    document: &RenderableDocument,
    target: ExportTarget,
) -> Result<(), UnsupportedExportError> {
    if !exporter.supports(target) {
        return Err(UnsupportedExportError::new(target, "not supported on this platform"));
    }
    exporter.export(document, target).await?;
    info!("Exported results card via {}", target);
    Ok(())
}

/// Share via the platform share sheet, falling back to copying the image.
/// Returns the target that succeeded.
pub async fn share_or_copy<E: ArtifactExporter>(
    exporter: &E,
    document: &RenderableDocument,
) -> Result<ExportTarget, UnsupportedExportError> {
    match export_to(exporter, document, ExportTarget::Share).await {
        Ok(()) => return Ok(ExportTarget::Share),
        Err(e) => warn!("Share failed, falling back to clipboard: {}", e),
    }

    export_to(exporter, document, ExportTarget::Clipboard)
        .await
        .map(|()| ExportTarget::Clipboard)
        .map_err(|e| {
            warn!("Clipboard copy failed: {}", e);
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::MeasurementResult;
    use crate::presenter::build_shareable_artifact;
    use std::sync::Mutex;

    struct FakeExporter {
        supported: Vec<ExportTarget>,
        failing: Vec<ExportTarget>,
        delivered: Mutex<Vec<ExportTarget>>,
    }

    impl FakeExporter {
        fn new(supported: &[ExportTarget], failing: &[ExportTarget]) -> Self {
            Self {
                supported: supported.to_vec(),
                failing: failing.to_vec(),
                delivered: Mutex::new(Vec::new()),
            }
        }
    }

    impl ArtifactExporter for FakeExporter {
        fn supports(&self, target: ExportTarget) -> bool {
            self.supported.contains(&target)
        }

        async fn export(
            &self,
            _document: &RenderableDocument,
            target: ExportTarget,
        ) -> Result<(), UnsupportedExportError> {
            if self.failing.contains(&target) {
                return Err(UnsupportedExportError::new(target, "rasterization failed"));
            }
            self.delivered.lock().unwrap().push(target);
            Ok(())
        }
    }

    fn doc() -> RenderableDocument {
        build_shareable_artifact(&MeasurementResult::default().with(
            crate::measurement::MeasurementKey::Height,
            170.0,
        ))
    }

    #[tokio::test]
    async fn test_share_preferred_when_available() {
        let exporter = FakeExporter::new(&[ExportTarget::Share, ExportTarget::Clipboard], &[]);
        let used = share_or_copy(&exporter, &doc()).await.unwrap();
        assert_eq!(used, ExportTarget::Share);
        assert_eq!(*exporter.delivered.lock().unwrap(), vec![ExportTarget::Share]);
    }

    #[tokio::test]
    async fn test_falls_back_to_clipboard_without_share() {
        let exporter = FakeExporter::new(&[ExportTarget::Clipboard, ExportTarget::Download], &[]);
        let used = share_or_copy(&exporter, &doc()).await.unwrap();
        assert_eq!(used, ExportTarget::Clipboard);
    }

    #[tokio::test]
    async fn test_falls_back_when_share_fails() {
        let exporter = FakeExporter::new(
            &[ExportTarget::Share, ExportTarget::Clipboard],
            &[ExportTarget::Share],
        );
        let used = share_or_copy(&exporter, &doc()).await.unwrap();
        assert_eq!(used, ExportTarget::Clipboard);
    }

    #[tokio::test]
    async fn test_suggests_download_when_nothing_else_works() {
        let exporter = FakeExporter::new(&[ExportTarget::Download], &[]);
        let err = share_or_copy(&exporter, &doc()).await.unwrap_err();
        assert_eq!(err.target, ExportTarget::Clipboard);
        assert_eq!(err.fallback, Some(ExportTarget::Download));
        assert!(err.user_message().contains("downloading"));
        assert!(exporter.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_to_unsupported_target() {
        let exporter = FakeExporter::new(&[], &[]);
        let err = export_to(&exporter, &doc(), ExportTarget::Download).await.unwrap_err();
        assert_eq!(err.target, ExportTarget::Download);
        assert_eq!(err.fallback, None);
    }
}
