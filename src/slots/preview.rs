//! Preview generation for image slots.
//!
//! A preview is a `data:` URL of the selected file, produced off the caller's
//! path. Selecting a file hands back a [`PreviewJob`]; running it yields a
//! [`PreviewReady`] which the slot manager applies only if the slot still
//! holds the same file.

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, warn};

use super::types::{CandidateFile, SlotRole};

/// Pending preview work for one slot selection.
#[derive(Debug, Clone)]
pub struct PreviewJob {
    role: SlotRole,
    generation: u64,
    file: CandidateFile,
}

/// A finished preview, tagged with the selection it was produced for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewReady {
    pub role: SlotRole,
    pub generation: u64,
    pub data_url: String,
}

impl PreviewJob {
    pub(crate) fn new(role: SlotRole, generation: u64, file: CandidateFile) -> Self {
        Self {
            role,
            generation,
            file,
        }
    }

    pub fn role(&self) -> SlotRole {
        self.role
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Encode synchronously. Prefer [`PreviewJob::run`] from async code.
    pub fn render(self) -> PreviewReady {
        let data_url = encode_data_url(&self.file.media_type, &self.file.bytes);
        debug!(
            "Rendered {} preview: {} bytes -> {} chars",
            self.role,
            self.file.len(),
            data_url.len()
        );
        PreviewReady {
            role: self.role,
            generation: self.generation,
            data_url,
        }
    }

    /// Encode on the blocking pool so large photos don't stall the event loop.
    /// Returns `None` if the encoding task was cancelled or panicked.
    pub async fn run(self) -> Option<PreviewReady> {
        let role = self.role;
        match tokio::task::spawn_blocking(move || self.render()).await {
            Ok(ready) => Some(ready),
            Err(e) => {
                warn!("Preview task for {} slot failed: {}", role, e);
                None
            }
        }
    }
}

/// Build a `data:` URL for the given blob.
pub fn encode_data_url(media_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        media_type.trim().to_ascii_lowercase(),
        STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_data_url() {
        assert_eq!(encode_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
        assert_eq!(encode_data_url(" Image/JPEG ", b""), "data:image/jpeg;base64,");
    }

    #[test]
    fn test_render_is_stable() {
        let file = CandidateFile::new("front.jpg", "image/jpeg", vec![0xFFu8, 0xD8, 0xFF]);
        let a = PreviewJob::new(SlotRole::Front, 3, file.clone()).render();
        let b = PreviewJob::new(SlotRole::Front, 3, file).render();
        assert_eq!(a, b);
        assert_eq!(a.generation, 3);
        assert!(a.data_url.starts_with("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn test_run_matches_render() {
        let file = CandidateFile::new("side.png", "image/png", vec![1u8; 64]);
        let job = PreviewJob::new(SlotRole::Side, 1, file);
        let expected = job.clone().render();
        let ready = job.run().await.unwrap();
        assert_eq!(ready, expected);
    }
}
