use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One of the three fixed capture poses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotRole {
    Front,
    Side,
    Standing,
}

impl SlotRole {
    pub const ALL: [SlotRole; 3] = [SlotRole::Front, SlotRole::Side, SlotRole::Standing];

    pub fn as_str(self) -> &'static str {
        match self {
            SlotRole::Front => "front",
            SlotRole::Side => "side",
            SlotRole::Standing => "standing",
        }
    }

    /// Multipart field name expected by the inference service.
    pub fn form_field(self) -> &'static str {
        match self {
            SlotRole::Front => "front",
            SlotRole::Side => "side",
            SlotRole::Standing => "stand",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SlotRole::Front => "Front Pose",
            SlotRole::Side => "Side Pose",
            SlotRole::Standing => "Standing Pose",
        }
    }

    /// Capture hint shown in the empty upload state.
    pub fn hint(self) -> &'static str {
        match self {
            SlotRole::Front => "Face the camera directly",
            SlotRole::Side => "Turn 90° to your left or right",
            SlotRole::Standing => "Arms slightly away from body",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            SlotRole::Front => 0,
            SlotRole::Side => 1,
            SlotRole::Standing => 2,
        }
    }
}

impl fmt::Display for SlotRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-picked file, as handed over by the host (file input or drop).
///
/// The bytes are shared so previews and the outbound request can hold the
/// blob without copying it per consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Only the declared media type is checked; content is never inspected.
    pub fn is_image(&self) -> bool {
        self.media_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// State of one capture slot.
#[derive(Debug, Clone)]
pub struct ImageSlot {
    role: SlotRole,
    pub(crate) file: Option<CandidateFile>,
    pub(crate) preview: Option<String>,
    pub(crate) hovering: bool,
    /// Bumped on every file change so late previews can be discarded.
    pub(crate) generation: u64,
}

impl ImageSlot {
    pub(crate) fn new(role: SlotRole) -> Self {
        Self {
            role,
            file: None,
            preview: None,
            hovering: false,
            generation: 0,
        }
    }

    pub fn role(&self) -> SlotRole {
        self.role
    }

    pub fn file(&self) -> Option<&CandidateFile> {
        self.file.as_ref()
    }

    /// The display encoding of the file, once it has been generated.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn is_filled(&self) -> bool {
        self.file.is_some()
    }

    /// A file is held but its preview has not arrived yet.
    pub fn is_preview_pending(&self) -> bool {
        self.file.is_some() && self.preview.is_none()
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
