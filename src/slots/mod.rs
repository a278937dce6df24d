//! Image slot management for the three capture poses.
//!
//! Holds at most one file per role, filters candidates by declared media
//! type, and tracks preview generation. No network or disk I/O happens here.

mod preview;
mod types;

pub use preview::{encode_data_url, PreviewJob, PreviewReady};
pub use types::{CandidateFile, ImageSlot, SlotRole};

use tracing::{debug, info};

/// What the host should do after a drop event.
#[derive(Debug)]
pub struct DropOutcome {
    /// Always true: the host must suppress the browser's default navigation.
    pub default_prevented: bool,
    pub preview: Option<PreviewJob>,
}

/// The front, side and standing slots of one session.
#[derive(Debug, Clone)]
pub struct ImageSlots {
    slots: [ImageSlot; 3],
}

impl Default for ImageSlots {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSlots {
    pub fn new() -> Self {
        Self {
            slots: SlotRole::ALL.map(ImageSlot::new),
        }
    }

    pub fn slot(&self, role: SlotRole) -> &ImageSlot {
        &self.slots[role.index()]
    }

    fn slot_mut(&mut self, role: SlotRole) -> &mut ImageSlot {
        &mut self.slots[role.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageSlot> {
        self.slots.iter()
    }

    pub fn file(&self, role: SlotRole) -> Option<&CandidateFile> {
        self.slot(role).file()
    }

    /// Accept `candidate` into the slot if it declares an image media type.
    ///
    /// Returns the preview job for the new file, or `None` if the candidate
    /// was rejected (in which case the slot is untouched).
    pub fn select(&mut self, role: SlotRole, candidate: CandidateFile) -> Option<PreviewJob> {
        if !candidate.is_image() {
            info!(
                "Rejected '{}' for {} slot: media type '{}' is not an image",
                candidate.name, role, candidate.media_type
            );
            return None;
        }

        let slot = self.slot_mut(role);
        slot.generation += 1;
        slot.preview = None;
        info!(
            "Selected '{}' ({} bytes) for {} slot",
            candidate.name,
            candidate.len(),
            role
        );
        slot.file = Some(candidate.clone());
        Some(PreviewJob::new(role, slot.generation, candidate))
    }

    /// Empty the slot and its preview.
    pub fn clear(&mut self, role: SlotRole) {
        let slot = self.slot_mut(role);
        if slot.file.take().is_some() {
            debug!("Cleared {} slot", role);
        }
        slot.preview = None;
        slot.generation += 1;
    }

    pub fn drag_enter(&mut self, role: SlotRole) {
        self.slot_mut(role).hovering = true;
    }

    pub fn drag_leave(&mut self, role: SlotRole) {
        self.slot_mut(role).hovering = false;
    }

    /// Handle a drop: end hover, then select the first dropped file if any.
    pub fn drop_file(&mut self, role: SlotRole, candidate: Option<CandidateFile>) -> DropOutcome {
        self.drag_leave(role);
        let preview = candidate.and_then(|c| self.select(role, c));
        DropOutcome {
            default_prevented: true,
            preview,
        }
    }

    /// Install a finished preview. Returns false if the slot's file changed
    /// (or was cleared) since the job was created.
    pub fn apply_preview(&mut self, ready: PreviewReady) -> bool {
        let slot = self.slot_mut(ready.role);
        if slot.generation != ready.generation || slot.file.is_none() {
            debug!(
                "Discarding stale {} preview (generation {} != {})",
                ready.role, ready.generation, slot.generation
            );
            return false;
        }
        slot.preview = Some(ready.data_url);
        true
    }

    /// Roles without a file, in capture order.
    pub fn missing_roles(&self) -> Vec<SlotRole> {
        self.slots
            .iter()
            .filter(|s| !s.is_filled())
            .map(|s| s.role())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.is_filled())
    }

    pub fn reset(&mut self) {
        for role in SlotRole::ALL {
            self.clear(role);
            self.drag_leave(role);
        }
    }
}
