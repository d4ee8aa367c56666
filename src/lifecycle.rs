//! Avatar lifecycle: spawn with fade-in, fade-out then remove.
//!
//! Slots are assigned above the highest slot in use, and never below the
//! highest slot ever handed out, so a slot (and the message slot keyed by it)
//! is never shared by two participants within one run.

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod tests;

use tracing::{debug, info};

use crate::message::MessageBoard;
use crate::participant::{EndOfFade, FIRST_REMOTE_SLOT, ParticipantId, Registry, SlotIndex};
use crate::render::{Overlay, Stage};

/// Outcome of [`remove`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// Fade-out started; the record goes away when it completes.
    FadingOut,
    /// The participant was never on screen and was deleted right away.
    Deleted,
    /// No such participant.
    Unknown,
}

/// The slot the next spawned participant receives.
#[must_use]
pub fn next_index(registry: &Registry) -> SlotIndex {
    let floor = SlotIndex(FIRST_REMOTE_SLOT - 1);
    let live = registry.highest_index().unwrap_or(floor);
    let issued = registry.high_water().unwrap_or(floor);
    live.max(issued).next()
}

/// Put an active participant on stage and start its fade-in.
///
/// Returns the assigned slot, or `None` if the participant is unknown,
/// already spawned, or lacks a position or view.
pub fn spawn<S: Stage>(registry: &mut Registry, stage: &mut S, id: &ParticipantId) -> Option<SlotIndex> {
    let index = next_index(registry);
    let participant = registry.get_mut(id)?;
    if participant.index.is_some() {
        return None;
    }
    let (x, y) = participant.target()?;
    let view = participant.view?;

    participant.index = Some(index);
    stage.animate(index);
    stage.position(index, x, y);
    stage.set_view(index, view);
    stage.draw(index);
    participant.begin_fade_in();
    stage.set_opacity(index, participant.opacity);

    registry.record_assigned(index);
    info!(%id, %index, x, y, view, "presence: participant spawned");
    Some(index)
}

/// Start removing a participant. Avatars on stage fade out first.
pub fn remove(registry: &mut Registry, id: &ParticipantId) -> Removal {
    let Some(participant) = registry.get_mut(id) else {
        return Removal::Unknown;
    };
    if participant.index.is_none() {
        registry.remove(id);
        debug!(%id, "presence: unspawned participant dropped");
        return Removal::Deleted;
    }
    participant.begin_fade_out(EndOfFade::Remove);
    info!(%id, "presence: participant leaving");
    Removal::FadingOut
}

/// Erase a participant's avatar, tear down its message slot, and delete its
/// record immediately.
pub fn despawn<H>(registry: &mut Registry, messages: &mut MessageBoard, host: &mut H, id: &ParticipantId) -> bool
where
    H: Stage + Overlay,
{
    let Some(participant) = registry.remove(id) else {
        return false;
    };
    if let Some(index) = participant.index {
        host.erase(index);
        messages.remove_slot(host, index);
        info!(%id, %index, "presence: participant removed");
    }
    true
}
