//! Property update reducer.
//!
//! DESIGN
//! ======
//! Updates arrive one property at a time, in any order. The reducer stores
//! each value on the participant record and only touches the stage once the
//! participant is active:
//!
//! 1. malformed values are dropped
//! 2. an update for a participant that is fading out to leave means they are
//!    back; the old avatar is erased at once instead of overlapping the new one
//! 3. `disconnect` starts removal regardless of anything else
//! 4. the first update that activates a participant spawns it
//! 5. later updates move, re-pose, or make the avatar speak

#[cfg(test)]
#[path = "reducer_test.rs"]
mod tests;

use std::time::Instant;

use tracing::debug;

use crate::lifecycle;
use crate::message::MessageBoard;
use crate::participant::{Participant, Registry, SlotIndex};
use crate::property::{Change, PropertyUpdate};
use crate::render::{MOVE_SPEED, Overlay, Stage};
use crate::text::LineWrap;

/// What an update did. Mostly useful for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// Value could not be read; nothing changed.
    Dropped,
    /// Value stored; participant not on stage yet.
    Stored,
    /// Participant became visible in the given slot.
    Spawned(SlotIndex),
    /// Participant is leaving.
    Removing,
    /// Value stored and forwarded to the stage or message board.
    Rendered,
}

/// Fold one update into the registry.
pub fn apply<H>(
    registry: &mut Registry,
    messages: &mut MessageBoard,
    host: &mut H,
    wrap: &dyn LineWrap,
    update: &PropertyUpdate,
    now: Instant,
) -> Applied
where
    H: Stage + Overlay,
{
    let Some(change) = update.change() else {
        debug!(id = %update.id, name = %update.name, value = %update.value, "presence: malformed value dropped");
        return Applied::Dropped;
    };

    if registry.get(&update.id).is_some_and(Participant::is_leaving) {
        debug!(id = %update.id, "presence: participant rejoined during fade-out");
        lifecycle::despawn(registry, messages, host, &update.id);
    }

    let participant = registry.get_or_create(&update.id);
    store(participant, &change);
    participant.refresh_active();

    if change == Change::Disconnect {
        lifecycle::remove(registry, &update.id);
        return Applied::Removing;
    }
    if !participant.is_active() {
        return Applied::Stored;
    }
    let Some(index) = participant.index else {
        return lifecycle::spawn(registry, host, &update.id).map_or(Applied::Stored, Applied::Spawned);
    };

    match change {
        Change::X(_) | Change::Y(_) => {
            let Some((x, y)) = participant.target() else {
                return Applied::Stored;
            };
            host.start_cycling(index);
            host.move_to(index, x, y, MOVE_SPEED);
        }
        Change::View(view) => {
            host.set_view(index, view);
            host.force_update(index);
        }
        Change::Say(text) => {
            messages.enqueue(host, wrap, index, &text, now);
        }
        Change::Loop(_) | Change::Cel(_) | Change::Room(_) | Change::Other { .. } => {
            return Applied::Stored;
        }
        Change::Disconnect => return Applied::Removing,
    }
    Applied::Rendered
}

fn store(participant: &mut Participant, change: &Change) {
    match change {
        Change::X(x) => participant.x = Some(*x),
        Change::Y(y) => participant.y = Some(*y),
        Change::View(view) => participant.view = Some(*view),
        Change::Loop(loop_) => participant.loop_ = Some(*loop_),
        Change::Cel(cel) => participant.cel = Some(*cel),
        Change::Room(room) => participant.room = Some(room.clone()),
        Change::Say(text) => participant.said = Some(text.clone()),
        Change::Disconnect => {}
        Change::Other { name, value } => {
            participant.extras.insert(name.clone(), value.clone());
        }
    }
}
