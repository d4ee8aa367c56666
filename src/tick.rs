//! Per-frame driver.
//!
//! LIFECYCLE
//! =========
//! Once per host frame:
//! 1. publish the local participant's snapshot
//! 2. step every on-stage participant: settle pose, detect stuck avatars,
//!    advance fades, resolve finished fade-outs
//! 3. re-place every visible message balloon
//!
//! Each participant's step reads only its own record and render object, so
//! iteration order does not matter.

#[cfg(test)]
#[path = "tick_test.rs"]
mod tests;

use tracing::{debug, warn};

use crate::lifecycle;
use crate::local::LocalState;
use crate::message::MessageBoard;
use crate::participant::{EndOfFade, FadeState, Participant, ParticipantId, Registry};
use crate::render::{Overlay, Stage};
use crate::transport::{Props, Transport};

/// Build the outbound property map for the local participant.
///
/// Loop and cel are only meaningful while standing still; while walking the
/// receiving side animates the avatar itself.
#[must_use]
pub fn build_snapshot(local: &LocalState, game_id: &str) -> Props {
    let mut props = Props::new();
    props.insert("room".into(), serde_json::json!(format!("{game_id}:{}", local.room)));
    props.insert("x".into(), serde_json::json!(local.x));
    props.insert("y".into(), serde_json::json!(local.y));
    props.insert("view".into(), serde_json::json!(local.view));
    if local.is_stationary() {
        props.insert("loop".into(), serde_json::json!(local.loop_));
        props.insert("cel".into(), serde_json::json!(local.cel));
    }
    props
}

/// Send the snapshot. The first send asks for a full snapshot; the connection
/// counts as established from then on whether or not the server answered.
pub fn publish<T: Transport>(transport: &mut T, local: &LocalState, game_id: &str, connected: &mut bool) {
    let props = build_snapshot(local, game_id);
    if let Err(e) = transport.send(&props, !*connected) {
        warn!(error = %e, "presence: snapshot publish failed");
    }
    *connected = true;
}

/// Advance every on-stage participant by one frame.
pub fn step_participants<H>(registry: &mut Registry, messages: &mut MessageBoard, host: &mut H, local: &LocalState)
where
    H: Stage + Overlay,
{
    let mut finished: Vec<ParticipantId> = Vec::new();

    for id in registry.ids() {
        let Some(participant) = registry.get_mut(&id) else {
            continue;
        };
        if step_participant(participant, host, local) == Some(EndOfFade::Remove) {
            finished.push(id);
        }
    }

    for id in finished {
        lifecycle::despawn(registry, messages, host, &id);
    }
}

/// Step one participant. Returns the end action of a fade-out that completed
/// this frame, after applying it where it concerns only the avatar.
///
/// A participant whose render object has gone away still fades, so a pending
/// removal always completes; only the stage commands are skipped.
fn step_participant<S: Stage>(participant: &mut Participant, stage: &mut S, local: &LocalState) -> Option<EndOfFade> {
    if !participant.is_active() {
        return None;
    }
    let index = participant.index?;
    let (x, y) = participant.target()?;
    let obj = stage.object(index);

    if let Some(obj) = &obj {
        if obj.is_stationary() && obj.is_at(x, y) {
            stage.stop_cycling(index);
            if pose_differs(participant, obj.loop_, obj.cel) {
                if let Some(loop_) = participant.loop_ {
                    stage.set_loop(index, loop_);
                }
                if let Some(cel) = participant.cel {
                    stage.set_cel(index, cel);
                }
            }
        }

        let stuck = obj.is_stationary() && obj.room == local.room && obj.is_placed() && !obj.is_at(x, y);
        if stuck && participant.fade == FadeState::Idle {
            debug!(id = %participant.id, %index, "presence: avatar stuck, repositioning");
            participant.begin_fade_out(EndOfFade::Reposition);
        }
    }

    let on_stage = obj.is_some();
    let tick = participant.step_fade();
    if let Some(opacity) = tick.opacity
        && on_stage
    {
        stage.set_opacity(index, opacity);
    }
    match tick.finished {
        Some(EndOfFade::Reposition) => {
            participant.begin_fade_in();
            if on_stage {
                stage.position(index, x, y);
                stage.set_opacity(index, participant.opacity);
            }
            Some(EndOfFade::Reposition)
        }
        other => other,
    }
}

#[allow(clippy::float_cmp)]
fn pose_differs(participant: &Participant, loop_: f64, cel: f64) -> bool {
    participant.loop_.is_some_and(|l| l != loop_) || participant.cel.is_some_and(|c| c != cel)
}
