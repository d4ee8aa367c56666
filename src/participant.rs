//! Participant records, the fade state machine, and the participant registry.
//!
//! DESIGN
//! ======
//! A participant is assembled from whatever properties have arrived so far.
//! It becomes active the first time `x`, `y` and `view` are all usable and
//! stays active for the rest of its lifetime. Visibility transitions are a
//! single [`FadeState`] rather than independent in/out flags, so a record can
//! never be fading in and out at once.

#[cfg(test)]
#[path = "participant_test.rs"]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Opacity change per tick while fading.
pub const FADE_STEP: u8 = 4;

/// Fully opaque.
pub const OPACITY_MAX: u8 = 100;

/// Opacity a freshly spawned or repositioned avatar starts from.
pub const OPACITY_SPAWN: u8 = 1;

/// First render slot handed to a remote participant. Lower slots belong to
/// the host (slot 0 is the local avatar).
pub const FIRST_REMOTE_SLOT: u32 = 100;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque remote participant identifier, as assigned by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ParticipantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Local render slot controlled by [`crate::render::Stage`] commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotIndex(pub u32);

impl SlotIndex {
    /// The local avatar's slot.
    pub const LOCAL: Self = Self(0);

    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// FADE STATE
// =============================================================================

/// What happens once a fade-out reaches zero opacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndOfFade {
    /// Erase the avatar and delete the record.
    Remove,
    /// Snap the avatar to its target position and fade back in.
    Reposition,
}

/// Visibility transition an avatar is in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FadeState {
    #[default]
    Idle,
    /// Ramping up after a spawn or a reposition.
    FadingIn,
    /// Ramping down; the payload decides what happens at zero.
    FadingOut(EndOfFade),
}

/// Result of advancing a fade by one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FadeTick {
    /// New opacity, when it changed this tick.
    pub opacity: Option<u8>,
    /// Set on the tick a fade-out bottoms out.
    pub finished: Option<EndOfFade>,
}

// =============================================================================
// PARTICIPANT
// =============================================================================

/// A remote participant's synchronized state and avatar bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct Participant {
    pub id: ParticipantId,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub view: Option<f64>,
    pub loop_: Option<f64>,
    pub cel: Option<f64>,
    /// Room key last reported by the participant.
    pub room: Option<String>,
    /// Last chat line received.
    pub said: Option<String>,
    /// Properties without a typed handler, kept as received.
    pub extras: HashMap<String, Value>,
    /// Render slot, assigned on spawn and never changed afterwards.
    pub index: Option<SlotIndex>,
    pub opacity: u8,
    pub fade: FadeState,
    active: bool,
}

impl Participant {
    #[must_use]
    pub fn new(id: ParticipantId) -> Self {
        Self {
            id,
            x: None,
            y: None,
            view: None,
            loop_: None,
            cel: None,
            room: None,
            said: None,
            extras: HashMap::new(),
            index: None,
            opacity: 0,
            fade: FadeState::Idle,
            active: false,
        }
    }

    /// Whether the participant has ever had a usable position and view.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Recompute activation from the current properties. Activation is sticky.
    pub fn refresh_active(&mut self) -> bool {
        if !self.active {
            let positioned = self.x.is_some_and(|x| x > 0.0) && self.y.is_some_and(|y| y > 0.0);
            self.active = positioned && self.view.is_some();
        }
        self.active
    }

    /// Target position, once both coordinates are known.
    #[must_use]
    pub fn target(&self) -> Option<(f64, f64)> {
        Some((self.x?, self.y?))
    }

    /// Whether the participant is scheduled for removal.
    #[must_use]
    pub fn is_leaving(&self) -> bool {
        self.fade == FadeState::FadingOut(EndOfFade::Remove)
    }

    pub fn begin_fade_in(&mut self) {
        self.opacity = OPACITY_SPAWN;
        self.fade = FadeState::FadingIn;
    }

    pub fn begin_fade_out(&mut self, end: EndOfFade) {
        self.opacity = OPACITY_MAX;
        self.fade = FadeState::FadingOut(end);
    }

    /// Advance the current fade by one [`FADE_STEP`].
    pub fn step_fade(&mut self) -> FadeTick {
        let mut tick = FadeTick::default();
        match self.fade {
            FadeState::Idle => {}
            FadeState::FadingIn => {
                if self.opacity < OPACITY_MAX {
                    self.opacity = self.opacity.saturating_add(FADE_STEP).min(OPACITY_MAX);
                    tick.opacity = Some(self.opacity);
                }
                if self.opacity >= OPACITY_MAX {
                    self.fade = FadeState::Idle;
                }
            }
            FadeState::FadingOut(end) => {
                if self.opacity > 0 {
                    self.opacity = self.opacity.saturating_sub(FADE_STEP);
                    tick.opacity = Some(self.opacity);
                }
                if self.opacity == 0 {
                    self.fade = FadeState::Idle;
                    tick.finished = Some(end);
                }
            }
        }
        tick
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// All known remote participants, keyed by id.
#[derive(Debug, Default)]
pub struct Registry {
    participants: BTreeMap<ParticipantId, Participant>,
    /// Highest slot ever handed out in this run.
    high_water: Option<SlotIndex>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn get_mut(&mut self, id: &ParticipantId) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    /// Fetch the record for `id`, creating an inactive one if absent.
    pub fn get_or_create(&mut self, id: &ParticipantId) -> &mut Participant {
        self.participants
            .entry(id.clone())
            .or_insert_with(|| Participant::new(id.clone()))
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<ParticipantId> {
        self.participants.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Highest slot held by a live participant.
    #[must_use]
    pub fn highest_index(&self) -> Option<SlotIndex> {
        self.participants.values().filter_map(|p| p.index).max()
    }

    #[must_use]
    pub fn high_water(&self) -> Option<SlotIndex> {
        self.high_water
    }

    pub(crate) fn record_assigned(&mut self, index: SlotIndex) {
        self.high_water = Some(self.high_water.map_or(index, |hw| hw.max(index)));
    }
}
