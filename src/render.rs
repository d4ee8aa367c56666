//! Render collaborator traits.
//!
//! [`Stage`] drives avatar objects by render slot. [`Overlay`] owns the
//! message balloons drawn above them. Both are implemented by the host; the
//! crate only issues commands and reads back object state.

use crate::participant::SlotIndex;

/// Movement speed used for remote avatars.
pub const MOVE_SPEED: u8 = 1;

/// Snapshot of a render object, as reported by [`Stage::object`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectInfo {
    pub x: f64,
    pub y: f64,
    /// Movement direction; zero when stationary.
    pub direction: u8,
    pub loop_: f64,
    pub cel: f64,
    /// Room number the object is in.
    pub room: u32,
    pub bounds_width: f64,
    /// Height of the current cel above the object's baseline.
    pub extents_top: f64,
}

impl ObjectInfo {
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        self.direction == 0
    }

    /// Whether the object has been placed anywhere yet.
    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.x != 0.0 && self.y != 0.0
    }

    #[allow(clippy::float_cmp)]
    #[must_use]
    pub fn is_at(&self, x: f64, y: f64) -> bool {
        self.x == x && self.y == y
    }
}

/// Avatar commands, keyed by render slot.
pub trait Stage {
    /// Create an animated object in `index`.
    fn animate(&mut self, index: SlotIndex);
    fn position(&mut self, index: SlotIndex, x: f64, y: f64);
    fn move_to(&mut self, index: SlotIndex, x: f64, y: f64, speed: u8);
    fn set_view(&mut self, index: SlotIndex, view: f64);
    fn set_loop(&mut self, index: SlotIndex, loop_: f64);
    fn set_cel(&mut self, index: SlotIndex, cel: f64);
    fn force_update(&mut self, index: SlotIndex);
    fn start_cycling(&mut self, index: SlotIndex);
    fn stop_cycling(&mut self, index: SlotIndex);
    fn erase(&mut self, index: SlotIndex);
    fn draw(&mut self, index: SlotIndex);
    /// Opacity in percent, 0..=100.
    fn set_opacity(&mut self, index: SlotIndex, opacity: u8);
    fn object(&self, index: SlotIndex) -> Option<ObjectInfo>;
}

/// Handle to a mounted message balloon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Message balloon commands.
pub trait Overlay {
    /// Mount a balloon showing `text` for the avatar in `slot`.
    fn mount_message(&mut self, slot: SlotIndex, text: &str) -> ElementId;
    fn unmount_message(&mut self, element: ElementId);
    /// Rendered `(width, height)` of a mounted balloon, in screen pixels.
    fn message_size(&self, element: ElementId) -> (f64, f64);
    fn place_message(&mut self, element: ElementId, left: f64, top: f64);
}
