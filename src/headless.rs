//! In-memory host: a render stage, message overlay and local avatar with no
//! screen behind them.
//!
//! Objects walk toward their move target at their speed once per [`step`],
//! so stuck detection and pose settling behave as they would on a real
//! stage. Used by the demo driver and by integration tests.
//!
//! [`step`]: HeadlessHost::step

#[cfg(test)]
#[path = "headless_test.rs"]
mod tests;

use std::cmp::Ordering::{Equal, Greater, Less};
use std::collections::BTreeMap;

use crate::local::{LocalAvatar, LocalState};
use crate::participant::SlotIndex;
use crate::render::{ElementId, ObjectInfo, Overlay, Stage};

/// Sprite width reported for every object.
const OBJECT_WIDTH: f64 = 8.0;
/// Sprite height reported for every object.
const OBJECT_HEIGHT: f64 = 32.0;
/// Balloon metrics per character and per line.
const CHAR_WIDTH_PX: f64 = 7.0;
const LINE_HEIGHT_PX: f64 = 14.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadlessObject {
    pub x: f64,
    pub y: f64,
    pub view: f64,
    pub loop_: f64,
    pub cel: f64,
    pub direction: u8,
    pub room: u32,
    pub cycling: bool,
    pub drawn: bool,
    pub opacity: u8,
    target: Option<(f64, f64, f64)>,
}

impl HeadlessObject {
    fn info(&self) -> ObjectInfo {
        ObjectInfo {
            x: self.x,
            y: self.y,
            direction: self.direction,
            loop_: self.loop_,
            cel: self.cel,
            room: self.room,
            bounds_width: OBJECT_WIDTH,
            extents_top: OBJECT_HEIGHT,
        }
    }

    #[allow(clippy::float_cmp)]
    fn is_at(&self, x: f64, y: f64) -> bool {
        self.x == x && self.y == y
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Balloon {
    pub slot: SlotIndex,
    pub text: String,
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Default)]
pub struct HeadlessHost {
    objects: BTreeMap<SlotIndex, HeadlessObject>,
    balloons: BTreeMap<ElementId, Balloon>,
    next_element: u64,
    local: LocalState,
}

impl HeadlessHost {
    /// Create a host with the local avatar standing in slot 0.
    #[must_use]
    pub fn new(local: LocalState) -> Self {
        let mut host = Self::default();
        host.set_local(local);
        host
    }

    /// Update the local avatar and mirror it into slot 0.
    pub fn set_local(&mut self, local: LocalState) {
        let obj = self.objects.entry(SlotIndex::LOCAL).or_default();
        obj.x = local.x;
        obj.y = local.y;
        obj.view = local.view;
        obj.loop_ = local.loop_;
        obj.cel = local.cel;
        obj.direction = local.direction;
        obj.room = local.room;
        obj.drawn = true;
        obj.opacity = 100;
        self.local = local;
    }

    #[must_use]
    pub fn object_state(&self, index: SlotIndex) -> Option<&HeadlessObject> {
        self.objects.get(&index)
    }

    /// Hold an object in place, as if something on stage blocked it.
    pub fn block(&mut self, index: SlotIndex) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.target = None;
            obj.direction = 0;
        }
    }

    pub fn balloons(&self) -> impl Iterator<Item = &Balloon> {
        self.balloons.values()
    }

    #[must_use]
    pub fn balloon_for(&self, slot: SlotIndex) -> Option<&Balloon> {
        self.balloons.values().find(|b| b.slot == slot)
    }

    /// Advance every moving object one step toward its target.
    pub fn step(&mut self) {
        for obj in self.objects.values_mut() {
            let Some((tx, ty, speed)) = obj.target else {
                continue;
            };
            let dx = tx - obj.x;
            let dy = ty - obj.y;
            obj.x += dx.clamp(-speed, speed);
            obj.y += dy.clamp(-speed, speed);
            if obj.is_at(tx, ty) {
                obj.target = None;
                obj.direction = 0;
            } else {
                obj.direction = direction_of(tx - obj.x, ty - obj.y);
            }
        }
    }
}

/// Compass direction, 1 = up, clockwise to 8 = up-left; 0 when not moving.
fn direction_of(dx: f64, dy: f64) -> u8 {
    match (dx.partial_cmp(&0.0), dy.partial_cmp(&0.0)) {
        (Some(Equal), Some(Less)) => 1,
        (Some(Greater), Some(Less)) => 2,
        (Some(Greater), Some(Equal)) => 3,
        (Some(Greater), Some(Greater)) => 4,
        (Some(Equal), Some(Greater)) => 5,
        (Some(Less), Some(Greater)) => 6,
        (Some(Less), Some(Equal)) => 7,
        (Some(Less), Some(Less)) => 8,
        _ => 0,
    }
}

impl Stage for HeadlessHost {
    fn animate(&mut self, index: SlotIndex) {
        let room = self.local.room;
        let obj = self.objects.entry(index).or_default();
        obj.room = room;
    }

    fn position(&mut self, index: SlotIndex, x: f64, y: f64) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.x = x;
            obj.y = y;
            obj.target = None;
            obj.direction = 0;
        }
    }

    fn move_to(&mut self, index: SlotIndex, x: f64, y: f64, speed: u8) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.target = Some((x, y, f64::from(speed.max(1))));
            obj.direction = direction_of(x - obj.x, y - obj.y);
        }
    }

    fn set_view(&mut self, index: SlotIndex, view: f64) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.view = view;
        }
    }

    fn set_loop(&mut self, index: SlotIndex, loop_: f64) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.loop_ = loop_;
        }
    }

    fn set_cel(&mut self, index: SlotIndex, cel: f64) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.cel = cel;
        }
    }

    fn force_update(&mut self, _index: SlotIndex) {}

    fn start_cycling(&mut self, index: SlotIndex) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.cycling = true;
        }
    }

    fn stop_cycling(&mut self, index: SlotIndex) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.cycling = false;
        }
    }

    fn erase(&mut self, index: SlotIndex) {
        self.objects.remove(&index);
    }

    fn draw(&mut self, index: SlotIndex) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.drawn = true;
        }
    }

    fn set_opacity(&mut self, index: SlotIndex, opacity: u8) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.opacity = opacity.min(100);
        }
    }

    fn object(&self, index: SlotIndex) -> Option<ObjectInfo> {
        self.objects.get(&index).map(HeadlessObject::info)
    }
}

impl Overlay for HeadlessHost {
    fn mount_message(&mut self, slot: SlotIndex, text: &str) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.balloons
            .insert(id, Balloon { slot, text: text.to_owned(), left: 0.0, top: 0.0 });
        id
    }

    fn unmount_message(&mut self, element: ElementId) {
        self.balloons.remove(&element);
    }

    fn message_size(&self, element: ElementId) -> (f64, f64) {
        let Some(balloon) = self.balloons.get(&element) else {
            return (0.0, 0.0);
        };
        let widest = balloon.text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let lines = balloon.text.lines().count().max(1);
        (
            f64::from(u32::try_from(widest).unwrap_or(u32::MAX)) * CHAR_WIDTH_PX,
            f64::from(u32::try_from(lines).unwrap_or(u32::MAX)) * LINE_HEIGHT_PX,
        )
    }

    fn place_message(&mut self, element: ElementId, left: f64, top: f64) {
        if let Some(balloon) = self.balloons.get_mut(&element) {
            balloon.left = left;
            balloon.top = top;
        }
    }
}

impl LocalAvatar for HeadlessHost {
    fn local_state(&self) -> LocalState {
        self.local.clone()
    }
}
