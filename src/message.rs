//! Chat balloons: one FIFO queue and at most one visible balloon per slot.
//!
//! DESIGN
//! ======
//! Each render slot gets a [`MessageSlot`] the first time something is said
//! there. A slot shows one balloon at a time; the balloon stays up for
//! [`display_duration`] and then a timer advances the slot to the next queued
//! line, or hides it when the queue is empty.
//!
//! Timers live in a [`TimerQueue`] owned by the board. The slot remembers the
//! handle it scheduled; a fired timer whose handle does not match is stale
//! and ignored.

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::participant::SlotIndex;
use crate::render::{ElementId, Overlay, Stage};
use crate::text::LineWrap;
use crate::timer::{TimerAction, TimerHandle, TimerQueue};

/// Base display time for any message.
pub const BASE_DURATION_MS: u64 = 3000;

/// Extra display time per character.
pub const PER_CHAR_MS: u64 = 50;

/// Display time cap.
pub const MAX_DURATION_MS: u64 = 6750;

/// Vertical gap between a balloon and the avatar's head, in pixels.
const BALLOON_GAP_PX: f64 = 6.0;

/// Horizontal nudge applied to centre the balloon tail, in pixels.
const BALLOON_NUDGE_PX: f64 = 5.0;

/// How long a (wrapped) message stays on screen.
#[must_use]
pub fn display_duration(text: &str) -> Duration {
    let chars = u64::try_from(text.chars().count()).unwrap_or(u64::MAX);
    let ms = PER_CHAR_MS
        .saturating_mul(chars)
        .saturating_add(BASE_DURATION_MS)
        .min(MAX_DURATION_MS);
    Duration::from_millis(ms)
}

/// Per-slot message state.
#[derive(Debug, Default)]
pub struct MessageSlot {
    queue: VecDeque<String>,
    active: Option<ElementId>,
    timer: Option<TimerHandle>,
}

impl MessageSlot {
    /// Lines waiting to be shown, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    #[must_use]
    pub fn active(&self) -> Option<ElementId> {
        self.active
    }

    #[must_use]
    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }
}

/// All message slots and their display timers.
#[derive(Debug)]
pub struct MessageBoard {
    slots: BTreeMap<SlotIndex, MessageSlot>,
    timers: TimerQueue,
    wrap_width: usize,
    zoom: f64,
}

impl MessageBoard {
    #[must_use]
    pub fn new(wrap_width: usize, zoom: f64) -> Self {
        Self { slots: BTreeMap::new(), timers: TimerQueue::new(), wrap_width, zoom }
    }

    #[must_use]
    pub fn slot(&self, index: SlotIndex) -> Option<&MessageSlot> {
        self.slots.get(&index)
    }

    pub fn slot_indices(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        self.slots.keys().copied()
    }

    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Wrap `text` and queue it on `index`, showing it right away when the
    /// slot is idle.
    pub fn enqueue<H>(&mut self, host: &mut H, wrap: &dyn LineWrap, index: SlotIndex, text: &str, now: Instant)
    where
        H: Stage + Overlay,
    {
        let wrapped = wrap.wrap_lines(text, self.wrap_width).join("\n");
        let slot = self.slots.entry(index).or_default();
        slot.queue.push_back(wrapped);
        if slot.queue.len() == 1 && slot.timer.is_none() {
            self.show_next(host, index, now);
        }
    }

    /// Replace the visible balloon with the oldest queued line, or hide the
    /// slot when nothing is queued.
    pub fn show_next<H>(&mut self, host: &mut H, index: SlotIndex, now: Instant)
    where
        H: Stage + Overlay,
    {
        let Some(text) = self.slots.get_mut(&index).and_then(|slot| slot.queue.pop_front()) else {
            self.hide(host, index);
            return;
        };
        self.hide(host, index);

        let element = host.mount_message(index, &text);
        let timer = self
            .timers
            .schedule(now + display_duration(&text), TimerAction::ShowNext(index));
        let slot = self.slots.entry(index).or_default();
        slot.active = Some(element);
        slot.timer = Some(timer);
        debug!(%index, chars = text.chars().count(), "message: shown");

        self.reposition(host, index);
    }

    /// Unmount the visible balloon and cancel the pending timer. Queued lines
    /// are kept.
    pub fn hide<O: Overlay>(&mut self, host: &mut O, index: SlotIndex) {
        let Some(slot) = self.slots.get_mut(&index) else {
            return;
        };
        if let Some(element) = slot.active.take() {
            host.unmount_message(element);
        }
        if let Some(timer) = slot.timer.take() {
            self.timers.cancel(timer);
        }
    }

    /// Place the visible balloon above its avatar.
    pub fn reposition<H>(&self, host: &mut H, index: SlotIndex)
    where
        H: Stage + Overlay,
    {
        let Some(element) = self.slots.get(&index).and_then(|slot| slot.active) else {
            return;
        };
        let Some(obj) = host.object(index) else {
            return;
        };
        let (width, height) = host.message_size(element);
        let top = self.zoom * (obj.y - obj.extents_top) - height - BALLOON_GAP_PX;
        let left = self.zoom * 2.0 * (obj.x + obj.bounds_width) - (width / 2.0).round() + BALLOON_NUDGE_PX;
        host.place_message(element, left, top);
    }

    pub fn reposition_all<H>(&self, host: &mut H)
    where
        H: Stage + Overlay,
    {
        for index in self.slots.keys() {
            self.reposition(host, *index);
        }
    }

    /// Fire every timer due at `now`. Returns how many advanced a slot.
    pub fn fire_due<H>(&mut self, host: &mut H, now: Instant) -> usize
    where
        H: Stage + Overlay,
    {
        let mut fired = 0;
        while let Some((handle, action)) = self.timers.pop_due(now) {
            match action {
                TimerAction::ShowNext(index) => {
                    let Some(slot) = self.slots.get_mut(&index) else {
                        continue;
                    };
                    if slot.timer != Some(handle) {
                        debug!(%index, "message: stale timer ignored");
                        continue;
                    }
                    slot.timer = None;
                    self.show_next(host, index, now);
                    fired += 1;
                }
            }
        }
        fired
    }

    /// Hide and forget a slot, dropping anything still queued.
    pub fn remove_slot<O: Overlay>(&mut self, host: &mut O, index: SlotIndex) {
        self.hide(host, index);
        if let Some(slot) = self.slots.remove(&index) {
            if !slot.queue.is_empty() {
                debug!(%index, dropped = slot.queue.len(), "message: slot removed with queued lines");
            }
        }
    }

    /// Hide and forget every slot.
    pub fn clear<O: Overlay>(&mut self, host: &mut O) {
        let indices: Vec<SlotIndex> = self.slots.keys().copied().collect();
        for index in indices {
            self.remove_slot(host, index);
        }
        self.timers.clear();
    }
}
