//! Recording test doubles for the host collaborators.

use std::collections::BTreeMap;

use crate::local::{LocalAvatar, LocalState};
use crate::participant::SlotIndex;
use crate::render::{ElementId, ObjectInfo, Overlay, Stage};
use crate::transport::{Props, Transport, TransportConfig, TransportError};

/// Every command the crate issued, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Animate(SlotIndex),
    Position(SlotIndex, f64, f64),
    MoveTo(SlotIndex, f64, f64, u8),
    SetView(SlotIndex, f64),
    SetLoop(SlotIndex, f64),
    SetCel(SlotIndex, f64),
    ForceUpdate(SlotIndex),
    StartCycling(SlotIndex),
    StopCycling(SlotIndex),
    Erase(SlotIndex),
    Draw(SlotIndex),
    SetOpacity(SlotIndex, u8),
    Mount(SlotIndex, ElementId, String),
    Unmount(ElementId),
    Place(ElementId, f64, f64),
}

/// Host whose objects only change when commands or tests change them.
/// Moves are recorded but never animated.
#[derive(Debug, Default)]
pub struct MockHost {
    pub commands: Vec<Command>,
    pub objects: BTreeMap<SlotIndex, ObjectInfo>,
    pub mounted: BTreeMap<ElementId, (SlotIndex, String)>,
    pub local: LocalState,
    next_element: u64,
}

impl MockHost {
    pub fn new() -> Self {
        let mut host = Self::default();
        host.local.room = 1;
        host.objects.insert(SlotIndex::LOCAL, ObjectInfo { x: 50.0, y: 60.0, room: 1, ..ObjectInfo::default() });
        host
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn opacities(&self, index: SlotIndex) -> Vec<u8> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::SetOpacity(i, o) if *i == index => Some(*o),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    /// Text of the balloon mounted for `slot`, if any.
    pub fn shown(&self, slot: SlotIndex) -> Option<&str> {
        self.mounted
            .values()
            .find(|(s, _)| *s == slot)
            .map(|(_, text)| text.as_str())
    }

    pub fn object_mut(&mut self, index: SlotIndex) -> &mut ObjectInfo {
        self.objects.entry(index).or_default()
    }
}

impl Stage for MockHost {
    fn animate(&mut self, index: SlotIndex) {
        let room = self.local.room;
        self.objects.insert(index, ObjectInfo { room, ..ObjectInfo::default() });
        self.commands.push(Command::Animate(index));
    }

    fn position(&mut self, index: SlotIndex, x: f64, y: f64) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.x = x;
            obj.y = y;
        }
        self.commands.push(Command::Position(index, x, y));
    }

    fn move_to(&mut self, index: SlotIndex, x: f64, y: f64, speed: u8) {
        self.commands.push(Command::MoveTo(index, x, y, speed));
    }

    fn set_view(&mut self, index: SlotIndex, view: f64) {
        self.commands.push(Command::SetView(index, view));
    }

    fn set_loop(&mut self, index: SlotIndex, loop_: f64) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.loop_ = loop_;
        }
        self.commands.push(Command::SetLoop(index, loop_));
    }

    fn set_cel(&mut self, index: SlotIndex, cel: f64) {
        if let Some(obj) = self.objects.get_mut(&index) {
            obj.cel = cel;
        }
        self.commands.push(Command::SetCel(index, cel));
    }

    fn force_update(&mut self, index: SlotIndex) {
        self.commands.push(Command::ForceUpdate(index));
    }

    fn start_cycling(&mut self, index: SlotIndex) {
        self.commands.push(Command::StartCycling(index));
    }

    fn stop_cycling(&mut self, index: SlotIndex) {
        self.commands.push(Command::StopCycling(index));
    }

    fn erase(&mut self, index: SlotIndex) {
        self.objects.remove(&index);
        self.commands.push(Command::Erase(index));
    }

    fn draw(&mut self, index: SlotIndex) {
        self.commands.push(Command::Draw(index));
    }

    fn set_opacity(&mut self, index: SlotIndex, opacity: u8) {
        self.commands.push(Command::SetOpacity(index, opacity));
    }

    fn object(&self, index: SlotIndex) -> Option<ObjectInfo> {
        self.objects.get(&index).cloned()
    }
}

impl Overlay for MockHost {
    fn mount_message(&mut self, slot: SlotIndex, text: &str) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.mounted.insert(id, (slot, text.to_owned()));
        self.commands.push(Command::Mount(slot, id, text.to_owned()));
        id
    }

    fn unmount_message(&mut self, element: ElementId) {
        self.mounted.remove(&element);
        self.commands.push(Command::Unmount(element));
    }

    fn message_size(&self, _element: ElementId) -> (f64, f64) {
        (40.0, 20.0)
    }

    fn place_message(&mut self, element: ElementId, left: f64, top: f64) {
        self.commands.push(Command::Place(element, left, top));
    }
}

impl LocalAvatar for MockHost {
    fn local_state(&self) -> LocalState {
        self.local.clone()
    }
}

/// Transport that records every send.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub started: Option<TransportConfig>,
    pub sent: Vec<(Props, bool)>,
    pub fail: bool,
}

impl Transport for RecordingTransport {
    fn start(&mut self, config: &TransportConfig) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Other("refused".into()));
        }
        self.started = Some(config.clone());
        Ok(())
    }

    fn send(&mut self, props: &Props, force_full: bool) -> Result<(), TransportError> {
        if self.fail {
            return Err(TransportError::Closed);
        }
        self.sent.push((props.clone(), force_full));
        Ok(())
    }
}
