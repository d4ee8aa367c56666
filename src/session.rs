//! Presence session: the coordinator that owns all presence state.
//!
//! ARCHITECTURE
//! ============
//! A [`Session`] is created once per connection by [`Session::init`] and
//! owns the participant registry, the message board and its timers, and the
//! host collaborators. Every operation borrows the session mutably; nothing
//! is global and nothing runs concurrently with anything else.
//!
//! The host drives it from two clocks:
//! - its frame loop calls [`Session::tick`] once per frame
//! - message timers are fired by [`Session::fire_due_timers`], which the host
//!   may call every frame or at [`Session::next_deadline`]
//!
//! Time-dependent calls have `_at` variants that take an explicit `Instant`.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::time::Instant;

use tracing::{info, warn};

use crate::config::PresenceConfig;
use crate::local::LocalAvatar;
use crate::message::MessageBoard;
use crate::participant::{Participant, ParticipantId, Registry, SlotIndex};
use crate::property::PropertyUpdate;
use crate::reducer::{self, Applied};
use crate::render::{Overlay, Stage};
use crate::text::{GreedyWrap, LineWrap};
use crate::tick;
use crate::transport::{Props, Transport};

pub struct Session<T, H> {
    config: PresenceConfig,
    transport: T,
    host: H,
    wrap: Box<dyn LineWrap>,
    registry: Registry,
    messages: MessageBoard,
    /// Set after the first snapshot went out.
    connected: bool,
    /// Whether any remote participant was known at the last tick.
    participants_visible: bool,
}

impl<T, H> Session<T, H>
where
    T: Transport,
    H: Stage + Overlay + LocalAvatar,
{
    /// Create the session and start the transport.
    ///
    /// A transport that fails to start is logged; the session still works
    /// locally and every later send reports its own failure.
    pub fn init(config: PresenceConfig, mut transport: T, host: H) -> Self {
        if config.enabled {
            match transport.start(&config.transport()) {
                Ok(()) => info!(endpoint = %config.endpoint, "presence: session started"),
                Err(e) => warn!(error = %e, "presence: transport failed to start"),
            }
        } else {
            info!("presence: disabled");
        }
        let messages = MessageBoard::new(config.wrap_width, config.zoom);
        Self {
            config,
            transport,
            host,
            wrap: Box::new(GreedyWrap),
            registry: Registry::new(),
            messages,
            connected: false,
            participants_visible: false,
        }
    }

    /// Replace the line wrapper used for message balloons.
    #[must_use]
    pub fn with_wrapper(mut self, wrap: impl LineWrap + 'static) -> Self {
        self.wrap = Box::new(wrap);
        self
    }

    // --- Inbound ---

    /// Apply one remote property update.
    pub fn on_update(&mut self, update: &PropertyUpdate) -> Applied {
        self.on_update_at(update, Instant::now())
    }

    pub fn on_update_at(&mut self, update: &PropertyUpdate, now: Instant) -> Applied {
        if !self.config.enabled {
            return Applied::Dropped;
        }
        reducer::apply(&mut self.registry, &mut self.messages, &mut self.host, self.wrap.as_ref(), update, now)
    }

    // --- Frame ---

    /// Run one frame: publish the local snapshot, advance fades, and re-place
    /// message balloons.
    pub fn tick(&mut self) {
        if !self.config.enabled {
            return;
        }
        self.participants_visible = !self.registry.is_empty();

        let local = self.host.local_state();
        tick::publish(&mut self.transport, &local, &self.config.game_id, &mut self.connected);
        tick::step_participants(&mut self.registry, &mut self.messages, &mut self.host, &local);
        self.messages.reposition_all(&mut self.host);
    }

    // --- Timers ---

    /// Fire message timers that are due. Returns how many slots advanced.
    pub fn fire_due_timers(&mut self) -> usize {
        self.fire_due_timers_at(Instant::now())
    }

    pub fn fire_due_timers_at(&mut self, now: Instant) -> usize {
        self.messages.fire_due(&mut self.host, now)
    }

    /// When the next message timer is due, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.messages.next_deadline()
    }

    // --- Outbound ---

    /// Broadcast a chat line. With `echo_locally`, also show it above the
    /// local avatar, but only when someone else is around to see it.
    ///
    /// The broadcast is not gated on anyone being visible: a participant who
    /// joins between ticks still receives the line.
    pub fn say(&mut self, text: &str, echo_locally: bool) {
        self.say_at(text, echo_locally, Instant::now());
    }

    pub fn say_at(&mut self, text: &str, echo_locally: bool, now: Instant) {
        if !self.config.enabled {
            return;
        }
        if echo_locally && self.participants_visible {
            self.messages
                .enqueue(&mut self.host, self.wrap.as_ref(), SlotIndex::LOCAL, text, now);
        }
        let mut props = Props::new();
        props.insert("say".into(), serde_json::json!(text));
        if let Err(e) = self.transport.send(&props, false) {
            warn!(error = %e, "presence: say failed");
        }
    }

    // --- Teardown ---

    /// Erase every remote avatar, hide every balloon, and forget all state.
    pub fn teardown(&mut self) {
        let count = self.registry.len();
        for id in self.registry.ids() {
            if let Some(index) = self.registry.remove(&id).and_then(|p| p.index) {
                self.host.erase(index);
            }
        }
        self.messages.clear(&mut self.host);
        self.participants_visible = false;
        info!(participants = count, "presence: session torn down");
    }

    // --- Queries ---

    #[must_use]
    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.registry.get(id)
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn messages(&self) -> &MessageBoard {
        &self.messages
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub fn participants_visible(&self) -> bool {
        self.participants_visible
    }

    #[must_use]
    pub fn config(&self) -> &PresenceConfig {
        &self.config
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
