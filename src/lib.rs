//! Client-side presence synchronization for a shared virtual room.
//!
//! Remote participants arrive as a stream of unordered, per-property updates.
//! This crate folds them into coherent participant records, spawns and
//! retires their on-screen avatars with opacity fades, keeps stuck avatars in
//! sync, shows their chat messages as timed balloons, and publishes the local
//! participant's own state once per frame.
//!
//! The host supplies the transport, the render stage, the message overlay,
//! and the local avatar through the traits in [`transport`], [`render`] and
//! [`local`]. Everything else is owned by one [`session::Session`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | Coordinator and public entry points |
//! | [`reducer`] | Folds one property update into the registry |
//! | [`lifecycle`] | Spawn with fade-in, fade-out then remove, index assignment |
//! | [`tick`] | Per-frame driver: snapshot publish and fade state machine |
//! | [`message`] | Per-slot chat balloon queue and display timers |
//! | [`participant`] | Participant records, fade states, registry |
//! | [`property`] | Property table and value coercion |
//! | [`timer`] | Cancellable deadline queue |
//! | [`transport`] | Transport trait, persistence filter, channel transport |
//! | [`render`] | Stage and overlay command traits |
//! | [`local`] | Local avatar accessor |
//! | [`text`] | Line wrapping |
//! | [`config`] | Environment-driven configuration |
//! | [`headless`] | In-memory host used by the demo binary |

pub mod config;
pub mod headless;
pub mod lifecycle;
pub mod local;
pub mod message;
pub mod participant;
pub mod property;
pub mod reducer;
pub mod render;
pub mod session;
pub mod text;
pub mod tick;
pub mod timer;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, PresenceConfig};
pub use participant::{ParticipantId, SlotIndex};
pub use property::PropertyUpdate;
pub use session::Session;
