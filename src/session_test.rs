use std::time::{Duration, Instant};

use serde_json::json;

use super::*;
use crate::local::LocalState;
use crate::participant::FadeState;
use crate::testing::{Command, MockHost, RecordingTransport};

type TestSession = Session<RecordingTransport, MockHost>;

fn session() -> TestSession {
    Session::init(PresenceConfig::default(), RecordingTransport::default(), MockHost::new())
}

fn spawn(session: &mut TestSession, id: &str, now: Instant) -> SlotIndex {
    session.on_update_at(&PropertyUpdate::new(id, "x", 10), now);
    session.on_update_at(&PropertyUpdate::new(id, "y", 20), now);
    match session.on_update_at(&PropertyUpdate::new(id, "view", 3), now) {
        Applied::Spawned(index) => index,
        other => panic!("expected spawn, got {other:?}"),
    }
}

// =============================================================
// Init
// =============================================================

#[test]
fn init_starts_transport_with_configured_endpoint() {
    let session = session();
    let started = session.transport().started.as_ref().expect("started");
    assert_eq!(started.endpoint, "/ping");
    assert!(!session.is_connected());
    assert!(!session.participants_visible());
}

#[test]
fn failed_start_leaves_a_working_session() {
    let transport = RecordingTransport { fail: true, ..RecordingTransport::default() };
    let mut session = Session::init(PresenceConfig::default(), transport, MockHost::new());
    assert!(session.transport().started.is_none());

    spawn(&mut session, "p1", Instant::now());
    session.tick();
    assert!(session.is_connected());
}

#[test]
fn disabled_session_does_nothing() {
    let config = PresenceConfig { enabled: false, ..PresenceConfig::default() };
    let mut session = Session::init(config, RecordingTransport::default(), MockHost::new());

    assert!(session.transport().started.is_none());
    assert_eq!(session.on_update(&PropertyUpdate::new("p1", "x", 10)), Applied::Dropped);
    session.tick();
    session.say("hello", true);
    assert!(session.transport().sent.is_empty());
    assert!(session.registry().is_empty());
    assert!(session.host().commands.is_empty());
}

// =============================================================
// Tick
// =============================================================

#[test]
fn tick_publishes_local_snapshot() {
    let mut session = session();
    session.host_mut().local = LocalState { room: 4, x: 30.0, y: 70.0, view: 1.0, ..LocalState::default() };

    session.tick();
    session.tick();

    let sent = &session.transport().sent;
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1);
    assert!(!sent[1].1);
    assert_eq!(sent[0].0.get("room"), Some(&json!("game:4")));
    assert!(session.is_connected());
}

#[test]
fn tick_tracks_whether_anyone_else_is_here() {
    let mut session = session();
    session.tick();
    assert!(!session.participants_visible());

    session.on_update(&PropertyUpdate::new("p1", "x", 10));
    session.tick();
    assert!(session.participants_visible());
}

#[test]
fn spawned_participant_fades_in_through_ticks() {
    let mut session = session();
    let index = spawn(&mut session, "p1", Instant::now());
    for _ in 0..25 {
        session.tick();
    }
    let p = session.participant(&"p1".into()).expect("record");
    assert_eq!(p.opacity, 100);
    assert_eq!(p.fade, FadeState::Idle);
    assert_eq!(session.host().opacities(index).last(), Some(&100));
}

// =============================================================
// Messages
// =============================================================

#[test]
fn remote_message_expires_via_timers() {
    let mut session = session();
    let t0 = Instant::now();
    let index = spawn(&mut session, "p1", t0);

    session.on_update_at(&PropertyUpdate::new("p1", "say", "hi"), t0);
    assert_eq!(session.host().shown(index), Some("hi"));
    assert_eq!(session.next_deadline(), Some(t0 + Duration::from_millis(3100)));

    assert_eq!(session.fire_due_timers_at(t0 + Duration::from_millis(3100)), 1);
    assert_eq!(session.host().shown(index), None);
}

#[test]
fn say_broadcasts_without_local_echo_when_alone() {
    let mut session = session();
    session.say_at("hello", true, Instant::now());

    let (props, full) = session.transport().sent.last().expect("sent");
    assert_eq!(props.get("say"), Some(&json!("hello")));
    assert!(!full);
    assert_eq!(session.host().shown(SlotIndex::LOCAL), None);
}

#[test]
fn say_echoes_locally_when_others_are_visible() {
    let mut session = session();
    spawn(&mut session, "p1", Instant::now());
    session.tick();

    session.say_at("hello", true, Instant::now());
    assert_eq!(session.host().shown(SlotIndex::LOCAL), Some("hello"));
}

#[test]
fn say_without_echo_stays_off_screen() {
    let mut session = session();
    spawn(&mut session, "p1", Instant::now());
    session.tick();

    session.say_at("hello", false, Instant::now());
    assert_eq!(session.host().shown(SlotIndex::LOCAL), None);
    assert_eq!(session.transport().sent.last().and_then(|(p, _)| p.get("say")), Some(&json!("hello")));
}

#[test]
fn custom_wrapper_is_used_for_balloons() {
    struct Shout;
    impl LineWrap for Shout {
        fn wrap_lines(&self, text: &str, _max_chars: usize) -> Vec<String> {
            vec![text.to_uppercase()]
        }
    }

    let mut session = session().with_wrapper(Shout);
    let index = spawn(&mut session, "p1", Instant::now());
    session.on_update(&PropertyUpdate::new("p1", "say", "hey"));
    assert_eq!(session.host().shown(index), Some("HEY"));
}

// =============================================================
// Teardown
// =============================================================

#[test]
fn teardown_erases_everything() {
    let mut session = session();
    let a = spawn(&mut session, "a", Instant::now());
    let b = spawn(&mut session, "b", Instant::now());
    session.on_update(&PropertyUpdate::new("a", "say", "bye"));

    session.teardown();

    assert!(session.registry().is_empty());
    assert!(session.host().commands.contains(&Command::Erase(a)));
    assert!(session.host().commands.contains(&Command::Erase(b)));
    assert!(session.host().mounted.is_empty());
    assert_eq!(session.next_deadline(), None);
    assert!(!session.participants_visible());
}
