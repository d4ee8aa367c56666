use super::*;
use crate::participant::FadeState;
use crate::testing::{Command, MockHost};

fn active(registry: &mut Registry, id: &str, x: f64, y: f64) -> ParticipantId {
    let id = ParticipantId::from(id);
    let p = registry.get_or_create(&id);
    p.x = Some(x);
    p.y = Some(y);
    p.view = Some(3.0);
    p.refresh_active();
    id
}

#[test]
fn first_slot_is_one_hundred() {
    assert_eq!(next_index(&Registry::new()), SlotIndex(100));
}

#[test]
fn spawn_issues_stage_commands_and_starts_fade_in() {
    let mut registry = Registry::new();
    let mut host = MockHost::new();
    let id = active(&mut registry, "p1", 10.0, 20.0);

    assert_eq!(spawn(&mut registry, &mut host, &id), Some(SlotIndex(100)));
    assert_eq!(
        host.commands,
        vec![
            Command::Animate(SlotIndex(100)),
            Command::Position(SlotIndex(100), 10.0, 20.0),
            Command::SetView(SlotIndex(100), 3.0),
            Command::Draw(SlotIndex(100)),
            Command::SetOpacity(SlotIndex(100), 1),
        ]
    );
    let p = registry.get(&id).expect("record kept");
    assert_eq!(p.index, Some(SlotIndex(100)));
    assert_eq!(p.fade, FadeState::FadingIn);
}

#[test]
fn spawn_refuses_unknown_or_already_spawned() {
    let mut registry = Registry::new();
    let mut host = MockHost::new();
    assert_eq!(spawn(&mut registry, &mut host, &"ghost".into()), None);

    let id = active(&mut registry, "p1", 10.0, 20.0);
    spawn(&mut registry, &mut host, &id);
    assert_eq!(spawn(&mut registry, &mut host, &id), None);
    assert_eq!(host.count(|c| matches!(c, Command::Animate(_))), 1);
}

#[test]
fn slots_increase_and_are_never_reused() {
    let mut registry = Registry::new();
    let mut messages = MessageBoard::new(18, 2.0);
    let mut host = MockHost::new();

    let a = active(&mut registry, "a", 10.0, 20.0);
    let b = active(&mut registry, "b", 30.0, 40.0);
    assert_eq!(spawn(&mut registry, &mut host, &a), Some(SlotIndex(100)));
    assert_eq!(spawn(&mut registry, &mut host, &b), Some(SlotIndex(101)));

    assert!(despawn(&mut registry, &mut messages, &mut host, &b));
    let c = active(&mut registry, "c", 50.0, 60.0);
    assert_eq!(spawn(&mut registry, &mut host, &c), Some(SlotIndex(102)));
}

#[test]
fn remove_fades_out_spawned_participants() {
    let mut registry = Registry::new();
    let mut host = MockHost::new();
    let id = active(&mut registry, "p1", 10.0, 20.0);
    spawn(&mut registry, &mut host, &id);

    assert_eq!(remove(&mut registry, &id), Removal::FadingOut);
    let p = registry.get(&id).expect("kept until fade ends");
    assert!(p.is_leaving());
    assert_eq!(p.opacity, 100);
}

#[test]
fn remove_deletes_unspawned_participants_at_once() {
    let mut registry = Registry::new();
    registry.get_or_create(&"p1".into()).x = Some(5.0);

    assert_eq!(remove(&mut registry, &"p1".into()), Removal::Deleted);
    assert!(registry.is_empty());
    assert_eq!(remove(&mut registry, &"p1".into()), Removal::Unknown);
}

#[test]
fn despawn_erases_avatar_and_message_slot() {
    let mut registry = Registry::new();
    let mut messages = MessageBoard::new(18, 2.0);
    let mut host = MockHost::new();
    let id = active(&mut registry, "p1", 10.0, 20.0);
    let index = spawn(&mut registry, &mut host, &id).expect("spawned");
    messages.enqueue(&mut host, &crate::text::GreedyWrap, index, "bye", std::time::Instant::now());

    assert!(despawn(&mut registry, &mut messages, &mut host, &id));

    assert!(host.commands.contains(&Command::Erase(index)));
    assert!(messages.slot(index).is_none());
    assert_eq!(host.shown(index), None);
    assert!(registry.get(&id).is_none());
    assert!(!despawn(&mut registry, &mut messages, &mut host, &id));
}
