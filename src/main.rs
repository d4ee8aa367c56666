//! Headless presence demo.
//!
//! Drives a [`Session`] against an in-memory host with a handful of simulated
//! remote participants that wander, chat, get stuck, leave and come back.
//! Outbound snapshots are logged at debug level.

use std::process::ExitCode;

use presence_sync::config::DemoConfig;
use presence_sync::headless::HeadlessHost;
use presence_sync::local::LocalState;
use presence_sync::transport::ChannelTransport;
use presence_sync::{ParticipantId, PresenceConfig, PropertyUpdate, Session};
use rand::Rng;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const ROOM: u32 = 1;
const MIN_X: f64 = 10.0;
const MAX_X: f64 = 150.0;
const MIN_Y: f64 = 40.0;
const MAX_Y: f64 = 160.0;
const STEP: f64 = 12.0;

// Per-frame odds.
const WANDER_CHANCE: f64 = 0.02;
const CHAT_CHANCE: f64 = 0.004;
const LEAVE_CHANCE: f64 = 0.001;
const REJOIN_CHANCE: f64 = 0.01;
const BLOCK_CHANCE: f64 = 0.002;
const LOCAL_CHAT_CHANCE: f64 = 0.002;

const LINES: &[&str] = &[
    "hello",
    "anyone seen the key?",
    "this castle is huge",
    "watch out for the moat",
    "brb",
    "which way to the well",
];

struct Bot {
    id: ParticipantId,
    x: f64,
    y: f64,
    view: u32,
    online: bool,
}

impl Bot {
    fn new(rng: &mut impl Rng) -> Self {
        Self {
            id: ParticipantId(uuid::Uuid::new_v4().to_string()),
            x: rng.random_range(MIN_X..MAX_X).round(),
            y: rng.random_range(MIN_Y..MAX_Y).round(),
            view: rng.random_range(0..4),
            online: true,
        }
    }

    fn update(&self, name: &str, value: impl Into<Value>) -> PropertyUpdate {
        PropertyUpdate::new(self.id.clone(), name, value)
    }

    fn snapshot(&self) -> Vec<PropertyUpdate> {
        vec![
            self.update("room", format!("demo:{ROOM}")),
            self.update("x", self.x),
            self.update("y", self.y),
            self.update("view", self.view),
        ]
    }

    fn act(&mut self, rng: &mut impl Rng) -> Vec<PropertyUpdate> {
        if !self.online {
            if rng.random_bool(REJOIN_CHANCE) {
                self.online = true;
                return self.snapshot();
            }
            return Vec::new();
        }
        if rng.random_bool(LEAVE_CHANCE) {
            self.online = false;
            return vec![self.update("disconnect", Value::Null)];
        }

        let mut out = Vec::new();
        if rng.random_bool(WANDER_CHANCE) {
            self.x = (self.x + rng.random_range(-STEP..=STEP)).round().clamp(MIN_X, MAX_X);
            self.y = (self.y + rng.random_range(-STEP..=STEP)).round().clamp(MIN_Y, MAX_Y);
            out.push(self.update("x", self.x));
            out.push(self.update("y", self.y));
        }
        if rng.random_bool(CHAT_CHANCE) {
            out.push(self.update("say", LINES[rng.random_range(0..LINES.len())]));
        }
        out
    }
}

async fn sleep_until_deadline(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match PresenceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid presence configuration");
            return ExitCode::FAILURE;
        }
    };
    let demo = DemoConfig::from_env();
    let frame_interval = config.frame_interval;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let local = LocalState { room: ROOM, x: 80.0, y: 120.0, view: 0.0, ..LocalState::default() };
    let mut session = Session::init(config, ChannelTransport::new(tx), HeadlessHost::new(local));

    let mut rng = rand::rng();
    let mut bots: Vec<Bot> = (0..demo.participants).map(|_| Bot::new(&mut rng)).collect();
    for bot in &bots {
        for update in bot.snapshot() {
            session.on_update(&update);
        }
    }
    info!(frames = demo.frames, participants = bots.len(), "demo: running");

    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frame: u64 = 0;

    while frame < demo.frames {
        let deadline = session.next_deadline();
        tokio::select! {
            _ = frames.tick() => {
                frame += 1;
                for bot in &mut bots {
                    for update in bot.act(&mut rng) {
                        session.on_update(&update);
                    }
                }
                if !bots.is_empty() && rng.random_bool(BLOCK_CHANCE) {
                    let pick = &bots[rng.random_range(0..bots.len())];
                    if let Some(index) = session.participant(&pick.id).and_then(|p| p.index) {
                        debug!(%index, "demo: blocking avatar");
                        session.host_mut().block(index);
                    }
                }
                if rng.random_bool(LOCAL_CHAT_CHANCE) {
                    session.say(LINES[rng.random_range(0..LINES.len())], true);
                }
                session.host_mut().step();
                session.tick();
            }
            () = sleep_until_deadline(deadline) => {
                session.fire_due_timers();
            }
            Some(props) = rx.recv() => {
                debug!(props = %serde_json::Value::Object(props), "demo: outbound");
            }
        }
    }

    let on_stage = session.registry().iter().filter(|p| p.index.is_some()).count();
    info!(frames = frame, on_stage, "demo: finished");
    session.teardown();
    ExitCode::SUCCESS
}
