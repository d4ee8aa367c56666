//! Local avatar accessor.

/// The local participant's current state, read once per tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalState {
    /// Current room number.
    pub room: u32,
    pub x: f64,
    pub y: f64,
    pub view: f64,
    pub loop_: f64,
    pub cel: f64,
    /// Movement direction; zero when standing still.
    pub direction: u8,
}

impl LocalState {
    #[must_use]
    pub fn is_stationary(&self) -> bool {
        self.direction == 0
    }
}

/// Read access to the local avatar.
pub trait LocalAvatar {
    fn local_state(&self) -> LocalState;
}
