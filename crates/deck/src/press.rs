//! Joins raw down/up edges into press/release pairs.
//!
//! Each key and dial has its own tracker:
//!
//! ```text
//! Idle ──down──▶ Held { since, route } ──up──▶ Idle   (release goes to `route`)
//! ```
//!
//! The route is fixed when the press happens, so the release always reaches
//! the handler that saw the press even if ownership or overlay state changed
//! in between.

use std::time::Duration;

use tokio::time::Instant;

/// Press state of one key or dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressState<R> {
    /// Not pressed
    Idle,
    /// Pressed at `since`; the release goes to `route`
    Held {
        /// When the press was seen
        since: Instant,
        /// Where press and release are delivered
        route: R,
    },
}

/// Press tracker for one input.
#[derive(Debug, Clone, Copy)]
pub struct PressTracker<R> {
    state: PressState<R>,
}

impl<R: Copy> PressTracker<R> {
    /// Tracker in the idle state.
    pub const fn new() -> Self {
        Self {
            state: PressState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> PressState<R> {
        self.state
    }

    /// Whether the input is held.
    pub fn is_held(&self) -> bool {
        matches!(self.state, PressState::Held { .. })
    }

    /// Record a down edge. Returns `false` (and changes nothing) if the input
    /// was already held.
    pub fn press(&mut self, route: R) -> bool {
        self.press_at(Instant::now(), route)
    }

    /// Record an up edge. Returns the press route and hold time, or `None`
    /// if there was no matching press.
    pub fn release(&mut self) -> Option<(R, Duration)> {
        self.release_at(Instant::now())
    }

    fn press_at(&mut self, now: Instant, route: R) -> bool {
        if self.is_held() {
            return false;
        }
        self.state = PressState::Held { since: now, route };
        true
    }

    fn release_at(&mut self, now: Instant) -> Option<(R, Duration)> {
        match std::mem::replace(&mut self.state, PressState::Idle) {
            PressState::Held { since, route } => Some((route, now.saturating_duration_since(since))),
            PressState::Idle => None,
        }
    }
}

impl<R: Copy> Default for PressTracker<R> {
    fn default() -> Self {
        Self::new()
    }
}
