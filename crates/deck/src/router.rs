//! Input routing.
//!
//! Turns raw [`SurfaceEvent`]s into module calls. An active overlay takes
//! precedence for keys and strip gestures; otherwise the routing tables
//! decide. Dials always go to their owner.

use std::sync::Arc;

use surface::config::{DIAL_COUNT, KEY_COUNT};
use surface::{DialId, KeyId, SurfaceEvent};

use crate::config::HandlerErrorPolicy;
use crate::error::CoordinatorError;
use crate::event::{DialEvent, KeyEvent, TouchStripEvent};
use crate::module::{ModuleError, ModuleHandle};
use crate::press::PressTracker;
use crate::registry::{Entry, Registry};

/// Where a key press (and its release) is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `handle_overlay_key` of the module with the active overlay
    Overlay(ModuleHandle),
    /// `handle_key` of the owner
    Owner(ModuleHandle),
}

/// Routes events for one connection. Owned by the listener task.
pub struct Router {
    registry: Arc<Registry>,
    policy: HandlerErrorPolicy,
    keys: [PressTracker<Option<Route>>; KEY_COUNT],
    dials: [PressTracker<Option<ModuleHandle>>; DIAL_COUNT],
}

impl Router {
    /// Router over a fixed registry.
    pub fn new(registry: Arc<Registry>, policy: HandlerErrorPolicy) -> Self {
        Self {
            registry,
            policy,
            keys: [PressTracker::new(); KEY_COUNT],
            dials: [PressTracker::new(); DIAL_COUNT],
        }
    }

    /// Deliver one transport event.
    ///
    /// Returns an error only when a handler failed and the policy is
    /// [`HandlerErrorPolicy::Disconnect`].
    pub fn dispatch(&mut self, event: SurfaceEvent) -> Result<(), CoordinatorError> {
        match event {
            SurfaceEvent::KeyDown(key) => self.key_down(key),
            SurfaceEvent::KeyUp(key) => self.key_up(key),
            SurfaceEvent::DialTurn { dial, ticks } => self.dial_turn(dial, ticks),
            SurfaceEvent::DialDown(dial) => self.dial_down(dial),
            SurfaceEvent::DialUp(dial) => self.dial_up(dial),
            SurfaceEvent::StripTouch { .. } | SurfaceEvent::StripSwipe { .. } => {
                match TouchStripEvent::from_surface(&event) {
                    Some(gesture) => self.strip(gesture),
                    None => Ok(()),
                }
            }
        }
    }

    fn key_route(&self, key: KeyId) -> Option<Route> {
        if let Some((entry, _)) = self.registry.active_overlay() {
            return Some(Route::Overlay(entry.handle()));
        }
        self.registry.key_owner(key).map(|e| Route::Owner(e.handle()))
    }

    fn key_down(&mut self, key: KeyId) -> Result<(), CoordinatorError> {
        let route = self.key_route(key);
        if !self.keys[key.index()].press(route) {
            tracing::debug!(%key, "key down while already held, ignored");
            return Ok(());
        }
        self.deliver_key(route, key, KeyEvent::press())
    }

    fn key_up(&mut self, key: KeyId) -> Result<(), CoordinatorError> {
        let Some((route, held)) = self.keys[key.index()].release() else {
            tracing::debug!(%key, "key up without press, ignored");
            return Ok(());
        };
        tracing::debug!(
            %key,
            held_ms = u64::try_from(held.as_millis()).unwrap_or(u64::MAX),
            "key released"
        );
        self.deliver_key(route, key, KeyEvent::release(held))
    }

    fn deliver_key(
        &self,
        route: Option<Route>,
        key: KeyId,
        event: KeyEvent,
    ) -> Result<(), CoordinatorError> {
        match route {
            None => Ok(()),
            Some(Route::Owner(handle)) => self.call(handle, |e| e.module().handle_key(key, event)),
            Some(Route::Overlay(handle)) => self.call(handle, |e| match e.module().overlay() {
                Some(overlay) => overlay.handle_overlay_key(key, event),
                None => Ok(()),
            }),
        }
    }

    /// Owner of `dial`. Overlays have no dial handler, so dials keep going to
    /// their owner while one is active.
    fn dial_route(&self, dial: DialId) -> Option<ModuleHandle> {
        self.registry.dial_owner(dial).map(Entry::handle)
    }

    fn dial_turn(&mut self, dial: DialId, delta: i8) -> Result<(), CoordinatorError> {
        match self.dial_route(dial) {
            Some(handle) => self.call(handle, |e| {
                e.module().handle_dial(dial, DialEvent::Rotate { delta })
            }),
            None => Ok(()),
        }
    }

    fn dial_down(&mut self, dial: DialId) -> Result<(), CoordinatorError> {
        let route = self.dial_route(dial);
        if !self.dials[dial.index()].press(route) {
            tracing::debug!(%dial, "dial down while already held, ignored");
            return Ok(());
        }
        match route {
            Some(handle) => self.call(handle, |e| e.module().handle_dial(dial, DialEvent::Press)),
            None => Ok(()),
        }
    }

    fn dial_up(&mut self, dial: DialId) -> Result<(), CoordinatorError> {
        let Some((route, duration)) = self.dials[dial.index()].release() else {
            tracing::debug!(%dial, "dial up without press, ignored");
            return Ok(());
        };
        match route {
            Some(handle) => self.call(handle, |e| {
                e.module().handle_dial(dial, DialEvent::Release { duration })
            }),
            None => Ok(()),
        }
    }

    fn strip(&self, gesture: TouchStripEvent) -> Result<(), CoordinatorError> {
        if let Some((entry, overlay)) = self.registry.active_overlay() {
            let result = overlay.handle_overlay_strip_touch(gesture);
            return self.settle(entry, result);
        }
        match self.registry.strip_target(gesture.anchor()) {
            Some(entry) => {
                let result = entry.module().handle_strip_touch(gesture);
                self.settle(entry, result)
            }
            None => Ok(()),
        }
    }

    fn call(
        &self,
        handle: ModuleHandle,
        f: impl FnOnce(&Entry) -> Result<(), ModuleError>,
    ) -> Result<(), CoordinatorError> {
        match self.registry.get(handle) {
            Some(entry) => self.settle(entry, f(entry)),
            None => Ok(()),
        }
    }

    /// Apply the handler error policy.
    fn settle(&self, entry: &Entry, result: Result<(), ModuleError>) -> Result<(), CoordinatorError> {
        let Err(source) = result else {
            return Ok(());
        };
        match self.policy {
            HandlerErrorPolicy::Log => {
                tracing::warn!(module = entry.id(), error = %source, "handler failed");
                Ok(())
            }
            HandlerErrorPolicy::Disconnect => Err(CoordinatorError::Handler {
                module: entry.id().to_string(),
                source,
            }),
        }
    }
}
