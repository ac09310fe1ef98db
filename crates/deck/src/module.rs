//! Module and Overlay contracts.
//!
//! A [`Module`] owns a [`Resources`] grant and is driven by the coordinator:
//! initialised once per connection, polled for images on every render tick,
//! and handed the input events routed to it. Every method takes `&self`; a
//! module guards its own mutable state because the render task and the
//! listener task call into it concurrently.
//!
//! A module that can take over the whole surface exposes an [`Overlay`]
//! through [`Module::overlay()`]. The coordinator polls
//! [`Overlay::is_overlay_active()`] and, while it reports `true`, sends every
//! key image, strip image and key/strip event to that module instead of the
//! nominal owners.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use image::RgbaImage;
use surface::{DialId, KeyId};
use tokio_util::sync::CancellationToken;

use crate::event::{DialEvent, KeyEvent, TouchStripEvent};
use crate::resources::Resources;

/// Pre-rendered image, cheap to hand out on every tick.
pub type Frame = Arc<RgbaImage>;

/// Images for keys; a missing key means "leave unchanged this tick".
pub type KeyImages = BTreeMap<KeyId, Frame>;

/// Errors reported by modules.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// Required settings or credentials are missing
    #[error("module is not configured: {0}")]
    NotConfigured(String),
    /// An upstream service or tool could not be reached
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    /// A command issued on behalf of the user failed
    #[error("command failed: {0}")]
    Command(String),
    /// Local I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Anything else
    #[error("{0}")]
    Other(String),
}

/// Index assigned at registration, stable for the coordinator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleHandle(pub(crate) usize);

impl ModuleHandle {
    /// Registration index (0 = first registered).
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A feature unit driven by the coordinator.
pub trait Module: Send + Sync {
    /// Stable, non-empty identifier, unique among registered modules.
    fn id(&self) -> &str;

    /// Called once per connection, after the grant is fixed.
    ///
    /// Background work started here must stop when `cancel` fires. An error
    /// excludes the module from rendering and routing for this connection.
    fn init(&self, cancel: CancellationToken, resources: &Resources) -> Result<(), ModuleError>;

    /// Release what `init` started. Must not block indefinitely.
    fn stop(&self) -> Result<(), ModuleError>;

    /// Images for the module's own keys. Must be fast.
    fn render_keys(&self) -> KeyImages;

    /// Image sized to the module's strip rectangle, in module-local
    /// coordinates. `None` leaves the area to whatever is underneath.
    fn render_strip(&self) -> Option<Frame> {
        None
    }

    /// React to a press or release on one of the module's keys.
    fn handle_key(&self, key: KeyId, event: KeyEvent) -> Result<(), ModuleError>;

    /// React to a dial the module owns.
    fn handle_dial(&self, _dial: DialId, _event: DialEvent) -> Result<(), ModuleError> {
        Ok(())
    }

    /// React to a gesture on the module's strip area.
    fn handle_strip_touch(&self, _event: TouchStripEvent) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Whole-surface takeover capability, if the module has one.
    fn overlay(&self) -> Option<&dyn Overlay> {
        None
    }
}

/// Modal, self-expiring takeover of all keys and the full strip.
pub trait Overlay: Send + Sync {
    /// Polled on every render tick and every routed event.
    fn is_overlay_active(&self) -> bool;

    /// Images covering any of the eight keys.
    fn render_overlay_keys(&self) -> KeyImages;

    /// Full-strip image, pushed without compositing.
    fn render_overlay_strip(&self) -> Option<Frame>;

    /// Receives presses and releases on every key while active.
    fn handle_overlay_key(&self, key: KeyId, event: KeyEvent) -> Result<(), ModuleError>;

    /// Receives every strip gesture while active.
    fn handle_overlay_strip_touch(&self, event: TouchStripEvent) -> Result<(), ModuleError>;
}
