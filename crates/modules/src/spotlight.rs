//! Spotlight module: a time-boxed overlay over the whole surface.
//!
//! Normally it shows two keys: a trigger and the last pick. Holding the
//! trigger for [`LONG_PRESS`] opens the spotlight: all eight keys become
//! numbered choices and the strip shows a countdown. Pressing any key picks
//! that choice and closes the spotlight; a strip tap closes it without a
//! pick. Left alone, it closes itself after the configured window.
//!
//! The countdown panel is sized for the connected device's strip, handed in
//! with [`SpotlightModule::with_strip`]. Without one the overlay draws keys
//! only.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use deck::{Frame, KeyEvent, KeyImages, Module, ModuleError, Overlay, Resources, TouchStripEvent};
use embedded_graphics::pixelcolor::Rgb888;
use surface::{KeyId, Size};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::draw;

/// Hold time that opens the spotlight.
pub const LONG_PRESS: Duration = Duration::from_millis(600);
/// Default time the spotlight stays open.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);

const ACCENT: Rgb888 = Rgb888::new(0xc0, 0x4c, 0xfd);

/// Eight choice colours, one per key.
const CHOICE_COLORS: [Rgb888; 8] = [
    Rgb888::new(0xe6, 0x39, 0x46),
    Rgb888::new(0xf4, 0xa2, 0x61),
    Rgb888::new(0xe9, 0xc4, 0x6a),
    Rgb888::new(0x2a, 0x9d, 0x8f),
    Rgb888::new(0x45, 0x7b, 0x9d),
    Rgb888::new(0x1d, 0x35, 0x57),
    Rgb888::new(0x8d, 0x99, 0xae),
    Rgb888::new(0xc0, 0x4c, 0xfd),
];

#[derive(Default)]
struct State {
    grant: Option<Resources>,
    /// Spotlight is open until this instant
    until: Option<Instant>,
    /// Last choice picked, 1-based
    picked: Option<usize>,
    keys: KeyImages,
}

impl State {
    fn is_open(&self, now: Instant) -> bool {
        self.until.is_some_and(|until| now < until)
    }

    fn rerender(&mut self) {
        let Some(grant) = &self.grant else {
            return;
        };
        self.keys.clear();
        let picked = self.picked.map_or_else(|| "-".to_string(), |n| n.to_string());
        let tiles = [("HOLD", "SPOT".to_string()), ("PICK", picked)];
        for (key, (label, value)) in grant.keys.iter().zip(tiles) {
            self.keys.insert(*key, draw::key_tile(label, &value, ACCENT));
        }
    }
}

/// Overlay-capable module.
pub struct SpotlightModule {
    window: Duration,
    /// Full strip size of the device, `None` when it has no strip
    strip: Option<Size>,
    state: Mutex<State>,
    choices: KeyImages,
}

impl SpotlightModule {
    /// Module id.
    pub const ID: &'static str = "spotlight";

    /// Spotlight with the default window.
    pub fn new() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }

    /// Spotlight that stays open for `window`.
    pub fn with_window(window: Duration) -> Self {
        let choices = KeyId::ALL
            .into_iter()
            .zip(CHOICE_COLORS)
            .map(|(key, color)| {
                let n = (key.index() + 1).to_string();
                (key, draw::key_tile("CHOICE", &n, color))
            })
            .collect();
        Self {
            window,
            strip: None,
            state: Mutex::new(State::default()),
            choices,
        }
    }

    /// Draw the countdown panel at `strip`, the device's full strip size.
    #[must_use]
    pub fn with_strip(mut self, strip: Option<Size>) -> Self {
        self.strip = strip;
        self
    }

    /// Last choice picked, 1-based.
    pub fn picked(&self) -> Option<usize> {
        self.lock().picked
    }

    /// Open the spotlight now.
    pub fn open(&self) {
        self.lock().until = Some(Instant::now() + self.window);
        let window_ms = u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX);
        tracing::debug!(module = Self::ID, window_ms, "spotlight opened");
    }

    fn close(&self, state: &mut State) {
        state.until = None;
        state.rerender();
        tracing::debug!(module = Self::ID, picked = state.picked, "spotlight closed");
    }

    fn remaining(&self) -> Duration {
        self.lock()
            .until
            .map_or(Duration::ZERO, |until| until.saturating_duration_since(Instant::now()))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SpotlightModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for SpotlightModule {
    fn id(&self) -> &str {
        Self::ID
    }

    fn init(&self, _cancel: CancellationToken, resources: &Resources) -> Result<(), ModuleError> {
        if resources.keys.is_empty() {
            return Err(ModuleError::NotConfigured(
                "spotlight needs a trigger key".to_string(),
            ));
        }
        let mut state = self.lock();
        state.grant = Some(resources.clone());
        state.until = None;
        state.rerender();
        Ok(())
    }

    fn stop(&self) -> Result<(), ModuleError> {
        let mut state = self.lock();
        state.until = None;
        state.keys.clear();
        Ok(())
    }

    fn render_keys(&self) -> KeyImages {
        self.lock().keys.clone()
    }

    fn handle_key(&self, key: KeyId, event: KeyEvent) -> Result<(), ModuleError> {
        let trigger = self
            .lock()
            .grant
            .as_ref()
            .and_then(|g| g.keys.first().copied());
        if Some(key) == trigger && !event.pressed && event.duration >= Some(LONG_PRESS) {
            self.open();
        }
        Ok(())
    }

    fn overlay(&self) -> Option<&dyn Overlay> {
        Some(self)
    }
}

impl Overlay for SpotlightModule {
    fn is_overlay_active(&self) -> bool {
        self.lock().is_open(Instant::now())
    }

    fn render_overlay_keys(&self) -> KeyImages {
        self.choices.clone()
    }

    fn render_overlay_strip(&self) -> Option<Frame> {
        let size = self.strip?;
        let remaining = self.remaining();
        #[allow(clippy::cast_possible_truncation)]
        let fill = (remaining.as_secs_f64() / self.window.as_secs_f64().max(f64::EPSILON)) as f32;
        Some(draw::strip_panel(
            size,
            "SPOTLIGHT - press a key to pick, tap to close",
            &format!("closes in {}s", remaining.as_secs() + 1),
            fill,
            ACCENT,
        ))
    }

    fn handle_overlay_key(&self, key: KeyId, event: KeyEvent) -> Result<(), ModuleError> {
        if !event.pressed {
            return Ok(());
        }
        let mut state = self.lock();
        if state.is_open(Instant::now()) {
            state.picked = Some(key.index() + 1);
            self.close(&mut state);
        }
        Ok(())
    }

    fn handle_overlay_strip_touch(&self, event: TouchStripEvent) -> Result<(), ModuleError> {
        if let TouchStripEvent::Tap(_) = event {
            let mut state = self.lock();
            self.close(&mut state);
        }
        Ok(())
    }
}
