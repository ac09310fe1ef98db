//! Counter module: two keys, two dials and a strip area.
//!
//! | Input            | Effect                          |
//! |------------------|---------------------------------|
//! | first key        | subtract one step               |
//! | first key, held  | reset to zero                   |
//! | second key       | add one step                    |
//! | first dial       | add `delta × step`              |
//! | second dial      | change step size (1..=100)      |
//! | dial press       | reset to zero                   |
//! | strip tap        | add one step                    |
//! | strip swipe      | add one step per 40 px travelled|
//!
//! Frames are re-rendered when state changes and handed out from a cache.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use deck::{
    DialEvent, Frame, KeyEvent, KeyImages, Module, ModuleError, Resources, TouchStripEvent,
};
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use surface::{DialId, KeyId, Size};
use tokio_util::sync::CancellationToken;

use crate::draw;

/// Holding the first key at least this long resets the counter.
pub const RESET_HOLD: Duration = Duration::from_millis(800);
/// Bounds of the step size.
pub const STEP_RANGE: std::ops::RangeInclusive<i64> = 1..=100;
/// Swipe distance worth one step, in pixels.
const SWIPE_STEP_PX: i32 = 40;

const ACCENT: Rgb888 = Rgb888::new(0x3a, 0x86, 0xff);

#[derive(Default)]
struct Inner {
    grant: Option<Resources>,
    value: i64,
    step: i64,
    keys: KeyImages,
    strip: Option<Frame>,
}

impl Inner {
    fn rerender(&mut self) {
        let Some(grant) = &self.grant else {
            return;
        };
        self.keys.clear();
        let labels = [("DOWN", format!("-{}", self.step)), ("UP", format!("+{}", self.step))];
        for (key, (label, value)) in grant.keys.iter().zip(labels) {
            self.keys.insert(*key, draw::key_tile(label, &value, ACCENT));
        }
        self.strip = grant.has_strip().then(|| {
            let size = Size::new(grant.strip.size.width, grant.strip.size.height);
            let fill = (self.value.rem_euclid(100)) as f32 / 100.0;
            draw::strip_panel(
                size,
                "COUNTER",
                &format!("{}   step {}", self.value, self.step),
                fill,
                if self.value < 0 { Rgb888::RED } else { ACCENT },
            )
        });
    }
}

/// Counter driven by keys, dials and the strip.
pub struct CounterModule {
    inner: Mutex<Inner>,
}

impl CounterModule {
    /// Module id.
    pub const ID: &'static str = "counter";

    /// Counter starting at zero with step one.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                step: 1,
                ..Inner::default()
            }),
        }
    }

    /// Current value.
    pub fn value(&self) -> i64 {
        self.lock().value
    }

    /// Current step size.
    pub fn step(&self) -> i64 {
        self.lock().step
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a change and refresh the cached frames.
    fn update(&self, f: impl FnOnce(&mut Inner)) {
        let mut inner = self.lock();
        f(&mut inner);
        inner.rerender();
        tracing::debug!(module = Self::ID, value = inner.value, step = inner.step, "counter changed");
    }

    /// Position of `key` within the grant.
    fn key_slot(&self, key: KeyId) -> Option<usize> {
        self.lock().grant.as_ref()?.keys.iter().position(|k| *k == key)
    }

    fn dial_slot(&self, dial: DialId) -> Option<usize> {
        self.lock().grant.as_ref()?.dials.iter().position(|d| *d == dial)
    }
}

impl Default for CounterModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for CounterModule {
    fn id(&self) -> &str {
        Self::ID
    }

    fn init(&self, _cancel: CancellationToken, resources: &Resources) -> Result<(), ModuleError> {
        if resources.keys.is_empty() && resources.dials.is_empty() && !resources.has_strip() {
            return Err(ModuleError::NotConfigured(
                "counter needs at least one key, dial or strip area".to_string(),
            ));
        }
        let mut inner = self.lock();
        inner.grant = Some(resources.clone());
        inner.rerender();
        Ok(())
    }

    fn stop(&self) -> Result<(), ModuleError> {
        let mut inner = self.lock();
        inner.keys.clear();
        inner.strip = None;
        Ok(())
    }

    fn render_keys(&self) -> KeyImages {
        self.lock().keys.clone()
    }

    fn render_strip(&self) -> Option<Frame> {
        self.lock().strip.clone()
    }

    fn handle_key(&self, key: KeyId, event: KeyEvent) -> Result<(), ModuleError> {
        // Act on release so a long hold can mean something else.
        let Some(held) = event.duration.filter(|_| !event.pressed) else {
            return Ok(());
        };
        match self.key_slot(key) {
            Some(0) if held >= RESET_HOLD => self.update(|s| s.value = 0),
            Some(0) => self.update(|s| s.value -= s.step),
            Some(1) => self.update(|s| s.value += s.step),
            _ => {}
        }
        Ok(())
    }

    fn handle_dial(&self, dial: DialId, event: DialEvent) -> Result<(), ModuleError> {
        match (self.dial_slot(dial), event) {
            (Some(0), DialEvent::Rotate { delta }) => {
                self.update(|s| s.value += i64::from(delta) * s.step);
            }
            (Some(1), DialEvent::Rotate { delta }) => self.update(|s| {
                s.step = (s.step + i64::from(delta)).clamp(*STEP_RANGE.start(), *STEP_RANGE.end());
            }),
            (Some(_), DialEvent::Press) => self.update(|s| s.value = 0),
            _ => {}
        }
        Ok(())
    }

    fn handle_strip_touch(&self, event: TouchStripEvent) -> Result<(), ModuleError> {
        match event {
            TouchStripEvent::Tap(_) => self.update(|s| s.value += s.step),
            TouchStripEvent::Swipe { from, to } => {
                let steps = i64::from((to.x - from.x) / SWIPE_STEP_PX);
                if steps != 0 {
                    self.update(|s| s.value += steps * s.step);
                }
            }
            TouchStripEvent::LongTap(_) => {}
        }
        Ok(())
    }
}
