//! Clock module: wall-clock time on a strip area.
//!
//! A background task redraws the panel once per second until the
//! connection's cancellation token fires or the module is stopped. A tap
//! toggles seconds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};
use deck::{Frame, KeyEvent, KeyImages, Module, ModuleError, Resources, TouchStripEvent};
use embedded_graphics::pixelcolor::Rgb888;
use surface::{KeyId, Size};
use tokio_util::sync::CancellationToken;

use crate::draw;

/// Redraw period.
pub const REFRESH: Duration = Duration::from_secs(1);

const ACCENT: Rgb888 = Rgb888::new(0xff, 0xa6, 0x2b);

/// Where the time comes from.
pub type TimeSource = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

struct Shared {
    source: TimeSource,
    show_seconds: AtomicBool,
    size: Mutex<Option<Size>>,
    frame: Mutex<Option<Frame>>,
}

impl Shared {
    fn redraw(&self) {
        let Some(size) = *lock(&self.size) else {
            return;
        };
        let now = (self.source)();
        let time = if self.show_seconds.load(Ordering::Relaxed) {
            now.format("%H:%M:%S").to_string()
        } else {
            now.format("%H:%M").to_string()
        };
        let date = now.format("%a %d %b").to_string();
        let day_fraction = f64::from(now.num_seconds_from_midnight()) / 86_400.0;
        #[allow(clippy::cast_possible_truncation)]
        let frame = draw::strip_panel(size, &date, &time, day_fraction as f32, ACCENT);
        *lock(&self.frame) = Some(frame);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Strip clock.
pub struct ClockModule {
    shared: Arc<Shared>,
    task: Mutex<Option<CancellationToken>>,
}

impl ClockModule {
    /// Module id.
    pub const ID: &'static str = "clock";

    /// Clock showing local time.
    pub fn new() -> Self {
        Self::with_source(Arc::new(|| Local::now().naive_local()))
    }

    /// Clock reading time from `source`.
    pub fn with_source(source: TimeSource) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                show_seconds: AtomicBool::new(true),
                size: Mutex::new(None),
                frame: Mutex::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// Whether seconds are shown.
    pub fn shows_seconds(&self) -> bool {
        self.shared.show_seconds.load(Ordering::Relaxed)
    }
}

impl Default for ClockModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for ClockModule {
    fn id(&self) -> &str {
        Self::ID
    }

    fn init(&self, cancel: CancellationToken, resources: &Resources) -> Result<(), ModuleError> {
        if !resources.has_strip() {
            return Err(ModuleError::NotConfigured(
                "clock needs a strip area".to_string(),
            ));
        }
        *lock(&self.shared.size) = Some(resources.strip.size);
        self.shared.redraw();

        let token = cancel.child_token();
        let shared = Arc::clone(&self.shared);
        let stop = token.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REFRESH);
            loop {
                tokio::select! {
                    () = stop.cancelled() => break,
                    _ = ticker.tick() => shared.redraw(),
                }
            }
            tracing::debug!(module = ClockModule::ID, "refresh task stopped");
        });
        if let Some(previous) = lock(&self.task).replace(token) {
            previous.cancel();
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), ModuleError> {
        if let Some(token) = lock(&self.task).take() {
            token.cancel();
        }
        Ok(())
    }

    fn render_keys(&self) -> KeyImages {
        KeyImages::new()
    }

    fn render_strip(&self) -> Option<Frame> {
        lock(&self.shared.frame).clone()
    }

    fn handle_key(&self, _key: KeyId, _event: KeyEvent) -> Result<(), ModuleError> {
        Ok(())
    }

    fn handle_strip_touch(&self, event: TouchStripEvent) -> Result<(), ModuleError> {
        if let TouchStripEvent::Tap(_) = event {
            self.shared.show_seconds.fetch_xor(true, Ordering::Relaxed);
            self.shared.redraw();
        }
        Ok(())
    }
}
