//! Mock implementations for testing
//!
//! This module provides mock implementations of the surface traits for use
//! in unit and integration tests. Enable the `mock` feature to use them from
//! another crate.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config;
use crate::*;

/// One output call observed by [`MockSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum Push {
    /// `set_brightness`
    Brightness(u8),
    /// `set_key_image`
    Key(KeyId, RgbaImage),
    /// `clear_key`
    ClearKey(KeyId),
    /// `set_strip_image`
    Strip(RgbaImage),
}

/// Mock surface recording every push in call order.
pub struct MockSurface {
    info: DeviceInfo,
    log: Arc<Mutex<Vec<Push>>>,
    fail_key_pushes: Arc<Mutex<bool>>,
}

impl MockSurface {
    /// Create a mock with the standard layout (8 keys, 4 dials, 800×100 strip).
    pub fn new() -> Self {
        Self::with_strip(Some(config::strip_rect()))
    }

    /// Create a mock with a custom strip (`None` = no touch strip).
    pub fn with_strip(strip: Option<Rectangle>) -> Self {
        Self {
            info: DeviceInfo {
                model: "Mock Surface".into(),
                serial: "MOCK0001".into(),
                key_count: config::KEY_COUNT,
                dial_count: config::DIAL_COUNT,
                key_image_size: config::key_image_size(),
                strip,
            },
            log: Arc::new(Mutex::new(Vec::new())),
            fail_key_pushes: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every following `set_key_image` call fail with a transport error.
    pub fn fail_key_pushes(&self, fail: bool) {
        *lock(&self.fail_key_pushes) = fail;
    }

    /// Snapshot of everything pushed so far.
    pub fn pushes(&self) -> Vec<Push> {
        lock(&self.log).clone()
    }

    /// Drain the push log.
    pub fn take_pushes(&self) -> Vec<Push> {
        std::mem::take(&mut *lock(&self.log))
    }

    /// Every strip image pushed so far, oldest first.
    pub fn strip_frames(&self) -> Vec<RgbaImage> {
        lock(&self.log)
            .iter()
            .filter_map(|p| match p {
                Push::Strip(img) => Some(img.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, push: Push) {
        lock(&self.log).push(push);
    }
}

impl Default for MockSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceDevice for MockSurface {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn set_brightness(&self, percent: u8) -> Result<(), DeviceError> {
        self.record(Push::Brightness(percent));
        Ok(())
    }

    async fn set_key_image(&self, key: KeyId, image: &RgbaImage) -> Result<(), DeviceError> {
        if *lock(&self.fail_key_pushes) {
            return Err(DeviceError::Transport("mock key push failure".into()));
        }
        self.record(Push::Key(key, image.clone()));
        Ok(())
    }

    async fn clear_key(&self, key: KeyId) -> Result<(), DeviceError> {
        self.record(Push::ClearKey(key));
        Ok(())
    }

    async fn set_strip_image(&self, image: &RgbaImage) -> Result<(), DeviceError> {
        if self.info.strip.is_none() {
            return Err(DeviceError::Unsupported("touch strip"));
        }
        self.record(Push::Strip(image.clone()));
        Ok(())
    }
}

/// Mock event source fed from a shared queue.
///
/// Clone the handle returned by [`MockEvents::handle`] to inject events
/// while the source is owned by a listener task.
pub struct MockEvents {
    queue: Arc<Mutex<VecDeque<Result<SurfaceEvent, DeviceError>>>>,
}

/// Producer side of [`MockEvents`].
#[derive(Clone)]
pub struct MockEventHandle {
    queue: Arc<Mutex<VecDeque<Result<SurfaceEvent, DeviceError>>>>,
}

impl MockEvents {
    /// Create an empty event source.
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Producer handle sharing this source's queue.
    pub fn handle(&self) -> MockEventHandle {
        MockEventHandle {
            queue: self.queue.clone(),
        }
    }

    /// Pop the next queued item without waiting.
    pub fn poll_event(&mut self) -> Option<Result<SurfaceEvent, DeviceError>> {
        lock(&self.queue).pop_front()
    }
}

impl Default for MockEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEventHandle {
    /// Queue an input event.
    pub fn push(&self, event: SurfaceEvent) {
        lock(&self.queue).push_back(Ok(event));
    }

    /// Queue a terminal error; the listener sees it after earlier events.
    pub fn fail(&self, error: DeviceError) {
        lock(&self.queue).push_back(Err(error));
    }

    /// Number of events not yet consumed.
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }
}

impl EventSource for MockEvents {
    async fn next_event(&mut self) -> Result<SurfaceEvent, DeviceError> {
        loop {
            if let Some(item) = self.poll_event() {
                return item;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

// A poisoned mock lock only happens after a test already panicked.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
