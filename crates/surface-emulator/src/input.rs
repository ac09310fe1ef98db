//! Scripted input for the emulator.
//!
//! - [`InputQueue`] - producer, used by tests and the daemon's demo script
//!   to press keys, turn dials and touch the strip.
//! - [`EmulatorInput`] - consumer, returned by
//!   [`Emulator::connect()`](crate::Emulator::connect). Implements
//!   [`surface::EventSource`] so the coordinator cannot tell it from a real
//!   transport.
//!
//! Each connection gets its own queue; unplugging the emulator appends a
//! terminal [`DeviceError::Disconnected`] behind any events still queued.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use surface::{DeviceError, DialId, EventSource, KeyId, Point, SurfaceEvent, TouchKind};

/// Maximum number of unread events buffered in the queue.
///
/// Newest events are silently dropped when the queue is full.
pub const QUEUE_CAP: usize = 64;

type Queue = Arc<Mutex<VecDeque<Result<SurfaceEvent, DeviceError>>>>;

// ---------------------------------------------------------------------------
// InputQueue - producer
// ---------------------------------------------------------------------------

/// Producer half of the emulated input pipe.
#[derive(Clone)]
pub struct InputQueue {
    queue: Queue,
}

impl InputQueue {
    /// Create a linked (producer, consumer) pair.
    pub fn new() -> (Self, EmulatorInput) {
        let q: Queue = Arc::new(Mutex::new(VecDeque::new()));
        (InputQueue { queue: q.clone() }, EmulatorInput { queue: q })
    }

    /// Enqueue an event. Silently drops the event if the queue is full.
    pub fn push(&self, event: SurfaceEvent) {
        let mut q = lock(&self.queue);
        if q.len() < QUEUE_CAP {
            q.push_back(Ok(event));
        } else {
            tracing::debug!(queued = q.len(), "emulator input queue full, event dropped");
        }
    }

    /// Key goes down.
    pub fn press_key(&self, key: KeyId) {
        self.push(SurfaceEvent::KeyDown(key));
    }

    /// Key comes up.
    pub fn release_key(&self, key: KeyId) {
        self.push(SurfaceEvent::KeyUp(key));
    }

    /// Turn a dial by `ticks` detents (positive = clockwise).
    pub fn turn_dial(&self, dial: DialId, ticks: i8) {
        self.push(SurfaceEvent::DialTurn { dial, ticks });
    }

    /// Dial pushed in.
    pub fn press_dial(&self, dial: DialId) {
        self.push(SurfaceEvent::DialDown(dial));
    }

    /// Dial released.
    pub fn release_dial(&self, dial: DialId) {
        self.push(SurfaceEvent::DialUp(dial));
    }

    /// Short tap on the strip.
    pub fn tap_strip(&self, point: Point) {
        self.push(SurfaceEvent::StripTouch {
            kind: TouchKind::Short,
            point,
        });
    }

    /// Long tap on the strip.
    pub fn long_tap_strip(&self, point: Point) {
        self.push(SurfaceEvent::StripTouch {
            kind: TouchKind::Long,
            point,
        });
    }

    /// Swipe across the strip.
    pub fn swipe_strip(&self, from: Point, to: Point) {
        self.push(SurfaceEvent::StripSwipe { from, to });
    }

    /// Terminate the connection after already-queued events.
    ///
    /// Bypasses the capacity limit so a disconnect is never lost.
    pub(crate) fn disconnect(&self) {
        lock(&self.queue).push_back(Err(DeviceError::Disconnected));
    }

    /// Number of items not yet consumed by the listener.
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }
}

// ---------------------------------------------------------------------------
// EmulatorInput - consumer
// ---------------------------------------------------------------------------

/// Consumer half of the emulated input pipe.
pub struct EmulatorInput {
    queue: Queue,
}

impl EmulatorInput {
    /// Pop the next item without waiting.
    pub fn poll_event(&mut self) -> Option<Result<SurfaceEvent, DeviceError>> {
        lock(&self.queue).pop_front()
    }
}

impl EventSource for EmulatorInput {
    /// Async wait: polls the queue every 5 ms until an event is available.
    async fn next_event(&mut self) -> Result<SurfaceEvent, DeviceError> {
        loop {
            if let Some(item) = self.poll_event() {
                return item;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
