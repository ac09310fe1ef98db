//! Recording module shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use deck::{
    DialEvent, Frame, KeyEvent, KeyImages, Module, ModuleError, Overlay, Resources,
    TouchStripEvent,
};
use image::{Rgba, RgbaImage};
use surface::{DialId, KeyId};
use tokio_util::sync::CancellationToken;

pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Every contract call a module observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init,
    Stop,
    RenderKeys,
    RenderStrip,
    Key(KeyId, KeyEvent),
    Dial(DialId, DialEvent),
    Strip(TouchStripEvent),
    OverlayKey(KeyId, KeyEvent),
    OverlayStrip(TouchStripEvent),
}

impl Call {
    /// Whether the call is a render or handler call (not lifecycle).
    pub fn is_activity(&self) -> bool {
        !matches!(self, Call::Init | Call::Stop)
    }
}

pub fn solid(width: u32, height: u32, color: Rgba<u8>) -> Frame {
    Arc::new(RgbaImage::from_pixel(width, height, color))
}

pub fn key_frame(color: Rgba<u8>) -> Frame {
    solid(120, 120, color)
}

/// Module that records every call and renders whatever it was told to.
pub struct Recorder {
    id: &'static str,
    calls: Mutex<Vec<Call>>,
    fail_init: bool,
    fail_stop: bool,
    fail_handlers: AtomicBool,
    keys: Mutex<KeyImages>,
    strip: Mutex<Option<Frame>>,
    overlay_capable: bool,
    overlay_active: AtomicBool,
    overlay_keys: Mutex<KeyImages>,
    overlay_strip: Mutex<Option<Frame>>,
    cancel: Mutex<Option<CancellationToken>>,
}

impl Recorder {
    pub fn new(id: &'static str) -> Self {
        Self {
            id,
            calls: Mutex::new(Vec::new()),
            fail_init: false,
            fail_stop: false,
            fail_handlers: AtomicBool::new(false),
            keys: Mutex::new(KeyImages::new()),
            strip: Mutex::new(None),
            overlay_capable: false,
            overlay_active: AtomicBool::new(false),
            overlay_keys: Mutex::new(KeyImages::new()),
            overlay_strip: Mutex::new(None),
            cancel: Mutex::new(None),
        }
    }

    pub fn with_overlay(mut self) -> Self {
        self.overlay_capable = true;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn fail_handlers(&self, fail: bool) {
        self.fail_handlers.store(fail, Ordering::SeqCst);
    }

    pub fn show_key(&self, key: KeyId, frame: Frame) {
        self.keys.lock().unwrap().insert(key, frame);
    }

    pub fn show_strip(&self, frame: Frame) {
        *self.strip.lock().unwrap() = Some(frame);
    }

    pub fn show_overlay_key(&self, key: KeyId, frame: Frame) {
        self.overlay_keys.lock().unwrap().insert(key, frame);
    }

    pub fn show_overlay_strip(&self, frame: Frame) {
        *self.overlay_strip.lock().unwrap() = Some(frame);
    }

    pub fn set_overlay_active(&self, active: bool) {
        self.overlay_active.store(active, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Handler calls only (render and lifecycle filtered out).
    pub fn events(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Init | Call::Stop | Call::RenderKeys | Call::RenderStrip))
            .collect()
    }

    /// Cancellation token received in `init`.
    pub fn init_token(&self) -> Option<CancellationToken> {
        self.cancel.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn handled(&self) -> Result<(), ModuleError> {
        if self.fail_handlers.load(Ordering::SeqCst) {
            Err(ModuleError::Command(format!("{} refused", self.id)))
        } else {
            Ok(())
        }
    }
}

impl Module for Recorder {
    fn id(&self) -> &str {
        self.id
    }

    fn init(&self, cancel: CancellationToken, _resources: &Resources) -> Result<(), ModuleError> {
        self.record(Call::Init);
        *self.cancel.lock().unwrap() = Some(cancel);
        if self.fail_init {
            return Err(ModuleError::NotConfigured(format!("{} has no credentials", self.id)));
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), ModuleError> {
        self.record(Call::Stop);
        if self.fail_stop {
            return Err(ModuleError::Other(format!("{} stuck", self.id)));
        }
        Ok(())
    }

    fn render_keys(&self) -> KeyImages {
        self.record(Call::RenderKeys);
        self.keys.lock().unwrap().clone()
    }

    fn render_strip(&self) -> Option<Frame> {
        self.record(Call::RenderStrip);
        self.strip.lock().unwrap().clone()
    }

    fn handle_key(&self, key: KeyId, event: KeyEvent) -> Result<(), ModuleError> {
        self.record(Call::Key(key, event));
        self.handled()
    }

    fn handle_dial(&self, dial: DialId, event: DialEvent) -> Result<(), ModuleError> {
        self.record(Call::Dial(dial, event));
        self.handled()
    }

    fn handle_strip_touch(&self, event: TouchStripEvent) -> Result<(), ModuleError> {
        self.record(Call::Strip(event));
        self.handled()
    }

    fn overlay(&self) -> Option<&dyn Overlay> {
        if self.overlay_capable {
            Some(self)
        } else {
            None
        }
    }
}

impl Overlay for Recorder {
    fn is_overlay_active(&self) -> bool {
        self.overlay_active.load(Ordering::SeqCst)
    }

    fn render_overlay_keys(&self) -> KeyImages {
        self.overlay_keys.lock().unwrap().clone()
    }

    fn render_overlay_strip(&self) -> Option<Frame> {
        self.overlay_strip.lock().unwrap().clone()
    }

    fn handle_overlay_key(&self, key: KeyId, event: KeyEvent) -> Result<(), ModuleError> {
        self.record(Call::OverlayKey(key, event));
        self.handled()
    }

    fn handle_overlay_strip_touch(&self, event: TouchStripEvent) -> Result<(), ModuleError> {
        self.record(Call::OverlayStrip(event));
        self.handled()
    }
}
