//! Control surface emulator
//!
//! Headless, in-process stand-in for the physical surface. It implements the
//! [`surface`] traits so the coordinator, the feature modules and the daemon
//! run unmodified against it in tests and on machines without the hardware.
//!
//! - [`Emulator`] is the hub: plug/unplug the virtual device, script input,
//!   inspect what was pushed and export a PNG screenshot.
//! - [`EmulatorDevice`] is the output half handed out by
//!   [`Emulator::connect()`].
//! - [`EmulatorInput`] is the input half; [`InputQueue`] feeds it.
//!
//! # Example
//!
//! ```no_run
//! use surface::{KeyId, SurfaceDevice};
//! use surface_emulator::Emulator;
//!
//! # async fn example() -> Result<(), surface::DeviceError> {
//! let emulator = Emulator::new();
//! let (device, _input) = emulator.connect()?;
//! device.set_brightness(80).await?;
//! device.clear_key(KeyId::Key1).await?;
//! emulator.screenshot("surface.png").ok();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod input;

pub use config::EmulatorConfig;
pub use input::{EmulatorInput, InputQueue, QUEUE_CAP};

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::{imageops, Rgba, RgbaImage};
use surface::{config as hw, DeviceError, DeviceInfo, KeyId, SurfaceDevice};

/// Background colour of screenshots (the device bezel).
const BEZEL: Rgba<u8> = Rgba([40, 40, 40, 255]);

/// State shared between the hub and every device handle it handed out.
struct State {
    plugged: bool,
    /// Incremented on every connect; handles from older sessions are stale.
    session: u64,
    input: Option<InputQueue>,
    brightness: u8,
    keys: [Option<RgbaImage>; hw::KEY_COUNT],
    strip: Option<RgbaImage>,
}

type Shared = Arc<Mutex<State>>;

fn lock(shared: &Shared) -> MutexGuard<'_, State> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Emulated control surface
///
/// Cloning yields another handle to the same virtual hardware.
#[derive(Clone)]
pub struct Emulator {
    config: EmulatorConfig,
    shared: Shared,
}

impl Emulator {
    /// Create an emulator with the default layout, plugged in.
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    /// Create an emulator with a custom layout, plugged in.
    pub fn with_config(config: EmulatorConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Mutex::new(State {
                plugged: true,
                session: 0,
                input: None,
                brightness: 0,
                keys: Default::default(),
                strip: None,
            })),
        }
    }

    /// Layout in use.
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Open a new session.
    ///
    /// Each call starts a fresh input queue and invalidates handles from any
    /// previous session. Fails with [`DeviceError::NotFound`] while unplugged.
    pub fn connect(&self) -> Result<(EmulatorDevice, EmulatorInput), DeviceError> {
        let mut state = lock(&self.shared);
        if !state.plugged {
            return Err(DeviceError::NotFound);
        }
        if let Some(old) = state.input.take() {
            old.disconnect();
        }
        state.session += 1;
        let (producer, consumer) = InputQueue::new();
        state.input = Some(producer);

        let session = state.session;
        tracing::info!(session, model = self.config.model, "emulated surface connected");
        let device = EmulatorDevice {
            info: DeviceInfo {
                model: self.config.model.to_string(),
                serial: format!("EMU{session:05}"),
                key_count: hw::KEY_COUNT,
                dial_count: hw::DIAL_COUNT,
                key_image_size: self.config.key_image_size,
                strip: self.config.strip,
            },
            session,
            shared: self.shared.clone(),
        };
        Ok((device, consumer))
    }

    /// Pull the cable.
    ///
    /// The live session's input stream ends with [`DeviceError::Disconnected`]
    /// after already-queued events, and every output call fails from now on.
    pub fn unplug(&self) {
        let mut state = lock(&self.shared);
        state.plugged = false;
        if let Some(input) = state.input.take() {
            input.disconnect();
        }
        tracing::info!(session = state.session, "emulated surface unplugged");
    }

    /// Reattach the device so [`connect()`](Self::connect) succeeds again.
    pub fn plug(&self) {
        lock(&self.shared).plugged = true;
        tracing::info!("emulated surface plugged in");
    }

    /// Whether the virtual cable is attached.
    pub fn is_plugged(&self) -> bool {
        lock(&self.shared).plugged
    }

    /// Producer for the live session's input, `None` when not connected.
    pub fn input(&self) -> Option<InputQueue> {
        lock(&self.shared).input.clone()
    }

    /// Last brightness set by the host.
    pub fn brightness(&self) -> u8 {
        lock(&self.shared).brightness
    }

    /// Image currently shown on `key`, `None` if never pushed.
    pub fn key_frame(&self, key: KeyId) -> Option<RgbaImage> {
        lock(&self.shared).keys[key.index()].clone()
    }

    /// Image currently shown on the strip, `None` if never pushed.
    pub fn strip_frame(&self) -> Option<RgbaImage> {
        lock(&self.shared).strip.clone()
    }

    /// Render the whole surface into one image: two rows of four keys above
    /// the strip.
    pub fn render(&self) -> RgbaImage {
        let (w, h) = self.config.screenshot_size();
        let mut out = RgbaImage::from_pixel(w, h, BEZEL);
        let state = lock(&self.shared);
        let key = self.config.key_image_size;
        let gap = i64::from(self.config.gap);

        for k in KeyId::ALL {
            let Some(frame) = &state.keys[k.index()] else {
                continue;
            };
            let col = i64::try_from(k.index() % 4).unwrap_or_default();
            let row = i64::try_from(k.index() / 4).unwrap_or_default();
            let x = gap + col * (i64::from(key.width) + gap);
            let y = gap + row * (i64::from(key.height) + gap);
            imageops::overlay(&mut out, frame, x, y);
        }

        if let (Some(strip), Some(frame)) = (self.config.strip, &state.strip) {
            let x = (i64::from(w) - i64::from(strip.size.width)) / 2;
            let y = 2 * i64::from(key.height) + 3 * gap;
            imageops::overlay(&mut out, frame, x, y);
        }
        out
    }

    /// Save [`render()`](Self::render) as a PNG.
    pub fn screenshot(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        let path = path.as_ref();
        self.render().save(path)?;
        tracing::debug!(path = %path.display(), "screenshot saved");
        Ok(())
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Output half of an emulated session.
pub struct EmulatorDevice {
    info: DeviceInfo,
    session: u64,
    shared: Shared,
}

impl EmulatorDevice {
    /// Lock the shared state if this handle's session is still live.
    fn live(&self) -> Result<MutexGuard<'_, State>, DeviceError> {
        let state = lock(&self.shared);
        if state.plugged && state.session == self.session {
            Ok(state)
        } else {
            Err(DeviceError::Disconnected)
        }
    }

    fn strip_rect(&self) -> Result<surface::Rectangle, DeviceError> {
        match self.info.strip {
            Some(rect) if self.info.has_strip() => Ok(rect),
            _ => Err(DeviceError::Unsupported("touch strip")),
        }
    }
}

impl SurfaceDevice for EmulatorDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    async fn set_brightness(&self, percent: u8) -> Result<(), DeviceError> {
        let mut state = self.live()?;
        state.brightness = percent.min(100);
        tracing::trace!(percent, "brightness");
        Ok(())
    }

    async fn set_key_image(&self, key: KeyId, image: &RgbaImage) -> Result<(), DeviceError> {
        let expected = self.info.key_image_size;
        if image.dimensions() != (expected.width, expected.height) {
            return Err(DeviceError::invalid_image(expected, image));
        }
        let mut state = self.live()?;
        state.keys[key.index()] = Some(image.clone());
        tracing::trace!(%key, "key image");
        Ok(())
    }

    async fn clear_key(&self, key: KeyId) -> Result<(), DeviceError> {
        let size = self.info.key_image_size;
        let mut state = self.live()?;
        state.keys[key.index()] =
            Some(RgbaImage::from_pixel(size.width, size.height, Rgba([0, 0, 0, 255])));
        tracing::trace!(%key, "key cleared");
        Ok(())
    }

    async fn set_strip_image(&self, image: &RgbaImage) -> Result<(), DeviceError> {
        let rect = self.strip_rect()?;
        if image.dimensions() != (rect.size.width, rect.size.height) {
            return Err(DeviceError::invalid_image(rect.size, image));
        }
        let mut state = self.live()?;
        state.strip = Some(image.clone());
        tracing::trace!("strip image");
        Ok(())
    }
}
