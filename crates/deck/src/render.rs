//! Render loop and strip compositing.
//!
//! Every tick pushes key images one by one and the strip as a single
//! composited frame. A failed push is logged and the tick carries on.

use std::sync::Arc;
use std::time::Duration;

use image::{imageops, Rgba, RgbaImage};
use surface::{DeviceError, KeyId, Rectangle, SurfaceDevice};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::module::Overlay;
use crate::registry::{Entry, Registry};

/// Composite every live module's strip image into one full-strip frame.
///
/// Each module image is cropped to its declared rectangle and drawn at that
/// rectangle's offset from the strip origin, alpha-blended over what earlier
/// modules drew. Later registrations win where rectangles overlap.
pub fn composite_strip(registry: &Registry, strip: Rectangle, background: Rgba<u8>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(strip.size.width, strip.size.height, background);

    for entry in registry.live() {
        let area = entry.resources().strip;
        if area.is_zero_sized() {
            continue;
        }
        let Some(frame) = entry.module().render_strip() else {
            continue;
        };

        let image: &RgbaImage = &frame;
        let offset = area.top_left - strip.top_left;
        let width = image.width().min(area.size.width);
        let height = image.height().min(area.size.height);
        let part = imageops::crop_imm(image, 0, 0, width, height).to_image();
        imageops::overlay(&mut canvas, &part, i64::from(offset.x), i64::from(offset.y));
    }
    canvas
}

/// State carried between render ticks.
pub struct Renderer<D> {
    device: Arc<D>,
    registry: Arc<Registry>,
    /// Full strip rectangle, `None` when the device has no strip
    strip: Option<Rectangle>,
    background: Rgba<u8>,
    blank_key: RgbaImage,
    overlay_was_active: bool,
}

impl<D: SurfaceDevice> Renderer<D> {
    /// Renderer for one connection.
    pub fn new(device: Arc<D>, registry: Arc<Registry>, config: &CoordinatorConfig) -> Self {
        let info = device.info();
        let strip = info.strip.filter(|_| info.has_strip());
        let key = info.key_image_size;
        let background = config.clear_pixel();
        Self {
            blank_key: RgbaImage::from_pixel(key.width, key.height, background),
            device,
            registry,
            strip,
            background,
            overlay_was_active: false,
        }
    }

    /// Tick every `period` until `cancel` fires. The first tick is immediate.
    pub async fn run(mut self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
        tracing::debug!("render loop stopped");
    }

    /// Render keys and strip once.
    pub async fn tick(&mut self) {
        let registry = Arc::clone(&self.registry);
        let overlay = registry.active_overlay();
        let mut errors = PushErrors::default();

        self.render_keys(&registry, overlay, &mut errors).await;
        self.render_strip(&registry, overlay, &mut errors).await;
        tracing::trace!(overlay = overlay.is_some(), "render tick");
    }

    async fn render_keys(
        &mut self,
        registry: &Registry,
        overlay: Option<(&Entry, &dyn Overlay)>,
        errors: &mut PushErrors,
    ) {
        if let Some((entry, overlay)) = overlay {
            if !self.overlay_was_active {
                tracing::debug!(module = entry.id(), "overlay took over the surface");
            }
            for (key, frame) in overlay.render_overlay_keys() {
                let result = self.device.set_key_image(key, &frame).await;
                errors.check(key, result);
            }
            self.overlay_was_active = true;
            return;
        }

        if self.overlay_was_active {
            tracing::debug!("overlay dismissed, clearing keys");
            for key in KeyId::ALL {
                let result = self.device.set_key_image(key, &self.blank_key).await;
                errors.check(key, result);
            }
            self.overlay_was_active = false;
        }

        for entry in registry.live() {
            for (key, frame) in entry.module().render_keys() {
                if !registry.holds_key(entry.handle(), key) {
                    tracing::trace!(module = entry.id(), %key, "image for a key the module does not own");
                    continue;
                }
                let result = self.device.set_key_image(key, &frame).await;
                errors.check(key, result);
            }
        }
    }

    async fn render_strip(
        &self,
        registry: &Registry,
        overlay: Option<(&Entry, &dyn Overlay)>,
        errors: &mut PushErrors,
    ) {
        let Some(strip) = self.strip else {
            return;
        };
        let result = match overlay {
            Some((_, overlay)) => match overlay.render_overlay_strip() {
                Some(frame) => self.device.set_strip_image(&frame).await,
                None => return,
            },
            None => {
                let frame = composite_strip(registry, strip, self.background);
                self.device.set_strip_image(&frame).await
            }
        };
        errors.check("strip", result);
    }
}

/// Per-tick push error reporting; a disconnect is logged once per tick.
#[derive(Default)]
struct PushErrors {
    disconnected: bool,
}

impl PushErrors {
    fn check(&mut self, target: impl std::fmt::Display, result: Result<(), DeviceError>) {
        match result {
            Ok(()) => {}
            Err(DeviceError::Disconnected) => {
                if !self.disconnected {
                    tracing::debug!("device disconnected during render");
                    self.disconnected = true;
                }
            }
            Err(e) => tracing::warn!(%target, error = %e, "push failed"),
        }
    }
}
