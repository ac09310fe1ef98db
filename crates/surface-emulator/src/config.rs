//! Emulator configuration

use surface::config;
use surface::{Rectangle, Size};

/// Configuration for the emulated hardware and its screenshot layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// Model name reported in [`surface::DeviceInfo`]
    pub model: &'static str,
    /// Pixel size of every key image
    pub key_image_size: Size,
    /// Touch strip rectangle (`None` emulates a model without a strip)
    pub strip: Option<Rectangle>,
    /// Gap between keys in screenshots, in pixels
    pub gap: u32,
}

impl EmulatorConfig {
    /// Default configuration: standard layout with an 800×100 strip
    pub const DEFAULT: Self = Self {
        model: "Surface Emulator",
        key_image_size: config::key_image_size(),
        strip: Some(config::strip_rect()),
        gap: 20,
    };

    /// Keys and dials only, no touch strip
    pub const NO_STRIP: Self = Self {
        model: "Surface Emulator (no strip)",
        key_image_size: config::key_image_size(),
        strip: None,
        gap: 20,
    };

    /// Screenshot canvas size: two rows of four keys above the strip
    pub fn screenshot_size(&self) -> (u32, u32) {
        let key = self.key_image_size;
        let keys_w = 4 * key.width + 5 * self.gap;
        let keys_h = 2 * key.height + 3 * self.gap;
        match self.strip {
            Some(strip) => (
                keys_w.max(strip.size.width + 2 * self.gap),
                keys_h + strip.size.height + self.gap,
            ),
            None => (keys_w, keys_h),
        }
    }
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
