//! Device abstraction layer
//!
//! The transport is split into two halves so the render loop and the event
//! listener never contend for one handle:
//!
//! - [`SurfaceDevice`] is shared (`&self`) and carries every output call.
//! - [`EventSource`] is owned by exactly one listener task.

use embedded_graphics::prelude::Size;
use embedded_graphics::primitives::Rectangle;
use image::RgbaImage;

use crate::input::{KeyId, SurfaceEvent};

/// Static description of a connected surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Human-readable model name
    pub model: String,
    /// Serial number reported by the device
    pub serial: String,
    /// Number of programmable keys
    pub key_count: usize,
    /// Number of rotary dials
    pub dial_count: usize,
    /// Pixel size every key image must have
    pub key_image_size: Size,
    /// Full strip rectangle, `None` when the model has no touch strip
    pub strip: Option<Rectangle>,
}

impl DeviceInfo {
    /// Whether the device reports a usable touch strip.
    pub fn has_strip(&self) -> bool {
        self.strip.is_some_and(|rect| !rect.is_zero_sized())
    }
}

/// Output half of the transport.
///
/// Every push is asynchronous and fallible; implementations must be safe to
/// call from several tasks at once.
pub trait SurfaceDevice: Send + Sync + 'static {
    /// Describe the connected hardware.
    fn info(&self) -> &DeviceInfo;

    /// Set backlight brightness in percent (`0..=100`).
    fn set_brightness(
        &self,
        percent: u8,
    ) -> impl core::future::Future<Output = Result<(), DeviceError>> + Send;

    /// Replace the image shown on one key.
    fn set_key_image(
        &self,
        key: KeyId,
        image: &RgbaImage,
    ) -> impl core::future::Future<Output = Result<(), DeviceError>> + Send;

    /// Blank one key.
    fn clear_key(
        &self,
        key: KeyId,
    ) -> impl core::future::Future<Output = Result<(), DeviceError>> + Send;

    /// Replace the full-width strip image.
    fn set_strip_image(
        &self,
        image: &RgbaImage,
    ) -> impl core::future::Future<Output = Result<(), DeviceError>> + Send;
}

/// Input half of the transport: the blocking "listen for events" call.
pub trait EventSource: Send + 'static {
    /// Wait for the next input event.
    ///
    /// An `Err` is terminal for the connection (disconnect, transport
    /// failure); callers must not poll again afterwards.
    fn next_event(
        &mut self,
    ) -> impl core::future::Future<Output = Result<SurfaceEvent, DeviceError>> + Send;
}

/// Device errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The device went away
    #[error("device disconnected")]
    Disconnected,
    /// No device is attached
    #[error("no control surface found")]
    NotFound,
    /// Low-level write/read failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Image dimensions do not match what the target expects
    #[error("image is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    InvalidImage {
        /// Expected width
        expected_w: u32,
        /// Expected height
        expected_h: u32,
        /// Actual width
        actual_w: u32,
        /// Actual height
        actual_h: u32,
    },
    /// The model lacks the requested capability
    #[error("unsupported by this model: {0}")]
    Unsupported(&'static str),
}

impl DeviceError {
    /// Whether the error ends the connection.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::NotFound)
    }

    /// Build [`DeviceError::InvalidImage`] from two sizes.
    pub fn invalid_image(expected: Size, image: &RgbaImage) -> Self {
        Self::InvalidImage {
            expected_w: expected.width,
            expected_h: expected.height,
            actual_w: image.width(),
            actual_h: image.height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::Point;

    fn info(strip: Option<Rectangle>) -> DeviceInfo {
        DeviceInfo {
            model: "test".into(),
            serial: "0".into(),
            key_count: 8,
            dial_count: 4,
            key_image_size: Size::new(120, 120),
            strip,
        }
    }

    #[test]
    fn has_strip_requires_area() {
        assert!(!info(None).has_strip());
        assert!(!info(Some(Rectangle::new(Point::zero(), Size::new(800, 0)))).has_strip());
        assert!(info(Some(Rectangle::new(Point::zero(), Size::new(800, 100)))).has_strip());
    }

    #[test]
    fn only_disconnects_are_fatal() {
        assert!(DeviceError::Disconnected.is_fatal());
        assert!(!DeviceError::Transport("stall".into()).is_fatal());
        assert!(!DeviceError::Unsupported("strip").is_fatal());
    }

    #[test]
    fn invalid_image_message_names_both_sizes() {
        let img = RgbaImage::new(10, 20);
        let err = DeviceError::invalid_image(Size::new(120, 120), &img);
        assert_eq!(err.to_string(), "image is 10x20, expected 120x120");
    }
}
