//! Surface constants
//!
//! Central values for the one supported hardware layout. Code should
//! reference these rather than hardcoding geometry.

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;

/// The application name
pub const APP_NAME: &str = "Belowdeck";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of programmable keys
pub const KEY_COUNT: usize = 8;

/// Number of rotary dials
pub const DIAL_COUNT: usize = 4;

/// Key image edge length in pixels
pub const KEY_IMAGE_EDGE: u32 = 120;

/// Touch strip width in pixels
pub const STRIP_WIDTH: u32 = 800;

/// Touch strip height in pixels
pub const STRIP_HEIGHT: u32 = 100;

/// Brightness applied when a connection is prepared
pub const DEFAULT_BRIGHTNESS: u8 = 80;

/// Pixel size of one key image.
pub const fn key_image_size() -> Size {
    Size::new(KEY_IMAGE_EDGE, KEY_IMAGE_EDGE)
}

/// The full strip rectangle.
pub const fn strip_rect() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(STRIP_WIDTH, STRIP_HEIGHT))
}

/// Left half of the strip.
pub const fn strip_left_half() -> Rectangle {
    Rectangle::new(Point::zero(), Size::new(STRIP_WIDTH / 2, STRIP_HEIGHT))
}

/// Right half of the strip.
#[allow(clippy::cast_possible_wrap)] // STRIP_WIDTH / 2 = 400 fits in i32
pub const fn strip_right_half() -> Rectangle {
    Rectangle::new(
        Point::new((STRIP_WIDTH / 2) as i32, 0),
        Size::new(STRIP_WIDTH / 2, STRIP_HEIGHT),
    )
}
