//! Hardware abstraction for the control surface
//!
//! This crate provides trait-based abstractions for a multi-input control
//! surface (eight programmable keys, four rotary dials and a touch strip),
//! enabling the coordinator and its modules to be developed and tested
//! without the physical device.
//!
//! # Architecture Layers
//!
//! ```text
//! Executable (deckd)
//!         ↓
//! Coordination core + feature modules (deck, modules)
//!         ↓
//! Surface HAL (this crate - trait abstractions)
//!         ↓
//! Device transport (HID driver or surface-emulator)
//! ```
//!
//! # Abstractions
//!
//! - [`SurfaceDevice`] - output half: brightness, key images, strip image
//! - [`EventSource`] - input half: the blocking "listen for events" call
//! - [`SurfaceEvent`] - native, un-joined input shapes (down/up, turn, touch)
//! - [`KeyId`] / [`DialId`] - fixed physical identifiers
//! - [`Canvas`] - embedded-graphics draw target over an RGBA image
//!
//! # Features
//!
//! - `mock`: export [`mocks`] for use in other crates' tests
//!
//! # Example
//!
//! ```no_run
//! use surface::{KeyId, SurfaceDevice};
//!
//! async fn blank<D: SurfaceDevice>(device: &D) {
//!     for key in KeyId::ALL {
//!         device.clear_key(key).await.ok();
//!     }
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::print_stdout)] // prefer tracing over println! in lib code
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)] // hardware accessors - callers decide

pub mod canvas;
pub mod config;
pub mod device;
pub mod input;

#[cfg(any(test, feature = "mock"))]
pub mod mocks;

// Re-export main high-level traits
pub use canvas::Canvas;
pub use device::{DeviceError, DeviceInfo, EventSource, SurfaceDevice};
pub use input::{DialId, KeyId, SurfaceEvent, TouchKind};

// Geometry is expressed with embedded-graphics primitives throughout.
pub use embedded_graphics::prelude::{Point, Size};
pub use embedded_graphics::primitives::Rectangle;

/// Image type pushed to keys and to the strip.
pub use image::RgbaImage;
