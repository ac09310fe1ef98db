//! Module coordination core for the control surface.
//!
//! Feature modules are granted exclusive keys, dials and a slice of the touch
//! strip. The [`Coordinator`] routes input to the owning module, lets one
//! module at a time take over the whole surface as an overlay, and runs the
//! render loop that pushes key images and a composited strip frame to the
//! device.
//!
//! ```text
//! EventSource ──▶ listener task ──▶ Router ──▶ Module::handle_* / Overlay::handle_overlay_*
//!
//! interval ──▶ render task ──▶ Module::render_* ──▶ composite ──▶ SurfaceDevice
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use deck::{Coordinator, Module, Resources};
//! use surface::{mocks::{MockEvents, MockSurface}, KeyId};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(module: Arc<dyn Module>) -> Result<(), deck::CoordinatorError> {
//! let device = Arc::new(MockSurface::new());
//! let mut coordinator = Coordinator::new(device);
//! coordinator.register_module(module, Resources::new().keys([KeyId::Key1]));
//!
//! let shutdown = CancellationToken::new();
//! let result = coordinator.start(MockEvents::new(), &shutdown).await;
//! coordinator.stop().await?;
//! result
//! # }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod module;
pub mod press;
pub mod registry;
pub mod render;
pub mod resources;
pub mod router;

pub use config::{CoordinatorConfig, DeckConfig, HandlerErrorPolicy, ModuleLayout};
pub use coordinator::{prepare_session, Coordinator};
pub use error::CoordinatorError;
pub use event::{DialEvent, KeyEvent, TouchStripEvent};
pub use module::{Frame, KeyImages, Module, ModuleError, ModuleHandle, Overlay};
pub use resources::Resources;
