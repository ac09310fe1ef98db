//! deckd - control-surface daemon
//!
//! Runs the module coordinator against a control surface and keeps it
//! running across disconnects.
//!
//! # Architecture
//!
//! ```text
//! main.rs (CLI, logging, signals)
//!         ↓
//! Daemon (wait for device → prepare → coordinator → stop → wait again)
//!         ↓
//! deck::Coordinator + modules::compose()
//!         ↓
//! surface traits (emulator today, HID transport later)
//! ```
//!
//! Every connection gets a fresh coordinator and fresh module instances, so
//! no state leaks from one session to the next.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p deckd -- --demo --run-for 20 --screenshot surface.png
//! RUST_LOG=debug cargo run -p deckd -- --config deck.json
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)]
// Logging discipline
#![warn(clippy::print_stdout)]
#![warn(clippy::dbg_macro)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod daemon;
pub mod demo;
pub mod logging;

pub use daemon::{Connect, Daemon, SessionEnd};
