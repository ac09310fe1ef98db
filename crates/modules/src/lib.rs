//! Reference feature modules for the control surface.
//!
//! Each module implements [`deck::Module`] and draws its own frames with
//! embedded-graphics on a [`surface::Canvas`]:
//!
//! - [`CounterModule`] - keys, dials and a strip area driving a number
//! - [`ClockModule`] - wall-clock time on a strip area, refreshed in the
//!   background
//! - [`SpotlightModule`] - an overlay that takes over the whole surface
//!   for a short window
//!
//! [`compose`] builds fresh instances for every module enabled in a
//! [`DeckConfig`], ready to hand to a new coordinator.

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::print_stdout)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod clock;
pub mod counter;
pub mod draw;
pub mod spotlight;

use std::sync::Arc;

use deck::config::ConfigError;
use deck::{DeckConfig, Module, Resources};
use surface::Size;

pub use clock::ClockModule;
pub use counter::CounterModule;
pub use spotlight::SpotlightModule;

/// Ids of every module this crate can build, in registration order.
pub const KNOWN: [&str; 3] = [CounterModule::ID, ClockModule::ID, SpotlightModule::ID];

/// Build the modules enabled in `config`, each with its grant.
///
/// Modules are returned in registration order, so a later module wins any
/// key or dial it shares with an earlier one. Unknown ids in the config are
/// logged and skipped. `strip` is the connected device's full strip size,
/// used by modules that draw across the whole strip.
pub fn compose(
    config: &DeckConfig,
    strip: Option<Size>,
) -> Result<Vec<(Arc<dyn Module>, Resources)>, ConfigError> {
    for id in config.modules.keys() {
        if !KNOWN.contains(&id.as_str()) {
            tracing::warn!(module = %id, "unknown module in config, skipping");
        }
    }

    let mut modules: Vec<(Arc<dyn Module>, Resources)> = Vec::new();
    for id in KNOWN {
        let Some(layout) = config.enabled_layout(id) else {
            tracing::debug!(module = id, "module disabled");
            continue;
        };
        let module: Arc<dyn Module> = match id {
            CounterModule::ID => Arc::new(CounterModule::new()),
            ClockModule::ID => Arc::new(ClockModule::new()),
            _ => Arc::new(SpotlightModule::new().with_strip(strip)),
        };
        modules.push((module, layout.resources()?));
    }
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck::ModuleLayout;
    use surface::KeyId;

    #[test]
    fn default_config_builds_all_three() {
        let modules = compose(&DeckConfig::default(), None).unwrap();
        let ids: Vec<_> = modules.iter().map(|(m, _)| m.id().to_string()).collect();
        assert_eq!(ids, ["counter", "clock", "spotlight"]);
        assert_eq!(modules[2].1.keys, vec![KeyId::Key3, KeyId::Key4]);
    }

    #[test]
    fn disabled_and_unknown_modules_are_skipped() {
        let mut config = DeckConfig::default();
        config.modules.get_mut("clock").unwrap().enabled = false;
        config.modules.insert("weather".to_string(), ModuleLayout::default());
        let modules = compose(&config, None).unwrap();
        let ids: Vec<_> = modules.iter().map(|(m, _)| m.id().to_string()).collect();
        assert_eq!(ids, ["counter", "spotlight"]);
    }

    #[test]
    fn bad_layout_is_an_error() {
        let mut config = DeckConfig::default();
        config.modules.get_mut("counter").unwrap().keys = vec![9];
        assert!(compose(&config, None).is_err());
    }

    #[test]
    fn every_call_builds_fresh_instances() {
        let a = compose(&DeckConfig::default(), None).unwrap();
        let b = compose(&DeckConfig::default(), None).unwrap();
        assert!(!Arc::ptr_eq(&a[0].0, &b[0].0));
    }
}
