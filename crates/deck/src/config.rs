//! Runtime configuration
//!
//! [`CoordinatorConfig`] tunes one coordinator. [`DeckConfig`] is the
//! daemon's file format: the coordinator section plus reconnect timing and
//! the module layout. Both load from JSON; every field has a default, so an
//! empty object `{}` is a valid file.
//!
//! ```json
//! {
//!   "coordinator": { "render_interval_ms": 500, "brightness": 60 },
//!   "modules": {
//!     "clock": { "strip": { "x": 400, "y": 0, "width": 400, "height": 100 } },
//!     "spotlight": { "enabled": false }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::Rgba;
use serde::{Deserialize, Serialize};
use surface::config::{self as hw, DEFAULT_BRIGHTNESS};
use surface::{DialId, KeyId, Point, Rectangle, Size};

use crate::resources::Resources;

/// Shortest render period accepted from a config file.
pub const MIN_RENDER_INTERVAL_MS: u64 = 50;

/// What to do when a module handler returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerErrorPolicy {
    /// Log at `warn` and keep the connection
    #[default]
    Log,
    /// End the listener with [`CoordinatorError::Handler`](crate::CoordinatorError::Handler)
    Disconnect,
}

/// Coordinator tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// Render period
    pub render_interval_ms: u64,
    /// Brightness applied when a session is prepared, in percent
    pub brightness: u8,
    /// Handler error policy
    pub handler_errors: HandlerErrorPolicy,
    /// RGBA used for cleared keys and the strip background
    pub clear_color: [u8; 4],
}

impl CoordinatorConfig {
    /// Render period as a [`Duration`].
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }

    /// Clear colour as a pixel.
    pub fn clear_pixel(&self) -> Rgba<u8> {
        Rgba(self.clear_color)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render_interval_ms < MIN_RENDER_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "render_interval_ms must be at least {MIN_RENDER_INTERVAL_MS}, got {}",
                self.render_interval_ms
            )));
        }
        if self.brightness > 100 {
            return Err(ConfigError::Invalid(format!(
                "brightness must be 0..=100, got {}",
                self.brightness
            )));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            render_interval_ms: 500,
            brightness: DEFAULT_BRIGHTNESS,
            handler_errors: HandlerErrorPolicy::Log,
            clear_color: [0, 0, 0, 255],
        }
    }
}

/// Strip area in full-strip pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripArea {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl From<StripArea> for Rectangle {
    fn from(a: StripArea) -> Self {
        Rectangle::new(Point::new(a.x, a.y), Size::new(a.width, a.height))
    }
}

impl From<Rectangle> for StripArea {
    fn from(r: Rectangle) -> Self {
        Self {
            x: r.top_left.x,
            y: r.top_left.y,
            width: r.size.width,
            height: r.size.height,
        }
    }
}

/// Where one module sits on the surface. Keys and dials are numbered from 1,
/// as printed on the hardware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModuleLayout {
    /// Whether the daemon registers the module at all
    pub enabled: bool,
    /// Key numbers, `1..=8`
    pub keys: Vec<u8>,
    /// Dial numbers, `1..=4`
    pub dials: Vec<u8>,
    /// Strip area, `None` for no strip access
    pub strip: Option<StripArea>,
}

impl Default for ModuleLayout {
    fn default() -> Self {
        Self {
            enabled: true,
            keys: Vec::new(),
            dials: Vec::new(),
            strip: None,
        }
    }
}

impl ModuleLayout {
    /// Convert to a grant, rejecting numbers that name no physical input.
    pub fn resources(&self) -> Result<Resources, ConfigError> {
        let keys = self
            .keys
            .iter()
            .map(|&n| {
                usize::from(n)
                    .checked_sub(1)
                    .and_then(KeyId::from_index)
                    .ok_or_else(|| ConfigError::Invalid(format!("no key {n} (expected 1..=8)")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let dials = self
            .dials
            .iter()
            .map(|&n| {
                usize::from(n)
                    .checked_sub(1)
                    .and_then(DialId::from_index)
                    .ok_or_else(|| ConfigError::Invalid(format!("no dial {n} (expected 1..=4)")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut grant = Resources::new().keys(keys).dials(dials);
        if let Some(area) = self.strip {
            grant = grant.strip(area.into());
        }
        Ok(grant)
    }
}

/// Daemon configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeckConfig {
    /// Coordinator section
    pub coordinator: CoordinatorConfig,
    /// How often to look for the device while it is absent
    pub reconnect_poll_ms: u64,
    /// Upper bound on `Coordinator::stop` before giving up waiting
    pub stop_timeout_ms: u64,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Layout per module id
    pub modules: BTreeMap<String, ModuleLayout>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        let layout = |keys: &[u8], dials: &[u8], strip: Option<Rectangle>| ModuleLayout {
            enabled: true,
            keys: keys.to_vec(),
            dials: dials.to_vec(),
            strip: strip.map(StripArea::from),
        };
        let mut modules = BTreeMap::new();
        modules.insert(
            "counter".to_string(),
            layout(&[5, 6], &[1, 2], Some(hw::strip_left_half())),
        );
        modules.insert(
            "clock".to_string(),
            layout(&[], &[], Some(hw::strip_right_half())),
        );
        modules.insert("spotlight".to_string(), layout(&[3, 4], &[], None));

        Self {
            coordinator: CoordinatorConfig::default(),
            reconnect_poll_ms: 2000,
            stop_timeout_ms: 2000,
            log_filter: "info".to_string(),
            modules,
        }
    }
}

impl DeckConfig {
    /// Device poll period while disconnected.
    pub fn reconnect_poll(&self) -> Duration {
        Duration::from_millis(self.reconnect_poll_ms)
    }

    /// Bound on coordinator shutdown.
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Layout for `id` if the module is enabled.
    ///
    /// A module missing from the file is disabled.
    pub fn enabled_layout(&self, id: &str) -> Option<&ModuleLayout> {
        self.modules.get(id).filter(|l| l.enabled)
    }

    /// Check value ranges, including every module layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.coordinator.validate()?;
        if self.reconnect_poll_ms == 0 {
            return Err(ConfigError::Invalid(
                "reconnect_poll_ms must be positive".to_string(),
            ));
        }
        for (id, layout) in &self.modules {
            layout
                .resources()
                .map_err(|e| ConfigError::Invalid(format!("module {id}: {e}")))?;
        }
        Ok(())
    }
}

/// Parse and validate a JSON document.
pub fn from_json_str(json: &str) -> Result<DeckConfig, ConfigError> {
    let config: DeckConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<DeckConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = from_json_str(&text)?;
    tracing::debug!(path = %path.display(), modules = config.modules.len(), "config loaded");
    Ok(config)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Not valid JSON for this schema
    #[error("invalid config syntax: {0}")]
    Parse(#[from] serde_json::Error),
    /// Well-formed but out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = from_json_str("{}").unwrap();
        assert_eq!(cfg, DeckConfig::default());
        assert_eq!(cfg.coordinator.render_interval(), Duration::from_millis(500));
        assert_eq!(cfg.coordinator.brightness, 80);
        assert_eq!(cfg.coordinator.handler_errors, HandlerErrorPolicy::Log);
    }

    #[test]
    fn policy_is_lowercase_in_json() {
        let cfg = from_json_str(r#"{"coordinator":{"handler_errors":"disconnect"}}"#).unwrap();
        assert_eq!(cfg.coordinator.handler_errors, HandlerErrorPolicy::Disconnect);
    }

    #[test]
    fn too_fast_render_rejected() {
        let err = from_json_str(r#"{"coordinator":{"render_interval_ms":10}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn brightness_over_100_rejected() {
        let err = from_json_str(r#"{"coordinator":{"brightness":101}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = from_json_str(r#"{"coordinater":{}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn layout_numbers_are_one_based() {
        let layout = ModuleLayout {
            keys: vec![1, 8],
            dials: vec![4],
            ..ModuleLayout::default()
        };
        let grant = layout.resources().unwrap();
        assert_eq!(grant.keys, vec![KeyId::Key1, KeyId::Key8]);
        assert_eq!(grant.dials, vec![DialId::Dial4]);
        assert!(!grant.has_strip());
    }

    #[test]
    fn out_of_range_key_rejected() {
        for bad in [0u8, 9] {
            let layout = ModuleLayout {
                keys: vec![bad],
                ..ModuleLayout::default()
            };
            assert!(layout.resources().is_err(), "key {bad} accepted");
        }
    }

    #[test]
    fn missing_module_is_disabled() {
        let cfg = from_json_str(r#"{"modules":{"clock":{"enabled":false}}}"#).unwrap();
        assert!(cfg.enabled_layout("clock").is_none());
        assert!(cfg.enabled_layout("counter").is_none());
        assert!(DeckConfig::default().enabled_layout("counter").is_some());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");
        std::fs::write(&path, r#"{"reconnect_poll_ms": 500}"#).unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.reconnect_poll(), Duration::from_millis(500));
    }

    #[test]
    fn missing_file_names_path() {
        let err = load_config("/nonexistent/deck.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/deck.json"));
    }
}
