//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/dragrid/config.json`.  Every section is optional so a
//! minimal `{}` file is valid and all values fall back to their compiled-in
//! defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "grid": {
//!     "container_selector": "drag-container",
//!     "item_selector": "drag-item",
//!     "tile_size": { "width": 100, "height": 100 },
//!     "gap": 10,
//!     "columns_per_row": 6,
//!     "transition_duration_ms": 200
//!   },
//!   "shake": { "max_sample_count": 300 },
//!   "demo": { "tiles": ["Mail", "Calendar", "News"] }
//! }
//! ```

use crate::layout::{LayoutConfig, Size};
use crate::shake::ShakeConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Grid geometry and selectors.
    #[serde(default)]
    pub grid: GridOptions,

    /// Mouse-shake detection thresholds.
    #[serde(default)]
    pub shake: ShakeConfig,

    /// Settings for the bundled binaries.
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Options of a drag grid.
///
/// `container_selector` and `item_selector` are CSS class names (without the
/// leading dot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridOptions {
    pub container_selector: String,
    pub item_selector: String,
    /// Pixel size of every tile.
    pub tile_size: Size,
    /// Pixel spacing between tiles.
    pub gap: f64,
    /// Maximum tiles per row before wrapping.
    pub columns_per_row: usize,
    /// Duration of the reflow animation of non-dragged tiles.
    pub transition_duration_ms: u64,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            container_selector: "drag-container".into(),
            item_selector: "drag-item".into(),
            tile_size: Size::new(100.0, 100.0),
            gap: 10.0,
            columns_per_row: 6,
            transition_duration_ms: 200,
        }
    }
}

impl GridOptions {
    /// The geometric part of these options.
    pub fn layout_config(&self) -> LayoutConfig {
        LayoutConfig {
            tile_size: self.tile_size,
            gap: self.gap,
            columns_per_row: self.columns_per_row,
            transition_duration_ms: self.transition_duration_ms,
        }
    }

    /// Reject geometry the layout cannot represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns_per_row == 0 {
            return Err(ConfigError("grid.columns_per_row must be at least 1".into()));
        }
        if !(self.tile_size.width > 0.0 && self.tile_size.height > 0.0) {
            return Err(ConfigError(format!(
                "grid.tile_size must be positive, got {}x{}",
                self.tile_size.width, self.tile_size.height
            )));
        }
        if !(self.gap >= 0.0) {
            return Err(ConfigError(format!("grid.gap must not be negative, got {}", self.gap)));
        }
        Ok(())
    }
}

/// Settings for the `dragrid` and `dragrid-replay` binaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// One tile is created per label.
    pub tiles: Vec<String>,
    /// Socket the headless daemon listens on.  `None` uses
    /// `$XDG_RUNTIME_DIR/dragrid.sock`.
    pub socket_path: Option<String>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tiles: [
                "Mail", "Calendar", "News", "Maps", "Music", "Photos", "Notes", "Weather",
                "Docs", "Code", "Video", "Store",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            socket_path: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.grid.validate()?;
        Ok(config)
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_full_config() {
        let json = r#"{
            "grid": {
                "container_selector": "shortcuts",
                "item_selector": "shortcut",
                "tile_size": { "width": 80, "height": 90 },
                "gap": 12,
                "columns_per_row": 4,
                "transition_duration_ms": 300
            },
            "shake": {
                "max_sample_count": 100,
                "max_sample_window_ms": 500,
                "max_distance_in_window": 400.0
            },
            "demo": { "tiles": ["a", "b"], "socket_path": "/tmp/x.sock" }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.grid.container_selector, "shortcuts");
        assert_eq!(cfg.grid.tile_size, Size::new(80.0, 90.0));
        assert_eq!(cfg.grid.gap, 12.0);
        assert_eq!(cfg.grid.columns_per_row, 4);
        assert_eq!(cfg.grid.transition_duration_ms, 300);
        assert_eq!(cfg.shake.max_sample_count, 100);
        assert_eq!(cfg.shake.max_sample_window_ms, 500);
        assert_eq!(cfg.shake.max_distance_in_window, 400.0);
        assert_eq!(cfg.demo.tiles, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cfg.demo.socket_path.as_deref(), Some("/tmp/x.sock"));
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.grid, GridOptions::default());
        assert_eq!(cfg.grid.transition_duration_ms, 200);
        assert_eq!(cfg.shake, ShakeConfig::default());
        assert_eq!(cfg.demo.tiles.len(), 12);
    }

    #[test]
    fn deserialize_partial_grid() {
        let cfg: Config = serde_json::from_str(r#"{ "grid": { "gap": 30 } }"#).unwrap();
        assert_eq!(cfg.grid.gap, 30.0);
        assert_eq!(cfg.grid.columns_per_row, GridOptions::default().columns_per_row);
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "grid": {}, "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn layout_config_mirrors_options() {
        let opts = GridOptions::default();
        let layout = opts.layout_config();
        assert_eq!(layout.tile_size, opts.tile_size);
        assert_eq!(layout.pitch_x(), 110.0);
        assert_eq!(layout.columns(), 6);
    }

    #[test]
    fn validation_rejects_degenerate_geometry() {
        let mut opts = GridOptions::default();
        assert!(opts.validate().is_ok());
        opts.columns_per_row = 0;
        assert!(opts.validate().is_err());
        opts = GridOptions {
            gap: -1.0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
        opts = GridOptions {
            tile_size: Size::new(0.0, 10.0),
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn load_rejects_zero_columns() {
        let path = std::env::temp_dir().join(format!("dragrid-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "grid": { "columns_per_row": 0 } }"#).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("columns_per_row"));
        let _ = std::fs::remove_file(&path);
    }
}
