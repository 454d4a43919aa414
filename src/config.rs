//! Application configuration.
//!
//! The configuration is loaded from
//! `$XDG_CONFIG_HOME/hyprscroll/config.json`.  It has one section per
//! switch action; each section carries its own ordered device rule list so
//! that, say, a touchpad can switch workspaces vertically but windows only
//! horizontally.
//!
//! # Example
//!
//! ```json
//! {
//!   "workspaces": {
//!     "cycle": false,
//!     "timeout_ms": 300,
//!     "devices": [
//!       { "name_mask": "Touchpad", "horizontal": "disabled",
//!         "vertical": "inverted", "resistance": 80.0 },
//!       { "horizontal": "direct", "vertical": "direct", "resistance": 1.0 }
//!     ]
//!   },
//!   "windows": { "visualize": true, "timeout_ms": 1500 }
//! }
//! ```

use crate::arbiter::ActionSettings;
use crate::command::Action;
use crate::device::{AxisMode, DeviceRuleConfig};
use crate::gesture::Multipliers;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
///
/// Every field is optional; a minimal `{}` file is valid and all sections
/// fall back to their compiled-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Switching between the windows of the active workspace.
    pub windows: ActionConfig,
    /// Switching between workspaces.
    pub workspaces: ActionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            windows: ActionConfig {
                visualize: true,
                timeout_ms: 1500,
                ..ActionConfig::default()
            },
            workspaces: ActionConfig::default(),
        }
    }
}

/// Settings of one switch action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Whether the action's scroll region is bound at all.  Default: `true`.
    pub enabled: bool,
    /// Wrap around at the ends of the collection.  Default: `true`.
    pub cycle: bool,
    /// Show a popup and defer the switch until scrolling stops.
    /// Default: `false`.
    pub visualize: bool,
    /// Debounce window after a switch, and popup lifetime (ms).
    /// Default: `300`.
    pub timeout_ms: u64,
    /// Scale factor for horizontal smooth deltas.  Default: `1.0`.
    pub horizontal_multiplier: f64,
    /// Scale factor for vertical smooth deltas.  Default: `1.0`.
    pub vertical_multiplier: f64,
    /// Ordered device rules; the first matching rule applies.  The last
    /// rule should have no masks so that it catches every other device.
    pub devices: Vec<DeviceRuleConfig>,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cycle: true,
            visualize: false,
            timeout_ms: 300,
            horizontal_multiplier: 1.0,
            vertical_multiplier: 1.0,
            devices: vec![DeviceRuleConfig {
                horizontal: AxisMode::Direct,
                vertical: AxisMode::Direct,
                resistance: 1.0,
                ..DeviceRuleConfig::default()
            }],
        }
    }
}

impl ActionConfig {
    /// Debounce and feedback settings for the arbiter.
    pub fn settings(&self) -> ActionSettings {
        ActionSettings {
            cycle: self.cycle,
            visualize: self.visualize,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }

    /// Smooth-scroll multipliers, with non-finite values treated as `0`.
    pub fn multipliers(&self) -> Multipliers {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        Multipliers {
            horizontal: finite(self.horizontal_multiplier),
            vertical: finite(self.vertical_multiplier),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Parse configuration from a JSON string.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The section for `action`.
    pub fn action(&self, action: Action) -> &ActionConfig {
        match action {
            Action::Windows => &self.windows,
            Action::Workspaces => &self.workspaces,
        }
    }
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);
