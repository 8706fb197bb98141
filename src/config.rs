// ABOUTME: Configuration structures and parsing for the demo status item and its popover
// ABOUTME: Loaded from TOML in the user's config directory, falling back to built-in defaults

use crate::controller::{PopoverSettings, StatusItemOptions};
use crate::geometry::Size;
use crate::icon::{IconSpec, RasterIcon};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    pub status_item: StatusItemConfig,
    pub popover: PopoverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct StatusItemConfig {
    pub title: String,
    #[serde(default)]
    pub icon: Option<IconConfig>,
}

/// Written in TOML as `icon = { symbol = "cloud.sun" }`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IconConfig {
    Symbol(String),
    Named(String),
    /// Path to a PNG/JPEG/etc, scaled down to menu bar size.
    File(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PopoverConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default = "default_border_offset")]
    pub border_offset: f64,
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_border_offset() -> f64 {
    crate::positioning::WINDOW_BORDER_OFFSET
}

fn default_fade_out_ms() -> u64 {
    300
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            status_item: StatusItemConfig {
                title: "Barpop".to_string(),
                icon: Some(IconConfig::Symbol("menubar.dock.rectangle".to_string())),
            },
            popover: PopoverConfig {
                width: 320.0,
                height: 180.0,
                border_offset: default_border_offset(),
                fade_out_ms: default_fade_out_ms(),
                message: "Hello from the menu bar".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn default_config_content() -> &'static str {
        r#"# Barpop Configuration

[status_item]
# Shown next to the icon, or alone when no icon is set
title = "Barpop"

# Icon sources (pick one, or leave out for a text-only item):
# SF Symbol (default):
icon = { symbol = "menubar.dock.rectangle" }

# Image from the app bundle or the system image set:
# icon = { named = "NSStatusAvailable" }

# Image file, scaled to fit the menu bar:
# icon = { file = "~/Pictures/status.png" }

[popover]
# Content size in points
width = 320.0
height = 180.0
# Inset between the icon edge and the popover edge
border_offset = 2.0
# Dismissal fade duration
fade_out_ms = 300
message = "Hello from the menu bar"

[logging]
# One of: error, warn, info, debug, trace
# Set BARPOP_DEBUG=1 to force debug output
level = "info"
"#
    }

    pub fn load_from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::load_from_str(&content)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
        Ok(config_dir.join("barpop").join("config.toml"))
    }

    pub fn expand_path(&mut self) -> Result<()> {
        if let Some(IconConfig::File(path)) = &mut self.status_item.icon {
            *path = expand_tilde(path)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.status_item.title.trim().is_empty() && self.status_item.icon.is_none() {
            anyhow::bail!("Status item needs a title or an icon");
        }

        match &self.status_item.icon {
            Some(IconConfig::Symbol(name)) | Some(IconConfig::Named(name)) if name.is_empty() => {
                anyhow::bail!("Icon name cannot be empty");
            }
            Some(IconConfig::File(path)) if path.is_empty() => {
                anyhow::bail!("Icon file path cannot be empty");
            }
            _ => {}
        }

        if !(self.popover.width > 0.0 && self.popover.height > 0.0) {
            anyhow::bail!("Popover width and height must be greater than 0");
        }

        if !(self.popover.width.is_finite() && self.popover.height.is_finite()) {
            anyhow::bail!("Popover width and height must be finite");
        }

        if !(self.popover.border_offset >= 0.0 && self.popover.border_offset.is_finite()) {
            anyhow::bail!("border_offset must be a non-negative number");
        }

        self.log_level()?;

        Ok(())
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown log level: {}", self.logging.level))
    }

    pub fn popover_size(&self) -> Size {
        Size::new(self.popover.width, self.popover.height)
    }

    pub fn popover_settings(&self) -> PopoverSettings {
        PopoverSettings {
            border_offset: self.popover.border_offset,
            fade_out: Duration::from_millis(self.popover.fade_out_ms),
        }
    }

    /// Resolves the icon, decoding image files eagerly.
    pub fn status_item_options(&self) -> Result<StatusItemOptions> {
        let icon = match &self.status_item.icon {
            None => None,
            Some(IconConfig::Symbol(name)) => Some(IconSpec::symbol(name.as_str())),
            Some(IconConfig::Named(name)) => Some(IconSpec::named(name.as_str())),
            Some(IconConfig::File(path)) => {
                Some(IconSpec::Raster(RasterIcon::from_file(Path::new(path))?))
            }
        };

        Ok(StatusItemOptions::titled(self.status_item.title.as_str()).with_icon(icon))
    }

    pub fn save_default_config(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config to: {}", path.display()))?;

        Ok(())
    }
}

fn expand_tilde(path: &str) -> Result<String> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(rest).to_string_lossy().into_owned())
    } else {
        Ok(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config() {
        let config_str = r#"
[status_item]
title = "Weather"

[popover]
width = 300.0
height = 400.0
message = "Sunny"
"#;

        let config = Config::load_from_str(config_str).unwrap();

        assert_eq!(config.status_item.title, "Weather");
        assert_eq!(config.status_item.icon, None);
        assert_eq!(config.popover.border_offset, 2.0); // Default value
        assert_eq!(config.popover.fade_out_ms, 300); // Default value
        assert_eq!(config.logging.level, "info"); // Default section
    }

    #[test]
    fn test_parse_icon_variants() {
        let symbol = Config::load_from_str(
            r#"
[status_item]
title = ""
icon = { symbol = "cloud.sun" }

[popover]
width = 300.0
height = 400.0
message = ""
"#,
        )
        .unwrap();
        assert_eq!(
            symbol.status_item.icon,
            Some(IconConfig::Symbol("cloud.sun".to_string()))
        );

        let named = Config::load_from_str(
            r#"
[status_item]
title = "Clock"
icon = { named = "ClockIcon" }

[popover]
width = 300.0
height = 400.0
message = ""
"#,
        )
        .unwrap();
        assert_eq!(
            named.status_item.icon,
            Some(IconConfig::Named("ClockIcon".to_string()))
        );
    }

    #[test]
    fn test_parse_invalid_config_missing_section() {
        let config_str = r#"
[status_item]
title = "Weather"
"#;

        let result = Config::load_from_str(config_str);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse configuration")
        );
    }

    #[test]
    fn test_parse_invalid_config_wrong_type() {
        let config_str = r#"
[status_item]
title = "Weather"

[popover]
width = "wide"  # Should be a number
height = 400.0
message = ""
"#;

        assert!(Config::load_from_str(config_str).is_err());
    }

    #[test]
    fn test_expand_tilde() {
        let home = dirs::home_dir().unwrap();
        let home_str = home.to_string_lossy();

        assert_eq!(expand_tilde("~/icon.png").unwrap(), format!("{}/icon.png", home_str));
        assert_eq!(expand_tilde("/absolute/icon.png").unwrap(), "/absolute/icon.png");
        assert_eq!(expand_tilde("relative/icon.png").unwrap(), "relative/icon.png");
    }

    #[test]
    fn test_config_expand_icon_path() {
        let mut config = create_test_config();
        config.status_item.icon = Some(IconConfig::File("~/icons/status.png".to_string()));

        config.expand_path().unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(
            config.status_item.icon,
            Some(IconConfig::File(
                home.join("icons/status.png").to_string_lossy().into_owned()
            ))
        );
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path().unwrap();
        assert!(path.to_string_lossy().contains("barpop"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_validate_needs_title_or_icon() {
        let mut config = create_test_config();
        config.status_item.title = "  ".to_string();
        config.status_item.icon = None;

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("needs a title or an icon")
        );

        config.status_item.icon = Some(IconConfig::Symbol("clock".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_icon_name() {
        let mut config = create_test_config();
        config.status_item.icon = Some(IconConfig::Named(String::new()));

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Icon name cannot be empty"));
    }

    #[test]
    fn test_validate_zero_popover_size() {
        let mut config = create_test_config();
        config.popover.width = 0.0;

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must be greater than 0")
        );
    }

    #[test]
    fn test_validate_infinite_popover_size() {
        let mut config = create_test_config();
        config.popover.height = f64::INFINITY;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must be finite"));
    }

    #[test]
    fn test_validate_negative_border_offset() {
        let mut config = create_test_config();
        config.popover.border_offset = -1.0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_log_level() {
        let mut config = create_test_config();
        config.logging.level = "chatty".to_string();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unknown log level"));
    }

    #[test]
    fn test_validate_valid_config() {
        let config = create_test_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_content_can_be_parsed() {
        let content = Config::default_config_content();
        let config = Config::load_from_str(content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_popover_settings_from_config() {
        let mut config = create_test_config();
        config.popover.fade_out_ms = 150;
        config.popover.border_offset = 4.0;

        let settings = config.popover_settings();
        assert_eq!(settings.fade_out, Duration::from_millis(150));
        assert_eq!(settings.border_offset, 4.0);
        assert_eq!(config.popover_size(), Size::new(300.0, 400.0));
    }

    #[test]
    fn test_status_item_options_from_symbol() {
        let mut config = create_test_config();
        config.status_item.icon = Some(IconConfig::Symbol("cloud.sun".to_string()));

        let options = config.status_item_options().unwrap();
        assert_eq!(options, StatusItemOptions::symbol("Weather", "cloud.sun"));
    }

    #[test]
    fn test_status_item_options_missing_icon_file() {
        let mut config = create_test_config();
        config.status_item.icon = Some(IconConfig::File("/nonexistent/icon.png".to_string()));

        let result = config.status_item_options();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read status icon")
        );
    }

    #[test]
    fn test_save_and_load_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        Config::save_default_config(&path).unwrap();
        let config = Config::load_from_file(&path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load_from_file(Path::new("/nonexistent/barpop.toml"));

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read configuration file")
        );
    }

    fn create_test_config() -> Config {
        Config {
            status_item: StatusItemConfig {
                title: "Weather".to_string(),
                icon: None,
            },
            popover: PopoverConfig {
                width: 300.0,
                height: 400.0,
                border_offset: 2.0,
                fade_out_ms: 300,
                message: "Sunny".to_string(),
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
        }
    }
}
