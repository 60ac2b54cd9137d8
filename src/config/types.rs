use serde::Deserialize;
use std::path::Path;

use crate::surface::Rgb565;

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub display: DisplayConfig,
    pub fill: FillConfig,
    pub opacity: OpacityConfig,
}

/// Display selection and stacking configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Display device number (0 is the primary display).
    pub device: u32,
    /// Z-order layer for the overlay element; 2000 sits above the desktop.
    pub layer: i32,
}

/// Fill color configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FillConfig {
    /// Hex color string, `#RRGGBB`.
    pub color: String,
}

/// Opacity stepping configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OpacityConfig {
    /// Opacity applied when the overlay first appears.
    pub initial: u8,
    /// Amount each `j`/`k` press moves the opacity.
    pub step: u8,
    /// Wrap modulo 256 instead of saturating at 0/255.
    pub wrap: bool,
}

/// Errors that can occur during config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Parse a `#RRGGBB` hex color into RGB565.
pub fn parse_hex_color(color: &str) -> Option<Rgb565> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgb565::from_rgb(r, g, b))
}

impl FillConfig {
    /// The fill color packed as RGB565. Falls back to black if the string
    /// was never validated.
    pub fn rgb565(&self) -> Rgb565 {
        parse_hex_color(&self.color).unwrap_or(Rgb565::BLACK)
    }
}

// ── Serde intermediate structs (tolerate unknown keys) ──────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    display: RawDisplayConfig,
    fill: RawFillConfig,
    opacity: RawOpacityConfig,
}

#[derive(Deserialize)]
#[serde(default)]
struct RawDisplayConfig {
    device: u32,
    layer: i32,
}

impl Default for RawDisplayConfig {
    fn default() -> Self {
        Self {
            device: 0,
            layer: 2000,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawFillConfig {
    color: String,
}

impl Default for RawFillConfig {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct RawOpacityConfig {
    initial: u8,
    step: u8,
    wrap: bool,
}

impl Default for RawOpacityConfig {
    fn default() -> Self {
        Self {
            initial: 255,
            step: 5,
            wrap: false,
        }
    }
}

// ── Default impls ───────────────────────────────────────────────────────

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device: 0,
            layer: 2000,
        }
    }
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            color: "#000000".to_string(),
        }
    }
}

impl Default for OpacityConfig {
    fn default() -> Self {
        Self {
            initial: 255,
            step: 5,
            wrap: false,
        }
    }
}

// ── Config implementation ───────────────────────────────────────────────

impl Config {
    /// Load config from a TOML file path. Returns defaults if file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(e)),
        }
    }

    /// Parse a TOML string into a Config.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let config = Self {
            display: DisplayConfig {
                device: raw.display.device,
                layer: raw.display.layer,
            },
            fill: FillConfig {
                color: raw.fill.color,
            },
            opacity: OpacityConfig {
                initial: raw.opacity.initial,
                step: raw.opacity.step,
                wrap: raw.opacity.wrap,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the config, returning an error if any values are out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if parse_hex_color(&self.fill.color).is_none() {
            return Err(ConfigError::Validation(format!(
                "fill color '{}' is not a #RRGGBB hex color",
                self.fill.color
            )));
        }

        if self.opacity.step == 0 {
            return Err(ConfigError::Validation(
                "opacity step must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
