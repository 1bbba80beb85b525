//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Screenshot artifact settings
    #[serde(default)]
    pub screenshots: ScreenshotConfig,

    /// Engine limits
    #[serde(default)]
    pub limits: Limits,
}

/// Screenshot artifact configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScreenshotConfig {
    /// Whether the post-step screenshot callback is registered
    #[serde(default = "default_screenshots_enabled")]
    pub enabled: bool,

    /// Directory screenshots are written to
    #[serde(default = "paths::default_screenshot_dir")]
    pub dir: PathBuf,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            enabled: default_screenshots_enabled(),
            dir: paths::default_screenshot_dir(),
        }
    }
}

fn default_screenshots_enabled() -> bool {
    true
}

/// Engine limits
#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    /// Maximum nesting depth (and chain restarts) during property evaluation
    ///
    /// A `$`-binding that keeps resolving to another binding would otherwise
    /// loop forever; exceeding the limit fails the step loudly instead.
    #[serde(default = "default_evaluation_depth")]
    pub max_evaluation_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_evaluation_depth: default_evaluation_depth(),
        }
    }
}

fn default_evaluation_depth() -> usize {
    16
}

impl Config {
    /// Load configuration
    ///
    /// An explicitly supplied path must exist and parse; otherwise the
    /// default config file is used if present, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => paths::config_path().filter(|p| p.exists()),
        };

        if let Some(path) = path {
            let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            return toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()));
        }

        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.screenshots.enabled);
        assert_eq!(config.screenshots.dir, PathBuf::from("screenshots"));
        assert_eq!(config.limits.max_evaluation_depth, 16);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("[screenshots]\nenabled = false\n").unwrap();
        assert!(!config.screenshots.enabled);
        assert_eq!(config.limits.max_evaluation_depth, 16);
    }
}
