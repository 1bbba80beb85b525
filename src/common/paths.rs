//! Standard filesystem locations

use directories::ProjectDirs;
use std::path::PathBuf;

/// Project directories for config lookup
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "testflow")
}

/// Path to the configuration file (`testflow.toml` in the user config dir)
pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("testflow.toml"))
}

/// Default directory for screenshot artifacts
pub fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("screenshots")
}
