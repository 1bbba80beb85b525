//! Screenshot persistence
//!
//! Screenshots are captured by a post-step callback and handed to a sink;
//! the built-in sink writes PNG files named
//! `<testName>-<stepPath>-<stepName>[-<suffix>].png` under a configurable
//! directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::common::Result;

/// Screenshot collaborator contract
#[async_trait]
pub trait ScreenshotSink: Send + Sync {
    /// Persist captured image data for a step; returns the artifact path
    async fn save(
        &self,
        image: &[u8],
        test_name: &str,
        step_path: &str,
        step_name: &str,
        suffix: Option<&str>,
    ) -> Result<PathBuf>;
}

/// Writes screenshots to a directory on disk
pub struct FsScreenshotSink {
    dir: PathBuf,
}

impl FsScreenshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(test_name: &str, step_path: &str, step_name: &str, suffix: Option<&str>) -> String {
        let base = match suffix {
            Some(suffix) => format!("{test_name}-{step_path}-{step_name}-{suffix}"),
            None => format!("{test_name}-{step_path}-{step_name}"),
        };
        format!("{}.png", sanitize(&base))
    }
}

/// Replace path separators and other unsafe characters in artifact names
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[async_trait]
impl ScreenshotSink for FsScreenshotSink {
    async fn save(
        &self,
        image: &[u8],
        test_name: &str,
        step_path: &str,
        step_name: &str,
        suffix: Option<&str>,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self
            .dir
            .join(Self::file_name(test_name, step_path, step_name, suffix));
        tokio::fs::write(&path, image).await?;
        tracing::debug!(path = %path.display(), "Saved screenshot");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_naming() {
        assert_eq!(
            FsScreenshotSink::file_name("login", "3.2", "Click button", None),
            "login-3.2-Click button.png"
        );
        assert_eq!(
            FsScreenshotSink::file_name("login", "3.2", "Click button", Some("failed")),
            "login-3.2-Click button-failed.png"
        );
        assert_eq!(
            FsScreenshotSink::file_name("a/b", "1", "x:y", None),
            "a_b-1-x_y.png"
        );
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsScreenshotSink::new(dir.path().join("shots"));
        let path = sink
            .save(b"png-bytes", "t", "1", "Open page", Some("after"))
            .await
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "t-1-Open page-after.png"
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
    }
}
