//! Test source providers
//!
//! A provider inspects the raw CLI-style arguments and either produces a
//! `Test` or declines, letting the next provider (in priority order) try.

use async_trait::async_trait;

use crate::common::{Error, Result};
use crate::model::Test;

/// Test source collaborator contract
#[async_trait]
pub trait TestProvider: Send + Sync {
    /// Produce a test from the arguments, or `None` when this provider does
    /// not recognize them.
    async fn provide(&self, args: &[String]) -> Result<Option<Test>>;
}

/// Loads a test definition from a YAML file argument
pub struct YamlFileProvider;

#[async_trait]
impl TestProvider for YamlFileProvider {
    async fn provide(&self, args: &[String]) -> Result<Option<Test>> {
        let Some(path) = args.first() else {
            return Ok(None);
        };
        if !(path.ends_with(".yml") || path.ends_with(".yaml")) {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| Error::FileRead {
            path: path.clone(),
            error: e.to_string(),
        })?;

        let test: Test = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse test '{}': {}", path, e)))?;

        tracing::debug!(test = %test.name, path = %path, "Loaded test definition");
        Ok(Some(test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_declines_non_yaml_arguments() {
        let provider = YamlFileProvider;
        assert!(provider.provide(&[]).await.unwrap().is_none());
        assert!(provider
            .provide(&["test.json".to_string()])
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_loads_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "name: smoke\nsteps:\n  - type: echo\n    properties:\n      message: hi").unwrap();

        let provider = YamlFileProvider;
        let test = provider
            .provide(&[file.path().display().to_string()])
            .await
            .unwrap()
            .expect("provider should recognize the file");
        assert_eq!(test.name, "smoke");
        assert_eq!(test.steps.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let provider = YamlFileProvider;
        let err = provider
            .provide(&["definitely-not-here.yaml".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
