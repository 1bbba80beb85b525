//! Error types for the test-step orchestration engine
//!
//! Every failure below the test-runner facade is surfaced as a value of this
//! type; the facade is the single point that turns a failure into a `false`
//! run result plus a logged message.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the orchestration engine
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("Missing required property '{property}' for action '{action}'")]
    MissingProperty { action: String, property: String },

    // === Expression Errors ===
    #[error("Cannot resolve expression '{0}' against the variable store")]
    UnresolvedExpression(String),

    #[error("Property evaluation exceeded the depth limit of {0}")]
    EvaluationDepth(usize),

    // === Step Errors ===
    #[error("Step #{path} {name} has failed: {source}")]
    Step {
        path: String,
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    Action(String),

    // === Extension Errors ===
    #[error("Extension '{name}' failed to initialize: {source}")]
    Extension {
        name: String,
        #[source]
        source: Box<Error>,
    },

    // === Provider Errors ===
    #[error("No test provider recognized the supplied arguments")]
    NoProvider,

    // === Session Errors ===
    #[error("No session is currently active")]
    NoSession,

    #[error("Session {0} not found")]
    SessionNotFound(u32),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap a failure with the context of the step it occurred in
    ///
    /// The composed message reads `Step #<path> <name> has failed: <cause>`.
    pub fn step(path: &str, name: &str, cause: Error) -> Self {
        Self::Step {
            path: path.to_string(),
            name: name.to_string(),
            source: Box::new(cause),
        }
    }

    /// Create a missing required property error
    pub fn missing_property(action: &str, property: &str) -> Self {
        Self::MissingProperty {
            action: action.to_string(),
            property: property.to_string(),
        }
    }

    /// Create an extension initialization error
    pub fn extension(name: &str, cause: Error) -> Self {
        Self::Extension {
            name: name.to_string(),
            source: Box::new(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_error_message() {
        let err = Error::step("3.2", "Click button", Error::Action("element not found".into()));
        assert_eq!(
            err.to_string(),
            "Step #3.2 Click button has failed: element not found"
        );
    }

    #[test]
    fn test_nested_step_error_message() {
        let inner = Error::step("2.1", "Set variable", Error::UnknownOption("set-varible".into()));
        let outer = Error::step("2", "Group", inner);
        assert_eq!(
            outer.to_string(),
            "Step #2 Group has failed: Step #2.1 Set variable has failed: unknown option 'set-varible'"
        );
    }
}
