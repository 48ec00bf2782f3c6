//! Error types for the CLI application.
//!
//! Every command handler returns `Result<(), CliError>`; [`crate::run`] maps
//! the error to an exit code.

use kittens_service::{IntoErrorResponse, ServiceError, SettingsError};
use std::fmt;

/// Custom error type for CLI operations.
#[derive(Debug)]
pub enum CliError {
    /// I/O error (file operations, stdout/stderr writes, etc.)
    Io(std::io::Error),

    /// Invalid user input or command-line arguments
    InvalidInput(String),

    /// Configuration error
    Config(String),

    /// Game manager or store failure
    Service(ServiceError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Service(e) => write!(f, "Game error: {}", e.to_error_response()),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Service(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        CliError::Io(error)
    }
}

impl From<ServiceError> for CliError {
    fn from(error: ServiceError) -> Self {
        CliError::Service(error)
    }
}

impl From<SettingsError> for CliError {
    fn from(error: SettingsError) -> Self {
        CliError::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kittens_engine::errors::GameError;

    #[test]
    fn service_errors_keep_their_message() {
        let err = CliError::from(ServiceError::from(GameError::EmptyDeck));
        assert_eq!(err.to_string(), "Game error: empty_deck: Deck is empty");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn settings_errors_become_config_errors() {
        let err = CliError::from(SettingsError::InvalidValue("bad".into()));
        assert!(matches!(err, CliError::Config(_)));
    }
}
