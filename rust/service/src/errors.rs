/// Error handling for kittens_service
///
/// This module provides:
/// - The service error type wrapping game and store failures
/// - A uniform error response shape for callers
/// - Severity-based logging of rejections
use kittens_engine::errors::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::settings::SettingsError;
use crate::store::StoreError;

/// Standard error shape returned to callers of the game manager
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "not_your_turn")
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (structured data)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Rejected requests - expected, normal operation
    Client,
    /// Backend failures - unexpected, needs investigation
    Server,
    /// Broken game invariants - state integrity at risk
    Critical,
}

/// Conversion of errors into responses with severity-based logging
pub trait IntoErrorResponse {
    /// Machine-readable error code
    fn error_code(&self) -> &'static str;

    /// Human-readable error message
    fn error_message(&self) -> String;

    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    fn severity(&self) -> ErrorSeverity;

    fn to_error_response(&self) -> ErrorResponse {
        if let Some(details) = self.error_details() {
            ErrorResponse::with_details(self.error_code(), self.error_message(), details)
        } else {
            ErrorResponse::new(self.error_code(), self.error_message())
        }
    }

    /// Logs the error at the level its severity calls for and returns the
    /// response.
    fn log_and_respond(&self) -> ErrorResponse {
        let response = self.to_error_response();
        match self.severity() {
            ErrorSeverity::Client => {
                tracing::info!(error = %response.error, reason = %response.message, "request rejected")
            }
            ErrorSeverity::Server => {
                tracing::error!(error = %response.error, reason = %response.message, "service error")
            }
            ErrorSeverity::Critical => {
                tracing::error!(error = %response.error, reason = %response.message, critical = true, "critical error")
            }
        }
        response
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("Failed to encode document: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Stored game {0} could not be decoded: {1}")]
    CorruptDocument(String, String),
    #[error("Agent chain exceeded {0} turns")]
    ChainLimit(u32),
    #[error("Game lock poisoned")]
    LockPoisoned,
}

impl IntoErrorResponse for GameError {
    fn error_code(&self) -> &'static str {
        self.kind()
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            GameError::NotYourTurn { expected, actual } => {
                Some(serde_json::json!({ "expected": expected, "actual": actual }))
            }
            GameError::CardIndexOutOfRange { index, hand_size } => {
                Some(serde_json::json!({ "index": index, "handSize": hand_size }))
            }
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        if self.is_fatal() {
            ErrorSeverity::Critical
        } else {
            ErrorSeverity::Client
        }
    }
}

impl IntoErrorResponse for ServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Game(err) => err.error_code(),
            ServiceError::Store(StoreError::NotFound(_)) => "document_not_found",
            ServiceError::Store(_) => "store_error",
            ServiceError::Settings(_) => "invalid_settings",
            ServiceError::Encode(_) => "encode_error",
            ServiceError::CorruptDocument(..) => "corrupt_document",
            ServiceError::ChainLimit(_) => "agent_chain_limit",
            ServiceError::LockPoisoned => "lock_poisoned",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            ServiceError::Game(err) => err.error_details(),
            _ => None,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            ServiceError::Game(err) => err.severity(),
            ServiceError::Settings(_) => ErrorSeverity::Client,
            ServiceError::CorruptDocument(..) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Server,
        }
    }
}
