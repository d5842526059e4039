//! Crate-level error type
//!
//! Module errors (`Eip712Error`, `MessageSignError`) are converted into a
//! [`MultisigError`] at the CLI and configuration boundary.

use crate::eip712::Eip712Error;
use crate::message_signer::MessageSignError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for glue-level operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultisigError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl MultisigError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }
}

impl fmt::Display for MultisigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for MultisigError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,
    InvalidPrivateKey,

    // Typed data errors
    SchemaError,
    ValueMismatch,
    EncodingError,

    // Crypto errors
    SigningFailed,
    VerificationFailed,

    // Parse errors
    JsonError,
    HexError,

    // Configuration
    ConfigError,

    // Internal
    Internal,
}

/// Result type alias for glue-level operations
pub type MultisigResult<T> = Result<T, MultisigError>;

// Conversions from module and common error types

impl From<Eip712Error> for MultisigError {
    fn from(e: Eip712Error) -> Self {
        let code = match &e {
            Eip712Error::Schema { .. } | Eip712Error::InvalidPrimaryType(_) => ErrorCode::SchemaError,
            Eip712Error::ValueMismatch { .. } => ErrorCode::ValueMismatch,
            Eip712Error::Encoding { .. } => ErrorCode::EncodingError,
            Eip712Error::InvalidJson(_) => ErrorCode::JsonError,
            Eip712Error::InvalidSignature(_) => ErrorCode::VerificationFailed,
            Eip712Error::SigningError(_) => ErrorCode::SigningFailed,
        };
        MultisigError::new(code, e.to_string())
    }
}

impl From<MessageSignError> for MultisigError {
    fn from(e: MessageSignError) -> Self {
        match e {
            MessageSignError::Signing(inner) => inner.into(),
            MessageSignError::InvalidMessage(_) => MultisigError::invalid_input(e.to_string()),
            MessageSignError::InvalidSignature(_) | MessageSignError::RecoveryFailed(_) => {
                MultisigError::new(ErrorCode::VerificationFailed, e.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for MultisigError {
    fn from(e: serde_json::Error) -> Self {
        MultisigError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for MultisigError {
    fn from(e: hex::FromHexError) -> Self {
        MultisigError::new(ErrorCode::HexError, e.to_string())
    }
}

impl From<url::ParseError> for MultisigError {
    fn from(e: url::ParseError) -> Self {
        MultisigError::new(ErrorCode::ConfigError, format!("Invalid URL: {}", e))
    }
}

impl From<std::io::Error> for MultisigError {
    fn from(e: std::io::Error) -> Self {
        MultisigError::new(ErrorCode::Internal, e.to_string())
    }
}
