//! Domain-level error types.
//!
//! These errors are transport agnostic. Inbound adapters map the stable
//! [`ErrorCode`] onto HTTP responses or any other protocol-specific envelope.

use serde::Serialize;

use super::credential::CredentialError;
use super::identity::TokenError;
use super::ports::UserPersistenceError;
use super::user::{UserId, UserValidationError};

/// Stable machine-readable code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// The hashing transform could not produce output.
    HashingFailure,
    /// A stored credential was not a well-formed digest.
    InvalidCredentialFormat,
    /// A candidate secret did not match the stored credential.
    CredentialMismatch,
    /// No bearer credential was attached to the request.
    MissingToken,
    /// The bearer credential could not be parsed.
    MalformedToken,
    /// The bearer credential is past its validity window.
    ExpiredToken,
    /// The bearer credential signature check failed.
    InvalidSignature,
    /// The persistence collaborator reported a failure.
    PersistenceFailure,
    /// Inbound payload values failed validation.
    InvalidRequest,
    /// The requested user does not exist.
    UserNotFound,
    /// The operation was abandoned before completion.
    Cancelled,
}

/// Unified domain error raised by services and the batch pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Credential hashing or verification failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
    /// Bearer-credential validation failed.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// The persistence collaborator failed.
    #[error(transparent)]
    Persistence(#[from] UserPersistenceError),
    /// Inbound payload values failed validation.
    #[error(transparent)]
    Validation(#[from] UserValidationError),
    /// No user exists with the given id.
    #[error("no user with id {0}")]
    UserNotFound(UserId),
    /// A deadline or shutdown signal fired before the operation ran.
    #[error("operation abandoned before completion")]
    Cancelled,
}

impl Error {
    /// Stable machine-readable code for adapters.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Credential(CredentialError::Hashing { .. }) => ErrorCode::HashingFailure,
            Self::Credential(CredentialError::InvalidFormat) => ErrorCode::InvalidCredentialFormat,
            Self::Credential(CredentialError::Mismatch) => ErrorCode::CredentialMismatch,
            Self::Token(TokenError::Missing) => ErrorCode::MissingToken,
            Self::Token(TokenError::Malformed { .. }) => ErrorCode::MalformedToken,
            Self::Token(TokenError::Expired) => ErrorCode::ExpiredToken,
            Self::Token(TokenError::InvalidSignature) => ErrorCode::InvalidSignature,
            Self::Persistence(_) => ErrorCode::PersistenceFailure,
            Self::Validation(_) => ErrorCode::InvalidRequest,
            Self::UserNotFound(_) => ErrorCode::UserNotFound,
            Self::Cancelled => ErrorCode::Cancelled,
        }
    }
}
