//! Domain services, models, and ports for user onboarding.
//!
//! Purpose: credential hashing and verification, bearer-identity extraction,
//! the user lifecycle service, and the concurrent batch registration
//! pipeline. Transport encoding and the storage engine live behind ports in
//! external adapters.
//!
//! Public surface:
//! - [`CredentialVault`] — one-way secret hashing and verification.
//! - [`IdentityTokenReader`] — authenticated subject extraction from bearer
//!   credentials.
//! - [`UserDirectory`] — single-request registration, lookup, and login.
//! - [`BatchRegistrationCoordinator`] — fan-out/fan-in batch onboarding.

pub mod credential;
pub mod directory;
pub mod error;
pub mod identity;
pub mod ports;
pub mod registration;
pub mod user;

pub use self::credential::{Credential, CredentialError, CredentialVault};
pub use self::directory::UserDirectory;
pub use self::error::{Error, ErrorCode};
pub use self::identity::{IdentityClaim, IdentityTokenReader, TokenError, TokenSigningConfig};
pub use self::registration::{
    BatchRegistrationConfig, BatchRegistrationCoordinator, RegistrationOutcome,
};
pub use self::user::{
    NewUserRecord, RegistrationRequest, UpdateUserRequest, UserId, UserRecord, UserSummary,
    UserValidationError,
};
