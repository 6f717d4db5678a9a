//! User data model and validated registration inputs.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use zeroize::Zeroizing;

use super::credential::Credential;

/// Domain error returned when registration or update payload values are
/// invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// First name was missing or blank once trimmed.
    EmptyFirstName,
    /// Last name was missing or blank once trimmed.
    EmptyLastName,
    /// Email did not have a local part and a domain separated by `@`.
    InvalidEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFirstName => write!(f, "first name must not be empty"),
            Self::EmptyLastName => write!(f, "last name must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier assigned by the persistence collaborator on
/// creation and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a repository-assigned identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw integer value for persistence adapters.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

fn validate_email(email: &str) -> Result<&str, UserValidationError> {
    let normalized = email.trim();
    match normalized.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(normalized),
        _ => Err(UserValidationError::InvalidEmail),
    }
}

fn validate_name(name: &str, on_empty: UserValidationError) -> Result<&str, UserValidationError> {
    let normalized = name.trim();
    if normalized.is_empty() {
        return Err(on_empty);
    }
    Ok(normalized)
}

/// Validated request to register one new user.
///
/// ## Invariants
/// - Names and email are trimmed and non-empty; the email carries a local
///   part and a domain.
/// - The plaintext password is non-empty, retains caller whitespace, and is
///   zeroed on drop. It never appears in `Debug` output.
///
/// # Examples
/// ```
/// use backend::domain::RegistrationRequest;
///
/// let request =
///     RegistrationRequest::try_from_parts("Alice", "Smith", "alice@example.com", "hunter2")
///         .unwrap();
/// assert_eq!(request.email(), "alice@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    first_name: String,
    last_name: String,
    email: String,
    password: Zeroizing<String>,
}

impl RegistrationRequest {
    /// Construct a request from raw inbound strings.
    pub fn try_from_parts(
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, UserValidationError> {
        let first_name = validate_name(first_name, UserValidationError::EmptyFirstName)?;
        let last_name = validate_name(last_name, UserValidationError::EmptyLastName)?;
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }

        Ok(Self {
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Given name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Family name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }

    /// Email address used as the unique login handle.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Plaintext password supplied by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated request to replace an existing user's profile and credential.
///
/// The password is mandatory: the stored credential is always re-derived from
/// it, so callers wishing to keep the current password must resend it.
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateUserRequest {
    id: UserId,
    profile: RegistrationRequest,
}

impl UpdateUserRequest {
    /// Construct an update for `id` from raw inbound strings.
    pub fn try_from_parts(
        id: UserId,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, UserValidationError> {
        let profile = RegistrationRequest::try_from_parts(first_name, last_name, email, password)?;
        Ok(Self { id, profile })
    }

    /// Identifier of the user being updated.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Replacement profile fields and password.
    #[must_use]
    pub fn profile(&self) -> &RegistrationRequest {
        &self.profile
    }
}

impl fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("id", &self.id)
            .field("profile", &self.profile)
            .finish()
    }
}

/// New user payload handed to the repository, credential already derived.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Unique email address.
    pub email: String,
    /// One-way-derived credential for the account.
    pub credential: Credential,
}

/// Persisted user record owned by the persistence collaborator.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Repository-assigned identifier.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Unique email address.
    pub email: String,
    /// One-way-derived credential for the account.
    pub credential: Credential,
    /// Creation timestamp assigned by the repository.
    pub created_at: DateTime<Utc>,
}

/// Output-only projection of a persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Repository-assigned identifier.
    pub id: UserId,
    /// Given and family name joined with a single space.
    pub full_name: String,
    /// Email address.
    pub email: String,
}

impl UserSummary {
    /// Project a persisted record into its outward-facing summary.
    #[must_use]
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            id: record.id,
            full_name: format!("{} {}", record.first_name, record.last_name),
            email: record.email.clone(),
        }
    }
}
