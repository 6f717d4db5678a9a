//! One-way credential derivation and verification.
//!
//! Secrets are hashed with Argon2id into PHC-format strings. The salt and
//! cost parameters are embedded in the output, so verification needs nothing
//! beyond the stored digest and the candidate secret.

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

/// Errors raised by credential hashing and verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// The hashing transform could not produce output.
    #[error("credential hashing failed: {message}")]
    Hashing {
        /// Underlying transform failure description.
        message: String,
    },
    /// A stored credential was not a well-formed digest.
    #[error("stored credential is not a well-formed digest")]
    InvalidFormat,
    /// The candidate secret does not match the stored credential.
    #[error("candidate secret does not match the stored credential")]
    Mismatch,
}

/// Opaque, storage-safe representation of a secret.
///
/// ## Invariants
/// - Never reversible and never rendered by `Debug`.
/// - Carries no equality or ordering: the only way to compare a credential
///   with anything is [`CredentialVault::verify`] against a plaintext
///   candidate.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Reconstruct a credential loaded from storage, validating that the
    /// digest is well-formed PHC syntax.
    pub fn from_phc_string(digest: impl Into<String>) -> Result<Self, CredentialError> {
        let digest = digest.into();
        PasswordHash::new(&digest).map_err(|_| CredentialError::InvalidFormat)?;
        Ok(Self(digest))
    }

    /// PHC-format digest for persistence adapters. Storage only; never log
    /// this value.
    #[must_use]
    pub fn as_phc_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Argon2id-backed hashing and verification of plaintext secrets.
///
/// Cheap to clone and safe to share across registration workers; hashing
/// cost is CPU-bound, so async callers should move calls off the runtime
/// threads (see `UserDirectory`).
#[derive(Clone)]
pub struct CredentialVault {
    hasher: Argon2<'static>,
}

impl CredentialVault {
    /// Vault with the library-default Argon2id cost parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hasher: Argon2::default(),
        }
    }

    /// Vault with explicit cost parameters. Lower costs are useful in tests;
    /// production wiring should keep the defaults or raise them.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self {
            hasher: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        }
    }

    /// Derive a storage-safe credential from a plaintext secret.
    ///
    /// A fresh random salt is generated per call, so hashing the same secret
    /// twice yields different digests that both verify.
    pub fn hash(&self, plaintext: &str) -> Result<Credential, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .hasher
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|source| CredentialError::Hashing {
                message: source.to_string(),
            })?;
        Ok(Credential(digest.to_string()))
    }

    /// Check a candidate secret against a stored credential.
    ///
    /// Recomputes the transform with the salt and parameters embedded in
    /// `stored` and compares in constant time; a mismatch is reported only
    /// through the returned kind, never through timing. Fails
    /// [`CredentialError::Mismatch`] on a wrong candidate and
    /// [`CredentialError::InvalidFormat`] when the stored digest cannot be
    /// parsed.
    pub fn verify(&self, stored: &Credential, candidate: &str) -> Result<(), CredentialError> {
        let parsed =
            PasswordHash::new(stored.as_phc_str()).map_err(|_| CredentialError::InvalidFormat)?;
        self.hasher
            .verify_password(candidate.as_bytes(), &parsed)
            .map_err(|source| match source {
                argon2::password_hash::Error::Password => CredentialError::Mismatch,
                _ => CredentialError::InvalidFormat,
            })
    }
}

impl Default for CredentialVault {
    fn default() -> Self {
        Self::new()
    }
}
