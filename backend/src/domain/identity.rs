//! Authenticated-subject extraction from bearer credentials.
//!
//! The reader validates a signed bearer token carried in a request's
//! authorization header and returns the embedded subject id. Signing
//! configuration is injected at construction time so tests can use distinct
//! keys; there is no ambient process-global state.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::user::UserId;

/// Errors raised while extracting an identity from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// No authorization header was attached to the request.
    #[error("request carries no bearer credential")]
    Missing,
    /// The header or token could not be parsed as a bearer credential.
    #[error("bearer credential is malformed: {message}")]
    Malformed {
        /// Parse failure description.
        message: String,
    },
    /// The token is past its validity window.
    #[error("bearer credential has expired")]
    Expired,
    /// The token signature does not match the signing key.
    #[error("bearer credential signature is invalid")]
    InvalidSignature,
}

/// Read-only signing configuration, loaded once at startup and injected into
/// every component that validates bearer credentials.
pub struct TokenSigningConfig {
    secret: Zeroizing<Vec<u8>>,
    leeway_seconds: u64,
}

impl TokenSigningConfig {
    /// Configuration for an HMAC signing secret with strict expiry.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            leeway_seconds: 0,
        }
    }

    /// Allow a clock-skew grace period when checking expiry.
    #[must_use]
    pub fn with_leeway_seconds(mut self, seconds: u64) -> Self {
        self.leeway_seconds = seconds;
        self
    }
}

/// Authenticated caller identity derived from a bearer credential.
///
/// Valid only for the lifetime of the request it was extracted from; never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    /// Numeric subject id embedded in the token.
    pub subject_id: UserId,
}

/// Claims this backend signs into bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
struct BearerClaims {
    sub: i64,
    exp: i64,
}

/// Validates bearer credentials and extracts the caller's subject id.
///
/// Stateless apart from the injected signing configuration; performs no I/O.
pub struct IdentityTokenReader {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl IdentityTokenReader {
    /// Build a reader bound to one signing configuration.
    #[must_use]
    pub fn new(config: &TokenSigningConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        Self {
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
        }
    }

    /// Extract the authenticated subject from an authorization header value.
    ///
    /// `authorization` is the raw header as carried by the (external)
    /// request type; `None` means the header was absent. Fails with
    /// [`TokenError::Missing`], [`TokenError::Malformed`],
    /// [`TokenError::Expired`], or [`TokenError::InvalidSignature`].
    pub fn extract_identity(
        &self,
        authorization: Option<&str>,
    ) -> Result<IdentityClaim, TokenError> {
        let header = authorization.ok_or(TokenError::Missing)?;
        let token = bearer_token(header)?;
        let data = decode::<BearerClaims>(token, &self.decoding_key, &self.validation).map_err(
            |source| match source.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed {
                    message: source.to_string(),
                },
            },
        )?;
        Ok(IdentityClaim {
            subject_id: UserId::new(data.claims.sub),
        })
    }
}

/// Split the bearer scheme off an authorization header value.
fn bearer_token(header: &str) -> Result<&str, TokenError> {
    match header.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(TokenError::Malformed {
            message: "authorization header is not a bearer credential".to_owned(),
        }),
    }
}
