//! User lifecycle service: registration, lookup, update, removal, and login.
//!
//! Single-request counterpart of the batch registration pipeline; the batch
//! workers route every item through [`UserDirectory::register`] so both paths
//! share one hashing and persistence flow.

use std::sync::Arc;

use tracing::debug;
use zeroize::Zeroizing;

use super::credential::{Credential, CredentialError, CredentialVault};
use super::error::Error;
use super::ports::UserRepository;
use super::user::{
    NewUserRecord, RegistrationRequest, UpdateUserRequest, UserId, UserRecord, UserSummary,
};

/// Domain service for user lifecycle operations.
///
/// Cheap to clone; the batch coordinator hands one clone to each worker.
#[derive(Clone)]
pub struct UserDirectory {
    repository: Arc<dyn UserRepository>,
    vault: Arc<CredentialVault>,
}

impl UserDirectory {
    /// Build a directory over a repository and a credential vault.
    pub fn new(repository: Arc<dyn UserRepository>, vault: Arc<CredentialVault>) -> Self {
        Self { repository, vault }
    }

    /// Register one user: derive a credential, persist, project a summary.
    pub async fn register(&self, request: RegistrationRequest) -> Result<UserSummary, Error> {
        let credential = self.hash_off_runtime(request.password()).await?;
        let record = self
            .repository
            .save(NewUserRecord {
                first_name: request.first_name().to_owned(),
                last_name: request.last_name().to_owned(),
                email: request.email().to_owned(),
                credential,
            })
            .await?;
        debug!(user_id = %record.id, "registered user");
        Ok(UserSummary::from_record(&record))
    }

    /// List every stored user as an outward-facing summary.
    pub async fn list(&self) -> Result<Vec<UserSummary>, Error> {
        let records = self.repository.list().await?;
        Ok(records.iter().map(UserSummary::from_record).collect())
    }

    /// Fetch one user's summary.
    pub async fn detail(&self, id: UserId) -> Result<UserSummary, Error> {
        let record = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(Error::UserNotFound(id))?;
        Ok(UserSummary::from_record(&record))
    }

    /// Replace a user's profile fields and credential.
    ///
    /// The supplied password is always re-hashed and stored, even when it
    /// matches the current one; callers wanting to keep the password must
    /// resend it.
    pub async fn update(&self, request: UpdateUserRequest) -> Result<UserSummary, Error> {
        let current = self
            .repository
            .find_by_id(request.id())
            .await?
            .ok_or(Error::UserNotFound(request.id()))?;

        let profile = request.profile();
        let credential = self.hash_off_runtime(profile.password()).await?;
        let record = self
            .repository
            .update(UserRecord {
                id: request.id(),
                first_name: profile.first_name().to_owned(),
                last_name: profile.last_name().to_owned(),
                email: profile.email().to_owned(),
                credential,
                created_at: current.created_at,
            })
            .await?;
        debug!(user_id = %record.id, "updated user");
        Ok(UserSummary::from_record(&record))
    }

    /// Remove a user.
    pub async fn remove(&self, id: UserId) -> Result<(), Error> {
        self.repository.delete(id).await?;
        Ok(())
    }

    /// Authenticate by email and plaintext password, returning the stored
    /// record on success.
    ///
    /// An unknown email and a wrong password both fail with
    /// [`CredentialError::Mismatch`] so callers cannot probe which emails
    /// exist.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserRecord, Error> {
        let record = self
            .repository
            .find_by_email(email)
            .await?
            .ok_or(Error::Credential(CredentialError::Mismatch))?;
        self.verify_off_runtime(record.credential.clone(), password)
            .await?;
        Ok(record)
    }

    /// Hash on the blocking pool: Argon2 is CPU-bound and would otherwise
    /// stall the async runtime threads.
    async fn hash_off_runtime(&self, plaintext: &str) -> Result<Credential, Error> {
        let vault = Arc::clone(&self.vault);
        let plaintext = Zeroizing::new(plaintext.to_owned());
        let derived = tokio::task::spawn_blocking(move || vault.hash(&plaintext))
            .await
            .map_err(|source| CredentialError::Hashing {
                message: source.to_string(),
            })?;
        Ok(derived?)
    }

    async fn verify_off_runtime(&self, stored: Credential, candidate: &str) -> Result<(), Error> {
        let vault = Arc::clone(&self.vault);
        let candidate = Zeroizing::new(candidate.to_owned());
        let outcome = tokio::task::spawn_blocking(move || vault.verify(&stored, &candidate))
            .await
            .map_err(|source| CredentialError::Hashing {
                message: source.to_string(),
            })?;
        Ok(outcome?)
    }
}
