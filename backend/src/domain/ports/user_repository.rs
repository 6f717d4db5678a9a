//! Port abstraction for user persistence adapters and their errors.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::{NewUserRecord, UserId, UserRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another record already owns the requested email address.
        DuplicateEmail { email: String } => "a user with email {email} already exists",
    }
}

/// Port for user persistence adapters.
///
/// Implementations must be safe for concurrent invocation: the batch
/// registration workers call [`UserRepository::save`] from several tasks at
/// once without external serialization.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and return the stored record with its assigned id.
    async fn save(&self, user: NewUserRecord) -> Result<UserRecord, UserPersistenceError>;

    /// Replace the stored record identified by `user.id`.
    async fn update(&self, user: UserRecord) -> Result<UserRecord, UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, UserPersistenceError>;

    /// Fetch a user by unique email address.
    async fn find_by_email(&self, email: &str)
    -> Result<Option<UserRecord>, UserPersistenceError>;

    /// List all stored users.
    async fn list(&self) -> Result<Vec<UserRecord>, UserPersistenceError>;

    /// Remove a user. Deleting an absent id is a no-op.
    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError>;
}

/// In-memory repository used by tests and development wiring.
///
/// Assigns ids from a monotonically increasing sequence and enforces email
/// uniqueness the way the production store's unique index would.
#[derive(Debug)]
pub struct FixtureUserRepository {
    users: Mutex<HashMap<i64, UserRecord>>,
    next_id: AtomicI64,
}

impl FixtureUserRepository {
    /// Empty repository whose first assigned id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn store(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, UserRecord>>, UserPersistenceError>
    {
        self.users
            .lock()
            .map_err(|_| UserPersistenceError::connection("user store mutex poisoned"))
    }
}

impl Default for FixtureUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn save(&self, user: NewUserRecord) -> Result<UserRecord, UserPersistenceError> {
        let mut users = self.store()?;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(UserPersistenceError::duplicate_email(user.email));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = UserRecord {
            id: UserId::new(id),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            credential: user.credential,
            created_at: Utc::now(),
        };
        users.insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, user: UserRecord) -> Result<UserRecord, UserPersistenceError> {
        let mut users = self.store()?;
        if users
            .values()
            .any(|existing| existing.email == user.email && existing.id != user.id)
        {
            return Err(UserPersistenceError::duplicate_email(user.email));
        }
        if !users.contains_key(&user.id.get()) {
            return Err(UserPersistenceError::query(format!(
                "no stored user with id {}",
                user.id
            )));
        }
        users.insert(user.id.get(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, UserPersistenceError> {
        Ok(self.store()?.get(&id.get()).cloned())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        Ok(self
            .store()?
            .values()
            .find(|record| record.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, UserPersistenceError> {
        let mut records: Vec<UserRecord> = self.store()?.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError> {
        self.store()?.remove(&id.get());
        Ok(())
    }
}
