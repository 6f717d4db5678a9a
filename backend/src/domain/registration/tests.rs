//! Unit tests for the batch registration coordinator.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use argon2::Params;
use async_trait::async_trait;
use rstest::rstest;
use tokio::time::timeout;

use super::{BatchRegistrationConfig, BatchRegistrationCoordinator, partition_ranges};
use crate::domain::credential::CredentialVault;
use crate::domain::directory::UserDirectory;
use crate::domain::error::{Error, ErrorCode};
use crate::domain::ports::{FixtureUserRepository, UserPersistenceError, UserRepository};
use crate::domain::user::{NewUserRecord, RegistrationRequest, UserId, UserRecord};

fn fast_vault() -> Arc<CredentialVault> {
    Arc::new(CredentialVault::with_params(
        Params::new(8, 1, 1, None).expect("argon2 params"),
    ))
}

fn request(first: &str, last: &str, email: &str) -> RegistrationRequest {
    RegistrationRequest::try_from_parts(first, last, email, "s3cret-pw").expect("valid request")
}

fn coordinator(
    repository: Arc<dyn UserRepository>,
    config: BatchRegistrationConfig,
) -> BatchRegistrationCoordinator {
    BatchRegistrationCoordinator::new(UserDirectory::new(repository, fast_vault()), config)
}

/// Wraps the fixture store but rejects saves for one configured email.
struct EmailRejectingRepository {
    inner: FixtureUserRepository,
    reject: String,
}

#[async_trait]
impl UserRepository for EmailRejectingRepository {
    async fn save(&self, user: NewUserRecord) -> Result<UserRecord, UserPersistenceError> {
        if user.email == self.reject {
            return Err(UserPersistenceError::query("simulated storage outage"));
        }
        self.inner.save(user).await
    }

    async fn update(&self, user: UserRecord) -> Result<UserRecord, UserPersistenceError> {
        self.inner.update(user).await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, UserPersistenceError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        self.inner.find_by_email(email).await
    }

    async fn list(&self) -> Result<Vec<UserRecord>, UserPersistenceError> {
        self.inner.list().await
    }

    async fn delete(&self, id: UserId) -> Result<(), UserPersistenceError> {
        self.inner.delete(id).await
    }
}

/// Repository whose saves never complete, for deadline coverage.
struct HangingRepository;

#[async_trait]
impl UserRepository for HangingRepository {
    async fn save(&self, _user: NewUserRecord) -> Result<UserRecord, UserPersistenceError> {
        std::future::pending().await
    }

    async fn update(&self, _user: UserRecord) -> Result<UserRecord, UserPersistenceError> {
        std::future::pending().await
    }

    async fn find_by_id(&self, _id: UserId) -> Result<Option<UserRecord>, UserPersistenceError> {
        Ok(None)
    }

    async fn find_by_email(
        &self,
        _email: &str,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, UserPersistenceError> {
        Ok(Vec::new())
    }

    async fn delete(&self, _id: UserId) -> Result<(), UserPersistenceError> {
        Ok(())
    }
}

#[rstest]
#[case(5, 2, vec![0..2, 2..5])]
#[case(4, 2, vec![0..2, 2..4])]
#[case(6, 4, vec![0..1, 1..3, 3..4, 4..6])]
#[case(1, 1, vec![0..1])]
#[case(3, 3, vec![0..1, 1..2, 2..3])]
fn partitions_are_contiguous_and_disjoint(
    #[case] total: usize,
    #[case] pieces: usize,
    #[case] expected: Vec<std::ops::Range<usize>>,
) {
    assert_eq!(partition_ranges(total, pieces), expected);
}

#[tokio::test]
async fn five_requests_across_two_workers_all_register() {
    let coordinator = coordinator(
        Arc::new(FixtureUserRepository::new()),
        BatchRegistrationConfig::default(),
    );
    let batch = vec![
        request("Alice", "Smith", "alice@example.com"),
        request("Bob", "Jones", "bob@example.com"),
        request("Carol", "Miller", "carol@example.com"),
        request("Dave", "Wilson", "dave@example.com"),
        request("Erin", "Moore", "erin@example.com"),
    ];

    let outcomes = coordinator.register_batch(batch).await;
    assert_eq!(outcomes.len(), 5);

    let mut ids = BTreeSet::new();
    let mut full_names = BTreeSet::new();
    for outcome in &outcomes {
        let summary = outcome
            .result
            .as_ref()
            .unwrap_or_else(|err| panic!("{} failed: {err}", outcome.email));
        ids.insert(summary.id);
        full_names.insert(summary.full_name.clone());
    }
    assert_eq!(ids.len(), 5, "assigned ids must be distinct");
    let expected: BTreeSet<String> = [
        "Alice Smith",
        "Bob Jones",
        "Carol Miller",
        "Dave Wilson",
        "Erin Moore",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect();
    assert_eq!(full_names, expected);
}

#[tokio::test]
async fn empty_batch_returns_immediately_with_no_outcomes() {
    let coordinator = coordinator(
        Arc::new(FixtureUserRepository::new()),
        BatchRegistrationConfig::default(),
    );
    let outcomes = timeout(Duration::from_secs(1), coordinator.register_batch(Vec::new()))
        .await
        .expect("empty batch must not block");
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn per_item_failure_is_reported_without_losing_the_rest() {
    let repository = EmailRejectingRepository {
        inner: FixtureUserRepository::new(),
        reject: "carol@example.com".to_owned(),
    };
    let coordinator = coordinator(Arc::new(repository), BatchRegistrationConfig::default());
    let batch = vec![
        request("Alice", "Smith", "alice@example.com"),
        request("Bob", "Jones", "bob@example.com"),
        request("Carol", "Miller", "carol@example.com"),
        request("Dave", "Wilson", "dave@example.com"),
    ];

    let outcomes = coordinator.register_batch(batch).await;
    assert_eq!(outcomes.len(), 4, "failures must not reduce cardinality");

    let failures: Vec<_> = outcomes
        .iter()
        .filter(|outcome| outcome.result.is_err())
        .collect();
    assert_eq!(failures.len(), 1);
    let failure = failures.first().expect("one failure");
    assert_eq!(failure.email, "carol@example.com");
    assert_eq!(failure.index, 2);
    let err = failure.result.as_ref().expect_err("failure outcome");
    assert_eq!(err.code(), ErrorCode::PersistenceFailure);
}

#[tokio::test]
async fn duplicate_emails_within_a_batch_yield_one_failure() {
    let coordinator = coordinator(
        Arc::new(FixtureUserRepository::new()),
        // One worker keeps the duplicate's arrival order deterministic.
        BatchRegistrationConfig {
            worker_count: 1,
            deadline: None,
        },
    );
    let batch = vec![
        request("Alice", "Smith", "alice@example.com"),
        request("Alicia", "Smythe", "alice@example.com"),
    ];

    let outcomes = coordinator.register_batch(batch).await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.first().expect("first").result.is_ok());
    let err = outcomes
        .get(1)
        .expect("second")
        .result
        .as_ref()
        .expect_err("duplicate must fail");
    assert_eq!(err.code(), ErrorCode::PersistenceFailure);
}

#[tokio::test]
async fn single_worker_preserves_submission_order() {
    let coordinator = coordinator(
        Arc::new(FixtureUserRepository::new()),
        BatchRegistrationConfig {
            worker_count: 1,
            deadline: None,
        },
    );
    let batch = vec![
        request("Alice", "Smith", "alice@example.com"),
        request("Bob", "Jones", "bob@example.com"),
        request("Carol", "Miller", "carol@example.com"),
    ];

    let outcomes = coordinator.register_batch(batch).await;
    let indices: Vec<usize> = outcomes.iter().map(|outcome| outcome.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn worker_count_larger_than_the_batch_is_clamped() {
    let coordinator = coordinator(
        Arc::new(FixtureUserRepository::new()),
        BatchRegistrationConfig {
            worker_count: 8,
            deadline: None,
        },
    );
    let batch = vec![
        request("Alice", "Smith", "alice@example.com"),
        request("Bob", "Jones", "bob@example.com"),
        request("Carol", "Miller", "carol@example.com"),
    ];

    let outcomes = coordinator.register_batch(batch).await;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|outcome| outcome.result.is_ok()));
}

#[tokio::test]
async fn elapsed_deadline_yields_cancellation_markers_for_unfinished_items() {
    let coordinator = coordinator(
        Arc::new(HangingRepository),
        BatchRegistrationConfig {
            worker_count: 2,
            deadline: Some(Duration::from_millis(50)),
        },
    );
    let batch = vec![
        request("Alice", "Smith", "alice@example.com"),
        request("Bob", "Jones", "bob@example.com"),
        request("Carol", "Miller", "carol@example.com"),
    ];

    let outcomes = timeout(Duration::from_secs(5), coordinator.register_batch(batch))
        .await
        .expect("deadline must bound the batch");
    assert_eq!(outcomes.len(), 3, "cancellation must not reduce cardinality");
    for outcome in &outcomes {
        let err = outcome.result.as_ref().expect_err("hung item");
        assert_eq!(err, &Error::Cancelled, "{} should be cancelled", outcome.email);
    }
    let emails: BTreeSet<&str> = outcomes.iter().map(|o| o.email.as_str()).collect();
    assert_eq!(emails.len(), 3, "each marker identifies its item");
}
