//! Account store abstraction.
//!
//! The durable persistence layer is an external collaborator; the core only
//! talks to it through [`AccountStore`]. The trait also carries the keyed
//! challenge and session records so replace-on-write and cascade invalidation
//! stay behind the store's per-record consistency.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{Account, PendingChallenge, Role, Session};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account not found")]
    AccountNotFound,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound => ServiceError::NotFound("Account not found".to_string()),
            StoreError::DuplicateEmail => ServiceError::DuplicateEmail,
            StoreError::Backend(e) => ServiceError::Internal(e),
        }
    }
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account. Fails with `DuplicateEmail` if the email is
    /// already registered to another account.
    async fn create_account(&self, account: Account) -> Result<Account, StoreError>;

    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn update_role(&self, account_id: Uuid, role: Role) -> Result<(), StoreError>;

    async fn delete_account(&self, account_id: Uuid) -> Result<(), StoreError>;

    /// All accounts, newest-created first. Best-effort snapshot; each call
    /// re-reads current state.
    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError>;

    /// Write a challenge keyed by its account, atomically superseding any
    /// prior challenge for that account.
    async fn put_challenge(&self, challenge: PendingChallenge) -> Result<(), StoreError>;

    async fn find_challenge(&self, account_id: Uuid)
        -> Result<Option<PendingChallenge>, StoreError>;

    /// Bump the attempt counter on the stored challenge, if one exists.
    async fn record_attempt(&self, account_id: Uuid) -> Result<(), StoreError>;

    async fn remove_challenge(&self, account_id: Uuid) -> Result<(), StoreError>;

    async fn insert_session(&self, session: Session) -> Result<(), StoreError>;

    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Idempotent; removing an unknown token is not an error.
    async fn remove_session(&self, token: &str) -> Result<(), StoreError>;

    /// Drop every session owned by the account. Used by the delete cascade.
    async fn remove_sessions_for_account(&self, account_id: Uuid) -> Result<(), StoreError>;
}
