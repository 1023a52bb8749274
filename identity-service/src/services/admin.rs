//! Admin authority: roster operations over account records.
//!
//! Role checks happen in the middleware layer before any of these run; every
//! method here assumes an already-authorized admin caller.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::{Account, Role};
use crate::store::AccountStore;

#[derive(Clone)]
pub struct AdminService {
    store: Arc<dyn AccountStore>,
}

impl AdminService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Current roster, newest-created first. Re-reads the store on each call.
    pub async fn list_users(&self) -> Result<Vec<Account>, ServiceError> {
        Ok(self.store.list_accounts().await?)
    }

    /// Change the target's role. The role has already been parsed against the
    /// closed enum, so the only remaining failure is an unknown target.
    #[tracing::instrument(skip(self))]
    pub async fn set_role(&self, target: Uuid, role: Role) -> Result<(), ServiceError> {
        self.store.update_role(target, role).await?;
        tracing::info!(account_id = %target, role = role.as_str(), "Role updated");
        Ok(())
    }

    /// Remove an account and cascade-invalidate everything referencing it, so
    /// a deleted identity cannot keep acting through a stale token.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, target: Uuid) -> Result<(), ServiceError> {
        self.store.delete_account(target).await?;
        self.store.remove_sessions_for_account(target).await?;
        self.store.remove_challenge(target).await?;
        tracing::info!(account_id = %target, "Account deleted, sessions and challenges revoked");
        Ok(())
    }
}
