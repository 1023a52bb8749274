//! In-process reference implementation of [`AccountStore`] over `dashmap`.
//!
//! Per-key atomicity comes from the map's entry API: challenge writes for the
//! same account serialize on the shard lock, which is exactly the per-record
//! consistency the core requires.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::models::{Account, PendingChallenge, Role, Session};

#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<Uuid, Account>,
    /// Email uniqueness index: normalized email -> account id.
    emails: DashMap<String, Uuid>,
    /// At most one challenge per account; keyed by account id.
    challenges: DashMap<Uuid, PendingChallenge>,
    sessions: DashMap<String, Session>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, account: Account) -> Result<Account, StoreError> {
        // The email index entry is the uniqueness gate; the account record is
        // only written while the index shard is held.
        match self.emails.entry(account.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                slot.insert(account.account_id);
                self.accounts.insert(account.account_id, account.clone());
                Ok(account)
            }
        }
    }

    async fn find_account(&self, account_id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(&account_id).map(|a| a.clone()))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let Some(id) = self.emails.get(email).map(|e| *e) else {
            return Ok(None);
        };
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn update_role(&self, account_id: Uuid, role: Role) -> Result<(), StoreError> {
        match self.accounts.get_mut(&account_id) {
            Some(mut account) => {
                account.role = role;
                Ok(())
            }
            None => Err(StoreError::AccountNotFound),
        }
    }

    async fn delete_account(&self, account_id: Uuid) -> Result<(), StoreError> {
        let Some((_, account)) = self.accounts.remove(&account_id) else {
            return Err(StoreError::AccountNotFound);
        };
        self.emails.remove(&account.email);
        Ok(())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut accounts: Vec<Account> = self.accounts.iter().map(|a| a.clone()).collect();
        accounts.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(accounts)
    }

    async fn put_challenge(&self, challenge: PendingChallenge) -> Result<(), StoreError> {
        // Insert replaces in place under the shard lock, superseding any
        // outstanding challenge for this account.
        self.challenges.insert(challenge.account_id, challenge);
        Ok(())
    }

    async fn find_challenge(
        &self,
        account_id: Uuid,
    ) -> Result<Option<PendingChallenge>, StoreError> {
        Ok(self.challenges.get(&account_id).map(|c| c.clone()))
    }

    async fn record_attempt(&self, account_id: Uuid) -> Result<(), StoreError> {
        if let Some(mut challenge) = self.challenges.get_mut(&account_id) {
            challenge.attempt_count += 1;
        }
        Ok(())
    }

    async fn remove_challenge(&self, account_id: Uuid) -> Result<(), StoreError> {
        self.challenges.remove(&account_id);
        Ok(())
    }

    async fn insert_session(&self, session: Session) -> Result<(), StoreError> {
        self.sessions.insert(session.token.clone(), session);
        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(token).map(|s| s.clone()))
    }

    async fn remove_session(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn remove_sessions_for_account(&self, account_id: Uuid) -> Result<(), StoreError> {
        self.sessions.retain(|_, s| s.account_id != account_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_account_rejects_duplicate_email() {
        let store = MemoryStore::new();
        let first = Account::new("ann@example.com".to_string(), Some("Ann".to_string()));
        store.create_account(first).await.unwrap();

        let second = Account::new("ann@example.com".to_string(), Some("Other Ann".to_string()));
        let err = store.create_account(second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn delete_frees_the_email_for_reuse() {
        let store = MemoryStore::new();
        let account = Account::new("bob@example.com".to_string(), None);
        let id = store.create_account(account).await.unwrap().account_id;
        store.delete_account(id).await.unwrap();

        let again = Account::new("bob@example.com".to_string(), None);
        assert!(store.create_account(again).await.is_ok());
    }

    #[tokio::test]
    async fn put_challenge_supersedes_prior_for_same_account() {
        let store = MemoryStore::new();
        let account_id = Uuid::new_v4();

        let first = PendingChallenge::new(account_id, "h1".to_string(), 300, 5);
        let first_id = first.challenge_id;
        store.put_challenge(first).await.unwrap();

        let second = PendingChallenge::new(account_id, "h2".to_string(), 300, 5);
        let second_id = second.challenge_id;
        store.put_challenge(second).await.unwrap();

        let stored = store.find_challenge(account_id).await.unwrap().unwrap();
        assert_eq!(stored.challenge_id, second_id);
        assert_ne!(stored.challenge_id, first_id);
    }

    #[tokio::test]
    async fn list_accounts_orders_newest_first() {
        let store = MemoryStore::new();
        let mut older = Account::new("older@example.com".to_string(), None);
        older.created_utc = older.created_utc - chrono::Duration::seconds(10);
        let newer = Account::new("newer@example.com".to_string(), None);

        store.create_account(older).await.unwrap();
        store.create_account(newer).await.unwrap();

        let listed = store.list_accounts().await.unwrap();
        assert_eq!(listed[0].email, "newer@example.com");
        assert_eq!(listed[1].email, "older@example.com");
    }

    #[tokio::test]
    async fn remove_sessions_for_account_only_touches_that_account() {
        let store = MemoryStore::new();
        let target = Uuid::new_v4();
        let other = Uuid::new_v4();

        let doomed = Session::new(target, 60);
        let kept = Session::new(other, 60);
        store.insert_session(doomed.clone()).await.unwrap();
        store.insert_session(kept.clone()).await.unwrap();

        store.remove_sessions_for_account(target).await.unwrap();

        assert!(store.find_session(&doomed.token).await.unwrap().is_none());
        assert!(store.find_session(&kept.token).await.unwrap().is_some());
    }
}
