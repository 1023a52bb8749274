//! Identity manager: account creation, OTP challenges, and session minting.

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::{OtpConfig, SessionConfig};
use crate::error::ServiceError;
use crate::models::{Account, PendingChallenge, Session};
use crate::services::OtpChannel;
use crate::store::{AccountStore, StoreError};

/// Client-facing reference to an outstanding challenge. Carries a correlation
/// value, never the code itself.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeHandle {
    pub account_id: Uuid,
    pub challenge_id: Uuid,
    /// Seconds until the challenge expires.
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn AccountStore>,
    channel: Arc<dyn OtpChannel>,
    otp: OtpConfig,
    session: SessionConfig,
}

impl IdentityService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        channel: Arc<dyn OtpChannel>,
        otp: OtpConfig,
        session: SessionConfig,
    ) -> Self {
        Self {
            store,
            channel,
            otp,
            session,
        }
    }

    /// Start sign-up. If the email already has an account this transparently
    /// becomes a sign-in challenge for that account; a duplicate is never
    /// created and the collision is not surfaced to the caller.
    #[tracing::instrument(skip(self, full_name))]
    pub async fn sign_up(
        &self,
        email: &str,
        full_name: &str,
    ) -> Result<ChallengeHandle, ServiceError> {
        let email = normalize_email(email);

        if let Some(existing) = self.store.find_account_by_email(&email).await? {
            tracing::info!(account_id = %existing.account_id, "Sign-up for registered email, issuing sign-in challenge");
            return self.issue_challenge(&existing).await;
        }

        let account = Account::new(email.clone(), Some(full_name.trim().to_string()));
        let account = match self.store.create_account(account).await {
            Ok(account) => account,
            // Lost a creation race; fall back to the existing account.
            Err(StoreError::DuplicateEmail) => self
                .store
                .find_account_by_email(&email)
                .await?
                .ok_or_else(|| {
                    ServiceError::Internal(anyhow::anyhow!("account vanished after duplicate email"))
                })?,
            Err(e) => return Err(e.into()),
        };

        tracing::info!(account_id = %account.account_id, "Account created");
        self.issue_challenge(&account).await
    }

    /// Start sign-in for an existing account.
    #[tracing::instrument(skip(self))]
    pub async fn sign_in(&self, email: &str) -> Result<ChallengeHandle, ServiceError> {
        let email = normalize_email(email);

        let account = self
            .store
            .find_account_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Account not found".to_string()))?;

        self.issue_challenge(&account).await
    }

    /// Generate and dispatch a fresh code, superseding any outstanding
    /// challenge for the account.
    async fn issue_challenge(&self, account: &Account) -> Result<ChallengeHandle, ServiceError> {
        let code = generate_code(self.otp.code_length);
        let challenge = PendingChallenge::new(
            account.account_id,
            hash_code(&code),
            self.otp.expiry_seconds,
            self.otp.max_attempts,
        );
        let handle = ChallengeHandle {
            account_id: challenge.account_id,
            challenge_id: challenge.challenge_id,
            expires_in: self.otp.expiry_seconds,
        };

        self.store.put_challenge(challenge).await?;

        if let Err(e) = self.channel.dispatch(&account.email, &code).await {
            // An unsendable code is unverifiable; drop the record so the
            // caller can cleanly retry.
            self.store.remove_challenge(account.account_id).await?;
            return Err(e);
        }

        Ok(handle)
    }

    /// Verify a submitted code against the account's outstanding challenge.
    /// Challenges are single-use: success, expiry, supersession, and attempt
    /// exhaustion all invalidate the handle.
    #[tracing::instrument(skip(self, code))]
    pub async fn verify(
        &self,
        account_id: Uuid,
        challenge_id: Uuid,
        code: &str,
    ) -> Result<Session, ServiceError> {
        let challenge = self
            .store
            .find_challenge(account_id)
            .await?
            .ok_or(ServiceError::ChallengeExpired)?;

        // A superseded or already-consumed handle no longer matches.
        if challenge.challenge_id != challenge_id {
            return Err(ServiceError::ChallengeExpired);
        }

        if challenge.is_expired() {
            self.store.remove_challenge(account_id).await?;
            return Err(ServiceError::ChallengeExpired);
        }

        if challenge.attempts_exhausted() {
            self.store.remove_challenge(account_id).await?;
            return Err(ServiceError::ChallengeExpired);
        }

        self.store.record_attempt(account_id).await?;

        let submitted = hash_code(code.trim());
        if !bool::from(submitted.as_bytes().ct_eq(challenge.otp_hash.as_bytes())) {
            tracing::warn!(account_id = %account_id, "OTP verification failed");
            return Err(ServiceError::InvalidCode);
        }

        self.store.remove_challenge(account_id).await?;

        let session = Session::new(account_id, self.session.ttl_minutes);
        self.store.insert_session(session.clone()).await?;

        tracing::info!(account_id = %account_id, "Session established");
        Ok(session)
    }

    /// Invalidate a session. Idempotent; unknown tokens are not an error.
    pub async fn sign_out(&self, token: &str) -> Result<(), ServiceError> {
        self.store.remove_session(token).await?;
        Ok(())
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Random numeric code of the configured length.
fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| rng.gen_range(0..10).to_string())
        .collect()
}

/// SHA-256 hex of the code; only this reaches the store.
fn hash_code(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_have_requested_length() {
        let code = generate_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[test]
    fn hash_is_stable_and_hex_encoded() {
        assert_eq!(hash_code("123456"), hash_code("123456"));
        assert_ne!(hash_code("123456"), hash_code("123457"));
        assert_eq!(hash_code("123456").len(), 64);
    }
}
