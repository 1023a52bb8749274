//! Pending challenge model - one-time passcode verification state.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Outstanding OTP challenge, keyed by the owning account. At most one live
/// challenge exists per account; writing a new one supersedes the prior.
#[derive(Debug, Clone)]
pub struct PendingChallenge {
    pub account_id: Uuid,
    /// Client-opaque correlation value. A handle whose `challenge_id` no
    /// longer matches the stored record has been superseded or consumed.
    pub challenge_id: Uuid,
    /// SHA-256 hex of the code. The plaintext never reaches the store.
    pub otp_hash: String,
    pub expires_utc: DateTime<Utc>,
    pub attempt_count: u32,
    pub attempt_max: u32,
    pub created_utc: DateTime<Utc>,
}

impl PendingChallenge {
    pub fn new(account_id: Uuid, otp_hash: String, expiry_seconds: i64, attempt_max: u32) -> Self {
        let now = Utc::now();
        Self {
            account_id,
            challenge_id: Uuid::new_v4(),
            otp_hash,
            expires_utc: now + Duration::seconds(expiry_seconds),
            attempt_count: 0,
            attempt_max,
            created_utc: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_utc
    }

    pub fn attempts_exhausted(&self) -> bool {
        self.attempt_count >= self.attempt_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_challenge_is_live() {
        let c = PendingChallenge::new(Uuid::new_v4(), "hash".to_string(), 300, 5);
        assert!(!c.is_expired());
        assert!(!c.attempts_exhausted());
    }

    #[test]
    fn zero_ttl_challenge_expires_immediately() {
        let c = PendingChallenge::new(Uuid::new_v4(), "hash".to_string(), -1, 5);
        assert!(c.is_expired());
    }

    #[test]
    fn attempts_exhaust_at_the_cap() {
        let mut c = PendingChallenge::new(Uuid::new_v4(), "hash".to_string(), 300, 2);
        c.attempt_count = 2;
        assert!(c.attempts_exhausted());
    }
}
