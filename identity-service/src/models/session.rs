//! Session model - proof of a completed authentication.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

/// Authenticated session. The token is the only artifact handed to a caller;
/// everything else stays server-side.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account_id: Uuid,
    pub issued_utc: DateTime<Utc>,
    pub expires_utc: DateTime<Utc>,
}

impl Session {
    /// Mint a session with a fresh unguessable token.
    pub fn new(account_id: Uuid, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            token: generate_token(),
            account_id,
            issued_utc: now,
            expires_utc: now + Duration::minutes(ttl_minutes),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_utc
    }
}

/// 32 bytes from the OS-seeded CSPRNG, hex-encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_opaque() {
        let a = Session::new(Uuid::new_v4(), 60);
        let b = Session::new(Uuid::new_v4(), 60);
        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), 64);
    }

    #[test]
    fn session_expiry_honors_ttl() {
        let live = Session::new(Uuid::new_v4(), 60);
        assert!(!live.is_expired());

        let expired = Session::new(Uuid::new_v4(), -1);
        assert!(expired.is_expired());
    }
}
