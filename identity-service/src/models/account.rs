//! Account model - the durable identity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role codes. Closed enumeration so an invalid role is rejected before any
/// store access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }

    /// Parse a role from its wire form. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// Account entity.
#[derive(Debug, Clone)]
pub struct Account {
    pub account_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_utc: DateTime<Utc>,
}

impl Account {
    /// Create a new account. Email is expected to be normalized (lower-cased)
    /// by the caller; role always starts as `User`.
    pub fn new(email: String, full_name: Option<String>) -> Self {
        Self {
            account_id: Uuid::new_v4(),
            email,
            full_name,
            role: Role::User,
            created_utc: Utc::now(),
        }
    }

    pub fn sanitized(&self) -> AccountResponse {
        AccountResponse::from(self.clone())
    }
}

/// Account response for API callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_utc: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            account_id: a.account_id,
            email: a.email,
            full_name: a.full_name,
            role: a.role,
            created_utc: a.created_utc,
        }
    }
}
