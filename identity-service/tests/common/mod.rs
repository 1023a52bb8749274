//! Test helper module for identity-service integration tests.
//!
//! Builds the full router over the in-memory store and a recording OTP
//! channel, then drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use identity_service::{
    config::{
        Environment, IdentityConfig, OtpConfig, SecurityConfig, SessionConfig, SmtpConfig,
    },
    models::Role,
    services::{AdminService, IdentityService, MockOtpChannel},
    store::{AccountStore, MemoryStore},
    AppState,
};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub channel: Arc<MockOtpChannel>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with_config(create_test_config())
    }

    pub fn spawn_with_config(config: IdentityConfig) -> Self {
        let store: Arc<dyn AccountStore> = Arc::new(MemoryStore::new());
        let channel = Arc::new(MockOtpChannel::new());

        let identity = IdentityService::new(
            store.clone(),
            channel.clone(),
            config.otp.clone(),
            config.session.clone(),
        );
        let admin = AdminService::new(store.clone());

        let state = AppState {
            config,
            store,
            identity,
            admin,
        };

        TestApp {
            router: identity_service::build_router(state.clone()),
            state,
            channel,
        }
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        self.request("POST", path, Some(body), None).await
    }

    pub async fn post_json_auth(
        &self,
        path: &str,
        body: serde_json::Value,
        token: &str,
    ) -> (StatusCode, serde_json::Value) {
        self.request("POST", path, Some(body), Some(token)).await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (StatusCode, serde_json::Value) {
        self.request("GET", path, None, Some(token)).await
    }

    pub async fn patch_json_auth(
        &self,
        path: &str,
        body: serde_json::Value,
        token: &str,
    ) -> (StatusCode, serde_json::Value) {
        self.request("PATCH", path, Some(body), Some(token)).await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (StatusCode, serde_json::Value) {
        self.request("DELETE", path, None, Some(token)).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Run the full sign-up + verify flow, returning (token, account_id).
    pub async fn sign_up_and_verify(&self, email: &str, full_name: &str) -> (String, Uuid) {
        let (status, challenge) = self
            .post_json(
                "/auth/sign-up",
                serde_json::json!({ "email": email, "full_name": full_name }),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED, "sign-up failed: {}", challenge);

        let code = self
            .channel
            .last_code_for(email)
            .expect("no OTP dispatched for sign-up");

        let (status, body) = self
            .post_json(
                "/auth/verify",
                serde_json::json!({
                    "account_id": challenge["account_id"],
                    "challenge_id": challenge["challenge_id"],
                    "code": code,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {}", body);

        let token = body["token"].as_str().unwrap().to_string();
        let account_id: Uuid = serde_json::from_value(body["account"]["account_id"].clone()).unwrap();
        (token, account_id)
    }

    /// Promote an account to admin directly through the store, as a
    /// bootstrapped operator would.
    pub async fn promote_to_admin(&self, account_id: Uuid) {
        self.state
            .store
            .update_role(account_id, Role::Admin)
            .await
            .unwrap();
    }

    /// Sign up, verify, and promote in one step. Returns an admin token.
    pub async fn spawn_admin(&self, email: &str) -> (String, Uuid) {
        let (token, account_id) = self.sign_up_and_verify(email, "Test Admin").await;
        self.promote_to_admin(account_id).await;
        (token, account_id)
    }
}

pub fn create_test_config() -> IdentityConfig {
    IdentityConfig {
        environment: Environment::Dev,
        service_name: "identity-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        port: 0,
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            user: "test".to_string(),
            password: "test".to_string(),
            from_address: "noreply@example.com".to_string(),
            timeout_seconds: 1,
        },
        otp: OtpConfig {
            code_length: 6,
            expiry_seconds: 300,
            max_attempts: 5,
        },
        session: SessionConfig { ttl_minutes: 60 },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

/// Config variant whose challenges are born expired.
pub fn create_expired_otp_config() -> IdentityConfig {
    let mut config = create_test_config();
    config.otp.expiry_seconds = -1;
    config
}
