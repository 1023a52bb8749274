use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::SmtpConfig;
use crate::error::ServiceError;

/// External delivery channel for one-time codes. A failure here surfaces as
/// `ServiceError::Channel` and never hangs the initiating call.
#[async_trait]
pub trait OtpChannel: Send + Sync {
    async fn dispatch(&self, destination: &str, code: &str) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct SmtpOtpChannel {
    mailer: SmtpTransport,
    from_address: String,
}

impl SmtpOtpChannel {
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| ServiceError::Config(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)))
            .build();

        tracing::info!(host = %config.host, "SMTP OTP channel initialized");

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl OtpChannel for SmtpOtpChannel {
    async fn dispatch(&self, destination: &str, code: &str) -> Result<(), ServiceError> {
        let email = Message::builder()
            .from(self.from_address.parse().map_err(
                |e: lettre::address::AddressError| ServiceError::Internal(e.into()),
            )?)
            .to(destination.parse().map_err(
                |e: lettre::address::AddressError| ServiceError::Internal(e.into()),
            )?)
            .subject("Your one-time sign-in code")
            .header(ContentType::TEXT_PLAIN)
            .body(format!(
                "Your sign-in code is {}.\n\nIt expires in a few minutes. If you didn't request \
                 this, you can ignore this email.",
                code
            ))
            .map_err(|e| ServiceError::Internal(e.into()))?;

        // Send on the blocking pool so the SMTP round-trip never stalls the
        // async runtime; the transport timeout bounds it.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                // Never log the code itself.
                tracing::info!(to = %destination, "OTP email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, to = %destination, "Failed to send OTP email");
                Err(ServiceError::Channel(e.to_string()))
            }
        }
    }
}

/// Test double that records dispatched codes instead of sending them.
#[derive(Default)]
pub struct MockOtpChannel {
    sent: Mutex<Vec<(String, String)>>,
    fail_next: AtomicBool,
}

impl MockOtpChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code dispatched to `destination`, if any.
    pub fn last_code_for(&self, destination: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == destination)
            .map(|(_, code)| code.clone())
    }

    pub fn dispatch_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Make the next dispatch fail with a channel error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OtpChannel for MockOtpChannel {
    async fn dispatch(&self, destination: &str, code: &str) -> Result<(), ServiceError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Channel("simulated outage".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), code.to_string()));
        Ok(())
    }
}
