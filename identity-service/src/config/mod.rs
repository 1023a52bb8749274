use serde::Deserialize;
use std::env;

use crate::error::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub smtp: SmtpConfig,
    pub otp: OtpConfig,
    pub session: SessionConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub from_address: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    pub code_length: usize,
    pub expiry_seconds: i64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl IdentityConfig {
    pub fn from_env() -> Result<Self, ServiceError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| ServiceError::Config(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = IdentityConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("identity-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: parse_env("PORT", Some("8080"), is_prod)?,
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", None, is_prod)?,
                user: get_env("SMTP_USER", None, is_prod)?,
                password: get_env("SMTP_PASSWORD", None, is_prod)?,
                from_address: get_env("SMTP_FROM_ADDRESS", None, is_prod)?,
                timeout_seconds: parse_env("SMTP_TIMEOUT_SECONDS", Some("10"), is_prod)?,
            },
            otp: OtpConfig {
                code_length: parse_env("OTP_CODE_LENGTH", Some("6"), is_prod)?,
                expiry_seconds: parse_env("OTP_EXPIRY_SECONDS", Some("300"), is_prod)?,
                max_attempts: parse_env("OTP_MAX_ATTEMPTS", Some("5"), is_prod)?,
            },
            session: SessionConfig {
                // One week by default; sessions do not slide.
                ttl_minutes: parse_env("SESSION_TTL_MINUTES", Some("10080"), is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ServiceError> {
        if self.port == 0 {
            return Err(ServiceError::Config(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.otp.expiry_seconds <= 0 {
            return Err(ServiceError::Config(anyhow::anyhow!(
                "OTP_EXPIRY_SECONDS must be positive"
            )));
        }

        if self.otp.max_attempts == 0 {
            return Err(ServiceError::Config(anyhow::anyhow!(
                "OTP_MAX_ATTEMPTS must be positive"
            )));
        }

        if self.session.ttl_minutes <= 0 {
            return Err(ServiceError::Config(anyhow::anyhow!(
                "SESSION_TTL_MINUTES must be positive"
            )));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(ServiceError::Config(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, ServiceError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(ServiceError::Config(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(ServiceError::Config(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: Option<&str>, is_prod: bool) -> Result<T, ServiceError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, default, is_prod)?.parse().map_err(|e: T::Err| {
        ServiceError::Config(anyhow::anyhow!("{} is not valid: {}", key, e))
    })
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
