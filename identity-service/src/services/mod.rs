//! Services layer for the identity core.
//!
//! Identity management (accounts, OTP challenges, sessions), admin roster
//! operations, and the outbound OTP channel.

mod admin;
mod email;
mod identity;

pub use admin::AdminService;
pub use email::{MockOtpChannel, OtpChannel, SmtpOtpChannel};
pub use identity::{ChallengeHandle, IdentityService};
