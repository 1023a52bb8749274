pub mod account;
pub mod challenge;
pub mod session;

pub use account::{Account, AccountResponse, Role};
pub use challenge::PendingChallenge;
pub use session::Session;
