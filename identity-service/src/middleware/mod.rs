mod session;

pub use session::{require_admin_middleware, session_guard_middleware, CurrentUser};
