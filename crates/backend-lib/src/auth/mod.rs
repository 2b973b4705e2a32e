// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication and authorization module.

pub mod guard;
pub mod impersonate;
pub mod password;
pub mod rate_limit;
pub mod token;

pub use guard::{authorize, required_capability, Capability};
pub use impersonate::ImpersonationBroker;
pub use password::{hash_password, verify_password};
pub use rate_limit::{Decision, LoginRateLimiter};
pub use token::{Claims, TokenError, TokenService};
