// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const LOGIN_SUCCESS: &str = "login.success";
pub const LOGIN_FAILURE: &str = "login.failure";
pub const LOGIN_RATE_LIMITED: &str = "login.rate_limited";
pub const USER_REGISTERED: &str = "user.registered";
pub const IMPERSONATION_ISSUED: &str = "impersonation.issued";
pub const ALERT_SENT: &str = "alert.sent";
pub const ALERT_FAILED: &str = "alert.failed";
