//! Shared error classification.
//!
//! Every layer keeps its own `thiserror` enum; the ones that cross the HTTP
//! boundary also implement [`ErrorCode`] so responses carry a stable,
//! grepable code next to the human-readable message.

/// Grepable error code for structured error bodies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

pub const E_VALIDATION: &str = "E_VALIDATION";
pub const E_NOT_FOUND: &str = "E_NOT_FOUND";
pub const E_STORE: &str = "E_STORE";
