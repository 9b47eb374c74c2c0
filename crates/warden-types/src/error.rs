//! Error-code conventions shared by all Warden crates.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so that
//! transport bindings can map failures to stable, machine-readable codes
//! without matching on display strings.
//!
//! # Example
//!
//! ```
//! use warden_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum LookupError {
//!     Missing(String),
//!     Backend,
//! }
//!
//! impl ErrorCode for LookupError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing(_) => "LOOKUP_MISSING",
//!             Self::Backend => "LOOKUP_BACKEND",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Backend)
//!     }
//! }
//!
//! assert_eq!(LookupError::Backend.code(), "LOOKUP_BACKEND");
//! assert!(!LookupError::Missing("r1".into()).is_recoverable());
//! ```

/// Machine-readable error code and retry hint.
///
/// # Code Format
///
/// - UPPER_SNAKE_CASE, prefixed with the owning domain (`AUTH_`, `CONFIG_`)
/// - Stable once published: bindings surface these codes to clients
///
/// # Recoverability
///
/// An error is recoverable when retrying may succeed (a store was
/// briefly unreachable). Configuration faults such as a role cycle or a
/// malformed condition tree are not: they need a data fix.
pub trait ErrorCode {
    /// Returns the stable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code follows the workspace conventions.
///
/// Intended for tests: checks the code is non-empty, carries the
/// expected prefix and is UPPER_SNAKE_CASE.
///
/// # Panics
///
/// Panics with a descriptive message if any check fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Asserts [`assert_error_code`] for every error in the slice.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
