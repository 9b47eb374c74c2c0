//! Fallible construction.
//!
//! [`TryNew`] is for types whose constructor validates or normalizes its
//! input and may reject it. Types implementing it do not also expose a
//! plain `new()` doing the same work, so fallibility is visible at the
//! call site.
//!
//! | Pattern | Use When |
//! |---------|----------|
//! | `new()` | Construction always succeeds |
//! | [`TryNew`] | Construction validates and may fail |
//! | `TryFrom<T>` | Converting from another type |

/// Trait for fallible construction with validation.
///
/// # Example
///
/// ```
/// use warden_types::TryNew;
///
/// struct Token(String);
///
/// #[derive(Debug, PartialEq)]
/// struct BlankToken;
///
/// impl TryNew for Token {
///     type Error = BlankToken;
///     type Args = String;
///
///     fn try_new(value: String) -> Result<Self, Self::Error> {
///         let trimmed = value.trim();
///         if trimmed.is_empty() {
///             return Err(BlankToken);
///         }
///         Ok(Token(trimmed.to_lowercase()))
///     }
/// }
///
/// assert_eq!(Token::try_new(" Read ".into()).map(|t| t.0), Ok("read".to_string()));
/// assert!(Token::try_new("   ".into()).is_err());
/// ```
pub trait TryNew {
    /// Error returned when validation fails.
    type Error;

    /// Constructor arguments; use a tuple for several.
    type Args;

    /// Attempts to create a new instance.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if the arguments are rejected.
    fn try_new(args: Self::Args) -> Result<Self, Self::Error>
    where
        Self: Sized;
}
