//! Configuration error types.
//!
//! Expected per-request rejections are not errors in this crate; the
//! validator returns them as [`crate::ValidationOutcome`] values. [`AuthError`]
//! covers only configuration mistakes surfaced at construction time.

/// Errors raised when a signer or validator is misconfigured.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The signing key is empty. A zero-length key would sign every request
    /// with a predictable HMAC, so it is rejected at construction.
    #[error("Signing key must not be empty")]
    EmptyKey,

    /// The account name cannot appear in a `SharedKey` credential, either
    /// because it contains the `:` separator or because it is not a valid
    /// HTTP header value.
    #[error("Invalid account name: {0}")]
    InvalidAccountName(String),
}
