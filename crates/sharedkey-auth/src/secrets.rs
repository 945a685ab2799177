//! Secret resolver trait and in-memory implementation.
//!
//! The validator never owns account secrets; it borrows them for the duration
//! of one validation call through the [`SecretResolver`] collaborator. Key
//! lifecycle and rotation belong to the host.

use std::collections::HashMap;

/// Trait for looking up the shared secret associated with an account name.
///
/// Implementations may back this with a database, a secrets manager, or any
/// other store; each call must be safe to make once per inbound request.
pub trait SecretResolver: Send + Sync {
    /// Retrieve the shared secret for the given account name, or `None` if
    /// the account is unknown.
    fn resolve(&self, account: &str) -> Option<Vec<u8>>;
}

/// A simple in-memory secret resolver backed by a `HashMap`.
///
/// Suitable for testing and development environments. For production use,
/// implement [`SecretResolver`] with a secure credential store.
///
/// # Examples
///
/// ```
/// use sharedkey_auth::secrets::{SecretResolver, StaticSecretResolver};
///
/// let resolver = StaticSecretResolver::new(vec![(
///     "barryd".to_owned(),
///     b"super-secret-key".to_vec(),
/// )]);
///
/// assert!(resolver.resolve("barryd").is_some());
/// assert!(resolver.resolve("unknown").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticSecretResolver {
    secrets: HashMap<String, Vec<u8>>,
}

impl StaticSecretResolver {
    /// Create a new `StaticSecretResolver` from an iterable of
    /// (account name, secret) pairs.
    pub fn new(secrets: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            secrets: secrets.into_iter().collect(),
        }
    }
}

impl SecretResolver for StaticSecretResolver {
    fn resolve(&self, account: &str) -> Option<Vec<u8>> {
        self.secrets.get(account).cloned()
    }
}
