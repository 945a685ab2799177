//! HMAC-SHA256 signature computation over canonical request strings.

use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

use crate::error::AuthError;

/// Length in bytes of a request signature.
pub const SIGNATURE_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// Signs canonical request strings with a shared secret.
///
/// Construction validates the key once; signing itself is a deterministic,
/// side-effect-free function of the canonical string and never fails.
///
/// # Examples
///
/// ```
/// use sharedkey_auth::signature::SharedKeySigner;
///
/// let signer = SharedKeySigner::new(b"super-secret-key".to_vec()).unwrap();
/// let signature = signer.sign("GET\n/barryd/api/Subscribers\n");
/// assert_eq!(signature.len(), 32);
/// ```
#[derive(Clone)]
pub struct SharedKeySigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for SharedKeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The key must not leak through Debug output or logs.
        f.debug_struct("SharedKeySigner").finish_non_exhaustive()
    }
}

impl SharedKeySigner {
    /// Create a signer from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmptyKey`] if the key is zero-length. This is a
    /// configuration error, not a per-request rejection.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let key = key.into();
        if key.is_empty() {
            return Err(AuthError::EmptyKey);
        }
        Ok(Self { key })
    }

    /// Compute the HMAC-SHA256 signature of the UTF-8 bytes of a canonical
    /// string.
    #[must_use]
    pub fn sign(&self, canonical: &str) -> [u8; SIGNATURE_LEN] {
        hmac_sha256(&self.key, canonical.as_bytes())
    }
}

/// Compute HMAC-SHA256 and return the raw 32-byte digest.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; SIGNATURE_LEN] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    let mut out = [0u8; SIGNATURE_LEN];
    out.copy_from_slice(&digest);
    out
}
