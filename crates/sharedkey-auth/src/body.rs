//! Request body integrity digests.
//!
//! Bodies are protected by an MD5 digest declared in the `Content-MD5`
//! header. MD5 is not used here for collision resistance; the digest is an
//! integrity checksum whose authenticity comes from its inclusion in the
//! HMAC-signed canonical string.

use md5::{Digest, Md5};

/// Length in bytes of a body digest.
pub const BODY_DIGEST_LEN: usize = 16;

/// Compute the MD5 digest of a request body.
///
/// Returns `None` for an empty body; a zero-length body never requires a
/// `Content-MD5` header.
///
/// # Examples
///
/// ```
/// use sharedkey_auth::body::body_md5;
///
/// assert!(body_md5(b"").is_none());
/// assert!(body_md5(b"hello").is_some());
/// ```
#[must_use]
pub fn body_md5(body: &[u8]) -> Option<[u8; BODY_DIGEST_LEN]> {
    if body.is_empty() {
        return None;
    }
    let digest = Md5::digest(body);
    let mut out = [0u8; BODY_DIGEST_LEN];
    out.copy_from_slice(&digest);
    Some(out)
}
