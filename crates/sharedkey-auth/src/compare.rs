//! Constant-time byte comparison.

use subtle::ConstantTimeEq;

/// Compare two byte slices without short-circuiting on the first mismatch.
///
/// Differing lengths return `false` immediately; length is not treated as
/// secret in this scheme. Equal-length inputs are compared over their entire
/// length via [`subtle::ConstantTimeEq`], whose accumulator the optimizer is
/// barred from folding into an early-exit loop.
///
/// # Examples
///
/// ```
/// use sharedkey_auth::compare::constant_time_eq;
///
/// assert!(constant_time_eq(b"abc", b"abc"));
/// assert!(!constant_time_eq(b"abc", b"abd"));
/// assert!(!constant_time_eq(b"abc", b"abcd"));
/// ```
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
