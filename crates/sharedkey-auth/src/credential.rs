//! `SharedKey` authorization header parsing.
//!
//! The credential wire format is:
//!
//! ```text
//! Authorization: SharedKey accountId:base64(hmac)
//! ```
//!
//! Parsing fails closed: any malformed credential is reported as absent
//! (`None`), which the validator maps to the anonymous outcome rather than an
//! error.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// The authentication scheme token.
pub const SCHEME: &str = "SharedKey";

/// Parse a `SharedKey` authorization header value into an account name and
/// the sent signature bytes.
///
/// Returns `None` if the scheme token does not match, the parameter has no
/// `:` separator, the separator is at the start or end, or the signature is
/// not valid base64.
///
/// # Examples
///
/// ```
/// use sharedkey_auth::credential::parse_credential;
///
/// let (account, signature) = parse_credential("SharedKey barryd:aGVsbG8=").unwrap();
/// assert_eq!(account, "barryd");
/// assert_eq!(signature, b"hello");
///
/// assert!(parse_credential("Bearer token").is_none());
/// assert!(parse_credential("SharedKey no-separator").is_none());
/// ```
#[must_use]
pub fn parse_credential(header: &str) -> Option<(String, Vec<u8>)> {
    let (scheme, parameter) = header.split_once(' ')?;
    if scheme != SCHEME {
        return None;
    }

    let (account, signature) = parse_parameter(parameter.trim())?;
    let signature = BASE64.decode(signature).ok()?;
    Some((account.to_owned(), signature))
}

/// Split a credential parameter at the first `:` into account name and
/// base64 signature. The account name never contains a colon.
fn parse_parameter(parameter: &str) -> Option<(&str, &str)> {
    let (account, signature) = parameter.split_once(':')?;
    if account.is_empty() || signature.is_empty() {
        return None;
    }
    Some((account, signature))
}
