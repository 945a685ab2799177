//! Request signing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use chrono::Utc;
use http::{HeaderValue, Request};
use sharedkey_auth::body::body_md5;
use sharedkey_auth::build_canonical_request;
use sharedkey_auth::credential::SCHEME;
use sharedkey_auth::error::AuthError;
use sharedkey_auth::signature::SharedKeySigner;
use tracing::debug;

/// Signs outgoing requests on behalf of one account.
///
/// The account name and key are validated once at construction; signing
/// itself only fails if the request cannot carry the computed headers.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    account: String,
    signer: SharedKeySigner,
}

impl RequestSigner {
    /// Create a signer for the given account name and shared secret.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmptyKey`] for a zero-length key, or
    /// [`AuthError::InvalidAccountName`] if the account name is empty,
    /// contains the `:` credential separator, or is not a valid header value.
    pub fn new(account: impl Into<String>, key: impl Into<Vec<u8>>) -> Result<Self, AuthError> {
        let account = account.into();
        if account.is_empty()
            || account.contains(':')
            || HeaderValue::from_str(&account).is_err()
        {
            return Err(AuthError::InvalidAccountName(account));
        }
        Ok(Self {
            signer: SharedKeySigner::new(key)?,
            account,
        })
    }

    /// Sign a request in place.
    ///
    /// Stamps the `Date` header with the current time if absent, attaches
    /// `Content-MD5` and `Content-Length` for a non-empty body when not
    /// already set, and adds the `SharedKey` authorization credential
    /// computed over the canonical request string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidAccountName`] if the credential cannot be
    /// rendered as a header value.
    pub fn sign(&self, request: &mut Request<Bytes>) -> Result<(), AuthError> {
        if !request.headers().contains_key(http::header::DATE) {
            let now = Utc::now()
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string();
            request.headers_mut().insert(
                http::header::DATE,
                HeaderValue::from_str(&now).expect("RFC 1123 dates are valid header values"),
            );
        }

        let body = request.body().clone();
        if let Some(digest) = body_md5(&body) {
            if !request.headers().contains_key("content-md5") {
                request.headers_mut().insert(
                    http::header::HeaderName::from_static("content-md5"),
                    HeaderValue::from_str(&BASE64.encode(digest))
                        .expect("base64 digests are valid header values"),
                );
            }
            if !request.headers().contains_key(http::header::CONTENT_LENGTH) {
                request
                    .headers_mut()
                    .insert(http::header::CONTENT_LENGTH, HeaderValue::from(body.len()));
            }
        }

        let canonical = build_canonical_request(
            request.method(),
            request.uri(),
            request.headers(),
            &self.account,
        );
        debug!(canonical, account = %self.account, "Signing canonical request");

        let signature = BASE64.encode(self.signer.sign(&canonical));
        let credential = format!("{SCHEME} {}:{signature}", self.account);
        request.headers_mut().insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_str(&credential)
                .map_err(|_| AuthError::InvalidAccountName(self.account.clone()))?,
        );

        Ok(())
    }
}
