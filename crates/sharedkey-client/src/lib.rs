//! Sender-side SharedKey request signing.
//!
//! This crate is the client counterpart of `sharedkey-auth`: it prepares an
//! outgoing `http::Request` so that a SharedKey validator on the receiving
//! side will accept it. Signing stamps the `Date` header, attaches a
//! `Content-MD5` digest for non-empty bodies, and adds the
//! `Authorization: SharedKey accountId:base64(hmac)` credential computed over
//! the canonical request string.
//!
//! # Usage
//!
//! ```rust
//! use bytes::Bytes;
//! use sharedkey_client::RequestSigner;
//!
//! let signer = RequestSigner::new("barryd", b"super-secret-key".to_vec()).unwrap();
//!
//! let mut request = http::Request::builder()
//!     .method("POST")
//!     .uri("http://localhost/api/Subscribers")
//!     .header("content-type", "application/json")
//!     .body(Bytes::from_static(br#"{"Email":"a@b.com","Name":"A"}"#))
//!     .unwrap();
//!
//! signer.sign(&mut request).unwrap();
//! assert!(request.headers().contains_key(http::header::AUTHORIZATION));
//! ```

mod signer;

pub use sharedkey_auth::AuthError;
pub use signer::RequestSigner;
