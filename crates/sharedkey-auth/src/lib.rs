//! SharedKey HMAC request authentication.
//!
//! This crate implements the receiving side of a shared-key signing scheme for
//! HTTP messages, in the style of the canonicalized-header HMAC schemes used
//! by cloud storage APIs. A sender computes HMAC-SHA256 over a canonical
//! representation of the request and attaches it as
//! `Authorization: SharedKey accountId:base64(hmac)`; the receiver recomputes
//! the HMAC from the received message and accepts the request only if the
//! signatures match, the message is fresh, and any body matches its declared
//! `Content-MD5`.
//!
//! # Overview
//!
//! The main entry point is [`SharedKeyValidator`], which is constructed once
//! with a [`SecretResolver`] and invoked per inbound request. Validation is a
//! pure function of the request parts, the body bytes, and the resolved
//! secret; every rejection is returned as a [`ValidationOutcome`] value, never
//! raised as a panic. A request without a credential is a valid
//! [`ValidationOutcome::Anonymous`] outcome so that hosts can layer their own
//! authorization on top.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sharedkey_auth::{SharedKeyValidator, StaticSecretResolver, ValidationOutcome};
//!
//! let resolver = StaticSecretResolver::new(vec![(
//!     "barryd".to_owned(),
//!     b"super-secret-key".to_vec(),
//! )]);
//! let validator = SharedKeyValidator::new(Arc::new(resolver));
//!
//! let (parts, body) = http::Request::builder()
//!     .method("GET")
//!     .uri("http://localhost/api/Subscribers")
//!     .body(Vec::<u8>::new())
//!     .unwrap()
//!     .into_parts();
//!
//! // No Authorization header present, so the request is anonymous.
//! assert!(matches!(
//!     validator.validate(&parts, &body),
//!     ValidationOutcome::Anonymous(_)
//! ));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical request string construction
//! - [`body`] - Request body MD5 integrity digests
//! - [`compare`] - Constant-time byte comparison
//! - [`credential`] - `SharedKey` authorization header parsing
//! - [`error`] - Configuration error types
//! - [`principal`] - Principals and claims produced by validation
//! - [`secrets`] - Secret resolver trait and in-memory implementation
//! - [`signature`] - HMAC-SHA256 signature computation
//! - [`validator`] - The validation state machine

pub mod body;
pub mod canonical;
pub mod compare;
pub mod credential;
pub mod error;
pub mod principal;
pub mod secrets;
pub mod signature;
pub mod validator;

pub use body::body_md5;
pub use canonical::build_canonical_request;
pub use compare::constant_time_eq;
pub use credential::{SCHEME, parse_credential};
pub use error::AuthError;
pub use principal::{Claim, ClaimsProvider, Principal};
pub use secrets::{SecretResolver, StaticSecretResolver};
pub use signature::{SharedKeySigner, hmac_sha256};
pub use validator::{RejectionKind, SharedKeyValidator, ValidationOutcome};
