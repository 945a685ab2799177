//! The SharedKey validation state machine.
//!
//! [`SharedKeyValidator`] orchestrates one validation pass per inbound
//! request:
//!
//! 1. Freshness check against the `Date` header
//! 2. Credential parsing (absent or malformed credentials are anonymous)
//! 3. Secret resolution via the [`SecretResolver`] collaborator
//! 4. Body integrity check against `Content-MD5`
//! 5. Signature recomputation and constant-time comparison
//! 6. Principal issuance
//!
//! Each step can short-circuit to a [`ValidationOutcome::Rejected`] value.
//! Rejections are ordinary return values; the validator never panics for
//! expected conditions.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, TimeDelta, Utc};
use http::request::Parts;
use tracing::debug;

use crate::body::body_md5;
use crate::canonical::build_canonical_request;
use crate::compare::constant_time_eq;
use crate::credential::parse_credential;
use crate::principal::{Claim, ClaimsProvider, Principal};
use crate::secrets::SecretResolver;
use crate::signature::hmac_sha256;

/// The category of a rejected request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The request timestamp is outside the acceptance window.
    Expired,
    /// The credential's account name has no shared key in the resolver.
    UnknownAccount,
    /// A non-empty body was sent without the required `Content-MD5` header.
    BodyMismatch,
    /// The declared `Content-MD5` does not match the request body.
    BodyTampered,
    /// The sent signature does not match the recomputed one.
    SignatureInvalid,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Expired => "expired",
            Self::UnknownAccount => "unknown account",
            Self::BodyMismatch => "body checksum missing",
            Self::BodyTampered => "body checksum mismatch",
            Self::SignatureInvalid => "signature invalid",
        };
        f.write_str(name)
    }
}

/// The result of validating one request.
///
/// No partial state is observable: every validation call ends in exactly one
/// of these variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The signature verified; the principal carries the account identity.
    Authenticated(Principal),
    /// No usable credential was presented. This is a valid outcome, not an
    /// error; the host decides whether anonymous access is acceptable.
    Anonymous(Principal),
    /// The request was rejected, with the category and a human-readable
    /// reason for host-side logging and response mapping.
    Rejected(RejectionKind, String),
}

/// Validates SharedKey-signed requests.
///
/// The validator holds only immutable configuration and `Send + Sync`
/// collaborators, so one instance may be shared across any number of worker
/// tasks without locking.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use sharedkey_auth::{SharedKeyValidator, StaticSecretResolver};
///
/// let resolver = StaticSecretResolver::new(vec![(
///     "barryd".to_owned(),
///     b"super-secret-key".to_vec(),
/// )]);
/// let validator = SharedKeyValidator::new(Arc::new(resolver))
///     .with_max_age(chrono::TimeDelta::minutes(10));
/// ```
#[derive(Clone)]
pub struct SharedKeyValidator {
    resolver: Arc<dyn SecretResolver>,
    claims_provider: Option<Arc<dyn ClaimsProvider>>,
    max_age: TimeDelta,
}

impl fmt::Debug for SharedKeyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedKeyValidator")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl SharedKeyValidator {
    /// Create a validator with the given secret resolver and the default
    /// maximum message age of five minutes.
    ///
    /// The resolver is a required collaborator by construction; there is no
    /// unconfigured validator state.
    #[must_use]
    pub fn new(resolver: Arc<dyn SecretResolver>) -> Self {
        Self {
            resolver,
            claims_provider: None,
            max_age: TimeDelta::minutes(5),
        }
    }

    /// Set the maximum accepted age of a request timestamp.
    ///
    /// The window is symmetric: timestamps more than `max_age` in the future
    /// are rejected as well, so a bounded clock skew in either direction is
    /// tolerated up to `max_age`.
    #[must_use]
    pub fn with_max_age(mut self, max_age: TimeDelta) -> Self {
        self.max_age = max_age;
        self
    }

    /// Attach an optional claims provider consulted for authenticated
    /// accounts. Without one the claim set is just the identity name.
    #[must_use]
    pub fn with_claims_provider(mut self, provider: Arc<dyn ClaimsProvider>) -> Self {
        self.claims_provider = Some(provider);
        self
    }

    /// Validate a request against the current wall clock.
    #[must_use]
    pub fn validate(&self, parts: &Parts, body: &[u8]) -> ValidationOutcome {
        self.validate_at(parts, body, Utc::now())
    }

    /// Validate a request against a fixed evaluation time.
    ///
    /// This is the full state machine; [`validate`](Self::validate) calls it
    /// with `Utc::now()`. Hosts replaying captured traffic, and tests, can
    /// supply the clock explicitly.
    #[must_use]
    pub fn validate_at(&self, parts: &Parts, body: &[u8], now: DateTime<Utc>) -> ValidationOutcome {
        // 1. Freshness. A request timestamped exactly `max_age` ago is still
        // accepted; one instant older is not.
        if let Some(sent_at) = date_header(parts) {
            let age = now - sent_at;
            if age > self.max_age || age < -self.max_age {
                debug!(%sent_at, %now, "Request timestamp outside acceptance window");
                return ValidationOutcome::Rejected(
                    RejectionKind::Expired,
                    "request timestamp is outside the acceptance window".to_owned(),
                );
            }
        }

        // 2. Credential parse. Absent or malformed credentials fail closed to
        // the anonymous principal.
        let Some((account, sent_signature)) = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_credential)
        else {
            debug!("No usable SharedKey credential; request is anonymous");
            return ValidationOutcome::Anonymous(Principal::anonymous());
        };

        // 3. Secret resolution. An empty key is treated the same as an
        // unknown account.
        let Some(key) = self.resolver.resolve(&account).filter(|key| !key.is_empty()) else {
            debug!(%account, "No shared key for account");
            return ValidationOutcome::Rejected(
                RejectionKind::UnknownAccount,
                format!("no shared key found for account {account}"),
            );
        };

        // 4. Body integrity. Chunked requests carry no usable Content-Length
        // or Content-MD5 at signing time and are exempt from this check; the
        // signature check still covers the canonical string.
        if !is_chunked(parts) {
            if let Some(outcome) = verify_body(parts, body) {
                return outcome;
            }
        }

        // 5. Signature comparison.
        let canonical = build_canonical_request(&parts.method, &parts.uri, &parts.headers, &account);
        debug!(canonical, "Recomputed canonical request");
        let computed_signature = hmac_sha256(&key, canonical.as_bytes());

        if !constant_time_eq(&sent_signature, &computed_signature) {
            debug!(%account, "Signature mismatch");
            return ValidationOutcome::Rejected(
                RejectionKind::SignatureInvalid,
                "signature does not match the signed request".to_owned(),
            );
        }

        // 6. Principal issuance.
        let mut claims = vec![Claim::name(account.clone())];
        if let Some(provider) = &self.claims_provider {
            claims.extend(provider.claims_for(&account));
        }

        debug!(%account, "SharedKey validation succeeded");
        ValidationOutcome::Authenticated(Principal::authenticated(account, claims))
    }
}

/// Check the declared `Content-MD5` against the actual body, returning a
/// rejection outcome on failure and `None` when the body check passes.
fn verify_body(parts: &Parts, body: &[u8]) -> Option<ValidationOutcome> {
    let Some(computed) = body_md5(body) else {
        // A zero-length body never requires a checksum header.
        return None;
    };

    let Some(declared_header) = parts
        .headers
        .get("content-md5")
        .and_then(|value| value.to_str().ok())
    else {
        return Some(ValidationOutcome::Rejected(
            RejectionKind::BodyMismatch,
            "Content-MD5 header must be specified when a request body is included".to_owned(),
        ));
    };

    let declared = BASE64.decode(declared_header).unwrap_or_default();
    // Not a secret comparison; ordinary equality is fine here.
    if declared != computed {
        return Some(ValidationOutcome::Rejected(
            RejectionKind::BodyTampered,
            "Content-MD5 does not match the request body".to_owned(),
        ));
    }

    None
}

/// Parse the request `Date` header, if present and well-formed.
fn date_header(parts: &Parts) -> Option<DateTime<Utc>> {
    parts
        .headers
        .get(http::header::DATE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| DateTime::parse_from_rfc2822(value).ok())
        .map(|date| date.to_utc())
}

/// Whether the request uses chunked transfer encoding.
fn is_chunked(parts: &Parts) -> bool {
    parts
        .headers
        .get(http::header::TRANSFER_ENCODING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("chunked"))
        })
}

#[cfg(test)]
mod tests {
    use chrono::SubsecRound;

    use super::*;
    use crate::credential::SCHEME;
    use crate::secrets::StaticSecretResolver;

    const ACCOUNT: &str = "barryd";
    const KEY: &[u8] = b"KUreulZKB1y-example-shared-secret";

    fn validator() -> SharedKeyValidator {
        SharedKeyValidator::new(Arc::new(StaticSecretResolver::new(vec![(
            ACCOUNT.to_owned(),
            KEY.to_vec(),
        )])))
    }

    fn rfc1123(date: DateTime<Utc>) -> String {
        date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }

    /// Build a signed request the way a conforming sender would.
    fn signed_request(
        method: &str,
        uri: &str,
        body: &[u8],
        sent_at: DateTime<Utc>,
    ) -> (Parts, Vec<u8>) {
        let mut builder = http::Request::builder()
            .method(method)
            .uri(uri)
            .header(http::header::DATE, rfc1123(sent_at))
            .header("x-ms-client", "sharedkey-tests");

        if !body.is_empty() {
            builder = builder
                .header("content-length", body.len().to_string())
                .header("content-type", "application/json")
                .header("content-md5", BASE64.encode(body_md5(body).unwrap()));
        }

        let request = builder.body(()).unwrap();
        let canonical = build_canonical_request(
            request.method(),
            request.uri(),
            request.headers(),
            ACCOUNT,
        );
        let signature = BASE64.encode(hmac_sha256(KEY, canonical.as_bytes()));

        let (mut parts, ()) = request.into_parts();
        parts.headers.insert(
            http::header::AUTHORIZATION,
            format!("{SCHEME} {ACCOUNT}:{signature}").parse().unwrap(),
        );
        (parts, body.to_vec())
    }

    #[test]
    fn test_should_authenticate_signed_post_with_body() {
        let now = Utc::now();
        let (parts, body) = signed_request(
            "POST",
            "http://localhost/api/Subscribers",
            br#"{"Email":"a@b.com","Name":"A"}"#,
            now,
        );

        let outcome = validator().validate_at(&parts, &body, now);
        let ValidationOutcome::Authenticated(principal) = outcome else {
            panic!("expected authentication, got {outcome:?}");
        };
        assert_eq!(principal.account, ACCOUNT);
        assert_eq!(principal.claims, vec![Claim::name(ACCOUNT)]);
    }

    #[test]
    fn test_should_authenticate_signed_get_without_body() {
        let now = Utc::now();
        let (parts, body) = signed_request("GET", "http://localhost/api/Subscribers?page=2", b"", now);

        let outcome = validator().validate_at(&parts, &body, now);
        assert!(matches!(outcome, ValidationOutcome::Authenticated(_)));
    }

    #[test]
    fn test_should_treat_missing_authorization_as_anonymous() {
        let (parts, ()) = http::Request::builder()
            .method("GET")
            .uri("http://localhost/api/Subscribers")
            .body(())
            .unwrap()
            .into_parts();

        let outcome = validator().validate(&parts, b"");
        let ValidationOutcome::Anonymous(principal) = outcome else {
            panic!("expected anonymous, got {outcome:?}");
        };
        assert!(principal.is_anonymous());
    }

    #[test]
    fn test_should_treat_malformed_credential_as_anonymous() {
        for header in [
            "Bearer sometoken",
            "SharedKey nocolonhere",
            "SharedKey :sig",
            "SharedKey account:",
        ] {
            let (parts, ()) = http::Request::builder()
                .method("GET")
                .uri("http://localhost/api/Subscribers")
                .header(http::header::AUTHORIZATION, header)
                .body(())
                .unwrap()
                .into_parts();

            assert!(
                matches!(
                    validator().validate(&parts, b""),
                    ValidationOutcome::Anonymous(_)
                ),
                "header {header:?} should be anonymous"
            );
        }
    }

    #[test]
    fn test_should_reject_unknown_account() {
        let now = Utc::now();
        let (mut parts, body) = signed_request("GET", "http://localhost/api/Subscribers", b"", now);
        parts.headers.insert(
            http::header::AUTHORIZATION,
            "SharedKey stranger:AAEC".parse().unwrap(),
        );

        let outcome = validator().validate_at(&parts, &body, now);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::UnknownAccount, _)
        ));
    }

    #[test]
    fn test_should_reject_account_with_empty_key() {
        let empty_key_validator = SharedKeyValidator::new(Arc::new(StaticSecretResolver::new(
            vec![(ACCOUNT.to_owned(), Vec::new())],
        )));
        let now = Utc::now();
        let (parts, body) = signed_request("GET", "http://localhost/api/Subscribers", b"", now);

        let outcome = empty_key_validator.validate_at(&parts, &body, now);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::UnknownAccount, _)
        ));
    }

    #[test]
    fn test_should_accept_request_exactly_max_age_old() {
        // The Date header has second precision, so truncate before comparing
        // against the exact window boundary.
        let sent_at = Utc::now().trunc_subsecs(0);
        let (parts, body) = signed_request("GET", "http://localhost/api/Subscribers", b"", sent_at);

        let now = sent_at + TimeDelta::minutes(5);
        let outcome = validator().validate_at(&parts, &body, now);
        assert!(matches!(outcome, ValidationOutcome::Authenticated(_)));
    }

    #[test]
    fn test_should_reject_request_older_than_max_age() {
        let sent_at = Utc::now().trunc_subsecs(0);
        let (parts, body) = signed_request("GET", "http://localhost/api/Subscribers", b"", sent_at);

        let now = sent_at + TimeDelta::minutes(5) + TimeDelta::microseconds(1);
        let outcome = validator().validate_at(&parts, &body, now);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::Expired, _)
        ));
    }

    #[test]
    fn test_should_reject_request_dated_too_far_in_the_future() {
        let sent_at = Utc::now() + TimeDelta::minutes(6);
        let (parts, body) = signed_request("GET", "http://localhost/api/Subscribers", b"", sent_at);

        let outcome = validator().validate(&parts, &body);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::Expired, _)
        ));
    }

    #[test]
    fn test_should_reject_body_without_checksum_header() {
        let now = Utc::now();
        let (mut parts, body) = signed_request(
            "POST",
            "http://localhost/api/Subscribers",
            br#"{"Email":"a@b.com","Name":"A"}"#,
            now,
        );
        parts.headers.remove("content-md5");

        let outcome = validator().validate_at(&parts, &body, now);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::BodyMismatch, _)
        ));
    }

    #[test]
    fn test_should_reject_tampered_body() {
        let now = Utc::now();
        let (parts, mut body) = signed_request(
            "POST",
            "http://localhost/api/Subscribers",
            br#"{"Email":"a@b.com","Name":"A"}"#,
            now,
        );
        body[0] ^= 0x01;

        let outcome = validator().validate_at(&parts, &body, now);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::BodyTampered, _)
        ));
    }

    #[test]
    fn test_should_skip_body_check_for_chunked_requests() {
        let now = Utc::now();
        let body = b"chunked payload";

        let request = http::Request::builder()
            .method("POST")
            .uri("http://localhost/api/Subscribers")
            .header(http::header::DATE, rfc1123(now))
            .header(http::header::TRANSFER_ENCODING, "chunked")
            .body(())
            .unwrap();
        let canonical = build_canonical_request(
            request.method(),
            request.uri(),
            request.headers(),
            ACCOUNT,
        );
        let signature = BASE64.encode(hmac_sha256(KEY, canonical.as_bytes()));
        let (mut parts, ()) = request.into_parts();
        parts.headers.insert(
            http::header::AUTHORIZATION,
            format!("{SCHEME} {ACCOUNT}:{signature}").parse().unwrap(),
        );

        let outcome = validator().validate_at(&parts, body, now);
        assert!(matches!(outcome, ValidationOutcome::Authenticated(_)));
    }

    #[test]
    fn test_should_reject_tampered_signature() {
        let now = Utc::now();
        let (mut parts, body) = signed_request("GET", "http://localhost/api/Subscribers", b"", now);

        let sent = parts.headers[http::header::AUTHORIZATION]
            .to_str()
            .unwrap()
            .to_owned();
        let (account, sig) = parse_credential(&sent).unwrap();
        let mut tampered = sig.clone();
        tampered[0] ^= 0x01;
        parts.headers.insert(
            http::header::AUTHORIZATION,
            format!("{SCHEME} {account}:{}", BASE64.encode(tampered))
                .parse()
                .unwrap(),
        );

        let outcome = validator().validate_at(&parts, &body, now);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::SignatureInvalid, _)
        ));
    }

    #[test]
    fn test_should_reject_signature_over_modified_query() {
        let now = Utc::now();
        let (parts, body) = signed_request("GET", "http://localhost/api/Subscribers?page=2", b"", now);

        // Re-target the signed request at a different resource.
        let (mut replayed, ()) = http::Request::builder()
            .method("GET")
            .uri("http://localhost/api/Subscribers?page=3")
            .body(())
            .unwrap()
            .into_parts();
        replayed.headers = parts.headers.clone();

        let outcome = validator().validate_at(&replayed, &body, now);
        assert!(matches!(
            outcome,
            ValidationOutcome::Rejected(RejectionKind::SignatureInvalid, _)
        ));
    }

    #[test]
    fn test_should_attach_claims_from_provider() {
        struct RoleProvider;
        impl ClaimsProvider for RoleProvider {
            fn claims_for(&self, account: &str) -> Vec<Claim> {
                vec![Claim::new("role", format!("{account}-admin"))]
            }
        }

        let validator = validator().with_claims_provider(Arc::new(RoleProvider));
        let now = Utc::now();
        let (parts, body) = signed_request("GET", "http://localhost/api/Subscribers", b"", now);

        let ValidationOutcome::Authenticated(principal) = validator.validate_at(&parts, &body, now)
        else {
            panic!("expected authentication");
        };
        assert_eq!(
            principal.claims,
            vec![
                Claim::name(ACCOUNT),
                Claim::new("role", "barryd-admin"),
            ]
        );
    }
}
