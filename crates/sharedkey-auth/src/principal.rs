//! Principals and claims produced by validation.
//!
//! A [`Principal`] is constructed fresh for every validated request and never
//! cached or mutated afterwards. The anonymous principal is a plain value
//! built on demand; there is no process-wide singleton.

/// The claim type carrying the principal's identity name.
pub const NAME_CLAIM: &str = "name";

/// A single claim attached to a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// The claim type, e.g. [`NAME_CLAIM`].
    pub claim_type: String,
    /// The claim value.
    pub value: String,
}

impl Claim {
    /// Create a claim of the given type and value.
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }

    /// Create a name claim.
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(NAME_CLAIM, value)
    }
}

/// The identity established by validating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// The account name that signed the request; empty for the anonymous
    /// principal.
    pub account: String,
    /// The claims attached to this principal.
    pub claims: Vec<Claim>,
}

impl Principal {
    /// Construct the principal for a successfully authenticated account.
    pub fn authenticated(account: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self {
            account: account.into(),
            claims,
        }
    }

    /// Construct the anonymous principal: an empty identity name and no
    /// further claims.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            account: String::new(),
            claims: vec![Claim::name("")],
        }
    }

    /// Whether this is the anonymous principal.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.account.is_empty()
    }
}

/// Trait for populating additional claims for an authenticated account.
///
/// This collaborator is optional; without one the claim set is just the
/// identity name.
pub trait ClaimsProvider: Send + Sync {
    /// Produce the claims to attach for the given account name.
    fn claims_for(&self, account: &str) -> Vec<Claim>;
}
