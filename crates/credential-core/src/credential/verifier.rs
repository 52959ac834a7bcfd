//! Credential verification

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::{ClaimsCodec, CredentialError};

/// Scheme marker expected in front of the token in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Per-request admission outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow { subject_id: u64, elevated: bool },
    Deny { reason: CredentialError },
}

impl AccessDecision {
    pub fn deny(reason: CredentialError) -> Self {
        AccessDecision::Deny { reason }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allow { .. })
    }

    /// The refusal reason, if any.
    pub fn reason(&self) -> Option<CredentialError> {
        match self {
            AccessDecision::Allow { .. } => None,
            AccessDecision::Deny { reason } => Some(*reason),
        }
    }
}

/// Decides whether the bearer of a credential may proceed, and as whom.
///
/// Pure function of (header, now, secret); safe to share across any number of
/// concurrent requests.
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    codec: Arc<ClaimsCodec>,
}

impl CredentialVerifier {
    pub fn new(codec: Arc<ClaimsCodec>) -> Self {
        Self { codec }
    }

    /// Verifies a raw `Authorization` header value.
    pub fn verify(&self, authorization: Option<&str>, now: DateTime<Utc>) -> AccessDecision {
        let token = match authorization.and_then(|value| value.strip_prefix(BEARER_PREFIX)) {
            Some(token) if !token.is_empty() => token,
            _ => return AccessDecision::deny(CredentialError::MalformedToken),
        };

        self.verify_token(token, now)
    }

    /// Verifies a bare token, without the scheme prefix.
    pub fn verify_token(&self, token: &str, now: DateTime<Utc>) -> AccessDecision {
        match self.codec.decode(token, now) {
            Ok(claims) => AccessDecision::Allow {
                subject_id: claims.subject_id,
                elevated: claims.elevated,
            },
            Err(reason) => AccessDecision::deny(reason),
        }
    }
}
