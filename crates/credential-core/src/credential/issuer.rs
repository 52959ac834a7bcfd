//! Credential issuance

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::{Claims, ClaimsCodec};
use crate::{Identity, Result};

/// Default credential lifetime: 24 hours.
pub const DEFAULT_TTL_SECONDS: i64 = 86_400;

/// Turns an authenticated identity into a signed credential.
#[derive(Debug, Clone)]
pub struct CredentialIssuer {
    codec: Arc<ClaimsCodec>,
    ttl: Duration,
}

impl CredentialIssuer {
    pub fn new(codec: Arc<ClaimsCodec>, ttl: Duration) -> Self {
        Self { codec, ttl }
    }

    /// Issuer with the default 24 hour lifetime.
    pub fn with_default_ttl(codec: Arc<ClaimsCodec>) -> Self {
        Self::new(codec, Duration::seconds(DEFAULT_TTL_SECONDS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Builds the claims that [`issue`](Self::issue) would sign.
    pub fn claims_for(&self, identity: &Identity, now: DateTime<Utc>) -> Claims {
        let iat = now.timestamp();
        Claims {
            subject_id: identity.id,
            elevated: identity.elevated,
            iat,
            exp: iat.saturating_add(self.ttl.num_seconds()),
        }
    }

    /// Expiry stamped on a credential issued at `now`.
    /// Saturates at the latest representable instant.
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let exp = now.timestamp().saturating_add(self.ttl.num_seconds());
        DateTime::from_timestamp(exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String> {
        let claims = self.claims_for(identity, now);
        let token = self.codec.encode(&claims)?;

        tracing::debug!(
            subject_id = identity.id,
            elevated = identity.elevated,
            exp = claims.exp,
            "Issued credential"
        );

        Ok(token)
    }
}
