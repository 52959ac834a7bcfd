//! Signed credentials: encoding, issuance and verification.
//!
//! A credential is a compact HMAC-SHA256 JWS carrying a subject id, the
//! elevated flag and an expiry. Nothing about a credential is stored on the
//! server; validity is decided from the token, the signing secret and the
//! current time alone.

mod codec;
mod issuer;
mod verifier;

use thiserror::Error;

pub use codec::{Claims, ClaimsCodec, SigningSecret};
pub use issuer::{CredentialIssuer, DEFAULT_TTL_SECONDS};
pub use verifier::{AccessDecision, CredentialVerifier, BEARER_PREFIX};

/// Why a request was refused admission.
///
/// These are expected outcomes, not faults; each maps to exactly one
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Header absent, wrong scheme, or a token that does not parse.
    #[error("missing or malformed credential")]
    MalformedToken,

    /// Signature does not match the payload under the server secret.
    #[error("invalid credential signature")]
    BadSignature,

    /// Signature is valid but `exp <= now`.
    #[error("credential has expired")]
    Expired,

    /// Authenticated, but the route requires the elevated flag.
    #[error("administrator access required")]
    Forbidden,
}

impl CredentialError {
    /// Returns `true` for outcomes that mean "authenticate again".
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, CredentialError::Forbidden)
    }
}
