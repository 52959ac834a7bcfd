//! Claims encoding and signature checking

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::CredentialError;
use crate::{Error, Result};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Recommended minimum secret length in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Shared symmetric key used to sign and verify credentials.
#[derive(Clone)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Wraps a secret, rejecting an empty one.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::Config("signing secret is empty".to_string()));
        }
        if secret.len() < MIN_SECRET_LEN {
            tracing::warn!(
                length = secret.len(),
                "Signing secret is shorter than recommended ({} bytes)",
                MIN_SECRET_LEN
            );
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Credential claims
///
/// Serialized in declaration order: `sub`, `admin`, `iat`, `exp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub", with = "subject_id_serde")]
    pub subject_id: u64,
    #[serde(rename = "admin")]
    pub elevated: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// A credential is live strictly before `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Encodes claims to signed tokens and back.
pub struct ClaimsCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
}

impl ClaimsCodec {
    pub fn new(secret: SigningSecret) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        // Expiry is checked against the caller's clock, not the library's.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key,
            decoding_key,
            header: Header::new(ALGORITHM),
            validation,
        }
    }

    /// Serializes and signs `claims`. Identical input gives identical output.
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        encode(&self.header, claims, &self.encoding_key).map_err(Error::Jwt)
    }

    /// Checks the signature, then the payload, then the expiry.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> std::result::Result<Claims, CredentialError> {
        let (message, signature) = split_token(token).ok_or(CredentialError::MalformedToken)?;

        // Constant-time comparison of the recomputed tag.
        match jsonwebtoken::crypto::verify(signature, message.as_bytes(), &self.decoding_key, ALGORITHM) {
            Ok(true) => {}
            Ok(false) | Err(_) => return Err(CredentialError::BadSignature),
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Signed credential payload did not parse");
                CredentialError::MalformedToken
            })?;

        if claims.is_expired_at(now) {
            return Err(CredentialError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimsCodec")
            .field("algorithm", &self.header.alg)
            .finish()
    }
}

/// Splits `header.payload.signature` into (`header.payload`, `signature`).
fn split_token(token: &str) -> Option<(&str, &str)> {
    if token.chars().any(char::is_whitespace) {
        return None;
    }

    let (message, signature) = token.rsplit_once('.')?;
    let (header, payload) = message.split_once('.')?;

    if header.is_empty() || payload.is_empty() || signature.is_empty() || payload.contains('.') {
        return None;
    }

    Some((message, signature))
}

/// `sub` is a JWT StringOrURI; the id travels as its decimal rendering.
mod subject_id_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(id: &u64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid subject id: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-that-is-long-enough-for-testing";

    fn codec(secret: &str) -> ClaimsCodec {
        ClaimsCodec::new(SigningSecret::new(secret).unwrap())
    }

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    fn claims() -> Claims {
        Claims {
            subject_id: 7,
            elevated: false,
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        }
    }

    #[test]
    fn test_round_trip() {
        let codec = codec(SECRET);
        let token = codec.encode(&claims()).unwrap();

        let decoded = codec.decode(&token, at(1_700_000_100)).unwrap();
        assert_eq!(decoded, claims());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = codec(SECRET);
        assert_eq!(codec.encode(&claims()).unwrap(), codec.encode(&claims()).unwrap());
    }

    #[test]
    fn test_token_is_header_safe() {
        let token = codec(SECRET).encode(&claims()).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.chars().any(char::is_whitespace));
    }

    #[test]
    fn test_wrong_secret() {
        let token = codec(SECRET).encode(&claims()).unwrap();
        let other = codec("another-secret-that-is-also-long-enough");

        assert_eq!(
            other.decode(&token, at(1_700_000_100)),
            Err(CredentialError::BadSignature)
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = codec(SECRET);
        let token = codec.encode(&claims()).unwrap();

        assert!(codec.decode(&token, at(1_700_086_399)).is_ok());
        assert_eq!(codec.decode(&token, at(1_700_086_400)), Err(CredentialError::Expired));
        assert_eq!(codec.decode(&token, at(1_800_000_000)), Err(CredentialError::Expired));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = codec(SECRET);
        let now = at(1_700_000_100);

        for token in ["", "abc", "a.b", "a.b.c.d", ".b.c", "a..c", "a.b.", "a b.c.d"] {
            assert_eq!(
                codec.decode(token, now),
                Err(CredentialError::MalformedToken),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_tampered_payload() {
        let codec = codec(SECRET);
        let token = codec.encode(&claims()).unwrap();

        // Swap in the payload of an elevated token, keep the old signature.
        let elevated = codec.encode(&Claims { elevated: true, ..claims() }).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let elevated_parts: Vec<&str> = elevated.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], elevated_parts[1], parts[2]);

        assert_eq!(
            codec.decode(&forged, at(1_700_000_100)),
            Err(CredentialError::BadSignature)
        );
    }

    #[test]
    fn test_signed_but_unparsable_payload() {
        let codec = codec(SECRET);
        let token = encode(
            &Header::new(ALGORITHM),
            &serde_json::json!({ "sub": "not-a-number", "exp": 1_700_086_400 }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            codec.decode(&token, at(1_700_000_100)),
            Err(CredentialError::MalformedToken)
        );
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(SigningSecret::new(""), Err(Error::Config(_))));
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let secret = SigningSecret::new(SECRET).unwrap();
        assert!(!format!("{:?}", secret).contains(SECRET));
    }
}
