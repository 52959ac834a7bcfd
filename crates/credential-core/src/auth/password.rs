//! Argon2id password hashing

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use argon2::{Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version};
use password_hash::{PasswordHash, SaltString};
use rand::rngs::OsRng;

use crate::config::PasswordConfig;
use crate::{Error, Result};

/// Hashes and verifies passwords with the configured Argon2id cost.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Verified against when the account does not exist, so both login
    /// failures cost one Argon2 run.
    dummy_hash: String,
    #[cfg(test)]
    verifications: AtomicUsize,
}

impl PasswordHasher {
    pub fn new(config: &PasswordConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| Error::Config(format!("Invalid Argon2 parameters: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = argon2
            .hash_password(b"credential-core-dummy-password", &salt)?
            .to_string();

        Ok(Self {
            argon2,
            dummy_hash,
            #[cfg(test)]
            verifications: AtomicUsize::new(0),
        })
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(self.argon2.hash_password(password.as_bytes(), &salt)?.to_string())
    }

    /// Returns `false` on mismatch or an unparsable stored hash.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        #[cfg(test)]
        self.verifications.fetch_add(1, Ordering::SeqCst);

        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash did not parse");
                false
            }
        }
    }

    /// Burns one verification against the dummy hash.
    pub fn verify_dummy(&self, password: &str) {
        let _ = self.verify(password, &self.dummy_hash);
    }

    #[cfg(test)]
    pub(crate) fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }
}
