//! Authentication service

mod password;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use password::PasswordHasher;

use crate::accounts::{AccountStore, NewAccount};
use crate::clock::Clock;
use crate::config::PasswordConfig;
use crate::credential::CredentialIssuer;
use crate::types::normalize_email;
use crate::validation::{validate_login, validate_register};
use crate::{Account, Error, LoginRequest, RegisterRequest, Result, UpdateAccountRequest};

/// Authentication service
///
/// Owns the password side of login and hands verified identities to the
/// [`CredentialIssuer`].
pub struct AuthenticationService {
    store: Arc<dyn AccountStore>,
    issuer: CredentialIssuer,
    clock: Arc<dyn Clock>,
    hasher: Arc<PasswordHasher>,
    password_config: PasswordConfig,
    admin_email: Option<String>,
}

/// Result of authentication
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    pub account: Account,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthenticationService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        issuer: CredentialIssuer,
        clock: Arc<dyn Clock>,
        password_config: PasswordConfig,
        admin_email: Option<String>,
    ) -> Result<Self> {
        let hasher = Arc::new(PasswordHasher::new(&password_config)?);

        Ok(Self {
            store,
            issuer,
            clock,
            hasher,
            password_config,
            admin_email: admin_email.map(|email| normalize_email(&email)),
        })
    }

    pub fn issuer(&self) -> &CredentialIssuer {
        &self.issuer
    }

    /// Registers a new account. The configured admin email registers elevated.
    pub async fn register(&self, request: RegisterRequest) -> Result<Account> {
        validate_register(&request, self.password_config.min_length)?;

        let email = normalize_email(&request.email);
        let elevated = self.admin_email.as_deref() == Some(email.as_str());
        let password_hash = self.hash_password(request.password.clone()).await?;

        let account = self
            .store
            .create_account(NewAccount {
                name: request.name.trim().to_string(),
                email,
                password_hash,
                elevated,
            })
            .await?;

        tracing::info!(account_id = account.id, elevated = account.elevated, "Account registered");
        Ok(account)
    }

    /// Checks email and password and issues a credential.
    ///
    /// Unknown email and wrong password both fail with
    /// [`Error::InvalidCredentials`].
    pub async fn authenticate_password(&self, email: &str, password: &str) -> Result<AuthenticationResult> {
        validate_login(&LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
        .map_err(|_| Error::InvalidCredentials)?;

        let account = self.store.find_by_email(email).await?;
        let stored_hash = account.as_ref().map(|a| a.password_hash.clone());
        let password_ok = self.check_password(password.to_string(), stored_hash).await?;

        let account = match account {
            Some(account) if password_ok => account,
            Some(account) => {
                tracing::debug!(account_id = account.id, "Login failed: wrong password");
                return Err(Error::InvalidCredentials);
            }
            None => {
                tracing::debug!("Login failed: unknown account");
                return Err(Error::InvalidCredentials);
            }
        };

        let now = self.clock.now();
        let token = self.issuer.issue(&account.identity(), now)?;
        let expires_at = self.issuer.expires_at(now);

        tracing::info!(account_id = account.id, "Login succeeded");
        Ok(AuthenticationResult {
            account,
            token,
            expires_at,
        })
    }

    pub async fn get_account(&self, id: u64) -> Result<Account> {
        self.store
            .get_account(id)
            .await?
            .ok_or(Error::AccountNotFound(id))
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.store.list_accounts().await
    }

    pub async fn update_account(&self, id: u64, mut update: UpdateAccountRequest) -> Result<Account> {
        if let Some(name) = update.name.as_mut() {
            *name = name.trim().to_string();
            if name.is_empty() || name.chars().count() > 100 {
                return Err(Error::Validation("name must be between 1 and 100 characters".to_string()));
            }
        }

        let account = self.store.update_account(id, update).await?;
        tracing::info!(account_id = account.id, elevated = account.elevated, "Account updated");
        Ok(account)
    }

    async fn hash_password(&self, password: String) -> Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| Error::PasswordHash(format!("hashing task failed: {}", e)))?
    }

    /// Runs one Argon2 verification off the async workers. Without a stored
    /// hash it verifies against the dummy hash and reports a mismatch.
    async fn check_password(&self, password: String, stored_hash: Option<String>) -> Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => {
                hasher.verify_dummy(&password);
                false
            }
        })
        .await
        .map_err(|e| Error::PasswordHash(format!("verification task failed: {}", e)))
    }
}
