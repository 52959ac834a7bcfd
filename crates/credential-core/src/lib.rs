//! # Credential-Core
//!
//! Signed session credentials and request admission for the parish backend.
//!
//! This crate provides:
//! - A claims codec producing compact HMAC-signed tokens
//! - Credential issuance with a fixed time-to-live
//! - Credential verification yielding an explicit access decision
//! - Authentication and elevation gates as axum middleware
//! - Account registration and password login on top of a pluggable store
//! - REST API wiring those pieces together
//!
//! ## Architecture
//!
//! The credential pieces are pure: they take the signing secret at
//! construction time and the current time as an argument, and never touch
//! shared mutable state. Everything stateful (accounts, clock, HTTP) sits
//! behind a seam and is injected by [`init`] or [`init_with_clock`].

pub mod error;
pub mod types;
pub mod clock;
pub mod credential;
pub mod gate;
pub mod accounts;
pub mod auth;
pub mod validation;
pub mod api;
pub mod config;
pub mod logging;

use std::sync::Arc;

pub use error::{Error, Result};
pub use types::{Account, Identity, LoginRequest, RegisterRequest, UpdateAccountRequest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{
    AccessDecision, Claims, ClaimsCodec, CredentialError, CredentialIssuer, CredentialVerifier,
    SigningSecret,
};
pub use gate::{AccessGate, RequestIdentity};
pub use accounts::{AccountStore, MemoryAccountStore, NewAccount};
pub use auth::{AuthenticationResult, AuthenticationService};
pub use api::{create_router, ApiState};
pub use config::ServiceConfig;

/// Initialize the service against the system clock.
pub fn init(config: &ServiceConfig) -> Result<ApiState> {
    init_with_clock(config, Arc::new(SystemClock))
}

/// Initialize the service with an explicit time source.
///
/// Fails with [`Error::Config`] when no signing secret is configured; callers
/// are expected to treat that as fatal.
pub fn init_with_clock(config: &ServiceConfig, clock: Arc<dyn Clock>) -> Result<ApiState> {
    let secret = config.credential.signing_secret()?;
    let codec = Arc::new(ClaimsCodec::new(secret));

    let issuer = CredentialIssuer::new(codec.clone(), config.credential.ttl()?);
    let verifier = Arc::new(CredentialVerifier::new(codec));

    let store: Arc<dyn AccountStore> = Arc::new(MemoryAccountStore::new());
    let auth_service = AuthenticationService::new(
        store,
        issuer,
        clock.clone(),
        config.password.clone(),
        config.admin_email.clone(),
    )?;

    Ok(ApiState {
        auth_service: Arc::new(auth_service),
        gate: AccessGate::new(verifier, clock),
    })
}
