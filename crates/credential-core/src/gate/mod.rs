//! Request admission gates.
//!
//! Two policies, applied in a fixed order:
//!
//! 1. **Authentication**: reads the `Authorization` header, runs the
//!    [`CredentialVerifier`], and either rejects with 401 or attaches a
//!    [`RequestIdentity`] to the request.
//! 2. **Elevation**: reads the [`RequestIdentity`] and rejects with 403 unless
//!    it carries the elevated flag.
//!
//! The elevation policy is not exported; the only way to install it is
//! [`AccessGate::elevated`], which always puts authentication in front of it.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use serde::Serialize;

use crate::api::ApiError;
use crate::clock::Clock;
use crate::credential::{AccessDecision, CredentialError, CredentialVerifier};

/// Who the caller is, as established by the authentication gate.
///
/// Handlers take this as an extractor; it is only present on routes behind
/// [`AccessGate::authenticated`] or [`AccessGate::elevated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestIdentity {
    pub subject_id: u64,
    #[serde(rename = "is_admin")]
    pub elevated: bool,
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestIdentity>()
            .copied()
            .ok_or_else(|| ApiError::from(CredentialError::MalformedToken))
    }
}

/// Installs the admission policies on routers.
#[derive(Clone)]
pub struct AccessGate {
    verifier: Arc<CredentialVerifier>,
    clock: Arc<dyn Clock>,
}

impl AccessGate {
    pub fn new(verifier: Arc<CredentialVerifier>, clock: Arc<dyn Clock>) -> Self {
        Self { verifier, clock }
    }

    /// Runs the authentication policy against a set of request headers.
    pub fn admit(&self, headers: &HeaderMap) -> AccessDecision {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        self.verifier.verify(authorization, self.clock.now())
    }

    /// Requires a valid credential on every route of `router`.
    ///
    /// `router` must already have its routes; axum refuses route layers on an
    /// empty router.
    pub fn authenticated<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(self.clone(), authenticate))
    }

    /// Requires a valid credential with the elevated flag on every route of
    /// `router`.
    pub fn elevated<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        // The layer added last runs first.
        router
            .route_layer(middleware::from_fn(require_elevation))
            .route_layer(middleware::from_fn_with_state(self.clone(), authenticate))
    }
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("verifier", &self.verifier)
            .finish()
    }
}

async fn authenticate(State(gate): State<AccessGate>, mut request: Request, next: Next) -> Response {
    match gate.admit(request.headers()) {
        AccessDecision::Allow { subject_id, elevated } => {
            request
                .extensions_mut()
                .insert(RequestIdentity { subject_id, elevated });
            next.run(request).await
        }
        AccessDecision::Deny { reason } => {
            tracing::debug!(
                reason = %reason,
                path = %request.uri().path(),
                "Credential rejected"
            );
            ApiError::from(reason).into_response()
        }
    }
}

async fn require_elevation(request: Request, next: Next) -> Response {
    match request.extensions().get::<RequestIdentity>().copied() {
        Some(identity) if identity.elevated => next.run(request).await,
        Some(identity) => {
            tracing::warn!(
                subject_id = identity.subject_id,
                path = %request.uri().path(),
                "Administrator access denied"
            );
            ApiError::from(CredentialError::Forbidden).into_response()
        }
        None => {
            tracing::warn!("No request identity found, denying access");
            ApiError::from(CredentialError::Forbidden).into_response()
        }
    }
}
