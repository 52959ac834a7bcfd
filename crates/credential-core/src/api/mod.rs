//! REST API for credential-core
//!
//! | Route                         | Gate          |
//! |-------------------------------|---------------|
//! | `POST /api/register`          | none          |
//! | `POST /api/login`             | none          |
//! | `GET  /api/me`                | authenticated |
//! | `GET  /api/admin/users`       | elevated      |
//! | `PUT  /api/admin/users/{id}`  | elevated      |

mod error;
mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use handlers::{LoginResponse, MeResponse};

use crate::gate::AccessGate;
use crate::AuthenticationService;

/// Shared state for all handlers
#[derive(Clone)]
pub struct ApiState {
    pub auth_service: Arc<AuthenticationService>,
    pub gate: AccessGate,
}

/// Create the REST API router
pub fn create_router(state: ApiState) -> Router {
    let public = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login));

    let user = state
        .gate
        .authenticated(Router::new().route("/me", get(handlers::me)));

    let admin = state.gate.elevated(
        Router::new()
            .route("/users", get(handlers::list_users))
            .route("/users/{id}", put(handlers::update_user)),
    );

    Router::new()
        .nest("/api", public.merge(user).nest("/admin", admin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
