//! Admission scenarios through the full router

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use credential_core::config::PasswordConfig;
use credential_core::{create_router, init_with_clock, ApiState, Identity, ManualClock, ServiceConfig};

const ADMIN_EMAIL: &str = "secretaria@paroquia.org";
const PASSWORD: &str = "AveMaria123";

struct TestApp {
    router: Router,
    state: ApiState,
    clock: Arc<ManualClock>,
}

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn setup() -> TestApp {
    let config = ServiceConfig {
        admin_email: Some(ADMIN_EMAIL.to_string()),
        password: PasswordConfig::low_cost(),
        ..Default::default()
    }
    .with_signing_secret("access-gate-test-secret-long-enough-0123");

    let clock = Arc::new(ManualClock::new(t0()));
    let state = init_with_clock(&config, clock.clone()).unwrap();

    TestApp {
        router: create_router(state.clone()),
        state,
        clock,
    }
}

async fn send(app: &TestApp, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers accounts 1..=7; account 3 uses the admin email.
async fn register_parish(app: &TestApp) {
    for n in 1..=7u64 {
        let email = if n == 3 {
            ADMIN_EMAIL.to_string()
        } else {
            format!("fiel{}@paroquia.org", n)
        };
        let (status, body) = send(
            app,
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "name": format!("Fiel {}", n), "email": email, "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], n);
    }
}

async fn login(app: &TestApp, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_regular_account_lifecycle() {
    let app = setup();
    register_parish(&app).await;

    let token = login(&app, "fiel7@paroquia.org").await;

    app.clock.advance(Duration::hours(1));

    let (status, body) = send(&app, Method::GET, "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "administrator access required" }));

    let (status, body) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject_id"], 7);
    assert_eq!(body["is_admin"], false);
    assert_eq!(body["email"], "fiel7@paroquia.org");

    app.clock.advance(Duration::hours(24));

    let (status, body) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "credential has expired" }));
}

#[tokio::test]
async fn test_elevated_account_reaches_admin_routes() {
    let app = setup();
    register_parish(&app).await;

    let token = login(&app, ADMIN_EMAIL).await;
    app.clock.advance(Duration::hours(1));

    let (status, body) = send(&app, Method::GET, "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 7);
    assert!(body[0].get("password_hash").is_none());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/admin/users/7",
        Some(&token),
        Some(json!({ "is_admin": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], true);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/admin/users/99",
        Some(&token),
        Some(json!({ "name": "Ninguém" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_or_malformed_header_is_unauthorized() {
    let app = setup();

    for path in ["/api/me", "/api/admin/users"] {
        let (status, body) = send(&app, Method::GET, path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", path);
        assert_eq!(body, json!({ "error": "missing or malformed credential" }));
    }

    let request = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, "Basic Zm9vOmJhcg==")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_foreign_signature_is_unauthorized_even_for_admin_claim() {
    let app = setup();
    register_parish(&app).await;

    let other = ServiceConfig {
        password: PasswordConfig::low_cost(),
        ..Default::default()
    }
    .with_signing_secret("some-other-deployment-secret-0123456789");
    let other_state = init_with_clock(&other, app.clock.clone()).unwrap();
    let forged = other_state
        .auth_service
        .issuer()
        .issue(&Identity { id: 3, elevated: true }, t0())
        .unwrap();

    let (status, body) = send(&app, Method::GET, "/api/admin/users", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "invalid credential signature" }));
}

#[tokio::test]
async fn test_issued_credential_survives_until_last_second() {
    let app = setup();
    register_parish(&app).await;

    let token = app
        .state
        .auth_service
        .issuer()
        .issue(&Identity { id: 5, elevated: false }, t0())
        .unwrap();

    app.clock.set(t0() + Duration::seconds(86_399));
    let (status, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.set(t0() + Duration::seconds(86_400));
    let (status, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
