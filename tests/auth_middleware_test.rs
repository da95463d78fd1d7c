//! Router-level authentication tests: protected routes demand a valid
//! bearer token, status stays public.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    Router,
};
use mes_api::auth::{AuthConfig, AuthService};
use mes_api::config::AppConfig;
use mes_api::events::EventSender;
use mes_api::handlers::AppServices;
use mes_api::AppState;
use sea_orm::{DatabaseBackend, MockDatabase, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower::ServiceExt;

const TEST_SECRET: &str =
    "integration-test-secret-key-that-is-definitely-long-enough-for-hs256";

fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        jwt_secret: TEST_SECRET.into(),
        jwt_expiration: 600,
        auth_issuer: "mes-api".into(),
        auth_audience: "mes-clients".into(),
        host: "127.0.0.1".into(),
        port: 0,
        environment: "development".into(),
        log_level: "warn".into(),
        log_json: false,
        auto_migrate: false,
        db_max_connections: 1,
        db_min_connections: 1,
        cors_allowed_origins: None,
        good_count_label: "Good".into(),
        waste_count_label: "Scrap".into(),
    }
}

async fn inject_auth_service(
    State(auth): State<Arc<AuthService>>,
    mut req: Request<Body>,
    next: Next,
) -> axum::response::Response {
    req.extensions_mut().insert(auth);
    next.run(req).await
}

fn test_app(db: sea_orm::DatabaseConnection) -> (Router, Arc<AuthService>) {
    let cfg = test_config();
    let auth_service = Arc::new(AuthService::new(AuthConfig::new(
        cfg.jwt_secret.clone(),
        cfg.auth_issuer.clone(),
        cfg.auth_audience.clone(),
        Duration::from_secs(cfg.jwt_expiration),
    )));

    let db = Arc::new(db);
    let (event_tx, _event_rx) = mpsc::channel(16);
    let event_sender = EventSender::new(event_tx);
    let services = AppServices::new(db.clone(), event_sender.clone(), &cfg);

    let state = AppState {
        db,
        config: cfg,
        event_sender,
        services,
    };

    let app = Router::new()
        .nest("/api/v1", mes_api::api_v1_routes())
        .layer(axum::middleware::from_fn_with_state(
            auth_service.clone(),
            inject_auth_service,
        ))
        .with_state(state);

    (app, auth_service)
}

#[tokio::test]
async fn protected_route_without_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (app, _) = test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/enterprises")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_with_garbage_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (app, _) = test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/enterprises")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_with_valid_token_succeeds() {
    let count_row: BTreeMap<&str, Value> =
        BTreeMap::from([("num_items", Value::BigInt(Some(0)))]);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row]])
        .append_query_results([Vec::<mes_api::entities::enterprise::Model>::new()])
        .into_connection();
    let (app, auth_service) = test_app(db);

    let token = auth_service.issue_token("operator-1", None).unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/enterprises")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_endpoint_is_public() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (app, _) = test_app(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let (app, _) = test_app(db);

    // Hand-craft a token that expired an hour ago, well past any leeway.
    let now = chrono::Utc::now().timestamp();
    let claims = mes_api::auth::Claims {
        sub: "operator-1".into(),
        name: None,
        jti: "expired-token".into(),
        iat: now - 7200,
        exp: now - 3600,
        nbf: now - 7200,
        iss: "mes-api".into(),
        aud: "mes-clients".into(),
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/enterprises")
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
