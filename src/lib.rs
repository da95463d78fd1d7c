//! MES API Library
//!
//! Backend for a Manufacturing Execution System: ISA-95 plant hierarchy,
//! work orders, production schedules and runs, OEE counters, and downtime
//! tracking.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Versioned API routes. Everything except status/health sits behind the
/// bearer-token middleware.
pub fn api_v1_routes() -> Router<AppState> {
    let protected = Router::new()
        .nest("/enterprises", handlers::enterprise::routes())
        .nest("/sites", handlers::site::routes())
        .nest("/areas", handlers::area::routes())
        .nest("/lines", handlers::line::routes())
        .nest("/cells", handlers::cell::routes())
        .nest("/product-codes", handlers::work_orders::product_code_routes())
        .nest("/work-orders", handlers::work_orders::routes())
        .nest("/schedules", handlers::schedules::schedule_routes())
        .nest("/runs", handlers::schedules::run_routes())
        .nest("/oee", handlers::oee::routes())
        .nest("/downtime", handlers::downtime::routes())
        .layer(axum::middleware::from_fn(auth::auth_middleware));

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(protected)
}

async fn api_status() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    Json(json!({
        "status": "ok",
        "service": "mes-api",
        "version": version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
