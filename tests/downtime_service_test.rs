//! Downtime reason tree and state-log validation.

use chrono::{DateTime, Utc};
use mes_api::{
    entities::{run, state_reason},
    errors::ServiceError,
    services::{
        downtime::{CreateStateHistory, DowntimeService},
        metrics::MetricsService,
    },
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;

fn service(db: DatabaseConnection) -> DowntimeService {
    let db = Arc::new(db);
    let metrics = Arc::new(MetricsService::new(
        db.clone(),
        None,
        "Good".to_string(),
        "Scrap".to_string(),
    ));
    DowntimeService::new(db, metrics, None)
}

fn reason(id: i32, code: &str, parent_id: Option<i32>) -> state_reason::Model {
    state_reason::Model {
        id,
        name: format!("Reason {id}"),
        code: code.to_string(),
        record_downtime: true,
        planned_downtime: false,
        operator_selectable: true,
        parent_id,
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[tokio::test]
async fn state_with_missing_reason_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<state_reason::Model>::new()])
        .into_connection();

    let err = service(db)
        .record_state(CreateStateHistory {
            start_datetime: now(),
            end_datetime: None,
            state_reason_id: 13,
            line_id: None,
            run_id: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn state_with_missing_run_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![reason(1, "MAINT", None)]])
        .append_query_results([Vec::<run::Model>::new()])
        .into_connection();

    let err = service(db)
        .record_state(CreateStateHistory {
            start_datetime: now(),
            end_datetime: None,
            state_reason_id: 1,
            line_id: None,
            run_id: Some(123),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn inverted_state_interval_is_invalid() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let start = now();
    let err = service(db)
        .record_state(CreateStateHistory {
            start_datetime: start,
            end_datetime: Some(start - chrono::Duration::minutes(5)),
            state_reason_id: 1,
            line_id: None,
            run_id: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)), "got {err:?}");
}

#[tokio::test]
async fn resolve_path_walks_from_root_to_node() {
    // 1 (root) <- 2 <- 3
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![reason(3, "JAM-SENSOR", Some(2))]])
        .append_query_results([vec![reason(2, "JAM", Some(1))]])
        .append_query_results([vec![reason(1, "UNPLANNED", None)]])
        .into_connection();

    let chain = service(db).resolve_path(3).await.unwrap();
    let codes: Vec<&str> = chain.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["UNPLANNED", "JAM", "JAM-SENSOR"]);
}

#[tokio::test]
async fn sub_reason_listing_requires_existing_reason() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<state_reason::Model>::new()])
        .into_connection();

    let err = service(db).list_sub_reasons(404).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}
