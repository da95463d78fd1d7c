//! Count log validation: positive counts and tag/type agreement.

use chrono::{DateTime, Utc};
use mes_api::{
    entities::{count_tag, count_type},
    errors::ServiceError,
    services::{
        metrics::MetricsService,
        oee::{CreateCountHistory, CreateCountTag, OeeService},
    },
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;

fn service(db: DatabaseConnection) -> OeeService {
    let db = Arc::new(db);
    let metrics = Arc::new(MetricsService::new(
        db.clone(),
        None,
        "Good".to_string(),
        "Scrap".to_string(),
    ));
    OeeService::new(db, metrics, None)
}

fn tag(id: i32, parent_id: i32) -> count_tag::Model {
    count_tag::Model {
        id,
        path: format!("Line1/Tag{id}"),
        parent_id,
    }
}

fn count_type_model(id: i32, label: &str) -> count_type::Model {
    count_type::Model {
        id,
        label: label.to_string(),
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

#[tokio::test]
async fn count_with_mismatched_tag_and_type_fails_validation() {
    // Tag 1 reports into count type 1 ("Good"), but the event claims type 2.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![tag(1, 1)]])
        .append_query_results([vec![count_type_model(2, "Scrap")]])
        .into_connection();

    let err = service(db)
        .record_count(CreateCountHistory {
            timestamp: now(),
            count: 5,
            tag_id: 1,
            count_type_id: 2,
            run_id: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ValidationError(_)), "got {err:?}");
}

#[tokio::test]
async fn non_positive_count_fails_before_any_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let err = service(db)
        .record_count(CreateCountHistory {
            timestamp: now(),
            count: 0,
            tag_id: 1,
            count_type_id: 1,
            run_id: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ValidationError(_)), "got {err:?}");
}

#[tokio::test]
async fn count_against_missing_tag_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<count_tag::Model>::new()])
        .into_connection();

    let err = service(db)
        .record_count(CreateCountHistory {
            timestamp: now(),
            count: 5,
            tag_id: 77,
            count_type_id: 1,
            run_id: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn tag_must_reference_existing_count_type() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<count_type::Model>::new()])
        .into_connection();

    let err = service(db)
        .create_count_tag(CreateCountTag {
            path: "Line1/GoodCount".into(),
            parent_id: 42,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}
