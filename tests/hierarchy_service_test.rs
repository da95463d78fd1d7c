//! Hierarchy validation tests: parent resolution and sibling-name
//! uniqueness across the plant tree.

use chrono::Utc;
use mes_api::{
    entities::{area, enterprise, site},
    errors::ServiceError,
    services::hierarchy::{CreateEnterprise, CreateNode, HierarchyService, UpdateNode},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;

fn enterprise_model(id: i32, name: &str) -> enterprise::Model {
    enterprise::Model {
        id,
        name: name.to_string(),
        disabled: false,
        created_at: Utc::now(),
    }
}

fn site_model(id: i32, name: &str, enterprise_id: i32) -> site::Model {
    site::Model {
        id,
        name: name.to_string(),
        disabled: false,
        enterprise_id,
        created_at: Utc::now(),
    }
}

fn area_model(id: i32, name: &str, site_id: i32) -> area::Model {
    area::Model {
        id,
        name: name.to_string(),
        disabled: false,
        site_id,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn creating_site_under_missing_enterprise_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<enterprise::Model>::new()])
        .into_connection();

    let service = HierarchyService::new(Arc::new(db), None);
    let err = service
        .create_site(CreateNode {
            name: "Plant North".into(),
            parent_id: 99,
            disabled: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn duplicate_sibling_site_name_is_a_conflict() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![enterprise_model(1, "Acme")]])
        .append_query_results([vec![site_model(7, "Plant North", 1)]])
        .into_connection();

    let service = HierarchyService::new(Arc::new(db), None);
    let err = service
        .create_site(CreateNode {
            name: "Plant North".into(),
            parent_id: 1,
            disabled: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn same_site_name_under_another_enterprise_is_allowed() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![enterprise_model(2, "Globex")]])
        // No sibling with that name under enterprise 2.
        .append_query_results([Vec::<site::Model>::new()])
        .append_query_results([vec![site_model(8, "Plant North", 2)]])
        .into_connection();

    let service = HierarchyService::new(Arc::new(db), None);
    let created = service
        .create_site(CreateNode {
            name: "Plant North".into(),
            parent_id: 2,
            disabled: false,
        })
        .await
        .unwrap();

    assert_eq!(created.enterprise_id, 2);
    assert_eq!(created.name, "Plant North");
}

#[tokio::test]
async fn enterprise_names_are_globally_unique() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![enterprise_model(1, "Acme")]])
        .into_connection();

    let service = HierarchyService::new(Arc::new(db), None);
    let err = service
        .create_enterprise(CreateEnterprise {
            name: "Acme".into(),
            disabled: true,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn creating_area_under_missing_site_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<site::Model>::new()])
        .into_connection();

    let service = HierarchyService::new(Arc::new(db), None);
    let err = service
        .create_area(CreateNode {
            name: "Packaging".into(),
            parent_id: 12,
            disabled: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn reparenting_area_to_missing_site_fails_with_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![area_model(3, "Packaging", 1)]])
        .append_query_results([Vec::<site::Model>::new()])
        .into_connection();

    let service = HierarchyService::new(Arc::new(db), None);
    let err = service
        .update_area(
            3,
            UpdateNode {
                parent_id: Some(55),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn blank_name_fails_validation_before_any_query() {
    // No mocked results: a query would error, so passing proves the
    // validator rejected the input first.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let service = HierarchyService::new(Arc::new(db), None);
    let err = service
        .create_enterprise(CreateEnterprise {
            name: String::new(),
            disabled: false,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::ValidationError(_)), "got {err:?}");
}
