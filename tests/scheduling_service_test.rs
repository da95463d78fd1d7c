//! Run lifecycle tests: the estimated-finish snapshot and the
//! status-derived `closed` flag.

use chrono::{DateTime, NaiveDateTime, Utc};
use mes_api::{
    entities::{
        run,
        schedule::{self, ScheduleType},
    },
    errors::ServiceError,
    services::scheduling::{CreateRun, CreateSchedule, SchedulingService, UpdateRun, UpdateSchedule},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;

fn dt(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .unwrap()
        .and_utc()
}

fn schedule_model(id: i32, finish: DateTime<Utc>) -> schedule::Model {
    schedule::Model {
        id,
        line_id: 1,
        work_order_id: None,
        schedule_type: ScheduleType::Planned,
        schedule_start_datetime: dt("2025-03-01 06:00:00"),
        schedule_finish_datetime: finish,
        note: None,
        created_at: dt("2025-02-28 00:00:00"),
    }
}

fn run_model(id: i32, schedule_id: i32, estimate: Option<DateTime<Utc>>) -> run::Model {
    run::Model {
        id,
        schedule_id,
        run_start_datetime: dt("2025-03-01 06:05:00"),
        run_stop_datetime: None,
        closed: false,
        estimated_finish_time: estimate,
    }
}

#[tokio::test]
async fn run_estimate_is_copied_from_schedule_finish() {
    let finish = dt("2025-03-01 14:00:00");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![schedule_model(5, finish)]])
        .append_query_results([vec![run_model(9, 5, Some(finish))]])
        .into_connection();

    let service = SchedulingService::new(Arc::new(db), None);
    let created = service
        .create_run(CreateRun {
            schedule_id: 5,
            run_start_datetime: dt("2025-03-01 06:05:00"),
        })
        .await
        .unwrap();

    assert_eq!(created.estimated_finish_time, Some(finish));
}

#[tokio::test]
async fn editing_schedule_leaves_existing_run_estimates_alone() {
    // The snapshot is stale by design: pushing the schedule finish out by two
    // hours must only touch the schedule row.
    let original_finish = dt("2025-03-01 14:00:00");
    let moved_finish = dt("2025-03-01 16:00:00");

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // update_schedule: fetch then update
        .append_query_results([vec![schedule_model(5, original_finish)]])
        .append_query_results([vec![schedule_model(5, moved_finish)]])
        // the run still carries the original snapshot
        .append_query_results([vec![run_model(9, 5, Some(original_finish))]])
        .into_connection();

    let service = SchedulingService::new(Arc::new(db), None);
    let updated = service
        .update_schedule(
            5,
            UpdateSchedule {
                schedule_finish_datetime: Some(moved_finish),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.schedule_finish_datetime, moved_finish);

    let run = service.get_run(9).await.unwrap();
    assert_eq!(run.estimated_finish_time, Some(original_finish));
}

#[tokio::test]
async fn schedule_creation_resolves_line_first() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<mes_api::entities::line::Model>::new()])
        .into_connection();

    let service = SchedulingService::new(Arc::new(db), None);
    let err = service
        .create_schedule(CreateSchedule {
            line_id: 4,
            work_order_id: None,
            schedule_type: ScheduleType::Planned,
            schedule_start_datetime: dt("2025-03-01 06:00:00"),
            schedule_finish_datetime: dt("2025-03-01 14:00:00"),
            note: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn inverted_schedule_window_is_invalid() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let service = SchedulingService::new(Arc::new(db), None);
    let err = service
        .create_schedule(CreateSchedule {
            line_id: 4,
            work_order_id: None,
            schedule_type: ScheduleType::Unplanned,
            schedule_start_datetime: dt("2025-03-01 14:00:00"),
            schedule_finish_datetime: dt("2025-03-01 06:00:00"),
            note: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::InvalidInput(_)), "got {err:?}");
}

#[tokio::test]
async fn non_completed_status_reopens_the_run() {
    let existing = run::Model {
        closed: true,
        ..run_model(9, 5, None)
    };
    let reopened = run_model(9, 5, None);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![existing]])
        .append_query_results([vec![reopened]])
        .into_connection();

    let service = SchedulingService::new(Arc::new(db), None);
    let updated = service
        .update_run(
            9,
            UpdateRun {
                run_stop_datetime: None,
                status: Some("in_progress".into()),
            },
        )
        .await
        .unwrap();

    assert!(!updated.closed);
}
