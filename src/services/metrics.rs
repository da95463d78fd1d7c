use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{count_history, count_type, line, run, run_metrics, schedule, state_history, state_reason},
    errors::ServiceError,
    events::{Event, EventSender},
};

/// Raw inputs for one run's OEE calculation. Durations are seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsInput {
    pub total_time: f64,
    pub planned_downtime: f64,
    pub unplanned_downtime: f64,
    pub good_count: i32,
    pub waste_count: i32,
    /// Configured seconds per unit for the run's line, if any.
    pub ideal_cycle_time: Option<f64>,
}

/// Computed OEE ratios, all clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsTotals {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

fn clamp_ratio(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl MetricsInput {
    /// Availability = (total − planned − unplanned) / total; zero-length runs
    /// score 0.
    pub fn availability(&self) -> f64 {
        if self.total_time <= 0.0 {
            return 0.0;
        }
        clamp_ratio(
            (self.total_time - self.planned_downtime - self.unplanned_downtime) / self.total_time,
        )
    }

    /// Performance = (count × ideal cycle time) / run time. A line with no
    /// configured cycle time scores a neutral 1; a zero-length run scores 0.
    pub fn performance(&self) -> f64 {
        if self.total_time <= 0.0 {
            return 0.0;
        }
        let Some(ideal_cycle_time) = self.ideal_cycle_time else {
            return 1.0;
        };
        let run_time = self.total_time - self.planned_downtime - self.unplanned_downtime;
        if run_time <= 0.0 {
            return 0.0;
        }
        clamp_ratio(f64::from(self.total_count()) * ideal_cycle_time / run_time)
    }

    /// Quality = good / (good + waste); no counts scores 0.
    pub fn quality(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }
        clamp_ratio(f64::from(self.good_count) / f64::from(total))
    }

    pub fn total_count(&self) -> i32 {
        self.good_count.saturating_add(self.waste_count)
    }

    pub fn compute(&self) -> MetricsTotals {
        let availability = self.availability();
        let performance = self.performance();
        let quality = self.quality();
        MetricsTotals {
            availability,
            performance,
            quality,
            oee: availability * performance * quality,
        }
    }
}

/// Maintains `run_metrics` from the count and state logs.
///
/// Every count or downtime insert scoped to a run recomputes that run's
/// record in place, so the derived row never lags the logs feeding it.
#[derive(Clone)]
pub struct MetricsService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
    good_label: String,
    waste_label: String,
}

impl MetricsService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Option<EventSender>,
        good_label: String,
        waste_label: String,
    ) -> Self {
        Self {
            db,
            event_sender,
            good_label,
            waste_label,
        }
    }

    /// Recompute and upsert the metrics record for a run.
    #[instrument(skip(self))]
    pub async fn recompute_for_run(&self, run_id: i32) -> Result<run_metrics::Model, ServiceError> {
        let db = &*self.db;

        let run = run::Entity::find_by_id(run_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Run {run_id} not found")))?;

        let ideal_cycle_time = self.line_cycle_time_for(&run).await?;

        let now = Utc::now();
        let run_stop = run.run_stop_datetime.unwrap_or(now);
        let total_time = duration_seconds(run.run_start_datetime, run_stop);

        let (planned_downtime, unplanned_downtime) =
            self.downtime_for_run(run_id, run_stop, now).await?;
        let (good_count, waste_count) = self.counts_for_run(run_id).await?;

        let input = MetricsInput {
            total_time,
            planned_downtime,
            unplanned_downtime,
            good_count,
            waste_count,
            ideal_cycle_time,
        };
        let totals = input.compute();

        let existing = run_metrics::Entity::find()
            .filter(run_metrics::Column::RunId.eq(run_id))
            .one(db)
            .await?;

        let is_update = existing.is_some();
        let mut record = match existing {
            Some(model) => model.into_active_model(),
            None => run_metrics::ActiveModel {
                run_id: Set(run_id),
                ..Default::default()
            },
        };
        record.good_count = Set(good_count);
        record.waste_count = Set(waste_count);
        record.total_count = Set(input.total_count());
        record.availability = Set(totals.availability);
        record.performance = Set(totals.performance);
        record.quality = Set(totals.quality);
        record.oee = Set(totals.oee);
        record.planned_downtime = Set(planned_downtime);
        record.unplanned_downtime = Set(unplanned_downtime);
        record.total_time = Set(total_time);

        let saved = if is_update {
            record.update(db).await?
        } else {
            record
                .insert(db)
                .await
                .map_err(|e| ServiceError::write_error(e, format!("Metrics for run {run_id} already exist")))?
        };

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::RunMetricsRecomputed {
                    run_id,
                    oee: saved.oee,
                })
                .await;
        }

        info!(
            run_id,
            availability = saved.availability,
            performance = saved.performance,
            quality = saved.quality,
            oee = saved.oee,
            "run metrics recomputed"
        );

        Ok(saved)
    }

    /// Fetch the metrics record for a run, if one has been computed.
    pub async fn get_for_run(&self, run_id: i32) -> Result<Option<run_metrics::Model>, ServiceError> {
        let record = run_metrics::Entity::find()
            .filter(run_metrics::Column::RunId.eq(run_id))
            .one(&*self.db)
            .await?;
        Ok(record)
    }

    async fn line_cycle_time_for(&self, run: &run::Model) -> Result<Option<f64>, ServiceError> {
        let db = &*self.db;
        let schedule = schedule::Entity::find_by_id(run.schedule_id).one(db).await?;
        let Some(schedule) = schedule else {
            return Ok(None);
        };
        let line = line::Entity::find_by_id(schedule.line_id).one(db).await?;
        Ok(line.and_then(|l| l.ideal_cycle_time))
    }

    /// Sum downtime seconds for the run, split into (planned, unplanned).
    ///
    /// Reasons with `record_downtime = false` contribute nothing. Open
    /// intervals accrue up to now, capped at the run stop.
    async fn downtime_for_run(
        &self,
        run_id: i32,
        run_stop: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(f64, f64), ServiceError> {
        let db = &*self.db;
        let intervals = state_history::Entity::find()
            .filter(state_history::Column::RunId.eq(run_id))
            .all(db)
            .await?;

        if intervals.is_empty() {
            return Ok((0.0, 0.0));
        }

        let reason_ids: Vec<i32> = intervals.iter().map(|i| i.state_reason_id).collect();
        let reasons: HashMap<i32, state_reason::Model> = state_reason::Entity::find()
            .filter(state_reason::Column::Id.is_in(reason_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        Ok(split_downtime(&intervals, &reasons, run_stop, now))
    }

    /// Sum counts for the run into (good, waste) by configured type label.
    async fn counts_for_run(&self, run_id: i32) -> Result<(i32, i32), ServiceError> {
        let db = &*self.db;
        let counts = count_history::Entity::find()
            .filter(count_history::Column::RunId.eq(run_id))
            .all(db)
            .await?;

        if counts.is_empty() {
            return Ok((0, 0));
        }

        let type_ids: Vec<i32> = counts.iter().map(|c| c.count_type_id).collect();
        let labels: HashMap<i32, String> = count_type::Entity::find()
            .filter(count_type::Column::Id.is_in(type_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|t| (t.id, t.label))
            .collect();

        Ok(split_counts(&counts, &labels, &self.good_label, &self.waste_label))
    }
}

/// Sum downtime intervals into (planned, unplanned) seconds. Reasons with
/// `record_downtime = false` contribute nothing; open intervals accrue up to
/// `now`, capped at the run stop.
fn split_downtime(
    intervals: &[state_history::Model],
    reasons: &HashMap<i32, state_reason::Model>,
    run_stop: DateTime<Utc>,
    now: DateTime<Utc>,
) -> (f64, f64) {
    let mut planned = 0.0;
    let mut unplanned = 0.0;
    for interval in intervals {
        let Some(reason) = reasons.get(&interval.state_reason_id) else {
            continue;
        };
        if !reason.record_downtime {
            continue;
        }
        let end = interval.end_datetime.unwrap_or(now).min(run_stop);
        let seconds = duration_seconds(interval.start_datetime, end);
        if reason.planned_downtime {
            planned += seconds;
        } else {
            unplanned += seconds;
        }
    }
    (planned, unplanned)
}

/// Sum count rows into (good, waste) by configured type label. Counts of any
/// other type are ignored.
fn split_counts(
    counts: &[count_history::Model],
    labels: &HashMap<i32, String>,
    good_label: &str,
    waste_label: &str,
) -> (i32, i32) {
    let mut good = 0i32;
    let mut waste = 0i32;
    for record in counts {
        match labels.get(&record.count_type_id) {
            Some(label) if label == good_label => {
                good = good.saturating_add(record.count);
            }
            Some(label) if label == waste_label => {
                waste = waste.saturating_add(record.count);
            }
            _ => {}
        }
    }
    (good, waste)
}

fn duration_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    ((end - start).num_milliseconds() as f64 / 1000.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(
        total_time: f64,
        planned: f64,
        unplanned: f64,
        good: i32,
        waste: i32,
        ict: Option<f64>,
    ) -> MetricsInput {
        MetricsInput {
            total_time,
            planned_downtime: planned,
            unplanned_downtime: unplanned,
            good_count: good,
            waste_count: waste,
            ideal_cycle_time: ict,
        }
    }

    #[test]
    fn quality_is_good_over_total() {
        let m = input(3600.0, 0.0, 0.0, 90, 10, None);
        assert!((m.quality() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn quality_with_no_counts_is_zero() {
        let m = input(3600.0, 0.0, 0.0, 0, 0, None);
        assert_eq!(m.quality(), 0.0);
    }

    #[test]
    fn availability_subtracts_both_downtime_kinds() {
        // 480 min run, 30 min planned + 15 min unplanned downtime
        let m = input(480.0 * 60.0, 30.0 * 60.0, 15.0 * 60.0, 0, 0, None);
        let expected = (480.0 - 30.0 - 15.0) / 480.0;
        assert!((m.availability() - expected).abs() < 1e-9);
        assert!((m.availability() - 0.906_25).abs() < 1e-9);
    }

    #[test]
    fn availability_of_zero_length_run_is_zero() {
        let m = input(0.0, 0.0, 0.0, 50, 0, None);
        assert_eq!(m.availability(), 0.0);
        assert_eq!(m.compute().oee, 0.0);
    }

    #[test]
    fn availability_never_goes_negative() {
        // downtime exceeding the run span clamps to zero
        let m = input(600.0, 500.0, 500.0, 0, 0, None);
        assert_eq!(m.availability(), 0.0);
    }

    #[test]
    fn performance_uses_configured_cycle_time() {
        // 100 units at an ideal 20 s/unit over a 4000 s run with no downtime
        let m = input(4000.0, 0.0, 0.0, 80, 20, Some(20.0));
        assert!((m.performance() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn performance_without_cycle_time_is_neutral() {
        let m = input(4000.0, 0.0, 0.0, 80, 20, None);
        assert_eq!(m.performance(), 1.0);
    }

    #[test]
    fn performance_clamps_at_one() {
        // counting faster than the ideal rate does not exceed 1
        let m = input(100.0, 0.0, 0.0, 100, 0, Some(20.0));
        assert_eq!(m.performance(), 1.0);
    }

    #[test]
    fn oee_is_product_of_factors() {
        let m = input(4000.0, 200.0, 200.0, 90, 10, Some(20.0));
        let totals = m.compute();
        let expected = totals.availability * totals.performance * totals.quality;
        assert!((totals.oee - expected).abs() < 1e-12);
    }

    fn interval(
        reason_id: i32,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> state_history::Model {
        state_history::Model {
            id: 0,
            start_datetime: start,
            end_datetime: end,
            state_reason_id: reason_id,
            reason_name: "r".into(),
            reason_code: "c".into(),
            line_id: None,
            run_id: Some(1),
        }
    }

    fn downtime_reason(id: i32, record: bool, planned: bool) -> state_reason::Model {
        state_reason::Model {
            id,
            name: format!("reason {id}"),
            code: format!("R{id}"),
            record_downtime: record,
            planned_downtime: planned,
            operator_selectable: true,
            parent_id: None,
        }
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(minutes * 60, 0).unwrap()
    }

    #[test]
    fn downtime_splits_by_planned_flag() {
        let reasons = HashMap::from([
            (1, downtime_reason(1, true, true)),
            (2, downtime_reason(2, true, false)),
        ]);
        let intervals = vec![
            interval(1, at(0), Some(at(30))),
            interval(2, at(30), Some(at(45))),
        ];
        let (planned, unplanned) = split_downtime(&intervals, &reasons, at(480), at(480));
        assert_eq!(planned, 30.0 * 60.0);
        assert_eq!(unplanned, 15.0 * 60.0);
    }

    #[test]
    fn non_recording_reasons_contribute_no_downtime() {
        let reasons = HashMap::from([(1, downtime_reason(1, false, false))]);
        let intervals = vec![interval(1, at(0), Some(at(60)))];
        assert_eq!(
            split_downtime(&intervals, &reasons, at(480), at(480)),
            (0.0, 0.0)
        );
    }

    #[test]
    fn open_interval_is_capped_at_run_stop() {
        let reasons = HashMap::from([(1, downtime_reason(1, true, false))]);
        // started at minute 470, never ended; run stopped at 480, now is 600
        let intervals = vec![interval(1, at(470), None)];
        let (_, unplanned) = split_downtime(&intervals, &reasons, at(480), at(600));
        assert_eq!(unplanned, 10.0 * 60.0);
    }

    fn count_row(type_id: i32, count: i32) -> count_history::Model {
        count_history::Model {
            id: 0,
            timestamp: at(0),
            count,
            tag_id: 1,
            count_type_id: type_id,
            run_id: Some(1),
        }
    }

    #[test]
    fn counts_split_by_configured_labels() {
        let labels = HashMap::from([
            (1, "Good".to_string()),
            (2, "Scrap".to_string()),
            (3, "Rework".to_string()),
        ]);
        let counts = vec![
            count_row(1, 50),
            count_row(1, 40),
            count_row(2, 10),
            count_row(3, 7), // unconfigured label is ignored
        ];
        assert_eq!(split_counts(&counts, &labels, "Good", "Scrap"), (90, 10));
    }

    proptest! {
        #[test]
        fn all_ratios_stay_in_unit_interval(
            total_time in 0.0f64..1_000_000.0,
            planned in 0.0f64..1_000_000.0,
            unplanned in 0.0f64..1_000_000.0,
            good in 0i32..1_000_000,
            waste in 0i32..1_000_000,
            ict in proptest::option::of(0.0f64..10_000.0),
        ) {
            let totals = input(total_time, planned, unplanned, good, waste, ict).compute();
            prop_assert!((0.0..=1.0).contains(&totals.availability));
            prop_assert!((0.0..=1.0).contains(&totals.performance));
            prop_assert!((0.0..=1.0).contains(&totals.quality));
            prop_assert!((0.0..=1.0).contains(&totals.oee));
        }
    }
}
