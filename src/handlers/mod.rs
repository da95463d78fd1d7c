pub mod area;
pub mod cell;
pub mod common;
pub mod downtime;
pub mod enterprise;
pub mod line;
pub mod oee;
pub mod schedules;
pub mod site;
pub mod work_orders;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub hierarchy: Arc<crate::services::hierarchy::HierarchyService>,
    pub work_orders: Arc<crate::services::work_orders::WorkOrderService>,
    pub scheduling: Arc<crate::services::scheduling::SchedulingService>,
    pub metrics: Arc<crate::services::metrics::MetricsService>,
    pub oee: Arc<crate::services::oee::OeeService>,
    pub downtime: Arc<crate::services::downtime::DowntimeService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender, cfg: &AppConfig) -> Self {
        let metrics = Arc::new(crate::services::metrics::MetricsService::new(
            db.clone(),
            Some(event_sender.clone()),
            cfg.good_count_label.clone(),
            cfg.waste_count_label.clone(),
        ));

        Self {
            hierarchy: Arc::new(crate::services::hierarchy::HierarchyService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            work_orders: Arc::new(crate::services::work_orders::WorkOrderService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            scheduling: Arc::new(crate::services::scheduling::SchedulingService::new(
                db.clone(),
                Some(event_sender.clone()),
            )),
            oee: Arc::new(crate::services::oee::OeeService::new(
                db.clone(),
                metrics.clone(),
                Some(event_sender.clone()),
            )),
            downtime: Arc::new(crate::services::downtime::DowntimeService::new(
                db,
                metrics.clone(),
                Some(event_sender),
            )),
            metrics,
        }
    }
}
