use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Domain events emitted by the service layer.
///
/// Events are observational: consumers log them, nothing in the request path
/// depends on delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    EnterpriseCreated(i32),
    SiteCreated(i32),
    AreaCreated(i32),
    LineCreated(i32),
    CellCreated(i32),

    ProductCodeCreated(i32),
    WorkOrderCreated(i32),
    WorkOrderUpdated(i32),

    ScheduleCreated(i32),
    RunCreated {
        run_id: i32,
        schedule_id: i32,
    },
    RunClosed(i32),

    CountRecorded {
        run_id: Option<i32>,
        count: i32,
    },
    DowntimeRecorded {
        run_id: Option<i32>,
        reason_code: String,
    },
    RunMetricsRecomputed {
        run_id: i32,
        oee: f64,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("failed to send event: {e}");
        }
    }
}

/// Drains the event channel, logging each event. Spawned once at startup.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        debug!(?event, "domain event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_delivers_events() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender.send_or_log(Event::LineCreated(7)).await;
        match rx.recv().await {
            Some(Event::LineCreated(7)) => {}
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
