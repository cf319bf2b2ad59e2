// Periodic refresh of a chart view
use crate::application::chart_service::ChartView;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Refreshes a view on a fixed interval until dropped.
pub struct Poller {
    room: String,
    handle: JoinHandle<()>,
}

impl Poller {
    pub fn spawn(view: Arc<ChartView>, interval: Duration) -> Self {
        let room = view.room().to_string();
        tracing::info!(room = %room, ?interval, "starting poller");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                view.refresh().await;
            }
        });

        Self { room, handle }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        tracing::debug!(room = %self.room, "stopping poller");
        self.handle.abort();
    }
}
