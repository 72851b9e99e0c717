use std::sync::Arc;

use log::{debug, info};

use crate::dashboard::{Dashboard, RefreshResult};

/// Loads data once at startup, then keeps refreshing on the dashboard's
/// interval. Automatic refreshes use the cache when it is still fresh.
pub async fn refresh_data_periodically(dashboard: Arc<Dashboard>) {
    loop {
        match dashboard.refresh(false).await {
            RefreshResult::Completed(status) => debug!("Auto refresh finished: {:?}", status),
            RefreshResult::TimedOut => debug!("Auto refresh timed out"),
            RefreshResult::Failed => debug!("Auto refresh failed"),
            RefreshResult::Busy => debug!("Auto refresh skipped, manual refresh in progress"),
        }

        let wait = dashboard.next_refresh_in();
        info!("Next refresh in {}s", wait.as_secs());
        tokio::time::sleep(wait).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::{dashboard_with, dashboard_with_settings, DeadNetwork, PrimaryOnly};
    use crate::dashboard::DashboardSettings;
    use shared::DataStatus;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_first_load_happens_immediately() {
        let dashboard = Arc::new(dashboard_with(Arc::new(PrimaryOnly)));
        let task = tokio::spawn(refresh_data_periodically(dashboard.clone()));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(dashboard.status(), DataStatus::Live);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_follows_data_status() {
        let live = dashboard_with(Arc::new(PrimaryOnly));
        live.refresh(false).await;
        assert_eq!(live.next_refresh_in(), Duration::from_secs(60));

        let sample = dashboard_with_settings(Arc::new(DeadNetwork), DashboardSettings::default());
        sample.refresh(false).await;
        assert_eq!(sample.status(), DataStatus::Fallback);
        assert_eq!(sample.next_refresh_in(), Duration::from_secs(120));
    }
}
