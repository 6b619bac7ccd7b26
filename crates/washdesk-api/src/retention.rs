use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use washdesk_persist::MessageStore;

/// Delete messages older than `days`, logging the outcome
pub async fn sweep_once(store: &dyn MessageStore, days: i64) -> u64 {
    match store.purge_older_than(days).await {
        Ok(removed) => {
            tracing::info!(removed, retention_days = days, "retention sweep finished");
            removed
        }
        Err(e) => {
            tracing::error!(error = %e, "retention sweep failed");
            0
        }
    }
}

/// Run [`sweep_once`] now and then every `every`
pub fn spawn(store: Arc<dyn MessageStore>, days: i64, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            sweep_once(store.as_ref(), days).await;
        }
    })
}
