//! Orphan header reconciliation
//!
//! The compensation path of checkout can itself fail, leaving a header with
//! zero lines behind. Such orphans are detectable (header exists, no lines)
//! and this sweep deletes them once they are older than a grace period, so
//! a slow in-flight checkout is never mistaken for an orphan.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::store::OrderStore;
use crate::db::repository::RepoResult;

/// Delete orphaned headers older than `grace`; returns how many were swept
pub async fn sweep<S: OrderStore>(store: &S, grace: Duration) -> RepoResult<usize> {
    let cutoff = shared::util::now_millis() - grace.as_millis() as i64;
    let orphans = store.find_orphans(cutoff).await?;

    let mut swept = 0;
    for order_id in orphans {
        match store.delete_header(&order_id).await {
            Ok(true) => {
                tracing::warn!(order_id = %order_id, "Swept orphan order header");
                swept += 1;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Failed to sweep orphan header");
            }
        }
    }
    Ok(swept)
}

/// Run the sweep on an interval until `token` is cancelled
pub fn spawn<S: OrderStore + Clone + 'static>(
    store: S,
    interval: Duration,
    grace: Duration,
    token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            if let Err(e) = sweep(&store, grace).await {
                tracing::error!(error = %e, "Orphan sweep failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::store::tests::{header, memory_store};
    use crate::orders::store::NewOrderLine;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn sweep_removes_only_stale_zero_line_headers() {
        let store = memory_store().await;

        // Stale orphan: old header, no lines
        let mut stale = header(Some("u1"), Decimal::new(500, 2));
        stale.created_at -= 600_000;
        let stale = store.insert_header(stale).await.unwrap();

        // Fresh header without lines yet: inside the grace period
        let fresh = store
            .insert_header(header(Some("u1"), Decimal::new(500, 2)))
            .await
            .unwrap();

        // Old but complete order
        let mut complete = header(Some("u2"), Decimal::new(500, 2));
        complete.created_at -= 600_000;
        let complete = store.insert_header(complete).await.unwrap();
        store
            .insert_lines(
                &complete,
                vec![NewOrderLine {
                    product_id: "prod-a".into(),
                    quantity: 1,
                    unit_price: Decimal::new(500, 2),
                }],
            )
            .await
            .unwrap();

        let swept = sweep(&store, Duration::from_secs(60)).await.unwrap();
        assert_eq!(swept, 1);

        assert!(store.find_header(&stale.id).await.unwrap().is_none());
        assert!(store.find_header(&fresh.id).await.unwrap().is_some());
        assert!(store.find_header(&complete.id).await.unwrap().is_some());
    }
}
