//! Keeps the cached local prices in line with the current rate.

use std::sync::Arc;

use inventory_types::{CurrentRate, InventoryRepository, Rate};
use tokio::sync::{oneshot, watch};

use crate::scheduler::TaskHandle;

/// Re-prices every product whenever the rate changes.
pub struct PriceCacheUpdater;

impl PriceCacheUpdater {
    pub fn spawn<R: InventoryRepository>(
        repo: Arc<R>,
        mut rates: watch::Receiver<CurrentRate>,
    ) -> TaskHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let join = tokio::spawn(async move {
            let mut last: Rate = rates.borrow_and_update().rate;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    changed = rates.changed() => {
                        if changed.is_err() {
                            tracing::debug!("Rate publisher gone; price cache updater exiting");
                            break;
                        }
                        let rate = rates.borrow_and_update().rate;
                        if rate == last {
                            continue;
                        }
                        match repo.reprice_products(rate).await {
                            Ok(count) => {
                                last = rate;
                                tracing::info!(rate = rate.value(), products = count, "Cached local prices updated");
                            }
                            Err(err) => {
                                tracing::warn!(rate = rate.value(), error = %err, "Failed to update cached local prices");
                            }
                        }
                    }
                }
            }
        });

        TaskHandle::new("price-cache", stop_tx, join)
    }
}
