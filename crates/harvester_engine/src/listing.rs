use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use harvester_core::ElementRole;

use crate::{ContextHandle, RenderError, RenderSession, SelectorTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop {
    /// Enough items are visible.
    TargetReached,
    /// A scroll cycle discovered nothing new.
    Stalled,
    /// The cycle budget ran out while the count was still growing.
    IterationLimit,
}

#[derive(Debug, Clone)]
pub struct ListingScan {
    /// Last snapshot taken.
    pub snapshot: String,
    pub discovered: usize,
    pub iterations: usize,
    pub stop: ScanStop,
}

/// Drives the primary context through scroll-and-snapshot cycles.
pub struct ListingScanner {
    selectors: Arc<SelectorTable>,
    settle_interval: Duration,
}

impl ListingScanner {
    pub fn new(selectors: Arc<SelectorTable>, settle_interval: Duration) -> Self {
        Self {
            selectors,
            settle_interval,
        }
    }

    /// Scroll until `target_count` items are visible, the count stalls, or
    /// `max_iterations` cycles have run. With no cycles allowed, the current
    /// page is snapshotted as is.
    pub async fn scan(
        &self,
        session: &dyn RenderSession,
        handle: ContextHandle,
        target_count: usize,
        max_iterations: usize,
    ) -> Result<ListingScan, RenderError> {
        let mut last_count = 0;
        let mut last_snapshot = None;
        let mut iterations = 0;
        let mut stop = ScanStop::IterationLimit;

        while iterations < max_iterations {
            session.scroll_to_bottom(handle).await?;
            if !self.settle_interval.is_zero() {
                tokio::time::sleep(self.settle_interval).await;
            }
            let html = session.snapshot(handle).await?;
            let count = self.selectors.count(&html, ElementRole::ListingItem);
            iterations += 1;
            last_snapshot = Some(html);
            engine_debug!("Scroll {}: {} listing items", iterations, count);

            if count >= target_count {
                stop = ScanStop::TargetReached;
                break;
            }
            if count == last_count {
                stop = ScanStop::Stalled;
                break;
            }
            last_count = count;
        }

        let snapshot = match last_snapshot {
            Some(html) => html,
            None => session.snapshot(handle).await?,
        };
        let discovered = self.selectors.count(&snapshot, ElementRole::ListingItem);
        engine_info!(
            "Listing scan stopped ({:?}) after {} scrolls with {} items",
            stop,
            iterations,
            discovered
        );

        Ok(ListingScan {
            snapshot,
            discovered,
            iterations,
            stop,
        })
    }
}
