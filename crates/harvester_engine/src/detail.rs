use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_warn};
use futures_util::FutureExt;
use harvester_core::{DetailRecord, ElementRole};
use tokio_util::sync::CancellationToken;

use crate::{
    ContextHandle, DegradeReason, DetailExtractor, RenderError, RenderSession, SelectorTable,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(DetailRecord),
    Degraded(DegradeReason),
}

impl FetchOutcome {
    /// The record to merge: the fetched one, or the unknown placeholder.
    pub fn into_record(self) -> DetailRecord {
        match self {
            FetchOutcome::Fetched(record) => record,
            FetchOutcome::Degraded(_) => DetailRecord::unknown(),
        }
    }
}

/// Fetches one detail page per call inside its own browsing context.
pub struct DetailFetcher {
    selectors: Arc<SelectorTable>,
    extractor: DetailExtractor,
    render_timeout: Duration,
}

impl DetailFetcher {
    pub fn new(selectors: Arc<SelectorTable>, render_timeout: Duration) -> Self {
        Self {
            extractor: DetailExtractor::new(selectors.clone()),
            selectors,
            render_timeout,
        }
    }

    /// Open a context, render `link`, close the context, then parse.
    ///
    /// Every page-level problem comes back as [`FetchOutcome::Degraded`].
    /// The only error is failing to open a context at all. Once opened, the
    /// context is closed on every path, including cancellation and a panic
    /// inside the session, which is re-raised after the close.
    pub async fn fetch(
        &self,
        session: &dyn RenderSession,
        link: &str,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome, RenderError> {
        if cancel.is_cancelled() {
            return Ok(FetchOutcome::Degraded(DegradeReason::DeadlineExceeded));
        }

        let handle = session.open_context().await?;
        engine_debug!("{} fetching {}", handle, link);

        let rendered = tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(Err(DegradeReason::DeadlineExceeded)),
            result = AssertUnwindSafe(self.render(session, handle, link)).catch_unwind() => result,
        };

        if let Err(err) = session.close_context(handle).await {
            engine_warn!("Failed to close {} after {}: {}", handle, link, err);
        }
        // Closed above; the caller still sees the panic.
        let rendered = rendered.unwrap_or_else(|payload| panic::resume_unwind(payload));

        let outcome = match rendered.and_then(|html| self.extractor.extract(&html)) {
            Ok(record) => FetchOutcome::Fetched(record),
            Err(reason) => {
                engine_warn!("Detail for {} degraded: {}", link, reason);
                FetchOutcome::Degraded(reason)
            }
        };
        Ok(outcome)
    }

    async fn render(
        &self,
        session: &dyn RenderSession,
        handle: ContextHandle,
        link: &str,
    ) -> Result<String, DegradeReason> {
        session
            .navigate(handle, link)
            .await
            .map_err(DegradeReason::Navigation)?;
        let appeared = session
            .wait_for_element(
                handle,
                self.selectors.css(ElementRole::Answer),
                self.render_timeout,
            )
            .await
            .map_err(DegradeReason::Navigation)?;
        if !appeared {
            return Err(DegradeReason::RenderTimeout(self.render_timeout));
        }
        session
            .snapshot(handle)
            .await
            .map_err(DegradeReason::Navigation)
    }
}
