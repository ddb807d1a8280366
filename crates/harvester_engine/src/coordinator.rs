use std::sync::Arc;

use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_core::{FetchStatus, HarvestEntry, HarvestRun, HarvestRunBuilder, SummaryRecord};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    DetailFetcher, FetchOutcome, HarvestError, HarvestSettings, ListingScan, ListingScanner,
    RenderError, RenderSession, SelectorTable, Sink, SummaryExtractor,
};

type RecordTask = JoinHandle<Result<(HarvestEntry, FetchStatus), RenderError>>;

/// Runs the whole pipeline against one render session.
pub struct Harvester {
    session: Arc<dyn RenderSession>,
    settings: HarvestSettings,
    selectors: Arc<SelectorTable>,
    fetcher: Arc<DetailFetcher>,
    cancel: CancellationToken,
}

impl Harvester {
    pub fn new(
        session: Arc<dyn RenderSession>,
        settings: HarvestSettings,
    ) -> Result<Self, HarvestError> {
        validate(&settings)?;
        let selectors = Arc::new(SelectorTable::compile(&settings.profile)?);
        let fetcher = Arc::new(DetailFetcher::new(
            selectors.clone(),
            settings.render_timeout,
        ));
        Ok(Self {
            session,
            settings,
            selectors,
            fetcher,
            cancel: CancellationToken::new(),
        })
    }

    /// Cancelling this token degrades every fetch still pending or in flight,
    /// the same way the run deadline does. It stays cancelled for later runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Harvest and hand the finished run to `sink`.
    pub async fn run_into(&self, sink: &dyn Sink) -> Result<HarvestRun, HarvestError> {
        let run = self.run().await?;
        match sink.persist(&run) {
            Ok(()) => Ok(run),
            Err(source) => Err(HarvestError::Persist {
                source,
                run: Box::new(run),
            }),
        }
    }

    /// Scan the listing, extract summaries, fetch details through the bounded
    /// pool and assemble the run in listing order.
    pub async fn run(&self) -> Result<HarvestRun, HarvestError> {
        let cancel = self.cancel.child_token();
        let _deadline = self.arm_deadline(&cancel);

        let scan = self.scan_listing().await?;
        let extraction = SummaryExtractor::new(self.selectors.clone())
            .extract(&scan.snapshot, self.settings.max_items);
        engine_info!(
            "Extracted {} summary records ({} listing items without a question)",
            extraction.records.len(),
            extraction.skipped.len()
        );

        let mut builder =
            HarvestRunBuilder::new(extraction.records.len(), extraction.skipped.len());
        let pool = Arc::new(Semaphore::new(self.settings.max_contexts.max(1)));

        let mut tasks: Vec<(usize, RecordTask)> = Vec::new();
        for (index, record) in extraction.records.into_iter().enumerate() {
            if record.detail_link().is_none() {
                builder.merge(
                    index,
                    HarvestEntry::merge(record, None),
                    FetchStatus::NotAttempted,
                );
                continue;
            }
            builder.begin_fetch(index);
            tasks.push((index, self.spawn_fetch(record, pool.clone(), cancel.clone())));
        }

        let mut fatal = None;
        for (index, task) in tasks {
            match task.await {
                Ok(Ok((entry, status))) => {
                    builder.merge(index, entry, status);
                }
                Ok(Err(err)) => {
                    engine_error!("[{}] Could not open a browsing context: {}", index, err);
                    if fatal.is_none() {
                        cancel.cancel();
                        fatal = Some(err);
                    }
                }
                Err(join_err) => {
                    engine_error!("Error while processing item {}: {}", index, join_err);
                    builder.skip(index);
                }
            }
        }
        if let Some(err) = fatal {
            return Err(HarvestError::Launch(err));
        }

        let run = builder.finish();
        engine_info!(
            "Harvest finished with {} entries: {}",
            run.entries().len(),
            run.tally()
        );
        Ok(run)
    }

    async fn scan_listing(&self) -> Result<ListingScan, HarvestError> {
        let primary = self
            .session
            .open_context()
            .await
            .map_err(HarvestError::Launch)?;
        let scanner = ListingScanner::new(self.selectors.clone(), self.settings.settle_interval);

        let result = match self
            .session
            .navigate(primary, &self.settings.listing_url)
            .await
        {
            Ok(()) => {
                scanner
                    .scan(
                        self.session.as_ref(),
                        primary,
                        self.settings.max_items,
                        self.settings.max_scrolls,
                    )
                    .await
            }
            Err(err) => Err(err),
        };

        if let Err(err) = self.session.close_context(primary).await {
            engine_warn!("Failed to close listing context {}: {}", primary, err);
        }
        result.map_err(HarvestError::Listing)
    }

    fn spawn_fetch(
        &self,
        record: SummaryRecord,
        pool: Arc<Semaphore>,
        cancel: CancellationToken,
    ) -> RecordTask {
        let session = self.session.clone();
        let fetcher = self.fetcher.clone();
        tokio::spawn(async move {
            // The semaphore is never closed.
            let _permit = pool.acquire_owned().await.ok();
            let link = record.detail_link().unwrap_or_default().to_string();
            let outcome = fetcher.fetch(session.as_ref(), &link, &cancel).await?;
            let status = match outcome {
                FetchOutcome::Fetched(_) => FetchStatus::Clean,
                FetchOutcome::Degraded(_) => FetchStatus::Degraded,
            };
            Ok((HarvestEntry::merge(record, Some(outcome.into_record())), status))
        })
    }

    fn arm_deadline(&self, cancel: &CancellationToken) -> Option<AbortOnDrop> {
        let deadline = self.settings.run_deadline?;
        let cancel = cancel.clone();
        Some(AbortOnDrop(tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            engine_warn!("Run deadline of {:?} reached; pending detail fetches degrade", deadline);
            cancel.cancel();
        })))
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn validate(settings: &HarvestSettings) -> Result<(), HarvestError> {
    if settings.max_items == 0 {
        return Err(HarvestError::Config("max_items must be at least 1".into()));
    }
    for (name, value) in [
        ("listing_url", settings.listing_url.as_str()),
        ("origin", settings.profile.origin.as_str()),
    ] {
        url::Url::parse(value)
            .map_err(|err| HarvestError::Config(format!("{name} {value:?} is not a url: {err}")))?;
    }
    Ok(())
}
