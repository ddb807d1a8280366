use std::future::Future;
use std::io;
use std::sync::Arc;

use anyhow::Context;
use engine_logging::{engine_error, engine_info, engine_warn};
use harvester_core::HarvestRun;
use harvester_engine::{
    HarvestError, Harvester, HttpRenderSession, HttpSessionSettings, JsonFileSink, RenderSession,
};

use crate::config::{AppConfig, RenderEngine};

pub async fn run(config: &AppConfig) -> anyhow::Result<HarvestRun> {
    match config.engine {
        RenderEngine::Http => {
            let session = HttpRenderSession::new(HttpSessionSettings::default())
                .context("building http client")?;
            harvest_with(Arc::new(session), config).await
        }
        RenderEngine::Chromium => run_in_browser(config).await,
    }
}

async fn harvest_with(
    session: Arc<dyn RenderSession>,
    config: &AppConfig,
) -> anyhow::Result<HarvestRun> {
    let harvester = Harvester::new(session, config.to_settings()).context("invalid settings")?;
    let sink = JsonFileSink::new(config.output_dir.clone(), config.output_file.clone());

    let cancel = harvester.cancellation_token();
    let interrupt = tokio::spawn(async move {
        let outcome = watch_interrupts(tokio::signal::ctrl_c, move || cancel.cancel()).await;
        if outcome == InterruptOutcome::Abort {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    let result = harvester.run_into(&sink).await;
    interrupt.abort();

    match result {
        Ok(run) => {
            engine_info!("Wrote {} entries to {}", run.entries().len(), sink.path().display());
            Ok(run)
        }
        Err(HarvestError::Persist { source, run }) => {
            engine_error!(
                "Harvested {} entries but could not write them: {}",
                run.entries().len(),
                source
            );
            Err(source).with_context(|| format!("writing {}", sink.path().display()))
        }
        Err(err) => Err(err).context("harvest failed"),
    }
}

/// Conventional status for a process ended by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, PartialEq, Eq)]
enum InterruptOutcome {
    /// The signal listener could not be installed or failed.
    ListenerFailed,
    /// A second interrupt arrived; the process should stop now.
    Abort,
}

/// The first interrupt cancels the run gracefully through `on_first`, the
/// second one asks for an immediate exit.
async fn watch_interrupts<F, Fut>(mut signal: F, on_first: impl FnOnce()) -> InterruptOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(err) = signal().await {
        engine_warn!("Cannot listen for Ctrl-C: {}", err);
        return InterruptOutcome::ListenerFailed;
    }
    engine_warn!(
        "Interrupt received; pending detail pages will be marked unknown. Press Ctrl-C again to quit"
    );
    on_first();

    match signal().await {
        Ok(()) => {
            engine_error!("Second interrupt; quitting without writing the output");
            InterruptOutcome::Abort
        }
        Err(err) => {
            engine_warn!("Cannot listen for Ctrl-C: {}", err);
            InterruptOutcome::ListenerFailed
        }
    }
}

#[cfg(feature = "browser")]
async fn run_in_browser(config: &AppConfig) -> anyhow::Result<HarvestRun> {
    use harvester_engine::{ChromiumOptions, ChromiumSession};

    let options = ChromiumOptions {
        headless: config.browser.headless,
        executable: config.browser.executable.clone(),
        args: config.browser.args.clone(),
        ..ChromiumOptions::default()
    };
    let session = Arc::new(
        ChromiumSession::launch(options)
            .await
            .context("launching browser")?,
    );

    let result = harvest_with(session.clone(), config).await;
    match Arc::try_unwrap(session) {
        Ok(session) => session.shutdown().await,
        Err(_) => engine_warn!("Browser still referenced; it is killed on exit instead"),
    }
    result
}

#[cfg(not(feature = "browser"))]
async fn run_in_browser(_config: &AppConfig) -> anyhow::Result<HarvestRun> {
    anyhow::bail!("the chromium engine needs a build with the `browser` feature")
}
