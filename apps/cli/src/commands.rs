//! CLI command implementations

use crate::output::print_summary;
use crate::progress::ConsoleProgress;
use anyhow::{bail, Result};
use modelfetch_core::{DownloadHandle, Fetcher, HeadlessSink, SinkFactory};
use modelfetch_types::FetcherConfig;
use std::sync::Arc;

/// Build a fetcher whose sink is picked for the current environment:
/// interactive progress bars on an attended terminal, headless reporting
/// otherwise. The choice is made once, not per chunk.
fn build_fetcher(config: FetcherConfig) -> Result<Fetcher> {
    let factory: SinkFactory = if console::user_attended_stderr() {
        ConsoleProgress::new().sink_factory()
    } else {
        Arc::new(|_| Box::new(HeadlessSink) as Box<dyn modelfetch_core::ProgressSink>)
    };
    Ok(Fetcher::with_sink_factory(config, factory)?)
}

pub async fn download_url(config: FetcherConfig, url: &str) -> Result<()> {
    let fetcher = build_fetcher(config)?;
    let destination = fetcher.config().destination.clone();
    let handle = fetcher.download_by_url(url, destination);
    finish(vec![handle]).await
}

pub async fn download_model(config: FetcherConfig, version_id: u64) -> Result<()> {
    let fetcher = build_fetcher(config)?;
    let destination = fetcher.config().destination.clone();
    let handle = fetcher.download_by_model_id(version_id, &destination).await?;
    finish(vec![handle]).await
}

pub async fn download_version(config: FetcherConfig, version_id: u64) -> Result<()> {
    let fetcher = build_fetcher(config)?;
    let destination = fetcher.config().destination.clone();
    let handles = fetcher
        .version_batch_download(version_id, &destination)
        .await?;
    finish(handles).await
}

pub async fn download_batch(config: FetcherConfig, model_id: u64) -> Result<()> {
    let fetcher = build_fetcher(config)?;
    let destination = fetcher.config().destination.clone();
    let handles = fetcher.batch_download(model_id, &destination).await?;
    finish(handles).await
}

/// Await every launched download and summarize. Failures surface in the
/// exit code only after all transfers have run to their terminal state.
async fn finish(handles: Vec<DownloadHandle>) -> Result<()> {
    if handles.is_empty() {
        bail!("nothing to download");
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.join().await);
    }

    let failed = print_summary(&outcomes);
    if failed > 0 {
        bail!("{failed} of {} download(s) failed", outcomes.len());
    }
    Ok(())
}
