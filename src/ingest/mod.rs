// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::config::DigestConfig;
use crate::ingest::types::{CollectOutcome, SourceProvider, SourceUnavailable};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

/// One-time metrics registration.
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_entries_total", "Raw entries parsed from sources.");
        describe_counter!(
            "digest_source_errors_total",
            "Sources that produced nothing due to fetch/parse errors."
        );
        describe_counter!(
            "digest_translation_fallback_total",
            "Fields that fell back to source-language text."
        );
        describe_counter!("digest_dedup_total", "Items dropped as duplicate ids.");
        describe_histogram!("digest_parse_ms", "Source parse time in milliseconds.");
    });
}

/// Shared HTTP client for all outbound calls: browser-like UA and a fixed timeout.
pub fn build_http_client(cfg: &DigestConfig) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(cfg.user_agent.clone())
        .connect_timeout(cfg.request_timeout().min(Duration::from_secs(5)))
        .timeout(cfg.request_timeout())
        .build()?;
    Ok(client)
}

/// Run one provider under `timeout`. Never fails: errors become `CollectOutcome::Empty`.
pub async fn collect(provider: &dyn SourceProvider, timeout: Duration) -> CollectOutcome {
    ensure_metrics_described();
    let adapter = provider.name();
    let res = match tokio::time::timeout(timeout, provider.fetch_latest()).await {
        Ok(r) => r,
        Err(_) => Err(SourceUnavailable::Timeout(timeout.as_secs())),
    };
    settle(adapter, res)
}

fn settle(
    adapter: &'static str,
    res: Result<Vec<crate::ingest::types::RawEntry>, SourceUnavailable>,
) -> CollectOutcome {
    match res {
        Ok(entries) => {
            counter!("digest_entries_total").increment(entries.len() as u64);
            tracing::info!(target: "ingest", provider = adapter, count = entries.len(), "source collected");
            CollectOutcome::Collected { adapter, entries }
        }
        Err(reason) => {
            tracing::warn!(target: "ingest", provider = adapter, error = %reason, "source unavailable");
            counter!("digest_source_errors_total").increment(1);
            CollectOutcome::Empty { adapter, reason }
        }
    }
}

/// Collect from every provider concurrently, one task each.
///
/// Outcomes come back in provider order regardless of completion order. A
/// panicking or timed-out provider only empties its own slot.
pub async fn collect_all(
    providers: &[Arc<dyn SourceProvider>],
    timeout: Duration,
) -> Vec<CollectOutcome> {
    let handles: Vec<_> = providers
        .iter()
        .map(|p| {
            let p = Arc::clone(p);
            (
                p.name(),
                tokio::spawn(async move { collect(p.as_ref(), timeout).await }),
            )
        })
        .collect();

    let mut out = Vec::with_capacity(handles.len());
    for (adapter, handle) in handles {
        match handle.await {
            Ok(outcome) => out.push(outcome),
            Err(e) => out.push(settle(
                adapter,
                Err(SourceUnavailable::TaskFailed(e.to_string())),
            )),
        }
    }
    out
}
