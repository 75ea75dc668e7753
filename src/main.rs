//! Daily digest — binary entrypoint.
//! One invocation collects, assembles, renders and writes the page. Exit
//! status is the only result: nonzero when no artifact could be written.

use anyhow::Context;
use comfy_intel_digest::config::load_config_default;
use comfy_intel_digest::render::RenderMeta;
use comfy_intel_digest::Engine;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs by default; JSON lines when `DIGEST_LOG_JSON=1`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("comfy_intel_digest=info,warn"));

    let json = std::env::var("DIGEST_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("loading digest config")?;
    tracing::info!(
        feed = %cfg.feed_url(),
        feed_limit = cfg.feed_limit,
        search_limit = cfg.search_limit,
        translate = cfg.translate_enabled,
        "starting digest run"
    );

    let meta = RenderMeta::from_config(&cfg, chrono::Local::now());
    let engine = Engine::from_config(cfg)?;
    let summary = engine.run_once(&meta).await?;

    for s in &summary.digest.sources {
        match &s.error {
            None => tracing::info!(source = s.adapter, entries = s.entries, "source ok"),
            Some(e) => tracing::warn!(source = s.adapter, error = %e, "source skipped"),
        }
    }
    tracing::info!(
        items = summary.digest.items.len(),
        path = %summary.output_path.display(),
        "digest run finished"
    );
    Ok(())
}
