// src/engine.rs
//! # Digest Engine
//! One run: collect from every source concurrently, assemble (translating
//! under a bounded pool), render, write. Only the final write can fail the run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::time::Instant;
use tracing::info;

use crate::assemble::{DigestItem, ItemAssembler};
use crate::config::DigestConfig;
use crate::ingest::providers::{FeedProvider, GithubSearchProvider};
use crate::ingest::types::{CollectOutcome, SourceProvider};
use crate::ingest::{build_http_client, collect_all};
use crate::render::{render, write_artifact, RenderMeta};
use crate::translate::{build_translator, DynTranslator, TextFacade};

/// Per-source line of the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub adapter: &'static str,
    pub entries: usize,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct Digest {
    pub items: Vec<DigestItem>,
    pub sources: Vec<SourceReport>,
    pub malformed_dropped: usize,
    pub duplicates_dropped: usize,
    pub translation_timeouts: usize,
}

#[derive(Debug)]
pub struct RunSummary {
    pub digest: Digest,
    pub output_path: PathBuf,
    pub bytes_written: usize,
}

pub struct Engine {
    cfg: DigestConfig,
    providers: Vec<Arc<dyn SourceProvider>>,
    facade: TextFacade,
}

impl Engine {
    pub fn new(
        cfg: DigestConfig,
        providers: Vec<Arc<dyn SourceProvider>>,
        translator: DynTranslator,
    ) -> Self {
        Self {
            cfg,
            providers,
            facade: TextFacade::new(translator),
        }
    }

    /// Production wiring: reddit feed + github search + configured translator.
    pub fn from_config(cfg: DigestConfig) -> anyhow::Result<Self> {
        let http = build_http_client(&cfg).context("building http client")?;
        let providers: Vec<Arc<dyn SourceProvider>> = vec![
            Arc::new(FeedProvider::from_url(
                cfg.feed_url(),
                http.clone(),
                cfg.feed_limit,
            )),
            Arc::new(GithubSearchProvider::from_api(
                cfg.search_api_base.clone(),
                http.clone(),
                cfg.search_query.clone(),
                cfg.freshness_window_days,
                cfg.search_limit,
            )),
        ];
        let translator = build_translator(&cfg, http);
        Ok(Self::new(cfg, providers, translator))
    }

    pub fn config(&self) -> &DigestConfig {
        &self.cfg
    }

    /// Collect + assemble. Never fails; an all-sources-down run is just empty.
    pub async fn build_digest(&self) -> Digest {
        let deadline = Instant::now() + self.cfg.run_timeout();
        let per_source = self.cfg.request_timeout().min(self.cfg.run_timeout());

        let outcomes = collect_all(&self.providers, per_source).await;
        let mut sources = Vec::with_capacity(outcomes.len());
        let mut entries = Vec::new();
        for outcome in outcomes {
            match outcome {
                CollectOutcome::Collected {
                    adapter,
                    entries: got,
                } => {
                    sources.push(SourceReport {
                        adapter,
                        entries: got.len(),
                        error: None,
                    });
                    entries.extend(got);
                }
                CollectOutcome::Empty { adapter, reason } => sources.push(SourceReport {
                    adapter,
                    entries: 0,
                    error: Some(reason.to_string()),
                }),
            }
        }

        let assembler = ItemAssembler::new(&self.cfg, self.facade.clone());
        let assembled = assembler.assemble(&entries, deadline).await;

        info!(
            target: "engine",
            items = assembled.items.len(),
            raw = entries.len(),
            malformed = assembled.malformed_dropped,
            duplicates = assembled.duplicates_dropped,
            translations = assembled.translation_jobs,
            translator = self.facade.translator_name(),
            "digest assembled"
        );

        Digest {
            items: assembled.items,
            sources,
            malformed_dropped: assembled.malformed_dropped,
            duplicates_dropped: assembled.duplicates_dropped,
            translation_timeouts: assembled.translation_timeouts,
        }
    }

    /// Full run. Errors only when the artifact cannot be produced.
    pub async fn run_once(&self, meta: &RenderMeta) -> anyhow::Result<RunSummary> {
        let digest = self.build_digest().await;
        let html = render(&digest.items, meta).context("rendering digest")?;
        let path = self.cfg.output_path.clone();
        write_artifact(&path, &html).context("writing digest artifact")?;
        info!(target: "engine", path = %path.display(), bytes = html.len(), "artifact written");
        Ok(RunSummary {
            digest,
            output_path: path,
            bytes_written: html.len(),
        })
    }
}
