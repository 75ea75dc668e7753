// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape of the upstream source; drives tag and score heuristics downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Feed,
    Search,
}

/// One entry as an adapter saw it, before any cleanup or translation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    pub source: SourceKind,
    pub adapter: String,   // e.g. "reddit", "github"
    pub title: String,     // original-language title or repo name, may be empty
    pub body: Option<String>, // raw description / html content
    pub url: Option<String>,
    pub popularity: Option<u64>,
    pub published_at: Option<u64>, // unix seconds
}

/// Why a source produced nothing this run.
#[derive(Debug, Error)]
pub enum SourceUnavailable {
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("collector task failed: {0}")]
    TaskFailed(String),
}

impl From<reqwest::Error> for SourceUnavailable {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            SourceUnavailable::HttpStatus(status.as_u16())
        } else if e.is_decode() {
            SourceUnavailable::Parse(e.to_string())
        } else {
            SourceUnavailable::Network(e.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>, SourceUnavailable>;
    fn name(&self) -> &'static str;
}

/// Settled result of one collector: entries, or an explicit empty with the reason.
#[derive(Debug)]
pub enum CollectOutcome {
    Collected {
        adapter: &'static str,
        entries: Vec<RawEntry>,
    },
    Empty {
        adapter: &'static str,
        reason: SourceUnavailable,
    },
}

impl CollectOutcome {
    pub fn adapter(&self) -> &'static str {
        match self {
            CollectOutcome::Collected { adapter, .. } | CollectOutcome::Empty { adapter, .. } => {
                adapter
            }
        }
    }

    pub fn is_empty_with_reason(&self) -> bool {
        matches!(self, CollectOutcome::Empty { .. })
    }

    pub fn into_entries(self) -> Vec<RawEntry> {
        match self {
            CollectOutcome::Collected { entries, .. } => entries,
            CollectOutcome::Empty { .. } => Vec::new(),
        }
    }
}
