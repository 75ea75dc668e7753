// src/ingest/providers/github_search.rs
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use metrics::histogram;
use serde::Deserialize;

use crate::ingest::types::{RawEntry, SourceKind, SourceProvider, SourceUnavailable};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    name: Option<String>,
    description: Option<String>,
    html_url: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    created_at: Option<chrono::DateTime<Utc>>,
    #[allow(dead_code)]
    updated_at: Option<chrono::DateTime<Utc>>,
}

/// Repository search adapter: repos created inside the freshness window,
/// most-starred first, capped at `limit`.
pub struct GithubSearchProvider {
    query: String,
    freshness_window_days: i64,
    limit: usize,
    today: Option<NaiveDate>,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        api_base: String,
        client: reqwest::Client,
        token: Option<String>,
    },
}

impl GithubSearchProvider {
    pub fn from_api(
        api_base: impl Into<String>,
        client: reqwest::Client,
        query: impl Into<String>,
        freshness_window_days: i64,
        limit: usize,
    ) -> Self {
        let token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        Self {
            query: query.into(),
            freshness_window_days,
            limit,
            today: None,
            mode: Mode::Http {
                api_base: api_base.into(),
                client,
                token,
            },
        }
    }

    pub fn from_fixture_str(s: &str, limit: usize) -> Self {
        Self {
            query: String::new(),
            freshness_window_days: 7,
            limit,
            today: None,
            mode: Mode::Fixture(s.to_string()),
        }
    }

    /// Pin "today" so the created-date bound is reproducible.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// `"<query> created:>YYYY-MM-DD"`
    pub fn search_expression(&self) -> String {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let since = today - ChronoDuration::days(self.freshness_window_days);
        format!(
            "{} created:>{}",
            self.query.trim(),
            since.format("%Y-%m-%d")
        )
    }

    fn parse_entries(&self, body: &str) -> Result<Vec<RawEntry>, SourceUnavailable> {
        let t0 = std::time::Instant::now();
        let resp: SearchResponse = serde_json::from_str(body)
            .map_err(|e| SourceUnavailable::Parse(format!("search json: {e}")))?;

        let mut out: Vec<RawEntry> = resp
            .items
            .into_iter()
            .map(|r| RawEntry {
                source: SourceKind::Search,
                adapter: self.name().to_string(),
                title: r.name.unwrap_or_default(),
                body: r.description,
                url: r.html_url,
                popularity: Some(r.stargazers_count),
                published_at: r
                    .created_at
                    .and_then(|d| u64::try_from(d.timestamp()).ok()),
            })
            .collect();
        out.truncate(self.limit);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("digest_parse_ms").record(ms);
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for GithubSearchProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>, SourceUnavailable> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_entries(s),
            Mode::Http {
                api_base,
                client,
                token,
            } => {
                let url = format!("{}/search/repositories", api_base.trim_end_matches('/'));
                let per_page = self.limit.to_string();
                let q = self.search_expression();
                tracing::debug!(target: "ingest", provider = self.name(), %q, "search query");

                let mut req = client
                    .get(url)
                    .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                    .query(&[
                        ("q", q.as_str()),
                        ("sort", "stars"),
                        ("order", "desc"),
                        ("per_page", per_page.as_str()),
                    ]);
                if let Some(t) = token {
                    req = req.bearer_auth(t);
                }

                let resp = req.send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(SourceUnavailable::HttpStatus(status.as_u16()));
                }
                let body = resp.text().await?;
                self.parse_entries(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "github"
    }
}
