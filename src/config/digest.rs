// src/config/digest.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::translate::MIN_TRANSLATABLE_CHARS;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/digest.toml";
pub const DEFAULT_JSON_PATH: &str = "config/digest.json";

/// Mobile Safari UA; Reddit rejects the default reqwest agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1";

/// Which slice of the feed to pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedRanking {
    /// Highest voted in the last 24h (`/top/.rss?t=day`).
    TopDay,
    /// Highest voted in the last week (`/top/.rss?t=week`).
    TopWeek,
    /// Newest first (`/new/.rss`).
    New,
}

impl FeedRanking {
    pub fn path_and_query(self) -> &'static str {
        match self {
            FeedRanking::TopDay => "/top/.rss?t=day",
            FeedRanking::TopWeek => "/top/.rss?t=week",
            FeedRanking::New => "/new/.rss",
        }
    }
}

fn default_feed_url_base() -> String {
    "https://www.reddit.com/r/comfyui".to_string()
}
fn default_feed_ranking() -> FeedRanking {
    FeedRanking::TopDay
}
fn default_feed_limit() -> usize {
    10
}
fn default_search_api_base() -> String {
    "https://api.github.com".to_string()
}
fn default_search_query() -> String {
    "comfyui nodes".to_string()
}
fn default_search_limit() -> usize {
    5
}
fn default_freshness_window_days() -> i64 {
    7
}
fn default_summary_char_cap() -> usize {
    250
}
fn default_title_char_cap() -> usize {
    120
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_run_timeout_secs() -> u64 {
    120
}
fn default_translate_concurrency() -> usize {
    4
}
fn default_true() -> bool {
    true
}
fn default_translate_api_base() -> String {
    "https://translate.googleapis.com".to_string()
}
fn default_target_lang() -> String {
    "zh-CN".to_string()
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_keyword_prefix() -> String {
    "ComfyUI".to_string()
}
fn default_output_path() -> PathBuf {
    PathBuf::from("index.html")
}
fn default_favorites_storage_key() -> String {
    "comfy_intel_favorites".to_string()
}
fn default_search_link_base() -> String {
    "https://search.bilibili.com/all?keyword=".to_string()
}

/// Every tunable of a digest run. All fields have defaults so a partial file
/// (or no file at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigestConfig {
    #[serde(default = "default_feed_url_base")]
    pub feed_url_base: String,
    #[serde(default = "default_feed_ranking")]
    pub feed_ranking: FeedRanking,
    #[serde(default = "default_feed_limit")]
    pub feed_limit: usize,

    #[serde(default = "default_search_api_base")]
    pub search_api_base: String,
    #[serde(default = "default_search_query")]
    pub search_query: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Repositories must be created within this many days.
    #[serde(default = "default_freshness_window_days")]
    pub freshness_window_days: i64,

    #[serde(default = "default_summary_char_cap")]
    pub summary_char_cap: usize,
    #[serde(default = "default_title_char_cap")]
    pub title_char_cap: usize,

    /// Per-request timeout (also bounds each source task).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Deadline for the whole collect + translate phase.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    #[serde(default = "default_translate_concurrency")]
    pub translate_concurrency: usize,
    #[serde(default = "default_true")]
    pub translate_enabled: bool,
    #[serde(default = "default_translate_api_base")]
    pub translate_api_base: String,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_keyword_prefix")]
    pub keyword_prefix: String,
    #[serde(default = "default_true")]
    pub dedup_by_id: bool,

    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_favorites_storage_key")]
    pub favorites_storage_key: String,
    #[serde(default = "default_search_link_base")]
    pub search_link_base: String,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            feed_url_base: default_feed_url_base(),
            feed_ranking: default_feed_ranking(),
            feed_limit: default_feed_limit(),
            search_api_base: default_search_api_base(),
            search_query: default_search_query(),
            search_limit: default_search_limit(),
            freshness_window_days: default_freshness_window_days(),
            summary_char_cap: default_summary_char_cap(),
            title_char_cap: default_title_char_cap(),
            request_timeout_secs: default_request_timeout_secs(),
            run_timeout_secs: default_run_timeout_secs(),
            translate_concurrency: default_translate_concurrency(),
            translate_enabled: true,
            translate_api_base: default_translate_api_base(),
            target_lang: default_target_lang(),
            user_agent: default_user_agent(),
            keyword_prefix: default_keyword_prefix(),
            dedup_by_id: true,
            output_path: default_output_path(),
            favorites_storage_key: default_favorites_storage_key(),
            search_link_base: default_search_link_base(),
        }
    }
}

impl DigestConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Full feed URL for the configured ranking mode.
    pub fn feed_url(&self) -> String {
        format!(
            "{}{}",
            self.feed_url_base.trim_end_matches('/'),
            self.feed_ranking.path_and_query()
        )
    }

    /// Clamp out-of-range values back to something runnable.
    fn sanitized(mut self) -> Self {
        self.feed_limit = self.feed_limit.max(1);
        self.search_limit = self.search_limit.clamp(1, 100);
        self.freshness_window_days = self.freshness_window_days.max(0);
        self.summary_char_cap = self.summary_char_cap.max(MIN_TRANSLATABLE_CHARS);
        self.title_char_cap = self.title_char_cap.max(MIN_TRANSLATABLE_CHARS);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        if self.run_timeout_secs < self.request_timeout_secs {
            self.run_timeout_secs = self.request_timeout_secs;
        }
        self.translate_concurrency = self.translate_concurrency.max(1);
        if self.favorites_storage_key.trim().is_empty() {
            self.favorites_storage_key = default_favorites_storage_key();
        }
        self
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<DigestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading digest config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing digest config {}", path.display()))?;
    Ok(cfg.sanitized())
}

/// Load config using env var + fallbacks:
/// 1) $DIGEST_CONFIG_PATH
/// 2) config/digest.toml
/// 3) config/digest.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<DigestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_TOML_PATH);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_JSON_PATH);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(DigestConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DigestConfig> {
    match hint_ext {
        "json" => Ok(serde_json::from_str(s)?),
        "toml" => Ok(toml::from_str(s)?),
        _ => {
            if let Ok(v) = toml::from_str(s) {
                return Ok(v);
            }
            serde_json::from_str(s).map_err(|_| anyhow!("unsupported digest config format"))
        }
    }
}
