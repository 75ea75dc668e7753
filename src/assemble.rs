// src/assemble.rs
//! RawEntry → DigestItem.
//!
//! Translation is the slow part, so every translatable field becomes a job on
//! a bounded pool. Jobs write back into the slot they came from; item order is
//! the input order (source, then the source's own order) no matter which call
//! finishes first.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::config::DigestConfig;
use crate::ingest::types::{RawEntry, SourceKind};
use crate::translate::{sanitize, truncate_chars, TextFacade};

pub const UNTITLED: &str = "(untitled)";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    CommunityHighlight,
    NewTool,
}

impl Tag {
    pub fn for_source(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Feed => Tag::CommunityHighlight,
            SourceKind::Search => Tag::NewTool,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tag::CommunityHighlight => "社区热点",
            Tag::NewTool => "新工具",
        }
    }
}

/// One normalized intel entry of a run. `id` is the identity key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestItem {
    pub id: String,
    pub tag: Tag,
    pub title_display: String,
    /// Original-language title; only used to build search queries.
    pub title_source: String,
    pub summary: String,
    pub link: String,
    pub score_label: String,
    pub source_adapter: String,
    pub search_keyword: String,
}

/// Result of one assembly pass with counters for the run log.
#[derive(Debug, Default)]
pub struct Assembled {
    pub items: Vec<DigestItem>,
    pub malformed_dropped: usize,
    pub duplicates_dropped: usize,
    pub translation_jobs: usize,
    pub translation_timeouts: usize,
}

/// Absolute http(s) URL or nothing.
pub fn canonical_id(url: Option<&str>) -> Option<String> {
    let raw = url?.trim();
    let parsed = reqwest::Url::parse(raw).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return None;
    }
    Some(parsed.to_string())
}

pub fn search_keyword(title_source: &str) -> String {
    title_source.replace(['"', '\''], "").trim().to_string()
}

pub fn score_label(kind: SourceKind, popularity: Option<u64>) -> String {
    match kind {
        SourceKind::Feed => "🔥 Hot".to_string(),
        SourceKind::Search => format!("⭐ {}", popularity.unwrap_or(0)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Summary,
}

struct Job {
    slot: usize,
    field: Field,
    clean: String,
    cap: usize,
}

pub struct ItemAssembler {
    facade: TextFacade,
    summary_cap: usize,
    title_cap: usize,
    concurrency: usize,
    keyword_prefix: String,
    dedup_by_id: bool,
}

impl ItemAssembler {
    pub fn new(cfg: &DigestConfig, facade: TextFacade) -> Self {
        Self {
            facade,
            summary_cap: cfg.summary_char_cap,
            title_cap: cfg.title_char_cap,
            concurrency: cfg.translate_concurrency.max(1),
            keyword_prefix: cfg.keyword_prefix.clone(),
            dedup_by_id: cfg.dedup_by_id,
        }
    }

    fn summary_fallback(&self, kind: SourceKind) -> String {
        let canned = match kind {
            SourceKind::Feed => "社区讨论帖，暂无文字摘要，点击查看原文。".to_string(),
            SourceKind::Search => {
                format!("本周新发布的高关注度 {} 节点。", self.keyword_prefix)
            }
        };
        truncate_chars(&canned, self.summary_cap)
    }

    /// Build the untranslated item and queue its translatable fields.
    fn draft(&self, slot: usize, entry: &RawEntry, jobs: &mut Vec<Job>) -> Option<DigestItem> {
        let Some(id) = canonical_id(entry.url.as_deref()) else {
            tracing::warn!(
                target: "assemble",
                adapter = %entry.adapter,
                url = ?entry.url,
                "malformed entry: no usable url, skipped"
            );
            return None;
        };

        let mut name = sanitize(&entry.title, self.title_cap);
        let untitled = name.is_empty();
        if untitled {
            name = UNTITLED.to_string();
        }

        let (title_display, title_source) = match entry.source {
            SourceKind::Feed => {
                let prepared = if untitled {
                    None
                } else {
                    TextFacade::prepare(&name, self.title_cap)
                };
                if let Some(clean) = prepared {
                    jobs.push(Job {
                        slot,
                        field: Field::Title,
                        clean,
                        cap: self.title_cap,
                    });
                }
                (name.clone(), name)
            }
            SourceKind::Search => (
                format!("黑马节点: {name}"),
                format!("{} {}", self.keyword_prefix, name).trim().to_string(),
            ),
        };

        let summary = match entry
            .body
            .as_deref()
            .and_then(|b| TextFacade::prepare(b, self.summary_cap))
        {
            Some(clean) => {
                jobs.push(Job {
                    slot,
                    field: Field::Summary,
                    clean: clean.clone(),
                    cap: self.summary_cap,
                });
                clean
            }
            None => self.summary_fallback(entry.source),
        };

        Some(DigestItem {
            id: id.clone(),
            tag: Tag::for_source(entry.source),
            search_keyword: search_keyword(&title_source),
            title_display,
            title_source,
            summary,
            link: id,
            score_label: score_label(entry.source, entry.popularity),
            source_adapter: entry.adapter.clone(),
        })
    }

    /// Assemble in input order. Translations still pending at `deadline` keep
    /// their source-language text.
    pub async fn assemble(&self, entries: &[RawEntry], deadline: Instant) -> Assembled {
        let mut report = Assembled::default();
        let mut slots: Vec<DigestItem> = Vec::with_capacity(entries.len());
        let mut jobs = Vec::new();
        let mut seen = HashSet::new();

        for entry in entries {
            let mut entry_jobs = Vec::new();
            let Some(item) = self.draft(slots.len(), entry, &mut entry_jobs) else {
                report.malformed_dropped += 1;
                continue;
            };
            if self.dedup_by_id && !seen.insert(item.id.clone()) {
                tracing::debug!(target: "assemble", id = %item.id, "duplicate id dropped");
                report.duplicates_dropped += 1;
                continue;
            }
            slots.push(item);
            jobs.extend(entry_jobs);
        }
        counter!("digest_dedup_total").increment(report.duplicates_dropped as u64);
        report.translation_jobs = jobs.len();

        let sem = Arc::new(Semaphore::new(self.concurrency));
        let handles: Vec<_> = jobs
            .into_iter()
            .map(|job| {
                let sem = Arc::clone(&sem);
                let facade = self.facade.clone();
                tokio::spawn(async move {
                    let work = async {
                        let _permit = sem.acquire_owned().await.ok()?;
                        Some(facade.translate_prepared(&job.clean, job.cap).await)
                    };
                    let (text, timed_out) = match tokio::time::timeout_at(deadline, work).await {
                        Ok(Some(t)) => (t, false),
                        Ok(None) => (job.clean.clone(), false),
                        Err(_) => (job.clean.clone(), true),
                    };
                    (job.slot, job.field, text, timed_out)
                })
            })
            .collect();

        for h in handles {
            match h.await {
                Ok((slot, field, text, timed_out)) => {
                    if timed_out {
                        report.translation_timeouts += 1;
                        counter!("digest_translation_fallback_total").increment(1);
                    }
                    let item = &mut slots[slot];
                    match field {
                        Field::Title => item.title_display = text,
                        Field::Summary => item.summary = text,
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "assemble", error = %e, "translation task failed");
                }
            }
        }

        if report.translation_timeouts > 0 {
            tracing::warn!(
                target: "assemble",
                timeouts = report.translation_timeouts,
                "run deadline hit, untranslated fields kept"
            );
        }
        report.items = slots;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{DisabledTranslator, TranslationFailure, Translator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    #[async_trait]
    impl Translator for Counting {
        async fn translate(&self, text: &str) -> Result<String, TranslationFailure> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(text.to_string())
        }
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn entry(kind: SourceKind, title: &str, url: Option<&str>, body: Option<&str>) -> RawEntry {
        RawEntry {
            source: kind,
            adapter: match kind {
                SourceKind::Feed => "reddit".into(),
                SourceKind::Search => "github".into(),
            },
            title: title.into(),
            body: body.map(str::to_string),
            url: url.map(str::to_string),
            popularity: Some(42),
            published_at: None,
        }
    }

    #[test]
    fn canonical_id_requires_absolute_http() {
        assert_eq!(
            canonical_id(Some(" https://github.com/a/b ")).as_deref(),
            Some("https://github.com/a/b")
        );
        assert!(canonical_id(Some("/r/comfyui/comments/1")).is_none());
        assert!(canonical_id(Some("ftp://x/y")).is_none());
        assert!(canonical_id(Some("")).is_none());
        assert!(canonical_id(None).is_none());
    }

    #[test]
    fn keyword_drops_quotes() {
        assert_eq!(search_keyword(r#"My "best" node's"#), "My best nodes");
    }

    #[tokio::test]
    async fn search_items_use_original_name_for_keyword() {
        let cfg = DigestConfig::default();
        let a = ItemAssembler::new(&cfg, TextFacade::new(Arc::new(DisabledTranslator)));
        let entries = vec![entry(
            SourceKind::Search,
            "ComfyUI-Foo",
            Some("https://github.com/x/ComfyUI-Foo"),
            None,
        )];
        let out = a
            .assemble(&entries, Instant::now() + std::time::Duration::from_secs(5))
            .await;
        let it = &out.items[0];
        assert_eq!(it.tag, Tag::NewTool);
        assert_eq!(it.title_display, "黑马节点: ComfyUI-Foo");
        assert_eq!(it.title_source, "ComfyUI ComfyUI-Foo");
        assert_eq!(it.search_keyword, "ComfyUI ComfyUI-Foo");
        assert_eq!(it.score_label, "⭐ 42");
        assert_eq!(it.summary, "本周新发布的高关注度 ComfyUI 节点。");
    }

    #[tokio::test]
    async fn canned_summaries_respect_the_cap() {
        let cfg = DigestConfig {
            summary_char_cap: 10,
            ..Default::default()
        };
        let a = ItemAssembler::new(&cfg, TextFacade::new(Arc::new(DisabledTranslator)));
        let entries = vec![
            entry(SourceKind::Feed, "Some post", Some("https://a/1"), None),
            entry(SourceKind::Search, "ComfyUI-Foo", Some("https://a/2"), None),
        ];
        let out = a
            .assemble(&entries, Instant::now() + std::time::Duration::from_secs(5))
            .await;
        assert_eq!(out.items.len(), 2);
        for it in &out.items {
            assert!(!it.summary.is_empty());
            assert!(it.summary.chars().count() <= 10, "{}", it.summary);
        }
        assert_eq!(out.items[0].summary, "社区讨论帖，暂无文字");
    }

    #[tokio::test]
    async fn untitled_placeholder_is_not_translated() {
        let t = Arc::new(Counting(AtomicUsize::new(0)));
        let a = ItemAssembler::new(&DigestConfig::default(), TextFacade::new(t.clone()));
        let entries = vec![entry(SourceKind::Feed, "  ", Some("https://a/1"), None)];
        let out = a
            .assemble(&entries, Instant::now() + std::time::Duration::from_secs(5))
            .await;
        assert_eq!(out.items[0].title_display, UNTITLED);
        assert_eq!(out.translation_jobs, 0);
        assert_eq!(t.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_and_duplicates_are_counted() {
        let cfg = DigestConfig::default();
        let a = ItemAssembler::new(&cfg, TextFacade::new(Arc::new(DisabledTranslator)));
        let entries = vec![
            entry(SourceKind::Feed, "", Some("https://a/1"), Some("<p>body text</p>")),
            entry(SourceKind::Feed, "no url", None, None),
            entry(SourceKind::Search, "dup", Some("https://a/1"), None),
        ];
        let out = a
            .assemble(&entries, Instant::now() + std::time::Duration::from_secs(5))
            .await;
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.malformed_dropped, 1);
        assert_eq!(out.duplicates_dropped, 1);
        assert_eq!(out.items[0].title_display, UNTITLED);
        assert_eq!(out.items[0].summary, "body text");
        assert_eq!(out.items[0].score_label, "🔥 Hot");
    }
}
