// src/ingest/providers/feed_rss.rs
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

use crate::ingest::types::{RawEntry, SourceKind, SourceProvider, SourceUnavailable};

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

// --- Atom (what reddit actually serves behind `.rss`) ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    content: Option<TextNode>,
    summary: Option<TextNode>,
    published: Option<String>,
    updated: Option<String>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}
#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

fn parse_rfc2822_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

fn parse_rfc3339_to_unix(ts: &str) -> Option<u64> {
    OffsetDateTime::parse(ts.trim(), &Rfc3339)
        .ok()
        .map(|dt| dt.unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
}

/// Syndication feed adapter. Keeps the first `limit` entries in document
/// order; the endpoint itself decides the ranking (top-of-day vs newest).
pub struct FeedProvider {
    name: &'static str,
    limit: usize,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl FeedProvider {
    pub fn from_url(url: impl Into<String>, client: reqwest::Client, limit: usize) -> Self {
        Self {
            name: "reddit",
            limit,
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    pub fn from_fixture_str(s: &str, limit: usize) -> Self {
        Self {
            name: "reddit",
            limit,
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    fn parse_entries(&self, s: &str) -> Result<Vec<RawEntry>, SourceUnavailable> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);

        let mut out = if looks_like_atom(&xml_clean) {
            let feed: AtomFeed = from_str(&xml_clean)
                .map_err(|e| SourceUnavailable::Parse(format!("atom: {e}")))?;
            feed.entries
                .into_iter()
                .map(|e| self.atom_entry(e))
                .collect::<Vec<_>>()
        } else {
            let rss: Rss = from_str(&xml_clean)
                .map_err(|e| SourceUnavailable::Parse(format!("rss: {e}")))?;
            rss.channel
                .item
                .into_iter()
                .map(|it| self.rss_item(it))
                .collect::<Vec<_>>()
        };
        out.truncate(self.limit);

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("digest_parse_ms").record(ms);
        Ok(out)
    }

    fn atom_entry(&self, e: AtomEntry) -> RawEntry {
        let url = e
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| e.links.first())
            .and_then(|l| l.href.clone());
        let body = e.content.or(e.summary).map(|t| t.text);
        let published_at = e
            .published
            .as_deref()
            .or(e.updated.as_deref())
            .and_then(parse_rfc3339_to_unix);
        RawEntry {
            source: SourceKind::Feed,
            adapter: self.name.to_string(),
            title: e.title.map(|t| t.text).unwrap_or_default(),
            body,
            url,
            popularity: None,
            published_at,
        }
    }

    fn rss_item(&self, it: Item) -> RawEntry {
        RawEntry {
            source: SourceKind::Feed,
            adapter: self.name.to_string(),
            title: it.title.unwrap_or_default(),
            body: it.description,
            url: it.link.map(|l| l.trim().to_string()),
            popularity: None,
            published_at: it.pub_date.as_deref().and_then(parse_rfc2822_to_unix),
        }
    }
}

#[async_trait]
impl SourceProvider for FeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<RawEntry>, SourceUnavailable> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_entries(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url.as_str())
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                self.parse_entries(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn looks_like_atom(s: &str) -> bool {
    match (s.find("<feed"), s.find("<rss")) {
        (Some(_), None) => true,
        (Some(a), Some(r)) => a < r,
        _ => false,
    }
}

// HTML named entities are not valid XML; swap the common ones before parsing.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
