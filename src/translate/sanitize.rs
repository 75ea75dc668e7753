// src/translate/sanitize.rs
//! Markup → plain text. Used on every title and summary before translation,
//! and again on translator output.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<!--.*?-->|<[/!?]?[a-z][^>]*>").unwrap())
}

fn re_entity() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap())
}

// reddit appends "submitted by /u/foo [link] [comments]" to every entry
fn re_reddit_footer() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)submitted\s+by\s+/?u/\S+|\[link\]|\[comments\]").unwrap()
    })
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Strip tags, decode entities, drop feed boilerplate, collapse whitespace and
/// cap at `max_chars` characters.
///
/// Decoding can surface markup that was entity-encoded (`&lt;b&gt;`), so the
/// strip/decode pair repeats until the text stops changing.
pub fn sanitize(raw: &str, max_chars: usize) -> String {
    let mut out = raw.to_string();
    for _ in 0..4 {
        let stripped = re_tags().replace_all(&out, " ");
        let decoded = html_escape::decode_html_entities(&stripped).to_string();
        if decoded == out {
            break;
        }
        out = decoded;
    }
    out = re_tags().replace_all(&out, " ").to_string();
    out = re_entity().replace_all(&out, " ").to_string();
    out = re_reddit_footer().replace_all(&out, " ").to_string();

    // Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    out = re_ws().replace_all(&out, " ").trim().to_string();
    truncate_chars(&out, max_chars)
}

/// Char-boundary-safe truncation.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.chars()
        .take(max_chars)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// True when `s` still contains something that looks like a tag or entity.
pub fn has_residual_markup(s: &str) -> bool {
    re_tags().is_match(s) || re_entity().is_match(s)
}
