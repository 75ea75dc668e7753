// src/translate/google.rs
use async_trait::async_trait;
use serde_json::Value;

use super::{TranslationFailure, Translator};

/// Google's public web translate endpoint (`client=gtx`). No key; best-effort.
pub struct GoogleWebTranslator {
    http: reqwest::Client,
    api_base: String,
    target_lang: String,
}

impl GoogleWebTranslator {
    pub fn new(http: reqwest::Client, api_base: String, target_lang: String) -> Self {
        Self {
            http,
            api_base,
            target_lang,
        }
    }
}

/// Response is `[[["译文","source",..], ["…","…",..]], null, "en", ..]`;
/// the translation is the concatenation of every segment's first element.
pub(crate) fn parse_gtx_response(v: &Value) -> Result<String, TranslationFailure> {
    let segments = v
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationFailure::Malformed("missing segment array".into()))?;

    let mut out = String::new();
    for seg in segments {
        if let Some(part) = seg.get(0).and_then(Value::as_str) {
            out.push_str(part);
        }
    }
    if out.trim().is_empty() {
        return Err(TranslationFailure::Empty);
    }
    Ok(out)
}

#[async_trait]
impl Translator for GoogleWebTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationFailure> {
        let url = format!("{}/translate_a/single", self.api_base.trim_end_matches('/'));
        let resp = self
            .http
            .get(url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", self.target_lang.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(TranslationFailure::HttpStatus(resp.status().as_u16()));
        }
        let v: Value = resp
            .json()
            .await
            .map_err(|e| TranslationFailure::Malformed(e.to_string()))?;
        parse_gtx_response(&v)
    }

    fn name(&self) -> &'static str {
        "google-web"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_segments() {
        let v: Value =
            serde_json::from_str(r#"[[["你好，","Hello, ",null],["世界","world",null]],null,"en"]"#)
                .unwrap();
        assert_eq!(parse_gtx_response(&v).unwrap(), "你好，世界");
    }

    #[test]
    fn rejects_unexpected_shape() {
        let v: Value = serde_json::from_str(r#"{"error":"quota"}"#).unwrap();
        assert!(matches!(
            parse_gtx_response(&v),
            Err(TranslationFailure::Malformed(_))
        ));
    }
}
