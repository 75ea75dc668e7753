// src/translate/mod.rs
//! Sanitizer + translator façade.
//!
//! The translator is an injected service (`Arc<dyn Translator>`), so callers
//! and tests decide what backs it. Every failure degrades to the sanitized
//! source text; nothing here returns an error to the pipeline.

pub mod google;
pub mod sanitize;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;

use crate::config::DigestConfig;

pub use google::GoogleWebTranslator;
pub use sanitize::{has_residual_markup, sanitize, truncate_chars};

/// Sanitized inputs shorter than this are not worth a translation call.
pub const MIN_TRANSLATABLE_CHARS: usize = 5;

#[derive(Debug, Error)]
pub enum TranslationFailure {
    #[error("translation disabled")]
    Disabled,
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("empty translation")]
    Empty,
}

impl From<reqwest::Error> for TranslationFailure {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(s) => TranslationFailure::HttpStatus(s.as_u16()),
            None => TranslationFailure::Network(e.to_string()),
        }
    }
}

/// Opaque text-in/text-out service.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslationFailure>;
    fn name(&self) -> &'static str;
}

pub type DynTranslator = Arc<dyn Translator>;

/// Always fails; used when translation is switched off.
pub struct DisabledTranslator;

#[async_trait]
impl Translator for DisabledTranslator {
    async fn translate(&self, _text: &str) -> Result<String, TranslationFailure> {
        Err(TranslationFailure::Disabled)
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Build the translator described by config.
pub fn build_translator(cfg: &DigestConfig, http: reqwest::Client) -> DynTranslator {
    if !cfg.translate_enabled {
        return Arc::new(DisabledTranslator);
    }
    Arc::new(GoogleWebTranslator::new(
        http,
        cfg.translate_api_base.clone(),
        cfg.target_lang.clone(),
    ))
}

#[derive(Clone)]
pub struct TextFacade {
    translator: DynTranslator,
}

impl TextFacade {
    pub fn new(translator: DynTranslator) -> Self {
        Self { translator }
    }

    pub fn translator_name(&self) -> &'static str {
        self.translator.name()
    }

    /// Sanitize and decide whether translation is worth attempting.
    /// `None` means "too short": the field is empty and no call is made.
    pub fn prepare(raw: &str, max_chars: usize) -> Option<String> {
        let clean = sanitize(raw, max_chars);
        if clean.chars().count() < MIN_TRANSLATABLE_CHARS {
            None
        } else {
            Some(clean)
        }
    }

    /// One translation attempt on already-sanitized text; falls back to it.
    pub async fn translate_prepared(&self, clean: &str, max_chars: usize) -> String {
        match self.translator.translate(clean).await {
            Ok(t) => {
                let t = sanitize(&t, max_chars);
                if t.is_empty() {
                    counter!("digest_translation_fallback_total").increment(1);
                    clean.to_string()
                } else {
                    t
                }
            }
            Err(e) => {
                tracing::debug!(
                    target: "translate",
                    translator = self.translator.name(),
                    error = %e,
                    "translation failed, keeping source text"
                );
                counter!("digest_translation_fallback_total").increment(1);
                clean.to_string()
            }
        }
    }

    pub async fn sanitize_and_translate(&self, raw: &str, max_chars: usize) -> String {
        match Self::prepare(raw, max_chars) {
            Some(clean) => self.translate_prepared(&clean, max_chars).await,
            None => String::new(),
        }
    }
}
