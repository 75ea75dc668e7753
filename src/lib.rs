// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod assemble;
pub mod config;
pub mod engine;
pub mod favorites;
pub mod ingest;
pub mod render;
pub mod translate;

// ---- Re-exports for stable public API ----
pub use crate::assemble::{DigestItem, Tag};
pub use crate::config::DigestConfig;
pub use crate::engine::{Engine, RunSummary};
pub use crate::favorites::{FavoriteRecord, FavoritesStore};
pub use crate::ingest::types::{CollectOutcome, RawEntry, SourceKind, SourceProvider};
pub use crate::translate::{TextFacade, Translator};
