pub mod digest;

pub use digest::{load_config_default, load_config_from, DigestConfig, FeedRanking};
