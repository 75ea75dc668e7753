pub mod feed_rss;
pub mod github_search;

pub use feed_rss::FeedProvider;
pub use github_search::GithubSearchProvider;
