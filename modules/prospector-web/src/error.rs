use thiserror::Error;

/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("fetch {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetch {url} {status}")]
    Status { url: String, status: u16 },

    /// Only HTML and XML bodies are accepted.
    #[error("skip non-html {url} ({content_type})")]
    NotMarkup { url: String, content_type: String },

    #[error("failed to parse feed: {0}")]
    Feed(#[from] feed_rs::parser::ParseFeedError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
