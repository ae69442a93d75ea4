pub mod crawler;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod html;
pub mod links;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use crawler::{BoundedCrawler, CrawlHit, CrawlOptions};
pub use error::{FetchError, Result};
pub use feed::parse_feed;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use links::{extract_anchors, is_crawlable, is_same_origin, Anchor};
