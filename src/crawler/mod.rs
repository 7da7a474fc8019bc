//! Crawl orchestration
//!
//! Each configured provider runs one crawl cycle per invocation. A cycle
//! first re-downloads the entries due this week, then works through the
//! provider's discovery mechanism: a dense integer range for API-style
//! providers, paginated listings for the rest. The per-provider scraping
//! details live behind the trait seams in [`traits`]; the default HTTP
//! implementations are in [`fetcher`].

pub mod convert;
pub mod fetcher;
pub mod finder;
pub mod pagination_crawler;
pub mod range_crawler;
pub mod session;
pub mod traits;

pub use convert::JsonAnimeConverter;
pub use fetcher::{
    build_http_client, HttpDownloader, HttpPageFetcher, RegexEntryExtractor,
    RegexHighestIdDetector,
};
pub use finder::AlreadyDownloadedFinder;
pub use pagination_crawler::PaginationCrawler;
pub use range_crawler::RangeCrawler;
pub use session::{CrawlSession, DownloadOutcome, DownloadTally};
pub use traits::{
    AnimeConverter, Downloader, EntryExtractor, HighestIdDetector, PageFetcher, PageResponse,
};
