//! Driftnet engine: fetch, feed, rewrite, store, and worker pipeline.
mod config;
mod decode;
mod feed;
mod feeder;
mod fetch;
mod ingest;
mod jobs;
mod rewrite;
mod store;
mod worker;

pub use config::{load_blocklist, load_feed_sources, Config, ConfigError};
pub use decode::{decode_html, transliterate_ascii, DecodedHtml};
pub use feed::{clean_title, parse_feed, FeedEntry, FeedError};
pub use feeder::{FeedIngestor, FeedSummary, FeederSettings};
pub use fetch::{
    HttpRenderer, PageRenderer, RenderError, RenderFailure, RenderSettings, RenderedPage,
};
pub use ingest::Ingestor;
pub use jobs::{JobPool, SubmitError};
pub use rewrite::{rewrite, RewriteError};
pub use store::{ContentStore, SampledItem, SqliteStore, StoreError};
pub use worker::{Worker, WorkerSettings};
