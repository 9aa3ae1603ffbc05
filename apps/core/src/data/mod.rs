//! Data access: the fetch chain, its disk cache and the demo generator.

pub mod cache;
pub mod demo;
pub mod fetcher;
pub mod source;

pub use cache::ResponseCache;
pub use demo::DemoData;
pub use fetcher::{DataFetcher, EndpointStatus};
pub use source::DataSource;
