//! Cache-aware data parallel rank router library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use http::HttpServer;
pub use routing::{select_rank, PartitionCount, RankRouter};
