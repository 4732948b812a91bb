pub mod cache;
pub mod cli;
pub mod config;
mod metrics;
pub mod model;
pub mod phash;
pub mod server;
pub mod utils;

pub use cache::{EmbeddingCache, Lookup};
pub use config::Opts;
