pub mod cli;
pub mod config;
mod db;
pub mod embed;
pub mod ingest;
pub mod picdb;
pub mod searcher;
mod server;
pub mod storage;
pub mod utils;

pub use config::Opts;
pub use ingest::{IngestReport, Ingestor};
pub use picdb::PicDB;
pub use searcher::{Match, Searcher};
