mod ingest;
mod search;
pub mod server;
mod setup;
mod stats;

pub use ingest::*;
pub use search::*;
pub use server::*;
pub use setup::*;
pub use stats::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}
