use clap::Parser;

use picsearch::cli::SubCommandExtend;
use picsearch::config::{Opts, SubCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let opts = Opts::parse();
    match &opts.subcmd {
        SubCommand::Ingest(cmd) => cmd.run(&opts).await,
        SubCommand::Search(cmd) => cmd.run(&opts).await,
        SubCommand::Server(cmd) => cmd.run(&opts).await,
        SubCommand::Setup(cmd) => cmd.run(&opts).await,
        SubCommand::Stats(cmd) => cmd.run(&opts).await,
    }
}
