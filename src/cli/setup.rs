use clap::Parser;
use log::info;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::picdb::PicDB;

#[derive(Parser, Debug, Clone)]
pub struct SetupCommand {}

impl SubCommandExtend for SetupCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = PicDB::connect(&opts.pg).await?;
        db.setup().await?;
        info!("vector 扩展与 pictures 表已就绪");
        Ok(())
    }
}
