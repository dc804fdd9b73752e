use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::picdb::PicDB;

#[derive(Parser, Debug, Clone)]
pub struct StatsCommand {}

impl SubCommandExtend for StatsCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = PicDB::connect(&opts.pg).await?;
        let stats = db.stats().await?;

        println!("图片总数: {}", stats.pictures);
        match stats.avg_norm {
            Some(avg) => println!("向量范数均值: {avg:.6}"),
            None => println!("向量范数均值: -"),
        }
        println!("磁盘占用: {}", stats.disk_usage);
        Ok(())
    }
}
