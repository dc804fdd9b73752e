use std::time::Duration;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;

use crate::cli::SubCommandExtend;
use crate::config::{ClipOptions, Opts, S3Options, SearchOptions};
use crate::embed::ClipClient;
use crate::picdb::PicDB;
use crate::searcher::{Match, Searcher};
use crate::storage::S3Source;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub s3: S3Options,
    #[command(flatten)]
    pub clip: ClipOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 查询文本
    pub text: String,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let model = ClipClient::new(&self.clip)?;
        let store = PicDB::connect(&opts.pg).await?;
        let source = S3Source::connect(&self.s3).await?;

        info!("搜索: {:?}", self.text);
        let matches = Searcher::new(&model, &store, &source)
            .count(self.search.count)
            .url_ttl(Duration::from_secs(self.search.url_ttl))
            .search(&self.text)
            .await?;

        print_result(&matches, self)
    }
}

fn print_result(matches: &[Match], opts: &SearchCommand) -> Result<()> {
    match opts.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(matches)?)
        }
        OutputFormat::Table => {
            for (i, m) in matches.iter().enumerate() {
                println!("{}: {}", i + 1, m.key);
                println!("   URL: {}", m.url);
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone)]
pub enum OutputFormat {
    Json,
    Table,
}
