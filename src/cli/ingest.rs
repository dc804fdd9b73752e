use std::num::NonZeroUsize;

use clap::Parser;
use indicatif::ProgressBar;

use crate::cli::SubCommandExtend;
use crate::config::{ClipOptions, Opts, S3Options};
use crate::embed::ClipClient;
use crate::ingest::Ingestor;
use crate::picdb::PicDB;
use crate::storage::S3Source;
use crate::utils::pb_style;

#[derive(Parser, Debug, Clone)]
pub struct IngestCommand {
    #[command(flatten)]
    pub s3: S3Options,
    #[command(flatten)]
    pub clip: ClipOptions,
    /// 批次大小，也是累积多少行后触发一次批量写入的阈值
    #[arg(short = 'b', long, value_name = "N", default_value_t = NonZeroUsize::new(100).unwrap())]
    pub batch_size: NonZeroUsize,
    /// 批内并发拉取数量
    #[arg(long, value_name = "N", default_value_t = NonZeroUsize::new(8).unwrap())]
    pub fetch_concurrency: NonZeroUsize,
}

impl SubCommandExtend for IngestCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let model = ClipClient::new(&self.clip)?;
        let store = PicDB::connect(&opts.pg).await?;
        let source = S3Source::connect(&self.s3).await?;

        let pb = ProgressBar::no_length().with_style(pb_style());
        let report = Ingestor::new(&source, &model, &store)
            .batch_size(self.batch_size.get())
            .fetch_concurrency(self.fetch_concurrency.get())
            .progress(pb.clone())
            .run()
            .await?;
        pb.finish_with_message("入库完成");

        println!("对象总数: {}", report.listed);
        println!("写入: {}，重复跳过: {}", report.appended, report.skipped);
        if report.fetch_failures + report.decode_failures > 0 {
            println!("拉取失败: {}，解码失败: {}", report.fetch_failures, report.decode_failures);
        }
        if report.encode_failures + report.failed_flushes > 0 {
            // 失败批次的行在本趟内丢失，入库按键幂等，重跑即可补齐
            println!("失败批次: 编码 {}，写入 {}", report.encode_failures, report.failed_flushes);
        }
        Ok(())
    }
}
