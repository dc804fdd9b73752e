use clap::Parser;
use log::info;
use tokio::net::TcpListener;

use crate::cli::SubCommandExtend;
use crate::config::{ClipOptions, Opts, S3Options, SearchOptions};
use crate::embed::ClipClient;
use crate::picdb::PicDB;
use crate::storage::S3Source;
use crate::server;

#[derive(Parser, Debug, Clone)]
pub struct ServerCommand {
    #[command(flatten)]
    pub s3: S3Options,
    #[command(flatten)]
    pub clip: ClipOptions,
    #[command(flatten)]
    pub search: SearchOptions,
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub addr: String,
}

impl SubCommandExtend for ServerCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let model = ClipClient::new(&self.clip)?;
        let db = PicDB::connect(&opts.pg).await?;
        let source = S3Source::connect(&self.s3).await?;

        // 创建应用状态
        let state = server::AppState::new(model, db, source, self.clone());

        // 创建应用
        let app = server::create_app(state);

        // 启动服务器
        info!("服务器启动：http://{}", &self.addr);
        let listener = TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
