use clap::{Parser, Subcommand};

use crate::cli::*;

#[derive(Parser, Debug, Clone)]
#[command(name = "picsearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    #[command(flatten)]
    pub pg: PgOptions,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 全量入库：把对象存储中的图片编码后写入向量库
    Ingest(IngestCommand),
    /// 用一段文本搜索相似图片
    Search(SearchCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
    /// 初始化数据库，启用 vector 扩展并建表
    Setup(SetupCommand),
    /// 查看语料库统计信息
    Stats(StatsCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct PgOptions {
    /// PostgreSQL 连接地址，服务端需要支持 pgvector 扩展
    #[arg(long, env = "PG_SERVICE_URI", value_name = "URI", hide_env_values = true)]
    pub pg_service_uri: String,
    /// 查询语句超时（秒），超时的查询会被服务端取消
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub pg_statement_timeout: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct S3Options {
    /// S3 端点，不填则使用 AWS 默认端点
    #[arg(long, env = "S3_ENDPOINT", value_name = "URL")]
    pub s3_endpoint: Option<String>,
    /// 图片所在的 bucket
    #[arg(long, env = "S3_BUCKET_NAME", value_name = "NAME")]
    pub s3_bucket: String,
    /// S3 access key，不填则走 AWS SDK 默认凭证链
    #[arg(long, env = "S3_ACCESS_KEY", hide_env_values = true)]
    pub s3_access_key: Option<String>,
    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,
    /// S3 区域
    #[arg(long, env = "S3_REGION", value_name = "REGION", default_value = "us-east-1")]
    pub s3_region: String,
}

#[derive(Parser, Debug, Clone)]
pub struct ClipOptions {
    /// CLIP 推理服务地址
    #[arg(long, env = "CLIP_ENDPOINT", value_name = "URL")]
    pub clip_endpoint: String,
    /// 模型名称，入库与查询两侧必须使用同一个模型
    #[arg(long, env = "CLIP_MODEL", value_name = "NAME", default_value = "ViT-B/32")]
    pub clip_model: String,
    /// 编码请求超时（秒）
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub clip_timeout: u64,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 返回的最近邻数量
    #[arg(short = 'k', long, value_name = "K", default_value_t = 4)]
    pub count: usize,
    /// 预签名链接有效期（秒）
    #[arg(long, value_name = "SECS", default_value_t = 3600)]
    pub url_ttl: u64,
}
