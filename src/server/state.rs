use std::sync::Arc;

use crate::cli::server::ServerCommand;
use crate::config::SearchOptions;
use crate::embed::ClipClient;
use crate::picdb::PicDB;
use crate::storage::S3Source;

/// 应用状态
pub struct AppState {
    /// 编码模型客户端
    pub model: ClipClient,
    /// 向量库
    pub db: PicDB,
    /// 对象存储
    pub source: S3Source,
    /// 搜索配置选项
    pub search: SearchOptions,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(model: ClipClient, db: PicDB, source: S3Source, opts: ServerCommand) -> Arc<Self> {
        Arc::new(AppState { model, db, source, search: opts.search })
    }
}
