use std::time::Duration;

use anyhow::Result;

use crate::config::PgOptions;
use crate::db::{self, Database};
use crate::utils::vector_literal;

pub use crate::db::{CorpusStats, PictureRow};

/// 向量存储
///
/// 入库管道和查询服务只依赖这个契约，不关心底层的距离算子
/// 和索引结构。
pub trait VectorStore: Send + Sync {
    /// 批量追加记录，跳过已存在的键，返回实际写入的行数
    fn bulk_append(&self, rows: &[PictureRow]) -> impl Future<Output = Result<u64>> + Send;

    /// 返回与给定向量最近的至多 k 个键，按距离升序
    fn nearest(&self, embedding: &[f32], k: usize) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// 基于 Postgres + pgvector 的图片向量库
pub struct PicDB {
    db: Database,
}

impl PicDB {
    /// 建立连接池
    pub async fn connect(opts: &PgOptions) -> Result<Self> {
        let db = db::init_db(
            &opts.pg_service_uri,
            Duration::from_secs(opts.pg_statement_timeout),
        )
        .await?;
        Ok(Self { db })
    }

    /// 初始化 vector 扩展和 pictures 表
    pub async fn setup(&self) -> Result<()> {
        db::run_migrations(&self.db).await?;
        Ok(())
    }

    /// 语料库统计信息
    pub async fn stats(&self) -> Result<CorpusStats> {
        Ok(CorpusStats {
            pictures: db::crud::count_pictures(&self.db).await?,
            avg_norm: db::crud::avg_embedding_norm(&self.db).await?,
            disk_usage: db::crud::table_disk_usage(&self.db).await?,
        })
    }
}

impl VectorStore for PicDB {
    async fn bulk_append(&self, rows: &[PictureRow]) -> Result<u64> {
        let keys = rows.iter().map(|row| row.key.clone()).collect::<Vec<_>>();
        let embeddings =
            rows.iter().map(|row| vector_literal(&row.embedding)).collect::<Vec<_>>();
        let added = db::crud::add_pictures(&self.db, &keys, &embeddings).await?;
        Ok(added)
    }

    async fn nearest(&self, embedding: &[f32], k: usize) -> Result<Vec<String>> {
        let keys =
            db::crud::nearest_pictures(&self.db, &vector_literal(embedding), k as i64).await?;
        Ok(keys)
    }
}
