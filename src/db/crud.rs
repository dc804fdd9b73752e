use sqlx::{Result, Row};

use super::Database;

/// 批量追加图片记录，一次网络往返
///
/// 键冲突的行会被跳过而不是覆盖，因此重复入库是安全的空操作。
/// 返回实际插入的行数。
pub async fn add_pictures(db: &Database, keys: &[String], embeddings: &[String]) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO pictures (key, embedding)
        SELECT t.key, t.embedding::vector
        FROM UNNEST($1::text[], $2::text[]) AS t(key, embedding)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(keys)
    .bind(embeddings)
    .execute(db)
    .await?;

    Ok(result.rows_affected())
}

/// 查询与给定向量最近的 k 个图片键，按距离升序
///
/// `<->` 为 pgvector 的 L2 距离算子，在单位向量上与余弦相似度
/// 单调等价。并列时沿用存储层的自然顺序。
pub async fn nearest_pictures(db: &Database, embedding: &str, k: i64) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT key FROM pictures
        ORDER BY embedding <-> $1::vector
        LIMIT $2
        "#,
    )
    .bind(embedding)
    .bind(k)
    .fetch_all(db)
    .await?;

    Ok(rows.iter().map(|row| row.get("key")).collect())
}

pub async fn count_pictures(db: &Database) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) FROM pictures").fetch_one(db).await?;
    row.try_get(0)
}

/// 向量范数均值，用于校验归一化不变式
pub async fn avg_embedding_norm(db: &Database) -> Result<Option<f64>> {
    let row = sqlx::query("SELECT AVG(vector_norm(embedding))::float8 FROM pictures")
        .fetch_one(db)
        .await?;
    row.try_get(0)
}

pub async fn table_disk_usage(db: &Database) -> Result<String> {
    let row = sqlx::query("SELECT pg_size_pretty(pg_total_relation_size('pictures'))")
        .fetch_one(db)
        .await?;
    row.try_get(0)
}
