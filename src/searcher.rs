use std::time::Duration;

use anyhow::Result;
use log::debug;
use serde::Serialize;

use crate::embed::{self, EmbeddingModel};
use crate::picdb::VectorStore;
use crate::storage::ObjectSource;

/// 默认返回的最近邻数量
pub const DEFAULT_COUNT: usize = 4;

/// 预签名链接的默认有效期
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(3600);

/// 单条搜索结果
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    /// 对象键
    pub key: String,
    /// 限时下载链接
    pub url: String,
}

/// 文本搜图服务
///
/// 每次调用相互独立，只读访问向量库，可以任意并发。
/// 模型客户端与连接池在进程启动时构造一次，在这里以依赖注入。
pub struct Searcher<'a, M, V, S> {
    model: &'a M,
    store: &'a V,
    source: &'a S,
    count: usize,
    url_ttl: Duration,
}

impl<'a, M, V, S> Searcher<'a, M, V, S>
where
    M: EmbeddingModel,
    V: VectorStore,
    S: ObjectSource,
{
    pub fn new(model: &'a M, store: &'a V, source: &'a S) -> Self {
        Self { model, store, source, count: DEFAULT_COUNT, url_ttl: DEFAULT_URL_TTL }
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn url_ttl(mut self, url_ttl: Duration) -> Self {
        self.url_ttl = url_ttl;
        self
    }

    /// 文本搜图，返回按距离升序排列的结果
    ///
    /// 空库返回 `Ok(vec![])`；后端失败返回 `Err`，两种情况对调用方
    /// 可区分。固定的库状态和查询文本下结果确定。
    pub async fn search(&self, text: &str) -> Result<Vec<Match>> {
        debug!("搜索 {} 个最近邻: {:?}", self.count, text);

        let mut embedding = self.model.encode_text(text).await?;
        embed::normalize(&mut embedding)?;

        let keys = self.store.nearest(&embedding, self.count).await?;

        let mut matches = Vec::with_capacity(keys.len());
        for key in keys {
            let url = self.source.presigned_url(&key, self.url_ttl).await?;
            matches.push(Match { key, url });
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::embed::EMBEDDING_DIM;
    use crate::picdb::PictureRow;
    use crate::storage::KeyPage;

    /// 文本固定编码为 e1 方向的单位向量
    struct UnitModel;

    impl EmbeddingModel for UnitModel {
        async fn encode_images(&self, _images: &[image::DynamicImage]) -> Result<Vec<Vec<f32>>> {
            unimplemented!()
        }

        async fn encode_text(&self, _text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0; EMBEDDING_DIM];
            v[0] = 2.0;
            Ok(v)
        }
    }

    /// 线性扫描的内存向量库，记录每次收到的 k
    #[derive(Default)]
    struct ScanStore {
        rows: Vec<PictureRow>,
        last_k: Mutex<Option<usize>>,
        fail: bool,
    }

    impl ScanStore {
        /// 构造若干与查询向量（e1 方向）相距给定距离的记录
        fn with_distances(items: &[(&str, f32)]) -> Self {
            let rows = items
                .iter()
                .map(|(key, distance)| {
                    let mut v = vec![0.0; EMBEDDING_DIM];
                    v[0] = 1.0;
                    v[1] = *distance;
                    PictureRow { key: key.to_string(), embedding: v }
                })
                .collect();
            Self { rows, ..Self::default() }
        }
    }

    impl VectorStore for ScanStore {
        async fn bulk_append(&self, _rows: &[PictureRow]) -> Result<u64> {
            unimplemented!()
        }

        async fn nearest(&self, embedding: &[f32], k: usize) -> Result<Vec<String>> {
            if self.fail {
                anyhow::bail!("模拟后端故障");
            }
            *self.last_k.lock().unwrap() = Some(k);
            let mut scored: Vec<(f32, String)> = self
                .rows
                .iter()
                .map(|row| {
                    let d2: f32 = row
                        .embedding
                        .iter()
                        .zip(embedding)
                        .map(|(a, b)| (a - b) * (a - b))
                        .sum();
                    (d2, row.key.clone())
                })
                .collect();
            scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
            Ok(scored.into_iter().take(k).map(|(_, key)| key).collect())
        }
    }

    /// 只提供预签名链接的对象源
    struct UrlSource;

    impl ObjectSource for UrlSource {
        async fn list_page(&self, _token: Option<String>) -> Result<KeyPage> {
            unimplemented!()
        }

        async fn get(&self, _key: &str) -> Result<Vec<u8>> {
            unimplemented!()
        }

        async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String> {
            Ok(format!("https://mock/{key}?expires={}", ttl.as_secs()))
        }
    }

    fn five_pictures() -> ScanStore {
        ScanStore::with_distances(&[
            ("e", 0.9),
            ("a", 0.1),
            ("c", 0.5),
            ("b", 0.3),
            ("d", 0.7),
        ])
    }

    #[tokio::test]
    async fn ranked_by_ascending_distance() {
        let model = UnitModel;
        let store = five_pictures();
        let source = UrlSource;

        let matches = Searcher::new(&model, &store, &source).search("man jumping").await.unwrap();

        let keys: Vec<&str> = matches.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        assert_eq!(*store.last_k.lock().unwrap(), Some(4));
    }

    #[tokio::test]
    async fn count_is_configurable() {
        let model = UnitModel;
        let store = five_pictures();
        let source = UrlSource;

        let matches =
            Searcher::new(&model, &store, &source).count(2).search("query").await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(*store.last_k.lock().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn repeated_queries_are_deterministic() {
        let model = UnitModel;
        let store = five_pictures();
        let source = UrlSource;
        let searcher = Searcher::new(&model, &store, &source);

        let first: Vec<String> =
            searcher.search("query").await.unwrap().into_iter().map(|m| m.key).collect();
        let second: Vec<String> =
            searcher.search("query").await.unwrap().into_iter().map(|m| m.key).collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_store_returns_empty_list() {
        let model = UnitModel;
        let store = ScanStore::default();
        let source = UrlSource;

        let matches = Searcher::new(&model, &store, &source).search("anything").await.unwrap();

        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn backend_failure_is_an_error_not_empty() {
        let model = UnitModel;
        let store = ScanStore { fail: true, ..ScanStore::default() };
        let source = UrlSource;

        let result = Searcher::new(&model, &store, &source).search("anything").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn matches_carry_presigned_urls() {
        let model = UnitModel;
        let store = five_pictures();
        let source = UrlSource;

        let matches = Searcher::new(&model, &store, &source)
            .count(1)
            .url_ttl(Duration::from_secs(60))
            .search("query")
            .await
            .unwrap();

        assert_eq!(matches[0].url, "https://mock/a?expires=60");
    }
}
