use anyhow::Result;
use futures::StreamExt;
use futures::stream;
use image::DynamicImage;
use indicatif::ProgressBar;
use log::{error, info, warn};

use crate::embed::{self, EmbeddingModel};
use crate::picdb::{PictureRow, VectorStore};
use crate::storage::ObjectSource;

/// 每个批次的默认对象数量，同时也是累积多少行后触发一次批量写入的阈值
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// 批内默认并发拉取数量
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// 一趟入库的执行报告
///
/// 单个对象或单个批次的失败不会中断整趟入库，只会累计在这里，
/// 由调用方决定是否重跑。重跑按键幂等。
#[derive(Debug, Default)]
pub struct IngestReport {
    /// 列举到的对象总数
    pub listed: usize,
    /// 成功的批量写入次数
    pub flushes: usize,
    /// 失败的批量写入次数，对应的行在本趟内丢失
    pub failed_flushes: usize,
    /// 实际写入的记录数
    pub appended: u64,
    /// 因键已存在而跳过的记录数
    pub skipped: u64,
    /// 拉取失败的对象数
    pub fetch_failures: usize,
    /// 解码失败的对象数
    pub decode_failures: usize,
    /// 编码失败的批次数
    pub encode_failures: usize,
}

/// 入库管道：对象存储 → 编码模型 → 向量库
///
/// 单趟顺序处理，内存占用与 `batch_size` 成正比，与语料库大小无关。
/// 批内拉取并发执行，编码始终一次只有一个批次在跑。
pub struct Ingestor<'a, S, M, V> {
    source: &'a S,
    model: &'a M,
    store: &'a V,
    batch_size: usize,
    fetch_concurrency: usize,
    progress: Option<ProgressBar>,
}

impl<'a, S, M, V> Ingestor<'a, S, M, V>
where
    S: ObjectSource,
    M: EmbeddingModel,
    V: VectorStore,
{
    pub fn new(source: &'a S, model: &'a M, store: &'a V) -> Self {
        Self {
            source,
            model,
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
            progress: None,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        assert!(batch_size > 0);
        self.batch_size = batch_size;
        self
    }

    pub fn fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        assert!(fetch_concurrency > 0);
        self.fetch_concurrency = fetch_concurrency;
        self
    }

    pub fn progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    /// 执行一趟完整入库
    ///
    /// 循环续页令牌直到对象列表取完，键流式进入批次划分，
    /// 不会整体物化。只有列举本身失败才会让整趟入库出错返回。
    pub async fn run(&self) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut backlog: Vec<String> = Vec::new();
        let mut pending: Vec<PictureRow> = Vec::new();
        let mut batch_no = 0usize;
        let mut token = None;

        loop {
            let page = self.source.list_page(token).await?;
            report.listed += page.keys.len();
            backlog.extend(page.keys);
            token = page.next;

            while backlog.len() >= self.batch_size {
                let batch: Vec<String> = backlog.drain(..self.batch_size).collect();
                batch_no += 1;
                self.process_batch(batch_no, batch, &mut pending, &mut report).await;
                if pending.len() >= self.batch_size {
                    self.flush(&mut pending, &mut report).await;
                }
            }

            if token.is_none() {
                break;
            }
        }

        if !backlog.is_empty() {
            batch_no += 1;
            let batch = std::mem::take(&mut backlog);
            self.process_batch(batch_no, batch, &mut pending, &mut report).await;
        }
        if !pending.is_empty() {
            self.flush(&mut pending, &mut report).await;
        }

        info!(
            "入库完成: 列举 {} 个对象，写入 {} 条，跳过 {} 条重复，{} 次写入失败",
            report.listed, report.appended, report.skipped, report.failed_flushes
        );
        Ok(report)
    }

    /// 处理一个批次：并发拉取、解码、批量编码、配对成行
    ///
    /// 拉取和解码失败只丢弃单个对象；编码是整批一次调用，
    /// 失败时丢弃整个批次并继续。
    async fn process_batch(
        &self,
        batch_no: usize,
        keys: Vec<String>,
        pending: &mut Vec<PictureRow>,
        report: &mut IngestReport,
    ) {
        let total = keys.len() as u64;
        info!("批次 {}: {} 个对象", batch_no, total);
        if let Some(pb) = &self.progress {
            pb.set_message(format!("批次 {batch_no}"));
        }

        let source = self.source;
        // buffered 保证输出顺序与输入一致，键与向量才能按位置配对
        let fetched: Vec<(String, Result<Vec<u8>>)> = stream::iter(keys)
            .map(|key| async move {
                let data = source.get(&key).await;
                (key, data)
            })
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let mut batch_keys = Vec::with_capacity(fetched.len());
        let mut images: Vec<DynamicImage> = Vec::with_capacity(fetched.len());
        for (key, data) in fetched {
            let data = match data {
                Ok(data) => data,
                Err(e) => {
                    warn!("拉取失败，跳过 {key}: {e:#}");
                    report.fetch_failures += 1;
                    continue;
                }
            };
            match image::load_from_memory(&data) {
                Ok(image) => {
                    batch_keys.push(key);
                    images.push(image);
                }
                Err(e) => {
                    warn!("解码失败，跳过 {key}: {e}");
                    report.decode_failures += 1;
                }
            }
        }

        if !batch_keys.is_empty() {
            match self.model.encode_images(&images).await {
                Ok(embeddings) => {
                    for (key, mut embedding) in batch_keys.into_iter().zip(embeddings) {
                        match embed::normalize(&mut embedding) {
                            Ok(()) => pending.push(PictureRow { key, embedding }),
                            Err(e) => warn!("归一化失败，跳过 {key}: {e}"),
                        }
                    }
                }
                Err(e) => {
                    error!("批次 {batch_no} 编码失败，丢弃整批: {e:#}");
                    report.encode_failures += 1;
                }
            }
        }

        if let Some(pb) = &self.progress {
            pb.inc(total);
        }
    }

    /// 把累积的行一次性写入向量库
    ///
    /// 写入失败记入报告后继续，本批行不会重排队，重跑入库即可补齐。
    async fn flush(&self, pending: &mut Vec<PictureRow>, report: &mut IngestReport) {
        let rows = pending.len() as u64;
        match self.store.bulk_append(pending).await {
            Ok(added) => {
                report.flushes += 1;
                report.appended += added;
                report.skipped += rows - added;
                info!("写入 {} 条记录，跳过 {} 条重复", added, rows - added);
            }
            Err(e) => {
                report.failed_flushes += 1;
                error!("批量写入失败，本批 {rows} 条记录丢失: {e:#}");
            }
        }
        pending.clear();
    }
}
