use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use log::info;

use crate::config::S3Options;

/// 对象列表的一页
#[derive(Debug, Default)]
pub struct KeyPage {
    pub keys: Vec<String>,
    /// 续页令牌，`None` 表示列表已取完
    pub next: Option<String>,
}

/// 图片所在的对象存储
pub trait ObjectSource: Send + Sync {
    /// 按续页令牌取一页对象键，调用方需要循环直到 `next` 为 `None`
    fn list_page(&self, token: Option<String>) -> impl Future<Output = Result<KeyPage>> + Send;

    /// 拉取对象字节
    fn get(&self, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// 生成限时下载链接，调用方无需存储凭证即可取图
    fn presigned_url(&self, key: &str, ttl: Duration) -> impl Future<Output = Result<String>> + Send;
}

/// S3 兼容的对象存储
pub struct S3Source {
    client: Client,
    bucket: String,
}

impl S3Source {
    /// 根据配置创建客户端
    ///
    /// 未显式提供 access key 时走 AWS SDK 默认凭证链
    pub async fn connect(opts: &S3Options) -> Result<Self> {
        info!("连接对象存储: {}", opts.s3_bucket);

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(opts.s3_region.clone()));
        if let Some(endpoint) = &opts.s3_endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(key), Some(secret)) = (&opts.s3_access_key, &opts.s3_secret_key) {
            loader =
                loader.credentials_provider(Credentials::new(key, secret, None, None, "picsearch"));
        }
        let config = loader.load().await;

        // MinIO 等自建服务通常只支持 path style
        let config = aws_sdk_s3::config::Builder::from(&config).force_path_style(true).build();

        Ok(Self { client: Client::from_conf(config), bucket: opts.s3_bucket.clone() })
    }
}

impl ObjectSource for S3Source {
    async fn list_page(&self, token: Option<String>) -> Result<KeyPage> {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(token)
            .send()
            .await
            .context("列举对象失败")?;

        let keys = resp
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect();
        let next = resp.next_continuation_token().map(str::to_owned);

        Ok(KeyPage { keys, next })
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("拉取对象失败: {key}"))?;
        let data = resp.body.collect().await?;
        Ok(data.into_bytes().to_vec())
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> Result<String> {
        let config = PresigningConfig::expires_in(ttl)?;
        let req = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .with_context(|| format!("生成预签名链接失败: {key}"))?;
        Ok(req.uri().to_string())
    }
}
