use std::io::Cursor;
use std::time::Duration;

use anyhow::{Result, ensure};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, ImageFormat};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::ClipOptions;

/// 嵌入向量的固定维度，由 CLIP ViT-B/32 决定
pub const EMBEDDING_DIM: usize = 512;

/// 多模态编码模型
///
/// 图片与文本被映射到同一语义空间，因此两侧必须使用同一个模型
/// （不只是同一架构），否则向量不可比较。
pub trait EmbeddingModel: Send + Sync {
    /// 批量编码图片，返回向量的顺序与输入一致
    fn encode_images(
        &self,
        images: &[DynamicImage],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;

    /// 编码一段查询文本
    fn encode_text(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;
}

/// 向量的欧几里得范数
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// 原地归一化到单位超球面上
///
/// 单位向量之间的欧氏距离与余弦相似度单调等价，入库和查询两侧
/// 都必须先归一化，排序才有意义。
pub fn normalize(vector: &mut [f32]) -> Result<()> {
    let norm = l2_norm(vector);
    ensure!(norm > f32::EPSILON, "零向量无法归一化");
    for x in vector.iter_mut() {
        *x /= norm;
    }
    Ok(())
}

/// CLIP 推理服务客户端
///
/// 通过 HTTP 调用外部推理服务完成编码，模型名称随每个请求下发，
/// 保证入库与查询两侧命中同一个模型。
#[derive(Clone)]
pub struct ClipClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct EncodeImagesRequest<'a> {
    model: &'a str,
    /// base64 编码的 PNG 字节
    images: Vec<String>,
}

#[derive(Deserialize)]
struct EncodeImagesResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct EncodeTextRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct EncodeTextResponse {
    embedding: Vec<f32>,
}

impl ClipClient {
    pub fn new(opts: &ClipOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(opts.clip_timeout))
            .build()?;
        Ok(Self {
            client,
            endpoint: opts.clip_endpoint.trim_end_matches('/').to_string(),
            model: opts.clip_model.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

impl EmbeddingModel for ClipClient {
    async fn encode_images(&self, images: &[DynamicImage]) -> Result<Vec<Vec<f32>>> {
        if images.is_empty() {
            return Ok(vec![]);
        }

        let mut encoded = Vec::with_capacity(images.len());
        for image in images {
            let mut buf = Cursor::new(Vec::new());
            image.write_to(&mut buf, ImageFormat::Png)?;
            encoded.push(BASE64.encode(buf.into_inner()));
        }

        debug!("编码 {} 张图片", images.len());
        let resp: EncodeImagesResponse = self
            .client
            .post(self.url("/encode/images"))
            .json(&EncodeImagesRequest { model: &self.model, images: encoded })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        ensure!(
            resp.embeddings.len() == images.len(),
            "模型返回的向量数量不匹配: {} != {}",
            resp.embeddings.len(),
            images.len()
        );
        for embedding in &resp.embeddings {
            ensure!(
                embedding.len() == EMBEDDING_DIM,
                "模型返回的向量维度不匹配: {} != {}",
                embedding.len(),
                EMBEDDING_DIM
            );
        }

        Ok(resp.embeddings)
    }

    async fn encode_text(&self, text: &str) -> Result<Vec<f32>> {
        debug!("编码文本: {:?}", text);
        let resp: EncodeTextResponse = self
            .client
            .post(self.url("/encode/text"))
            .json(&EncodeTextRequest { model: &self.model, text })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        ensure!(
            resp.embedding.len() == EMBEDDING_DIM,
            "模型返回的向量维度不匹配: {} != {}",
            resp.embedding.len(),
            EMBEDDING_DIM
        );

        Ok(resp.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_to_unit_norm() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v).unwrap();
        assert_eq!(v, vec![0.6, 0.8]);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_large_vector() {
        let mut v = vec![0.017f32; EMBEDDING_DIM];
        normalize(&mut v).unwrap();
        assert!((l2_norm(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_rejects_zero_vector() {
        let mut v = vec![0.0f32; 4];
        assert!(normalize(&mut v).is_err());
    }
}
