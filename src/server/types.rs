use serde::Deserialize;
use utoipa::ToSchema;

/// 搜索请求参数
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// 查询文本
    pub text: String,
    /// 返回的结果数量，不填则使用服务端默认值
    pub count: Option<usize>,
}

/// 搜索响应（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SearchResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u64,
    /// 匹配结果，按相似度从高到低排列
    pub result: Vec<MatchItem>,
}

/// 单条匹配结果（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct MatchItem {
    /// 对象键
    pub key: String,
    /// 限时下载链接，默认一小时内有效
    pub url: String,
}
