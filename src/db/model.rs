/// 持久化的图片记录
///
/// `key` 对应对象存储中的唯一键，`embedding` 为写入时已归一化的
/// 512 维向量。记录只由入库管道创建，创建后不再修改。
#[derive(Debug, Clone, PartialEq)]
pub struct PictureRow {
    pub key: String,
    pub embedding: Vec<f32>,
}

/// 语料库统计信息
#[derive(Debug)]
pub struct CorpusStats {
    /// 图片总数
    pub pictures: i64,
    /// 向量范数均值，正常情况下应非常接近 1
    pub avg_norm: Option<f64>,
    /// pictures 表占用的磁盘空间
    pub disk_usage: String,
}
