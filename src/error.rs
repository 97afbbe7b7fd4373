//! Error types / 错误类型

use thiserror::Error;

/// Search index errors / 搜索索引错误
#[derive(Debug, Error)]
pub enum SearchError {
    /// Parameter combination the strategy does not implement (expected, non-fatal)
    /// 不支持的参数组合（预期内，非致命）
    #[error("Unimplemented: {0}")]
    Unsupported(&'static str),
    /// Match pattern could not be built / 匹配模式构建失败
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl SearchError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, SearchError::Unsupported(_))
    }
}

/// Durable cache storage errors / 缓存存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Remote catalog fetch errors / 远程目录下载错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error! Status: {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}
