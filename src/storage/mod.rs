//! Durable key-value storage for cached records / 缓存记录的持久化存储
//!
//! Every call is a scoped operation that reports success or failure on its own.
//! 每次读写都是独立操作，单独返回成功或错误。

pub mod file;
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage backend trait / 存储后端 trait
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Backend name used in logs / 后端名称
    fn name(&self) -> &'static str;

    /// Read one record, `None` when absent / 读取记录，不存在时为 None
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// Write one record, replacing any previous value / 写入记录
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Remove one record, absent keys are not an error / 删除记录
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
