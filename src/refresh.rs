//! Pages database refresh controller / 页面数据库刷新控制器
//!
//! Keeps the pages database current: a recurring timer checks staleness, loads
//! the cached export or fetches a new one, validates it and swaps it in.
//! 定时检查缓存是否过期，读取缓存或下载新数据，校验通过后整体替换。
//!
//! Cycle / 流程：
//! `Idle → CheckStaleness → {UseCache | Fetch} → Validate → {Commit | Discard} → Idle`

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Preferences;
use crate::error::{FetchError, StorageError};
use crate::models::CargoExport;
use crate::search::PagesDb;
use crate::storage::CacheStorage;

/// Remote cargo export / 远程导出数据地址
pub const PAGES_DB_JSON_URL: &str =
    "https://raw.githubusercontent.com/WKDLabs/CATWikiCargoPrototype/refs/heads/export/data/all_cargo_combined.json";
/// Timer period in minutes / 定时检查周期（分钟）
pub const UPDATE_INTERVAL_MINUTES: u64 = 30;
/// Storage key of the cached export / 缓存数据键
pub const CACHE_KEY: &str = "cachedPagesDB";
/// Storage key of the last successful write (epoch millis) / 缓存时间戳键
pub const CACHE_TIMESTAMP_KEY: &str = "cachedPagesDBTimestamp";
/// One day in milliseconds / 一天的毫秒数
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Source of the remote cargo export / 远程导出数据来源
#[async_trait]
pub trait CargoFetcher: Send + Sync {
    async fn fetch_json(&self) -> Result<Value, FetchError>;
}

/// HTTP fetcher / HTTP 下载器
pub struct HttpCargoFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpCargoFetcher {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CargoFetcher for HttpCargoFetcher {
    async fn fetch_json(&self) -> Result<Value, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        Ok(response.json::<Value>().await?)
    }
}

/// Result of one refresh cycle / 单次刷新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Cache was fresh and valid / 缓存有效，已加载
    LoadedFromCache,
    /// Fetched, validated, committed / 下载并更新成功
    Updated,
    /// Fetched payload failed validation / 下载数据校验失败
    Rejected,
    /// Transport or status error / 下载失败
    FetchFailed,
    /// Another cycle was in progress / 已有刷新在进行
    AlreadyRunning,
}

impl RefreshOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::LoadedFromCache => "loaded_from_cache",
            RefreshOutcome::Updated => "updated",
            RefreshOutcome::Rejected => "rejected",
            RefreshOutcome::FetchFailed => "fetch_failed",
            RefreshOutcome::AlreadyRunning => "already_running",
        }
    }
}

impl fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RAII guard for the single-flight flag / 单飞标志的 RAII 守卫
struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RefreshGuard<'a> {
    fn try_new(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl<'a> Drop for RefreshGuard<'a> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Cache refresh controller / 缓存刷新控制器
pub struct StorageCache {
    pages_db: Arc<PagesDb>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn CargoFetcher>,
    preferences: RwLock<Preferences>,
    updating: AtomicBool,
}

impl StorageCache {
    pub fn new(
        pages_db: Arc<PagesDb>,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn CargoFetcher>,
        preferences: Preferences,
    ) -> Self {
        Self {
            pages_db,
            storage,
            fetcher,
            preferences: RwLock::new(preferences),
            updating: AtomicBool::new(false),
        }
    }

    pub fn pages_db(&self) -> &Arc<PagesDb> {
        &self.pages_db
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences.read().clone()
    }

    pub fn set_preferences(&self, preferences: Preferences) {
        *self.preferences.write() = preferences;
    }

    /// Whether a refresh cycle is in progress / 是否正在刷新
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::Acquire)
    }

    /// Timestamp of the last successful write / 上次成功写入的时间戳
    pub async fn last_updated(&self) -> Option<i64> {
        match self.read_timestamp().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read cache timestamp from {} storage: {}", self.storage.name(), e);
                None
            }
        }
    }

    async fn read_timestamp(&self) -> Result<Option<i64>, StorageError> {
        Ok(self
            .storage
            .get(CACHE_TIMESTAMP_KEY)
            .await?
            .and_then(|v| v.as_i64()))
    }

    /// Staleness check at `now` (epoch millis) / 在给定时间点检查缓存是否过期
    ///
    /// Never stale while auto update is disabled.
    pub async fn is_cache_stale_at(&self, now: i64) -> bool {
        let preferences = self.preferences();
        if !preferences.auto_update_pages_db {
            return false;
        }

        match self.last_updated().await {
            Some(last) => now.saturating_sub(last) >= preferences.interval_ms(),
            None => true,
        }
    }

    /// Run one refresh cycle / 执行一次刷新
    pub async fn update_pages_db(&self, force: bool) -> RefreshOutcome {
        self.update_pages_db_at(force, chrono::Utc::now().timestamp_millis()).await
    }

    /// Run one refresh cycle at `now` (epoch millis) / 在给定时间点执行一次刷新
    pub async fn update_pages_db_at(&self, force: bool, now: i64) -> RefreshOutcome {
        let Some(_guard) = RefreshGuard::try_new(&self.updating) else {
            tracing::info!("Pages database update already in progress, skipping");
            return RefreshOutcome::AlreadyRunning;
        };

        let needs_update = force || self.is_cache_stale_at(now).await;
        if !needs_update {
            tracing::info!("Skipping update: cache TTL not reached");
            if let Some(cargo) = self.load_cached_pages_db().await {
                self.pages_db.set_pages(&cargo);
                tracing::info!("Pages database loaded from cache ({} rows)", cargo.total_rows());
                return RefreshOutcome::LoadedFromCache;
            }
        }

        tracing::info!("Fetching updated pages database...");
        let payload = match self.fetcher.fetch_json().await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to fetch pages database: {}", e);
                return RefreshOutcome::FetchFailed;
            }
        };

        let cargo = match CargoExport::validate(&payload) {
            Ok(cargo) => cargo,
            Err(e) => {
                tracing::warn!("Pages database NOT updated, payload rejected: {}", e);
                return RefreshOutcome::Rejected;
            }
        };

        if let Err(e) = self.save_cache(payload, now).await {
            tracing::error!("Failed to persist pages database: {}", e);
        }
        self.pages_db.set_pages(&cargo);
        tracing::info!("Pages database updated successfully ({} rows)", cargo.total_rows());
        RefreshOutcome::Updated
    }

    /// Cached export, only if it passes validation / 读取缓存（仅返回通过校验的数据）
    pub async fn load_cached_pages_db(&self) -> Option<CargoExport> {
        match self.storage.get(CACHE_KEY).await {
            Ok(Some(value)) => match CargoExport::validate(&value) {
                Ok(cargo) => Some(cargo),
                Err(e) => {
                    tracing::warn!("Cached pages database is invalid: {}", e);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!("No cached pages database");
                None
            }
            Err(e) => {
                tracing::error!("Failed to read cached pages database: {}", e);
                None
            }
        }
    }

    /// Persist a validated export; returns the stored timestamp
    /// 保存已校验的数据，返回写入的时间戳
    ///
    /// The timestamp strictly increases across writes.
    pub async fn save_cache(&self, blob: Value, now: i64) -> Result<i64, StorageError> {
        let timestamp = match self.read_timestamp().await {
            Ok(Some(last)) if last >= now => last.saturating_add(1),
            Ok(_) => now,
            Err(e) => {
                tracing::warn!(
                    "Cache timestamp unreadable in {} storage, writing clock time {} unchecked: {}",
                    self.storage.name(),
                    now,
                    e
                );
                now
            }
        };
        self.storage.set(CACHE_KEY, blob).await?;
        if let Err(e) = self.storage.set(CACHE_TIMESTAMP_KEY, json!(timestamp)).await {
            tracing::warn!(
                "Cached pages database written but its timestamp was not, {} storage keeps the previous one",
                self.storage.name()
            );
            return Err(e);
        }
        Ok(timestamp)
    }

    /// Spawn the recurring refresh; the first cycle runs immediately
    /// 启动定时刷新任务，首次立即执行
    pub fn spawn_update_timer(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let outcome = self.update_pages_db(false).await;
                tracing::debug!("Scheduled pages database refresh: {}", outcome);
            }
        })
    }
}
