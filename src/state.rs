//! Application state / 应用状态
//!
//! Constructed once at startup and passed by reference; owns the pages
//! database, the refresh controller and the scanner registry.

use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::refresh::{CargoFetcher, HttpCargoFetcher, StorageCache};
use crate::scanner::{self, InnerTextFallback, Notifier, PageContent, ScanParameters, ScannerRegistry};
use crate::search::{PageSearchResults, PagesDb};
use crate::storage::{CacheStorage, FileStorage};

pub struct AppState {
    pub config: AppConfig,
    pub pages_db: Arc<PagesDb>,
    pub storage_cache: Arc<StorageCache>,
    pub scanners: ScannerRegistry,
}

impl AppState {
    /// Build with the file storage and the HTTP fetcher / 使用文件存储与 HTTP 下载器构建
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let storage: Arc<dyn CacheStorage> = Arc::new(FileStorage::new(config.get_data_dir()));
        let fetcher: Arc<dyn CargoFetcher> = Arc::new(
            HttpCargoFetcher::new(&config.remote.pages_db_url, config.fetch_timeout())
                .context("Failed to create HTTP client")?,
        );
        Ok(Self::with_backends(config, storage, fetcher))
    }

    /// Build with explicit backends / 使用指定后端构建
    pub fn with_backends(
        config: AppConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn CargoFetcher>,
    ) -> Self {
        // Baked in catalog first, the index is never empty
        let pages_db = Arc::new(PagesDb::with_default_pages());
        let storage_cache = Arc::new(StorageCache::new(
            pages_db.clone(),
            storage,
            fetcher,
            config.preferences.clone(),
        ));

        let fallback = config.scan.inner_text_fallback.then(|| InnerTextFallback {
            threshold: config.scan.inner_text_threshold,
            min_length: config.scan.inner_text_min_length,
        });
        let scanners = ScannerRegistry::with_default_scanners().with_inner_text_fallback(fallback);

        tracing::info!("Pages database initialized with {} pages", pages_db.page_count());

        Self {
            config,
            pages_db,
            storage_cache,
            scanners,
        }
    }

    /// Start the recurring refresh, first cycle runs now / 启动定时刷新
    pub fn start_refresh_timer(&self) -> JoinHandle<()> {
        let period = self.config.refresh_period();
        tracing::info!("Pages database refresh every {} minutes", period.as_secs() / 60);
        self.storage_cache.clone().spawn_update_timer(period)
    }

    /// Scan a visited page / 扫描访问的页面
    pub async fn scan_page(&self, url: &str, dom: &dyn PageContent, notifier: &dyn Notifier) -> bool {
        let params = ScanParameters::new(url, &self.pages_db, dom, notifier);
        self.scanners.scan_page(&params).await
    }

    /// Entity strategies for one query, deduplicated / 直接执行实体搜索（已去重）
    pub fn search(&self, query: &str) -> PageSearchResults {
        let mut combined = PageSearchResults::default();
        scanner::search_entity("search", query, &self.pages_db, &mut combined);
        combined.unique_by_page_id()
    }
}
