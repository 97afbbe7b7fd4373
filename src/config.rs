//! Application configuration module / 应用配置模块
//!
//! Manages application configuration loaded from config.json
//! Creates default config file on first run / 首次运行时创建默认配置文件

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::refresh::{DAY_MS, PAGES_DB_JSON_URL, UPDATE_INTERVAL_MINUTES};
use crate::search::{DEFAULT_INNER_TEXT_MIN_LENGTH, DEFAULT_INNER_TEXT_THRESHOLD};

/// Default config file name / 默认配置文件名
pub const CONFIG_FILE: &str = "config.json";

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// User preferences / 用户偏好
    #[serde(default)]
    pub preferences: Preferences,
    /// Cache configuration / 缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
    /// Remote catalog configuration / 远程目录配置
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Scan configuration / 扫描配置
    #[serde(default)]
    pub scan: ScanConfig,
}

/// User preferences / 用户偏好
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Refresh the pages database automatically / 自动更新页面数据库
    pub auto_update_pages_db: bool,
    /// Days between automatic refreshes / 自动更新间隔（天）
    pub auto_update_interval_days: u32,
}

/// Cache configuration / 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Data directory path / 数据目录路径
    pub data_dir: String,
}

/// Remote catalog configuration / 远程目录配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Cargo export URL / 导出数据地址
    pub pages_db_url: String,
    /// Request timeout in seconds / 请求超时（秒）
    pub timeout_secs: u64,
    /// Refresh timer period in minutes / 定时检查周期（分钟）
    pub refresh_interval_minutes: u64,
}

/// Scan configuration / 扫描配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub inner_text_threshold: f64,
    pub inner_text_min_length: usize,
    /// Match page text when no scanner applies / 无适用扫描器时匹配正文
    pub inner_text_fallback: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            auto_update_pages_db: true,
            auto_update_interval_days: 1,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            pages_db_url: PAGES_DB_JSON_URL.to_string(),
            timeout_secs: 30,
            refresh_interval_minutes: UPDATE_INTERVAL_MINUTES,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            inner_text_threshold: DEFAULT_INNER_TEXT_THRESHOLD,
            inner_text_min_length: DEFAULT_INNER_TEXT_MIN_LENGTH,
            inner_text_fallback: false,
        }
    }
}

impl Preferences {
    /// Auto update interval in milliseconds / 自动更新间隔（毫秒）
    pub fn interval_ms(&self) -> i64 {
        i64::from(self.auto_update_interval_days) * DAY_MS
    }
}

impl AppConfig {
    /// Get the full data directory path / 获取完整的数据目录路径
    pub fn get_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.cache.data_dir)
    }

    /// Remote request timeout / 远程请求超时
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.remote.timeout_secs.max(1))
    }

    /// Refresh timer period / 定时检查周期
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.remote.refresh_interval_minutes.max(1) * 60)
    }
}

/// Get the default config file path / 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(CONFIG_FILE)
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(config_path: &Path) -> Result<AppConfig, String> {
    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        tracing::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config_path: &Path, config: &AppConfig) -> Result<(), String> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }
    }

    std::fs::write(config_path, content)
        .map_err(|e| format!("Failed to write config file: {}", e))?;

    Ok(())
}
