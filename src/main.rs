use std::path::PathBuf;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catwiki_scanner::config;
use catwiki_scanner::scanner::{ElementData, Notifier, PageContent};
use catwiki_scanner::search::PageSearchResults;
use catwiki_scanner::state::AppState;

/// Config file override / 配置文件路径环境变量
const CONFIG_ENV: &str = "CATWIKI_SCANNER_CONFIG";

/// catwiki-scanner - match visited pages against the CAT Wiki pages database
#[derive(Parser, Debug)]
#[command(
    name = "catwiki-scanner",
    version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"),
    about = "Match visited pages against the CAT Wiki pages database"
)]
struct Cli {
    /// Config file, overrides CATWIKI_SCANNER_CONFIG / 配置文件路径
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Scan a page; the text file stands in for the page text / 扫描页面
    Scan {
        url: String,
        text_file: Option<PathBuf>,
    },
    /// Run one pages database refresh / 执行一次刷新
    Refresh {
        /// Fetch even if the cache is fresh
        #[arg(long)]
        force: bool,
    },
    /// Search the pages database / 搜索页面数据库
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Keep the pages database refreshed until Ctrl-C / 持续刷新直到 Ctrl-C
    Watch,
}

/// Page content read from a local text file / 从本地文本文件读取的页面内容
struct FileContent {
    text: String,
}

#[async_trait]
impl PageContent for FileContent {
    async fn query_selector_all(&self, selector: &str) -> anyhow::Result<Vec<ElementData>> {
        // Plain text has no markup: every non-empty line stands in for one matching element
        let class_name = selector.trim_start_matches('.').to_string();
        Ok(self
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| ElementData {
                tag_name: "div".to_string(),
                id: String::new(),
                class_name: class_name.clone(),
                inner_text: line.to_string(),
            })
            .collect())
    }

    async fn inner_text(&self) -> anyhow::Result<String> {
        Ok(self.text.clone())
    }
}

/// Prints every match as one JSON line / 每个结果输出一行 JSON
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, results: PageSearchResults) {
        for page in results.page_entries() {
            let line = serde_json::json!({
                "page_id": page.page_id(),
                "kind": page.kind().as_str(),
                "page_name": page.page_name(),
                "url": page.url(),
            });
            println!("{}", line);
        }
    }
}

fn config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(config::default_config_path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catwiki_scanner=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration / 加载配置
    let app_config = config::load_config(&config_path(cli.config)).map_err(anyhow::Error::msg)?;
    let state = AppState::new(app_config)?;

    match cli.command {
        Command::Scan { url, text_file } => {
            let text = match text_file {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => String::new(),
            };

            let outcome = state.storage_cache.update_pages_db(false).await;
            tracing::info!("Pages database refresh: {}", outcome);

            let found = state.scan_page(&url, &FileContent { text }, &StdoutNotifier).await;
            if !found {
                tracing::info!("No matching pages for {}", url);
            }
        }
        Command::Refresh { force } => {
            let outcome = state.storage_cache.update_pages_db(force).await;
            println!("{}", outcome);
        }
        Command::Search { query } => {
            let query = query.join(" ");
            if query.trim().is_empty() {
                anyhow::bail!("empty search query");
            }
            let results = state.search(&query);
            if results.is_empty() {
                tracing::info!("No matching pages for '{}'", query);
            } else {
                StdoutNotifier.notify(results);
            }
        }
        Command::Watch => {
            let handle = state.start_refresh_timer();
            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down");
            handle.abort();
        }
    }

    Ok(())
}
