//! Scanner pipeline - site scanners driving the pages database / 扫描管线
//!
//! A scanner decides whether it understands a visited page and derives search
//! keys from it. The cascade that turns keys into results is shared by every
//! scanner and lives in [`scan`].
//! 扫描器只负责判断适用性与提取搜索词，级联搜索流程统一在 [`scan`] 中实现。

pub mod domain;
pub mod generic_search_engine;
pub mod google;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::search::{PageSearchResults, PagesDb};

pub use generic_search_engine::GenericSearchEngineScanner;
pub use google::GoogleScanner;

/// Element data returned by a selector query / 选择器查询返回的元素数据
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementData {
    pub tag_name: String,
    pub id: String,
    pub class_name: String,
    pub inner_text: String,
}

/// Access to the visited page content / 页面内容访问
#[async_trait]
pub trait PageContent: Send + Sync {
    /// Elements matching a CSS selector / 匹配选择器的元素
    async fn query_selector_all(&self, selector: &str) -> anyhow::Result<Vec<ElementData>>;

    /// Rendered text of the whole page / 页面正文
    async fn inner_text(&self) -> anyhow::Result<String>;
}

/// Receives the final, deduplicated results of a scan / 接收扫描结果
pub trait Notifier: Send + Sync {
    fn notify(&self, results: PageSearchResults);
}

/// Everything a scanner needs for one visited page / 单次扫描参数
pub struct ScanParameters<'a> {
    pub url: String,
    /// Registrable domain without suffix / 主域名（不含后缀）
    pub main_domain: String,
    pub pages_db: &'a PagesDb,
    pub dom: &'a dyn PageContent,
    pub notifier: &'a dyn Notifier,
}

impl<'a> ScanParameters<'a> {
    /// Main domain is derived from the URL / 主域名由 URL 推导
    pub fn new(
        url: &str,
        pages_db: &'a PagesDb,
        dom: &'a dyn PageContent,
        notifier: &'a dyn Notifier,
    ) -> Self {
        Self {
            url: url.to_string(),
            main_domain: domain::main_domain_from_url(url).unwrap_or_default(),
            pages_db,
            dom,
            notifier,
        }
    }

    pub fn with_main_domain(mut self, main_domain: &str) -> Self {
        self.main_domain = main_domain.to_string();
        self
    }
}

/// Site scanner capabilities / 站点扫描器能力
#[async_trait]
pub trait ContentScanner: Send + Sync {
    /// Short label used in logs / 日志标签
    fn meta_info(&self) -> &'static str;

    fn can_scan_content(&self, params: &ScanParameters<'_>) -> bool;

    /// Coarse search term derived from the site / 站点粗略搜索词
    fn domain_key_for_search(&self, params: &ScanParameters<'_>) -> String;

    /// Entity carried by the URL itself / URL 中携带的实体
    fn extract_entity(&self, _url: &str) -> Option<String> {
        None
    }

    /// Entities read from the page content / 从页面内容提取的实体
    async fn search_content(&self, _params: &ScanParameters<'_>) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Search strategies run by the cascade / 级联中的搜索策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    DomainKey,
    Category,
    ConsecutiveWords,
    Simple,
    Fuzzy,
}

impl Strategy {
    /// Entity strategies in cascade order / 实体搜索顺序
    const ENTITY_ORDER: [Strategy; 4] = [
        Strategy::Category,
        Strategy::ConsecutiveWords,
        Strategy::Simple,
        Strategy::Fuzzy,
    ];

    fn label(&self) -> &'static str {
        match self {
            Strategy::DomainKey => "Domain Key Fuzzy Search",
            Strategy::Category => "Category Match",
            Strategy::ConsecutiveWords => "Consecutive Words Match",
            Strategy::Simple => "Simple Substring Match",
            Strategy::Fuzzy => "Fuzzy Word Match",
        }
    }

    fn run(&self, pages_db: &PagesDb, key: &str) -> Result<PageSearchResults, SearchError> {
        match self {
            Strategy::DomainKey => pages_db.get_pages_for_domain(key),
            Strategy::Category => Ok(pages_db.get_pages_for_category(key)),
            Strategy::ConsecutiveWords => pages_db.find_consecutive_words(key, 1, true),
            Strategy::Simple => Ok(pages_db.simple_search(key)),
            Strategy::Fuzzy => pages_db.fuzzy_search(key, false),
        }
    }
}

/// Run one search, append its results, report whether it matched
/// 执行单次搜索并合并结果；失败只记录日志，不中断级联
fn perform_search<F>(
    scanner_id: &str,
    label: &str,
    key: &str,
    combined: &mut PageSearchResults,
    search: F,
) -> bool
where
    F: FnOnce() -> Result<PageSearchResults, SearchError>,
{
    match search() {
        Ok(results) if !results.is_empty() => {
            tracing::debug!(
                "{}: Found {} pages via {} ('{}')",
                scanner_id,
                results.total_pages_found(),
                label,
                key
            );
            combined.add_page_entries(results.into_page_entries());
            true
        }
        Ok(_) => {
            tracing::debug!("{}: No pages found via {} ('{}')", scanner_id, label, key);
            false
        }
        Err(e) if e.is_unsupported() => {
            tracing::warn!("{}: Skipped unimplemented search feature: {} ({})", scanner_id, label, e);
            false
        }
        Err(e) => {
            tracing::error!("{}: Error during search {} ('{}'): {}", scanner_id, label, key, e);
            false
        }
    }
}

fn run_strategy(
    scanner_id: &str,
    strategy: Strategy,
    key: &str,
    pages_db: &PagesDb,
    combined: &mut PageSearchResults,
) -> bool {
    perform_search(scanner_id, strategy.label(), key, combined, || strategy.run(pages_db, key))
}

/// Run the entity strategies for one key, in cascade order
/// 对单个搜索词按顺序执行实体搜索策略
///
/// Results are appended undeduplicated; returns true if any strategy matched.
pub fn search_entity(
    scanner_id: &str,
    key: &str,
    pages_db: &PagesDb,
    combined: &mut PageSearchResults,
) -> bool {
    let mut found_any = false;
    for strategy in Strategy::ENTITY_ORDER {
        found_any |= run_strategy(scanner_id, strategy, key, pages_db, combined);
    }
    found_any
}

/// Shared search cascade / 共享的级联搜索
///
/// 1. domain key fuzzy search / 域名粗略搜索
/// 2. URL entity followed by content entities / URL 实体 + 页面内容实体
/// 3. per entity: category → consecutive words → substring → fuzzy / 逐词四种策略
/// 4. dedup by page id, notify when non-empty / 去重后通知
///
/// Returns true if any strategy produced a raw match, before dedup.
pub async fn scan(scanner: &dyn ContentScanner, params: &ScanParameters<'_>) -> bool {
    let scanner_id = scanner.meta_info();
    let pages_db = params.pages_db;
    let mut combined = PageSearchResults::default();
    let mut found_any = false;

    tracing::info!("{}: Starting scan for URL: {}", scanner_id, params.url);

    let domain_key = scanner.domain_key_for_search(params);
    found_any |= run_strategy(scanner_id, Strategy::DomainKey, &domain_key, pages_db, &mut combined);

    let mut entries: Vec<String> = Vec::new();
    if let Some(entity) = scanner.extract_entity(&params.url) {
        entries.push(entity);
    }
    match scanner.search_content(params).await {
        Ok(keys) => entries.extend(keys),
        Err(e) => tracing::error!("{}: Failed to read page content: {}", scanner_id, e),
    }
    // a blank key matches every page by substring
    entries.retain(|entry| !entry.trim().is_empty());

    if entries.is_empty() {
        tracing::debug!("{}: No entity extracted, skipping entity searches", scanner_id);
    }
    for entry in &entries {
        tracing::debug!("{}: Extracted entity: \"{}\"", scanner_id, entry);
        found_any |= search_entity(scanner_id, entry, pages_db, &mut combined);
    }

    let unique = combined.unique_by_page_id();
    if unique.is_empty() {
        tracing::info!("{}: No relevant pages found", scanner_id);
    } else {
        tracing::info!("{}: Notifying with {} unique pages", scanner_id, unique.total_pages_found());
        params.notifier.notify(unique);
    }

    found_any
}

/// Closed set of site scanners / 站点扫描器集合
pub enum Scanner {
    GenericSearchEngine(GenericSearchEngineScanner),
    Google(GoogleScanner),
}

impl Scanner {
    pub fn as_content_scanner(&self) -> &dyn ContentScanner {
        match self {
            Scanner::GenericSearchEngine(s) => s,
            Scanner::Google(s) => s,
        }
    }

    pub fn meta_info(&self) -> &'static str {
        self.as_content_scanner().meta_info()
    }

    pub fn can_scan_content(&self, params: &ScanParameters<'_>) -> bool {
        self.as_content_scanner().can_scan_content(params)
    }

    pub async fn scan(&self, params: &ScanParameters<'_>) -> bool {
        scan(self.as_content_scanner(), params).await
    }
}

/// Inner text matching for pages no scanner understands / 无适用扫描器时的正文匹配
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InnerTextFallback {
    pub threshold: f64,
    pub min_length: usize,
}

/// Scanner registry / 扫描器注册表
///
/// Scanners run in registration order; every applicable scanner runs.
pub struct ScannerRegistry {
    scanners: Vec<Scanner>,
    inner_text_fallback: Option<InnerTextFallback>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self {
            scanners: Vec::new(),
            inner_text_fallback: None,
        }
    }

    /// Registry with all built-in scanners / 注册全部内置扫描器
    pub fn with_default_scanners() -> Self {
        let mut registry = Self::new();
        registry.register(Scanner::GenericSearchEngine(GenericSearchEngineScanner::new()));
        registry.register(Scanner::Google(GoogleScanner::new()));
        registry
    }

    pub fn with_inner_text_fallback(mut self, fallback: Option<InnerTextFallback>) -> Self {
        self.inner_text_fallback = fallback;
        self
    }

    pub fn register(&mut self, scanner: Scanner) {
        tracing::debug!("Scanner registered: {}", scanner.meta_info());
        self.scanners.push(scanner);
    }

    pub fn scanners(&self) -> &[Scanner] {
        &self.scanners
    }

    /// Scanners that understand this page / 适用于此页面的扫描器
    pub fn applicable<'s>(&'s self, params: &ScanParameters<'_>) -> Vec<&'s Scanner> {
        self.scanners
            .iter()
            .filter(|s| s.can_scan_content(params))
            .collect()
    }

    /// Scan a visited page with every applicable scanner / 扫描页面
    pub async fn scan_page(&self, params: &ScanParameters<'_>) -> bool {
        let applicable = self.applicable(params);
        if applicable.is_empty() {
            return self.scan_inner_text(params).await;
        }

        let mut found_any = false;
        for scanner in applicable {
            found_any |= scanner.scan(params).await;
        }
        found_any
    }

    async fn scan_inner_text(&self, params: &ScanParameters<'_>) -> bool {
        let Some(fallback) = self.inner_text_fallback else {
            tracing::debug!("No scanner for {}", params.url);
            return false;
        };

        let text = match params.dom.inner_text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Failed to read page text for {}: {}", params.url, e);
                return false;
            }
        };

        let results = params
            .pages_db
            .fuzzy_search_inner_text(&text, fallback.threshold, fallback.min_length);
        if results.is_empty() {
            return false;
        }
        tracing::info!("inner-text: Notifying with {} pages", results.total_pages_found());
        params.notifier.notify(results);
        true
    }
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        Self::with_default_scanners()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CargoExport;
    use parking_lot::Mutex;
    use serde_json::json;

    struct StubContent {
        elements: Vec<ElementData>,
        text: String,
        fail: bool,
    }

    impl StubContent {
        fn empty() -> Self {
            Self { elements: Vec::new(), text: String::new(), fail: false }
        }

        fn with_titles(titles: &[&str]) -> Self {
            let elements = titles
                .iter()
                .map(|t| ElementData {
                    tag_name: "div".to_string(),
                    class_name: "gkQHve".to_string(),
                    inner_text: t.to_string(),
                    ..Default::default()
                })
                .collect();
            Self { elements, text: String::new(), fail: false }
        }
    }

    #[async_trait]
    impl PageContent for StubContent {
        async fn query_selector_all(&self, _selector: &str) -> anyhow::Result<Vec<ElementData>> {
            if self.fail {
                anyhow::bail!("content script unavailable");
            }
            Ok(self.elements.clone())
        }

        async fn inner_text(&self) -> anyhow::Result<String> {
            Ok(self.text.clone())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        received: Mutex<Vec<PageSearchResults>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, results: PageSearchResults) {
            self.received.lock().push(results);
        }
    }

    /// Domain key only, no entity / 仅域名搜索词
    struct DomainOnlyScanner;

    #[async_trait]
    impl ContentScanner for DomainOnlyScanner {
        fn meta_info(&self) -> &'static str {
            "domain-only"
        }

        fn can_scan_content(&self, _params: &ScanParameters<'_>) -> bool {
            true
        }

        fn domain_key_for_search(&self, params: &ScanParameters<'_>) -> String {
            params.main_domain.clone()
        }
    }

    /// Returns a fixed entity, including blank ones / 返回固定实体
    struct FixedEntityScanner(&'static str);

    #[async_trait]
    impl ContentScanner for FixedEntityScanner {
        fn meta_info(&self) -> &'static str {
            "fixed-entity"
        }

        fn can_scan_content(&self, _params: &ScanParameters<'_>) -> bool {
            true
        }

        fn domain_key_for_search(&self, _params: &ScanParameters<'_>) -> String {
            String::new()
        }

        fn extract_entity(&self, _url: &str) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn fixture_db() -> PagesDb {
        let cargo = CargoExport::validate(&json!({
            "Company": [{
                "PageID": "102", "PageName": "Amazon", "Industry": "E-commerce",
                "ParentCompany": "", "Type": "Public", "Website": "https://www.amazon.com"
            }],
            "Incident": [],
            "Product": [{
                "PageID": "302", "PageName": "Kindle Paperwhite", "Category": "E-readers",
                "Company": "Amazon", "Description": "", "ProductLine": "Kindle", "Website": ""
            }],
            "ProductLine": [{
                "PageID": "402", "PageName": "Kindle", "Category": "E-readers",
                "Company": "Amazon", "Description": "", "Website": ""
            }]
        }))
        .unwrap();
        let db = PagesDb::new();
        db.set_pages(&cargo);
        db
    }

    #[tokio::test]
    async fn test_scan_dedups_across_strategies() {
        let db = fixture_db();
        let dom = StubContent::empty();
        let notifier = RecordingNotifier::default();
        let params = ScanParameters::new("https://www.bing.com/search?q=kindle", &db, &dom, &notifier);
        assert_eq!(params.main_domain, "bing");

        let found = scan(&GenericSearchEngineScanner::new(), &params).await;
        assert!(found);

        // consecutive, substring and fuzzy all return Kindle Paperwhite
        let received = notifier.received.lock();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].page_ids(), vec![302, 402]);
    }

    #[tokio::test]
    async fn test_scan_without_match_notifies_nothing() {
        let db = fixture_db();
        let dom = StubContent::empty();
        let notifier = RecordingNotifier::default();
        let params = ScanParameters::new("https://duckduckgo.com/?q=zzzz", &db, &dom, &notifier);

        assert!(!scan(&GenericSearchEngineScanner::new(), &params).await);
        assert!(notifier.received.lock().is_empty());
    }

    #[tokio::test]
    async fn test_scan_domain_key_baseline() {
        let db = fixture_db();
        let dom = StubContent::empty();
        let notifier = RecordingNotifier::default();
        let params = ScanParameters::new("https://www.amazon.co.uk/", &db, &dom, &notifier);
        assert_eq!(params.main_domain, "amazon");

        assert!(scan(&DomainOnlyScanner, &params).await);
        assert_eq!(notifier.received.lock()[0].page_ids(), vec![102]);

        // IP hosts have no registrable domain unless one is supplied
        let params = ScanParameters::new("http://127.0.0.1:8080/", &db, &dom, &notifier);
        assert!(params.main_domain.is_empty());
        let params = params.with_main_domain("amazon");
        assert!(scan(&DomainOnlyScanner, &params).await);
        assert_eq!(notifier.received.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_google_shopping_titles() {
        let db = fixture_db();
        let dom = StubContent::with_titles(&["Kindle Paperwhite", "KINDLE PAPERWHITE", "abc"]);
        let notifier = RecordingNotifier::default();
        let params = ScanParameters::new(
            "https://www.google.com/search?q=e-reader&udm=3",
            &db,
            &dom,
            &notifier,
        );

        let scanner = GoogleScanner::new();
        assert!(scanner.can_scan_content(&params));
        assert_eq!(scanner.search_content(&params).await.unwrap(), vec!["kindle paperwhite".to_string()]);

        assert!(scan(&scanner, &params).await);
        assert_eq!(notifier.received.lock()[0].page_ids(), vec![302, 402]);
    }

    #[tokio::test]
    async fn test_content_failure_does_not_abort() {
        let db = fixture_db();
        let dom = StubContent { fail: true, ..StubContent::empty() };
        let notifier = RecordingNotifier::default();
        let params = ScanParameters::new(
            "https://www.google.com/search?q=amazon&udm=3",
            &db,
            &dom,
            &notifier,
        );

        assert!(scan(&GoogleScanner::new(), &params).await);
        assert_eq!(notifier.received.lock()[0].page_ids(), vec![102]);
    }

    #[tokio::test]
    async fn test_registry_selects_applicable_scanners() {
        let db = fixture_db();
        let dom = StubContent::empty();
        let notifier = RecordingNotifier::default();
        let registry = ScannerRegistry::with_default_scanners();
        assert_eq!(registry.scanners().len(), 2);

        let params = ScanParameters::new("https://www.google.com/search?q=kindle", &db, &dom, &notifier);
        let applicable = registry.applicable(&params);
        assert_eq!(applicable.len(), 1);
        assert_eq!(applicable[0].meta_info(), "google");

        assert!(registry.scan_page(&params).await);
    }

    #[tokio::test]
    async fn test_registry_inner_text_fallback() {
        let db = fixture_db();
        let dom = StubContent {
            text: "Today only\nKindle Paperwhite 16GB, now 20% off\n".to_string(),
            ..StubContent::empty()
        };
        let notifier = RecordingNotifier::default();
        let params = ScanParameters::new("https://shop.example.com/item/1", &db, &dom, &notifier);

        let registry = ScannerRegistry::with_default_scanners();
        assert!(!registry.scan_page(&params).await);

        let registry = registry.with_inner_text_fallback(Some(InnerTextFallback {
            threshold: 0.85,
            min_length: 10,
        }));
        assert!(registry.scan_page(&params).await);

        let received = notifier.received.lock();
        assert_eq!(received.len(), 1);
        // Paperwhite by name, Kindle line by name; Amazon is not on the page
        assert_eq!(received[0].page_ids(), vec![302, 402]);
    }

    #[tokio::test]
    async fn test_scan_skips_blank_google_query() {
        let db = fixture_db();
        let dom = StubContent::empty();
        let notifier = RecordingNotifier::default();
        let params = ScanParameters::new("https://www.google.com/search?q=&udm=2", &db, &dom, &notifier);

        assert!(!scan(&GoogleScanner::new(), &params).await);
        assert!(notifier.received.lock().is_empty());
    }

    #[tokio::test]
    async fn test_scan_skips_blank_keys_from_any_source() {
        let db = fixture_db();
        let notifier = RecordingNotifier::default();

        // whitespace entity from the URL
        let dom = StubContent::empty();
        let params = ScanParameters::new("https://example.com/", &db, &dom, &notifier);
        assert!(!scan(&FixedEntityScanner("  \t "), &params).await);

        // whitespace shopping title survives the length filter but not the cascade
        let dom = StubContent::with_titles(&["     "]);
        let params = ScanParameters::new("https://www.google.com/search?q=%20&udm=3", &db, &dom, &notifier);
        assert!(!scan(&GoogleScanner::new(), &params).await);

        assert!(notifier.received.lock().is_empty());
    }

    #[test]
    fn test_perform_search_unsupported_is_not_a_match() {
        let mut combined = PageSearchResults::default();
        let matched = perform_search("test", "Consecutive Words Match", "kindle", &mut combined, || {
            Err(SearchError::Unsupported("max_results != 1"))
        });
        assert!(!matched);
        assert!(combined.is_empty());
    }

    #[test]
    fn test_perform_search_error_is_not_a_match() {
        let mut combined = PageSearchResults::default();
        let matched = perform_search("test", "Simple Substring Match", "(", &mut combined, || {
            Err(SearchError::Pattern(regex::Regex::new("(").unwrap_err()))
        });
        assert!(!matched);
        assert!(combined.is_empty());
    }

    #[test]
    fn test_perform_search_appends_results() {
        let db = fixture_db();
        let mut combined = PageSearchResults::default();

        assert!(!perform_search("test", "Category Match", "zzzz", &mut combined, || {
            Ok(PageSearchResults::default())
        }));
        assert!(perform_search("test", "Category Match", "e-readers", &mut combined, || {
            Ok(db.get_pages_for_category("e-readers"))
        }));
        assert!(run_strategy("test", Strategy::Simple, "amazon", &db, &mut combined));
        assert_eq!(combined.page_ids(), vec![302, 402, 102]);
    }
}
