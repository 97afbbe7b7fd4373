//! Generic search engine scanner / 通用搜索引擎扫描器
//!
//! One table covers many engines: each entry maps a registrable domain to the
//! query parameter carrying the search terms, or to a path pattern.

use async_trait::async_trait;
use regex::Regex;
use url::Url;

use super::domain::main_domain;
use super::{ContentScanner, ScanParameters};

/// Search engine table entry / 搜索引擎配置项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchEngine {
    /// Registrable domain without suffix / 主域名
    pub domain: &'static str,
    /// Query parameter name / 查询参数名
    pub search: &'static str,
    /// Path pattern, group 1 is the entity / 路径正则，第1组为实体
    pub path: Option<&'static str>,
}

pub const SEARCH_ENGINES: &[SearchEngine] = &[
    SearchEngine { domain: "bing", search: "q", path: None },
    SearchEngine { domain: "yahoo", search: "p", path: None },
    // served from search.brave.com
    SearchEngine { domain: "brave", search: "q", path: None },
    SearchEngine { domain: "duckduckgo", search: "q", path: None },
    SearchEngine { domain: "archive", search: "query", path: None },
    SearchEngine { domain: "facebook", search: "q", path: None },
    SearchEngine { domain: "x", search: "q", path: None },
    SearchEngine { domain: "wikipedia", search: "search", path: Some(r"^/wiki/([^/?]+)") },
];

pub struct GenericSearchEngineScanner {
    engines: Vec<(SearchEngine, Option<Regex>)>,
}

impl GenericSearchEngineScanner {
    pub fn new() -> Self {
        Self::with_engines(SEARCH_ENGINES)
    }

    /// Build from a custom engine table / 使用自定义引擎表
    pub fn with_engines(engines: &[SearchEngine]) -> Self {
        let engines = engines
            .iter()
            .map(|engine| {
                let pattern = engine.path.and_then(|p| match Regex::new(p) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::error!("Invalid path pattern for {}: {}", engine.domain, e);
                        None
                    }
                });
                (*engine, pattern)
            })
            .collect();
        Self { engines }
    }

    fn engine_for(&self, domain: &str) -> Option<&(SearchEngine, Option<Regex>)> {
        self.engines.iter().find(|(engine, _)| engine.domain == domain)
    }
}

impl Default for GenericSearchEngineScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a path slug into search terms: percent-decode, `_` → space, lowercase
/// 路径片段转为搜索词
fn slug_to_terms(slug: &str) -> String {
    let decoded = urlencoding::decode(slug)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| slug.to_string());
    decoded.replace('_', " ").to_lowercase()
}

#[async_trait]
impl ContentScanner for GenericSearchEngineScanner {
    fn meta_info(&self) -> &'static str {
        "generic-search-engine"
    }

    fn can_scan_content(&self, params: &ScanParameters<'_>) -> bool {
        self.engine_for(&params.main_domain).is_some()
    }

    fn domain_key_for_search(&self, params: &ScanParameters<'_>) -> String {
        match self.engine_for(&params.main_domain) {
            Some(_) => params.main_domain.clone(),
            None => String::new(),
        }
    }

    fn extract_entity(&self, url: &str) -> Option<String> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("{}: Error parsing URL {}: {}", self.meta_info(), url, e);
                return None;
            }
        };

        let domain = parsed.host_str().and_then(main_domain).unwrap_or_default();
        let Some((engine, pattern)) = self.engine_for(&domain) else {
            tracing::debug!("{}: Could not extract from URL: {}", self.meta_info(), url);
            return None;
        };

        if let Some(caps) = pattern.as_ref().and_then(|re| re.captures(parsed.path())) {
            if let Some(slug) = caps.get(1) {
                let terms = slug_to_terms(slug.as_str());
                if !terms.trim().is_empty() {
                    return Some(terms);
                }
            }
        }

        parsed
            .query_pairs()
            .find(|(key, _)| key == engine.search)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.trim().is_empty())
    }
}
