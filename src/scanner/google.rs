//! Google scanner / 谷歌扫描器

use async_trait::async_trait;
use url::Url;

use super::{ContentScanner, ScanParameters};

/// Product title elements on the shopping results tab / 购物结果标题元素
pub const SHOPPING_TITLE_SELECTOR: &str = ".gkQHve";
/// `udm` value of the shopping tab / 购物标签页的 udm 值
const SHOPPING_UDM: &str = "3";
/// Titles this short carry no entity / 过短标题忽略
const MIN_TITLE_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleScanner;

impl GoogleScanner {
    pub fn new() -> Self {
        Self
    }

    /// Lowercase, drop short entries, dedup keeping the first occurrence
    /// 小写化、过滤短条目、去重（保留首次出现）
    fn process_strings(source: Vec<String>) -> Vec<String> {
        let mut result: Vec<String> = Vec::new();
        for line in source {
            let line = line.to_lowercase();
            if line.chars().count() > MIN_TITLE_CHARS && !result.contains(&line) {
                result.push(line);
            }
        }
        result
    }
}

#[async_trait]
impl ContentScanner for GoogleScanner {
    fn meta_info(&self) -> &'static str {
        "google"
    }

    fn can_scan_content(&self, params: &ScanParameters<'_>) -> bool {
        params.main_domain == "google"
    }

    fn domain_key_for_search(&self, params: &ScanParameters<'_>) -> String {
        params.main_domain.clone()
    }

    fn extract_entity(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.trim().is_empty())
    }

    async fn search_content(&self, params: &ScanParameters<'_>) -> anyhow::Result<Vec<String>> {
        let parsed = Url::parse(&params.url)?;
        let udm = parsed
            .query_pairs()
            .find(|(key, _)| key == "udm")
            .map(|(_, value)| value.into_owned());

        if udm.as_deref() != Some(SHOPPING_UDM) {
            return Ok(Vec::new());
        }

        let elements = params.dom.query_selector_all(SHOPPING_TITLE_SELECTOR).await?;
        let titles = elements.into_iter().map(|e| e.inner_text).collect();
        Ok(Self::process_strings(titles))
    }
}
