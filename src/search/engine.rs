//! Pages database - in-memory catalog index / 页面数据库（内存索引）
//!
//! Architecture principle: only expose primitive operations, do not control flow / 架构原则
//! - set_pages: replace the whole catalog / 整体替换目录
//! - get_pages_for_category: exact category match / 分类精确匹配
//! - simple_search: substring match / 子串匹配
//! - find_consecutive_words: prefix word run match / 前缀连续词匹配
//! - fuzzy_search: whole word match count / 整词命中计数
//! - fuzzy_search_inner_text: approximate match against page text / 正文近似匹配
//!
//! The catalog is small, every strategy is a linear scan over one snapshot.
//! 目录规模很小，所有策略都是对快照的线性扫描。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::matcher::{
    clean_text_lines, consecutive_word_score, count_word_matches, query_words, similarity,
    split_single_spaces, word_pattern,
};
use super::schema::PageSearchResults;
use crate::error::SearchError;
use crate::models::{
    CargoExport, CompanyPage, IncidentPage, Page, ProductLinePage, ProductPage,
};

/// Baked in catalog, loaded before any cache or network data / 内置默认目录
pub const PAGES_DB_DEFAULT_JSON: &str = include_str!("../../data/pages_db.json");

/// Default score threshold for inner text matching / 正文匹配默认阈值
pub const DEFAULT_INNER_TEXT_THRESHOLD: f64 = 0.85;
/// Default minimum line length for inner text matching / 正文匹配默认最短行长度
pub const DEFAULT_INNER_TEXT_MIN_LENGTH: usize = 10;

/// One generation of the catalog, never mutated after construction / 目录快照（不可变）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagesSnapshot {
    pub company_pages: Vec<CompanyPage>,
    pub incident_pages: Vec<IncidentPage>,
    pub product_pages: Vec<ProductPage>,
    pub product_line_pages: Vec<ProductLinePage>,
    /// Concatenation in catalog order: Company, Incident, Product, ProductLine
    all_pages: Vec<Page>,
}

impl PagesSnapshot {
    pub fn from_cargo(cargo: &CargoExport) -> Self {
        let company_pages: Vec<CompanyPage> = cargo.company.iter().map(CompanyPage::from).collect();
        let incident_pages: Vec<IncidentPage> = cargo.incident.iter().map(IncidentPage::from).collect();
        let product_pages: Vec<ProductPage> = cargo.product.iter().map(ProductPage::from).collect();
        let product_line_pages: Vec<ProductLinePage> =
            cargo.product_line.iter().map(ProductLinePage::from).collect();

        let all_pages = company_pages
            .iter()
            .cloned()
            .map(Page::Company)
            .chain(incident_pages.iter().cloned().map(Page::Incident))
            .chain(product_pages.iter().cloned().map(Page::Product))
            .chain(product_line_pages.iter().cloned().map(Page::ProductLine))
            .collect();

        Self {
            company_pages,
            incident_pages,
            product_pages,
            product_line_pages,
            all_pages,
        }
    }

    pub fn all_pages(&self) -> &[Page] {
        &self.all_pages
    }
}

/// Best inner text hit for one page / 单个页面的最佳正文命中
#[derive(Debug, Clone)]
struct InnerTextHit {
    score: f64,
    search: String,
    text: String,
}

/// Pages database / 页面数据库
///
/// Holds one snapshot behind a lock. Readers clone the `Arc` and search without
/// holding the lock; `set_pages` swaps the pointer, so a reader sees either the
/// old or the new catalog, never a mix.
/// 读者克隆快照指针后无锁搜索；写入时整体替换指针。
pub struct PagesDb {
    snapshot: RwLock<Arc<PagesSnapshot>>,
}

impl PagesDb {
    /// Create an empty database / 创建空数据库
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(PagesSnapshot::default())),
        }
    }

    /// Create a database seeded with the baked in catalog / 使用内置目录初始化
    pub fn with_default_pages() -> Self {
        let db = Self::new();
        db.init_default_pages();
        db
    }

    /// Parse the baked in catalog / 解析内置目录
    pub fn default_pages() -> Result<CargoExport, serde_json::Error> {
        serde_json::from_str(PAGES_DB_DEFAULT_JSON)
    }

    /// Load the baked in catalog as the current generation / 加载内置目录
    pub fn init_default_pages(&self) {
        match Self::default_pages() {
            Ok(cargo) => self.set_pages(&cargo),
            Err(e) => tracing::error!("Baked in pages database is invalid: {}", e),
        }
    }

    /// Replace all four collections at once (no validation, caller's contract)
    /// 一次性替换四个集合（不做校验，由调用方保证）
    pub fn set_pages(&self, cargo: &CargoExport) {
        let snapshot = Arc::new(PagesSnapshot::from_cargo(cargo));
        tracing::debug!(
            companies = snapshot.company_pages.len(),
            incidents = snapshot.incident_pages.len(),
            products = snapshot.product_pages.len(),
            product_lines = snapshot.product_line_pages.len(),
            "Pages database replaced"
        );
        *self.snapshot.write() = snapshot;
    }

    /// Current generation / 当前快照
    pub fn snapshot(&self) -> Arc<PagesSnapshot> {
        self.snapshot.read().clone()
    }

    pub fn all_pages(&self) -> Vec<Page> {
        self.snapshot().all_pages.clone()
    }

    pub fn page_count(&self) -> usize {
        self.snapshot().all_pages.len()
    }

    pub fn get_page(&self, page_id: u64) -> Option<Page> {
        self.snapshot()
            .all_pages
            .iter()
            .find(|page| page.page_id() == page_id)
            .cloned()
    }

    /// Coarse lookup by registrable domain name / 按域名粗略查找
    pub fn get_pages_for_domain(&self, domain: &str) -> Result<PageSearchResults, SearchError> {
        self.fuzzy_search(domain, false)
    }

    /// Case-insensitive exact match on industries / categories / 行业或分类精确匹配（忽略大小写）
    pub fn get_pages_for_category(&self, category_name: &str) -> PageSearchResults {
        let lower = category_name.to_lowercase();
        let snapshot = self.snapshot();

        snapshot
            .all_pages
            .iter()
            .filter(|page| page.categories().iter().any(|c| c.to_lowercase() == lower))
            .cloned()
            .collect()
    }

    /// Case-insensitive substring match on page name / 页面名称子串匹配
    pub fn simple_search(&self, query: &str) -> PageSearchResults {
        let lower = query.to_lowercase();
        let snapshot = self.snapshot();

        snapshot
            .all_pages
            .iter()
            .filter(|page| page.page_name().to_lowercase().contains(&lower))
            .cloned()
            .collect()
    }

    /// Best page by words matching position for position from the start
    /// 从开头逐位比较词语，返回得分最高的单个页面
    ///
    /// Only `max_results == 1` and `only_from_start == true` are implemented, other
    /// combinations fail with [`SearchError::Unsupported`].
    pub fn find_consecutive_words(
        &self,
        query: &str,
        max_results: usize,
        only_from_start: bool,
    ) -> Result<PageSearchResults, SearchError> {
        if max_results != 1 {
            return Err(SearchError::Unsupported("max_results != 1"));
        }
        if !only_from_start {
            return Err(SearchError::Unsupported("only_from_start = false"));
        }

        let search_words = split_single_spaces(query);
        let snapshot = self.snapshot();

        let mut best_count = 0;
        let mut found: Option<&Page> = None;
        for page in &snapshot.all_pages {
            let title_words = split_single_spaces(page.page_name());
            let count = consecutive_word_score(&search_words, &title_words);
            // Strictly greater: ties keep the first page in catalog order
            if count > best_count {
                best_count = count;
                found = Some(page);
            }
        }

        Ok(found.cloned().into_iter().collect())
    }

    /// Whole word match count, sorted by count descending / 整词命中数排序
    ///
    /// With `match_all_words` every query word must match, otherwise one is enough.
    /// Ties keep catalog order. An empty query matches nothing.
    pub fn fuzzy_search(
        &self,
        query: &str,
        match_all_words: bool,
    ) -> Result<PageSearchResults, SearchError> {
        let words = query_words(query);
        if words.is_empty() {
            return Ok(PageSearchResults::default());
        }
        let patterns = words
            .iter()
            .map(|w| word_pattern(w))
            .collect::<Result<Vec<_>, _>>()?;

        let snapshot = self.snapshot();
        let mut scored: Vec<(&Page, usize)> = snapshot
            .all_pages
            .iter()
            .map(|page| (page, count_word_matches(&patterns, page.page_name())))
            .filter(|(_, count)| {
                if match_all_words {
                    *count == patterns.len()
                } else {
                    *count > 0
                }
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(scored.into_iter().map(|(page, _)| page.clone()).collect())
    }

    /// Approximate match of page fields against free page text / 页面字段与正文的近似匹配
    ///
    /// Each page keeps the best score over all of its fields and all text lines;
    /// pages scoring above `threshold` are returned in catalog order.
    pub fn fuzzy_search_inner_text(
        &self,
        inner_text: &str,
        threshold: f64,
        min_length: usize,
    ) -> PageSearchResults {
        let lines = clean_text_lines(inner_text, min_length);
        if lines.is_empty() {
            return PageSearchResults::default();
        }

        let snapshot = self.snapshot();
        let mut hits: HashMap<u64, InnerTextHit> = HashMap::new();

        for page in &snapshot.all_pages {
            for field in page.text_search_fields() {
                if field.trim().is_empty() {
                    continue;
                }
                for line in &lines {
                    let score = similarity(field, line);
                    if score <= threshold {
                        continue;
                    }
                    let best = hits.get(&page.page_id()).map(|h| h.score).unwrap_or(0.0);
                    if score > best {
                        hits.insert(
                            page.page_id(),
                            InnerTextHit {
                                score,
                                search: field.to_string(),
                                text: line.clone(),
                            },
                        );
                    }
                }
            }
        }

        for (page_id, hit) in &hits {
            tracing::debug!(page_id, score = hit.score, search = %hit.search, text = %hit.text, "Inner text hit");
        }

        snapshot
            .all_pages
            .iter()
            .filter(|page| hits.contains_key(&page.page_id()))
            .cloned()
            .collect()
    }
}

impl Default for PagesDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyCargo, IncidentCargo, ProductCargo, ProductLineCargo};

    fn company(id: &str, name: &str, industry: &str, parent: &str) -> CompanyCargo {
        CompanyCargo {
            page_id: id.to_string(),
            page_name: name.to_string(),
            industry: industry.to_string(),
            parent_company: parent.to_string(),
            company_type: "Public".to_string(),
            website: String::new(),
        }
    }

    fn product(id: &str, name: &str, category: &str, company: &str, line: &str) -> ProductCargo {
        ProductCargo {
            page_id: id.to_string(),
            page_name: name.to_string(),
            category: category.to_string(),
            company: company.to_string(),
            description: String::new(),
            product_line: line.to_string(),
            website: String::new(),
        }
    }

    fn product_line(id: &str, name: &str, category: &str, company: &str) -> ProductLineCargo {
        ProductLineCargo {
            page_id: id.to_string(),
            page_name: name.to_string(),
            category: category.to_string(),
            company: company.to_string(),
            description: String::new(),
            website: String::new(),
        }
    }

    fn incident(id: &str, name: &str, product: &str) -> IncidentCargo {
        IncidentCargo {
            page_id: id.to_string(),
            page_name: name.to_string(),
            company: String::new(),
            description: String::new(),
            end_date: String::new(),
            product: product.to_string(),
            product_line: String::new(),
            start_date: "2020-01-01".to_string(),
            status: "Active".to_string(),
            incident_type: String::new(),
        }
    }

    fn test_cargo() -> CargoExport {
        CargoExport {
            company: vec![
                company("1", "Alpha Beta Gamma", "Software", ""),
                company("2", "Wikimedia Foundation", "Nonprofit, Encyclopedia", ""),
            ],
            incident: vec![incident("3", "Beta Gamma outage", "Widget Pro")],
            product: vec![
                product("4", "Widget Pro", "Gadgets", "Alpha Beta Gamma", "Widget"),
                product("5", "Gamma Ray Gun", "gadgets", "", ""),
            ],
            product_line: vec![product_line("6", "Widget", "Gadgets", "Alpha Beta Gamma")],
        }
    }

    fn test_db() -> PagesDb {
        let db = PagesDb::new();
        db.set_pages(&test_cargo());
        db
    }

    #[test]
    fn test_all_pages_is_concatenation() {
        let db = test_db();
        assert_eq!(db.page_count(), test_cargo().total_rows());
        assert_eq!(db.all_pages().iter().map(|p| p.page_id()).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(db.get_page(5).map(|p| p.page_name().to_string()), Some("Gamma Ray Gun".to_string()));
        assert!(db.get_page(99).is_none());
    }

    #[test]
    fn test_set_pages_is_idempotent() {
        let db = test_db();
        let first = db.snapshot();
        db.set_pages(&test_cargo());
        let second = db.snapshot();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[test]
    fn test_default_pages_parse() {
        let cargo = PagesDb::default_pages().unwrap();
        let db = PagesDb::with_default_pages();
        assert!(db.page_count() > 0);
        assert_eq!(db.page_count(), cargo.total_rows());
    }

    #[test]
    fn test_category_search() {
        let db = test_db();
        assert_eq!(db.get_pages_for_category("GADGETS").page_ids(), vec![4, 5, 6]);
        assert_eq!(db.get_pages_for_category("encyclopedia").page_ids(), vec![2]);
        // Exact match only
        assert!(db.get_pages_for_category("gadget").is_empty());
    }

    #[test]
    fn test_simple_search() {
        let db = test_db();
        assert_eq!(db.simple_search("wiki").page_ids(), vec![2]);
        assert_eq!(db.simple_search("GAMMA").page_ids(), vec![1, 3, 5]);
    }

    #[test]
    fn test_find_consecutive_words() {
        let db = test_db();
        let results = db.find_consecutive_words("alpha beta", 1, true).unwrap();
        assert_eq!(results.page_ids(), vec![1]);

        // No name shares a word with the query at the same position
        let results = db.find_consecutive_words("delta epsilon", 1, true).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_find_consecutive_words_ties_keep_catalog_order() {
        let db = test_db();
        // "Widget Pro" (4) and "Widget" (6) both score 1, first wins
        let results = db.find_consecutive_words("widget", 1, true).unwrap();
        assert_eq!(results.page_ids(), vec![4]);
    }

    #[test]
    fn test_find_consecutive_words_unsupported() {
        let db = test_db();
        let err = db.find_consecutive_words("alpha", 2, true).unwrap_err();
        assert!(err.is_unsupported());
        let err = db.find_consecutive_words("alpha", 1, false).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_fuzzy_search_any_word_sorted() {
        let db = test_db();
        let results = db.fuzzy_search("gamma beta", false).unwrap();
        // 1 and 3 match both words, 5 matches one; ties keep catalog order
        assert_eq!(results.page_ids(), vec![1, 3, 5]);
    }

    #[test]
    fn test_fuzzy_search_all_words() {
        let db = test_db();
        let results = db.fuzzy_search("GAMMA alpha", true).unwrap();
        assert_eq!(results.page_ids(), vec![1]);

        // whole words only: "gam" is not a word of any name
        assert!(db.fuzzy_search("gam", false).unwrap().is_empty());
        assert!(db.fuzzy_search("   ", false).unwrap().is_empty());
    }

    #[test]
    fn test_fuzzy_search_special_characters() {
        let db = test_db();
        assert!(db.fuzzy_search("(widget)", false).is_ok());
        assert_eq!(db.get_pages_for_domain("widget").unwrap().page_ids(), vec![4, 6]);
    }

    #[test]
    fn test_fuzzy_search_inner_text() {
        let db = test_db();
        let text = "Header\n\u{200B}Buy the new Widget Pro today!\nfooter text that is unrelated";
        let results = db.fuzzy_search_inner_text(text, DEFAULT_INNER_TEXT_THRESHOLD, DEFAULT_INNER_TEXT_MIN_LENGTH);
        // Widget Pro by name, the incident via its product field, Widget line by name
        assert_eq!(results.page_ids(), vec![3, 4, 6]);

        assert!(db.fuzzy_search_inner_text("Widget", 0.85, 10).is_empty());
    }
}
