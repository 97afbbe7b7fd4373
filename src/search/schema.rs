//! Search result container / 搜索结果容器

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::Page;

/// Ordered set of matched pages / 有序的命中页面集合
///
/// Insertion order is kept and duplicates are allowed: several strategies may
/// return the same page, consumers dedup with [`PageSearchResults::unique_by_page_id`].
/// 保持插入顺序，允许重复；去重由调用方负责。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSearchResults {
    page_entries: Vec<Page>,
}

impl PageSearchResults {
    pub fn new(page_entries: Vec<Page>) -> Self {
        Self { page_entries }
    }

    pub fn add_page_entry(&mut self, page: Page) {
        self.page_entries.push(page);
    }

    pub fn add_page_entries<I>(&mut self, pages: I)
    where
        I: IntoIterator<Item = Page>,
    {
        self.page_entries.extend(pages);
    }

    pub fn total_pages_found(&self) -> usize {
        self.page_entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page_entries.is_empty()
    }

    pub fn page_entries(&self) -> &[Page] {
        &self.page_entries
    }

    pub fn into_page_entries(self) -> Vec<Page> {
        self.page_entries
    }

    pub fn page_ids(&self) -> Vec<u64> {
        self.page_entries.iter().map(Page::page_id).collect()
    }

    /// Copy with duplicates removed, first occurrence wins / 按页面ID去重，保留首次出现
    pub fn unique_by_page_id(&self) -> PageSearchResults {
        let mut seen = HashSet::new();
        let unique = self
            .page_entries
            .iter()
            .filter(|page| seen.insert(page.page_id()))
            .cloned()
            .collect();
        PageSearchResults::new(unique)
    }
}

impl FromIterator<Page> for PageSearchResults {
    fn from_iter<T: IntoIterator<Item = Page>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductLinePage;

    fn line(id: u64, name: &str) -> Page {
        Page::ProductLine(ProductLinePage {
            page_id: id,
            page_name: name.to_string(),
            categories: Vec::new(),
            company: String::new(),
            description: String::new(),
            website: String::new(),
        })
    }

    #[test]
    fn test_unique_keeps_first_occurrence() {
        let mut results = PageSearchResults::default();
        results.add_page_entry(line(1, "first"));
        results.add_page_entries(vec![line(2, "second"), line(1, "first again")]);
        assert_eq!(results.total_pages_found(), 3);

        let unique = results.unique_by_page_id();
        assert_eq!(unique.page_ids(), vec![1, 2]);
        assert_eq!(unique.page_entries()[0].page_name(), "first");
    }
}
