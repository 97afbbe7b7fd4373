//! Search module - only provides search capabilities (primitives), does not control flow / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - Search module only exposes primitive operations over the pages catalog
//! - Scanners decide which strategies to run and how to combine them
//! - Call direction: Scanner → Search (unidirectional) / 调用方向
//!
//! Strategies / 搜索策略：
//! - category: exact industry / category match / 分类精确匹配
//! - simple: substring match on names / 名称子串匹配
//! - consecutive words: best prefix word overlap / 前缀词重合
//! - fuzzy: whole word match count / 整词命中计数
//! - inner text: approximate match against free page text / 正文近似匹配

pub mod engine;
pub mod matcher;
pub mod schema;

pub use engine::{PagesDb, PagesSnapshot, DEFAULT_INNER_TEXT_MIN_LENGTH, DEFAULT_INNER_TEXT_THRESHOLD};
pub use schema::PageSearchResults;
