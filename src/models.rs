//! Catalog data models / 目录数据模型
//!
//! Two layers / 两层结构：
//! - Cargo records: flat string-typed rows exactly as the wiki export produces them / 导出原始记录
//! - Pages: typed entities converted once at ingestion time / 入库时转换的类型化页面

use serde::{Deserialize, Serialize};

/// Wiki base URL used to build page links / 维基基础地址
pub const WIKI_BASE_URL: &str = "https://consumerrights.wiki/";

/// Company row in the cargo export / 公司导出记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCargo {
    #[serde(rename = "PageID")]
    pub page_id: String,
    #[serde(rename = "PageName")]
    pub page_name: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "ParentCompany")]
    pub parent_company: String,
    #[serde(rename = "Type")]
    pub company_type: String,
    #[serde(rename = "Website")]
    pub website: String,
}

/// Incident row in the cargo export / 事件导出记录
///
/// Dates stay strings, the upstream export does not type them. / 日期保持字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentCargo {
    #[serde(rename = "PageID")]
    pub page_id: String,
    #[serde(rename = "PageName")]
    pub page_name: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "EndDate")]
    pub end_date: String,
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "ProductLine")]
    pub product_line: String,
    #[serde(rename = "StartDate")]
    pub start_date: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Type")]
    pub incident_type: String,
}

/// Product row in the cargo export / 产品导出记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCargo {
    #[serde(rename = "PageID")]
    pub page_id: String,
    #[serde(rename = "PageName")]
    pub page_name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "ProductLine")]
    pub product_line: String,
    #[serde(rename = "Website")]
    pub website: String,
}

/// Product line row in the cargo export / 产品线导出记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLineCargo {
    #[serde(rename = "PageID")]
    pub page_id: String,
    #[serde(rename = "PageName")]
    pub page_name: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Website")]
    pub website: String,
}

/// Complete cargo export, grouped by entity kind / 完整导出数据（按实体类型分组）
///
/// Deserializing into this type is the validation step: every collection must be
/// an array and every row must carry every field as a string. Unknown fields are
/// ignored.
/// 反序列化即校验：四个集合必须是数组，每条记录的必填字段必须为字符串。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CargoExport {
    pub company: Vec<CompanyCargo>,
    pub incident: Vec<IncidentCargo>,
    pub product: Vec<ProductCargo>,
    pub product_line: Vec<ProductLineCargo>,
}

impl CargoExport {
    /// Validate an untyped JSON document against the cargo schema / 按导出格式校验 JSON
    pub fn validate(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Total row count across the four collections / 四个集合的总行数
    pub fn total_rows(&self) -> usize {
        self.company.len() + self.incident.len() + self.product.len() + self.product_line.len()
    }
}

/// Entity kind / 实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageKind {
    Company,
    Incident,
    Product,
    ProductLine,
}

impl PageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Company => "Company",
            PageKind::Incident => "Incident",
            PageKind::Product => "Product",
            PageKind::ProductLine => "ProductLine",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyPage {
    pub page_id: u64,
    pub page_name: String,
    pub industries: Vec<String>,
    pub parent_company: String,
    pub company_type: String,
    pub website: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentPage {
    pub page_id: u64,
    pub page_name: String,
    pub company: String,
    pub product: String,
    pub product_line: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub incident_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    pub page_id: u64,
    pub page_name: String,
    pub categories: Vec<String>,
    pub company: String,
    pub product_line: String,
    pub description: String,
    pub website: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLinePage {
    pub page_id: u64,
    pub page_name: String,
    pub categories: Vec<String>,
    pub company: String,
    pub description: String,
    pub website: String,
}

impl From<&CompanyCargo> for CompanyPage {
    fn from(cargo: &CompanyCargo) -> Self {
        Self {
            page_id: parse_page_id(&cargo.page_id),
            page_name: cargo.page_name.clone(),
            industries: split_list(&cargo.industry),
            parent_company: cargo.parent_company.trim().to_string(),
            company_type: cargo.company_type.clone(),
            website: cargo.website.clone(),
        }
    }
}

impl From<&IncidentCargo> for IncidentPage {
    fn from(cargo: &IncidentCargo) -> Self {
        Self {
            page_id: parse_page_id(&cargo.page_id),
            page_name: cargo.page_name.clone(),
            company: cargo.company.trim().to_string(),
            product: cargo.product.trim().to_string(),
            product_line: cargo.product_line.trim().to_string(),
            description: cargo.description.clone(),
            start_date: cargo.start_date.clone(),
            end_date: cargo.end_date.clone(),
            status: cargo.status.clone(),
            incident_type: cargo.incident_type.clone(),
        }
    }
}

impl From<&ProductCargo> for ProductPage {
    fn from(cargo: &ProductCargo) -> Self {
        Self {
            page_id: parse_page_id(&cargo.page_id),
            page_name: cargo.page_name.clone(),
            categories: split_list(&cargo.category),
            company: cargo.company.trim().to_string(),
            product_line: cargo.product_line.trim().to_string(),
            description: cargo.description.clone(),
            website: cargo.website.clone(),
        }
    }
}

impl From<&ProductLineCargo> for ProductLinePage {
    fn from(cargo: &ProductLineCargo) -> Self {
        Self {
            page_id: parse_page_id(&cargo.page_id),
            page_name: cargo.page_name.clone(),
            categories: split_list(&cargo.category),
            company: cargo.company.trim().to_string(),
            description: cargo.description.clone(),
            website: cargo.website.clone(),
        }
    }
}

/// One catalog entity / 单个目录实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Page {
    Company(CompanyPage),
    Incident(IncidentPage),
    Product(ProductPage),
    ProductLine(ProductLinePage),
}

impl Page {
    pub fn page_id(&self) -> u64 {
        match self {
            Page::Company(p) => p.page_id,
            Page::Incident(p) => p.page_id,
            Page::Product(p) => p.page_id,
            Page::ProductLine(p) => p.page_id,
        }
    }

    pub fn page_name(&self) -> &str {
        match self {
            Page::Company(p) => &p.page_name,
            Page::Incident(p) => &p.page_name,
            Page::Product(p) => &p.page_name,
            Page::ProductLine(p) => &p.page_name,
        }
    }

    pub fn kind(&self) -> PageKind {
        match self {
            Page::Company(_) => PageKind::Company,
            Page::Incident(_) => PageKind::Incident,
            Page::Product(_) => PageKind::Product,
            Page::ProductLine(_) => PageKind::ProductLine,
        }
    }

    /// Category-like relational values: industries for companies, categories for
    /// products and product lines, nothing for incidents.
    /// 分类字段：公司为行业，产品/产品线为分类，事件为空
    pub fn categories(&self) -> &[String] {
        match self {
            Page::Company(p) => &p.industries,
            Page::Product(p) => &p.categories,
            Page::ProductLine(p) => &p.categories,
            Page::Incident(_) => &[],
        }
    }

    /// Fields scored against free page text, name first / 用于正文近似匹配的字段
    pub fn text_search_fields(&self) -> Vec<&str> {
        match self {
            Page::Company(p) => vec![p.page_name.as_str(), p.parent_company.as_str()],
            Page::Incident(p) => vec![p.page_name.as_str(), p.product_line.as_str(), p.product.as_str()],
            Page::Product(p) => vec![p.page_name.as_str(), p.product_line.as_str(), p.company.as_str()],
            Page::ProductLine(p) => vec![p.page_name.as_str(), p.company.as_str()],
        }
    }

    /// Wiki article URL / 维基页面地址
    pub fn url(&self) -> String {
        let title = self.page_name().trim().replace(' ', "_");
        format!("{}{}", WIKI_BASE_URL, urlencoding::encode(&title))
    }
}

/// PageID is a string in the export; unparsable ids fall back to 0 / 解析失败时为 0
fn parse_page_id(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

/// Split a comma separated cargo list / 拆分逗号分隔列表
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
