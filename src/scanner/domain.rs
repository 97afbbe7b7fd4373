//! Registrable domain helpers / 可注册域名工具
//!
//! Scanners match sites by the registrable domain without its public suffix:
//! `www.google.co.uk` → `google`, `search.brave.com` → `brave`.

use std::net::IpAddr;

use url::Url;

/// Registrable domain without suffix for a host name / 获取主机名的主域名（不含后缀）
///
/// Suffixes come from the public suffix list, private entries included.
/// Returns `None` for IP addresses, empty hosts and bare suffixes. A single
/// label host such as `localhost` is returned as is.
pub fn main_domain(host: &str) -> Option<String> {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    if host.is_empty() {
        return None;
    }
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if bare.parse::<IpAddr>().is_ok() {
        return None;
    }
    if !host.contains('.') {
        return Some(host);
    }

    let domain = psl::domain_str(&host)?;
    let suffix = psl::suffix_str(domain)?;
    domain
        .strip_suffix(suffix)?
        .strip_suffix('.')
        .filter(|label| !label.is_empty())
        .map(str::to_string)
}

/// Registrable domain without suffix for a full URL / 获取 URL 的主域名
pub fn main_domain_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    main_domain(parsed.host_str()?)
}
