use reqwest::Url;

use crate::models::CATEGORIES;

const BASE: &str = "jobboard:/jobs";

/// Reads the `category` parameter from an incoming link.
///
/// Accepts a full URL (`https://host/jobs?category=Design`), a route path
/// (`/jobs?category=Design`), a bare query (`?category=Design`) or just
/// `category=Design`. Empty values count as absent.
pub fn category_param(link: &str) -> Option<String> {
    let link = link.trim();
    let url = match Url::parse(link) {
        Ok(url) => url,
        Err(_) => {
            let base = Url::parse(BASE).ok()?;
            if link.starts_with('/') || link.contains('?') {
                base.join(link).ok()?
            } else {
                let mut url = base;
                url.set_query(Some(link));
                url
            }
        }
    };

    url.query_pairs()
        .find(|(key, _)| key == "category")
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Maps a linked category onto the known set, ignoring case.
///
/// Unknown values are returned as-is so the page shows the empty state the
/// link asked for; the nearest known category is logged to help spot typos.
pub fn resolve_category(raw: &str) -> String {
    if let Some(known) = CATEGORIES.iter().find(|c| c.eq_ignore_ascii_case(raw)) {
        return known.to_string();
    }

    match nearest_category(raw) {
        Some(suggestion) => tracing::warn!(category = raw, suggestion, "unknown category in link"),
        None => tracing::warn!(category = raw, "unknown category in link"),
    }
    raw.to_string()
}

/// Closest known category by Jaro-Winkler similarity, if it is close enough.
pub fn nearest_category(raw: &str) -> Option<&'static str> {
    let raw = raw.to_lowercase();
    CATEGORIES
        .into_iter()
        .map(|c| (c, strsim::jaro_winkler(&c.to_lowercase(), &raw)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .filter(|(_, score)| *score > 0.8)
        .map(|(c, _)| c)
}

/// The category a page should be seeded with, if the link carries one.
pub fn seed_category(link: Option<&str>) -> Option<String> {
    link.and_then(category_param).map(|raw| resolve_category(&raw))
}
