//! Filtered, sorted projections of the catalog.
//!
//! A projection is recomputed from scratch on every call; nothing is cached.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::domain::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Ascending by shop name.
    #[default]
    ShopName,
    /// Most recently created first; products without a timestamp sort last.
    CreatedAt,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::ShopName => f.write_str("shop"),
            SortKey::CreatedAt => f.write_str("recent"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shop" | "shopname" => Ok(SortKey::ShopName),
            "recent" | "createdat" => Ok(SortKey::CreatedAt),
            _ => Err(format!("Unknown sort key {:?} (expected shop or recent)", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    pub search: String,
    pub sort: SortKey,
}

impl ViewQuery {
    pub fn new(search: impl Into<String>, sort: SortKey) -> Self {
        Self { search: search.into(), sort }
    }
}

/// Products whose name contains `query.search` (case-insensitive), ordered by
/// `query.sort`. The sort is stable: ties keep their catalog order.
pub fn project(products: &[Product], query: &ViewQuery) -> Vec<Product> {
    let needle = query.search.to_lowercase();
    let mut visible: Vec<Product> = products
        .iter()
        .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    match query.sort {
        SortKey::ShopName => visible.sort_by(|a, b| compare_text(&a.shop_name, &b.shop_name)),
        // `None < Some(_)`, so reversing puts missing timestamps last.
        SortKey::CreatedAt => visible.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
    visible
}

/// Dictionary-style comparison: letters compare without regard to case first,
/// and case only breaks ties (lowercase first), so "apple" < "banana" < "Banana" < "cherry".
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}
