//! Pagination and whitelisted filtering.
//!
//! List operations accept a raw string filter map from the transport
//! layer. Only keys present in the entity's static whitelist are turned
//! into query clauses; everything else is dropped before it can reach
//! the query layer. Pagination is 1-based, with the total counted before
//! offset/limit are applied.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Page size used when the caller supplies none (or a non-positive one)
/// and the service has no override configured.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// A normalized page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Normalize raw transport values: `page < 1` becomes 1 and
    /// `page_size < 1` becomes `default_page_size`.
    pub fn new(page: i64, page_size: i64, default_page_size: u32) -> Self {
        let page = if page < 1 { 1 } else { page as u32 };
        let page_size = if page_size < 1 {
            default_page_size
        } else {
            page_size as u32
        };
        Self { page, page_size }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination metadata returned alongside every page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

impl PageInfo {
    pub fn new(request: PageRequest, total_items: u64) -> Self {
        let total_pages = if request.page_size == 0 {
            0
        } else {
            total_items.div_ceil(u64::from(request.page_size))
        };
        Self {
            page: request.page,
            page_size: request.page_size,
            total_items,
            total_pages,
        }
    }
}

/// A counted page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
}

impl<T> Paginated<T> {
    /// Convert the items while keeping the page metadata, e.g. entity
    /// to outbound DTO.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
        }
    }
}

/// How a whitelisted filter key matches its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matching {
    /// Case-insensitive substring match.
    Contains,
    /// Exact string equality.
    Exact,
    /// Boolean equality; non-boolean values are dropped.
    Flag,
}

/// One entry of an entity's filter whitelist: the externally visible
/// key, the column it maps to, and the matching mode.
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub key: &'static str,
    pub column: &'static str,
    pub matching: Matching,
}

/// A resolved filter, safe to hand to the query layer: the column name
/// comes from the static whitelist, never from the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    Contains { column: &'static str, value: String },
    Exact { column: &'static str, value: String },
    Flag { column: &'static str, value: bool },
}

/// Resolve a raw filter map against a whitelist. Unknown keys are
/// ignored; so are `Flag` values that do not parse as booleans.
/// Clauses come out in whitelist order, so generated queries are
/// deterministic.
pub fn resolve_filters(
    filters: &HashMap<String, String>,
    whitelist: &[FilterField],
) -> Vec<FilterClause> {
    let mut clauses = Vec::new();
    for field in whitelist {
        let Some(raw) = filters.get(field.key) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        match field.matching {
            Matching::Contains => clauses.push(FilterClause::Contains {
                column: field.column,
                value: raw.clone(),
            }),
            Matching::Exact => clauses.push(FilterClause::Exact {
                column: field.column,
                value: raw.clone(),
            }),
            Matching::Flag => match raw.as_str() {
                "true" | "1" => clauses.push(FilterClause::Flag {
                    column: field.column,
                    value: true,
                }),
                "false" | "0" => clauses.push(FilterClause::Flag {
                    column: field.column,
                    value: false,
                }),
                _ => {}
            },
        }
    }
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITELIST: &[FilterField] = &[
        FilterField {
            key: "name",
            column: "name",
            matching: Matching::Contains,
        },
        FilterField {
            key: "tax_id",
            column: "tax_id",
            matching: Matching::Exact,
        },
        FilterField {
            key: "enabled",
            column: "enabled",
            matching: Matching::Flag,
        },
    ];

    #[test]
    fn page_and_page_size_are_normalized() {
        let req = PageRequest::new(0, -3, 50);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, 50);

        let req = PageRequest::new(4, 10, 50);
        assert_eq!(req.offset(), 30);
        assert_eq!(req.limit(), 10);
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        let info = PageInfo::new(PageRequest::new(1, 10, 50), 25);
        assert_eq!(info.total_pages, 3);

        let info = PageInfo::new(PageRequest::new(1, 10, 50), 30);
        assert_eq!(info.total_pages, 3);

        let info = PageInfo::new(PageRequest::new(1, 10, 50), 0);
        assert_eq!(info.total_pages, 0);
    }

    #[test]
    fn zero_page_size_yields_zero_pages() {
        let req = PageRequest { page: 1, page_size: 0 };
        let info = PageInfo::new(req, 25);
        assert_eq!(info.total_pages, 0);
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let mut filters = HashMap::new();
        filters.insert("name".to_string(), "acme".to_string());
        filters.insert("deleted_at".to_string(), "NONE".to_string());
        filters.insert("; DROP TABLE".to_string(), "x".to_string());

        let clauses = resolve_filters(&filters, WHITELIST);
        assert_eq!(
            clauses,
            vec![FilterClause::Contains {
                column: "name",
                value: "acme".into()
            }]
        );
    }

    #[test]
    fn flag_values_must_parse() {
        let mut filters = HashMap::new();
        filters.insert("enabled".to_string(), "yes".to_string());
        assert!(resolve_filters(&filters, WHITELIST).is_empty());

        filters.insert("enabled".to_string(), "true".to_string());
        assert_eq!(
            resolve_filters(&filters, WHITELIST),
            vec![FilterClause::Flag {
                column: "enabled",
                value: true
            }]
        );
    }
}
