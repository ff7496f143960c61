//! # Pagination
//!
//! The list envelope: `count`, `_links` (`self`, `next`, `previous`) and
//! the mapped `results`.
//!
//! Navigation links carry the caller's filters first, then
//! `limit`/`offset`: `https://{domain}/api{path}?search=go&limit=25&offset=50`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::links::{LinkResponse, ResourcePath, API_PREFIX};

pub const LIMIT_DEFAULT: i64 = 25;
pub const OFFSET_DEFAULT: i64 = 0;
/// Upper bound of every `offset` query parameter (`i32` row counts)
pub const OFFSET_MAX: i64 = i32::MAX as i64;

fn default_limit() -> i64 {
    LIMIT_DEFAULT
}

// =====================================
// FromQueryParams
// =====================================
/// Query parameters that can drive a paginated listing
pub trait FromQueryParams {
    /// Encoded filters to carry across pages, without limit/offset.
    /// Empty when there are none.
    fn to_query_string(&self) -> String;

    fn limit(&self) -> i64;

    fn offset(&self) -> i64;
}

/// Encode `(key, value)` pairs in key order, skipping unset values.
fn encode_filters(mut pairs: Vec<(&str, Option<&str>)>) -> String {
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        if let Some(value) = value {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

// =====================================
// Query parameter shapes
// =====================================
/// `?limit=&offset=`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0, max = 2_147_483_647))]
    pub offset: i64,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            limit: LIMIT_DEFAULT,
            offset: OFFSET_DEFAULT,
        }
    }
}

impl FromQueryParams for PaginationQuery {
    fn to_query_string(&self) -> String {
        String::new()
    }

    fn limit(&self) -> i64 {
        self.limit
    }

    fn offset(&self) -> i64 {
        self.offset
    }
}

/// Language listing with optional full-text search
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LanguagesQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0, max = 2_147_483_647))]
    pub offset: i64,

    #[validate(
        length(min = 1, max = 50),
        custom(function = "crate::utils::validate_ext_alphanum")
    )]
    pub search: Option<String>,
}

impl FromQueryParams for LanguagesQuery {
    fn to_query_string(&self) -> String {
        encode_filters(vec![("search", self.search.as_deref())])
    }

    fn limit(&self) -> i64 {
        self.limit
    }

    fn offset(&self) -> i64 {
        self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesSort {
    /// Alphabetical
    Slug,
    /// Newest first
    Date,
}

impl SeriesSort {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Date => "date",
        }
    }
}

/// Series listing with search and ordering
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeriesQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,

    #[serde(default)]
    #[validate(range(min = 0, max = 2_147_483_647))]
    pub offset: i64,

    #[validate(length(min = 1, max = 100))]
    pub search: Option<String>,

    pub sort_by: Option<SeriesSort>,
}

impl FromQueryParams for SeriesQuery {
    fn to_query_string(&self) -> String {
        encode_filters(vec![
            ("search", self.search.as_deref()),
            ("sortBy", self.sort_by.as_ref().map(SeriesSort::as_str)),
        ])
    }

    fn limit(&self) -> i64 {
        self.limit
    }

    fn offset(&self) -> i64 {
        self.offset
    }
}

// =====================================
// Envelope
// =====================================
/// `self`, plus `next` and `previous` while there is a page that way
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginatedLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<LinkResponse>,

    #[serde(rename = "previous", skip_serializing_if = "Option::is_none")]
    pub prev: Option<LinkResponse>,
}

/// A page of `T` plus navigation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: i64,

    #[serde(rename = "_links")]
    pub links: PaginatedLinks,

    pub results: Vec<T>,
}

/// Navigation href; negative offsets are clamped to zero.
fn navigation_link(domain: &str, path: &ResourcePath, query: &str, limit: i64, offset: i64) -> LinkResponse {
    let offset = offset.max(0);

    let href = if query.is_empty() {
        format!("https://{}{}{}?limit={}&offset={}", domain, API_PREFIX, path, limit, offset)
    } else {
        format!("https://{}{}{}?{}&limit={}&offset={}", domain, API_PREFIX, path, query, limit, offset)
    };

    LinkResponse::new(href)
}

impl<T> PaginatedResponse<T> {
    /// Wrap `entities`, mapping each one in order.
    ///
    /// - `next` exists iff `offset + limit < count`
    /// - `previous` exists iff `offset - limit > 0`
    ///
    /// ```rust
    /// use kiwiscript_api::models::{PaginatedResponse, PaginationQuery, ResourcePath};
    ///
    /// let params = PaginationQuery { limit: 5, offset: 0 };
    /// let page = PaginatedResponse::new(
    ///     "kiwi.io", &ResourcePath::languages(), &params, 10, vec![1, 2], |n| n * 10,
    /// );
    /// assert_eq!(page.results, vec![10, 20]);
    /// assert_eq!(
    ///     page.links.next.unwrap().href,
    ///     "https://kiwi.io/api/v1/languages?limit=5&offset=5"
    /// );
    /// assert!(page.links.prev.is_none());
    /// ```
    pub fn new<Q, V, F>(
        domain: &str,
        path: &ResourcePath,
        params: &Q,
        count: i64,
        entities: Vec<V>,
        mapper: F,
    ) -> Self
    where
        Q: FromQueryParams + ?Sized,
        F: FnMut(V) -> T,
    {
        let results: Vec<T> = entities.into_iter().map(mapper).collect();

        let query = params.to_query_string();
        let limit = params.limit();
        let offset = params.offset();

        let self_link = navigation_link(domain, path, &query, limit, offset);

        // Huge offsets saturate and produce no navigation
        let next_offset = offset.saturating_add(limit);
        let next = (next_offset < count)
            .then(|| navigation_link(domain, path, &query, limit, next_offset));

        let prev_offset = offset.saturating_sub(limit);
        let prev = (prev_offset > 0)
            .then(|| navigation_link(domain, path, &query, limit, prev_offset));

        Self {
            count,
            links: PaginatedLinks { self_link, next, prev },
            results,
        }
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(limit: i64, offset: i64, count: i64) -> PaginatedResponse<i32> {
        PaginatedResponse::new(
            "kiwi.io",
            &ResourcePath::languages(),
            &PaginationQuery { limit, offset },
            count,
            Vec::<i32>::new(),
            |n| n,
        )
    }

    #[test]
    fn test_first_page() {
        let p = page(5, 0, 10);
        assert_eq!(
            p.links.self_link.href,
            "https://kiwi.io/api/v1/languages?limit=5&offset=0"
        );
        assert_eq!(
            p.links.next.map(|l| l.href),
            Some("https://kiwi.io/api/v1/languages?limit=5&offset=5".to_string())
        );
        assert!(p.links.prev.is_none());
    }

    #[test]
    fn test_second_of_two_pages_has_no_navigation() {
        let p = page(5, 5, 10);
        assert!(p.links.next.is_none());
        assert!(p.links.prev.is_none());
    }

    #[test]
    fn test_previous_link_uses_previous_offset() {
        let p = page(5, 12, 40);
        assert_eq!(
            p.links.prev.map(|l| l.href),
            Some("https://kiwi.io/api/v1/languages?limit=5&offset=7".to_string())
        );
    }

    #[test]
    fn test_empty_results_serialize_as_empty_array() {
        let json = serde_json::to_value(page(25, 0, 0)).unwrap();
        assert_eq!(json["results"], serde_json::json!([]));
        assert_eq!(json["count"], 0);
        assert!(json["_links"].get("next").is_none());
        assert!(json["_links"].get("previous").is_none());
    }

    #[test]
    fn test_filters_come_before_limit_and_offset() {
        let params = SeriesQuery {
            limit: 10,
            offset: 0,
            search: Some("async rust".to_string()),
            sort_by: Some(SeriesSort::Date),
        };
        let p = PaginatedResponse::new(
            "kiwi.io",
            &ResourcePath::language("rust").series_list(),
            &params,
            30,
            vec!["a"],
            str::to_uppercase,
        );

        assert_eq!(
            p.links.next.unwrap().href,
            "https://kiwi.io/api/v1/languages/rust/series?search=async+rust&sortBy=date&limit=10&offset=10"
        );
        assert_eq!(p.results, vec!["A".to_string()]);
    }

    #[test]
    fn test_unset_filters_are_skipped() {
        let params = LanguagesQuery { limit: 25, offset: 0, search: None };
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn test_huge_offset_is_rejected_by_validation() {
        use validator::Validate;

        assert!(PaginationQuery { limit: 100, offset: OFFSET_MAX }.validate().is_ok());
        assert!(PaginationQuery { limit: 100, offset: OFFSET_MAX + 1 }.validate().is_err());
        assert!(LanguagesQuery { limit: 25, offset: i64::MAX, search: None }.validate().is_err());
    }

    #[test]
    fn test_max_offset_does_not_overflow() {
        let p = page(100, i64::MAX, 10);
        assert!(p.links.next.is_none());
        assert_eq!(
            p.links.prev.map(|l| l.href),
            Some(format!("https://kiwi.io/api/v1/languages?limit=100&offset={}", i64::MAX - 100))
        );
    }

    #[test]
    fn test_query_defaults() {
        let params: PaginationQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(params.limit, LIMIT_DEFAULT);
        assert_eq!(params.offset, OFFSET_DEFAULT);
    }
}
