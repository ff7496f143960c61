//! # Languages
//!
//! Top of the catalog tree: `/v1/languages/:languageSlug`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::links::{LinkResponse, ResourcePath};
use super::records::Language;

// =====================================
// Path params
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LanguagePathParams {
    #[validate(length(min = 2, max = 50), custom(function = "crate::utils::validate_slug"))]
    pub language_slug: String,
}

// =====================================
// Bodies
// =====================================
/// Create or replace a language
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LanguageBody {
    #[validate(length(min = 2, max = 50), custom(function = "crate::utils::validate_ext_alphanum"))]
    pub name: String,

    #[validate(custom(function = "crate::utils::validate_svg"))]
    pub icon: String,
}

// =====================================
// Responses
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub series: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub icon: String,
    pub completed_series: i16,
    pub total_series: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
    #[serde(rename = "_links")]
    pub links: LanguageLinks,
}

impl LanguageResponse {
    #[must_use]
    pub fn from_record(domain: &str, language: &Language) -> Self {
        let path = ResourcePath::language(&language.slug);

        Self {
            id: language.id,
            name: language.name.clone(),
            slug: language.slug.clone(),
            icon: language.icon.clone(),
            completed_series: language.completed_series,
            total_series: language.total_series,
            viewed_at: language.viewed_at,
            links: LanguageLinks {
                self_link: path.link(domain),
                series: path.series_list().link(domain),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_language_json_shape() {
        let language = Language {
            id: 1,
            name: "Rust".to_string(),
            slug: "rust".to_string(),
            icon: "<svg/>".to_string(),
            total_series: 3,
            completed_series: 0,
            viewed_at: None,
        };

        let json = serde_json::to_value(LanguageResponse::from_record("kiwi.io", &language)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "name": "Rust",
                "slug": "rust",
                "icon": "<svg/>",
                "completedSeries": 0,
                "totalSeries": 3,
                "_links": {
                    "self": { "href": "https://kiwi.io/api/v1/languages/rust" },
                    "series": { "href": "https://kiwi.io/api/v1/languages/rust/series" }
                }
            })
        );
    }

    #[test]
    fn test_language_body_rules() {
        let ok = LanguageBody { name: "C++".to_string(), icon: "<svg></svg>".to_string() };
        assert!(ok.validate().is_ok());

        let bad = LanguageBody { name: "C".to_string(), icon: "<img/>".to_string() };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("icon"));
    }
}
