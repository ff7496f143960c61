//! # Sections
//!
//! Ordered chapters of a series. The detail view embeds a summary of the
//! section's lessons; list views do not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::links::{LinkResponse, ResourcePath, SelfLinkResponse};
use super::records::{Lesson, Section};

// =====================================
// Path params
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SectionPathParams {
    #[validate(length(min = 2, max = 50), custom(function = "crate::utils::validate_slug"))]
    pub language_slug: String,

    #[validate(length(min = 2, max = 100), custom(function = "crate::utils::validate_slug"))]
    pub series_slug: String,

    #[serde(rename = "sectionID")]
    #[validate(range(min = 1))]
    pub section_id: i32,
}

impl SectionPathParams {
    #[must_use]
    pub fn path(&self) -> ResourcePath {
        ResourcePath::language(&self.language_slug)
            .series(&self.series_slug)
            .section(self.section_id)
    }
}

// =====================================
// Bodies
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSectionBody {
    #[validate(length(min = 2, max = 250))]
    pub title: String,

    #[validate(length(min = 2))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSectionBody {
    #[validate(length(min = 2, max = 250))]
    pub title: String,

    #[validate(length(min = 2))]
    pub description: String,

    #[validate(range(min = 1))]
    pub position: i16,
}

// =====================================
// Responses
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub series: LinkResponse,
    pub lessons: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLessonEmbedded {
    pub id: i32,
    pub title: String,
    pub position: i16,
    pub watch_time: i32,
    pub read_time: i32,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEmbedded {
    pub lessons: Vec<SectionLessonEmbedded>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub position: i16,
    pub completed_lessons: i16,
    pub total_lessons: i16,
    pub is_completed: bool,
    pub read_time: i32,
    pub watch_time: i32,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<SectionEmbedded>,
    #[serde(rename = "_links")]
    pub links: SectionLinks,
}

impl SectionResponse {
    #[must_use]
    pub fn from_record(domain: &str, section: &Section) -> Self {
        let path = section.path();

        Self {
            id: section.id,
            title: section.title.clone(),
            description: section.description.clone(),
            position: section.position,
            completed_lessons: section.completed_lessons,
            total_lessons: section.total_lessons,
            is_completed: section.is_completed,
            read_time: section.read_time_seconds,
            watch_time: section.watch_time_seconds,
            is_published: section.is_published,
            viewed_at: section.viewed_at,
            embedded: None,
            links: SectionLinks {
                self_link: path.link(domain),
                series: ResourcePath::language(&section.language_slug)
                    .series(&section.series_slug)
                    .link(domain),
                lessons: path.lessons().link(domain),
            },
        }
    }

    /// Detail view: the section plus its lessons, in the given order.
    #[must_use]
    pub fn with_lessons(domain: &str, section: &Section, lessons: &[Lesson]) -> Self {
        let lessons = lessons
            .iter()
            .map(|lesson| SectionLessonEmbedded {
                id: lesson.id,
                title: lesson.title.clone(),
                position: lesson.position,
                watch_time: lesson.watch_time_seconds,
                read_time: lesson.read_time_seconds,
                links: SelfLinkResponse::new(lesson.path().link(domain)),
            })
            .collect();

        Self {
            embedded: Some(SectionEmbedded { lessons }),
            ..Self::from_record(domain, section)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn section() -> Section {
        Section {
            id: 4,
            title: "Borrowing".to_string(),
            description: "References".to_string(),
            language_slug: "rust".to_string(),
            series_slug: "ownership".to_string(),
            position: 1,
            total_lessons: 1,
            completed_lessons: 0,
            is_completed: false,
            watch_time_seconds: 0,
            read_time_seconds: 30,
            is_published: true,
            viewed_at: None,
        }
    }

    #[test]
    fn test_list_view_has_no_embed() {
        let json = serde_json::to_value(SectionResponse::from_record("kiwi.io", &section())).unwrap();
        assert!(json.get("_embedded").is_none());
        assert_eq!(
            json["_links"]["lessons"]["href"],
            "https://kiwi.io/api/v1/languages/rust/series/ownership/sections/4/lessons"
        );
    }

    #[test]
    fn test_detail_view_embeds_lessons() {
        let lesson = Lesson {
            id: 11,
            title: "Shared references".to_string(),
            language_slug: "rust".to_string(),
            series_slug: "ownership".to_string(),
            section_id: 4,
            position: 1,
            watch_time_seconds: 0,
            read_time_seconds: 30,
            is_published: true,
            is_completed: false,
        };

        let json = serde_json::to_value(SectionResponse::with_lessons("kiwi.io", &section(), &[lesson])).unwrap();
        assert_eq!(
            json["_embedded"]["lessons"][0],
            serde_json::json!({
                "id": 11,
                "title": "Shared references",
                "position": 1,
                "watchTime": 0,
                "readTime": 30,
                "_links": {
                    "self": { "href": "https://kiwi.io/api/v1/languages/rust/series/ownership/sections/4/lessons/11" }
                }
            })
        );
    }

    #[test]
    fn test_detail_view_with_no_lessons_keeps_empty_list() {
        let response = SectionResponse::with_lessons("kiwi.io", &section(), &[]);
        assert_eq!(response.embedded, Some(SectionEmbedded { lessons: vec![] }));
    }
}
