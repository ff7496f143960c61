//! # Lessons
//!
//! A lesson may carry an article (read time), a video (watch time) and
//! downloadable files. Its links advertise the article and video only when
//! the matching time is non-zero; the detail view embeds whatever exists.
//!
//! ```text
//! /v1/languages/:languageSlug/series/:seriesSlug/sections/:sectionID/lessons/:lessonID
//!     /article
//!     /video
//!     /files/:fileID
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::links::{LinkResponse, ResourcePath, SelfLinkResponse};
use super::records::{
    Certificate, Lesson, LessonArticle, LessonDetail, LessonFile, LessonLocation, LessonVideo,
};

// =====================================
// Path params
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LessonPathParams {
    #[validate(length(min = 2, max = 50), custom(function = "crate::utils::validate_slug"))]
    pub language_slug: String,

    #[validate(length(min = 2, max = 100), custom(function = "crate::utils::validate_slug"))]
    pub series_slug: String,

    #[serde(rename = "sectionID")]
    #[validate(range(min = 1))]
    pub section_id: i32,

    #[serde(rename = "lessonID")]
    #[validate(range(min = 1))]
    pub lesson_id: i32,
}

impl LessonPathParams {
    #[must_use]
    pub fn location(&self) -> LessonLocation {
        LessonLocation {
            language_slug: self.language_slug.clone(),
            series_slug: self.series_slug.clone(),
            section_id: self.section_id,
            lesson_id: self.lesson_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LessonFilePathParams {
    #[validate(length(min = 2, max = 50), custom(function = "crate::utils::validate_slug"))]
    pub language_slug: String,

    #[validate(length(min = 2, max = 100), custom(function = "crate::utils::validate_slug"))]
    pub series_slug: String,

    #[serde(rename = "sectionID")]
    #[validate(range(min = 1))]
    pub section_id: i32,

    #[serde(rename = "lessonID")]
    #[validate(range(min = 1))]
    pub lesson_id: i32,

    /// Parsing into `Uuid` is the format check
    #[serde(rename = "fileID")]
    pub file_id: Uuid,
}

impl LessonFilePathParams {
    #[must_use]
    pub fn location(&self) -> LessonLocation {
        LessonLocation {
            language_slug: self.language_slug.clone(),
            series_slug: self.series_slug.clone(),
            section_id: self.section_id,
            lesson_id: self.lesson_id,
        }
    }
}

// =====================================
// Bodies
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLessonBody {
    #[validate(length(min = 2, max = 250))]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateLessonBody {
    #[validate(length(min = 2, max = 250))]
    pub title: String,

    #[validate(range(min = 1))]
    pub position: i16,
}

/// Markdown body of a lesson
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LessonArticleBody {
    #[validate(length(min = 1))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LessonVideoBody {
    #[validate(url)]
    pub url: String,

    /// Seconds
    #[validate(range(min = 1))]
    pub watch_time: i32,
}

/// Display name of an uploaded file; also the multipart `name` field
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LessonFileBody {
    #[validate(length(min = 2, max = 250), custom(function = "crate::utils::validate_ext_alphanum"))]
    pub name: String,
}

// =====================================
// Lesson response
// =====================================
/// `_links` of a lesson.
///
/// Content links only appear once the content exists: `article` when the
/// lesson has reading time, `video` when it has watch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    /// Parent section
    pub section: LinkResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<LinkResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<LinkResponse>,
    /// Set on completion responses that issued or found a certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<LinkResponse>,
}

impl LessonLinks {
    fn new(domain: &str, lesson: &Lesson, certificate_id: Option<Uuid>) -> Self {
        let path = lesson.path();
        let section = ResourcePath::language(&lesson.language_slug)
            .series(&lesson.series_slug)
            .section(lesson.section_id);

        Self {
            self_link: path.link(domain),
            section: section.link(domain),
            article: (lesson.read_time_seconds > 0).then(|| path.clone().article().link(domain)),
            video: (lesson.watch_time_seconds > 0).then(|| path.clone().video().link(domain)),
            certificate: certificate_id.map(|id| ResourcePath::certificate(id).link(domain)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonArticleEmbedded {
    pub id: i32,
    pub content: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonVideoEmbedded {
    pub id: i32,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonFileEmbedded {
    pub id: Uuid,
    pub name: String,
    pub ext: String,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCertificateEmbedded {
    pub id: Uuid,
    pub series_title: String,
    pub lessons: i16,
    pub watch_time: i32,
    pub read_time: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

impl LessonCertificateEmbedded {
    fn new(domain: &str, certificate: &Certificate) -> Self {
        Self {
            id: certificate.id,
            series_title: certificate.series_title.clone(),
            lessons: certificate.lessons,
            watch_time: certificate.watch_time_seconds,
            read_time: certificate.read_time_seconds,
            completed_at: certificate.completed_at,
            links: SelfLinkResponse::new(ResourcePath::certificate(certificate.id).link(domain)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonEmbedded {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<LessonArticleEmbedded>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<LessonVideoEmbedded>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<LessonFileEmbedded>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<LessonCertificateEmbedded>,
}

impl LessonEmbedded {
    /// `None` when there is nothing to embed.
    fn collapse(self) -> Option<Self> {
        let empty = self.article.is_none()
            && self.video.is_none()
            && self.files.is_none()
            && self.certificate.is_none();

        (!empty).then_some(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    pub id: i32,
    pub title: String,
    pub position: i16,
    pub is_completed: bool,
    pub is_published: bool,
    pub watch_time: i32,
    pub read_time: i32,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<LessonEmbedded>,
    #[serde(rename = "_links")]
    pub links: LessonLinks,
}

impl LessonResponse {
    /// List view: scalars and links only.
    #[must_use]
    pub fn from_record(domain: &str, lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            position: lesson.position,
            is_completed: lesson.is_completed,
            is_published: lesson.is_published,
            watch_time: lesson.watch_time_seconds,
            read_time: lesson.read_time_seconds,
            embedded: None,
            links: LessonLinks::new(domain, lesson, None),
        }
    }

    /// Detail view. Files are embedded only when `file_urls` resolves them;
    /// the embed disappears when article, video and files are all absent.
    #[must_use]
    pub fn with_embeds(domain: &str, detail: &LessonDetail, file_urls: &HashMap<Uuid, String>) -> Self {
        let lesson = &detail.lesson;
        let path = lesson.path();

        let article = detail.article.as_ref().map(|article| LessonArticleEmbedded {
            id: article.id,
            content: article.content.clone(),
            links: SelfLinkResponse::new(path.clone().article().link(domain)),
        });

        let video = detail.video.as_ref().map(|video| LessonVideoEmbedded {
            id: video.id,
            url: video.url.clone(),
            links: SelfLinkResponse::new(path.clone().video().link(domain)),
        });

        let files: Vec<LessonFileEmbedded> = detail
            .files
            .iter()
            .filter_map(|file| {
                file_urls.get(&file.id).map(|url| LessonFileEmbedded {
                    id: file.id,
                    name: file.name.clone(),
                    ext: file.ext.clone(),
                    url: url.clone(),
                    links: SelfLinkResponse::new(path.clone().file(file.id).link(domain)),
                })
            })
            .collect();

        let embedded = LessonEmbedded {
            article,
            video,
            files: (!files.is_empty()).then_some(files),
            certificate: None,
        };

        Self {
            embedded: embedded.collapse(),
            ..Self::from_record(domain, lesson)
        }
    }

    /// Response to completing a lesson: links and embeds the certificate
    /// earned by finishing its series, if any.
    #[must_use]
    pub fn with_certificate(domain: &str, lesson: &Lesson, certificate: Option<&Certificate>) -> Self {
        let embedded = LessonEmbedded {
            article: None,
            video: None,
            files: None,
            certificate: certificate.map(|c| LessonCertificateEmbedded::new(domain, c)),
        };

        Self {
            embedded: embedded.collapse(),
            links: LessonLinks::new(domain, lesson, certificate.map(|c| c.id)),
            ..Self::from_record(domain, lesson)
        }
    }
}

// =====================================
// Lesson article
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContentLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub lesson: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonArticleResponse {
    pub id: i32,
    pub content: String,
    pub read_time: i32,
    #[serde(rename = "_links")]
    pub links: LessonContentLinks,
}

impl LessonArticleResponse {
    #[must_use]
    pub fn from_record(domain: &str, location: &LessonLocation, article: &LessonArticle) -> Self {
        let lesson = location.path();

        Self {
            id: article.id,
            content: article.content.clone(),
            read_time: article.read_time_seconds,
            links: LessonContentLinks {
                self_link: lesson.clone().article().link(domain),
                lesson: lesson.link(domain),
            },
        }
    }
}

// =====================================
// Lesson video
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonVideoResponse {
    pub id: i32,
    pub url: String,
    pub watch_time: i32,
    #[serde(rename = "_links")]
    pub links: LessonContentLinks,
}

impl LessonVideoResponse {
    #[must_use]
    pub fn from_record(domain: &str, location: &LessonLocation, video: &LessonVideo) -> Self {
        let lesson = location.path();

        Self {
            id: video.id,
            url: video.url.clone(),
            watch_time: video.watch_time_seconds,
            links: LessonContentLinks {
                self_link: lesson.clone().video().link(domain),
                lesson: lesson.link(domain),
            },
        }
    }
}

// =====================================
// Lesson files
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonFileLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub lesson_files: LinkResponse,
    pub lesson: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonFileResponse {
    pub id: Uuid,
    pub name: String,
    pub ext: String,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: LessonFileLinks,
}

impl LessonFileResponse {
    #[must_use]
    pub fn from_record(domain: &str, location: &LessonLocation, file: &LessonFile, url: &str) -> Self {
        let lesson = location.path();

        Self {
            id: file.id,
            name: file.name.clone(),
            ext: file.ext.clone(),
            url: url.to_string(),
            links: LessonFileLinks {
                self_link: lesson.clone().file(file.id).link(domain),
                lesson_files: lesson.clone().files().link(domain),
                lesson: lesson.link(domain),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lesson(read: i32, watch: i32) -> Lesson {
        Lesson {
            id: 7,
            title: "Traits".to_string(),
            language_slug: "rust".to_string(),
            series_slug: "basics".to_string(),
            section_id: 2,
            position: 3,
            watch_time_seconds: watch,
            read_time_seconds: read,
            is_published: true,
            is_completed: false,
        }
    }

    fn detail(lesson: Lesson) -> LessonDetail {
        LessonDetail { lesson, article: None, video: None, files: vec![] }
    }

    const LESSON_HREF: &str = "https://kiwi.io/api/v1/languages/rust/series/basics/sections/2/lessons/7";

    #[test]
    fn test_content_links_follow_times() {
        let none = LessonResponse::from_record("kiwi.io", &lesson(0, 0));
        assert!(none.links.article.is_none());
        assert!(none.links.video.is_none());

        let both = LessonResponse::from_record("kiwi.io", &lesson(30, 90));
        assert_eq!(both.links.article.unwrap().href, format!("{LESSON_HREF}/article"));
        assert_eq!(both.links.video.unwrap().href, format!("{LESSON_HREF}/video"));
    }

    #[test]
    fn test_detail_without_content_has_no_embedded_key() {
        let response = LessonResponse::with_embeds("kiwi.io", &detail(lesson(0, 0)), &HashMap::new());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("_embedded").is_none());
    }

    #[test]
    fn test_files_without_url_are_skipped() {
        let mut d = detail(lesson(0, 0));
        let resolved = Uuid::new_v4();
        d.files = vec![
            LessonFile { id: resolved, lesson_id: 7, name: "notes".to_string(), ext: "pdf".to_string() },
            LessonFile { id: Uuid::new_v4(), lesson_id: 7, name: "gone".to_string(), ext: "zip".to_string() },
        ];
        let urls = HashMap::from([(resolved, "https://objects/notes.pdf".to_string())]);

        let response = LessonResponse::with_embeds("kiwi.io", &d, &urls);
        let files = response.embedded.and_then(|e| e.files).expect("files embed");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].links.self_link.href, format!("{LESSON_HREF}/files/{resolved}"));
    }

    #[test]
    fn test_all_files_unresolved_collapses_embed() {
        let mut d = detail(lesson(0, 0));
        d.files = vec![LessonFile { id: Uuid::new_v4(), lesson_id: 7, name: "x".to_string(), ext: "txt".to_string() }];

        let response = LessonResponse::with_embeds("kiwi.io", &d, &HashMap::new());
        assert!(response.embedded.is_none());
    }

    #[test]
    fn test_article_embed_and_times_in_detail_view() {
        let mut d = detail(lesson(45, 0));
        d.article = Some(LessonArticle { id: 3, lesson_id: 7, content: "# Traits".to_string(), read_time_seconds: 45 });

        let json = serde_json::to_value(LessonResponse::with_embeds("kiwi.io", &d, &HashMap::new())).unwrap();
        assert_eq!(json["readTime"], 45);
        assert_eq!(
            json["_embedded"],
            serde_json::json!({
                "article": {
                    "id": 3,
                    "content": "# Traits",
                    "_links": { "self": { "href": format!("{LESSON_HREF}/article") } }
                }
            })
        );
    }

    #[test]
    fn test_certificate_is_linked_and_embedded() {
        let certificate = Certificate {
            id: Uuid::new_v4(),
            user_id: 1,
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            language_id: 1,
            language_name: "Rust".to_string(),
            language_slug: "rust".to_string(),
            series_title: "Basics".to_string(),
            series_slug: "basics".to_string(),
            lessons: 12,
            watch_time_seconds: 100,
            read_time_seconds: 200,
            completed_at: None,
        };

        let response = LessonResponse::with_certificate("kiwi.io", &lesson(1, 0), Some(&certificate));
        let href = format!("https://kiwi.io/api/v1/certificates/{}", certificate.id);
        assert_eq!(response.links.certificate.map(|l| l.href), Some(href.clone()));
        let embedded = response.embedded.and_then(|e| e.certificate).expect("certificate embed");
        assert_eq!(embedded.links.self_link.href, href);

        let without = LessonResponse::with_certificate("kiwi.io", &lesson(1, 0), None);
        assert!(without.embedded.is_none());
        assert!(without.links.certificate.is_none());
    }

    #[test]
    fn test_file_response_links() {
        let location = lesson(0, 0).location();
        let file = LessonFile { id: Uuid::nil(), lesson_id: 7, name: "notes".to_string(), ext: "pdf".to_string() };
        let json = serde_json::to_value(LessonFileResponse::from_record("kiwi.io", &location, &file, "u")).unwrap();

        assert_eq!(json["_links"]["lessonFiles"]["href"], format!("{LESSON_HREF}/files"));
        assert_eq!(json["_links"]["lesson"]["href"], LESSON_HREF);
    }
}
