//! # Series
//!
//! A course inside a language. Always embeds its author; embeds and
//! links its picture only when one exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::links::{LinkResponse, ResourcePath, SelfLinkResponse};
use super::records::{Author, Picture, Series};

// =====================================
// Path params
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPathParams {
    #[validate(length(min = 2, max = 50), custom(function = "crate::utils::validate_slug"))]
    pub language_slug: String,

    #[validate(length(min = 2, max = 100), custom(function = "crate::utils::validate_slug"))]
    pub series_slug: String,
}

impl SeriesPathParams {
    #[must_use]
    pub fn path(&self) -> ResourcePath {
        ResourcePath::language(&self.language_slug).series(&self.series_slug)
    }
}

// =====================================
// Bodies
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSeriesBody {
    #[validate(length(min = 2, max = 100))]
    pub title: String,

    #[validate(length(min = 2))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSeriesBody {
    #[validate(length(min = 2, max = 100))]
    pub title: String,

    #[validate(length(min = 2))]
    pub description: String,

    #[validate(range(min = 1))]
    pub position: i16,
}

/// Shared by series, sections and lessons
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IsPublishedBody {
    pub is_published: bool,
}

// =====================================
// Responses
// =====================================
/// `_links` of a series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    /// Public user view of the author
    pub author: LinkResponse,
    pub language: LinkResponse,
    pub sections: LinkResponse,
    /// Only when a cover picture was uploaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<LinkResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesAuthorEmbedded {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

impl SeriesAuthorEmbedded {
    fn new(domain: &str, author: &Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            links: SelfLinkResponse::new(ResourcePath::user(author.id).link(domain)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPictureEmbedded {
    pub id: Uuid,
    pub ext: String,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesEmbedded {
    pub author: SeriesAuthorEmbedded,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<SeriesPictureEmbedded>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesResponse {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub completed_sections: i16,
    pub total_sections: i16,
    pub completed_lessons: i16,
    pub total_lessons: i16,
    pub watch_time: i32,
    pub read_time: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewed_at: Option<DateTime<Utc>>,
    pub is_published: bool,
    #[serde(rename = "_embedded")]
    pub embedded: SeriesEmbedded,
    #[serde(rename = "_links")]
    pub links: SeriesLinks,
}

impl SeriesResponse {
    /// `picture_url` is the resolved storage URL of `series.picture`; the
    /// picture is embedded and linked only when both are present.
    #[must_use]
    pub fn from_record(domain: &str, series: &Series, picture_url: Option<&str>) -> Self {
        let path = series.path();

        let picture = series
            .picture
            .as_ref()
            .zip(picture_url)
            .map(|(picture, url)| SeriesPictureEmbedded {
                id: picture.id,
                ext: picture.ext.clone(),
                url: url.to_string(),
                links: SelfLinkResponse::new(path.clone().picture().link(domain)),
            });

        Self {
            id: series.id,
            title: series.title.clone(),
            slug: series.slug.clone(),
            description: series.description.clone(),
            completed_sections: series.completed_sections,
            total_sections: series.total_sections,
            completed_lessons: series.completed_lessons,
            total_lessons: series.total_lessons,
            watch_time: series.watch_time_seconds,
            read_time: series.read_time_seconds,
            viewed_at: series.viewed_at,
            is_published: series.is_published,
            links: SeriesLinks {
                self_link: path.link(domain),
                author: ResourcePath::user(series.author.id).link(domain),
                language: ResourcePath::language(&series.language_slug).link(domain),
                sections: path.clone().sections().link(domain),
                picture: picture.as_ref().map(|_| path.clone().picture().link(domain)),
            },
            embedded: SeriesEmbedded {
                author: SeriesAuthorEmbedded::new(domain, &series.author),
                picture,
            },
        }
    }
}

// =====================================
// Series picture
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPictureLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub series: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPictureResponse {
    pub id: Uuid,
    pub ext: String,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: SeriesPictureLinks,
}

impl SeriesPictureResponse {
    #[must_use]
    pub fn from_record(domain: &str, series_path: &ResourcePath, picture: &Picture, url: &str) -> Self {
        Self {
            id: picture.id,
            ext: picture.ext.clone(),
            url: url.to_string(),
            links: SeriesPictureLinks {
                self_link: series_path.clone().picture().link(domain),
                series: series_path.link(domain),
            },
        }
    }
}
