//! # Domain Records
//!
//! Rows as the catalog and account services hand them over: already
//! joined, carrying the parent slugs and ids a representation needs to
//! build its links, plus the per-user progress columns when a user is
//! known (zero / `None` otherwise).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::links::ResourcePath;

// =====================================
// Catalog
// =====================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub id: i32,
    pub name: String,
    pub slug: String,
    /// Inline SVG markup
    pub icon: String,
    pub total_series: i16,
    pub completed_series: i16,
    pub viewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// Picture metadata; the URL comes from file storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    pub id: Uuid,
    pub ext: String,
}

/// File storage key of something a catalog deletion removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: Uuid,
    pub ext: String,
}

impl From<&Picture> for StoredObject {
    fn from(picture: &Picture) -> Self {
        Self { id: picture.id, ext: picture.ext.clone() }
    }
}

impl From<&LessonFile> for StoredObject {
    fn from(file: &LessonFile) -> Self {
        Self { id: file.id, ext: file.ext.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub language_slug: String,
    pub total_sections: i16,
    pub completed_sections: i16,
    pub total_lessons: i16,
    pub completed_lessons: i16,
    pub watch_time_seconds: i32,
    pub read_time_seconds: i32,
    pub is_published: bool,
    pub viewed_at: Option<DateTime<Utc>>,
    pub author: Author,
    pub picture: Option<Picture>,
}

impl Series {
    #[must_use]
    pub fn path(&self) -> ResourcePath {
        ResourcePath::language(&self.language_slug).series(&self.slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub language_slug: String,
    pub series_slug: String,
    pub position: i16,
    pub total_lessons: i16,
    pub completed_lessons: i16,
    pub is_completed: bool,
    pub watch_time_seconds: i32,
    pub read_time_seconds: i32,
    pub is_published: bool,
    pub viewed_at: Option<DateTime<Utc>>,
}

impl Section {
    #[must_use]
    pub fn path(&self) -> ResourcePath {
        ResourcePath::language(&self.language_slug)
            .series(&self.series_slug)
            .section(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i32,
    pub title: String,
    pub language_slug: String,
    pub series_slug: String,
    pub section_id: i32,
    pub position: i16,
    pub watch_time_seconds: i32,
    pub read_time_seconds: i32,
    pub is_published: bool,
    pub is_completed: bool,
}

impl Lesson {
    #[must_use]
    pub fn location(&self) -> LessonLocation {
        LessonLocation {
            language_slug: self.language_slug.clone(),
            series_slug: self.series_slug.clone(),
            section_id: self.section_id,
            lesson_id: self.id,
        }
    }

    #[must_use]
    pub fn path(&self) -> ResourcePath {
        self.location().path()
    }
}

/// Where a lesson sits in the catalog tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LessonLocation {
    pub language_slug: String,
    pub series_slug: String,
    pub section_id: i32,
    pub lesson_id: i32,
}

impl LessonLocation {
    #[must_use]
    pub fn path(&self) -> ResourcePath {
        ResourcePath::language(&self.language_slug)
            .series(&self.series_slug)
            .section(self.section_id)
            .lesson(self.lesson_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonArticle {
    pub id: i32,
    pub lesson_id: i32,
    pub content: String,
    pub read_time_seconds: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonVideo {
    pub id: i32,
    pub lesson_id: i32,
    pub url: String,
    pub watch_time_seconds: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonFile {
    pub id: Uuid,
    pub lesson_id: i32,
    pub name: String,
    pub ext: String,
}

/// A lesson with everything its detail view embeds
#[derive(Debug, Clone, PartialEq)]
pub struct LessonDetail {
    pub lesson: Lesson,
    pub article: Option<LessonArticle>,
    pub video: Option<LessonVideo>,
    pub files: Vec<LessonFile>,
}

/// Issued once per user and series, when the last lesson is completed.
/// Names and totals are copied at issue time and never change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: Uuid,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub language_id: i32,
    pub language_name: String,
    pub language_slug: String,
    pub series_title: String,
    pub series_slug: String,
    pub lessons: i16,
    pub watch_time_seconds: i32,
    pub read_time_seconds: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

// =====================================
// Accounts
// =====================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub email: String,
    pub is_admin: bool,
    pub is_staff: bool,
    pub is_confirmed: bool,
}

impl From<&User> for Author {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i32,
    pub user_id: i32,
    pub bio: String,
    pub github: String,
    pub linkedin: String,
    pub website: String,
}

/// A user's avatar; at most one per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPicture {
    pub id: Uuid,
    pub user_id: i32,
    pub ext: String,
}
