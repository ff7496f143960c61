//! # Catalog Service
//!
//! Languages, series, sections, lessons and their content, per-user
//! progress and certificates.
//!
//! Handlers only see [`CatalogService`]; [`MemoryCatalog`] is the volatile
//! backend used by the development server and the tests. It stores plain
//! rows keyed by id and joins them into the records the representation
//! builders consume on every read.
//!
//! ## Visibility
//! Staff viewers (`AccessClaims::can_edit_catalog`) see drafts; everyone
//! else only sees published rows, and an unpublished row is reported as
//! not found.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::{AppError, OptionExt, Result},
    models::{
        AccessClaims, Author, Certificate, CreateLessonBody, CreateSectionBody, CreateSeriesBody,
        Language, LanguageBody, LanguagesQuery, Lesson, LessonArticle, LessonArticleBody,
        LessonDetail, LessonFile, LessonFileBody, LessonLocation, LessonVideo, LessonVideoBody,
        PaginationQuery, Picture, Section, SectionPathParams, Series, SeriesPathParams,
        SeriesQuery, SeriesSort, StoredObject, UpdateLessonBody, UpdateSectionBody, UpdateSeriesBody, User,
    },
    utils::{reading_time_seconds, slugify},
};

use super::Service;

/// Total count plus the requested page
pub type Page<T> = (i64, Vec<T>);

// =====================================
// Catalog trait
// =====================================
/// Languages, series, sections, lessons, their content and progress.
///
/// `viewer` decides visibility: staff see drafts, everyone else only
/// published rows, and a missing draft is reported as not found.
#[async_trait]
pub trait CatalogService: Service {
    // ----------------------------------------
    // Languages
    // ----------------------------------------
    async fn list_languages(&self, viewer: Option<&AccessClaims>, query: &LanguagesQuery) -> Result<Page<Language>>;

    async fn get_language(&self, viewer: Option<&AccessClaims>, slug: &str) -> Result<Language>;

    async fn create_language(&self, author_id: i32, body: &LanguageBody) -> Result<Language>;

    async fn update_language(&self, slug: &str, body: &LanguageBody) -> Result<Language>;

    /// Cascades to series, sections and lessons. Returns the stored
    /// objects that were orphaned so the caller can remove them.
    async fn delete_language(&self, slug: &str) -> Result<Vec<StoredObject>>;

    async fn get_language_progress(&self, user_id: i32, slug: &str) -> Result<Language>;

    /// `true` when the progress row was created by this call
    async fn create_language_progress(&self, user_id: i32, slug: &str) -> Result<(Language, bool)>;

    async fn delete_language_progress(&self, user_id: i32, slug: &str) -> Result<()>;

    // ----------------------------------------
    // Series
    // ----------------------------------------
    async fn list_series(
        &self,
        viewer: Option<&AccessClaims>,
        language_slug: &str,
        query: &SeriesQuery,
    ) -> Result<Page<Series>>;

    async fn get_series(&self, viewer: Option<&AccessClaims>, params: &SeriesPathParams) -> Result<Series>;

    async fn create_series(&self, author: Author, language_slug: &str, body: &CreateSeriesBody) -> Result<Series>;

    async fn update_series(&self, params: &SeriesPathParams, body: &UpdateSeriesBody) -> Result<Series>;

    async fn publish_series(&self, params: &SeriesPathParams, is_published: bool) -> Result<Series>;

    async fn delete_series(&self, params: &SeriesPathParams) -> Result<Vec<StoredObject>>;

    /// Returns the picture it replaced
    async fn set_series_picture(&self, params: &SeriesPathParams, picture: Picture) -> Result<Option<Picture>>;

    /// Returns the removed picture
    async fn delete_series_picture(&self, params: &SeriesPathParams) -> Result<Picture>;

    async fn create_series_progress(&self, user_id: i32, params: &SeriesPathParams) -> Result<(Series, bool)>;

    async fn delete_series_progress(&self, user_id: i32, params: &SeriesPathParams) -> Result<()>;

    // ----------------------------------------
    // Sections
    // ----------------------------------------
    async fn list_sections(
        &self,
        viewer: Option<&AccessClaims>,
        params: &SeriesPathParams,
        query: &PaginationQuery,
    ) -> Result<Page<Section>>;

    /// The section and its visible lessons, in order
    async fn get_section(
        &self,
        viewer: Option<&AccessClaims>,
        params: &SectionPathParams,
    ) -> Result<(Section, Vec<Lesson>)>;

    async fn create_section(&self, params: &SeriesPathParams, body: &CreateSectionBody) -> Result<Section>;

    async fn update_section(&self, params: &SectionPathParams, body: &UpdateSectionBody) -> Result<Section>;

    async fn publish_section(&self, params: &SectionPathParams, is_published: bool) -> Result<Section>;

    async fn delete_section(&self, params: &SectionPathParams) -> Result<Vec<StoredObject>>;

    async fn create_section_progress(&self, user_id: i32, params: &SectionPathParams) -> Result<(Section, bool)>;

    async fn delete_section_progress(&self, user_id: i32, params: &SectionPathParams) -> Result<()>;

    // ----------------------------------------
    // Lessons
    // ----------------------------------------
    async fn list_lessons(
        &self,
        viewer: Option<&AccessClaims>,
        params: &SectionPathParams,
        query: &PaginationQuery,
    ) -> Result<Page<Lesson>>;

    async fn get_lesson(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<LessonDetail>;

    async fn create_lesson(&self, params: &SectionPathParams, body: &CreateLessonBody) -> Result<Lesson>;

    async fn update_lesson(&self, location: &LessonLocation, body: &UpdateLessonBody) -> Result<Lesson>;

    async fn publish_lesson(&self, location: &LessonLocation, is_published: bool) -> Result<Lesson>;

    async fn delete_lesson(&self, location: &LessonLocation) -> Result<Vec<StoredObject>>;

    async fn create_lesson_progress(&self, user_id: i32, location: &LessonLocation) -> Result<(Lesson, bool)>;

    /// Marks the lesson completed. The certificate is returned once every
    /// lesson of the series is completed.
    async fn complete_lesson(&self, learner: &User, location: &LessonLocation) -> Result<(Lesson, Option<Certificate>)>;

    async fn delete_lesson_progress(&self, user_id: i32, location: &LessonLocation) -> Result<()>;

    // ----------------------------------------
    // Lesson content
    // ----------------------------------------
    async fn get_article(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<LessonArticle>;

    async fn create_article(&self, location: &LessonLocation, body: &LessonArticleBody) -> Result<LessonArticle>;

    async fn update_article(&self, location: &LessonLocation, body: &LessonArticleBody) -> Result<LessonArticle>;

    async fn delete_article(&self, location: &LessonLocation) -> Result<()>;

    async fn get_video(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<LessonVideo>;

    async fn create_video(&self, location: &LessonLocation, body: &LessonVideoBody) -> Result<LessonVideo>;

    async fn update_video(&self, location: &LessonLocation, body: &LessonVideoBody) -> Result<LessonVideo>;

    async fn delete_video(&self, location: &LessonLocation) -> Result<()>;

    async fn list_files(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<Vec<LessonFile>>;

    async fn get_file(&self, viewer: Option<&AccessClaims>, location: &LessonLocation, file_id: Uuid) -> Result<LessonFile>;

    async fn create_file(&self, location: &LessonLocation, id: Uuid, name: &str, ext: &str) -> Result<LessonFile>;

    async fn update_file(&self, location: &LessonLocation, file_id: Uuid, body: &LessonFileBody) -> Result<LessonFile>;

    /// Returns the removed file so its object can be deleted
    async fn delete_file(&self, location: &LessonLocation, file_id: Uuid) -> Result<LessonFile>;

    // ----------------------------------------
    // Certificates
    // ----------------------------------------
    async fn get_certificate(&self, id: Uuid) -> Result<Certificate>;

    async fn list_certificates(&self, user_id: i32, query: &PaginationQuery) -> Result<Page<Certificate>>;
}

// =====================================
// Rows
// =====================================
#[derive(Debug, Clone)]
struct LanguageRow {
    id: i32,
    name: String,
    slug: String,
    icon: String,
}

#[derive(Debug, Clone)]
struct SeriesRow {
    id: i32,
    language_id: i32,
    title: String,
    slug: String,
    description: String,
    position: i16,
    author: Author,
    picture: Option<Picture>,
    is_published: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SectionRow {
    id: i32,
    series_id: i32,
    title: String,
    description: String,
    position: i16,
    is_published: bool,
}

#[derive(Debug, Clone)]
struct LessonRow {
    id: i32,
    section_id: i32,
    title: String,
    position: i16,
    is_published: bool,
}

fn count_i16(n: usize) -> i16 {
    i16::try_from(n).unwrap_or(i16::MAX)
}

fn page<T>(items: Vec<T>, query_limit: i64, query_offset: i64) -> Page<T> {
    let count = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let offset = usize::try_from(query_offset).unwrap_or(0);
    let limit = usize::try_from(query_limit).unwrap_or(0);

    (count, items.into_iter().skip(offset).take(limit).collect())
}

/// 1-based positions after moving `id` to `position` (clamped).
fn reorder(mut siblings: Vec<(i32, i16)>, id: i32, position: i16) -> HashMap<i32, i16> {
    siblings.sort_by_key(|(_, pos)| *pos);
    let mut ids: Vec<i32> = siblings.into_iter().map(|(sid, _)| sid).filter(|sid| *sid != id).collect();

    let index = usize::try_from(position.max(1) - 1).unwrap_or(0).min(ids.len());
    ids.insert(index, id);

    ids.into_iter()
        .enumerate()
        .map(|(i, sid)| (sid, count_i16(i + 1)))
        .collect()
}

/// 1-based positions with gaps closed
fn renumber(mut siblings: Vec<(i32, i16)>) -> HashMap<i32, i16> {
    siblings.sort_by_key(|(_, pos)| *pos);
    siblings
        .into_iter()
        .enumerate()
        .map(|(i, (sid, _))| (sid, count_i16(i + 1)))
        .collect()
}

fn drafts(viewer: Option<&AccessClaims>) -> bool {
    viewer.is_some_and(AccessClaims::can_edit_catalog)
}

fn viewer_id(viewer: Option<&AccessClaims>) -> Option<i32> {
    viewer.map(|v| v.user_id)
}

// =====================================
// Store
// =====================================
#[derive(Debug, Default)]
struct CatalogStore {
    last_id: i32,
    languages: Vec<LanguageRow>,
    series: Vec<SeriesRow>,
    sections: Vec<SectionRow>,
    lessons: Vec<LessonRow>,
    /// Keyed by lesson id
    articles: HashMap<i32, LessonArticle>,
    /// Keyed by lesson id
    videos: HashMap<i32, LessonVideo>,
    files: Vec<LessonFile>,
    /// `(user_id, language_id)` -> viewed at
    language_progress: HashMap<(i32, i32), DateTime<Utc>>,
    series_progress: HashMap<(i32, i32), DateTime<Utc>>,
    section_progress: HashMap<(i32, i32), DateTime<Utc>>,
    /// `(user_id, lesson_id)` -> completed at
    lesson_progress: HashMap<(i32, i32), Option<DateTime<Utc>>>,
    certificates: Vec<Certificate>,
}

impl CatalogStore {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    // ----------------------------------------
    // Lookups
    // ----------------------------------------

    fn language_row(&self, id: i32) -> Result<&LanguageRow> {
        self.languages.iter().find(|l| l.id == id).ok_or_not_found("Language not found")
    }

    fn series_row(&self, id: i32) -> Result<&SeriesRow> {
        self.series.iter().find(|s| s.id == id).ok_or_not_found("Series not found")
    }

    fn section_row(&self, id: i32) -> Result<&SectionRow> {
        self.sections.iter().find(|s| s.id == id).ok_or_not_found("Section not found")
    }

    fn lesson_row(&self, id: i32) -> Result<&LessonRow> {
        self.lessons.iter().find(|l| l.id == id).ok_or_not_found("Lesson not found")
    }

    fn language_id(&self, slug: &str) -> Result<i32> {
        self.languages
            .iter()
            .find(|l| l.slug == slug)
            .map(|l| l.id)
            .ok_or_not_found(format!("Language '{}' not found", slug))
    }

    fn series_id(&self, language_slug: &str, series_slug: &str, drafts: bool) -> Result<i32> {
        let language_id = self.language_id(language_slug)?;
        self.series
            .iter()
            .find(|s| s.language_id == language_id && s.slug == series_slug && (drafts || s.is_published))
            .map(|s| s.id)
            .ok_or_not_found(format!("Series '{}' not found", series_slug))
    }

    fn section_id(&self, language_slug: &str, series_slug: &str, section_id: i32, drafts: bool) -> Result<i32> {
        let series_id = self.series_id(language_slug, series_slug, drafts)?;
        self.sections
            .iter()
            .find(|s| s.series_id == series_id && s.id == section_id && (drafts || s.is_published))
            .map(|s| s.id)
            .ok_or_not_found(format!("Section {} not found", section_id))
    }

    fn lesson_id(&self, location: &LessonLocation, drafts: bool) -> Result<i32> {
        let section_id = self.section_id(
            &location.language_slug,
            &location.series_slug,
            location.section_id,
            drafts,
        )?;
        self.lessons
            .iter()
            .find(|l| l.section_id == section_id && l.id == location.lesson_id && (drafts || l.is_published))
            .map(|l| l.id)
            .ok_or_not_found(format!("Lesson {} not found", location.lesson_id))
    }

    fn section_lessons(&self, section_id: i32, drafts: bool) -> Vec<&LessonRow> {
        let mut lessons: Vec<&LessonRow> = self
            .lessons
            .iter()
            .filter(|l| l.section_id == section_id && (drafts || l.is_published))
            .collect();
        lessons.sort_by_key(|l| l.position);
        lessons
    }

    fn series_sections(&self, series_id: i32, drafts: bool) -> Vec<&SectionRow> {
        let mut sections: Vec<&SectionRow> = self
            .sections
            .iter()
            .filter(|s| s.series_id == series_id && (drafts || s.is_published))
            .collect();
        sections.sort_by_key(|s| s.position);
        sections
    }

    fn series_lessons(&self, series_id: i32, drafts: bool) -> Vec<&LessonRow> {
        self.series_sections(series_id, drafts)
            .into_iter()
            .flat_map(|s| self.section_lessons(s.id, drafts))
            .collect()
    }

    fn is_completed(&self, user_id: Option<i32>, lesson_id: i32) -> bool {
        user_id.is_some_and(|u| matches!(self.lesson_progress.get(&(u, lesson_id)), Some(Some(_))))
    }

    fn all_completed(&self, user_id: Option<i32>, lessons: &[&LessonRow]) -> bool {
        !lessons.is_empty() && lessons.iter().all(|l| self.is_completed(user_id, l.id))
    }

    /// `(watch, read)` seconds
    /// Summed watch and read seconds, capped at `i32::MAX`
    fn content_times(&self, lessons: &[&LessonRow]) -> (i32, i32) {
        let (watch, read) = lessons.iter().fold((0i64, 0i64), |(watch, read), lesson| {
            (
                watch + i64::from(self.videos.get(&lesson.id).map_or(0, |v| v.watch_time_seconds)),
                read + i64::from(self.articles.get(&lesson.id).map_or(0, |a| a.read_time_seconds)),
            )
        });

        (
            i32::try_from(watch).unwrap_or(i32::MAX),
            i32::try_from(read).unwrap_or(i32::MAX),
        )
    }

    // ----------------------------------------
    // Joined records
    // ----------------------------------------

    fn language_record(&self, id: i32, user_id: Option<i32>, drafts: bool) -> Result<Language> {
        let row = self.language_row(id)?;
        let series: Vec<&SeriesRow> = self
            .series
            .iter()
            .filter(|s| s.language_id == id && (drafts || s.is_published))
            .collect();
        let completed = series
            .iter()
            .filter(|s| self.all_completed(user_id, &self.series_lessons(s.id, drafts)))
            .count();

        Ok(Language {
            id: row.id,
            name: row.name.clone(),
            slug: row.slug.clone(),
            icon: row.icon.clone(),
            total_series: count_i16(series.len()),
            completed_series: count_i16(completed),
            viewed_at: user_id.and_then(|u| self.language_progress.get(&(u, id)).copied()),
        })
    }

    fn series_record(&self, id: i32, user_id: Option<i32>, drafts: bool) -> Result<Series> {
        let row = self.series_row(id)?;
        let language = self.language_row(row.language_id)?;
        let sections = self.series_sections(id, drafts);
        let lessons = self.series_lessons(id, drafts);
        let (watch, read) = self.content_times(&lessons);

        let completed_sections = sections
            .iter()
            .filter(|s| self.all_completed(user_id, &self.section_lessons(s.id, drafts)))
            .count();
        let completed_lessons = lessons.iter().filter(|l| self.is_completed(user_id, l.id)).count();

        Ok(Series {
            id: row.id,
            title: row.title.clone(),
            slug: row.slug.clone(),
            description: row.description.clone(),
            language_slug: language.slug.clone(),
            total_sections: count_i16(sections.len()),
            completed_sections: count_i16(completed_sections),
            total_lessons: count_i16(lessons.len()),
            completed_lessons: count_i16(completed_lessons),
            watch_time_seconds: watch,
            read_time_seconds: read,
            is_published: row.is_published,
            viewed_at: user_id.and_then(|u| self.series_progress.get(&(u, id)).copied()),
            author: row.author.clone(),
            picture: row.picture.clone(),
        })
    }

    fn section_record(&self, id: i32, user_id: Option<i32>, drafts: bool) -> Result<Section> {
        let row = self.section_row(id)?;
        let series = self.series_row(row.series_id)?;
        let language = self.language_row(series.language_id)?;
        let lessons = self.section_lessons(id, drafts);
        let (watch, read) = self.content_times(&lessons);
        let completed = lessons.iter().filter(|l| self.is_completed(user_id, l.id)).count();

        Ok(Section {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            language_slug: language.slug.clone(),
            series_slug: series.slug.clone(),
            position: row.position,
            total_lessons: count_i16(lessons.len()),
            completed_lessons: count_i16(completed),
            is_completed: !lessons.is_empty() && completed == lessons.len(),
            watch_time_seconds: watch,
            read_time_seconds: read,
            is_published: row.is_published,
            viewed_at: user_id.and_then(|u| self.section_progress.get(&(u, id)).copied()),
        })
    }

    fn lesson_record(&self, id: i32, user_id: Option<i32>) -> Result<Lesson> {
        let row = self.lesson_row(id)?;
        let section = self.section_row(row.section_id)?;
        let series = self.series_row(section.series_id)?;
        let language = self.language_row(series.language_id)?;
        let (watch, read) = self.content_times(&[row]);

        Ok(Lesson {
            id: row.id,
            title: row.title.clone(),
            language_slug: language.slug.clone(),
            series_slug: series.slug.clone(),
            section_id: section.id,
            position: row.position,
            watch_time_seconds: watch,
            read_time_seconds: read,
            is_published: row.is_published,
            is_completed: self.is_completed(user_id, id),
        })
    }

    // ----------------------------------------
    // Progress
    // ----------------------------------------

    /// Records a visit on the lesson and every ancestor. Returns whether the
    /// lesson row was new.
    fn visit_lesson(&mut self, user_id: i32, lesson_id: i32, now: DateTime<Utc>) -> Result<bool> {
        let section_id = self.lesson_row(lesson_id)?.section_id;
        self.visit_section(user_id, section_id, now)?;

        let created = !self.lesson_progress.contains_key(&(user_id, lesson_id));
        self.lesson_progress.entry((user_id, lesson_id)).or_insert(None);
        Ok(created)
    }

    fn visit_section(&mut self, user_id: i32, section_id: i32, now: DateTime<Utc>) -> Result<bool> {
        let series_id = self.section_row(section_id)?.series_id;
        self.visit_series(user_id, series_id, now)?;
        Ok(self.section_progress.insert((user_id, section_id), now).is_none())
    }

    fn visit_series(&mut self, user_id: i32, series_id: i32, now: DateTime<Utc>) -> Result<bool> {
        let language_id = self.series_row(series_id)?.language_id;
        self.language_progress.insert((user_id, language_id), now);
        Ok(self.series_progress.insert((user_id, series_id), now).is_none())
    }

    fn forget_lessons(&mut self, user_id: i32, lesson_ids: &[i32]) {
        self.lesson_progress
            .retain(|(u, l), _| *u != user_id || !lesson_ids.contains(l));
    }

    fn forget_sections(&mut self, user_id: i32, section_ids: &[i32]) {
        let lesson_ids: Vec<i32> = self
            .lessons
            .iter()
            .filter(|l| section_ids.contains(&l.section_id))
            .map(|l| l.id)
            .collect();
        self.forget_lessons(user_id, &lesson_ids);
        self.section_progress
            .retain(|(u, s), _| *u != user_id || !section_ids.contains(s));
    }

    fn forget_series(&mut self, user_id: i32, series_ids: &[i32]) {
        let section_ids: Vec<i32> = self
            .sections
            .iter()
            .filter(|s| series_ids.contains(&s.series_id))
            .map(|s| s.id)
            .collect();
        self.forget_sections(user_id, &section_ids);
        self.series_progress
            .retain(|(u, s), _| *u != user_id || !series_ids.contains(s));
    }

    fn issue_certificate(&mut self, learner: &User, series_id: i32, now: DateTime<Utc>) -> Result<Certificate> {
        let certificate = {
            let series = self.series_row(series_id)?;
            let language = self.language_row(series.language_id)?;

            let existing = self.certificates.iter().find(|c| {
                c.user_id == learner.id && c.language_id == language.id && c.series_slug == series.slug
            });
            if let Some(certificate) = existing {
                return Ok(certificate.clone());
            }

            let lessons = self.series_lessons(series_id, false);
            let (watch, read) = self.content_times(&lessons);

            Certificate {
                id: Uuid::new_v4(),
                user_id: learner.id,
                first_name: learner.first_name.clone(),
                last_name: learner.last_name.clone(),
                language_id: language.id,
                language_name: language.name.clone(),
                language_slug: language.slug.clone(),
                series_title: series.title.clone(),
                series_slug: series.slug.clone(),
                lessons: count_i16(lessons.len()),
                watch_time_seconds: watch,
                read_time_seconds: read,
                completed_at: Some(now),
            }
        };

        info!(certificate_id = %certificate.id, user_id = learner.id, "Certificate issued");
        self.certificates.push(certificate.clone());
        Ok(certificate)
    }

    // ----------------------------------------
    // Removal
    // ----------------------------------------

    // Each returns the lesson files and series pictures it dropped

    fn remove_lessons(&mut self, ids: &[i32]) -> Vec<StoredObject> {
        let objects = self
            .files
            .iter()
            .filter(|f| ids.contains(&f.lesson_id))
            .map(StoredObject::from)
            .collect();

        self.lessons.retain(|l| !ids.contains(&l.id));
        self.articles.retain(|id, _| !ids.contains(id));
        self.videos.retain(|id, _| !ids.contains(id));
        self.files.retain(|f| !ids.contains(&f.lesson_id));
        self.lesson_progress.retain(|(_, l), _| !ids.contains(l));
        objects
    }

    fn remove_sections(&mut self, ids: &[i32]) -> Vec<StoredObject> {
        let lessons: Vec<i32> = self
            .lessons
            .iter()
            .filter(|l| ids.contains(&l.section_id))
            .map(|l| l.id)
            .collect();
        let objects = self.remove_lessons(&lessons);
        self.sections.retain(|s| !ids.contains(&s.id));
        self.section_progress.retain(|(_, s), _| !ids.contains(s));
        objects
    }

    fn remove_series(&mut self, ids: &[i32]) -> Vec<StoredObject> {
        let mut objects: Vec<StoredObject> = self
            .series
            .iter()
            .filter(|s| ids.contains(&s.id))
            .filter_map(|s| s.picture.as_ref().map(StoredObject::from))
            .collect();

        let sections: Vec<i32> = self
            .sections
            .iter()
            .filter(|s| ids.contains(&s.series_id))
            .map(|s| s.id)
            .collect();
        objects.extend(self.remove_sections(&sections));
        self.series.retain(|s| !ids.contains(&s.id));
        self.series_progress.retain(|(_, s), _| !ids.contains(s));
        objects
    }

    // ----------------------------------------
    // Positions
    // ----------------------------------------

    fn apply_series_positions(&mut self, positions: &HashMap<i32, i16>) {
        for row in &mut self.series {
            if let Some(position) = positions.get(&row.id) {
                row.position = *position;
            }
        }
    }

    fn apply_section_positions(&mut self, positions: &HashMap<i32, i16>) {
        for row in &mut self.sections {
            if let Some(position) = positions.get(&row.id) {
                row.position = *position;
            }
        }
    }

    fn apply_lesson_positions(&mut self, positions: &HashMap<i32, i16>) {
        for row in &mut self.lessons {
            if let Some(position) = positions.get(&row.id) {
                row.position = *position;
            }
        }
    }

    fn lesson_mut(&mut self, id: i32) -> Result<&mut LessonRow> {
        self.lessons.iter_mut().find(|l| l.id == id).ok_or_not_found("Lesson not found")
    }
}

fn slug_from(text: &str) -> Result<String> {
    let slug = slugify(text);
    if slug.is_empty() {
        return Err(AppError::Validation("Title must contain letters or numbers".to_string()));
    }
    Ok(slug)
}

// =====================================
// MemoryCatalog
// =====================================
/// In-process catalog backend
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    store: RwLock<CatalogStore>,
}

impl Service for MemoryCatalog {}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogService for MemoryCatalog {
    // ----------------------------------------
    // Languages
    // ----------------------------------------

    async fn list_languages(&self, viewer: Option<&AccessClaims>, query: &LanguagesQuery) -> Result<Page<Language>> {
        let store = self.store.read().await;
        let search = query.search.as_deref().map(str::to_lowercase);

        let mut rows: Vec<&LanguageRow> = store
            .languages
            .iter()
            .filter(|l| search.as_deref().map_or(true, |s| l.name.to_lowercase().contains(s)))
            .collect();
        rows.sort_by(|a, b| a.slug.cmp(&b.slug));

        let languages = rows
            .into_iter()
            .map(|l| store.language_record(l.id, viewer_id(viewer), drafts(viewer)))
            .collect::<Result<Vec<_>>>()?;

        Ok(page(languages, query.limit, query.offset))
    }

    async fn get_language(&self, viewer: Option<&AccessClaims>, slug: &str) -> Result<Language> {
        let store = self.store.read().await;
        let id = store.language_id(slug)?;
        store.language_record(id, viewer_id(viewer), drafts(viewer))
    }

    #[instrument(skip(self, body), fields(name = %body.name))]
    async fn create_language(&self, author_id: i32, body: &LanguageBody) -> Result<Language> {
        let mut store = self.store.write().await;
        let slug = slug_from(&body.name)?;

        if store.languages.iter().any(|l| l.slug == slug) {
            return Err(AppError::Conflict(format!("Language '{}' already exists", body.name)));
        }

        let id = store.next_id();
        store.languages.push(LanguageRow {
            id,
            name: body.name.clone(),
            slug,
            icon: body.icon.clone(),
        });

        info!(language_id = id, author_id, "Language created");
        store.language_record(id, None, true)
    }

    async fn update_language(&self, slug: &str, body: &LanguageBody) -> Result<Language> {
        let mut store = self.store.write().await;
        let id = store.language_id(slug)?;
        let new_slug = slug_from(&body.name)?;

        if store.languages.iter().any(|l| l.slug == new_slug && l.id != id) {
            return Err(AppError::Conflict(format!("Language '{}' already exists", body.name)));
        }

        if let Some(row) = store.languages.iter_mut().find(|l| l.id == id) {
            row.name = body.name.clone();
            row.slug = new_slug;
            row.icon = body.icon.clone();
        }

        store.language_record(id, None, true)
    }

    async fn delete_language(&self, slug: &str) -> Result<Vec<StoredObject>> {
        let mut store = self.store.write().await;
        let id = store.language_id(slug)?;

        if store.language_progress.keys().any(|(_, l)| *l == id) {
            return Err(AppError::Conflict("Language has students".to_string()));
        }

        let series: Vec<i32> = store.series.iter().filter(|s| s.language_id == id).map(|s| s.id).collect();
        let objects = store.remove_series(&series);
        store.languages.retain(|l| l.id != id);

        info!(language_id = id, "Language deleted");
        Ok(objects)
    }

    async fn get_language_progress(&self, user_id: i32, slug: &str) -> Result<Language> {
        let store = self.store.read().await;
        let id = store.language_id(slug)?;

        if !store.language_progress.contains_key(&(user_id, id)) {
            return Err(AppError::NotFound("Language progress not found".to_string()));
        }

        store.language_record(id, Some(user_id), false)
    }

    async fn create_language_progress(&self, user_id: i32, slug: &str) -> Result<(Language, bool)> {
        let mut store = self.store.write().await;
        let id = store.language_id(slug)?;
        let created = store.language_progress.insert((user_id, id), Utc::now()).is_none();

        Ok((store.language_record(id, Some(user_id), false)?, created))
    }

    async fn delete_language_progress(&self, user_id: i32, slug: &str) -> Result<()> {
        let mut store = self.store.write().await;
        let id = store.language_id(slug)?;

        if store.language_progress.remove(&(user_id, id)).is_none() {
            return Err(AppError::NotFound("Language progress not found".to_string()));
        }

        let series: Vec<i32> = store.series.iter().filter(|s| s.language_id == id).map(|s| s.id).collect();
        store.forget_series(user_id, &series);
        Ok(())
    }

    // ----------------------------------------
    // Series
    // ----------------------------------------

    async fn list_series(
        &self,
        viewer: Option<&AccessClaims>,
        language_slug: &str,
        query: &SeriesQuery,
    ) -> Result<Page<Series>> {
        let store = self.store.read().await;
        let language_id = store.language_id(language_slug)?;
        let drafts = drafts(viewer);
        let search = query.search.as_deref().map(str::to_lowercase);

        let mut rows: Vec<&SeriesRow> = store
            .series
            .iter()
            .filter(|s| s.language_id == language_id && (drafts || s.is_published))
            .filter(|s| search.as_deref().map_or(true, |q| s.title.to_lowercase().contains(q)))
            .collect();

        match query.sort_by {
            Some(SeriesSort::Slug) => rows.sort_by(|a, b| a.slug.cmp(&b.slug)),
            Some(SeriesSort::Date) => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            None => rows.sort_by_key(|s| s.position),
        }

        let series = rows
            .into_iter()
            .map(|s| store.series_record(s.id, viewer_id(viewer), drafts))
            .collect::<Result<Vec<_>>>()?;

        Ok(page(series, query.limit, query.offset))
    }

    async fn get_series(&self, viewer: Option<&AccessClaims>, params: &SeriesPathParams) -> Result<Series> {
        let store = self.store.read().await;
        let drafts = drafts(viewer);
        let id = store.series_id(&params.language_slug, &params.series_slug, drafts)?;
        store.series_record(id, viewer_id(viewer), drafts)
    }

    #[instrument(skip(self, author, body), fields(title = %body.title))]
    async fn create_series(&self, author: Author, language_slug: &str, body: &CreateSeriesBody) -> Result<Series> {
        let mut store = self.store.write().await;
        let language_id = store.language_id(language_slug)?;
        let slug = slug_from(&body.title)?;

        if store.series.iter().any(|s| s.language_id == language_id && s.slug == slug) {
            return Err(AppError::Conflict(format!("Series '{}' already exists", body.title)));
        }

        let position = count_i16(store.series.iter().filter(|s| s.language_id == language_id).count() + 1);
        let id = store.next_id();
        store.series.push(SeriesRow {
            id,
            language_id,
            title: body.title.clone(),
            slug,
            description: body.description.clone(),
            position,
            author,
            picture: None,
            is_published: false,
            created_at: Utc::now(),
        });

        info!(series_id = id, "Series created");
        store.series_record(id, None, true)
    }

    async fn update_series(&self, params: &SeriesPathParams, body: &UpdateSeriesBody) -> Result<Series> {
        let mut store = self.store.write().await;
        let id = store.series_id(&params.language_slug, &params.series_slug, true)?;
        let language_id = store.series_row(id)?.language_id;
        let slug = slug_from(&body.title)?;

        if store.series.iter().any(|s| s.language_id == language_id && s.slug == slug && s.id != id) {
            return Err(AppError::Conflict(format!("Series '{}' already exists", body.title)));
        }

        if let Some(row) = store.series.iter_mut().find(|s| s.id == id) {
            row.title = body.title.clone();
            row.slug = slug;
            row.description = body.description.clone();
        }

        let siblings = store
            .series
            .iter()
            .filter(|s| s.language_id == language_id)
            .map(|s| (s.id, s.position))
            .collect();
        let positions = reorder(siblings, id, body.position);
        store.apply_series_positions(&positions);

        store.series_record(id, None, true)
    }

    async fn publish_series(&self, params: &SeriesPathParams, is_published: bool) -> Result<Series> {
        let mut store = self.store.write().await;
        let id = store.series_id(&params.language_slug, &params.series_slug, true)?;

        if is_published && store.series_lessons(id, false).is_empty() {
            return Err(AppError::Validation(
                "Cannot publish series without published sections".to_string(),
            ));
        }

        if let Some(row) = store.series.iter_mut().find(|s| s.id == id) {
            row.is_published = is_published;
        }

        info!(series_id = id, is_published, "Series publication changed");
        store.series_record(id, None, true)
    }

    async fn delete_series(&self, params: &SeriesPathParams) -> Result<Vec<StoredObject>> {
        let mut store = self.store.write().await;
        let id = store.series_id(&params.language_slug, &params.series_slug, true)?;
        let language_id = store.series_row(id)?.language_id;

        if store.series_progress.keys().any(|(_, s)| *s == id) {
            return Err(AppError::Conflict("Series has students".to_string()));
        }

        let objects = store.remove_series(&[id]);
        let siblings = store
            .series
            .iter()
            .filter(|s| s.language_id == language_id)
            .map(|s| (s.id, s.position))
            .collect();
        let positions = renumber(siblings);
        store.apply_series_positions(&positions);

        info!(series_id = id, "Series deleted");
        Ok(objects)
    }

    async fn set_series_picture(&self, params: &SeriesPathParams, picture: Picture) -> Result<Option<Picture>> {
        let mut store = self.store.write().await;
        let id = store.series_id(&params.language_slug, &params.series_slug, true)?;

        let row = store
            .series
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_not_found("Series not found")?;
        Ok(row.picture.replace(picture))
    }

    async fn delete_series_picture(&self, params: &SeriesPathParams) -> Result<Picture> {
        let mut store = self.store.write().await;
        let id = store.series_id(&params.language_slug, &params.series_slug, true)?;

        store
            .series
            .iter_mut()
            .find(|s| s.id == id)
            .and_then(|row| row.picture.take())
            .ok_or_not_found("Series picture not found")
    }

    async fn create_series_progress(&self, user_id: i32, params: &SeriesPathParams) -> Result<(Series, bool)> {
        let mut store = self.store.write().await;
        let id = store.series_id(&params.language_slug, &params.series_slug, false)?;
        let created = store.visit_series(user_id, id, Utc::now())?;

        Ok((store.series_record(id, Some(user_id), false)?, created))
    }

    async fn delete_series_progress(&self, user_id: i32, params: &SeriesPathParams) -> Result<()> {
        let mut store = self.store.write().await;
        let id = store.series_id(&params.language_slug, &params.series_slug, false)?;

        if !store.series_progress.contains_key(&(user_id, id)) {
            return Err(AppError::NotFound("Series progress not found".to_string()));
        }

        store.forget_series(user_id, &[id]);
        Ok(())
    }

    // ----------------------------------------
    // Sections
    // ----------------------------------------

    async fn list_sections(
        &self,
        viewer: Option<&AccessClaims>,
        params: &SeriesPathParams,
        query: &PaginationQuery,
    ) -> Result<Page<Section>> {
        let store = self.store.read().await;
        let drafts = drafts(viewer);
        let series_id = store.series_id(&params.language_slug, &params.series_slug, drafts)?;

        let sections = store
            .series_sections(series_id, drafts)
            .into_iter()
            .map(|s| store.section_record(s.id, viewer_id(viewer), drafts))
            .collect::<Result<Vec<_>>>()?;

        Ok(page(sections, query.limit, query.offset))
    }

    async fn get_section(
        &self,
        viewer: Option<&AccessClaims>,
        params: &SectionPathParams,
    ) -> Result<(Section, Vec<Lesson>)> {
        let store = self.store.read().await;
        let drafts = drafts(viewer);
        let id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, drafts)?;

        let lessons = store
            .section_lessons(id, drafts)
            .into_iter()
            .map(|l| store.lesson_record(l.id, viewer_id(viewer)))
            .collect::<Result<Vec<_>>>()?;

        Ok((store.section_record(id, viewer_id(viewer), drafts)?, lessons))
    }

    async fn create_section(&self, params: &SeriesPathParams, body: &CreateSectionBody) -> Result<Section> {
        let mut store = self.store.write().await;
        let series_id = store.series_id(&params.language_slug, &params.series_slug, true)?;

        let position = count_i16(store.sections.iter().filter(|s| s.series_id == series_id).count() + 1);
        let id = store.next_id();
        store.sections.push(SectionRow {
            id,
            series_id,
            title: body.title.clone(),
            description: body.description.clone(),
            position,
            is_published: false,
        });

        info!(section_id = id, series_id, "Section created");
        store.section_record(id, None, true)
    }

    async fn update_section(&self, params: &SectionPathParams, body: &UpdateSectionBody) -> Result<Section> {
        let mut store = self.store.write().await;
        let id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, true)?;
        let series_id = store.section_row(id)?.series_id;

        if let Some(row) = store.sections.iter_mut().find(|s| s.id == id) {
            row.title = body.title.clone();
            row.description = body.description.clone();
        }

        let siblings = store
            .sections
            .iter()
            .filter(|s| s.series_id == series_id)
            .map(|s| (s.id, s.position))
            .collect();
        let positions = reorder(siblings, id, body.position);
        store.apply_section_positions(&positions);

        store.section_record(id, None, true)
    }

    async fn publish_section(&self, params: &SectionPathParams, is_published: bool) -> Result<Section> {
        let mut store = self.store.write().await;
        let id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, true)?;

        if is_published && store.section_lessons(id, false).is_empty() {
            return Err(AppError::Validation(
                "Cannot publish section without published lessons".to_string(),
            ));
        }

        if let Some(row) = store.sections.iter_mut().find(|s| s.id == id) {
            row.is_published = is_published;
        }

        store.section_record(id, None, true)
    }

    async fn delete_section(&self, params: &SectionPathParams) -> Result<Vec<StoredObject>> {
        let mut store = self.store.write().await;
        let id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, true)?;
        let series_id = store.section_row(id)?.series_id;

        if store.section_progress.keys().any(|(_, s)| *s == id) {
            return Err(AppError::Conflict("Section has students".to_string()));
        }

        let objects = store.remove_sections(&[id]);
        let siblings = store
            .sections
            .iter()
            .filter(|s| s.series_id == series_id)
            .map(|s| (s.id, s.position))
            .collect();
        let positions = renumber(siblings);
        store.apply_section_positions(&positions);

        info!(section_id = id, "Section deleted");
        Ok(objects)
    }

    async fn create_section_progress(&self, user_id: i32, params: &SectionPathParams) -> Result<(Section, bool)> {
        let mut store = self.store.write().await;
        let id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, false)?;
        let created = store.visit_section(user_id, id, Utc::now())?;

        Ok((store.section_record(id, Some(user_id), false)?, created))
    }

    async fn delete_section_progress(&self, user_id: i32, params: &SectionPathParams) -> Result<()> {
        let mut store = self.store.write().await;
        let id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, false)?;

        if !store.section_progress.contains_key(&(user_id, id)) {
            return Err(AppError::NotFound("Section progress not found".to_string()));
        }

        store.forget_sections(user_id, &[id]);
        Ok(())
    }

    // ----------------------------------------
    // Lessons
    // ----------------------------------------

    async fn list_lessons(
        &self,
        viewer: Option<&AccessClaims>,
        params: &SectionPathParams,
        query: &PaginationQuery,
    ) -> Result<Page<Lesson>> {
        let store = self.store.read().await;
        let drafts = drafts(viewer);
        let section_id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, drafts)?;

        let lessons = store
            .section_lessons(section_id, drafts)
            .into_iter()
            .map(|l| store.lesson_record(l.id, viewer_id(viewer)))
            .collect::<Result<Vec<_>>>()?;

        Ok(page(lessons, query.limit, query.offset))
    }

    async fn get_lesson(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<LessonDetail> {
        let store = self.store.read().await;
        let id = store.lesson_id(location, drafts(viewer))?;

        let mut files: Vec<LessonFile> = store.files.iter().filter(|f| f.lesson_id == id).cloned().collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(LessonDetail {
            lesson: store.lesson_record(id, viewer_id(viewer))?,
            article: store.articles.get(&id).cloned(),
            video: store.videos.get(&id).cloned(),
            files,
        })
    }

    async fn create_lesson(&self, params: &SectionPathParams, body: &CreateLessonBody) -> Result<Lesson> {
        let mut store = self.store.write().await;
        let section_id = store.section_id(&params.language_slug, &params.series_slug, params.section_id, true)?;

        let position = count_i16(store.lessons.iter().filter(|l| l.section_id == section_id).count() + 1);
        let id = store.next_id();
        store.lessons.push(LessonRow {
            id,
            section_id,
            title: body.title.clone(),
            position,
            is_published: false,
        });

        info!(lesson_id = id, section_id, "Lesson created");
        store.lesson_record(id, None)
    }

    async fn update_lesson(&self, location: &LessonLocation, body: &UpdateLessonBody) -> Result<Lesson> {
        let mut store = self.store.write().await;
        let id = store.lesson_id(location, true)?;
        let section_id = location.section_id;

        store.lesson_mut(id)?.title = body.title.clone();

        let siblings = store
            .lessons
            .iter()
            .filter(|l| l.section_id == section_id)
            .map(|l| (l.id, l.position))
            .collect();
        let positions = reorder(siblings, id, body.position);
        store.apply_lesson_positions(&positions);

        store.lesson_record(id, None)
    }

    async fn publish_lesson(&self, location: &LessonLocation, is_published: bool) -> Result<Lesson> {
        let mut store = self.store.write().await;
        let id = store.lesson_id(location, true)?;

        if is_published && !store.articles.contains_key(&id) && !store.videos.contains_key(&id) {
            return Err(AppError::Validation("Cannot publish lesson without content".to_string()));
        }

        store.lesson_mut(id)?.is_published = is_published;
        store.lesson_record(id, None)
    }

    async fn delete_lesson(&self, location: &LessonLocation) -> Result<Vec<StoredObject>> {
        let mut store = self.store.write().await;
        let id = store.lesson_id(location, true)?;

        if store.lesson_progress.keys().any(|(_, l)| *l == id) {
            return Err(AppError::Conflict("Lesson has students".to_string()));
        }

        let objects = store.remove_lessons(&[id]);
        let siblings = store
            .lessons
            .iter()
            .filter(|l| l.section_id == location.section_id)
            .map(|l| (l.id, l.position))
            .collect();
        let positions = renumber(siblings);
        store.apply_lesson_positions(&positions);

        info!(lesson_id = id, "Lesson deleted");
        Ok(objects)
    }

    async fn create_lesson_progress(&self, user_id: i32, location: &LessonLocation) -> Result<(Lesson, bool)> {
        let mut store = self.store.write().await;
        let id = store.lesson_id(location, false)?;
        let created = store.visit_lesson(user_id, id, Utc::now())?;

        Ok((store.lesson_record(id, Some(user_id))?, created))
    }

    #[instrument(skip(self, learner), fields(user_id = learner.id))]
    async fn complete_lesson(&self, learner: &User, location: &LessonLocation) -> Result<(Lesson, Option<Certificate>)> {
        let mut store = self.store.write().await;
        let id = store.lesson_id(location, false)?;
        let now = Utc::now();

        store.visit_lesson(learner.id, id, now)?;
        store
            .lesson_progress
            .entry((learner.id, id))
            .and_modify(|completed_at| {
                completed_at.get_or_insert(now);
            });

        let section_id = store.lesson_row(id)?.section_id;
        let series_id = store.section_row(section_id)?.series_id;
        let finished = {
            let lessons = store.series_lessons(series_id, false);
            store.all_completed(Some(learner.id), &lessons)
        };
        let certificate = if finished {
            Some(store.issue_certificate(learner, series_id, now)?)
        } else {
            None
        };

        Ok((store.lesson_record(id, Some(learner.id))?, certificate))
    }

    async fn delete_lesson_progress(&self, user_id: i32, location: &LessonLocation) -> Result<()> {
        let mut store = self.store.write().await;
        let id = store.lesson_id(location, false)?;

        if store.lesson_progress.remove(&(user_id, id)).is_none() {
            return Err(AppError::NotFound("Lesson progress not found".to_string()));
        }
        Ok(())
    }

    // ----------------------------------------
    // Article
    // ----------------------------------------

    async fn get_article(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<LessonArticle> {
        let store = self.store.read().await;
        let id = store.lesson_id(location, drafts(viewer))?;
        store.articles.get(&id).cloned().ok_or_not_found("Lesson article not found")
    }

    async fn create_article(&self, location: &LessonLocation, body: &LessonArticleBody) -> Result<LessonArticle> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        if store.articles.contains_key(&lesson_id) {
            return Err(AppError::Conflict("Lesson already has an article".to_string()));
        }

        let article = LessonArticle {
            id: store.next_id(),
            lesson_id,
            content: body.content.clone(),
            read_time_seconds: reading_time_seconds(&body.content),
        };
        store.articles.insert(lesson_id, article.clone());
        Ok(article)
    }

    async fn update_article(&self, location: &LessonLocation, body: &LessonArticleBody) -> Result<LessonArticle> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        let article = store
            .articles
            .get_mut(&lesson_id)
            .ok_or_not_found("Lesson article not found")?;
        article.content = body.content.clone();
        article.read_time_seconds = reading_time_seconds(&body.content);
        Ok(article.clone())
    }

    async fn delete_article(&self, location: &LessonLocation) -> Result<()> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        store
            .articles
            .remove(&lesson_id)
            .map(|_| ())
            .ok_or_not_found("Lesson article not found")
    }

    // ----------------------------------------
    // Video
    // ----------------------------------------

    async fn get_video(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<LessonVideo> {
        let store = self.store.read().await;
        let id = store.lesson_id(location, drafts(viewer))?;
        store.videos.get(&id).cloned().ok_or_not_found("Lesson video not found")
    }

    async fn create_video(&self, location: &LessonLocation, body: &LessonVideoBody) -> Result<LessonVideo> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        if store.videos.contains_key(&lesson_id) {
            return Err(AppError::Conflict("Lesson already has a video".to_string()));
        }

        let video = LessonVideo {
            id: store.next_id(),
            lesson_id,
            url: body.url.clone(),
            watch_time_seconds: body.watch_time,
        };
        store.videos.insert(lesson_id, video.clone());
        Ok(video)
    }

    async fn update_video(&self, location: &LessonLocation, body: &LessonVideoBody) -> Result<LessonVideo> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        let video = store
            .videos
            .get_mut(&lesson_id)
            .ok_or_not_found("Lesson video not found")?;
        video.url = body.url.clone();
        video.watch_time_seconds = body.watch_time;
        Ok(video.clone())
    }

    async fn delete_video(&self, location: &LessonLocation) -> Result<()> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        store
            .videos
            .remove(&lesson_id)
            .map(|_| ())
            .ok_or_not_found("Lesson video not found")
    }

    // ----------------------------------------
    // Files
    // ----------------------------------------

    async fn list_files(&self, viewer: Option<&AccessClaims>, location: &LessonLocation) -> Result<Vec<LessonFile>> {
        let store = self.store.read().await;
        let lesson_id = store.lesson_id(location, drafts(viewer))?;

        let mut files: Vec<LessonFile> = store.files.iter().filter(|f| f.lesson_id == lesson_id).cloned().collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn get_file(&self, viewer: Option<&AccessClaims>, location: &LessonLocation, file_id: Uuid) -> Result<LessonFile> {
        let store = self.store.read().await;
        let lesson_id = store.lesson_id(location, drafts(viewer))?;

        store
            .files
            .iter()
            .find(|f| f.lesson_id == lesson_id && f.id == file_id)
            .cloned()
            .ok_or_not_found("Lesson file not found")
    }

    async fn create_file(&self, location: &LessonLocation, id: Uuid, name: &str, ext: &str) -> Result<LessonFile> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        let file = LessonFile {
            id,
            lesson_id,
            name: name.to_string(),
            ext: ext.to_string(),
        };
        store.files.push(file.clone());
        Ok(file)
    }

    async fn update_file(&self, location: &LessonLocation, file_id: Uuid, body: &LessonFileBody) -> Result<LessonFile> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        let file = store
            .files
            .iter_mut()
            .find(|f| f.lesson_id == lesson_id && f.id == file_id)
            .ok_or_not_found("Lesson file not found")?;
        file.name = body.name.clone();
        Ok(file.clone())
    }

    async fn delete_file(&self, location: &LessonLocation, file_id: Uuid) -> Result<LessonFile> {
        let mut store = self.store.write().await;
        let lesson_id = store.lesson_id(location, true)?;

        let index = store
            .files
            .iter()
            .position(|f| f.lesson_id == lesson_id && f.id == file_id)
            .ok_or_not_found("Lesson file not found")?;
        Ok(store.files.remove(index))
    }

    // ----------------------------------------
    // Certificates
    // ----------------------------------------

    async fn get_certificate(&self, id: Uuid) -> Result<Certificate> {
        let store = self.store.read().await;
        store
            .certificates
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_not_found(format!("Certificate '{}' not found", id))
    }

    async fn list_certificates(&self, user_id: i32, query: &PaginationQuery) -> Result<Page<Certificate>> {
        let store = self.store.read().await;
        let mut certificates: Vec<Certificate> = store
            .certificates
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        certificates.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

        Ok(page(certificates, query.limit, query.offset))
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ICON: &str = "<svg></svg>";

    fn staff() -> AccessClaims {
        AccessClaims { user_id: 1, is_admin: true, is_staff: true }
    }

    fn learner() -> User {
        User {
            id: 2,
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            location: "PRT".to_string(),
            email: "ana@kiwiscript.com".to_string(),
            is_admin: false,
            is_staff: false,
            is_confirmed: true,
        }
    }

    fn series_params() -> SeriesPathParams {
        SeriesPathParams {
            language_slug: "rust".to_string(),
            series_slug: "ownership".to_string(),
        }
    }

    fn section_params(section_id: i32) -> SectionPathParams {
        SectionPathParams {
            language_slug: "rust".to_string(),
            series_slug: "ownership".to_string(),
            section_id,
        }
    }

    /// One published series with one section holding one lesson with an
    /// article.
    async fn seeded() -> (MemoryCatalog, LessonLocation) {
        let catalog = MemoryCatalog::new();
        catalog
            .create_language(1, &LanguageBody { name: "Rust".to_string(), icon: ICON.to_string() })
            .await
            .unwrap();
        catalog
            .create_series(
                Author { id: 1, first_name: "Rui".to_string(), last_name: "Costa".to_string() },
                "rust",
                &CreateSeriesBody { title: "Ownership".to_string(), description: "Moves".to_string() },
            )
            .await
            .unwrap();
        let section = catalog
            .create_section(
                &series_params(),
                &CreateSectionBody { title: "Borrowing".to_string(), description: "Refs".to_string() },
            )
            .await
            .unwrap();
        let lesson = catalog
            .create_lesson(&section_params(section.id), &CreateLessonBody { title: "Shared".to_string() })
            .await
            .unwrap();
        let location = lesson.location();

        catalog
            .create_article(&location, &LessonArticleBody { content: "one two three".to_string() })
            .await
            .unwrap();
        catalog.publish_lesson(&location, true).await.unwrap();
        catalog.publish_section(&section_params(section.id), true).await.unwrap();
        catalog.publish_series(&series_params(), true).await.unwrap();

        (catalog, location)
    }

    #[test]
    fn test_reorder_moves_and_clamps() {
        let positions = reorder(vec![(10, 1), (11, 2), (12, 3)], 12, 1);
        assert_eq!(positions[&12], 1);
        assert_eq!(positions[&10], 2);
        assert_eq!(positions[&11], 3);

        let positions = reorder(vec![(10, 1), (11, 2)], 10, 99);
        assert_eq!(positions[&10], 2);
    }

    #[test]
    fn test_page_slices_after_counting() {
        let (count, items) = page(vec![1, 2, 3, 4, 5], 2, 3);
        assert_eq!(count, 5);
        assert_eq!(items, vec![4, 5]);
    }

    #[tokio::test]
    async fn test_language_slug_conflict() {
        let catalog = MemoryCatalog::new();
        let body = LanguageBody { name: "Rust".to_string(), icon: ICON.to_string() };

        let language = catalog.create_language(1, &body).await.unwrap();
        assert_eq!(language.slug, "rust");

        let err = catalog.create_language(1, &body).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_drafts_are_hidden_from_the_public() {
        let catalog = MemoryCatalog::new();
        catalog
            .create_language(1, &LanguageBody { name: "Go".to_string(), icon: ICON.to_string() })
            .await
            .unwrap();
        catalog
            .create_series(
                Author { id: 1, first_name: "Rui".to_string(), last_name: "Costa".to_string() },
                "go",
                &CreateSeriesBody { title: "Channels".to_string(), description: "CSP".to_string() },
            )
            .await
            .unwrap();

        let params = SeriesPathParams { language_slug: "go".to_string(), series_slug: "channels".to_string() };
        assert!(matches!(catalog.get_series(None, &params).await, Err(AppError::NotFound(_))));
        assert!(catalog.get_series(Some(&staff()), &params).await.is_ok());
    }

    #[tokio::test]
    async fn test_lesson_without_content_cannot_be_published() {
        let (catalog, location) = seeded().await;
        let section = section_params(location.section_id);
        let lesson = catalog
            .create_lesson(&section, &CreateLessonBody { title: "Empty".to_string() })
            .await
            .unwrap();

        let err = catalog.publish_lesson(&lesson.location(), true).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_article_sets_lesson_read_time() {
        let (catalog, location) = seeded().await;
        let detail = catalog.get_lesson(None, &location).await.unwrap();

        assert_eq!(detail.lesson.read_time_seconds, 1);
        assert_eq!(detail.lesson.watch_time_seconds, 0);
        assert!(detail.article.is_some());
        assert!(detail.video.is_none());
    }

    #[tokio::test]
    async fn test_completing_every_lesson_issues_one_certificate() {
        let (catalog, location) = seeded().await;
        let learner = learner();

        let (lesson, certificate) = catalog.complete_lesson(&learner, &location).await.unwrap();
        assert!(lesson.is_completed);
        let certificate = certificate.expect("certificate");
        assert_eq!(certificate.series_slug, "ownership");
        assert_eq!(certificate.lessons, 1);

        let (_, again) = catalog.complete_lesson(&learner, &location).await.unwrap();
        assert_eq!(again.map(|c| c.id), Some(certificate.id));

        let (count, _) = catalog
            .list_certificates(learner.id, &PaginationQuery::default())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_progress_is_per_user_and_counts_up_the_tree() {
        let (catalog, location) = seeded().await;
        let learner = learner();
        catalog.complete_lesson(&learner, &location).await.unwrap();

        let viewer = AccessClaims { user_id: learner.id, is_admin: false, is_staff: false };
        let series = catalog.get_series(Some(&viewer), &series_params()).await.unwrap();
        assert_eq!(series.completed_lessons, 1);
        assert_eq!(series.completed_sections, 1);
        assert!(series.viewed_at.is_some());

        let language = catalog.get_language(Some(&viewer), "rust").await.unwrap();
        assert_eq!(language.completed_series, 1);

        let anonymous = catalog.get_series(None, &series_params()).await.unwrap();
        assert_eq!(anonymous.completed_lessons, 0);
    }

    #[tokio::test]
    async fn test_lesson_with_students_cannot_be_deleted() {
        let (catalog, location) = seeded().await;
        catalog.create_lesson_progress(2, &location).await.unwrap();

        let err = catalog.delete_lesson(&location).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_long_videos_cap_series_watch_time() {
        let (catalog, location) = seeded().await;
        let section = section_params(location.section_id);
        let body = LessonVideoBody { url: "https://youtu.be/kiwi".to_string(), watch_time: i32::MAX };

        catalog.create_video(&location, &body).await.unwrap();
        let second = catalog
            .create_lesson(&section, &CreateLessonBody { title: "Mutable".to_string() })
            .await
            .unwrap();
        catalog.create_video(&second.location(), &body).await.unwrap();

        let series = catalog.get_series(Some(&staff()), &series_params()).await.unwrap();
        assert_eq!(series.watch_time_seconds, i32::MAX);
        assert_eq!(series.read_time_seconds, 1);

        let (section, lessons) = catalog.get_section(Some(&staff()), &section).await.unwrap();
        assert_eq!(section.watch_time_seconds, i32::MAX);
        assert_eq!(lessons.len(), 2);
    }

    #[tokio::test]
    async fn test_second_progress_call_is_not_a_creation() {
        let (catalog, location) = seeded().await;

        let (_, created) = catalog.create_lesson_progress(2, &location).await.unwrap();
        assert!(created);
        let (_, created) = catalog.create_lesson_progress(2, &location).await.unwrap();
        assert!(!created);
    }
}
