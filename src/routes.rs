//! # Route Table
//!
//! Every endpoint as data: verb, path template below the `/api` mount,
//! guards and the handler it binds to. [`crate::api::create_router`] turns
//! the table into an axum `Router`; nothing else registers routes.
//!
//! Templates are built from the same constants as [`ResourcePath`], so an
//! href produced by a representation builder always lands on a `GET` entry
//! of this table.
//!
//! [`ResourcePath`]: crate::models::ResourcePath

use axum::routing::MethodFilter;
use once_cell::sync::Lazy;

use crate::models::links::{
    ARTICLE, AUTH, CERTIFICATES, CERTIFICATES_V1, COMPLETE, FILES, HEALTH, LANGUAGES_V1, LESSONS, ME, OAUTH,
    PICTURE, PROFILE, PROGRESS, PUBLISH, SECTIONS, SERIES, USERS_V1, VIDEO,
};

/// HTTP method of a route table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Reads; never mutates the catalog or accounts
    Get,
    /// Creations and other non-idempotent actions
    Post,
    /// Full replacement of a resource or its content
    Put,
    /// Partial updates such as publish toggles and completion
    Patch,
    Delete,
}

impl Verb {
    /// Method filter axum routes on
    #[must_use]
    pub fn filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Patch => MethodFilter::PATCH,
            Self::Delete => MethodFilter::DELETE,
        }
    }
}

/// Access rule checked before the handler runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Any valid access token (401 otherwise)
    Authenticated,
    /// Staff or admin (401 without a token, 403 without the role)
    Staff,
    /// Admin only (401 / 403)
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Health,

    // Auth
    SignUp,
    ConfirmEmail,
    SignIn,
    ConfirmSignIn,
    Refresh,
    ForgotPassword,
    ResetPassword,
    SignOut,
    UpdatePassword,
    UpdateEmail,

    // OAuth
    GitHubSignIn,
    GitHubCallback,
    GoogleSignIn,
    GoogleCallback,
    OAuthToken,

    // Languages
    ListLanguages,
    GetLanguage,
    CreateLanguage,
    UpdateLanguage,
    DeleteLanguage,
    GetLanguageProgress,
    CreateLanguageProgress,
    DeleteLanguageProgress,

    // Series
    ListSeries,
    GetSeries,
    CreateSeries,
    UpdateSeries,
    PublishSeries,
    DeleteSeries,
    GetSeriesPicture,
    UploadSeriesPicture,
    DeleteSeriesPicture,
    CreateSeriesProgress,
    DeleteSeriesProgress,

    // Sections
    ListSections,
    GetSection,
    CreateSection,
    UpdateSection,
    PublishSection,
    DeleteSection,
    CreateSectionProgress,
    DeleteSectionProgress,

    // Lessons
    ListLessons,
    GetLesson,
    CreateLesson,
    UpdateLesson,
    PublishLesson,
    DeleteLesson,
    CreateLessonProgress,
    CompleteLesson,
    DeleteLessonProgress,

    // Lesson content
    GetArticle,
    CreateArticle,
    UpdateArticle,
    DeleteArticle,
    GetVideo,
    CreateVideo,
    UpdateVideo,
    DeleteVideo,
    ListFiles,
    GetFile,
    UploadFile,
    UpdateFile,
    DeleteFile,

    // Certificates
    GetCertificate,
    ListMyCertificates,

    // Users
    GetMe,
    UpdateMe,
    DeleteMe,
    GetMyProfile,
    CreateMyProfile,
    UpdateMyProfile,
    DeleteMyProfile,
    GetMyPicture,
    UploadMyPicture,
    DeleteMyPicture,
    GetUser,
    GetUserProfile,
    GetUserPicture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    pub method: Verb,
    /// axum template relative to `/api`, e.g. `/v1/languages/:languageSlug`
    pub path: String,
    pub guards: &'static [Guard],
    pub handler: Handler,
}

impl RouteSpec {
    fn new(method: Verb, path: impl Into<String>, guards: &'static [Guard], handler: Handler) -> Self {
        Self {
            method,
            path: path.into(),
            guards,
            handler,
        }
    }

    /// Whether a concrete path (no query) fits this template
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let template = self.path.split('/');
        let concrete = path.split('/');

        template.clone().count() == concrete.clone().count()
            && template.zip(concrete).all(|(t, c)| {
                if t.starts_with(':') {
                    !c.is_empty()
                } else {
                    t == c
                }
            })
    }
}

const PUBLIC: &[Guard] = &[];
const USER: &[Guard] = &[Guard::Authenticated];
const STAFF: &[Guard] = &[Guard::Staff];
const ADMIN: &[Guard] = &[Guard::Admin];

/// The full endpoint table
pub static ROUTES: Lazy<Vec<RouteSpec>> = Lazy::new(build_routes);

/// First route serving `method` on a concrete path
#[must_use]
pub fn resolve(method: Verb, path: &str) -> Option<&'static RouteSpec> {
    ROUTES.iter().find(|r| r.method == method && r.matches(path))
}

fn build_routes() -> Vec<RouteSpec> {
    use Handler as H;
    use Verb::{Delete, Get, Patch, Post, Put};

    let language = format!("{LANGUAGES_V1}/:languageSlug");
    let series_list = format!("{language}{SERIES}");
    let series = format!("{series_list}/:seriesSlug");
    let sections = format!("{series}{SECTIONS}");
    let section = format!("{sections}/:sectionID");
    let lessons = format!("{section}{LESSONS}");
    let lesson = format!("{lessons}/:lessonID");
    let files = format!("{lesson}{FILES}");
    let file = format!("{files}/:fileID");
    let me = format!("{USERS_V1}{ME}");
    let user = format!("{USERS_V1}/:userID");

    vec![
        RouteSpec::new(Get, HEALTH, PUBLIC, H::Health),
        // ----------------------------------------
        // Auth
        // ----------------------------------------
        RouteSpec::new(Post, format!("{AUTH}/register"), PUBLIC, H::SignUp),
        RouteSpec::new(Post, format!("{AUTH}/confirm-email"), PUBLIC, H::ConfirmEmail),
        RouteSpec::new(Post, format!("{AUTH}/login"), PUBLIC, H::SignIn),
        RouteSpec::new(Post, format!("{AUTH}/login/confirm"), PUBLIC, H::ConfirmSignIn),
        RouteSpec::new(Post, format!("{AUTH}/refresh"), PUBLIC, H::Refresh),
        RouteSpec::new(Post, format!("{AUTH}/forgot-password"), PUBLIC, H::ForgotPassword),
        RouteSpec::new(Post, format!("{AUTH}/reset-password"), PUBLIC, H::ResetPassword),
        RouteSpec::new(Post, format!("{AUTH}/logout"), USER, H::SignOut),
        RouteSpec::new(Post, format!("{AUTH}/update-password"), USER, H::UpdatePassword),
        RouteSpec::new(Post, format!("{AUTH}/update-email"), USER, H::UpdateEmail),
        // ----------------------------------------
        // OAuth
        // ----------------------------------------
        RouteSpec::new(Get, format!("{OAUTH}/github"), PUBLIC, H::GitHubSignIn),
        RouteSpec::new(Get, format!("{OAUTH}/github/callback"), PUBLIC, H::GitHubCallback),
        RouteSpec::new(Get, format!("{OAUTH}/google"), PUBLIC, H::GoogleSignIn),
        RouteSpec::new(Get, format!("{OAUTH}/google/callback"), PUBLIC, H::GoogleCallback),
        RouteSpec::new(Post, format!("{OAUTH}/token"), PUBLIC, H::OAuthToken),
        // ----------------------------------------
        // Languages
        // ----------------------------------------
        RouteSpec::new(Get, LANGUAGES_V1, PUBLIC, H::ListLanguages),
        RouteSpec::new(Post, LANGUAGES_V1, ADMIN, H::CreateLanguage),
        RouteSpec::new(Get, language.as_str(), PUBLIC, H::GetLanguage),
        RouteSpec::new(Put, language.as_str(), ADMIN, H::UpdateLanguage),
        RouteSpec::new(Delete, language.as_str(), ADMIN, H::DeleteLanguage),
        RouteSpec::new(Get, format!("{language}{PROGRESS}"), USER, H::GetLanguageProgress),
        RouteSpec::new(Post, format!("{language}{PROGRESS}"), USER, H::CreateLanguageProgress),
        RouteSpec::new(Delete, format!("{language}{PROGRESS}"), USER, H::DeleteLanguageProgress),
        // ----------------------------------------
        // Series
        // ----------------------------------------
        RouteSpec::new(Get, series_list.as_str(), PUBLIC, H::ListSeries),
        RouteSpec::new(Post, series_list.as_str(), STAFF, H::CreateSeries),
        RouteSpec::new(Get, series.as_str(), PUBLIC, H::GetSeries),
        RouteSpec::new(Put, series.as_str(), STAFF, H::UpdateSeries),
        RouteSpec::new(Delete, series.as_str(), STAFF, H::DeleteSeries),
        RouteSpec::new(Patch, format!("{series}{PUBLISH}"), STAFF, H::PublishSeries),
        RouteSpec::new(Get, format!("{series}{PICTURE}"), PUBLIC, H::GetSeriesPicture),
        RouteSpec::new(Post, format!("{series}{PICTURE}"), STAFF, H::UploadSeriesPicture),
        RouteSpec::new(Delete, format!("{series}{PICTURE}"), STAFF, H::DeleteSeriesPicture),
        RouteSpec::new(Post, format!("{series}{PROGRESS}"), USER, H::CreateSeriesProgress),
        RouteSpec::new(Delete, format!("{series}{PROGRESS}"), USER, H::DeleteSeriesProgress),
        // ----------------------------------------
        // Sections
        // ----------------------------------------
        RouteSpec::new(Get, sections.as_str(), PUBLIC, H::ListSections),
        RouteSpec::new(Post, sections.as_str(), STAFF, H::CreateSection),
        RouteSpec::new(Get, section.as_str(), PUBLIC, H::GetSection),
        RouteSpec::new(Put, section.as_str(), STAFF, H::UpdateSection),
        RouteSpec::new(Delete, section.as_str(), STAFF, H::DeleteSection),
        RouteSpec::new(Patch, format!("{section}{PUBLISH}"), STAFF, H::PublishSection),
        RouteSpec::new(Post, format!("{section}{PROGRESS}"), USER, H::CreateSectionProgress),
        RouteSpec::new(Delete, format!("{section}{PROGRESS}"), USER, H::DeleteSectionProgress),
        // ----------------------------------------
        // Lessons
        // ----------------------------------------
        RouteSpec::new(Get, lessons.as_str(), PUBLIC, H::ListLessons),
        RouteSpec::new(Post, lessons.as_str(), STAFF, H::CreateLesson),
        RouteSpec::new(Get, lesson.as_str(), PUBLIC, H::GetLesson),
        RouteSpec::new(Put, lesson.as_str(), STAFF, H::UpdateLesson),
        RouteSpec::new(Delete, lesson.as_str(), STAFF, H::DeleteLesson),
        RouteSpec::new(Patch, format!("{lesson}{PUBLISH}"), STAFF, H::PublishLesson),
        RouteSpec::new(Post, format!("{lesson}{PROGRESS}"), USER, H::CreateLessonProgress),
        RouteSpec::new(Delete, format!("{lesson}{PROGRESS}"), USER, H::DeleteLessonProgress),
        RouteSpec::new(Patch, format!("{lesson}{PROGRESS}{COMPLETE}"), USER, H::CompleteLesson),
        // ----------------------------------------
        // Lesson content
        // ----------------------------------------
        RouteSpec::new(Get, format!("{lesson}{ARTICLE}"), PUBLIC, H::GetArticle),
        RouteSpec::new(Post, format!("{lesson}{ARTICLE}"), STAFF, H::CreateArticle),
        RouteSpec::new(Put, format!("{lesson}{ARTICLE}"), STAFF, H::UpdateArticle),
        RouteSpec::new(Delete, format!("{lesson}{ARTICLE}"), STAFF, H::DeleteArticle),
        RouteSpec::new(Get, format!("{lesson}{VIDEO}"), PUBLIC, H::GetVideo),
        RouteSpec::new(Post, format!("{lesson}{VIDEO}"), STAFF, H::CreateVideo),
        RouteSpec::new(Put, format!("{lesson}{VIDEO}"), STAFF, H::UpdateVideo),
        RouteSpec::new(Delete, format!("{lesson}{VIDEO}"), STAFF, H::DeleteVideo),
        RouteSpec::new(Get, files.as_str(), PUBLIC, H::ListFiles),
        RouteSpec::new(Post, files.as_str(), STAFF, H::UploadFile),
        RouteSpec::new(Get, file.as_str(), PUBLIC, H::GetFile),
        RouteSpec::new(Put, file.as_str(), STAFF, H::UpdateFile),
        RouteSpec::new(Delete, file.as_str(), STAFF, H::DeleteFile),
        // ----------------------------------------
        // Certificates
        // ----------------------------------------
        RouteSpec::new(Get, format!("{CERTIFICATES_V1}/:certificateID"), PUBLIC, H::GetCertificate),
        RouteSpec::new(Get, format!("{me}{CERTIFICATES}"), USER, H::ListMyCertificates),
        // ----------------------------------------
        // Users
        // ----------------------------------------
        RouteSpec::new(Get, me.as_str(), USER, H::GetMe),
        RouteSpec::new(Put, me.as_str(), USER, H::UpdateMe),
        RouteSpec::new(Delete, me.as_str(), USER, H::DeleteMe),
        RouteSpec::new(Get, format!("{me}{PROFILE}"), USER, H::GetMyProfile),
        RouteSpec::new(Post, format!("{me}{PROFILE}"), USER, H::CreateMyProfile),
        RouteSpec::new(Put, format!("{me}{PROFILE}"), USER, H::UpdateMyProfile),
        RouteSpec::new(Delete, format!("{me}{PROFILE}"), USER, H::DeleteMyProfile),
        RouteSpec::new(Get, format!("{me}{PICTURE}"), USER, H::GetMyPicture),
        RouteSpec::new(Post, format!("{me}{PICTURE}"), USER, H::UploadMyPicture),
        RouteSpec::new(Delete, format!("{me}{PICTURE}"), USER, H::DeleteMyPicture),
        RouteSpec::new(Get, user.as_str(), PUBLIC, H::GetUser),
        RouteSpec::new(Get, format!("{user}{PROFILE}"), PUBLIC, H::GetUserProfile),
        RouteSpec::new(Get, format!("{user}{PICTURE}"), PUBLIC, H::GetUserPicture),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourcePath;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn test_no_duplicate_bindings() {
        let mut seen = HashSet::new();
        for route in ROUTES.iter() {
            assert!(
                seen.insert((route.method, route.path.clone())),
                "duplicate route {:?} {}",
                route.method,
                route.path
            );
        }
    }

    #[test]
    fn test_every_handler_is_bound_once() {
        let handlers: HashSet<Handler> = ROUTES.iter().map(|r| r.handler).collect();
        assert_eq!(handlers.len(), ROUTES.len());
    }

    #[test]
    fn test_builder_paths_resolve_to_get_routes() {
        let lesson = ResourcePath::language("rust").series("ownership").section(3).lesson(7);
        let paths = [
            ResourcePath::languages(),
            ResourcePath::language("rust").series_list(),
            ResourcePath::language("rust").series("ownership").picture(),
            ResourcePath::language("rust").series("ownership").sections(),
            ResourcePath::language("rust").series("ownership").section(3).lessons(),
            lesson.clone(),
            lesson.clone().article(),
            lesson.clone().video(),
            lesson.clone().file(uuid::Uuid::nil()),
            ResourcePath::user(4).profile(),
            ResourcePath::me().user_certificates(),
            ResourcePath::certificate(uuid::Uuid::nil()),
        ];

        for path in paths {
            assert!(resolve(Verb::Get, path.as_str()).is_some(), "no GET route for {path}");
        }
    }

    #[test]
    fn test_static_me_and_user_id_do_not_clash() {
        assert_eq!(resolve(Verb::Get, "/v1/users/me").map(|r| r.handler), Some(Handler::GetMe));
        assert_eq!(resolve(Verb::Get, "/v1/users/12").map(|r| r.handler), Some(Handler::GetUser));
    }

    #[test]
    fn test_guards() {
        let create = resolve(Verb::Post, "/v1/languages").unwrap();
        assert_eq!(create.guards, &[Guard::Admin]);

        let complete = resolve(Verb::Patch, "/v1/languages/rust/series/own/sections/1/lessons/2/progress/complete").unwrap();
        assert_eq!(complete.guards, &[Guard::Authenticated]);
    }
}
