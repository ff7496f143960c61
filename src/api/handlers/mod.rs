//! # HTTP Handlers
//!
//! One module per resource. Handlers pull identity and validated input
//! through the extractors, call the services on [`AppState`] and build
//! the response with the representation builders in [`crate::models`].
//!
//! [`method_router`] is the only place a [`Handler`] tag meets its
//! function.

pub mod auth;
pub mod certificates;
pub mod health;
pub mod languages;
pub mod lesson_content;
pub mod lessons;
pub mod oauth;
pub mod sections;
pub mod series;
pub mod users;

use axum::{
    body::Bytes,
    extract::Multipart,
    routing::{on, MethodRouter},
};
use tracing::warn;

use crate::{
    error::{AppError, Result},
    models::StoredObject,
    routes::{Handler, Verb},
    services::AppState,
};

/// Bind a route table entry to its handler function
pub fn method_router(verb: Verb, handler: Handler) -> MethodRouter<AppState> {
    use Handler as H;

    let filter = verb.filter();

    match handler {
        H::Health => on(filter, health::health_check),

        H::SignUp => on(filter, auth::sign_up),
        H::ConfirmEmail => on(filter, auth::confirm_email),
        H::SignIn => on(filter, auth::sign_in),
        H::ConfirmSignIn => on(filter, auth::confirm_sign_in),
        H::Refresh => on(filter, auth::refresh),
        H::ForgotPassword => on(filter, auth::forgot_password),
        H::ResetPassword => on(filter, auth::reset_password),
        H::SignOut => on(filter, auth::sign_out),
        H::UpdatePassword => on(filter, auth::update_password),
        H::UpdateEmail => on(filter, auth::update_email),

        H::GitHubSignIn => on(filter, oauth::github_sign_in),
        H::GitHubCallback => on(filter, oauth::github_callback),
        H::GoogleSignIn => on(filter, oauth::google_sign_in),
        H::GoogleCallback => on(filter, oauth::google_callback),
        H::OAuthToken => on(filter, oauth::token),

        H::ListLanguages => on(filter, languages::list),
        H::GetLanguage => on(filter, languages::get),
        H::CreateLanguage => on(filter, languages::create),
        H::UpdateLanguage => on(filter, languages::update),
        H::DeleteLanguage => on(filter, languages::delete),
        H::GetLanguageProgress => on(filter, languages::get_progress),
        H::CreateLanguageProgress => on(filter, languages::create_progress),
        H::DeleteLanguageProgress => on(filter, languages::delete_progress),

        H::ListSeries => on(filter, series::list),
        H::GetSeries => on(filter, series::get),
        H::CreateSeries => on(filter, series::create),
        H::UpdateSeries => on(filter, series::update),
        H::PublishSeries => on(filter, series::publish),
        H::DeleteSeries => on(filter, series::delete),
        H::GetSeriesPicture => on(filter, series::get_picture),
        H::UploadSeriesPicture => on(filter, series::upload_picture),
        H::DeleteSeriesPicture => on(filter, series::delete_picture),
        H::CreateSeriesProgress => on(filter, series::create_progress),
        H::DeleteSeriesProgress => on(filter, series::delete_progress),

        H::ListSections => on(filter, sections::list),
        H::GetSection => on(filter, sections::get),
        H::CreateSection => on(filter, sections::create),
        H::UpdateSection => on(filter, sections::update),
        H::PublishSection => on(filter, sections::publish),
        H::DeleteSection => on(filter, sections::delete),
        H::CreateSectionProgress => on(filter, sections::create_progress),
        H::DeleteSectionProgress => on(filter, sections::delete_progress),

        H::ListLessons => on(filter, lessons::list),
        H::GetLesson => on(filter, lessons::get),
        H::CreateLesson => on(filter, lessons::create),
        H::UpdateLesson => on(filter, lessons::update),
        H::PublishLesson => on(filter, lessons::publish),
        H::DeleteLesson => on(filter, lessons::delete),
        H::CreateLessonProgress => on(filter, lessons::create_progress),
        H::CompleteLesson => on(filter, lessons::complete),
        H::DeleteLessonProgress => on(filter, lessons::delete_progress),

        H::GetArticle => on(filter, lesson_content::get_article),
        H::CreateArticle => on(filter, lesson_content::create_article),
        H::UpdateArticle => on(filter, lesson_content::update_article),
        H::DeleteArticle => on(filter, lesson_content::delete_article),
        H::GetVideo => on(filter, lesson_content::get_video),
        H::CreateVideo => on(filter, lesson_content::create_video),
        H::UpdateVideo => on(filter, lesson_content::update_video),
        H::DeleteVideo => on(filter, lesson_content::delete_video),
        H::ListFiles => on(filter, lesson_content::list_files),
        H::GetFile => on(filter, lesson_content::get_file),
        H::UploadFile => on(filter, lesson_content::upload_file),
        H::UpdateFile => on(filter, lesson_content::update_file),
        H::DeleteFile => on(filter, lesson_content::delete_file),

        H::GetCertificate => on(filter, certificates::get),
        H::ListMyCertificates => on(filter, certificates::list_mine),

        H::GetMe => on(filter, users::get_me),
        H::UpdateMe => on(filter, users::update_me),
        H::DeleteMe => on(filter, users::delete_me),
        H::GetMyProfile => on(filter, users::get_my_profile),
        H::CreateMyProfile => on(filter, users::create_my_profile),
        H::UpdateMyProfile => on(filter, users::update_my_profile),
        H::DeleteMyProfile => on(filter, users::delete_my_profile),
        H::GetMyPicture => on(filter, users::get_my_picture),
        H::UploadMyPicture => on(filter, users::upload_my_picture),
        H::DeleteMyPicture => on(filter, users::delete_my_picture),
        H::GetUser => on(filter, users::get_user),
        H::GetUserProfile => on(filter, users::get_user_profile),
        H::GetUserPicture => on(filter, users::get_user_picture),
    }
}

// =====================================
// Stored objects
// =====================================
/// Deletes what a catalog removal orphaned. Failures are logged, not returned.
pub async fn remove_objects(state: &AppState, objects: Vec<StoredObject>) {
    for object in objects {
        if let Err(e) = state.storage.delete(object.id, &object.ext).await {
            warn!(object_id = %object.id, error = %e, "Failed to remove stored object");
        }
    }
}

// =====================================
// Multipart uploads
// =====================================
/// A multipart form with a `file` part and an optional `name` text part
#[derive(Debug)]
pub struct Upload {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub name: Option<String>,
}

pub async fn read_upload(mut multipart: Multipart) -> Result<Upload> {
    let malformed = |e: axum::extract::multipart::MultipartError| AppError::BadRequest(format!("Invalid multipart body: {}", e));

    let mut file = None;
    let mut name = None;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let field_name = field.name().map(ToString::to_string);

        match field_name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field.bytes().await.map_err(malformed)?;
                file = Some((bytes, content_type));
            }
            Some("name") => {
                name = Some(field.text().await.map_err(malformed)?);
            }
            _ => {}
        }
    }

    let (bytes, content_type) = file.ok_or_else(|| AppError::BadRequest("Missing file part".to_string()))?;

    Ok(Upload {
        bytes,
        content_type,
        name,
    })
}
