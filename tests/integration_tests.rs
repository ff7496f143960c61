//! # Integration Tests
//!
//! End-to-end checks through the public API of the crate: configuration,
//! errors, helpers, and the full router driven with `tower::ServiceExt`.
//!
//! ```bash
//! cargo test --test integration_tests
//! cargo test api_tests
//! ```

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use kiwiscript_api::{
    api::create_router,
    config::ConfigBuilder,
    models::SignUpBody,
    services::{AppState, AuthService, FileStorage, MemoryCatalog, MemoryStorage},
};

const DOMAIN: &str = "api.kiwi.test";
const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 8 8"></svg>"#;
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01";

// =====================================
// Harness
// =====================================
struct TestApp {
    router: Router,
    storage: Arc<MemoryStorage>,
    admin: String,
    staff: String,
    learner: String,
}

fn sign_up_body(email: &str, first_name: &str) -> SignUpBody {
    SignUpBody {
        email: email.to_string(),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        location: "PRT".to_string(),
        password: "Sup3rSecret!".to_string(),
        password2: "Sup3rSecret!".to_string(),
    }
}

async fn test_app() -> TestApp {
    let config = Arc::new(
        ConfigBuilder::new()
            .backend_domain(DOMAIN)
            .frontend_domain("kiwi.test")
            .github_client_id("github-client")
            .build(),
    );

    let accounts = Arc::new(AuthService::new(config.clone()));
    let admin = accounts
        .register_confirmed(&sign_up_body("admin@kiwi.test", "Ada"), true, true)
        .await
        .unwrap();
    let staff = accounts
        .register_confirmed(&sign_up_body("staff@kiwi.test", "Sam"), false, true)
        .await
        .unwrap();
    let learner = accounts
        .register_confirmed(&sign_up_body("learner@kiwi.test", "Lea"), false, false)
        .await
        .unwrap();

    let admin = accounts.issue_auth(admin.id).unwrap().access_token;
    let staff = accounts.issue_auth(staff.id).unwrap().access_token;
    let learner = accounts.issue_auth(learner.id).unwrap().access_token;

    let storage = Arc::new(MemoryStorage::new(config.clone()));
    let state = AppState::with_services(config, Arc::new(MemoryCatalog::new()), accounts, storage.clone());

    TestApp {
        router: create_router(state),
        storage,
        admin,
        staff,
        learner,
    }
}

impl TestApp {
    async fn raw(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.raw(request).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    async fn upload(&self, uri: &str, token: &str, parts: &[(&str, Option<&str>, &[u8])]) -> (StatusCode, Value) {
        let boundary = "kiwi-boundary";
        let mut body = Vec::new();

        for (name, content_type, bytes) in parts {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            match content_type {
                Some(content_type) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"upload\"\r\nContent-Type: {}\r\n\r\n",
                        name, content_type
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes()),
            }
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();

        let response = self.raw(request).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

/// Paths of a seeded catalog, relative to the server root
struct Seeded {
    series: String,
    section: String,
    lesson: String,
}

/// Rust > Ownership > one section > one lesson with an article.
/// Everything is published when `publish` is set.
async fn seed(app: &TestApp, publish: bool) -> Seeded {
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/languages",
            Some(&app.admin),
            Some(json!({ "name": "Rust", "icon": ICON })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let series = "/api/v1/languages/rust/series/ownership".to_string();
    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/languages/rust/series",
            Some(&app.staff),
            Some(json!({ "title": "Ownership", "description": "Moves and borrows" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("{}/sections", series),
            Some(&app.staff),
            Some(json!({ "title": "Borrowing", "description": "Shared and mutable references" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let section = format!("{}/sections/{}", series, body["id"]);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("{}/lessons", section),
            Some(&app.staff),
            Some(json!({ "title": "Shared references" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let lesson = format!("{}/lessons/{}", section, body["id"]);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("{}/article", lesson),
            Some(&app.staff),
            Some(json!({ "content": "A shared reference lets many readers look at a value at once." })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    if publish {
        for path in [&lesson, &section, &series] {
            let (status, _) = app
                .call(
                    Method::PATCH,
                    &format!("{}/publish", path),
                    Some(&app.staff),
                    Some(json!({ "isPublished": true })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "publishing {}", path);
        }
    }

    Seeded { series, section, lesson }
}

fn href(path: &str) -> String {
    format!("https://{}{}", DOMAIN, path)
}

// =====================================
// Config
// =====================================
mod config_tests {
    use kiwiscript_api::config::{Config, ConfigBuilder, Environment, DEFAULT_JWT_SECRET};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert!(config.environment.is_development());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .port(8080)
            .backend_domain("api.kiwiscript.com")
            .frontend_domain("kiwiscript.com")
            .build();

        assert_eq!(config.server_addr(), "127.0.0.1:8080");
        assert_eq!(config.frontend_callback_url(), "https://kiwiscript.com/auth/callback");
    }

    #[test]
    fn test_environment_conversion() {
        assert_eq!(Environment::from("prod".to_string()), Environment::Production);
        assert_eq!(Environment::from("TEST".to_string()), Environment::Testing);
        assert_eq!(Environment::from("anything".to_string()), Environment::Development);
    }

    #[test]
    fn test_production_rejects_default_secret() {
        tokio_test::assert_err!(ConfigBuilder::new()
            .environment(Environment::Production)
            .build_validated());

        tokio_test::assert_ok!(ConfigBuilder::new()
            .environment(Environment::Production)
            .jwt_secret("a-real-secret")
            .build_validated());
    }

    #[test]
    fn test_backend_domain_must_be_bare_host() {
        let config = ConfigBuilder::new().backend_domain("https://api.kiwiscript.com").build();
        assert!(config.validate().is_err());
    }
}

// =====================================
// Errors
// =====================================
mod error_tests {
    use axum::http::StatusCode;
    use kiwiscript_api::error::{AppError, OptionExt};

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthorized().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden().status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::Upstream("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_is_server_error() {
        assert!(AppError::Internal("x".into()).is_server_error());
        assert!(!AppError::NotFound("x".into()).is_server_error());
    }

    #[test]
    fn test_option_extension() {
        let missing: Option<i32> = None;
        let err = missing.ok_or_not_found("Lesson not found").unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Lesson not found"));
        assert_eq!(Some(3).ok_or_not_found("unused").unwrap(), 3);
    }
}

// =====================================
// Utils
// =====================================
mod utils_tests {
    use kiwiscript_api::utils;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify() {
        assert_eq!(utils::slugify("Ownership"), "ownership");
        assert_eq!(utils::slugify("Smart  Pointers!"), "smart-pointers");
    }

    #[test]
    fn test_validators() {
        assert!(utils::validate_slug("c-plus-plus").is_ok());
        assert!(utils::validate_slug("Not A Slug").is_err());
        assert!(utils::validate_ext_alphanum("C++").is_ok());
        assert!(utils::validate_svg(super::ICON).is_ok());
        assert!(utils::validate_svg("<div></div>").is_err());
    }

    #[test]
    fn test_reading_time_rounds_up() {
        assert_eq!(utils::reading_time_seconds("word"), 1);
        assert_eq!(utils::reading_time_seconds(""), 0);
    }

    #[test]
    fn test_generated_codes() {
        let code = utils::generate_numeric_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let token = utils::generate_secure_token(32);
        assert!(utils::validate_hexadecimal(&token).is_ok());
    }
}

// =====================================
// Router
// =====================================
mod api_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = app.get("/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = test_app().await;
        let (status, body) = app.get("/api/v1/nowhere", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status_code"], 404);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/health")
            .header("X-Request-Id", "trace-me")
            .body(Body::empty())
            .unwrap();

        let response = app.raw(request).await;
        assert_eq!(response.headers()["X-Request-Id"], "trace-me");
        assert_eq!(response.headers()["X-Content-Type-Options"], "nosniff");
    }

    #[tokio::test]
    async fn test_empty_language_list_envelope() {
        let app = test_app().await;
        let (status, body) = app.get("/api/v1/languages", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 0);
        assert_eq!(body["results"], json!([]));
        assert_eq!(
            body["_links"]["self"]["href"],
            href("/api/v1/languages?limit=25&offset=0")
        );
        assert!(body["_links"].get("next").is_none());
        assert!(body["_links"].get("previous").is_none());
    }

    #[tokio::test]
    async fn test_language_guards() {
        let app = test_app().await;
        let body = json!({ "name": "Go", "icon": ICON });

        let (status, _) = app.call(Method::POST, "/api/v1/languages", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .call(Method::POST, "/api/v1/languages", Some(&app.staff), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(Method::POST, "/api/v1/languages", Some("not.a.token"), Some(body.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app
            .call(Method::POST, "/api/v1/languages", Some(&app.admin), Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["slug"], "go");
        assert_eq!(body["_links"]["self"]["href"], href("/api/v1/languages/go"));
    }

    #[tokio::test]
    async fn test_bad_input() {
        let app = test_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/languages")
            .header(header::AUTHORIZATION, format!("Bearer {}", app.admin))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        assert_eq!(app.raw(request).await.status(), StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(
                Method::POST,
                "/api/v1/languages",
                Some(&app.admin),
                Some(json!({ "name": "Go", "icon": "<div/>" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app.get("/api/v1/languages?limit=0", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app.get("/api/v1/languages?offset=9223372036854775807", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_drafts_are_hidden_until_published() {
        let app = test_app().await;
        let seeded = seed(&app, false).await;

        let (status, _) = app.get(&seeded.series, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.get(&seeded.lesson, Some(&app.learner)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app.get(&seeded.series, Some(&app.staff)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isPublished"], false);
    }

    #[tokio::test]
    async fn test_publishing_requires_content() {
        let app = test_app().await;
        let seeded = seed(&app, false).await;

        // The section has no published lesson yet
        let (status, _) = app
            .call(
                Method::PATCH,
                &format!("{}/publish", seeded.section),
                Some(&app.staff),
                Some(json!({ "isPublished": true })),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_published_catalog_links() {
        let app = test_app().await;
        let seeded = seed(&app, true).await;

        let (status, series) = app.get(&seeded.series, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(series["_links"]["self"]["href"], href(&seeded.series));
        assert_eq!(series["_links"]["sections"]["href"], href(&format!("{}/sections", seeded.series)));
        assert!(series["_links"].get("picture").is_none());
        assert_eq!(series["_embedded"]["author"]["firstName"], "Sam");

        let (status, section) = app.get(&seeded.section, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(section["_embedded"]["lessons"].as_array().map(Vec::len), Some(1));

        let (status, lesson) = app.get(&seeded.lesson, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(lesson["_links"]["article"]["href"], href(&format!("{}/article", seeded.lesson)));
        assert!(lesson["_links"].get("video").is_none());
        assert!(lesson["_embedded"]["article"]["content"].is_string());

        let (status, page) = app.get(&format!("{}/lessons?limit=1", seeded.section), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 1);
        assert!(page["_links"].get("next").is_none());
    }

    #[tokio::test]
    async fn test_series_listing_carries_filters() {
        let app = test_app().await;
        seed(&app, true).await;

        let (status, page) = app
            .get("/api/v1/languages/rust/series?search=own&sortBy=slug&limit=10", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 1);
        assert_eq!(
            page["_links"]["self"]["href"],
            href("/api/v1/languages/rust/series?search=own&sortBy=slug&limit=10&offset=0")
        );
    }

    #[tokio::test]
    async fn test_completing_the_last_lesson_issues_a_certificate() {
        let app = test_app().await;
        let seeded = seed(&app, true).await;

        let (status, _) = app
            .call(Method::POST, &format!("{}/progress", seeded.lesson), Some(&app.learner), None)
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app
            .call(Method::POST, &format!("{}/progress", seeded.lesson), Some(&app.learner), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, lesson) = app
            .call(
                Method::PATCH,
                &format!("{}/progress/complete", seeded.lesson),
                Some(&app.learner),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(lesson["isCompleted"], true);

        let certificate_href = lesson["_links"]["certificate"]["href"]
            .as_str()
            .expect("certificate link")
            .to_string();
        let certificate_path = certificate_href.trim_start_matches(&format!("https://{}", DOMAIN));

        let (status, certificate) = app.get(certificate_path, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(certificate["seriesTitle"], "Ownership");
        assert_eq!(certificate["firstName"], "Lea");

        let (status, mine) = app.get("/api/v1/users/me/certificates", Some(&app.learner)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine["count"], 1);

        // Students now block deletion
        let (status, _) = app.call(Method::DELETE, &seeded.lesson, Some(&app.staff), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_progress_requires_a_user() {
        let app = test_app().await;
        let seeded = seed(&app, true).await;

        let (status, _) = app
            .call(Method::POST, &format!("{}/progress", seeded.series), None, None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_series_picture_upload() {
        let app = test_app().await;
        let seeded = seed(&app, true).await;
        let picture = format!("{}/picture", seeded.series);

        let (status, body) = app
            .upload(&picture, &app.staff, &[("file", Some("image/png"), PNG_BYTES)])
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["ext"], "png");
        assert_eq!(body["_links"]["self"]["href"], href(&picture));

        let (_, series) = app.get(&seeded.series, None).await;
        assert_eq!(series["_links"]["picture"]["href"], href(&picture));
        assert_eq!(series["_embedded"]["picture"]["url"], body["url"]);

        let (status, _) = app
            .upload(&picture, &app.staff, &[("file", Some("application/pdf"), b"%PDF-1.7")])
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app.call(Method::DELETE, &picture, Some(&app.staff), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.get(&picture, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lesson_files() {
        let app = test_app().await;
        let seeded = seed(&app, true).await;
        let files = format!("{}/files", seeded.lesson);

        let (status, file) = app
            .upload(
                &files,
                &app.staff,
                &[
                    ("name", None, b"Cheat sheet"),
                    ("file", Some("application/pdf"), b"%PDF-1.7 content"),
                ],
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(file["ext"], "pdf");

        let file_href = file["_links"]["self"]["href"].as_str().unwrap().to_string();
        assert!(file_href.starts_with(&href(&files)));

        let (status, list) = app.get(&files, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().map(Vec::len), Some(1));

        let (_, lesson) = app.get(&seeded.lesson, None).await;
        assert_eq!(lesson["_embedded"]["files"][0]["name"], "Cheat sheet");
    }

    #[tokio::test]
    async fn test_cascading_deletes_remove_stored_objects() {
        let app = test_app().await;
        let seeded = seed(&app, false).await;

        let (status, file) = app
            .upload(
                &format!("{}/files", seeded.lesson),
                &app.staff,
                &[("name", None, b"Slides"), ("file", Some("application/pdf"), b"%PDF-1.7 slides")],
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let file_id = file["id"].as_str().unwrap().parse().unwrap();

        let (status, picture) = app
            .upload(&format!("{}/picture", seeded.series), &app.staff, &[("file", Some("image/png"), PNG_BYTES)])
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let picture_id = picture["id"].as_str().unwrap().parse().unwrap();

        assert!(app.storage.url(file_id, "pdf").await.is_some());

        let (status, _) = app.call(Method::DELETE, &seeded.section, Some(&app.staff), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(app.storage.url(file_id, "pdf").await.is_none());
        assert!(app.storage.url(picture_id, "png").await.is_some());

        let (status, _) = app
            .call(Method::DELETE, "/api/v1/languages/rust", Some(&app.admin), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(app.storage.url(picture_id, "png").await.is_none());
    }

    #[tokio::test]
    async fn test_me_and_public_profile() {
        let app = test_app().await;

        let (status, _) = app.get("/api/v1/users/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, me) = app.get("/api/v1/users/me", Some(&app.learner)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(me.get("email").is_none());
        assert!(me.get("_embedded").is_none());
        let id = me["id"].as_i64().unwrap();

        let (status, profile) = app
            .call(
                Method::POST,
                "/api/v1/users/me/profile",
                Some(&app.learner),
                Some(json!({ "bio": "Learning Rust", "github": "https://github.com/lea" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(profile["_links"]["self"]["href"], href(&format!("/api/v1/users/{}/profile", id)));

        let (status, public) = app.get(&format!("/api/v1/users/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(public["_embedded"]["profile"]["bio"], "Learning Rust");
    }

    #[tokio::test]
    async fn test_github_sign_in_redirects() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/auth/ext/github")
            .body(Body::empty())
            .unwrap();

        let response = app.raw(request).await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(location.contains("client_id=github-client"));

        let (status, _) = app.get("/api/auth/ext/google", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sign_out_requires_user() {
        let app = test_app().await;
        let (status, _) = app
            .call(
                Method::POST,
                "/api/auth/logout",
                None,
                Some(json!({ "refreshToken": "aa.bb.cc" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

// =====================================
// Property-based tests
// =====================================
mod property_tests {
    use std::collections::HashMap;

    use kiwiscript_api::models::{
        Lesson, LessonDetail, LessonFile, LessonFileResponse, LessonResponse, PaginatedResponse, PaginationQuery,
        ResourcePath, OFFSET_MAX,
    };
    use proptest::prelude::*;

    fn lesson(id: i32, section_id: i32) -> Lesson {
        Lesson {
            id,
            title: "Lesson".to_string(),
            language_slug: "rust".to_string(),
            series_slug: "ownership".to_string(),
            section_id,
            position: 1,
            watch_time_seconds: 0,
            read_time_seconds: 0,
            is_published: true,
            is_completed: false,
        }
    }

    proptest! {
        #[test]
        fn navigation_links_follow_offsets(limit in 1i64..=100, offset in 0i64..=OFFSET_MAX, count in 0i64..=OFFSET_MAX) {
            let params = PaginationQuery { limit, offset };
            let page = PaginatedResponse::new("kiwi.io", &ResourcePath::languages(), &params, count, Vec::<i32>::new(), |n| n);

            prop_assert_eq!(page.links.next.is_some(), offset + limit < count);
            prop_assert_eq!(page.links.prev.is_some(), offset - limit > 0);
            prop_assert!(page.results.is_empty());
            prop_assert_eq!(page.count, count);
        }

        #[test]
        fn lessons_without_content_have_no_content_links(id in 1i32..10_000, section_id in 1i32..10_000) {
            let detail = LessonDetail {
                lesson: lesson(id, section_id),
                article: None,
                video: None,
                files: Vec::new(),
            };
            let response = LessonResponse::with_embeds("kiwi.io", &detail, &HashMap::new());

            prop_assert!(response.links.article.is_none());
            prop_assert!(response.links.video.is_none());
            prop_assert!(response.embedded.is_none());
        }

        #[test]
        fn file_links_extend_the_lesson_link(id in 1i32..10_000, bytes in any::<[u8; 16]>()) {
            let lesson = lesson(id, 3);
            let file = LessonFile {
                id: uuid::Uuid::from_bytes(bytes),
                lesson_id: id,
                name: "Notes".to_string(),
                ext: "pdf".to_string(),
            };

            let response = LessonFileResponse::from_record("kiwi.io", &lesson.location(), &file, "https://objects/x.pdf");
            let lesson_href = lesson.path().href("kiwi.io");
            let suffix = format!("/files/{}", file.id);

            prop_assert_eq!(response.links.self_link.href.strip_suffix(&suffix), Some(lesson_href.as_str()));
            prop_assert_eq!(response.links.lesson.href, lesson_href);
        }
    }
}
