//! # Hyperlinks
//!
//! Link values and the path builder every representation uses.
//!
//! All hrefs have the form `https://{backend_domain}/api{path}`. Paths are
//! assembled from the same segment constants the route table uses, so a
//! link always points at a routable `GET`.

use std::fmt;

use serde::{Deserialize, Serialize};

// =====================================
// Path segments
// =====================================
pub const API_PREFIX: &str = "/api";

pub const LANGUAGES_V1: &str = "/v1/languages";
pub const USERS_V1: &str = "/v1/users";
pub const CERTIFICATES_V1: &str = "/v1/certificates";

pub const SERIES: &str = "/series";
pub const SECTIONS: &str = "/sections";
pub const LESSONS: &str = "/lessons";
pub const ARTICLE: &str = "/article";
pub const VIDEO: &str = "/video";
pub const FILES: &str = "/files";
pub const PICTURE: &str = "/picture";
pub const PROFILE: &str = "/profile";
pub const PROGRESS: &str = "/progress";
pub const PUBLISH: &str = "/publish";
pub const COMPLETE: &str = "/complete";
pub const CERTIFICATES: &str = "/certificates";
pub const ME: &str = "/me";

pub const AUTH: &str = "/auth";
pub const OAUTH: &str = "/auth/ext";
pub const HEALTH: &str = "/health";

// =====================================
// LinkResponse
// =====================================
/// A single hyperlink, serialized as `{"href": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResponse {
    pub href: String,
}

impl LinkResponse {
    #[must_use]
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }

    /// An empty href stands for "no link"; this turns it into `None`.
    #[must_use]
    pub fn non_empty(self) -> Option<Self> {
        if self.href.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// `_links` block of embeds that only point at themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfLinkResponse {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
}

impl SelfLinkResponse {
    #[must_use]
    pub fn new(self_link: LinkResponse) -> Self {
        Self { self_link }
    }
}

// =====================================
// ResourcePath
// =====================================
/// Path of a resource below `/api`, built parent first.
///
/// ```rust
/// use kiwiscript_api::models::ResourcePath;
///
/// let lesson = ResourcePath::language("rust").series("basics").section(1).lesson(4);
/// assert_eq!(
///     lesson.href("api.kiwiscript.com"),
///     "https://api.kiwiscript.com/api/v1/languages/rust/series/basics/sections/1/lessons/4"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    fn root(base: &str) -> Self {
        Self(base.to_string())
    }

    fn push(mut self, segment: &str) -> Self {
        self.0.push_str(segment);
        self
    }

    fn push_id(mut self, id: impl fmt::Display) -> Self {
        self.0.push('/');
        self.0.push_str(&id.to_string());
        self
    }

    // ----------------------------------------
    // Roots
    // ----------------------------------------

    #[must_use]
    pub fn languages() -> Self {
        Self::root(LANGUAGES_V1)
    }

    #[must_use]
    pub fn language(slug: &str) -> Self {
        Self::languages().push_id(slug)
    }

    #[must_use]
    pub fn users() -> Self {
        Self::root(USERS_V1)
    }

    #[must_use]
    pub fn user(id: i32) -> Self {
        Self::users().push_id(id)
    }

    /// `/v1/users/me`
    #[must_use]
    pub fn me() -> Self {
        Self::users().push(ME)
    }

    #[must_use]
    pub fn certificates() -> Self {
        Self::root(CERTIFICATES_V1)
    }

    #[must_use]
    pub fn certificate(id: impl fmt::Display) -> Self {
        Self::certificates().push_id(id)
    }

    // ----------------------------------------
    // Children
    // ----------------------------------------

    #[must_use]
    pub fn series_list(self) -> Self {
        self.push(SERIES)
    }

    #[must_use]
    pub fn series(self, slug: &str) -> Self {
        self.series_list().push_id(slug)
    }

    #[must_use]
    pub fn sections(self) -> Self {
        self.push(SECTIONS)
    }

    #[must_use]
    pub fn section(self, id: i32) -> Self {
        self.sections().push_id(id)
    }

    #[must_use]
    pub fn lessons(self) -> Self {
        self.push(LESSONS)
    }

    #[must_use]
    pub fn lesson(self, id: i32) -> Self {
        self.lessons().push_id(id)
    }

    #[must_use]
    pub fn article(self) -> Self {
        self.push(ARTICLE)
    }

    #[must_use]
    pub fn video(self) -> Self {
        self.push(VIDEO)
    }

    #[must_use]
    pub fn files(self) -> Self {
        self.push(FILES)
    }

    #[must_use]
    pub fn file(self, id: impl fmt::Display) -> Self {
        self.files().push_id(id)
    }

    #[must_use]
    pub fn picture(self) -> Self {
        self.push(PICTURE)
    }

    #[must_use]
    pub fn profile(self) -> Self {
        self.push(PROFILE)
    }

    #[must_use]
    pub fn progress(self) -> Self {
        self.push(PROGRESS)
    }

    #[must_use]
    pub fn user_certificates(self) -> Self {
        self.push(CERTIFICATES)
    }

    // ----------------------------------------
    // Rendering
    // ----------------------------------------

    /// Path below the `/api` mount, e.g. `/v1/languages/rust`
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn href(&self, domain: &str) -> String {
        format!("https://{}{}{}", domain, API_PREFIX, self.0)
    }

    #[must_use]
    pub fn link(&self, domain: &str) -> LinkResponse {
        LinkResponse::new(self.href(domain))
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_link_is_absent() {
        assert_eq!(LinkResponse::new("").non_empty(), None);
        assert!(LinkResponse::new("https://x/api").non_empty().is_some());
    }

    #[test]
    fn test_self_link_serializes_as_self() {
        let links = SelfLinkResponse::new(LinkResponse::new("https://x/api/v1/users/1"));
        assert_eq!(
            serde_json::to_value(&links).unwrap(),
            serde_json::json!({ "self": { "href": "https://x/api/v1/users/1" } })
        );
    }

    #[test]
    fn test_nested_paths() {
        let base = ResourcePath::language("rust").series("ownership");
        assert_eq!(base.as_str(), "/v1/languages/rust/series/ownership");
        assert_eq!(base.clone().picture().as_str(), "/v1/languages/rust/series/ownership/picture");
        assert_eq!(
            base.section(3).lesson(9).file("0b7c").as_str(),
            "/v1/languages/rust/series/ownership/sections/3/lessons/9/files/0b7c"
        );
    }

    #[test]
    fn test_user_paths() {
        assert_eq!(ResourcePath::user(7).profile().as_str(), "/v1/users/7/profile");
        assert_eq!(ResourcePath::me().user_certificates().as_str(), "/v1/users/me/certificates");
        assert_eq!(
            ResourcePath::certificate("abc").href("kiwi.io"),
            "https://kiwi.io/api/v1/certificates/abc"
        );
    }
}
