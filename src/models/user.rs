//! # Users
//!
//! Public user representation with optional picture and profile embeds,
//! the profile and picture resources, and account request bodies.
//!
//! Private columns (email, confirmation state) never reach a response:
//! the builders copy only public fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::links::{LinkResponse, ResourcePath, SelfLinkResponse};
use super::records::{User, UserPicture, UserProfile};

// =====================================
// Path params
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserPathParams {
    #[serde(rename = "userID")]
    #[validate(range(min = 1))]
    pub user_id: i32,
}

// =====================================
// Bodies
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    #[validate(length(min = 2, max = 50))]
    pub first_name: String,

    #[validate(length(min = 2, max = 50))]
    pub last_name: String,

    /// ISO 3166 alpha-3 country code
    #[validate(length(equal = 3))]
    pub location: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteUserBody {
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserProfileBody {
    #[validate(length(min = 1, max = 1000))]
    pub bio: String,

    #[validate(url)]
    pub github: Option<String>,

    #[validate(url)]
    pub linkedin: Option<String>,

    #[validate(url)]
    pub website: Option<String>,
}

// =====================================
// User response
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPictureEmbedded {
    pub id: Uuid,
    pub ext: String,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileEmbedded {
    pub bio: String,
    pub github: String,
    pub linkedin: String,
    pub website: String,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEmbedded {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<UserPictureEmbedded>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfileEmbedded>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
    pub is_admin: bool,
    pub is_staff: bool,
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<UserEmbedded>,
    #[serde(rename = "_links")]
    pub links: SelfLinkResponse,
}

impl UserResponse {
    #[must_use]
    pub fn from_record(domain: &str, user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            location: user.location.clone(),
            is_admin: user.is_admin,
            is_staff: user.is_staff,
            embedded: None,
            links: SelfLinkResponse::new(ResourcePath::user(user.id).link(domain)),
        }
    }

    /// `picture` carries the resolved URL. The embed is dropped when
    /// neither a picture nor a profile is given.
    #[must_use]
    pub fn with_embeds(
        domain: &str,
        user: &User,
        picture: Option<(&UserPicture, &str)>,
        profile: Option<&UserProfile>,
    ) -> Self {
        let path = ResourcePath::user(user.id);

        let picture = picture.map(|(picture, url)| UserPictureEmbedded {
            id: picture.id,
            ext: picture.ext.clone(),
            url: url.to_string(),
            links: SelfLinkResponse::new(path.clone().picture().link(domain)),
        });

        let profile = profile.map(|profile| UserProfileEmbedded {
            bio: profile.bio.clone(),
            github: profile.github.clone(),
            linkedin: profile.linkedin.clone(),
            website: profile.website.clone(),
            links: SelfLinkResponse::new(path.clone().profile().link(domain)),
        });

        let embedded = if picture.is_none() && profile.is_none() {
            None
        } else {
            Some(UserEmbedded { picture, profile })
        };

        Self {
            embedded,
            ..Self::from_record(domain, user)
        }
    }
}

// =====================================
// Profile
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResourceLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub user: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfileResponse {
    pub id: i32,
    pub bio: String,
    pub github: String,
    pub linkedin: String,
    pub website: String,
    #[serde(rename = "_links")]
    pub links: UserResourceLinks,
}

impl UserProfileResponse {
    #[must_use]
    pub fn from_record(domain: &str, profile: &UserProfile) -> Self {
        let user = ResourcePath::user(profile.user_id);

        Self {
            id: profile.id,
            bio: profile.bio.clone(),
            github: profile.github.clone(),
            linkedin: profile.linkedin.clone(),
            website: profile.website.clone(),
            links: UserResourceLinks {
                self_link: user.clone().profile().link(domain),
                user: user.link(domain),
            },
        }
    }
}

// =====================================
// Picture
// =====================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPictureLinks {
    #[serde(rename = "self")]
    pub self_link: LinkResponse,
    pub user: LinkResponse,
    pub profile: LinkResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPictureResponse {
    pub id: Uuid,
    pub ext: String,
    pub url: String,
    #[serde(rename = "_links")]
    pub links: UserPictureLinks,
}

impl UserPictureResponse {
    #[must_use]
    pub fn from_record(domain: &str, picture: &UserPicture, url: &str) -> Self {
        let user = ResourcePath::user(picture.user_id);

        Self {
            id: picture.id,
            ext: picture.ext.clone(),
            url: url.to_string(),
            links: UserPictureLinks {
                self_link: user.clone().picture().link(domain),
                user: user.clone().link(domain),
                profile: user.profile().link(domain),
            },
        }
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user() -> User {
        User {
            id: 3,
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            location: "PRT".to_string(),
            email: "ana@kiwiscript.com".to_string(),
            is_admin: false,
            is_staff: true,
            is_confirmed: true,
        }
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            user_id: 3,
            bio: "Rustacean".to_string(),
            github: "https://github.com/ana".to_string(),
            linkedin: String::new(),
            website: String::new(),
        }
    }

    #[test]
    fn test_user_without_embeds_has_no_embedded_key() {
        let json = serde_json::to_value(UserResponse::with_embeds("kiwi.io", &user(), None, None)).unwrap();

        assert!(json.get("_embedded").is_none());
        assert!(json.get("email").is_none());
        assert_eq!(json["_links"]["self"]["href"], "https://kiwi.io/api/v1/users/3");
    }

    #[test]
    fn test_profile_alone_keeps_embed() {
        let response = UserResponse::with_embeds("kiwi.io", &user(), None, Some(&profile()));
        let embedded = response.embedded.expect("embed");

        assert!(embedded.picture.is_none());
        assert_eq!(
            embedded.profile.map(|p| p.links.self_link.href),
            Some("https://kiwi.io/api/v1/users/3/profile".to_string())
        );
    }

    #[test]
    fn test_picture_alone_keeps_embed() {
        let picture = UserPicture { id: Uuid::nil(), user_id: 3, ext: "jpg".to_string() };
        let response = UserResponse::with_embeds("kiwi.io", &user(), Some((&picture, "https://o/p.jpg")), None);

        let embedded = response.embedded.expect("embed");
        assert!(embedded.profile.is_none());
        assert_eq!(embedded.picture.map(|p| p.url), Some("https://o/p.jpg".to_string()));
    }

    #[test]
    fn test_picture_resource_links() {
        let picture = UserPicture { id: Uuid::nil(), user_id: 3, ext: "jpg".to_string() };
        let response = UserPictureResponse::from_record("kiwi.io", &picture, "https://o/p.jpg");

        assert_eq!(response.links.self_link.href, "https://kiwi.io/api/v1/users/3/picture");
        assert_eq!(response.links.profile.href, "https://kiwi.io/api/v1/users/3/profile");
    }

    #[test]
    fn test_update_user_body_location_length() {
        let body = UpdateUserBody {
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            location: "PT".to_string(),
        };
        assert!(body.validate().is_err());
    }
}
