//! # Authentication
//!
//! Request bodies for the `/auth` routes, the token claims issued by the
//! account service, and the auth/message responses.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// =====================================
// Sign up / sign in
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpBody {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 2, max = 50))]
    pub first_name: String,

    #[validate(length(min = 2, max = 50))]
    pub last_name: String,

    #[validate(length(equal = 3))]
    pub location: String,

    #[validate(length(min = 8, max = 50))]
    pub password: String,

    #[validate(must_match(other = "password"))]
    pub password2: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignInBody {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Second step of sign in: the one-time code sent to the user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmSignInBody {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub code: String,
}

/// Used by both sign out and refresh
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    #[validate(custom(function = "crate::utils::validate_jwt"))]
    pub refresh_token: String,
}

pub type SignOutBody = RefreshBody;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBody {
    #[validate(custom(function = "crate::utils::validate_jwt"))]
    pub confirmation_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordBody {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    #[validate(custom(function = "crate::utils::validate_jwt"))]
    pub reset_token: String,

    #[validate(length(min = 8, max = 50))]
    pub password: String,

    #[validate(must_match(other = "password"))]
    pub password2: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordBody {
    #[validate(length(min = 1))]
    pub old_password: String,

    #[validate(length(min = 8, max = 50))]
    pub password: String,

    #[validate(must_match(other = "password"))]
    pub password2: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateEmailBody {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

// =====================================
// OAuth
// =====================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    GitHub,
    Google,
}

impl OAuthProvider {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Google => "google",
        }
    }
}

/// Query of the provider callback: `?code=...&state=...`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct OAuthCallbackQuery {
    #[validate(length(min = 1))]
    pub code: String,

    #[validate(length(min = 32), custom(function = "crate::utils::validate_hexadecimal"))]
    pub state: String,
}

/// Exchange of the one-time code handed to the web client for real tokens
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OAuthTokenBody {
    #[validate(length(min = 1, max = 30), custom(function = "crate::utils::validate_alphanum"))]
    pub code: String,

    #[validate(url)]
    pub redirect_uri: String,
}

/// What a provider tells us about the person signing in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthUserInfo {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub location: String,
}

/// Parameters the callback forwards to the web client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRedirect {
    pub code: String,
    pub access_token: String,
    pub expires_in: i64,
}

// =====================================
// Tokens
// =====================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
    /// Emailed after sign up
    Confirmation,
    /// Emailed by forgot password
    Reset,
    /// Short lived, only redeems the one-time code of an OAuth callback
    OAuth,
}

/// JWT payload shared by every token kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub sub: i32,
    pub kind: TokenKind,
    /// Unique per token, used by the refresh blacklist
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    #[must_use]
    pub fn new(user_id: i32, kind: TokenKind, ttl_sec: i64) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user_id,
            kind,
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl_sec,
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < Utc::now().timestamp()
    }
}

/// Identity attached to a request carrying a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessClaims {
    pub user_id: i32,
    pub is_admin: bool,
    pub is_staff: bool,
}

impl AccessClaims {
    /// Admins count as staff
    #[must_use]
    pub fn can_edit_catalog(&self) -> bool {
        self.is_staff || self.is_admin
    }
}

// =====================================
// Responses
// =====================================
/// Token pair returned by every flow that signs a user in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub token_type: String,
}

impl AuthResponse {
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sign_up(password2: &str) -> SignUpBody {
        SignUpBody {
            email: "ana@kiwiscript.com".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Silva".to_string(),
            location: "PRT".to_string(),
            password: "correct-horse".to_string(),
            password2: password2.to_string(),
        }
    }

    #[test]
    fn test_sign_up_passwords_must_match() {
        assert!(sign_up("correct-horse").validate().is_ok());

        let errors = sign_up("battery-staple").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password2"));
    }

    #[test]
    fn test_refresh_token_must_look_like_a_jwt() {
        let body = RefreshBody { refresh_token: "not a token".to_string() };
        assert!(body.validate().is_err());

        let body = RefreshBody { refresh_token: "eyJhbGciOi.eyJzdWIiOjF9.c2lnbmF0dXJl".to_string() };
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_callback_state_is_hex_of_32_or_more() {
        let query = OAuthCallbackQuery { code: "abc".to_string(), state: "ab".repeat(16) };
        assert!(query.validate().is_ok());

        let query = OAuthCallbackQuery { code: "abc".to_string(), state: "xyz".to_string() };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_auth_response_shape() {
        let json = serde_json::to_value(AuthResponse::new("a".into(), "r".into(), 300)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "expires_in": 300,
                "token_type": "Bearer"
            })
        );
    }

    #[test]
    fn test_claims_expiration() {
        let claims = TokenClaims::new(1, TokenKind::Access, 60);
        assert!(!claims.is_expired());

        let expired = TokenClaims { exp: Utc::now().timestamp() - 10, ..claims };
        assert!(expired.is_expired());
    }
}
