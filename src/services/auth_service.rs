//! # Account Service
//!
//! Users, credentials, tokens, profiles and pictures.
//!
//! Every token is an HS256 JWT carrying a `kind` claim, so a refresh token
//! can never be replayed as an access token and so on. Email delivery is
//! not wired in: confirmation tokens, reset tokens and sign-in codes are
//! written to the log.

use std::collections::HashMap;
use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, OptionExt, Result, ResultExt},
    models::{
        links::{API_PREFIX, OAUTH},
        AccessClaims, AuthResponse, ConfirmBody, ConfirmSignInBody, DeleteUserBody, ForgotPasswordBody,
        MessageResponse, OAuthCallbackQuery, OAuthProvider, OAuthRedirect, OAuthTokenBody, OAuthUserInfo,
        RefreshBody, ResetPasswordBody, SignInBody, SignOutBody, SignUpBody, TokenClaims,
        TokenKind, UpdateEmailBody, UpdatePasswordBody, UpdateUserBody, User, UserPicture, UserProfile,
        UserProfileBody,
    },
    utils::{generate_numeric_code, generate_secure_token, mask_string},
};

use super::Service;

/// Digits of the sign-in code
const SIGN_IN_CODE_DIGITS: usize = 6;

const OAUTH_CODE_LEN: usize = 22;

// =====================================
// Collaborator traits
// =====================================
/// Trades a provider authorization code for the user's identity
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OAuthExchange: Send + Sync {
    async fn exchange(&self, provider: OAuthProvider, code: &str, redirect_uri: &str) -> Result<OAuthUserInfo>;
}

/// Accounts, credentials and the tokens that prove them
#[async_trait]
pub trait AccountService: Service {
    // ----------------------------------------
    // Credentials
    // ----------------------------------------
    async fn sign_up(&self, body: &SignUpBody) -> Result<MessageResponse>;

    async fn confirm_email(&self, body: &ConfirmBody) -> Result<AuthResponse>;

    /// First step: checks the password and sends a one-time code
    async fn sign_in(&self, body: &SignInBody) -> Result<MessageResponse>;

    async fn confirm_sign_in(&self, body: &ConfirmSignInBody) -> Result<AuthResponse>;

    async fn refresh(&self, body: &RefreshBody) -> Result<AuthResponse>;

    async fn sign_out(&self, claims: AccessClaims, body: &SignOutBody) -> Result<()>;

    async fn forgot_password(&self, body: &ForgotPasswordBody) -> Result<MessageResponse>;

    async fn reset_password(&self, body: &ResetPasswordBody) -> Result<MessageResponse>;

    async fn update_password(&self, user_id: i32, body: &UpdatePasswordBody) -> Result<AuthResponse>;

    async fn update_email(&self, user_id: i32, body: &UpdateEmailBody) -> Result<AuthResponse>;

    // ----------------------------------------
    // OAuth
    // ----------------------------------------
    /// Provider URL the browser is redirected to
    async fn authorization_url(&self, provider: OAuthProvider) -> Result<String>;

    async fn oauth_callback(&self, provider: OAuthProvider, query: &OAuthCallbackQuery) -> Result<OAuthRedirect>;

    async fn oauth_token(&self, bearer: &str, body: &OAuthTokenBody) -> Result<AuthResponse>;

    // ----------------------------------------
    // Identity
    // ----------------------------------------
    async fn verify_access_token(&self, token: &str) -> Result<AccessClaims>;

    async fn get_user(&self, user_id: i32) -> Result<User>;

    async fn update_user(&self, user_id: i32, body: &UpdateUserBody) -> Result<User>;

    /// Returns the removed picture, if any, so its object can be deleted
    async fn delete_user(&self, user_id: i32, body: &DeleteUserBody) -> Result<Option<UserPicture>>;

    // ----------------------------------------
    // Profile & picture
    // ----------------------------------------
    async fn find_profile(&self, user_id: i32) -> Result<Option<UserProfile>>;

    async fn create_profile(&self, user_id: i32, body: &UserProfileBody) -> Result<UserProfile>;

    async fn update_profile(&self, user_id: i32, body: &UserProfileBody) -> Result<UserProfile>;

    async fn delete_profile(&self, user_id: i32) -> Result<()>;

    async fn find_picture(&self, user_id: i32) -> Result<Option<UserPicture>>;

    /// Returns the picture it replaced
    async fn set_picture(&self, picture: UserPicture) -> Result<Option<UserPicture>>;

    async fn delete_picture(&self, user_id: i32) -> Result<UserPicture>;
}

// =====================================
// Password hashing
// =====================================
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_internal()?
        .to_string())
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_internal()?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// Argon2 is CPU bound; both run on the blocking pool, never under a store lock.
async fn hash_password_blocking(password: &str) -> Result<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_internal()?
}

async fn verify_password_blocking(password: &str, password_hash: String) -> Result<bool> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_internal()?
}

// =====================================
// Store
// =====================================
#[derive(Debug, Clone)]
struct Account {
    user: User,
    /// `None` for accounts created through OAuth
    password_hash: Option<String>,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    expires_at: i64,
}

impl<T> Pending<T> {
    fn new(value: T, ttl_sec: i64) -> Self {
        Self {
            value,
            expires_at: Utc::now().timestamp() + ttl_sec,
        }
    }

    fn is_live(&self) -> bool {
        self.expires_at >= Utc::now().timestamp()
    }
}

#[derive(Debug, Default)]
struct AccountStore {
    last_id: i32,
    accounts: HashMap<i32, Account>,
    profiles: HashMap<i32, UserProfile>,
    pictures: HashMap<i32, UserPicture>,
    /// email -> hashed sign-in code
    sign_in_codes: HashMap<String, Pending<String>>,
    /// state -> provider
    oauth_states: HashMap<String, Pending<OAuthProvider>>,
    /// one-time code -> user id
    oauth_codes: HashMap<String, Pending<i32>>,
    /// `jti` -> `exp` of refresh tokens that were rotated or signed out
    revoked: HashMap<Uuid, i64>,
}

impl AccountStore {
    fn by_email(&self, email: &str) -> Option<&Account> {
        let email = email.to_lowercase();
        self.accounts.values().find(|a| a.user.email == email)
    }

    /// Drops expired codes, states and revocations. Revocations only need
    /// to outlive the refresh token they block.
    fn prune_expired(&mut self) {
        let now = Utc::now().timestamp();

        self.sign_in_codes.retain(|_, p| p.is_live());
        self.oauth_states.retain(|_, p| p.is_live());
        self.oauth_codes.retain(|_, p| p.is_live());
        self.revoked.retain(|_, exp| *exp >= now);
    }

    fn revoke(&mut self, claims: &TokenClaims) {
        self.prune_expired();
        self.revoked.insert(claims.jti, claims.exp);
    }

    fn password_hash(&self, user_id: i32) -> Result<Option<String>> {
        Ok(self.account(user_id)?.password_hash.clone())
    }

    fn account(&self, user_id: i32) -> Result<&Account> {
        self.accounts
            .get(&user_id)
            .ok_or_not_found(format!("User {} not found", user_id))
    }

    fn account_mut(&mut self, user_id: i32) -> Result<&mut Account> {
        self.accounts
            .get_mut(&user_id)
            .ok_or_not_found(format!("User {} not found", user_id))
    }

    fn insert(&mut self, user: User, password_hash: Option<String>) -> User {
        self.last_id += 1;
        let user = User { id: self.last_id, ..user };
        self.accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password_hash,
            },
        );
        user
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

async fn check_password(password_hash: Option<String>, password: &str) -> Result<()> {
    match password_hash {
        Some(hash) if verify_password_blocking(password, hash.clone()).await? => Ok(()),
        _ => Err(invalid_credentials()),
    }
}

fn profile_from_body(id: i32, user_id: i32, body: &UserProfileBody) -> UserProfile {
    UserProfile {
        id,
        user_id,
        bio: body.bio.clone(),
        github: body.github.clone().unwrap_or_default(),
        linkedin: body.linkedin.clone().unwrap_or_default(),
        website: body.website.clone().unwrap_or_default(),
    }
}

// =====================================
// Auth Service
// =====================================
/// In-process account backend
pub struct AuthService {
    config: Arc<Config>,
    store: RwLock<AccountStore>,
    oauth: Option<Arc<dyn OAuthExchange>>,
}

impl Service for AuthService {}

impl AuthService {
    #[must_use]
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            store: RwLock::new(AccountStore::default()),
            oauth: None,
        }
    }

    #[must_use]
    pub fn with_oauth(mut self, oauth: Arc<dyn OAuthExchange>) -> Self {
        self.oauth = Some(oauth);
        self
    }

    /// Creates a confirmed account directly; used to seed staff accounts.
    pub async fn register_confirmed(&self, body: &SignUpBody, is_admin: bool, is_staff: bool) -> Result<User> {
        let password_hash = hash_password_blocking(&body.password).await?;
        let mut store = self.store.write().await;
        if store.by_email(&body.email).is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let user = User {
            id: 0,
            first_name: body.first_name.clone(),
            last_name: body.last_name.clone(),
            location: body.location.to_uppercase(),
            email: body.email.to_lowercase(),
            is_admin,
            is_staff,
            is_confirmed: true,
        };
        Ok(store.insert(user, Some(password_hash)))
    }

    /// Access/refresh pair for a user
    pub fn issue_auth(&self, user_id: i32) -> Result<AuthResponse> {
        let access = self.generate_token(user_id, TokenKind::Access, self.config.jwt_access_ttl_sec)?;
        let refresh = self.generate_token(user_id, TokenKind::Refresh, self.config.jwt_refresh_ttl_sec)?;

        Ok(AuthResponse::new(access, refresh, self.config.jwt_access_ttl_sec))
    }

    fn generate_token(&self, user_id: i32, kind: TokenKind, ttl_sec: i64) -> Result<String> {
        let claims = TokenClaims::new(user_id, kind, ttl_sec);
        let encoding_key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());

        Ok(encode(&Header::default(), &claims, &encoding_key)?)
    }

    fn verify_token(&self, token: &str, kind: TokenKind) -> Result<TokenClaims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<TokenClaims>(token, &decoding_key, &validation).map_err(|e| {
            warn!(error = %e, "Token verification failed");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        if token_data.claims.kind != kind {
            warn!(expected = ?kind, found = ?token_data.claims.kind, "Token kind mismatch");
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }

        if token_data.claims.is_expired() {
            return Err(AppError::Unauthorized("Token expired".to_string()));
        }

        Ok(token_data.claims)
    }

    fn send_confirmation(&self, user: &User) -> Result<()> {
        let token = self.generate_token(user.id, TokenKind::Confirmation, self.config.jwt_email_ttl_sec)?;
        info!(
            user_id = user.id,
            email = %mask_string(&user.email, 3),
            confirmation_token = %token,
            "Confirmation email"
        );
        Ok(())
    }

    fn callback_uri(&self, provider: OAuthProvider) -> String {
        format!(
            "https://{}{}{}/{}/callback",
            self.config.backend_domain,
            API_PREFIX,
            OAUTH,
            provider.as_str()
        )
    }

    fn client_id(&self, provider: OAuthProvider) -> &str {
        match provider {
            OAuthProvider::GitHub => &self.config.github_client_id,
            OAuthProvider::Google => &self.config.google_client_id,
        }
    }
}

#[async_trait]
impl AccountService for AuthService {
    #[instrument(skip(self, body), fields(email = %body.email))]
    async fn sign_up(&self, body: &SignUpBody) -> Result<MessageResponse> {
        let password_hash = hash_password_blocking(&body.password).await?;
        let mut store = self.store.write().await;

        if store.by_email(&body.email).is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let user = store.insert(
            User {
                id: 0,
                first_name: body.first_name.clone(),
                last_name: body.last_name.clone(),
                location: body.location.to_uppercase(),
                email: body.email.to_lowercase(),
                is_admin: false,
                is_staff: false,
                is_confirmed: false,
            },
            Some(password_hash),
        );

        info!(user_id = user.id, "New user registered");
        self.send_confirmation(&user)?;

        Ok(MessageResponse::new("Confirmation email has been sent"))
    }

    async fn confirm_email(&self, body: &ConfirmBody) -> Result<AuthResponse> {
        let claims = self.verify_token(&body.confirmation_token, TokenKind::Confirmation)?;
        let mut store = self.store.write().await;

        let account = store.account_mut(claims.sub).map_err(|_| AppError::unauthorized())?;
        if account.user.is_confirmed {
            return Err(AppError::Unauthorized("User already confirmed".to_string()));
        }
        account.user.is_confirmed = true;

        info!(user_id = claims.sub, "Email confirmed");
        self.issue_auth(claims.sub)
    }

    #[instrument(skip(self, body), fields(email = %body.email))]
    async fn sign_in(&self, body: &SignInBody) -> Result<MessageResponse> {
        let account = self
            .store
            .read()
            .await
            .by_email(&body.email)
            .cloned()
            .ok_or_else(invalid_credentials)?;

        if let Err(e) = check_password(account.password_hash.clone(), &body.password).await {
            warn!("Failed login attempt");
            return Err(e);
        }

        if !account.user.is_confirmed {
            self.send_confirmation(&account.user)?;
            return Err(AppError::Unauthorized("User not confirmed".to_string()));
        }

        let code = generate_numeric_code(SIGN_IN_CODE_DIGITS);
        let code_hash = hash_password_blocking(&code).await?;

        let mut store = self.store.write().await;
        store.prune_expired();
        store.sign_in_codes.insert(
            account.user.email.clone(),
            Pending::new(code_hash, self.config.jwt_email_ttl_sec),
        );

        debug!(user_id = account.user.id, code = %code, "Sign in code");
        Ok(MessageResponse::new("Confirmation code has been sent to your email"))
    }

    async fn confirm_sign_in(&self, body: &ConfirmSignInBody) -> Result<AuthResponse> {
        let email = body.email.to_lowercase();

        let pending = self
            .store
            .write()
            .await
            .sign_in_codes
            .remove(&email)
            .ok_or_else(invalid_credentials)?;
        if !pending.is_live() || !verify_password_blocking(&body.code, pending.value).await? {
            return Err(invalid_credentials());
        }

        let user_id = self
            .store
            .read()
            .await
            .by_email(&email)
            .map(|a| a.user.id)
            .ok_or_else(invalid_credentials)?;
        info!(user_id, "User logged in");
        self.issue_auth(user_id)
    }

    async fn refresh(&self, body: &RefreshBody) -> Result<AuthResponse> {
        let claims = self.verify_token(&body.refresh_token, TokenKind::Refresh)?;
        let mut store = self.store.write().await;

        if store.revoked.contains_key(&claims.jti) {
            warn!(user_id = claims.sub, "Revoked refresh token reused");
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }
        store.account(claims.sub).map_err(|_| AppError::unauthorized())?;
        store.revoke(&claims);

        self.issue_auth(claims.sub)
    }

    async fn sign_out(&self, claims: AccessClaims, body: &SignOutBody) -> Result<()> {
        let refresh = self.verify_token(&body.refresh_token, TokenKind::Refresh)?;
        if refresh.sub != claims.user_id {
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }

        self.store.write().await.revoke(&refresh);
        info!(user_id = claims.user_id, "User logged out");
        Ok(())
    }

    async fn forgot_password(&self, body: &ForgotPasswordBody) -> Result<MessageResponse> {
        let store = self.store.read().await;

        // Same answer whether or not the email is known
        if let Some(account) = store
            .by_email(&body.email)
            .filter(|a| a.user.is_confirmed && a.password_hash.is_some())
        {
            let token = self.generate_token(account.user.id, TokenKind::Reset, self.config.jwt_email_ttl_sec)?;
            info!(user_id = account.user.id, reset_token = %token, "Reset password email");
        }

        Ok(MessageResponse::new("Reset password email sent"))
    }

    async fn reset_password(&self, body: &ResetPasswordBody) -> Result<MessageResponse> {
        let claims = self.verify_token(&body.reset_token, TokenKind::Reset)?;
        let password_hash = hash_password_blocking(&body.password).await?;

        let mut store = self.store.write().await;
        store.account_mut(claims.sub).map_err(|_| AppError::unauthorized())?.password_hash = Some(password_hash);

        info!(user_id = claims.sub, "Password reset");
        Ok(MessageResponse::new("Password reset successfully"))
    }

    #[instrument(skip(self, body))]
    async fn update_password(&self, user_id: i32, body: &UpdatePasswordBody) -> Result<AuthResponse> {
        let current = self.store.read().await.password_hash(user_id)?;
        check_password(current, &body.old_password).await?;

        let password_hash = hash_password_blocking(&body.password).await?;
        self.store.write().await.account_mut(user_id)?.password_hash = Some(password_hash);

        info!(user_id, "Password changed");
        self.issue_auth(user_id)
    }

    #[instrument(skip(self, body))]
    async fn update_email(&self, user_id: i32, body: &UpdateEmailBody) -> Result<AuthResponse> {
        let current = self.store.read().await.password_hash(user_id)?;
        check_password(current, &body.password).await?;

        let mut store = self.store.write().await;
        if store.by_email(&body.email).is_some_and(|a| a.user.id != user_id) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        store.account_mut(user_id)?.user.email = body.email.to_lowercase();
        info!(user_id, "Email changed");
        self.issue_auth(user_id)
    }

    async fn authorization_url(&self, provider: OAuthProvider) -> Result<String> {
        let client_id = self.client_id(provider);
        if client_id.is_empty() {
            return Err(AppError::NotFound(format!("{} sign in is not enabled", provider.as_str())));
        }

        let state = generate_secure_token(32);
        let redirect_uri = self.callback_uri(provider);

        let url = match provider {
            OAuthProvider::GitHub => Url::parse_with_params(
                "https://github.com/login/oauth/authorize",
                &[
                    ("client_id", client_id),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("scope", "user:email"),
                    ("state", state.as_str()),
                ],
            )?,
            OAuthProvider::Google => Url::parse_with_params(
                "https://accounts.google.com/o/oauth2/v2/auth",
                &[
                    ("client_id", client_id),
                    ("redirect_uri", redirect_uri.as_str()),
                    ("response_type", "code"),
                    ("scope", "openid email profile"),
                    ("state", state.as_str()),
                ],
            )?,
        };

        let mut store = self.store.write().await;
        store.prune_expired();
        store
            .oauth_states
            .insert(state, Pending::new(provider, self.config.jwt_oauth_ttl_sec));

        Ok(url.into())
    }

    #[instrument(skip(self, query))]
    async fn oauth_callback(&self, provider: OAuthProvider, query: &OAuthCallbackQuery) -> Result<OAuthRedirect> {
        let state = self.store.write().await.oauth_states.remove(&query.state);
        if !state.is_some_and(|s| s.is_live() && s.value == provider) {
            warn!("Unknown or expired OAuth state");
            return Err(AppError::Unauthorized("Invalid OAuth state".to_string()));
        }

        let exchange = self
            .oauth
            .as_ref()
            .ok_or_else(|| AppError::Upstream(format!("{} is unavailable", provider.as_str())))?;
        let info = exchange
            .exchange(provider, &query.code, &self.callback_uri(provider))
            .await?;

        let mut store = self.store.write().await;
        let user_id = match store.by_email(&info.email) {
            Some(account) => account.user.id,
            None => {
                let user = store.insert(
                    User {
                        id: 0,
                        first_name: info.first_name,
                        last_name: info.last_name,
                        location: info.location,
                        email: info.email.to_lowercase(),
                        is_admin: false,
                        is_staff: false,
                        is_confirmed: true,
                    },
                    None,
                );
                info!(user_id = user.id, "User registered through OAuth");
                user.id
            }
        };

        let code = generate_secure_token(OAUTH_CODE_LEN);
        store.prune_expired();
        store
            .oauth_codes
            .insert(code.clone(), Pending::new(user_id, self.config.jwt_oauth_ttl_sec));

        Ok(OAuthRedirect {
            code,
            access_token: self.generate_token(user_id, TokenKind::OAuth, self.config.jwt_oauth_ttl_sec)?,
            expires_in: self.config.jwt_oauth_ttl_sec,
        })
    }

    async fn oauth_token(&self, bearer: &str, body: &OAuthTokenBody) -> Result<AuthResponse> {
        let claims = self.verify_token(bearer, TokenKind::OAuth)?;

        if body.redirect_uri != self.config.frontend_callback_url() {
            return Err(AppError::Unauthorized("Invalid redirect URI".to_string()));
        }

        let pending = self.store.write().await.oauth_codes.remove(&body.code);
        match pending {
            Some(p) if p.is_live() && p.value == claims.sub => self.issue_auth(claims.sub),
            _ => Err(AppError::Unauthorized("Invalid code".to_string())),
        }
    }

    async fn verify_access_token(&self, token: &str) -> Result<AccessClaims> {
        let claims = self.verify_token(token, TokenKind::Access)?;
        let store = self.store.read().await;
        let account = store.account(claims.sub).map_err(|_| AppError::unauthorized())?;

        Ok(AccessClaims {
            user_id: account.user.id,
            is_admin: account.user.is_admin,
            is_staff: account.user.is_staff,
        })
    }

    async fn get_user(&self, user_id: i32) -> Result<User> {
        Ok(self.store.read().await.account(user_id)?.user.clone())
    }

    async fn update_user(&self, user_id: i32, body: &UpdateUserBody) -> Result<User> {
        let mut store = self.store.write().await;
        let user = &mut store.account_mut(user_id)?.user;

        user.first_name = body.first_name.clone();
        user.last_name = body.last_name.clone();
        user.location = body.location.to_uppercase();
        Ok(user.clone())
    }

    #[instrument(skip(self, body))]
    async fn delete_user(&self, user_id: i32, body: &DeleteUserBody) -> Result<Option<UserPicture>> {
        let current = self.store.read().await.password_hash(user_id)?;
        check_password(current, &body.password).await?;

        let mut store = self.store.write().await;
        store.account(user_id)?;
        store.accounts.remove(&user_id);
        store.profiles.remove(&user_id);

        info!(user_id, "User deleted");
        Ok(store.pictures.remove(&user_id))
    }

    async fn find_profile(&self, user_id: i32) -> Result<Option<UserProfile>> {
        let store = self.store.read().await;
        store.account(user_id)?;
        Ok(store.profiles.get(&user_id).cloned())
    }

    async fn create_profile(&self, user_id: i32, body: &UserProfileBody) -> Result<UserProfile> {
        let mut store = self.store.write().await;
        store.account(user_id)?;

        if store.profiles.contains_key(&user_id) {
            return Err(AppError::Conflict("Profile already exists".to_string()));
        }

        store.last_id += 1;
        let profile = profile_from_body(store.last_id, user_id, body);
        store.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, user_id: i32, body: &UserProfileBody) -> Result<UserProfile> {
        let mut store = self.store.write().await;
        let profile = store
            .profiles
            .get_mut(&user_id)
            .ok_or_not_found("Profile not found")?;

        *profile = profile_from_body(profile.id, user_id, body);
        Ok(profile.clone())
    }

    async fn delete_profile(&self, user_id: i32) -> Result<()> {
        self.store
            .write()
            .await
            .profiles
            .remove(&user_id)
            .map(|_| ())
            .ok_or_not_found("Profile not found")
    }

    async fn find_picture(&self, user_id: i32) -> Result<Option<UserPicture>> {
        let store = self.store.read().await;
        store.account(user_id)?;
        Ok(store.pictures.get(&user_id).cloned())
    }

    async fn set_picture(&self, picture: UserPicture) -> Result<Option<UserPicture>> {
        let mut store = self.store.write().await;
        store.account(picture.user_id)?;
        Ok(store.pictures.insert(picture.user_id, picture))
    }

    async fn delete_picture(&self, user_id: i32) -> Result<UserPicture> {
        self.store
            .write()
            .await
            .pictures
            .remove(&user_id)
            .ok_or_not_found("Picture not found")
    }
}

// =====================================
// Token Utilities
// =====================================
/// `Authorization: Bearer <token>` -> `<token>`
#[must_use]
pub fn extract_token_from_header(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
