/*!
 * # Authentication and Authorization Module
 *
 * Credential handling for the store:
 *
 * - argon2 password hashing for account registration and login
 * - JWT bearer tokens carrying the staff capability flag
 * - middleware for authenticated routes and the staff-only management area
 *
 * The staff gate fails closed: a request without a valid token, or with a
 * token whose account lacks the staff flag, never reaches a management
 * handler.
 */

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{DefaultBodyLimit, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{user, User, UserModel};

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // Subject (user ID)
    pub username: String, // Account username
    pub email: String,    // Account email
    pub is_staff: bool,   // Staff capability flag
    pub jti: String,      // JWT ID (unique identifier for this token)
    pub iat: i64,         // Issued at time
    pub exp: i64,         // Expiration time
    pub nbf: i64,         // Not valid before time
    pub iss: String,      // Issuer
    pub aud: String,      // Audience
}

/// Authenticated user data extracted from a validated token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub token_id: String,
}

impl AuthUser {
    /// Whether this account carries the staff capability.
    pub fn is_staff(&self) -> bool {
        self.is_staff
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            jwt_issuer: "bookstore-api".to_string(),
            jwt_audience: "bookstore".to_string(),
            token_expiration,
        }
    }
}

/// Token revocation entry
#[derive(Clone, Debug)]
struct RevokedToken {
    jti: String,
    expiry: chrono::DateTime<Utc>,
}

/// Authentication service handling registration, credential checks, and
/// token issuance/validation.
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
    revoked_tokens: Arc<RwLock<Vec<RevokedToken>>>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self {
            config,
            db,
            revoked_tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Registers a new account with a hashed password.
    pub async fn register(&self, input: RegisterInput) -> Result<UserModel, AuthError> {
        let existing = User::find()
            .filter(
                user::Column::Username
                    .eq(input.username.clone())
                    .or(user::Column::Email.eq(input.email.clone())),
            )
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if existing.is_some() {
            return Err(AuthError::AccountExists(
                "username or email is already registered".to_string(),
            ));
        }

        let now = Utc::now();
        let account = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(hash_password(&input.password)?),
            full_name: Set(input.full_name),
            phone: Set(None),
            address: Set(None),
            is_staff: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let account = account
            .insert(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        info!("Registered account {}", account.id);
        Ok(account)
    }

    /// Verifies a username/password pair against the account store.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserModel, AuthError> {
        let account = User::find()
            .filter(user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        if !verify_password(password, &account.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(account)
    }

    /// Generates a bearer token for an account.
    pub fn generate_token(&self, account: &UserModel) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            email: account.email.clone(),
            is_staff: account.is_staff,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validates a bearer token and extracts the claims.
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if self.is_token_revoked(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Revokes a token (logout). The jti stays on the revocation list until
    /// the token would have expired anyway.
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.validate_token(token).await?;

        let expiry = Utc::now() + ChronoDuration::seconds(claims.exp - Utc::now().timestamp());
        let mut revoked = self.revoked_tokens.write().await;
        revoked.push(RevokedToken {
            jti: claims.jti,
            expiry,
        });

        let now = Utc::now();
        revoked.retain(|t| t.expiry > now);

        Ok(())
    }

    async fn is_token_revoked(&self, token_id: &str) -> bool {
        let revoked = self.revoked_tokens.read().await;
        revoked.iter().any(|t| t.jti == token_id)
    }

    fn auth_user_from_claims(&self, claims: Claims) -> Result<AuthUser, AuthError> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthUser {
            user_id,
            username: claims.username,
            email: claims.email,
            is_staff: claims.is_staff,
            token_id: claims.jti,
        })
    }
}

/// Hashes a password with argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("Password hashing failed: {}", e)))
}

/// Verifies a password against a stored argon2 hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::InternalError(format!("Malformed password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Registration input
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Account already exists: {0}")]
    AccountExists(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::RevokedToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REVOKED_TOKEN",
                "Authentication token has been revoked".to_string(),
            ),
            Self::TokenCreation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                msg.clone(),
            ),
            Self::AccountExists(msg) => (StatusCode::CONFLICT, "AUTH_ACCOUNT_EXISTS", msg.clone()),
            Self::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "AUTH_INVALID_REQUEST", msg.clone())
            }
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions".to_string(),
            ),
            Self::DatabaseError(_) | Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Authentication middleware that extracts and validates bearer tokens,
/// placing an [`AuthUser`] into the request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Staff gate: only accounts with the staff flag may proceed. Fails closed
/// when no authenticated user is present.
pub async fn staff_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or(AuthError::MissingAuth)?;

    if !user.is_staff() {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

async fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();
                let claims = auth_service.validate_token(token).await?;
                return auth_service.auth_user_from_claims(claims);
            }
        }
    }

    Err(AuthError::MissingAuth)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_staff(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_staff(self) -> Self {
        // staff check layered inside auth so the token is validated first
        self.layer(axum::middleware::from_fn(staff_middleware))
            .with_auth()
    }
}

// ---------------------------------------------------------------------------
// /auth routes

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub full_name: Option<String>,
}

/// Bearer token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Public account representation
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_staff: bool,
}

impl From<UserModel> for UserResponse {
    fn from(account: UserModel) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            full_name: account.full_name,
            is_staff: account.is_staff,
        }
    }
}

/// Account session routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/register", axum::routing::post(register_handler))
        .route("/login", axum::routing::post(login_handler))
        .route("/logout", axum::routing::post(logout_handler))
        .layer(DefaultBodyLimit::max(1024 * 64))
}

async fn register_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    payload
        .validate()
        .map_err(|e| AuthError::InvalidRequest(e.to_string()))?;

    let account = auth_service
        .register(RegisterInput {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            full_name: payload.full_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthError> {
    let account = auth_service
        .verify_credentials(&credentials.username, &credentials.password)
        .await?;

    let access_token = auth_service.generate_token(&account)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: auth_service.config.token_expiration.as_secs() as i64,
    }))
}

async fn logout_handler(
    State(auth_service): State<Arc<AuthService>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();
                auth_service.revoke_token(token).await?;
                return Ok(Json(
                    serde_json::json!({ "message": "Successfully logged out" }),
                ));
            }
        }
    }

    Err(AuthError::MissingAuth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;

    fn test_account(is_staff: bool) -> UserModel {
        let now = Utc::now();
        UserModel {
            id: Uuid::new_v4(),
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: String::new(),
            full_name: None,
            phone: None,
            address: None,
            is_staff,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    async fn test_service() -> AuthService {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        AuthService::new(
            AuthConfig::new(
                "0123456789abcdef0123456789abcdef".to_string(),
                Duration::from_secs(3600),
            ),
            Arc::new(db),
        )
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn password_hashes_are_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn token_roundtrip_preserves_claims() {
        let service = test_service().await;
        let account = test_account(true);

        let token = service.generate_token(&account).unwrap();
        let claims = service.validate_token(&token).await.unwrap();

        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.username, "reader");
        assert!(claims.is_staff);
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let service = test_service().await;
        let account = test_account(false);

        let token = service.generate_token(&account).unwrap();
        service.revoke_token(&token).await.unwrap();

        assert!(matches!(
            service.validate_token(&token).await,
            Err(AuthError::RevokedToken)
        ));
    }

    #[tokio::test]
    async fn token_from_other_secret_is_rejected() {
        let service = test_service().await;
        let other = AuthService::new(
            AuthConfig::new(
                "another-secret-another-secret-32".to_string(),
                Duration::from_secs(3600),
            ),
            service.db.clone(),
        );

        let token = other.generate_token(&test_account(false)).unwrap();
        assert!(matches!(
            service.validate_token(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
