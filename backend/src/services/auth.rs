//! Authentication service for registration, login and token handling

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::{BootstrapConfig, Config};
use crate::error::{AppError, AppResult};
use crate::models::User;
use shared::{validate_password, Role};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    token_expiry: i64,
}

/// Input for self-registration
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, email and password are required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub role: Option<Role>,
}

/// Input for login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

/// Token plus the account it was issued for
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// User row including the password hash
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    password_hash: String,
}

pub(crate) const USER_COLUMNS: &str = "id, name, email, role, created_at, updated_at";

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            token_expiry: config.jwt.token_expiry,
        }
    }

    /// Register a new account; defaults to the sales role
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        input.validate()?;

        let role = input.role.unwrap_or(Role::Sales);
        if role == Role::Admin {
            return Err(AppError::InsufficientPermissions);
        }

        let email = input.email.trim().to_lowercase();
        let existing = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(&email)
        .fetch_one(&self.db)
        .await?;

        if existing {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");

        let token = self.issue_token(user.id, user.role)?;
        Ok(AuthResponse { token, user })
    }

    /// Create the configured administrator if the system has none yet.
    ///
    /// An existing account with the same email is promoted and takes the
    /// configured password. Returns the account when one was written.
    pub async fn ensure_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<Option<User>> {
        let (Some(email), Some(password)) = (
            bootstrap.admin_email.as_deref(),
            bootstrap.admin_password.as_deref(),
        ) else {
            return Ok(None);
        };

        let admin_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = $1)",
        )
        .bind(Role::Admin.as_str())
        .fetch_one(&self.db)
        .await?;

        if admin_exists {
            tracing::debug!("administrator already present, skipping bootstrap");
            return Ok(None);
        }

        let email = email.trim().to_lowercase();
        if !validator::validate_email(email.as_str()) {
            return Err(AppError::validation("email", "Invalid email format"));
        }
        validate_password(password)?;

        let name = bootstrap
            .admin_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("Administrator");
        let password_hash = hash_password(password)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE
            SET role = EXCLUDED.role, password_hash = EXCLUDED.password_hash, updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(name)
        .bind(&email)
        .bind(&password_hash)
        .bind(Role::Admin.as_str())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %user.id, email = %user.email, "bootstrap administrator created");
        Ok(Some(user))
    }

    /// Authenticate with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthResponse> {
        input.validate()?;

        let email = input.email.trim().to_lowercase();
        let credentials = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &credentials.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let user = self.current_user(credentials.id).await?;
        let token = self.issue_token(user.id, user.role)?;

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(AuthResponse { token, user })
    }

    /// Load the account behind a token
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Sign an access token
    fn issue_token(&self, user_id: Uuid, role: Role) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            exp: (now + Duration::seconds(self.token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}

/// Decode and validate a token
pub fn decode_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
}

/// Hash a password with bcrypt
pub(crate) fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}
