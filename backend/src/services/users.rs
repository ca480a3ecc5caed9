//! User administration service

use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::services::auth::{hash_password, USER_COLUMNS};
use shared::{validate_password, Actor, Operation, Role};

/// User administration service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

/// Partial user update; an empty password leaves the stored one alone
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// All accounts, newest first
    pub async fn list_users(&self, actor: &Actor) -> AppResult<Vec<User>> {
        actor.authorize(Operation::ManageUsers)?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(users)
    }

    pub async fn update_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
        input: UpdateUserInput,
    ) -> AppResult<User> {
        actor.authorize(Operation::ManageUsers)?;
        input.validate()?;

        let email = input.email.map(|e| e.trim().to_lowercase());
        if let Some(ref email) = email {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
            )
            .bind(email)
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

            if taken {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        let password_hash = match input.password.as_deref() {
            Some(password) if !password.is_empty() => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            _ => None,
        };

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                role = COALESCE($3, role),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $5
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(input.name.as_deref().map(str::trim))
        .bind(email)
        .bind(input.role.map(|r| r.as_str()))
        .bind(password_hash)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(user_id = %user.id, role = %user.role, "user updated");
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &Actor, user_id: Uuid) -> AppResult<()> {
        actor.authorize(Operation::ManageUsers)?;

        if user_id == actor.id {
            return Err(AppError::ValidationError(
                "Cannot delete your own account".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(user_id = %user_id, deleted_by = %actor.id, "user deleted");
        Ok(())
    }
}
