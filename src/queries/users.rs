use anyhow::anyhow;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::users::{AuthUser, UserSummary};
use crate::service::store::UserDirectory;

impl UserDirectory for PgConnection {
    async fn find_user(&mut self, user_id: Uuid) -> AppResult<Option<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email, headline, location, avatar_url FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to fetch user: {}", e);
            AppError::InternalServerError(anyhow!("Failed to fetch user"))
        })
    }

    async fn member_ids(&mut self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let connections: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT connections FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&mut *self)
                .await
                .map_err(|e| {
                    tracing::error!("failed to fetch membership set: {}", e);
                    AppError::InternalServerError(anyhow!("Failed to fetch connections"))
                })?;

        connections.ok_or_else(|| AppError::NotFound(anyhow!("User not found")))
    }

    async fn is_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<bool> {
        let connected: Option<bool> =
            sqlx::query_scalar("SELECT connections @> ARRAY[$2]::uuid[] FROM users WHERE id = $1")
                .bind(user_id)
                .bind(other_id)
                .fetch_optional(&mut *self)
                .await
                .map_err(|e| {
                    tracing::error!("failed to check membership: {}", e);
                    AppError::InternalServerError(anyhow!("Failed to check connection status"))
                })?;

        connected.ok_or_else(|| AppError::NotFound(anyhow!("User not found")))
    }

    async fn add_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<()> {
        // Set union: appending an existing member is a no-op.
        sqlx::query(
            "UPDATE users SET connections = array_append(connections, $2), updated_at = now() \
             WHERE id = $1 AND NOT (connections @> ARRAY[$2]::uuid[])",
        )
        .bind(user_id)
        .bind(other_id)
        .execute(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to add connection member: {}", e);
            AppError::InternalServerError(anyhow!("Failed to update connections"))
        })?;

        Ok(())
    }

    async fn remove_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET connections = array_remove(connections, $2), updated_at = now() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(other_id)
        .execute(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to remove connection member: {}", e);
            AppError::InternalServerError(anyhow!("Failed to update connections"))
        })?;

        Ok(())
    }

    async fn list_members(&mut self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT u.id, u.name, u.email, u.headline, u.location, u.avatar_url \
             FROM users u \
             JOIN users me ON me.id = $1 \
             WHERE u.id = ANY(me.connections) \
             ORDER BY u.name",
        )
        .bind(user_id)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to fetch connections: {}", e);
            AppError::InternalServerError(anyhow!("Failed to fetch connections"))
        })
    }

    async fn suggest_users(
        &mut self,
        exclude: &[Uuid],
        limit: i64,
    ) -> AppResult<Vec<UserSummary>> {
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email, headline, location, avatar_url FROM users \
             WHERE id <> ALL($1) \
             ORDER BY created_at DESC \
             LIMIT $2",
        )
        .bind(exclude)
        .bind(limit)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to fetch suggestions: {}", e);
            AppError::InternalServerError(anyhow!("Failed to fetch suggestions"))
        })
    }
}

pub async fn insert_user(
    conn: &mut PgConnection,
    user_id: Uuid,
    name: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<()> {
    let result = sqlx::query(
        "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4)",
    )
    .bind(user_id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .execute(conn)
    .await;

    if let Err(e) = result {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() && db_err.constraint() == Some("users_email_key") {
                return Err(AppError::BadRequest(anyhow!("Email already exists")));
            }
        }
        tracing::error!("failed to insert user: {}", e);
        return Err(AppError::InternalServerError(anyhow!(
            "Failed to create user account"
        )));
    }

    Ok(())
}

pub async fn find_auth_user_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> AppResult<Option<AuthUser>> {
    sqlx::query_as::<_, AuthUser>(
        "SELECT id, name, email, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!("failed to fetch user by email: {}", e);
        AppError::InternalServerError(anyhow!("Failed to fetch user"))
    })
}
