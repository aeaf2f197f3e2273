use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::connections::{
    canonical_pair, ConnectionRequest, ConnectionStatus, IncomingRequest,
};
use crate::models::users::UserSummary;
use crate::service::store::ConnectionStore;

#[derive(sqlx::FromRow)]
struct PendingRow {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    status: ConnectionStatus,
    message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sender_name: String,
    sender_email: String,
    sender_headline: Option<String>,
    sender_location: Option<String>,
    sender_avatar_url: Option<String>,
}

impl From<PendingRow> for IncomingRequest {
    fn from(row: PendingRow) -> Self {
        IncomingRequest {
            sender: UserSummary {
                id: row.sender_id,
                name: row.sender_name,
                email: row.sender_email,
                headline: row.sender_headline,
                location: row.sender_location,
                avatar_url: row.sender_avatar_url,
            },
            request: ConnectionRequest {
                id: row.id,
                sender_id: row.sender_id,
                receiver_id: row.receiver_id,
                status: row.status,
                message: row.message,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

impl ConnectionStore for PgConnection {
    async fn find_request(&mut self, request_id: Uuid) -> AppResult<Option<ConnectionRequest>> {
        sqlx::query_as::<_, ConnectionRequest>(
            "SELECT * FROM connection_requests WHERE id = $1",
        )
        .bind(request_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to fetch connection request: {}", e);
            AppError::InternalServerError(anyhow!("Failed to fetch connection request"))
        })
    }

    async fn find_live_request_between(
        &mut self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Option<ConnectionRequest>> {
        let (low, high) = canonical_pair(user_a, user_b);
        sqlx::query_as::<_, ConnectionRequest>(
            "SELECT * FROM connection_requests \
             WHERE least(sender_id, receiver_id) = $1 \
               AND greatest(sender_id, receiver_id) = $2 \
               AND status IN ('pending', 'accepted')",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to look up live connection record: {}", e);
            AppError::InternalServerError(anyhow!("Failed to look up connection record"))
        })
    }

    async fn find_pending_between(
        &mut self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Option<ConnectionRequest>> {
        let (low, high) = canonical_pair(user_a, user_b);
        sqlx::query_as::<_, ConnectionRequest>(
            "SELECT * FROM connection_requests \
             WHERE least(sender_id, receiver_id) = $1 \
               AND greatest(sender_id, receiver_id) = $2 \
               AND status = 'pending'",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to look up pending connection record: {}", e);
            AppError::InternalServerError(anyhow!("Failed to look up connection record"))
        })
    }

    async fn insert_request(
        &mut self,
        sender_id: Uuid,
        receiver_id: Uuid,
        message: Option<String>,
    ) -> AppResult<ConnectionRequest> {
        sqlx::query_as::<_, ConnectionRequest>(
            "INSERT INTO connection_requests (id, sender_id, receiver_id, message) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(message)
        .fetch_one(&mut *self)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                // Lost a race against a concurrent request for the same
                // pair; the partial unique index is the arbiter.
                if db_err.is_unique_violation() {
                    return AppError::Conflict(anyhow!("Connection request already sent"));
                }
            }
            tracing::error!("failed to insert connection request: {}", e);
            AppError::InternalServerError(anyhow!("Failed to send connection request"))
        })
    }

    async fn transition_request(
        &mut self,
        request_id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> AppResult<Option<ConnectionRequest>> {
        sqlx::query_as::<_, ConnectionRequest>(
            "UPDATE connection_requests SET status = $2, updated_at = now() \
             WHERE id = $1 AND status = $3 RETURNING *",
        )
        .bind(request_id)
        .bind(to)
        .bind(from)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to update connection request status: {}", e);
            AppError::InternalServerError(anyhow!("Failed to update connection request status"))
        })
    }

    async fn demote_accepted_between(&mut self, user_a: Uuid, user_b: Uuid) -> AppResult<()> {
        let (low, high) = canonical_pair(user_a, user_b);
        sqlx::query(
            "UPDATE connection_requests SET status = 'declined', updated_at = now() \
             WHERE least(sender_id, receiver_id) = $1 \
               AND greatest(sender_id, receiver_id) = $2 \
               AND status = 'accepted'",
        )
        .bind(low)
        .bind(high)
        .execute(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to demote accepted connection record: {}", e);
            AppError::InternalServerError(anyhow!("Failed to update connection record"))
        })?;

        Ok(())
    }

    async fn pending_for_receiver(
        &mut self,
        receiver_id: Uuid,
    ) -> AppResult<Vec<IncomingRequest>> {
        let rows = sqlx::query_as::<_, PendingRow>(
            "SELECT cr.id, cr.sender_id, cr.receiver_id, cr.status, cr.message, \
                    cr.created_at, cr.updated_at, \
                    u.name AS sender_name, u.email AS sender_email, \
                    u.headline AS sender_headline, u.location AS sender_location, \
                    u.avatar_url AS sender_avatar_url \
             FROM connection_requests cr \
             JOIN users u ON u.id = cr.sender_id \
             WHERE cr.receiver_id = $1 AND cr.status = 'pending' \
             ORDER BY cr.created_at DESC",
        )
        .bind(receiver_id)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to fetch pending connection requests: {}", e);
            AppError::InternalServerError(anyhow!("Failed to fetch connection requests"))
        })?;

        Ok(rows.into_iter().map(IncomingRequest::from).collect())
    }

    async fn pending_involving(&mut self, user_id: Uuid) -> AppResult<Vec<ConnectionRequest>> {
        sqlx::query_as::<_, ConnectionRequest>(
            "SELECT * FROM connection_requests \
             WHERE (sender_id = $1 OR receiver_id = $1) AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to fetch pending connection records: {}", e);
            AppError::InternalServerError(anyhow!("Failed to fetch connection records"))
        })
    }
}
