use anyhow::anyhow;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::notifications::{NewNotification, Notification};
use crate::service::store::NotificationSink;

impl NotificationSink for PgConnection {
    async fn create_notification(&mut self, notification: NewNotification) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, sender_id, kind, message) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(notification.recipient_id)
        .bind(notification.sender_id)
        .bind(notification.kind)
        .bind(notification.message)
        .execute(&mut *self)
        .await
        .map_err(|e| {
            tracing::error!("failed to insert notification: {}", e);
            AppError::InternalServerError(anyhow!("Failed to create notification"))
        })?;

        Ok(())
    }
}

pub async fn list_notifications_for_user(
    conn: &mut PgConnection,
    recipient_id: Uuid,
) -> AppResult<Vec<Notification>> {
    sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE recipient_id = $1 ORDER BY created_at DESC LIMIT 50",
    )
    .bind(recipient_id)
    .fetch_all(conn)
    .await
    .map_err(|e| {
        tracing::error!("failed to fetch notifications: {}", e);
        AppError::InternalServerError(anyhow!("Failed to fetch notifications"))
    })
}

pub async fn mark_notification_read(
    conn: &mut PgConnection,
    notification_id: Uuid,
    recipient_id: Uuid,
) -> AppResult<Notification> {
    sqlx::query_as::<_, Notification>(
        "UPDATE notifications SET is_read = true, read_at = now() \
         WHERE id = $1 AND recipient_id = $2 RETURNING *",
    )
    .bind(notification_id)
    .bind(recipient_id)
    .fetch_optional(conn)
    .await
    .map_err(|e| {
        tracing::error!("failed to mark notification read: {}", e);
        AppError::InternalServerError(anyhow!("Failed to update notification"))
    })?
    .ok_or_else(|| AppError::NotFound(anyhow!("Notification not found")))
}
