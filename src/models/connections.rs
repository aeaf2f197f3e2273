use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::users::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "connection_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

/// Authoritative relationship record. Created Pending by the sender; only
/// the receiver may move it to Accepted or Declined, and removal demotes an
/// Accepted record back to Declined instead of deleting it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: ConnectionStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConnectionRequest {
    /// The other participant, as seen from `user_id`.
    pub fn counterparty(&self, user_id: Uuid) -> Uuid {
        if self.sender_id == user_id {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

/// Order the two ids of an unordered pair consistently so lookups and the
/// live-pair uniqueness index work regardless of request direction.
pub fn canonical_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    (std::cmp::min(a, b), std::cmp::max(a, b))
}

/// Relationship between the viewer and another user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipState {
    Connected,
    RequestSent,
    RequestReceived,
    NotConnected,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusView {
    pub status: RelationshipState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<Uuid>,
}

/// A pending request with its sender populated for display.
#[derive(Debug, Clone, Serialize)]
pub struct IncomingRequest {
    #[serde(flatten)]
    pub request: ConnectionRequest,
    pub sender: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_direction_agnostic() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
        let (low, high) = canonical_pair(a, b);
        assert!(low <= high);
    }

    #[test]
    fn counterparty_resolves_either_side() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            sender_id: sender,
            receiver_id: receiver,
            status: ConnectionStatus::Pending,
            message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(request.counterparty(sender), receiver);
        assert_eq!(request.counterparty(receiver), sender);
    }
}
