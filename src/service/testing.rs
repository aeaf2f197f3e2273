//! In-memory store for exercising the lifecycle manager without Postgres.
//!
//! Mirrors the constraints the real schema enforces: one live record per
//! unordered pair, compare-and-swap status transitions, and set semantics
//! on the membership arrays.

use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::connections::{
    canonical_pair, ConnectionRequest, ConnectionStatus, IncomingRequest,
};
use crate::models::notifications::NewNotification;
use crate::models::users::UserSummary;
use crate::service::store::{ConnectionStore, NotificationSink, UserDirectory};

pub struct UserRecord {
    pub summary: UserSummary,
    pub connections: HashSet<Uuid>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub users: HashMap<Uuid, UserRecord>,
    pub requests: Vec<ConnectionRequest>,
    pub notifications: Vec<NewNotification>,
    clock: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.insert(
            id,
            UserRecord {
                summary: UserSummary {
                    id,
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    headline: None,
                    location: None,
                    avatar_url: None,
                },
                connections: HashSet::new(),
            },
        );
        id
    }

    // Strictly increasing timestamps so newest-first ordering is stable.
    fn next_timestamp(&mut self) -> chrono::DateTime<Utc> {
        self.clock += 1;
        Utc::now() + Duration::milliseconds(self.clock)
    }

    fn live_between(&self, a: Uuid, b: Uuid) -> Option<&ConnectionRequest> {
        let pair = canonical_pair(a, b);
        self.requests.iter().find(|r| {
            canonical_pair(r.sender_id, r.receiver_id) == pair
                && matches!(
                    r.status,
                    ConnectionStatus::Pending | ConnectionStatus::Accepted
                )
        })
    }
}

impl UserDirectory for MemoryStore {
    async fn find_user(&mut self, user_id: Uuid) -> AppResult<Option<UserSummary>> {
        Ok(self.users.get(&user_id).map(|u| u.summary.clone()))
    }

    async fn member_ids(&mut self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let user = self
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;
        let mut ids: Vec<Uuid> = user.connections.iter().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn is_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<bool> {
        let user = self
            .users
            .get(&user_id)
            .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;
        Ok(user.connections.contains(&other_id))
    }

    async fn add_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<()> {
        if let Some(user) = self.users.get_mut(&user_id) {
            user.connections.insert(other_id);
        }
        Ok(())
    }

    async fn remove_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<()> {
        if let Some(user) = self.users.get_mut(&user_id) {
            user.connections.remove(&other_id);
        }
        Ok(())
    }

    async fn list_members(&mut self, user_id: Uuid) -> AppResult<Vec<UserSummary>> {
        let member_ids = self.member_ids(user_id).await?;
        let mut members: Vec<UserSummary> = member_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.summary.clone()))
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    async fn suggest_users(
        &mut self,
        exclude: &[Uuid],
        limit: i64,
    ) -> AppResult<Vec<UserSummary>> {
        let mut candidates: Vec<UserSummary> = self
            .users
            .values()
            .filter(|u| !exclude.contains(&u.summary.id))
            .map(|u| u.summary.clone())
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        candidates.truncate(limit as usize);
        Ok(candidates)
    }
}

impl ConnectionStore for MemoryStore {
    async fn find_request(&mut self, request_id: Uuid) -> AppResult<Option<ConnectionRequest>> {
        Ok(self.requests.iter().find(|r| r.id == request_id).cloned())
    }

    async fn find_live_request_between(
        &mut self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Option<ConnectionRequest>> {
        Ok(self.live_between(user_a, user_b).cloned())
    }

    async fn find_pending_between(
        &mut self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Option<ConnectionRequest>> {
        Ok(self
            .live_between(user_a, user_b)
            .filter(|r| r.status == ConnectionStatus::Pending)
            .cloned())
    }

    async fn insert_request(
        &mut self,
        sender_id: Uuid,
        receiver_id: Uuid,
        message: Option<String>,
    ) -> AppResult<ConnectionRequest> {
        // The live-pair uniqueness index, in miniature.
        if self.live_between(sender_id, receiver_id).is_some() {
            return Err(AppError::Conflict(anyhow!(
                "Connection request already sent"
            )));
        }

        let now = self.next_timestamp();
        let request = ConnectionRequest {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status: ConnectionStatus::Pending,
            message,
            created_at: now,
            updated_at: now,
        };
        self.requests.push(request.clone());
        Ok(request)
    }

    async fn transition_request(
        &mut self,
        request_id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> AppResult<Option<ConnectionRequest>> {
        let now = self.next_timestamp();
        if let Some(request) = self.requests.iter_mut().find(|r| r.id == request_id) {
            if request.status == from {
                request.status = to;
                request.updated_at = now;
                return Ok(Some(request.clone()));
            }
        }
        Ok(None)
    }

    async fn demote_accepted_between(&mut self, user_a: Uuid, user_b: Uuid) -> AppResult<()> {
        let pair = canonical_pair(user_a, user_b);
        let now = self.next_timestamp();
        for request in self.requests.iter_mut() {
            if canonical_pair(request.sender_id, request.receiver_id) == pair
                && request.status == ConnectionStatus::Accepted
            {
                request.status = ConnectionStatus::Declined;
                request.updated_at = now;
            }
        }
        Ok(())
    }

    async fn pending_for_receiver(
        &mut self,
        receiver_id: Uuid,
    ) -> AppResult<Vec<IncomingRequest>> {
        let mut pending: Vec<ConnectionRequest> = self
            .requests
            .iter()
            .filter(|r| r.receiver_id == receiver_id && r.status == ConnectionStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        pending
            .into_iter()
            .map(|request| {
                let sender = self
                    .users
                    .get(&request.sender_id)
                    .map(|u| u.summary.clone())
                    .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;
                Ok(IncomingRequest { request, sender })
            })
            .collect()
    }

    async fn pending_involving(&mut self, user_id: Uuid) -> AppResult<Vec<ConnectionRequest>> {
        Ok(self
            .requests
            .iter()
            .filter(|r| {
                r.status == ConnectionStatus::Pending
                    && (r.sender_id == user_id || r.receiver_id == user_id)
            })
            .cloned()
            .collect())
    }
}

impl NotificationSink for MemoryStore {
    async fn create_notification(&mut self, notification: NewNotification) -> AppResult<()> {
        self.notifications.push(notification);
        Ok(())
    }
}
