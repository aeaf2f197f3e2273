//! Collaborator seams for the connection lifecycle manager.
//!
//! The Postgres implementations live in `crate::queries`; tests run the
//! manager against an in-memory implementation instead.

use uuid::Uuid;

use crate::error::AppResult;
use crate::models::connections::{ConnectionRequest, ConnectionStatus, IncomingRequest};
use crate::models::notifications::NewNotification;
use crate::models::users::UserSummary;

/// User lookup plus mutation of the denormalized membership set.
///
/// `add_member` has set-union semantics and `remove_member` is a no-op for
/// absent members, so both sides of an accepted connection can be applied
/// (or re-applied) independently.
#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    async fn find_user(&mut self, user_id: Uuid) -> AppResult<Option<UserSummary>>;

    async fn member_ids(&mut self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    async fn is_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<bool>;

    async fn add_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<()>;

    async fn remove_member(&mut self, user_id: Uuid, other_id: Uuid) -> AppResult<()>;

    async fn list_members(&mut self, user_id: Uuid) -> AppResult<Vec<UserSummary>>;

    async fn suggest_users(&mut self, exclude: &[Uuid], limit: i64)
        -> AppResult<Vec<UserSummary>>;
}

/// Indexed access to the authoritative relationship records.
#[allow(async_fn_in_trait)]
pub trait ConnectionStore {
    async fn find_request(&mut self, request_id: Uuid) -> AppResult<Option<ConnectionRequest>>;

    /// Any Pending or Accepted record for the unordered pair, regardless of
    /// direction. Declined history is ignored.
    async fn find_live_request_between(
        &mut self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Option<ConnectionRequest>>;

    async fn find_pending_between(
        &mut self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> AppResult<Option<ConnectionRequest>>;

    /// Creates a Pending record. Fails with `Conflict` if a live record for
    /// the pair already exists (the store enforces this even when two
    /// requests race past the application-level check).
    async fn insert_request(
        &mut self,
        sender_id: Uuid,
        receiver_id: Uuid,
        message: Option<String>,
    ) -> AppResult<ConnectionRequest>;

    /// Compare-and-swap transition: updates the record only if it is still
    /// in `from`, returning `None` when another writer got there first.
    async fn transition_request(
        &mut self,
        request_id: Uuid,
        from: ConnectionStatus,
        to: ConnectionStatus,
    ) -> AppResult<Option<ConnectionRequest>>;

    /// Moves an Accepted record for the pair to Declined, if one exists.
    async fn demote_accepted_between(&mut self, user_a: Uuid, user_b: Uuid) -> AppResult<()>;

    /// Pending records addressed to `receiver_id`, newest first, with the
    /// sender populated.
    async fn pending_for_receiver(&mut self, receiver_id: Uuid)
        -> AppResult<Vec<IncomingRequest>>;

    /// Pending records where `user_id` is sender or receiver.
    async fn pending_involving(&mut self, user_id: Uuid) -> AppResult<Vec<ConnectionRequest>>;
}

/// Fire-and-forget notification writes. Never read back by the manager.
#[allow(async_fn_in_trait)]
pub trait NotificationSink {
    async fn create_notification(&mut self, notification: NewNotification) -> AppResult<()>;
}
