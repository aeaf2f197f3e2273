//! Connection lifecycle manager.
//!
//! Per unordered user pair the relationship moves through
//! `NONE -> PENDING(sender) -> ACCEPTED | DECLINED`, with removal demoting
//! an Accepted record back to Declined. The authoritative record lives in
//! the connection store; each user's denormalized membership set is updated
//! as a side effect of accepting or removing. The multi-step accept effect
//! is not transactional: the status transition and the two membership
//! writes commit independently, and the membership writes are idempotent so
//! they can be re-applied.

use anyhow::anyhow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::connections::{
    ConnectionRequest, ConnectionStatus, ConnectionStatusView, IncomingRequest, RelationshipState,
};
use crate::models::notifications::{NewNotification, NotificationKind};
use crate::models::users::UserSummary;
use crate::service::store::{ConnectionStore, NotificationSink, UserDirectory};

pub const SUGGESTION_LIMIT: i64 = 10;

pub async fn send_request<S>(
    store: &mut S,
    requester_id: Uuid,
    target_id: Uuid,
    message: Option<String>,
) -> AppResult<ConnectionRequest>
where
    S: ConnectionStore + UserDirectory + NotificationSink,
{
    if requester_id == target_id {
        return Err(AppError::BadRequest(anyhow!(
            "You cannot connect with yourself"
        )));
    }

    let requester = store
        .find_user(requester_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;

    if store.find_user(target_id).await?.is_none() {
        return Err(AppError::NotFound(anyhow!("User not found")));
    }

    // Direction-agnostic duplicate check on the unordered pair.
    if let Some(existing) = store
        .find_live_request_between(requester_id, target_id)
        .await?
    {
        return Err(match existing.status {
            ConnectionStatus::Accepted => AppError::Conflict(anyhow!("You are already connected")),
            _ => AppError::Conflict(anyhow!("Connection request already sent")),
        });
    }

    let request = store
        .insert_request(requester_id, target_id, message)
        .await?;

    store
        .create_notification(NewNotification {
            recipient_id: target_id,
            sender_id: requester_id,
            kind: NotificationKind::ConnectionRequest,
            message: format!("{} sent you a connection request", requester.name),
        })
        .await?;

    Ok(request)
}

pub async fn accept_request<S>(
    store: &mut S,
    connection_id: Uuid,
    acting_user_id: Uuid,
) -> AppResult<ConnectionRequest>
where
    S: ConnectionStore + UserDirectory + NotificationSink,
{
    let request = store
        .find_request(connection_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Connection request not found")))?;

    if request.receiver_id != acting_user_id {
        return Err(AppError::Forbidden(anyhow!(
            "Not authorized to accept this request"
        )));
    }

    if request.status != ConnectionStatus::Pending {
        return Err(AppError::Conflict(anyhow!(
            "Connection request is not pending"
        )));
    }

    // The store serializes concurrent transitions; losing the race surfaces
    // as a conflict, not a double accept.
    let updated = store
        .transition_request(
            connection_id,
            ConnectionStatus::Pending,
            ConnectionStatus::Accepted,
        )
        .await?
        .ok_or_else(|| AppError::Conflict(anyhow!("Connection request is not pending")))?;

    apply_accepted_membership(store, updated.sender_id, updated.receiver_id).await?;

    let receiver = store
        .find_user(updated.receiver_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;

    store
        .create_notification(NewNotification {
            recipient_id: updated.sender_id,
            sender_id: updated.receiver_id,
            kind: NotificationKind::ConnectionAccepted,
            message: format!("{} accepted your connection request", receiver.name),
        })
        .await?;

    Ok(updated)
}

pub async fn decline_request<S>(
    store: &mut S,
    connection_id: Uuid,
    acting_user_id: Uuid,
) -> AppResult<ConnectionRequest>
where
    S: ConnectionStore,
{
    let request = store
        .find_request(connection_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow!("Connection request not found")))?;

    if request.receiver_id != acting_user_id {
        return Err(AppError::Forbidden(anyhow!(
            "Not authorized to decline this request"
        )));
    }

    if request.status != ConnectionStatus::Pending {
        return Err(AppError::Conflict(anyhow!(
            "Connection request is not pending"
        )));
    }

    store
        .transition_request(
            connection_id,
            ConnectionStatus::Pending,
            ConnectionStatus::Declined,
        )
        .await?
        .ok_or_else(|| AppError::Conflict(anyhow!("Connection request is not pending")))
}

/// Both membership writes are set unions, so re-running this (on the accept
/// path or from an out-of-band reconciliation pass) is safe.
pub async fn apply_accepted_membership<S: UserDirectory>(
    store: &mut S,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> AppResult<()> {
    store.add_member(sender_id, receiver_id).await?;
    store.add_member(receiver_id, sender_id).await?;
    Ok(())
}

/// Idempotent: removing a non-member is a no-op, and a missing Accepted
/// record leaves only the membership removal to do.
pub async fn remove_connection<S>(store: &mut S, user_id: Uuid, other_id: Uuid) -> AppResult<()>
where
    S: ConnectionStore + UserDirectory,
{
    store.remove_member(user_id, other_id).await?;
    store.remove_member(other_id, user_id).await?;

    // Demote so a future request is not blocked by a stale Accepted record.
    store.demote_accepted_between(user_id, other_id).await?;

    Ok(())
}

pub async fn relationship_status<S>(
    store: &mut S,
    viewer_id: Uuid,
    other_id: Uuid,
) -> AppResult<ConnectionStatusView>
where
    S: ConnectionStore + UserDirectory,
{
    // The membership set is authoritative for "connected".
    if store.is_member(viewer_id, other_id).await? {
        return Ok(ConnectionStatusView {
            status: RelationshipState::Connected,
            connection_id: None,
        });
    }

    if let Some(pending) = store.find_pending_between(viewer_id, other_id).await? {
        let status = if pending.sender_id == viewer_id {
            RelationshipState::RequestSent
        } else {
            RelationshipState::RequestReceived
        };
        return Ok(ConnectionStatusView {
            status,
            connection_id: Some(pending.id),
        });
    }

    Ok(ConnectionStatusView {
        status: RelationshipState::NotConnected,
        connection_id: None,
    })
}

pub async fn pending_incoming<S: ConnectionStore>(
    store: &mut S,
    user_id: Uuid,
) -> AppResult<Vec<IncomingRequest>> {
    store.pending_for_receiver(user_id).await
}

pub async fn connections_of<S: UserDirectory>(
    store: &mut S,
    user_id: Uuid,
) -> AppResult<Vec<UserSummary>> {
    store.list_members(user_id).await
}

/// Candidates for connection, selected by exclusion only: never the user
/// themselves, anyone already in their membership set, or anyone on either
/// side of a Pending record with them.
pub async fn suggestions<S>(store: &mut S, user_id: Uuid) -> AppResult<Vec<UserSummary>>
where
    S: ConnectionStore + UserDirectory,
{
    let mut exclude = store.member_ids(user_id).await?;
    exclude.push(user_id);

    for request in store.pending_involving(user_id).await? {
        exclude.push(request.counterparty(user_id));
    }

    exclude.sort_unstable();
    exclude.dedup();

    store.suggest_users(&exclude, SUGGESTION_LIMIT).await
}
