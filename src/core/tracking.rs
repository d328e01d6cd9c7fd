//! Append-only tracking history for orders.
//!
//! Every lifecycle operation writes one row here in the same transaction as the
//! order change. Rows are never updated or deleted.

use crate::{
    core::{Actor, now},
    entities::{OrderTracking, TrackingEvent, order, order_tracking},
    errors::Result,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;

/// Optional caller-supplied details for a tracking entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingRequest {
    /// Free-text note for the history entry
    pub comment: Option<String>,
    /// Whether the entry is shown, defaults to true
    pub is_active: Option<bool>,
}

/// Records `event` against `order`, snapshotting its current status.
pub async fn append<C: ConnectionTrait>(
    db: &C,
    order: &order::Model,
    event: TrackingEvent,
    request: Option<&TrackingRequest>,
    actor: Actor,
) -> Result<order_tracking::Model> {
    order_tracking::ActiveModel {
        order_id: Set(order.order_id),
        event: Set(event),
        shipment_status_id: Set(Some(order.shipment_status_id)),
        comment: Set(request.and_then(|r| r.comment.clone())),
        is_active: Set(request.and_then(|r| r.is_active).unwrap_or(true)),
        created_at: Set(now()),
        created_by: Set(actor.stamp()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a tracking row by id.
pub async fn get_tracking<C: ConnectionTrait>(
    db: &C,
    tracking_id: i64,
) -> Result<Option<order_tracking::Model>> {
    OrderTracking::find_by_id(tracking_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Full history of an order, oldest first.
pub async fn history_for_order<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
) -> Result<Vec<order_tracking::Model>> {
    OrderTracking::find()
        .filter(order_tracking::Column::OrderId.eq(order_id))
        .order_by_asc(order_tracking::Column::OrderTrackingId)
        .all(db)
        .await
        .map_err(Into::into)
}
