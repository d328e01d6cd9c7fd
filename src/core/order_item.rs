//! Order item operations.
//!
//! Items are created with their order and synchronised by `update_order`; the
//! standalone functions here cover single-item edits.

use crate::{
    core::{Actor, now},
    entities::{Order, OrderItem, order, order_item},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Item fields sent with an order. `order_item_id` selects an existing item to
/// update; without it the item is new.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    /// Existing item to edit; absent or 0 adds a new one
    pub order_item_id: Option<i64>,
    /// Boxes on this line
    pub number_of_box: Option<i32>,
    /// Box height
    pub parcel_height: Option<i32>,
    /// Box width
    pub parcel_width: Option<i32>,
    /// Box breadth
    pub parcel_breadth: Option<i32>,
    /// Volume of this line
    pub volume: Option<f64>,
    /// New value for the active flag
    pub is_active: Option<bool>,
}

pub(crate) fn new_item(
    order_id: i64,
    request: &OrderItemRequest,
    actor: Actor,
    now: NaiveDateTime,
) -> order_item::ActiveModel {
    order_item::ActiveModel {
        order_id: Set(order_id),
        number_of_box: Set(request.number_of_box),
        parcel_height: Set(request.parcel_height),
        parcel_width: Set(request.parcel_width),
        parcel_breadth: Set(request.parcel_breadth),
        volume: Set(request.volume),
        is_active: Set(request.is_active.unwrap_or(true)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.stamp()),
        ..Default::default()
    }
}

/// Builds an update touching only the fields whose values differ. Returns `None`
/// when nothing changed, so unchanged items keep their audit stamps.
pub(crate) fn changed_fields(
    item: order_item::Model,
    request: &OrderItemRequest,
    actor: Actor,
    now: NaiveDateTime,
) -> Option<order_item::ActiveModel> {
    let mut changed = false;
    let mut active: order_item::ActiveModel = item.clone().into();

    macro_rules! apply {
        ($field:ident) => {
            if request.$field.is_some() && request.$field != item.$field {
                active.$field = Set(request.$field);
                changed = true;
            }
        };
    }
    apply!(number_of_box);
    apply!(parcel_height);
    apply!(parcel_width);
    apply!(parcel_breadth);
    apply!(volume);
    if let Some(is_active) = request.is_active.filter(|a| *a != item.is_active) {
        active.is_active = Set(is_active);
        changed = true;
    }

    changed.then(|| {
        active.updated_by = Set(actor.stamp());
        active.updated_at = Set(now);
        active
    })
}

/// Live items of an order, ordered by id.
pub async fn list_items_for_order<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
) -> Result<Vec<order_item::Model>> {
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .filter(order_item::Column::IsDeleted.eq(false))
        .order_by_asc(order_item::Column::OrderItemId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a live item by id.
pub async fn get_item<C: ConnectionTrait>(
    db: &C,
    order_item_id: i64,
) -> Result<Option<order_item::Model>> {
    OrderItem::find_by_id(order_item_id)
        .filter(order_item::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds one item to a live order.
#[instrument(skip(db, request))]
pub async fn add_item(
    db: &DatabaseConnection,
    order_id: i64,
    request: OrderItemRequest,
    actor: Actor,
) -> Result<order_item::Model> {
    Order::find_by_id(order_id)
        .filter(order::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;

    new_item(order_id, &request, actor, now())
        .insert(db)
        .await
        .map_err(Into::into)
}

/// Updates one item in place. An unchanged request returns the item untouched.
#[instrument(skip(db, request))]
pub async fn update_item(
    db: &DatabaseConnection,
    order_item_id: i64,
    request: OrderItemRequest,
    actor: Actor,
) -> Result<order_item::Model> {
    let item = get_item(db, order_item_id)
        .await?
        .ok_or_else(|| Error::not_found("OrderItem", order_item_id))?;

    match changed_fields(item.clone(), &request, actor, now()) {
        Some(active) => active.update(db).await.map_err(Into::into),
        None => Ok(item),
    }
}

/// Soft-deletes one item.
#[instrument(skip(db))]
pub async fn delete_item(
    db: &DatabaseConnection,
    order_item_id: i64,
    actor: Actor,
) -> Result<order_item::Model> {
    let item = get_item(db, order_item_id)
        .await?
        .ok_or_else(|| Error::not_found("OrderItem", order_item_id))?;

    let mut active: order_item::ActiveModel = item.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}
