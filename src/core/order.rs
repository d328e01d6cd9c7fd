//! Order lifecycle manager.
//!
//! Creation books an order together with its addresses, items and first tracking
//! row. Assignment, pickup confirmation, status updates, proof of delivery and
//! deletion each change the order and append to its tracking history. Every
//! mutating operation here runs in a single transaction that commits once at the
//! end, so a failure at any step leaves no partial rows behind.

use crate::{
    core::{
        Actor,
        address_book::{AddressRequest, resolve_reference},
        lookup, now,
        order_item::{OrderItemRequest, changed_fields, list_items_for_order, new_item},
        status::{ShipmentStage, StatusCatalog},
        tracking::{self, TrackingRequest},
    },
    entities::{
        AddressBook, DimensionType, Driver, Order, OrderItem, PaymentType, TrackingEvent, Vehicle,
        address_book, driver, order, order_item, order_tracking, vehicle,
    },
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::{
    Condition, DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// First docket number handed out on an empty database.
pub const DOCKET_SEED: i64 = 202_100_000;

/// Scalar order fields shared by create and update. Only present fields are
/// written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderFields {
    /// Who pays for the shipment
    pub payment_type: Option<PaymentType>,
    /// Amount to collect on delivery
    pub cod_amount: Option<i64>,
    /// Service type lookup id
    pub service_type_id: Option<i64>,
    /// Payment mode lookup id
    pub payment_mode_id: Option<i64>,
    /// Customer lookup id
    pub customer_id: Option<i64>,
    /// Parcel type lookup id
    pub parcel_type_id: Option<i64>,
    /// GST registration of the consignor
    pub gst_number: Option<String>,
    /// Declared value of the goods
    pub shipment_value: Option<i64>,
    /// Consignor invoice number
    pub invoice_no: Option<String>,
    /// E-way bill number
    pub e_way_bill: Option<String>,
    /// Forwarding charge
    pub forwarding: Option<i64>,
    /// Instructions taken at booking
    pub booking_instruction: Option<String>,
    /// Combined size of all boxes
    pub total_box_size: Option<i32>,
    /// Number of boxes
    pub total_no_of_box: Option<i32>,
    /// Unit of the box dimensions
    pub dimension_type: Option<DimensionType>,
    /// Combined volume
    pub total_volume: Option<f64>,
    /// Total weight
    pub parcel_weight: Option<i32>,
    /// Handle with care
    pub is_fragile: Option<bool>,
    /// Free-text comment on the order
    pub comment: Option<String>,
    /// New value for the active flag
    pub is_active: Option<bool>,
}

impl OrderFields {
    fn apply_to(self, active: &mut order::ActiveModel) {
        macro_rules! set_present {
            ($($field:ident),* $(,)?) => {
                $(
                    if self.$field.is_some() {
                        active.$field = Set(self.$field);
                    }
                )*
            };
        }
        set_present!(
            payment_type,
            cod_amount,
            service_type_id,
            payment_mode_id,
            customer_id,
            parcel_type_id,
            gst_number,
            shipment_value,
            invoice_no,
            e_way_bill,
            forwarding,
            booking_instruction,
            total_box_size,
            total_no_of_box,
            dimension_type,
            total_volume,
            parcel_weight,
            comment,
        );
        if let Some(is_fragile) = self.is_fragile {
            active.is_fragile = Set(is_fragile);
        }
        if let Some(is_active) = self.is_active {
            active.is_active = Set(is_active);
        }
    }
}

/// Payload for [`create_order`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateOrderRequest {
    /// Scalar order fields
    #[serde(flatten)]
    pub fields: OrderFields,
    /// Kept only when `is_docket_auto` is false
    pub manual_docket: Option<String>,
    /// When true the system docket is the only docket
    pub is_docket_auto: bool,
    /// Existing sender address to reuse
    pub sender_address_book_id: Option<i64>,
    /// Inline sender address, stored when no live id is given
    pub sender_address: Option<AddressRequest>,
    /// Existing receiver address to reuse
    pub receiver_address_book_id: Option<i64>,
    /// Inline receiver address, stored when no live id is given
    pub receiver_address: Option<AddressRequest>,
    /// Items booked with the order
    pub order_items: Vec<OrderItemRequest>,
    /// First history entry, if any
    pub order_tracking: Option<TrackingRequest>,
}

/// Payload for [`update_order`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateOrderRequest {
    /// Scalar order fields to change
    #[serde(flatten)]
    pub fields: OrderFields,
    /// New status, must be live
    pub shipment_status_id: Option<i64>,
    /// Existing sender address to switch to
    pub sender_address_book_id: Option<i64>,
    /// Inline sender address to store and switch to
    pub sender_address: Option<AddressRequest>,
    /// Existing receiver address to switch to
    pub receiver_address_book_id: Option<i64>,
    /// Inline receiver address to store and switch to
    pub receiver_address: Option<AddressRequest>,
    /// Items with an id are edited, items without one are added. Omitted items
    /// are left alone.
    pub order_items: Vec<OrderItemRequest>,
    /// History entry for this update, if any
    pub order_tracking: Option<TrackingRequest>,
}

/// Payload for [`assign_driver_vehicle`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentRequest {
    /// Orders to assign; unknown ids are ignored
    pub order_ids: Vec<i64>,
    /// Live driver
    pub driver_id: i64,
    /// Live vehicle
    pub vehicle_id: i64,
    /// Agreed pickup time
    pub appointment_date_time: Option<NaiveDateTime>,
    /// History entry written for every assigned order
    pub order_tracking: Option<TrackingRequest>,
}

/// Payload for [`update_shipment_status`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusUpdateRequest {
    /// New status, must be live
    pub shipment_status_id: Option<i64>,
    /// Replaces the order comment
    pub comment: Option<String>,
    /// History entry for this change, if any
    pub order_tracking: Option<TrackingRequest>,
}

/// A created or updated order with its live items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    /// The order row as stored
    pub order: order::Model,
    /// See [`display_docket`]
    pub display_docket: String,
    /// Live items of the order
    pub items: Vec<order_item::Model>,
    /// The tracking row appended by this operation, if any
    pub tracking: Option<order_tracking::Model>,
}

/// One order touched by an assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignedOrder {
    /// Order id
    pub order_id: i64,
    /// System docket number
    pub docket_no: i64,
    /// Status id after assignment
    pub shipment_status_id: i64,
    /// Status name after assignment
    pub shipment_status: String,
    /// Agreed pickup time
    pub appointment_date_time: Option<NaiveDateTime>,
}

/// Outcome of [`assign_driver_vehicle`].
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    /// One entry per assigned order
    pub orders: Vec<AssignedOrder>,
    /// History rows written, empty without a tracking payload
    pub tracking: Vec<order_tracking::Model>,
}

/// Outcome of [`confirm_pickup`].
#[derive(Debug, Clone, Serialize)]
pub struct PickupResult {
    /// Order id
    pub order_id: i64,
    /// System docket number
    pub docket_no: i64,
    /// The "In Transit" status id
    pub shipment_status_id: i64,
    /// The "In Transit" status name
    pub shipment_status: String,
    /// History row for the pickup
    pub tracking: order_tracking::Model,
}

/// Outcome of [`update_shipment_status`].
#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    /// Order id
    pub order_id: i64,
    /// The order after the change
    pub order: order::Model,
    /// Name of the current status
    pub shipment_status: Option<String>,
    /// History row written, if a payload was given
    pub tracking: Option<order_tracking::Model>,
}

/// An order with everything a detail view shows.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    /// The order row
    pub order: order::Model,
    /// See [`display_docket`]
    pub display_docket: String,
    /// Current status name
    pub shipment_status: Option<String>,
    /// Assigned driver's name
    pub driver_name: Option<String>,
    /// Assigned vehicle's name
    pub vehicle_name: Option<String>,
    /// Creator's name, "Unknown" if unresolved
    pub created_by_name: String,
    /// Last editor's name
    pub updated_by_name: Option<String>,
    /// Sender address, even if since deleted
    pub sender_address: Option<address_book::Model>,
    /// Receiver address, even if since deleted
    pub receiver_address: Option<address_book::Model>,
    /// Live items
    pub items: Vec<order_item::Model>,
    /// Full history, oldest first
    pub tracking: Vec<order_tracking::Model>,
}

/// One row of [`list_orders`].
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    /// The order row
    pub order: order::Model,
    /// See [`display_docket`]
    pub display_docket: String,
    /// Current status name
    pub shipment_status: Option<String>,
    /// Assigned driver's name
    pub driver_name: Option<String>,
    /// Assigned vehicle's name
    pub vehicle_name: Option<String>,
    /// Sender company or contact
    pub sender_name: Option<String>,
    /// Receiver company or contact
    pub receiver_name: Option<String>,
}

/// Narrows [`list_orders`]. All filters combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderFilter {
    /// Status name, matched case-insensitively
    pub shipment_status: Option<String>,
    /// System docket number or manual docket
    pub docket: Option<String>,
    /// Matches the sender or the receiver address
    pub pincode: Option<String>,
}

/// The docket shown to people: the manual docket for non-auto orders that kept
/// one, otherwise the system docket number.
#[must_use]
pub fn display_docket(order: &order::Model) -> String {
    match (&order.manual_docket, order.is_docket_auto) {
        (Some(manual), false) => manual.clone(),
        _ => order.docket_no.to_string(),
    }
}

async fn next_docket_no<C: ConnectionTrait>(db: &C) -> Result<i64> {
    // Deleted orders count too, docket numbers are never reused
    let last = Order::find()
        .order_by_desc(order::Column::DocketNo)
        .one(db)
        .await?;
    Ok(last.map_or(DOCKET_SEED, |o| o.docket_no + 1))
}

async fn live_order<C: ConnectionTrait>(db: &C, order_id: i64) -> Result<order::Model> {
    Order::find_by_id(order_id)
        .filter(order::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))
}

async fn commit(txn: DatabaseTransaction, operation: &str) -> Result<()> {
    txn.commit()
        .await
        .map_err(|e| Error::from(e).in_transaction(operation))
}

/// Finds a live order by its system docket number.
pub async fn find_by_docket<C: ConnectionTrait>(
    db: &C,
    docket_no: i64,
) -> Result<Option<order::Model>> {
    Order::find()
        .filter(order::Column::DocketNo.eq(docket_no))
        .filter(order::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Books a new order.
///
/// The order starts in the `Booked` status with the next docket number. Sender and
/// receiver addresses are reused or created, items are inserted, and a tracking
/// row is written when the request carries one.
#[instrument(skip(db, request))]
pub async fn create_order(
    db: &DatabaseConnection,
    request: CreateOrderRequest,
    actor: Actor,
) -> Result<OrderResult> {
    let txn = db.begin().await?;
    let result = insert_order(&txn, request, actor)
        .await
        .map_err(|e| e.in_transaction("creating order"))?;
    commit(txn, "creating order").await?;

    info!(
        "Created order {} with docket {} and {} items",
        result.order.order_id,
        result.display_docket,
        result.items.len()
    );
    Ok(result)
}

async fn insert_order(
    txn: &DatabaseTransaction,
    request: CreateOrderRequest,
    actor: Actor,
) -> Result<OrderResult> {
    let catalog = StatusCatalog::load(txn).await?;
    let initial_status = catalog.require(ShipmentStage::Booked)?;
    let docket_no = next_docket_no(txn).await?;

    let manual_docket = if request.is_docket_auto {
        None
    } else {
        request
            .manual_docket
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    };
    if let Some(manual) = &manual_docket {
        let taken = Order::find()
            .filter(order::Column::ManualDocket.eq(manual.as_str()))
            .one(txn)
            .await?;
        if taken.is_some() {
            return Err(Error::Duplicate {
                entity: "Order",
                name: manual.clone(),
            });
        }
    }

    let sender = resolve_reference(
        txn,
        request.sender_address_book_id,
        request.sender_address.as_ref(),
        actor,
    )
    .await?;
    let receiver = resolve_reference(
        txn,
        request.receiver_address_book_id,
        request.receiver_address.as_ref(),
        actor,
    )
    .await?;

    let now = now();
    let mut active = order::ActiveModel {
        docket_no: Set(docket_no),
        manual_docket: Set(manual_docket),
        is_docket_auto: Set(request.is_docket_auto),
        shipment_status_id: Set(initial_status),
        sender_address_book_id: Set(sender),
        receiver_address_book_id: Set(receiver),
        is_fragile: Set(false),
        is_active: Set(true),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.stamp()),
        ..Default::default()
    };
    request.fields.apply_to(&mut active);
    let order = active.insert(txn).await?;

    let mut items = Vec::with_capacity(request.order_items.len());
    for item in &request.order_items {
        items.push(new_item(order.order_id, item, actor, now).insert(txn).await?);
    }

    let tracking = match &request.order_tracking {
        Some(entry) => Some(
            tracking::append(txn, &order, TrackingEvent::Created, Some(entry), actor).await?,
        ),
        None => None,
    };

    Ok(OrderResult {
        display_docket: display_docket(&order),
        order,
        items,
        tracking,
    })
}

/// Applies a partial update to a live order and synchronises the supplied items.
#[instrument(skip(db, request))]
pub async fn update_order(
    db: &DatabaseConnection,
    order_id: i64,
    request: UpdateOrderRequest,
    actor: Actor,
) -> Result<OrderResult> {
    let txn = db.begin().await?;
    let result = apply_order_update(&txn, order_id, request, actor)
        .await
        .map_err(|e| e.in_transaction("updating order"))?;
    commit(txn, "updating order").await?;

    info!("Updated order {order_id}");
    Ok(result)
}

async fn apply_order_update(
    txn: &DatabaseTransaction,
    order_id: i64,
    request: UpdateOrderRequest,
    actor: Actor,
) -> Result<OrderResult> {
    let existing = live_order(txn, order_id).await?;

    if let Some(status_id) = request.shipment_status_id {
        let catalog = StatusCatalog::load(txn).await?;
        if !catalog.contains(status_id) {
            return Err(Error::not_found("ShipmentStatus", status_id));
        }
    }

    let sender = resolve_reference(
        txn,
        request.sender_address_book_id,
        request.sender_address.as_ref(),
        actor,
    )
    .await?;
    let receiver = resolve_reference(
        txn,
        request.receiver_address_book_id,
        request.receiver_address.as_ref(),
        actor,
    )
    .await?;

    let now = now();
    let mut active: order::ActiveModel = existing.into();
    request.fields.apply_to(&mut active);
    if let Some(status_id) = request.shipment_status_id {
        active.shipment_status_id = Set(status_id);
    }
    if sender.is_some() {
        active.sender_address_book_id = Set(sender);
    }
    if receiver.is_some() {
        active.receiver_address_book_id = Set(receiver);
    }
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now);
    let order = active.update(txn).await?;

    for item in &request.order_items {
        match item.order_item_id.filter(|id| *id != 0) {
            Some(item_id) => {
                let current = OrderItem::find_by_id(item_id)
                    .filter(order_item::Column::OrderId.eq(order_id))
                    .filter(order_item::Column::IsDeleted.eq(false))
                    .one(txn)
                    .await?;
                match current {
                    Some(current) => {
                        if let Some(changes) = changed_fields(current, item, actor, now) {
                            changes.update(txn).await?;
                        }
                    }
                    None => warn!("Item {item_id} is not a live item of order {order_id}, skipped"),
                }
            }
            None => {
                new_item(order_id, item, actor, now).insert(txn).await?;
            }
        }
    }

    let tracking = match &request.order_tracking {
        Some(entry) => Some(
            tracking::append(txn, &order, TrackingEvent::Updated, Some(entry), actor).await?,
        ),
        None => None,
    };

    Ok(OrderResult {
        display_docket: display_docket(&order),
        items: list_items_for_order(txn, order_id).await?,
        order,
        tracking,
    })
}

/// Assigns a driver and vehicle to a batch of orders and moves them to
/// "Pending Pickup".
///
/// Unknown ids in `order_ids` are ignored as long as at least one live order
/// matches. Either every matched order is assigned or none is.
#[instrument(skip(db, request), fields(orders = request.order_ids.len()))]
pub async fn assign_driver_vehicle(
    db: &DatabaseConnection,
    request: AssignmentRequest,
    actor: Actor,
) -> Result<AssignmentResult> {
    let txn = db.begin().await?;
    let result = apply_assignment(&txn, &request, actor)
        .await
        .map_err(|e| e.in_transaction("assigning driver and vehicle"))?;
    commit(txn, "assigning driver and vehicle").await?;

    info!(
        "Assigned driver {} and vehicle {} to {} orders",
        request.driver_id,
        request.vehicle_id,
        result.orders.len()
    );
    Ok(result)
}

async fn apply_assignment(
    txn: &DatabaseTransaction,
    request: &AssignmentRequest,
    actor: Actor,
) -> Result<AssignmentResult> {
    let orders = Order::find()
        .filter(order::Column::OrderId.is_in(request.order_ids.iter().copied()))
        .filter(order::Column::IsDeleted.eq(false))
        .order_by_asc(order::Column::OrderId)
        .all(txn)
        .await?;
    if orders.is_empty() {
        return Err(Error::not_found("Order", format!("{:?}", request.order_ids)));
    }

    Driver::find_by_id(request.driver_id)
        .filter(driver::Column::IsDeleted.eq(false))
        .one(txn)
        .await?
        .ok_or_else(|| Error::bad_request(format!("Driver {} not found", request.driver_id)))?;
    Vehicle::find_by_id(request.vehicle_id)
        .filter(vehicle::Column::IsDeleted.eq(false))
        .one(txn)
        .await?
        .ok_or_else(|| Error::bad_request(format!("Vehicle {} not found", request.vehicle_id)))?;

    let catalog = StatusCatalog::load(txn).await?;
    let pending = catalog.id_of(ShipmentStage::PendingPickup).ok_or_else(|| {
        Error::bad_request(format!(
            "Shipment status '{}' not found",
            ShipmentStage::PendingPickup.display_name()
        ))
    })?;
    let pending_name = catalog
        .name_of(pending)
        .unwrap_or(ShipmentStage::PendingPickup.display_name())
        .to_string();

    let now = now();
    let mut result = AssignmentResult {
        orders: Vec::with_capacity(orders.len()),
        tracking: Vec::new(),
    };
    for existing in orders {
        let mut active: order::ActiveModel = existing.into();
        active.driver_id = Set(Some(request.driver_id));
        active.vehicle_id = Set(Some(request.vehicle_id));
        active.shipment_status_id = Set(pending);
        active.appointment_date_time = Set(request.appointment_date_time);
        active.updated_by = Set(actor.stamp());
        active.updated_at = Set(now);
        let order = active.update(txn).await?;

        if let Some(entry) = &request.order_tracking {
            result.tracking.push(
                tracking::append(txn, &order, TrackingEvent::Assigned, Some(entry), actor)
                    .await?,
            );
        }
        result.orders.push(AssignedOrder {
            order_id: order.order_id,
            docket_no: order.docket_no,
            shipment_status_id: order.shipment_status_id,
            shipment_status: pending_name.clone(),
            appointment_date_time: order.appointment_date_time,
        });
    }
    Ok(result)
}

/// Confirms pickup of the order with `docket_no`, moving it from
/// "Pending Pickup" to "In Transit".
#[instrument(skip(db))]
pub async fn confirm_pickup(
    db: &DatabaseConnection,
    docket_no: i64,
    actor: Actor,
) -> Result<PickupResult> {
    let txn = db.begin().await?;
    let result = apply_pickup(&txn, docket_no, actor)
        .await
        .map_err(|e| e.in_transaction("confirming pickup"))?;
    commit(txn, "confirming pickup").await?;

    info!("Order {} with docket {docket_no} is in transit", result.order_id);
    Ok(result)
}

async fn apply_pickup(
    txn: &DatabaseTransaction,
    docket_no: i64,
    actor: Actor,
) -> Result<PickupResult> {
    let existing = find_by_docket(txn, docket_no)
        .await?
        .ok_or_else(|| Error::not_found("Order", docket_no))?;

    let catalog = StatusCatalog::load(txn).await?;
    let pending = catalog.require(ShipmentStage::PendingPickup)?;
    if catalog.stage_of(existing.shipment_status_id) != Some(ShipmentStage::PendingPickup) {
        warn!(
            "Pickup rejected for docket {docket_no}: status is {}",
            catalog
                .name_of(existing.shipment_status_id)
                .unwrap_or(lookup::UNKNOWN)
        );
        return Err(Error::bad_request(format!(
            "Order {docket_no} is not pending pickup"
        )));
    }
    let in_transit = catalog.require(ShipmentStage::InTransit)?;

    // Only succeeds while the row is still pending, so a racing confirmation
    // loses here instead of writing a second transition.
    let updated = Order::update_many()
        .col_expr(order::Column::ShipmentStatusId, Expr::value(in_transit))
        .col_expr(order::Column::UpdatedBy, Expr::value(actor.stamp()))
        .col_expr(order::Column::UpdatedAt, Expr::value(now()))
        .filter(order::Column::OrderId.eq(existing.order_id))
        .filter(order::Column::ShipmentStatusId.eq(pending))
        .filter(order::Column::IsDeleted.eq(false))
        .exec(txn)
        .await?;
    if updated.rows_affected == 0 {
        warn!("Pickup for docket {docket_no} lost to a concurrent update");
        return Err(Error::bad_request(format!(
            "Order {docket_no} is not pending pickup"
        )));
    }

    let order = live_order(txn, existing.order_id).await?;
    let tracking = tracking::append(txn, &order, TrackingEvent::PickedUp, None, actor).await?;

    Ok(PickupResult {
        order_id: order.order_id,
        docket_no: order.docket_no,
        shipment_status_id: order.shipment_status_id,
        shipment_status: catalog
            .name_of(in_transit)
            .unwrap_or(ShipmentStage::InTransit.display_name())
            .to_string(),
        tracking,
    })
}

/// Sets an order's status and comment without checking the current status.
///
/// A supplied status id must name a live status.
#[instrument(skip(db, request))]
pub async fn update_shipment_status(
    db: &DatabaseConnection,
    order_id: i64,
    request: StatusUpdateRequest,
    actor: Actor,
) -> Result<StatusResult> {
    let txn = db.begin().await?;
    let result = apply_status_update(&txn, order_id, request, actor)
        .await
        .map_err(|e| e.in_transaction("updating shipment status"))?;
    commit(txn, "updating shipment status").await?;

    info!(
        "Order {order_id} status is now {}",
        result.shipment_status.as_deref().unwrap_or(lookup::UNKNOWN)
    );
    Ok(result)
}

async fn apply_status_update(
    txn: &DatabaseTransaction,
    order_id: i64,
    request: StatusUpdateRequest,
    actor: Actor,
) -> Result<StatusResult> {
    let existing = live_order(txn, order_id).await?;
    let catalog = StatusCatalog::load(txn).await?;

    let mut active: order::ActiveModel = existing.into();
    if let Some(status_id) = request.shipment_status_id {
        if !catalog.contains(status_id) {
            return Err(Error::not_found("ShipmentStatus", status_id));
        }
        active.shipment_status_id = Set(status_id);
    }
    if request.comment.is_some() {
        active.comment = Set(request.comment);
    }
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    let order = active.update(txn).await?;

    let tracking = match &request.order_tracking {
        Some(entry) => Some(
            tracking::append(txn, &order, TrackingEvent::StatusChanged, Some(entry), actor)
                .await?,
        ),
        None => None,
    };

    Ok(StatusResult {
        order_id,
        shipment_status: catalog.name_of(order.shipment_status_id).map(str::to_string),
        order,
        tracking,
    })
}

/// Stores a proof-of-delivery reference on a live order.
#[instrument(skip(db))]
pub async fn record_proof_of_delivery(
    db: &DatabaseConnection,
    order_id: i64,
    pod_reference: &str,
    actor: Actor,
) -> Result<order::Model> {
    let pod_reference = pod_reference.trim();
    if pod_reference.is_empty() {
        return Err(Error::bad_request("Proof of delivery reference cannot be empty"));
    }

    let txn = db.begin().await?;
    let existing = live_order(&txn, order_id).await?;
    let mut active: order::ActiveModel = existing.into();
    active.pod = Set(Some(pod_reference.to_string()));
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    let order = active
        .update(&txn)
        .await
        .map_err(|e| Error::from(e).in_transaction("recording proof of delivery"))?;
    tracking::append(&txn, &order, TrackingEvent::ProofOfDelivery, None, actor)
        .await
        .map_err(|e| e.in_transaction("recording proof of delivery"))?;
    commit(txn, "recording proof of delivery").await?;

    info!("Recorded proof of delivery for order {order_id}");
    Ok(order)
}

/// Soft-deletes an order. Its items go with it and a final tracking row is
/// written.
#[instrument(skip(db))]
pub async fn delete_order(
    db: &DatabaseConnection,
    order_id: i64,
    actor: Actor,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let existing = live_order(&txn, order_id).await?;

    let mut active: order::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    // The entity's after_save hook cascades to the items
    let order = active
        .update(&txn)
        .await
        .map_err(|e| Error::from(e).in_transaction("deleting order"))?;
    tracking::append(&txn, &order, TrackingEvent::Deleted, None, actor)
        .await
        .map_err(|e| e.in_transaction("deleting order"))?;
    commit(txn, "deleting order").await?;

    info!("Deleted order {order_id}");
    Ok(order)
}

/// Loads a live order with its items, addresses, history and display names.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<OrderDetails> {
    let order = live_order(db, order_id).await?;
    let catalog = StatusCatalog::load(db).await?;

    let users = lookup::user_names(db, order.created_by.into_iter().chain(order.updated_by)).await?;
    let drivers = lookup::driver_names(db, order.driver_id).await?;
    let vehicles = lookup::vehicle_names(db, order.vehicle_id).await?;

    let sender_address = match order.sender_address_book_id {
        Some(id) => AddressBook::find_by_id(id).one(db).await?,
        None => None,
    };
    let receiver_address = match order.receiver_address_book_id {
        Some(id) => AddressBook::find_by_id(id).one(db).await?,
        None => None,
    };

    Ok(OrderDetails {
        display_docket: display_docket(&order),
        shipment_status: catalog.name_of(order.shipment_status_id).map(str::to_string),
        driver_name: lookup::optional_name(&drivers, order.driver_id),
        vehicle_name: lookup::optional_name(&vehicles, order.vehicle_id),
        created_by_name: lookup::name_or_unknown(&users, order.created_by),
        updated_by_name: lookup::optional_name(&users, order.updated_by),
        sender_address,
        receiver_address,
        items: list_items_for_order(db, order_id).await?,
        tracking: tracking::history_for_order(db, order_id).await?,
        order,
    })
}

/// Lists live orders ordered by docket number.
pub async fn list_orders(db: &DatabaseConnection, filter: &OrderFilter) -> Result<Vec<OrderSummary>> {
    let catalog = StatusCatalog::load(db).await?;
    let mut query = Order::find().filter(order::Column::IsDeleted.eq(false));

    if let Some(name) = &filter.shipment_status {
        match catalog.find_by_name(name) {
            Some(status_id) => {
                query = query.filter(order::Column::ShipmentStatusId.eq(status_id));
            }
            None => return Ok(Vec::new()),
        }
    }

    if let Some(docket) = filter.docket.as_deref().map(str::trim) {
        let mut matches = Condition::any().add(order::Column::ManualDocket.eq(docket));
        if let Ok(number) = docket.parse::<i64>() {
            matches = matches.add(order::Column::DocketNo.eq(number));
        }
        query = query.filter(matches);
    }

    if let Some(pincode) = filter.pincode.as_deref().map(str::trim) {
        let address_ids: Vec<i64> = AddressBook::find()
            .filter(address_book::Column::Pincode.eq(pincode))
            .all(db)
            .await?
            .into_iter()
            .map(|a| a.address_book_id)
            .collect();
        if address_ids.is_empty() {
            return Ok(Vec::new());
        }
        query = query.filter(
            Condition::any()
                .add(order::Column::SenderAddressBookId.is_in(address_ids.iter().copied()))
                .add(order::Column::ReceiverAddressBookId.is_in(address_ids.iter().copied())),
        );
    }

    let orders = query
        .order_by_asc(order::Column::DocketNo)
        .all(db)
        .await?;

    let drivers = lookup::driver_names(db, orders.iter().filter_map(|o| o.driver_id)).await?;
    let vehicles = lookup::vehicle_names(db, orders.iter().filter_map(|o| o.vehicle_id)).await?;
    let addresses = lookup::address_names(
        db,
        orders.iter().flat_map(|o| {
            o.sender_address_book_id
                .into_iter()
                .chain(o.receiver_address_book_id)
        }),
    )
    .await?;

    Ok(orders
        .into_iter()
        .map(|order| summarize(order, &catalog, &drivers, &vehicles, &addresses))
        .collect())
}

fn summarize(
    order: order::Model,
    catalog: &StatusCatalog,
    drivers: &HashMap<i64, String>,
    vehicles: &HashMap<i64, String>,
    addresses: &HashMap<i64, String>,
) -> OrderSummary {
    OrderSummary {
        display_docket: display_docket(&order),
        shipment_status: catalog.name_of(order.shipment_status_id).map(str::to_string),
        driver_name: lookup::optional_name(drivers, order.driver_id),
        vehicle_name: lookup::optional_name(vehicles, order.vehicle_id),
        sender_name: lookup::optional_name(addresses, order.sender_address_book_id),
        receiver_name: lookup::optional_name(addresses, order.receiver_address_book_id),
        order,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            address_book::get_address,
            order_item::get_item,
            status::{StatusRequest, delete_status, list_statuses},
        },
        entities::{AddressBook, OrderTracking},
        test_utils::*,
    };
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    async fn stage_id(db: &DatabaseConnection, stage: ShipmentStage) -> Result<i64> {
        StatusCatalog::load(db).await?.require(stage)
    }

    fn assignment(order_ids: Vec<i64>, driver_id: i64, vehicle_id: i64) -> AssignmentRequest {
        AssignmentRequest {
            order_ids,
            driver_id,
            vehicle_id,
            appointment_date_time: None,
            order_tracking: Some(TrackingRequest {
                comment: Some("Assigned".to_string()),
                is_active: None,
            }),
        }
    }

    async fn pending_order(db: &DatabaseConnection) -> Result<order::Model> {
        let order = create_test_order(db).await?.order;
        let driver = create_test_driver(db, "Ravi").await?;
        let vehicle = create_test_vehicle(db, "Tata Ace").await?;
        assign_driver_vehicle(
            db,
            assignment(vec![order.order_id], driver.driver_id, vehicle.vehicle_id),
            test_actor(),
        )
        .await?;
        Ok(live_order(db, order.order_id).await?)
    }

    #[tokio::test]
    async fn test_create_order_starts_booked_with_seed_docket() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_test_order(&db).await?;

        assert_eq!(result.order.docket_no, DOCKET_SEED);
        assert_eq!(
            result.order.shipment_status_id,
            stage_id(&db, ShipmentStage::Booked).await?
        );
        assert_eq!(result.order.shipment_status_id, 1);
        assert_eq!(result.order.created_by, Some(TEST_USER_ID));
        assert_eq!(result.items.len(), 2);
        assert!(result.items.iter().all(|i| i.order_id == result.order.order_id));
        assert_eq!(result.tracking.unwrap().event, TrackingEvent::Created);
        Ok(())
    }

    #[tokio::test]
    async fn test_docket_numbers_strictly_increase() -> Result<()> {
        let db = setup_test_db().await?;
        let mut dockets = Vec::new();
        for _ in 0..4 {
            dockets.push(create_test_order(&db).await?.order.docket_no);
        }
        assert_eq!(
            dockets,
            vec![DOCKET_SEED, DOCKET_SEED + 1, DOCKET_SEED + 2, DOCKET_SEED + 3]
        );

        // Deleting the newest order does not free its docket
        let last = find_by_docket(&db, DOCKET_SEED + 3).await?.unwrap();
        delete_order(&db, last.order_id, test_actor()).await?;
        let next = create_test_order(&db).await?.order;
        assert_eq!(next.docket_no, DOCKET_SEED + 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_manual_docket_kept_only_without_auto() -> Result<()> {
        let db = setup_test_db().await?;

        let manual = create_order(
            &db,
            CreateOrderRequest {
                manual_docket: Some("M-100".to_string()),
                is_docket_auto: false,
                ..Default::default()
            },
            test_actor(),
        )
        .await?;
        assert_eq!(manual.order.manual_docket.as_deref(), Some("M-100"));
        assert_eq!(manual.order.docket_no, DOCKET_SEED);
        assert_eq!(manual.display_docket, "M-100");

        let auto = create_order(
            &db,
            CreateOrderRequest {
                manual_docket: Some("M-200".to_string()),
                is_docket_auto: true,
                ..Default::default()
            },
            test_actor(),
        )
        .await?;
        assert_eq!(auto.order.manual_docket, None);
        assert_eq!(auto.display_docket, (DOCKET_SEED + 1).to_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_manual_docket_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let request = CreateOrderRequest {
            manual_docket: Some("M-100".to_string()),
            sender_address: Some(AddressRequest {
                company_name: Some("Acme".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        create_order(&db, request.clone(), test_actor()).await?;

        let err = create_order(&db, request, test_actor()).await.unwrap_err();
        assert!(matches!(err, Error::Duplicate { entity: "Order", .. }));
        assert_eq!(Order::find().count(&db).await?, 1);
        assert_eq!(AddressBook::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_reuses_existing_sender_address() -> Result<()> {
        let db = setup_test_db().await?;
        let address = create_test_address(&db, "Acme", "560001").await?;

        let result = create_order(
            &db,
            CreateOrderRequest {
                sender_address_book_id: Some(address.address_book_id),
                sender_address: Some(AddressRequest {
                    company_name: Some("Ignored".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            test_actor(),
        )
        .await?;

        assert_eq!(
            result.order.sender_address_book_id,
            Some(address.address_book_id)
        );
        assert_eq!(result.order.receiver_address_book_id, None);
        assert_eq!(AddressBook::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_inserts_inline_addresses() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_order(
            &db,
            CreateOrderRequest {
                sender_address_book_id: Some(0),
                sender_address: Some(AddressRequest {
                    company_name: Some("Acme".to_string()),
                    ..Default::default()
                }),
                receiver_address: Some(AddressRequest {
                    contact_name: Some("Meera".to_string()),
                    pincode: Some("110001".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            test_actor(),
        )
        .await?;

        assert_eq!(AddressBook::find().count(&db).await?, 2);
        let sender = get_address(&db, result.order.sender_address_book_id.unwrap())
            .await?
            .unwrap();
        assert_eq!(sender.company_name.as_deref(), Some("Acme"));
        assert!(!sender.is_manual_generate);
        assert!(result.order.receiver_address_book_id.is_some());
        assert_ne!(
            result.order.sender_address_book_id,
            result.order.receiver_address_book_id
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_create_without_tracking_writes_no_history() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_order(&db, CreateOrderRequest::default(), test_actor()).await?;
        assert!(result.tracking.is_none());
        assert_eq!(OrderTracking::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_without_booked_status_fails() -> Result<()> {
        let db = setup_test_db().await?;
        delete_status(&db, stage_id(&db, ShipmentStage::Booked).await?, test_actor()).await?;

        let err = create_order(&db, CreateOrderRequest::default(), test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "ShipmentStatus", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_edits_and_adds_items() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_order(&db).await?;
        let first = created.items[0].clone();
        let second = created.items[1].clone();

        let result = update_order(
            &db,
            created.order.order_id,
            UpdateOrderRequest {
                fields: OrderFields {
                    payment_type: Some(PaymentType::CashOnDelivery),
                    cod_amount: Some(1500),
                    dimension_type: Some(DimensionType::Inch),
                    ..Default::default()
                },
                order_items: vec![
                    OrderItemRequest {
                        order_item_id: Some(first.order_item_id),
                        number_of_box: Some(9),
                        ..Default::default()
                    },
                    OrderItemRequest {
                        order_item_id: Some(0),
                        number_of_box: Some(1),
                        ..Default::default()
                    },
                ],
                order_tracking: Some(TrackingRequest::default()),
                ..Default::default()
            },
            test_actor(),
        )
        .await?;

        assert_eq!(result.order.payment_type, Some(PaymentType::CashOnDelivery));
        assert_eq!(result.order.cod_amount, Some(1500));
        assert_eq!(result.order.dimension_type, Some(DimensionType::Inch));
        // Untouched scalar fields survive the partial update
        assert_eq!(result.order.invoice_no, created.order.invoice_no);
        assert_eq!(result.order.updated_by, Some(TEST_USER_ID));
        assert_eq!(result.items.len(), 3);
        assert_eq!(result.tracking.unwrap().event, TrackingEvent::Updated);

        let edited = get_item(&db, first.order_item_id).await?.unwrap();
        assert_eq!(edited.number_of_box, Some(9));
        assert_eq!(edited.updated_by, Some(TEST_USER_ID));

        // Omitted items are neither deleted nor stamped
        let omitted = get_item(&db, second.order_item_id).await?.unwrap();
        assert_eq!(omitted, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_rejects_unknown_status() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db).await?.order;

        let err = update_order(
            &db,
            order.order_id,
            UpdateOrderRequest {
                shipment_status_id: Some(999),
                ..Default::default()
            },
            test_actor(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "ShipmentStatus", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_order_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let err = update_order(&db, 42, UpdateOrderRequest::default(), test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Order", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_moves_batch_to_pending_pickup() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_order(&db).await?.order;
        let second = create_test_order(&db).await?.order;
        let driver = create_test_driver(&db, "Ravi").await?;
        let vehicle = create_test_vehicle(&db, "Tata Ace").await?;
        let pending = stage_id(&db, ShipmentStage::PendingPickup).await?;
        let before = OrderTracking::find().count(&db).await?;

        let result = assign_driver_vehicle(
            &db,
            assignment(
                vec![first.order_id, second.order_id],
                driver.driver_id,
                vehicle.vehicle_id,
            ),
            test_actor(),
        )
        .await?;

        assert_eq!(result.orders.len(), 2);
        assert!(result.orders.iter().all(|o| o.shipment_status == "Pending Pickup"));
        assert_eq!(result.tracking.len(), 2);
        assert_eq!(OrderTracking::find().count(&db).await?, before + 2);

        for id in [first.order_id, second.order_id] {
            let order = live_order(&db, id).await?;
            assert_eq!(order.driver_id, Some(driver.driver_id));
            assert_eq!(order.vehicle_id, Some(vehicle.vehicle_id));
            assert_eq!(order.shipment_status_id, pending);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_with_unknown_driver_changes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db).await?.order;
        let vehicle = create_test_vehicle(&db, "Tata Ace").await?;

        let err = assign_driver_vehicle(
            &db,
            assignment(vec![order.order_id], 404, vehicle.vehicle_id),
            test_actor(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
        assert_eq!(live_order(&db, order.order_id).await?, order);
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_without_pending_status_is_bad_request() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db).await?.order;
        let driver = create_test_driver(&db, "Ravi").await?;
        let vehicle = create_test_vehicle(&db, "Tata Ace").await?;
        delete_status(
            &db,
            stage_id(&db, ShipmentStage::PendingPickup).await?,
            test_actor(),
        )
        .await?;

        let err = assign_driver_vehicle(
            &db,
            assignment(vec![order.order_id], driver.driver_id, vehicle.vehicle_id),
            test_actor(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
        assert_eq!(live_order(&db, order.order_id).await?.driver_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_with_no_live_orders_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let driver = create_test_driver(&db, "Ravi").await?;
        let vehicle = create_test_vehicle(&db, "Tata Ace").await?;

        let err = assign_driver_vehicle(
            &db,
            assignment(vec![7, 8], driver.driver_id, vehicle.vehicle_id),
            test_actor(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Order", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_pickup_moves_to_in_transit() -> Result<()> {
        let db = setup_test_db().await?;
        let order = pending_order(&db).await?;

        let result = confirm_pickup(&db, order.docket_no, test_actor()).await?;
        assert_eq!(result.order_id, order.order_id);
        assert_eq!(result.shipment_status, "In Transit");
        assert_eq!(result.tracking.event, TrackingEvent::PickedUp);
        assert_eq!(result.tracking.shipment_status_id, Some(result.shipment_status_id));

        let stored = live_order(&db, order.order_id).await?;
        assert_eq!(
            stored.shipment_status_id,
            stage_id(&db, ShipmentStage::InTransit).await?
        );
        assert_eq!(stored.updated_by, Some(TEST_USER_ID));

        // A second confirmation fails the guard
        let err = confirm_pickup(&db, order.docket_no, test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_pickup_guard_leaves_status_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db).await?.order;

        let err = confirm_pickup(&db, order.docket_no, test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
        assert_eq!(
            live_order(&db, order.order_id).await?.shipment_status_id,
            order.shipment_status_id
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_pickup_loses_to_concurrent_transition() -> Result<()> {
        let db = setup_test_db().await?;
        let order = pending_order(&db).await?;
        let statuses = list_statuses(&db).await?;

        // The guard reads "Pending Pickup", but the row moved on before the
        // conditional update ran, so it matches nothing
        let raced = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![order.clone()]])
            .append_query_results([statuses])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let err = confirm_pickup(&raced, order.docket_no, test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_pickup_matches_status_name_case_insensitively() -> Result<()> {
        let db = setup_test_db().await?;
        let order = pending_order(&db).await?;
        crate::core::status::update_status(
            &db,
            order.shipment_status_id,
            StatusRequest {
                shipment_status_name: Some("PENDING pickup".to_string()),
                ..Default::default()
            },
            test_actor(),
        )
        .await?;

        let result = confirm_pickup(&db, order.docket_no, test_actor()).await?;
        assert_eq!(result.shipment_status, "In Transit");
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_pickup_unknown_docket_or_status() -> Result<()> {
        let db = setup_test_db().await?;
        let err = confirm_pickup(&db, 1, test_actor()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Order", .. }));

        let order = pending_order(&db).await?;
        delete_status(
            &db,
            stage_id(&db, ShipmentStage::InTransit).await?,
            test_actor(),
        )
        .await?;
        let err = confirm_pickup(&db, order.docket_no, test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "ShipmentStatus", .. }));
        assert_eq!(
            live_order(&db, order.order_id).await?.shipment_status_id,
            order.shipment_status_id
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_update_shipment_status_is_unchecked() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db).await?.order;
        let delivered = stage_id(&db, ShipmentStage::Delivered).await?;

        let result = update_shipment_status(
            &db,
            order.order_id,
            StatusUpdateRequest {
                shipment_status_id: Some(delivered),
                comment: Some("Left with neighbour".to_string()),
                order_tracking: Some(TrackingRequest::default()),
            },
            test_actor(),
        )
        .await?;

        assert_eq!(result.order.shipment_status_id, delivered);
        assert_eq!(result.order.comment.as_deref(), Some("Left with neighbour"));
        assert_eq!(result.shipment_status.as_deref(), Some("Delivered"));
        let tracking = result.tracking.unwrap();
        assert_eq!(tracking.event, TrackingEvent::StatusChanged);
        assert_eq!(tracking.shipment_status_id, Some(delivered));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_shipment_status_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db).await?.order;

        let err = update_shipment_status(
            &db,
            order.order_id,
            StatusUpdateRequest {
                shipment_status_id: Some(999),
                ..Default::default()
            },
            test_actor(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "ShipmentStatus", .. }));

        delete_order(&db, order.order_id, test_actor()).await?;
        let err = update_shipment_status(
            &db,
            order.order_id,
            StatusUpdateRequest::default(),
            test_actor(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Order", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_cascades_to_items() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_order(&db).await?;
        let order_id = created.order.order_id;

        let deleted = delete_order(&db, order_id, test_actor()).await?;
        assert!(deleted.is_deleted);
        assert!(!deleted.is_active);

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(&db)
            .await?;
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.is_deleted && !i.is_active));
        assert!(items.iter().all(|i| i.updated_by == Some(TEST_USER_ID)));

        let history = tracking::history_for_order(&db, order_id).await?;
        assert_eq!(history.last().unwrap().event, TrackingEvent::Deleted);

        let err = delete_order(&db, order_id, test_actor()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Order", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_record_proof_of_delivery() -> Result<()> {
        let db = setup_test_db().await?;
        let order = create_test_order(&db).await?.order;

        let err = record_proof_of_delivery(&db, order.order_id, "  ", test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));

        let updated =
            record_proof_of_delivery(&db, order.order_id, "pod/2021/0001.jpg", test_actor())
                .await?;
        assert_eq!(updated.pod.as_deref(), Some("pod/2021/0001.jpg"));
        let history = tracking::history_for_order(&db, order.order_id).await?;
        assert_eq!(history.last().unwrap().event, TrackingEvent::ProofOfDelivery);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_order_resolves_names() -> Result<()> {
        let db = setup_test_db().await?;
        let order = pending_order(&db).await?;

        let details = get_order(&db, order.order_id).await?;
        assert_eq!(details.shipment_status.as_deref(), Some("Pending Pickup"));
        assert_eq!(details.driver_name.as_deref(), Some("Ravi"));
        assert_eq!(details.vehicle_name.as_deref(), Some("Tata Ace"));
        assert_eq!(details.created_by_name, "Test Operator");
        assert_eq!(details.updated_by_name.as_deref(), Some("Test Operator"));
        assert_eq!(details.display_docket, order.docket_no.to_string());
        assert_eq!(details.items.len(), 2);
        assert_eq!(
            details.sender_address.unwrap().company_name.as_deref(),
            Some("Acme Warehousing")
        );
        let events: Vec<_> = details.tracking.iter().map(|t| t.event).collect();
        assert_eq!(events, vec![TrackingEvent::Created, TrackingEvent::Assigned]);

        let err = get_order(&db, 999).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_orders_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let booked = create_test_order(&db).await?.order;
        let pending = pending_order(&db).await?;
        let manual = create_order(
            &db,
            CreateOrderRequest {
                manual_docket: Some("M-7".to_string()),
                receiver_address: Some(AddressRequest {
                    company_name: Some("Delhi Depot".to_string()),
                    pincode: Some("110001".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            test_actor(),
        )
        .await?
        .order;
        let gone = create_test_order(&db).await?.order;
        delete_order(&db, gone.order_id, test_actor()).await?;

        let all = list_orders(&db, &OrderFilter::default()).await?;
        let ids: Vec<_> = all.iter().map(|s| s.order.order_id).collect();
        assert_eq!(ids, vec![booked.order_id, pending.order_id, manual.order_id]);

        let by_status = list_orders(
            &db,
            &OrderFilter {
                shipment_status: Some("pending PICKUP".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].driver_name.as_deref(), Some("Ravi"));

        let by_manual = list_orders(
            &db,
            &OrderFilter {
                docket: Some("M-7".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_manual.len(), 1);
        assert_eq!(by_manual[0].display_docket, "M-7");

        let by_number = list_orders(
            &db,
            &OrderFilter {
                docket: Some(booked.docket_no.to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_number[0].order.order_id, booked.order_id);

        let by_pin = list_orders(
            &db,
            &OrderFilter {
                pincode: Some("110001".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(by_pin.len(), 1);
        assert_eq!(by_pin[0].receiver_name.as_deref(), Some("Delhi Depot"));

        let unknown = list_orders(
            &db,
            &OrderFilter {
                shipment_status: Some("Lost".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert!(unknown.is_empty());
        Ok(())
    }
}
