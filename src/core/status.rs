//! Shipment status catalog and CRUD.
//!
//! Status rows are a soft-deletable lookup table keyed by display name. The order
//! lifecycle does not compare names: [`StatusCatalog::load`] maps the live rows onto
//! the closed [`ShipmentStage`] set once per unit of work, and transition guards
//! match on the stage.

use crate::{
    core::{Actor, find_named, name_taken, now, require_name},
    entities::{Order, ShipmentStatus, order, shipment_status},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// The stages the order lifecycle knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShipmentStage {
    /// Initial status of every new order
    Booked,
    /// Driver and vehicle assigned, waiting for pickup
    PendingPickup,
    /// Picked up and moving
    InTransit,
    /// With the delivery driver on the last leg
    OutForDelivery,
    /// Handed to the receiver
    Delivered,
    /// Called off before delivery
    Cancelled,
    /// Sent back to the sender
    Returned,
}

impl ShipmentStage {
    /// Every stage, in seeding order. `Booked` comes first so it gets id 1.
    pub const ALL: [Self; 7] = [
        Self::Booked,
        Self::PendingPickup,
        Self::InTransit,
        Self::OutForDelivery,
        Self::Delivered,
        Self::Cancelled,
        Self::Returned,
    ];

    /// Canonical display name stored in `shipment_status_name`.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Booked => "Booked",
            Self::PendingPickup => "Pending Pickup",
            Self::InTransit => "In Transit",
            Self::OutForDelivery => "Out For Delivery",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Returned => "Returned",
        }
    }

    /// Matches a status name to a stage, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.display_name().eq_ignore_ascii_case(name))
    }
}

/// Stage-to-id mapping resolved from the live `shipment_status` rows.
#[derive(Debug, Clone, Default)]
pub struct StatusCatalog {
    ids: HashMap<ShipmentStage, i64>,
    stages: HashMap<i64, ShipmentStage>,
    names: HashMap<i64, String>,
}

impl StatusCatalog {
    /// Reads all non-deleted statuses. Rows whose names match no stage are kept
    /// for name lookups only.
    pub async fn load<C: ConnectionTrait>(db: &C) -> Result<Self> {
        let rows = ShipmentStatus::find()
            .filter(shipment_status::Column::IsDeleted.eq(false))
            .order_by_asc(shipment_status::Column::ShipmentStatusId)
            .all(db)
            .await?;
        Ok(Self::from_rows(rows))
    }

    fn from_rows(rows: Vec<shipment_status::Model>) -> Self {
        let mut catalog = Self::default();
        for row in rows {
            if let Some(stage) = ShipmentStage::from_name(&row.shipment_status_name) {
                // Lowest id wins if two rows spell the same stage
                catalog.ids.entry(stage).or_insert(row.shipment_status_id);
                catalog.stages.insert(row.shipment_status_id, stage);
            }
            catalog
                .names
                .insert(row.shipment_status_id, row.shipment_status_name);
        }
        catalog
    }

    /// Id of the row for `stage`, if one exists.
    #[must_use]
    pub fn id_of(&self, stage: ShipmentStage) -> Option<i64> {
        self.ids.get(&stage).copied()
    }

    /// Id of the row for `stage`, or `NotFound`.
    pub fn require(&self, stage: ShipmentStage) -> Result<i64> {
        self.id_of(stage)
            .ok_or_else(|| Error::not_found("ShipmentStatus", stage.display_name()))
    }

    /// Stage a status id stands for, if it is one of the known stages.
    #[must_use]
    pub fn stage_of(&self, status_id: i64) -> Option<ShipmentStage> {
        self.stages.get(&status_id).copied()
    }

    /// Display name of a live status id.
    #[must_use]
    pub fn name_of(&self, status_id: i64) -> Option<&str> {
        self.names.get(&status_id).map(String::as_str)
    }

    /// Whether `status_id` is a live status row.
    #[must_use]
    pub fn contains(&self, status_id: i64) -> bool {
        self.names.contains_key(&status_id)
    }

    /// Finds a live status id by name, ignoring case.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<i64> {
        let name = name.trim();
        self.names
            .iter()
            .filter(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
            .min()
    }
}

/// Fields accepted when creating or updating a status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusRequest {
    /// Display name, unique ignoring case
    pub shipment_status_name: Option<String>,
    /// Longer explanation for operators
    pub description: Option<String>,
    /// New value for the active flag
    pub is_active: Option<bool>,
}

/// Retrieves all non-deleted statuses ordered by id.
pub async fn list_statuses(db: &DatabaseConnection) -> Result<Vec<shipment_status::Model>> {
    ShipmentStatus::find()
        .filter(shipment_status::Column::IsDeleted.eq(false))
        .order_by_asc(shipment_status::Column::ShipmentStatusId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a non-deleted status by id.
pub async fn get_status(
    db: &DatabaseConnection,
    status_id: i64,
) -> Result<Option<shipment_status::Model>> {
    ShipmentStatus::find_by_id(status_id)
        .filter(shipment_status::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn ensure_name_free(
    db: &DatabaseConnection,
    name: &str,
    except: Option<i64>,
) -> Result<()> {
    let taken = name_taken::<ShipmentStatus, _>(
        db,
        shipment_status::Column::ShipmentStatusName,
        name,
        except.map(|id| (shipment_status::Column::ShipmentStatusId, id)),
    )
    .await?;
    if taken {
        return Err(Error::Duplicate {
            entity: "ShipmentStatus",
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Creates a new status. Names must be unique regardless of case.
///
/// A soft-deleted status with the same name is brought back instead, keeping its
/// id so historical tracking rows still point at it.
#[instrument(skip(db, request))]
pub async fn create_status(
    db: &DatabaseConnection,
    request: StatusRequest,
    actor: Actor,
) -> Result<shipment_status::Model> {
    let name = require_name(
        request.shipment_status_name.as_deref().unwrap_or_default(),
        "Shipment status name",
    )?;
    let existing = find_named::<ShipmentStatus, _>(
        db,
        shipment_status::Column::ShipmentStatusName,
        &name,
        None,
    )
    .await?;

    let now = now();
    match existing {
        Some(row) if !row.is_deleted => Err(Error::Duplicate {
            entity: "ShipmentStatus",
            name,
        }),
        Some(row) => {
            let mut active: shipment_status::ActiveModel = row.into();
            active.shipment_status_name = Set(name);
            active.description = Set(request.description);
            active.is_active = Set(request.is_active.unwrap_or(true));
            active.is_deleted = Set(false);
            active.updated_by = Set(actor.stamp());
            active.updated_at = Set(now);
            let status = active.update(db).await?;

            info!(
                "Restored shipment status {} ({})",
                status.shipment_status_name, status.shipment_status_id
            );
            Ok(status)
        }
        None => {
            let status = shipment_status::ActiveModel {
                shipment_status_name: Set(name),
                description: Set(request.description),
                is_active: Set(request.is_active.unwrap_or(true)),
                is_deleted: Set(false),
                created_at: Set(now),
                updated_at: Set(now),
                created_by: Set(actor.stamp()),
                ..Default::default()
            }
            .insert(db)
            .await?;

            info!(
                "Created shipment status {} ({})",
                status.shipment_status_name, status.shipment_status_id
            );
            Ok(status)
        }
    }
}

/// Applies the present fields of `request` to a live status.
#[instrument(skip(db, request))]
pub async fn update_status(
    db: &DatabaseConnection,
    status_id: i64,
    request: StatusRequest,
    actor: Actor,
) -> Result<shipment_status::Model> {
    let existing = get_status(db, status_id)
        .await?
        .ok_or_else(|| Error::not_found("ShipmentStatus", status_id))?;

    let mut active: shipment_status::ActiveModel = existing.into();
    if let Some(name) = request.shipment_status_name.as_deref() {
        let name = require_name(name, "Shipment status name")?;
        ensure_name_free(db, &name, Some(status_id)).await?;
        active.shipment_status_name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());

    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes a status. Deleting an already-deleted status is `NotFound`, and a
/// status still held by a live order is `BadRequest`.
#[instrument(skip(db))]
pub async fn delete_status(
    db: &DatabaseConnection,
    status_id: i64,
    actor: Actor,
) -> Result<shipment_status::Model> {
    let existing = get_status(db, status_id)
        .await?
        .ok_or_else(|| Error::not_found("ShipmentStatus", status_id))?;

    let in_use = Order::find()
        .filter(order::Column::ShipmentStatusId.eq(status_id))
        .filter(order::Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    if in_use > 0 {
        warn!("Refusing to delete shipment status {status_id}, {in_use} live orders hold it");
        return Err(Error::bad_request(format!(
            "Shipment status {} is held by {in_use} live orders",
            existing.shipment_status_name
        )));
    }

    let mut active: shipment_status::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}
