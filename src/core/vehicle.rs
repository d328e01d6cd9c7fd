//! Vehicle management.

use crate::{
    core::{Actor, name_taken, now, require_name},
    entities::{Vehicle, VehicleType, vehicle},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Vehicle fields. On update only present fields apply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleRequest {
    /// Vehicle name, unique ignoring case
    pub name: Option<String>,
    /// Registration number
    pub vehicle_number: Option<String>,
    /// Required when creating
    pub vehicle_type: Option<VehicleType>,
    /// Last day the insurance is valid
    pub insurance_validity: Option<NaiveDate>,
    /// Last day the registration certificate is valid
    pub rc_validity: Option<NaiveDate>,
    /// New value for the active flag
    pub is_active: Option<bool>,
}

async fn ensure_unique(
    db: &DatabaseConnection,
    name: Option<&str>,
    vehicle_number: Option<&str>,
    except: Option<i64>,
) -> Result<()> {
    let except = except.map(|id| (vehicle::Column::VehicleId, id));
    for (column, value) in [
        (vehicle::Column::Name, name),
        (vehicle::Column::VehicleNumber, vehicle_number),
    ] {
        if let Some(value) = value
            && name_taken::<Vehicle, _>(db, column, value, except).await?
        {
            return Err(Error::Duplicate {
                entity: "Vehicle",
                name: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Registers a vehicle. Name and registration number must both be unused.
#[instrument(skip(db, request))]
pub async fn create_vehicle(
    db: &DatabaseConnection,
    request: VehicleRequest,
    actor: Actor,
) -> Result<vehicle::Model> {
    let name = require_name(request.name.as_deref().unwrap_or_default(), "Vehicle name")?;
    let vehicle_number = require_name(
        request.vehicle_number.as_deref().unwrap_or_default(),
        "Vehicle number",
    )?;
    let vehicle_type = request
        .vehicle_type
        .ok_or_else(|| Error::bad_request("Vehicle type is required"))?;
    ensure_unique(db, Some(&name), Some(&vehicle_number), None).await?;

    let now = now();
    let vehicle = vehicle::ActiveModel {
        name: Set(name),
        vehicle_number: Set(vehicle_number),
        vehicle_type: Set(vehicle_type),
        insurance_validity: Set(request.insurance_validity),
        rc_validity: Set(request.rc_validity),
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
        "Created vehicle {} ({}) with number {}",
        vehicle.name, vehicle.vehicle_id, vehicle.vehicle_number
    );
    Ok(vehicle)
}

/// Finds a live vehicle by id.
pub async fn get_vehicle(
    db: &DatabaseConnection,
    vehicle_id: i64,
) -> Result<Option<vehicle::Model>> {
    Vehicle::find_by_id(vehicle_id)
        .filter(vehicle::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists live vehicles by name, optionally of one type.
pub async fn list_vehicles(
    db: &DatabaseConnection,
    vehicle_type: Option<VehicleType>,
) -> Result<Vec<vehicle::Model>> {
    let mut query = Vehicle::find().filter(vehicle::Column::IsDeleted.eq(false));
    if let Some(vehicle_type) = vehicle_type {
        query = query.filter(vehicle::Column::VehicleType.eq(vehicle_type));
    }
    query
        .order_by_asc(vehicle::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies the present fields of `request` to a live vehicle, re-checking uniqueness on rename.
#[instrument(skip(db, request))]
pub async fn update_vehicle(
    db: &DatabaseConnection,
    vehicle_id: i64,
    request: VehicleRequest,
    actor: Actor,
) -> Result<vehicle::Model> {
    let existing = get_vehicle(db, vehicle_id)
        .await?
        .ok_or_else(|| Error::not_found("Vehicle", vehicle_id))?;

    let name = request
        .name
        .as_deref()
        .map(|n| require_name(n, "Vehicle name"))
        .transpose()?;
    let vehicle_number = request
        .vehicle_number
        .as_deref()
        .map(|n| require_name(n, "Vehicle number"))
        .transpose()?;
    ensure_unique(db, name.as_deref(), vehicle_number.as_deref(), Some(vehicle_id)).await?;

    let mut active: vehicle::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(vehicle_number) = vehicle_number {
        active.vehicle_number = Set(vehicle_number);
    }
    if let Some(vehicle_type) = request.vehicle_type {
        active.vehicle_type = Set(vehicle_type);
    }
    if request.insurance_validity.is_some() {
        active.insurance_validity = Set(request.insurance_validity);
    }
    if request.rc_validity.is_some() {
        active.rc_validity = Set(request.rc_validity);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes a vehicle. Deleting it twice is `NotFound`.
#[instrument(skip(db))]
pub async fn delete_vehicle(
    db: &DatabaseConnection,
    vehicle_id: i64,
    actor: Actor,
) -> Result<vehicle::Model> {
    let existing = get_vehicle(db, vehicle_id)
        .await?
        .ok_or_else(|| Error::not_found("Vehicle", vehicle_id))?;

    let mut active: vehicle::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}
