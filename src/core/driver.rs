//! Driver management.

use crate::{
    core::{Actor, name_taken, now, require_name},
    entities::{Driver, driver},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Driver fields. On update only present fields apply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DriverRequest {
    /// Login account of the driver, if any
    pub user_id: Option<i64>,
    /// Driver name, unique ignoring case
    pub name: Option<String>,
    /// Driving licence number, unique ignoring case
    pub license_no: Option<String>,
    /// New value for the active flag
    pub is_active: Option<bool>,
}

async fn ensure_unique(
    db: &DatabaseConnection,
    name: Option<&str>,
    license_no: Option<&str>,
    except: Option<i64>,
) -> Result<()> {
    let except = except.map(|id| (driver::Column::DriverId, id));
    if let Some(name) = name
        && name_taken::<Driver, _>(db, driver::Column::Name, name, except).await?
    {
        return Err(Error::Duplicate {
            entity: "Driver",
            name: name.to_string(),
        });
    }
    if let Some(license_no) = license_no
        && name_taken::<Driver, _>(db, driver::Column::LicenseNo, license_no, except).await?
    {
        return Err(Error::Duplicate {
            entity: "Driver",
            name: license_no.to_string(),
        });
    }
    Ok(())
}

/// Registers a driver. Name and licence number must both be unused.
#[instrument(skip(db, request))]
pub async fn create_driver(
    db: &DatabaseConnection,
    request: DriverRequest,
    actor: Actor,
) -> Result<driver::Model> {
    let name = require_name(request.name.as_deref().unwrap_or_default(), "Driver name")?;
    let license_no = require_name(
        request.license_no.as_deref().unwrap_or_default(),
        "License number",
    )?;
    ensure_unique(db, Some(&name), Some(&license_no), None).await?;

    let now = now();
    let driver = driver::ActiveModel {
        user_id: Set(request.user_id),
        name: Set(name),
        license_no: Set(license_no),
        is_active: Set(request.is_active.unwrap_or(true)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.stamp()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created driver {} ({})", driver.name, driver.driver_id);
    Ok(driver)
}

/// Finds a live driver by id.
pub async fn get_driver(db: &DatabaseConnection, driver_id: i64) -> Result<Option<driver::Model>> {
    Driver::find_by_id(driver_id)
        .filter(driver::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists live drivers by name, optionally only active ones.
pub async fn list_drivers(
    db: &DatabaseConnection,
    active_only: bool,
) -> Result<Vec<driver::Model>> {
    let mut query = Driver::find().filter(driver::Column::IsDeleted.eq(false));
    if active_only {
        query = query.filter(driver::Column::IsActive.eq(true));
    }
    query
        .order_by_asc(driver::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies the present fields of `request` to a live driver, re-checking uniqueness on rename.
#[instrument(skip(db, request))]
pub async fn update_driver(
    db: &DatabaseConnection,
    driver_id: i64,
    request: DriverRequest,
    actor: Actor,
) -> Result<driver::Model> {
    let existing = get_driver(db, driver_id)
        .await?
        .ok_or_else(|| Error::not_found("Driver", driver_id))?;

    let name = request
        .name
        .as_deref()
        .map(|n| require_name(n, "Driver name"))
        .transpose()?;
    let license_no = request
        .license_no
        .as_deref()
        .map(|l| require_name(l, "License number"))
        .transpose()?;
    ensure_unique(db, name.as_deref(), license_no.as_deref(), Some(driver_id)).await?;

    let mut active: driver::ActiveModel = existing.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(license_no) = license_no {
        active.license_no = Set(license_no);
    }
    if request.user_id.is_some() {
        active.user_id = Set(request.user_id);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes a driver. Deleting it twice is `NotFound`.
#[instrument(skip(db))]
pub async fn delete_driver(
    db: &DatabaseConnection,
    driver_id: i64,
    actor: Actor,
) -> Result<driver::Model> {
    let existing = get_driver(db, driver_id)
        .await?
        .ok_or_else(|| Error::not_found("Driver", driver_id))?;

    let mut active: driver::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}
