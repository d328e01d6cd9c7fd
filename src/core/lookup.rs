//! Foreign-key to display-name resolution.
//!
//! Names are fetched in one query per entity for a whole batch of ids. Soft-deleted
//! rows still resolve, since historical orders keep pointing at them.

use crate::{
    entities::{AddressBook, Driver, User, Vehicle, address_book, driver, user, vehicle},
    errors::Result,
};
use sea_orm::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Rendered in place of a name whose id does not resolve.
pub const UNKNOWN: &str = "Unknown";

async fn names_by_id<E, C, F>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
    id_column: E::Column,
    name_of: F,
) -> Result<HashMap<i64, String>>
where
    E: EntityTrait,
    C: ConnectionTrait,
    F: Fn(E::Model) -> (i64, String),
{
    let ids: BTreeSet<i64> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(E::find()
        .filter(id_column.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(name_of)
        .collect())
}

/// Full display name of a user ("first last").
#[must_use]
pub fn user_display_name(user: &user::Model) -> String {
    match user.last_name.as_deref().map(str::trim) {
        Some(last) if !last.is_empty() => format!("{} {last}", user.first_name),
        _ => user.first_name.clone(),
    }
}

/// Display names for users.
pub async fn user_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, String>> {
    names_by_id::<User, _, _>(db, ids, user::Column::UserId, |u| {
        (u.user_id, user_display_name(&u))
    })
    .await
}

/// Display names for drivers.
pub async fn driver_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, String>> {
    names_by_id::<Driver, _, _>(db, ids, driver::Column::DriverId, |d| (d.driver_id, d.name)).await
}

/// Display names for vehicles.
pub async fn vehicle_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, String>> {
    names_by_id::<Vehicle, _, _>(db, ids, vehicle::Column::VehicleId, |v| {
        (v.vehicle_id, v.name)
    })
    .await
}

/// Company name of each address, falling back to the contact name.
pub async fn address_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i64>,
) -> Result<HashMap<i64, String>> {
    names_by_id::<AddressBook, _, _>(db, ids, address_book::Column::AddressBookId, |a| {
        let name = a
            .company_name
            .or(a.contact_name)
            .unwrap_or_else(|| UNKNOWN.to_string());
        (a.address_book_id, name)
    })
    .await
}

/// Looks `id` up in `names`, rendering a missing id as [`UNKNOWN`].
#[must_use]
pub fn name_or_unknown(names: &HashMap<i64, String>, id: Option<i64>) -> String {
    id.and_then(|id| names.get(&id).cloned())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Looks `id` up in `names`, keeping absence distinct from an unknown id.
#[must_use]
pub fn optional_name(names: &HashMap<i64, String>, id: Option<i64>) -> Option<String> {
    id.map(|id| names.get(&id).cloned().unwrap_or_else(|| UNKNOWN.to_string()))
}
