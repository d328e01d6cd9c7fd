//! Address book management.
//!
//! Rows are created either by hand (`is_manual_generate = true`) or implicitly
//! while booking an order, when the caller sends an inline address instead of an
//! existing id.

use crate::{
    core::{Actor, now},
    entities::{AddressBook, address_book},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Address fields. Every field is optional; on update only present fields apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRequest {
    /// Company or business name
    pub company_name: Option<String>,
    /// Person to ask for
    pub contact_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone number
    pub phone_number: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// Country lookup id
    pub country_id: Option<i64>,
    /// State lookup id
    pub state_id: Option<i64>,
    /// City lookup id
    pub city_id: Option<i64>,
    /// Postal code, used by order search
    pub pincode: Option<String>,
    /// New value for the active flag
    pub is_active: Option<bool>,
}

/// Narrows [`list_addresses`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressFilter {
    /// Only rows with this active flag
    pub is_active: Option<bool>,
    /// Only rows with this postal code
    pub pincode: Option<String>,
}

fn new_address(
    request: &AddressRequest,
    manual: bool,
    actor: Actor,
) -> address_book::ActiveModel {
    let now = now();
    address_book::ActiveModel {
        company_name: Set(request.company_name.clone()),
        contact_name: Set(request.contact_name.clone()),
        email: Set(request.email.clone()),
        phone_number: Set(request.phone_number.clone()),
        address: Set(request.address.clone()),
        country_id: Set(request.country_id),
        state_id: Set(request.state_id),
        city_id: Set(request.city_id),
        pincode: Set(request.pincode.clone()),
        is_manual_generate: Set(manual),
        is_active: Set(request.is_active.unwrap_or(true)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.stamp()),
        ..Default::default()
    }
}

/// Adds an address book entry by hand.
#[instrument(skip(db, request))]
pub async fn create_address(
    db: &DatabaseConnection,
    request: AddressRequest,
    actor: Actor,
) -> Result<address_book::Model> {
    new_address(&request, true, actor)
        .insert(db)
        .await
        .map_err(Into::into)
}

/// Finds a live address by id.
pub async fn get_address<C: ConnectionTrait>(
    db: &C,
    address_id: i64,
) -> Result<Option<address_book::Model>> {
    AddressBook::find_by_id(address_id)
        .filter(address_book::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists live, manually created addresses ordered by id. Rows created while
/// booking orders stay out of the address book listing.
pub async fn list_addresses(
    db: &DatabaseConnection,
    filter: &AddressFilter,
) -> Result<Vec<address_book::Model>> {
    let mut query = AddressBook::find()
        .filter(address_book::Column::IsDeleted.eq(false))
        .filter(address_book::Column::IsManualGenerate.eq(true));
    if let Some(is_active) = filter.is_active {
        query = query.filter(address_book::Column::IsActive.eq(is_active));
    }
    if let Some(pincode) = &filter.pincode {
        query = query.filter(address_book::Column::Pincode.eq(pincode.trim()));
    }
    query
        .order_by_asc(address_book::Column::AddressBookId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies the present fields of `request` to a live address.
#[instrument(skip(db, request))]
pub async fn update_address(
    db: &DatabaseConnection,
    address_id: i64,
    request: AddressRequest,
    actor: Actor,
) -> Result<address_book::Model> {
    let existing = get_address(db, address_id)
        .await?
        .ok_or_else(|| Error::not_found("AddressBook", address_id))?;

    let mut active: address_book::ActiveModel = existing.into();
    if request.company_name.is_some() {
        active.company_name = Set(request.company_name);
    }
    if request.contact_name.is_some() {
        active.contact_name = Set(request.contact_name);
    }
    if request.email.is_some() {
        active.email = Set(request.email);
    }
    if request.phone_number.is_some() {
        active.phone_number = Set(request.phone_number);
    }
    if request.address.is_some() {
        active.address = Set(request.address);
    }
    if request.country_id.is_some() {
        active.country_id = Set(request.country_id);
    }
    if request.state_id.is_some() {
        active.state_id = Set(request.state_id);
    }
    if request.city_id.is_some() {
        active.city_id = Set(request.city_id);
    }
    if request.pincode.is_some() {
        active.pincode = Set(request.pincode);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());

    active.update(db).await.map_err(Into::into)
}

/// Soft-deletes an address. Orders keep pointing at it.
#[instrument(skip(db))]
pub async fn delete_address(
    db: &DatabaseConnection,
    address_id: i64,
    actor: Actor,
) -> Result<address_book::Model> {
    let existing = get_address(db, address_id)
        .await?
        .ok_or_else(|| Error::not_found("AddressBook", address_id))?;

    let mut active: address_book::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}

/// Resolves an order's sender or receiver reference.
///
/// A positive `existing_id` that names a live row is reused as is. Otherwise an
/// inline address, when given, becomes a new non-manual row. With neither, the
/// reference stays absent.
pub async fn resolve_reference<C: ConnectionTrait>(
    db: &C,
    existing_id: Option<i64>,
    inline: Option<&AddressRequest>,
    actor: Actor,
) -> Result<Option<i64>> {
    if let Some(id) = existing_id.filter(|id| *id > 0) {
        if let Some(found) = get_address(db, id).await? {
            return Ok(Some(found.address_book_id));
        }
        debug!("Address {id} not found, falling back to inline address");
    }

    match inline {
        Some(request) => {
            let created = new_address(request, false, actor).insert(db).await?;
            Ok(Some(created.address_book_id))
        }
        None => Ok(None),
    }
}
