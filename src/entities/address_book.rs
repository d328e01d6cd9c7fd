//! Address book entity - reusable sender/receiver contacts.
//!
//! Rows are either created directly (`is_manual_generate = true`) or implicitly
//! while booking an order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Address book database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "address_book")]
pub struct Model {
    /// Unique identifier for the address
    #[sea_orm(primary_key)]
    pub address_book_id: i64,
    /// Company or business name
    pub company_name: Option<String>,
    /// Person to ask for at this address
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
    /// Postal code, used for order search
    pub pincode: Option<String>,
    /// True when created through the address book itself rather than an order
    pub is_manual_generate: bool,
    /// Whether the row is currently in use
    pub is_active: bool,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the row was created
    pub created_at: DateTime,
    /// When the row was last changed
    pub updated_at: DateTime,
    /// User who created the row
    pub created_by: Option<i64>,
    /// User who last changed the row
    pub updated_by: Option<i64>,
}

/// Address book rows are referenced by orders but own nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
