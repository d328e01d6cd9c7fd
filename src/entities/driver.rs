//! Driver entity - people who can be assigned to pick up orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Driver database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    /// Unique identifier for the driver
    #[sea_orm(primary_key)]
    pub driver_id: i64,
    /// Login account of the driver, if they have one
    pub user_id: Option<i64>,
    /// Display name, unique across drivers
    #[sea_orm(unique)]
    pub name: String,
    /// Driving licence number, unique across drivers
    #[sea_orm(unique)]
    pub license_no: String,
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

/// Drivers are referenced by orders but own nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
