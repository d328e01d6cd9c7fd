//! Shipment status entity - named lookup rows for order status.
//!
//! Transition logic never matches on these names directly; see
//! `core::status::StatusCatalog`, which maps rows onto a closed set of stages.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shipment status database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shipment_status")]
pub struct Model {
    /// Unique identifier for the status
    #[sea_orm(primary_key)]
    pub shipment_status_id: i64,
    /// Display name (e.g. "Pending Pickup")
    #[sea_orm(unique)]
    pub shipment_status_name: String,
    /// Longer explanation for operators
    pub description: Option<String>,
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

/// Defines relationships between `ShipmentStatus` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One status is held by many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
