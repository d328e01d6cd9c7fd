//! Order item entity - one line of boxes within an order.
//!
//! Items belong to exactly one order and are soft-deletable on their own.
//! Deleting the parent order soft-deletes every item.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub order_item_id: i64,
    /// Parent order
    pub order_id: i64,
    /// Number of boxes in this line
    pub number_of_box: Option<i32>,
    /// Box height in the order's dimension unit
    pub parcel_height: Option<i32>,
    /// Box width
    pub parcel_width: Option<i32>,
    /// Box breadth
    pub parcel_breadth: Option<i32>,
    /// Volume of this line
    pub volume: Option<f64>,
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

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one order
    /// Each item belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::OrderId"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
