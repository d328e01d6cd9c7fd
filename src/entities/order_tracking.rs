//! Order tracking entity - append-only lifecycle history.
//!
//! A row is inserted for each significant event on an order (creation, assignment,
//! pickup, status change, deletion). Rows are never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What happened to the order when the row was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum TrackingEvent {
    /// Order booked
    #[sea_orm(string_value = "created")]
    Created,
    /// Order fields or items edited
    #[sea_orm(string_value = "updated")]
    Updated,
    /// Driver and vehicle assigned
    #[sea_orm(string_value = "assigned")]
    Assigned,
    /// Pickup confirmed, now in transit
    #[sea_orm(string_value = "picked_up")]
    PickedUp,
    /// Status set directly
    #[sea_orm(string_value = "status_changed")]
    StatusChanged,
    /// Proof of delivery recorded
    #[sea_orm(string_value = "proof_of_delivery")]
    ProofOfDelivery,
    /// Order soft-deleted
    #[sea_orm(string_value = "deleted")]
    Deleted,
}

/// Order tracking database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_tracking")]
pub struct Model {
    /// Unique identifier for the tracking row
    #[sea_orm(primary_key)]
    pub order_tracking_id: i64,
    /// Order the event belongs to
    pub order_id: i64,
    /// Lifecycle event recorded by this row
    pub event: TrackingEvent,
    /// Order status at the time of the event
    pub shipment_status_id: Option<i64>,
    /// Optional operator note
    pub comment: Option<String>,
    /// Whether the entry is shown in the history
    pub is_active: bool,
    /// When the event happened
    pub created_at: DateTime,
    /// User who caused the event
    pub created_by: Option<i64>,
}

/// Defines relationships between `OrderTracking` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each tracking row belongs to one order
    /// Each entry belongs to one order
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
