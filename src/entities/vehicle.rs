//! Vehicle entity - fleet vehicles assigned to pickups.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleType {
    /// Passenger car
    #[sea_orm(string_value = "CAR")]
    Car,
    /// Two-wheeler
    #[sea_orm(string_value = "BIKE")]
    Bike,
    /// Goods truck
    #[sea_orm(string_value = "TRUCK")]
    Truck,
    /// Bus
    #[sea_orm(string_value = "BUS")]
    Bus,
    /// Delivery van
    #[sea_orm(string_value = "VAN")]
    Van,
}

/// Vehicle database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    /// Unique identifier for the vehicle
    #[sea_orm(primary_key)]
    pub vehicle_id: i64,
    /// Fleet name, unique
    #[sea_orm(unique)]
    pub name: String,
    /// Registration plate, unique
    #[sea_orm(unique)]
    pub vehicle_number: String,
    /// Kind of vehicle
    pub vehicle_type: VehicleType,
    /// Insurance expiry
    pub insurance_validity: Option<Date>,
    /// Registration certificate expiry
    pub rc_validity: Option<Date>,
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

/// Vehicles are referenced by orders but own nothing
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
