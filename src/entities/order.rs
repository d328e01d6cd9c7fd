//! Order entity - a shipment booking and its lifecycle state.
//!
//! An order carries a system-assigned `docket_no`, an optional operator-supplied
//! `manual_docket`, references to sender/receiver address-book rows, the current
//! shipment status, and the driver/vehicle once assigned. Orders are never
//! physically removed; `is_deleted` marks them gone.
//!
//! Saving an order with `is_deleted = true` soft-deletes all of its items in the
//! same unit of work (see the `after_save` hook below).

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use serde::{Deserialize, Serialize};

/// How the shipment is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Client is invoiced
    #[sea_orm(string_value = "CLIENT_PAYMENT")]
    ClientPayment,
    /// Receiver pays on delivery
    #[sea_orm(string_value = "CASH_ON_DELIVERY")]
    CashOnDelivery,
}

/// Unit used for parcel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DimensionType {
    /// Centimetres
    #[sea_orm(string_value = "CM")]
    Cm,
    /// Inches
    #[sea_orm(string_value = "INCH")]
    Inch,
    /// Feet
    #[sea_orm(string_value = "FEET")]
    Feet,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub order_id: i64,
    /// System-assigned tracking number, strictly increasing
    #[sea_orm(unique)]
    pub docket_no: i64,
    /// Operator-supplied docket, kept only for non-auto-docket orders
    #[sea_orm(unique)]
    pub manual_docket: Option<String>,
    /// Whether the order was booked with an automatic docket
    pub is_docket_auto: bool,
    /// Current shipment status (FK into `shipment_status`)
    pub shipment_status_id: i64,
    /// Assigned driver, if any
    pub driver_id: Option<i64>,
    /// Assigned vehicle, if any
    pub vehicle_id: Option<i64>,
    /// Pickup appointment set during assignment
    pub appointment_date_time: Option<DateTime>,
    /// Sender address-book row
    pub sender_address_book_id: Option<i64>,
    /// Receiver address-book row
    pub receiver_address_book_id: Option<i64>,
    /// Who pays for the shipment
    pub payment_type: Option<PaymentType>,
    /// Amount to collect on delivery
    pub cod_amount: Option<i64>,
    /// Service type lookup id
    pub service_type_id: Option<i64>,
    /// Payment mode lookup id
    pub payment_mode_id: Option<i64>,
    /// Customer lookup id
    pub customer_id: Option<i64>,
    /// Parcel type lookup id
    pub parcel_type_id: Option<i64>,
    /// GST registration of the consignor
    pub gst_number: Option<String>,
    /// Declared value of the goods
    pub shipment_value: Option<i64>,
    /// Consignor invoice number
    pub invoice_no: Option<String>,
    /// E-way bill number
    pub e_way_bill: Option<String>,
    /// Forwarding charge
    pub forwarding: Option<i64>,
    /// Free-text instructions taken at booking
    pub booking_instruction: Option<String>,
    /// Combined size of all boxes
    pub total_box_size: Option<i32>,
    /// Number of boxes in the shipment
    pub total_no_of_box: Option<i32>,
    /// Unit of the box dimensions
    pub dimension_type: Option<DimensionType>,
    /// Combined volume of all items
    pub total_volume: Option<f64>,
    /// Total weight
    pub parcel_weight: Option<i32>,
    /// Handle with care
    pub is_fragile: bool,
    /// Free-text comment, usually set with a status update
    pub comment: Option<String>,
    /// Proof-of-delivery reference
    pub pod: Option<String>,
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

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One order has many items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    /// One order has many tracking rows
    #[sea_orm(has_many = "super::order_tracking::Entity")]
    OrderTrackings,
    /// Each order is in exactly one shipment status
    /// Each order holds one shipment status
    #[sea_orm(
        belongs_to = "super::shipment_status::Entity",
        from = "Column::ShipmentStatusId",
        to = "super::shipment_status::Column::ShipmentStatusId"
    )]
    ShipmentStatus,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::order_tracking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderTrackings.def()
    }
}

impl Related<super::shipment_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShipmentStatus.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Cascades an order's soft delete to its items.
    async fn after_save<C: ConnectionTrait>(
        model: Model,
        db: &C,
        insert: bool,
    ) -> Result<Model, DbErr> {
        if !insert && model.is_deleted {
            super::order_item::Entity::update_many()
                .col_expr(super::order_item::Column::IsDeleted, Expr::value(true))
                .col_expr(super::order_item::Column::IsActive, Expr::value(false))
                .col_expr(super::order_item::Column::UpdatedBy, Expr::value(model.updated_by))
                .col_expr(super::order_item::Column::UpdatedAt, Expr::value(model.updated_at))
                .filter(super::order_item::Column::OrderId.eq(model.order_id))
                .filter(super::order_item::Column::IsDeleted.eq(false))
                .exec(db)
                .await?;
        }
        Ok(model)
    }
}
