//! Shared test utilities for shipdesk.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::seed::{SeedConfig, default_shipment_statuses, seed_lookups},
    core::{
        Actor,
        address_book::{self, AddressRequest},
        driver::{self, DriverRequest},
        menu::{self, MenuRequest},
        order::{self, CreateOrderRequest, OrderFields, OrderResult},
        order_item::OrderItemRequest,
        permission, role,
        tracking::TrackingRequest,
        user::{self, NewUser},
        vehicle::{self, VehicleRequest},
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Id of the user every test acts as. [`setup_test_db`] creates it first.
pub const TEST_USER_ID: i64 = 1;

/// The actor used by tests.
#[must_use]
pub const fn test_actor() -> Actor {
    Actor::new(TEST_USER_ID)
}

/// Creates an in-memory `SQLite` database with all tables initialized,
/// the default shipment statuses seeded ("Booked" gets id 1) and the
/// test operator user in place.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    seed_lookups(
        &db,
        &SeedConfig {
            shipment_statuses: default_shipment_statuses(),
            ..Default::default()
        },
    )
    .await?;
    create_test_user(&db, "Test", Some("Operator"), "operator@example.com").await?;
    Ok(db)
}

/// Creates a user.
pub async fn create_test_user(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: Option<&str>,
    email: &str,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        NewUser {
            first_name: first_name.to_string(),
            last_name: last_name.map(str::to_string),
            email: email.to_string(),
        },
    )
    .await
}

/// Creates a driver with a licence number derived from the name.
pub async fn create_test_driver(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::driver::Model> {
    driver::create_driver(
        db,
        DriverRequest {
            name: Some(name.to_string()),
            license_no: Some(format!("DL-{}", name.to_uppercase())),
            ..Default::default()
        },
        test_actor(),
    )
    .await
}

/// Creates a van with a registration number derived from the name.
pub async fn create_test_vehicle(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::vehicle::Model> {
    vehicle::create_vehicle(
        db,
        VehicleRequest {
            name: Some(name.to_string()),
            vehicle_number: Some(format!("REG-{}", name.to_uppercase())),
            vehicle_type: Some(entities::VehicleType::Van),
            ..Default::default()
        },
        test_actor(),
    )
    .await
}

/// Creates a manual address book entry.
pub async fn create_test_address(
    db: &DatabaseConnection,
    company_name: &str,
    pincode: &str,
) -> Result<entities::address_book::Model> {
    address_book::create_address(
        db,
        AddressRequest {
            company_name: Some(company_name.to_string()),
            pincode: Some(pincode.to_string()),
            ..Default::default()
        },
        test_actor(),
    )
    .await
}

pub async fn create_test_role(db: &DatabaseConnection, name: &str) -> Result<entities::role::Model> {
    role::create_role(db, name, test_actor()).await
}

pub async fn create_test_permission(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::permission::Model> {
    permission::create_permission(db, name, test_actor()).await
}

/// Creates a top-level menu at position `order`.
pub async fn create_test_menu(
    db: &DatabaseConnection,
    name: &str,
    order: i32,
) -> Result<entities::menu::Model> {
    menu::create_menu(
        db,
        MenuRequest {
            menu_name: name.to_string(),
            url: Some(format!("/{}", name.to_lowercase())),
            menu_order: Some(order),
            menu_level: Some(1),
            ..Default::default()
        },
        test_actor(),
    )
    .await
}

/// A booking request with inline sender and receiver addresses, two items and a
/// tracking entry.
///
/// # Defaults
/// * sender: "Acme Warehousing", pincode 560001
/// * receiver: "Coastal Traders", pincode 400001
/// * invoice: "INV-1", client payment, dimensions in cm
#[must_use]
pub fn test_order_request() -> CreateOrderRequest {
    CreateOrderRequest {
        fields: OrderFields {
            payment_type: Some(entities::PaymentType::ClientPayment),
            invoice_no: Some("INV-1".to_string()),
            dimension_type: Some(entities::DimensionType::Cm),
            total_no_of_box: Some(3),
            ..Default::default()
        },
        is_docket_auto: true,
        sender_address: Some(AddressRequest {
            company_name: Some("Acme Warehousing".to_string()),
            pincode: Some("560001".to_string()),
            ..Default::default()
        }),
        receiver_address: Some(AddressRequest {
            company_name: Some("Coastal Traders".to_string()),
            pincode: Some("400001".to_string()),
            ..Default::default()
        }),
        order_items: vec![
            OrderItemRequest {
                number_of_box: Some(1),
                parcel_height: Some(30),
                parcel_width: Some(20),
                parcel_breadth: Some(10),
                ..Default::default()
            },
            OrderItemRequest {
                number_of_box: Some(2),
                volume: Some(0.5),
                ..Default::default()
            },
        ],
        order_tracking: Some(TrackingRequest {
            comment: Some("Booked at counter".to_string()),
            is_active: None,
        }),
        ..Default::default()
    }
}

/// Books [`test_order_request`] as the test operator.
pub async fn create_test_order(db: &DatabaseConnection) -> Result<OrderResult> {
    order::create_order(db, test_order_request(), test_actor()).await
}
