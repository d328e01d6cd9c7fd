//! Database configuration module for shipdesk.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust structs.
//! The join tables additionally get composite unique indexes: a role can hold at
//! most one link row per permission and per menu.

use crate::entities::{
    AddressBook, Driver, Menu, MenuPrivilege, Order, OrderItem, OrderTracking, Permission, Role,
    RolePermission, ShipmentStatus, User, Vehicle, menu_privilege, role_permission,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Default location of the `SQLite` database when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/shipdesk.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables (if missing) and the join-table unique indexes.
///
/// Safe to run on every startup.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    // Lookup tables first, then the tables that reference them
    create_table(db, &schema, User).await?;
    create_table(db, &schema, ShipmentStatus).await?;
    create_table(db, &schema, AddressBook).await?;
    create_table(db, &schema, Driver).await?;
    create_table(db, &schema, Vehicle).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, OrderItem).await?;
    create_table(db, &schema, OrderTracking).await?;
    create_table(db, &schema, Role).await?;
    create_table(db, &schema, Permission).await?;
    create_table(db, &schema, Menu).await?;
    create_table(db, &schema, RolePermission).await?;
    create_table(db, &schema, MenuPrivilege).await?;

    for index in join_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database tables ensured");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement))
        .await?;
    Ok(())
}

fn join_indexes() -> [IndexCreateStatement; 2] {
    [
        Index::create()
            .name("idx_role_permissions_role_permission")
            .table(RolePermission)
            .col(role_permission::Column::RoleId)
            .col(role_permission::Column::PermissionId)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_menu_privileges_role_menu")
            .table(MenuPrivilege)
            .col(menu_privilege::Column::RoleId)
            .col(menu_privilege::Column::MenuId)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}
