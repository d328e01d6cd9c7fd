//! Lookup seed data loading from config.toml
//!
//! `config.toml` lists the shipment statuses, permissions, menus and roles a fresh
//! database needs. Seeding matches existing rows by case-insensitive name and only
//! inserts the missing ones, so it runs on every startup.
//!
//! Shipment statuses are inserted in file order. The first one becomes the initial
//! status of new orders, so it should be "Booked".

use crate::{
    entities::{Menu, Permission, Role, ShipmentStatus, menu, permission, role, shipment_status},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// Shipment status names, initial status first
    #[serde(default)]
    pub shipment_statuses: Vec<StatusSeed>,
    /// Permission names
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Role names
    #[serde(default)]
    pub roles: Vec<String>,
    /// Menu entries
    #[serde(default)]
    pub menus: Vec<MenuSeed>,
}

/// A single shipment status to seed
#[derive(Debug, Deserialize, Clone)]
pub struct StatusSeed {
    /// Status name as shown to operators
    pub name: String,
    /// Optional longer explanation
    #[serde(default)]
    pub description: Option<String>,
}

/// A single menu entry to seed
#[derive(Debug, Deserialize, Clone)]
pub struct MenuSeed {
    /// Menu label
    pub name: String,
    /// Route the menu opens
    #[serde(default)]
    pub url: Option<String>,
    /// Icon name
    #[serde(default)]
    pub icon: Option<String>,
    /// Top-level position
    #[serde(default)]
    pub order: Option<i32>,
}

/// How many rows of each kind a seeding pass inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Statuses inserted
    pub shipment_statuses: usize,
    /// Permissions inserted
    pub permissions: usize,
    /// Roles inserted
    pub roles: usize,
    /// Menus inserted
    pub menus: usize,
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads seed configuration from `SHIPDESK_CONFIG`, or ./config.toml
pub fn load_default_config() -> Result<SeedConfig> {
    let path = std::env::var("SHIPDESK_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

/// The statuses the order lifecycle depends on, in seeding order.
#[must_use]
pub fn default_shipment_statuses() -> Vec<StatusSeed> {
    crate::core::status::ShipmentStage::ALL
        .iter()
        .map(|stage| StatusSeed {
            name: stage.display_name().to_string(),
            description: None,
        })
        .collect()
}

/// Inserts every configured lookup row that does not exist yet.
pub async fn seed_lookups(db: &DatabaseConnection, config: &SeedConfig) -> Result<SeedSummary> {
    let txn = db.begin().await?;
    let now = chrono::Utc::now().naive_utc();
    let mut summary = SeedSummary::default();

    let existing: Vec<String> = ShipmentStatus::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|s| s.shipment_status_name.to_lowercase())
        .collect();
    for seed in &config.shipment_statuses {
        if existing.contains(&seed.name.to_lowercase()) {
            continue;
        }
        shipment_status::ActiveModel {
            shipment_status_name: Set(seed.name.clone()),
            description: Set(seed.description.clone()),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        summary.shipment_statuses += 1;
    }

    let existing: Vec<String> = Permission::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.permission_name.to_lowercase())
        .collect();
    for name in &config.permissions {
        if existing.contains(&name.to_lowercase()) {
            continue;
        }
        permission::ActiveModel {
            permission_name: Set(name.clone()),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        summary.permissions += 1;
    }

    let existing: Vec<String> = Role::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|r| r.role_name.to_lowercase())
        .collect();
    for name in &config.roles {
        if existing.contains(&name.to_lowercase()) {
            continue;
        }
        role::ActiveModel {
            role_name: Set(name.clone()),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        summary.roles += 1;
    }

    for seed in &config.menus {
        let found = Menu::find()
            .filter(menu::Column::MenuName.eq(seed.name.as_str()))
            .one(&txn)
            .await?;
        if found.is_some() {
            continue;
        }
        menu::ActiveModel {
            menu_name: Set(seed.name.clone()),
            url: Set(seed.url.clone()),
            icon_name: Set(seed.icon.clone()),
            menu_order: Set(seed.order),
            menu_level: Set(Some(1)),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        summary.menus += 1;
    }

    txn.commit().await?;
    info!(
        "Seeded {} statuses, {} permissions, {} roles, {} menus",
        summary.shipment_statuses, summary.permissions, summary.roles, summary.menus
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const SAMPLE: &str = r#"
        permissions = ["order.create", "order.assign"]
        roles = ["Admin", "Dispatcher"]

        [[shipment_statuses]]
        name = "Booked"
        description = "Order received"

        [[shipment_statuses]]
        name = "Pending Pickup"

        [[menus]]
        name = "Orders"
        url = "/orders"
        order = 1
    "#;

    #[test]
    fn test_parse_seed_config() {
        let config: SeedConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.shipment_statuses.len(), 2);
        assert_eq!(config.shipment_statuses[0].name, "Booked");
        assert_eq!(
            config.shipment_statuses[0].description.as_deref(),
            Some("Order received")
        );
        assert!(config.shipment_statuses[1].description.is_none());
        assert_eq!(config.permissions, vec!["order.create", "order.assign"]);
        assert_eq!(config.menus[0].order, Some(1));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config: SeedConfig = toml::from_str("roles = [\"Admin\"]").unwrap();
        assert!(config.shipment_statuses.is_empty());
        assert!(config.menus.is_empty());
    }

    #[test]
    fn test_default_statuses_start_with_booked() {
        let statuses = default_shipment_statuses();
        assert_eq!(statuses[0].name, "Booked");
        assert!(statuses.iter().any(|s| s.name == "Pending Pickup"));
        assert!(statuses.iter().any(|s| s.name == "In Transit"));
    }

    #[test]
    fn test_shipped_config_covers_every_stage() {
        use crate::core::status::ShipmentStage;

        let config: SeedConfig = toml::from_str(include_str!("../../config.toml")).unwrap();
        assert_eq!(config.shipment_statuses[0].name, "Booked");
        for stage in ShipmentStage::ALL {
            assert!(
                config
                    .shipment_statuses
                    .iter()
                    .any(|s| ShipmentStage::from_name(&s.name) == Some(stage)),
                "missing {stage:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_seed_lookups_is_idempotent() -> Result<()> {
        let db = sea_orm::Database::connect("sqlite::memory:").await?;
        crate::config::database::create_tables(&db).await?;
        let config: SeedConfig = toml::from_str(SAMPLE).unwrap();

        let first = seed_lookups(&db, &config).await?;
        assert_eq!(
            first,
            SeedSummary {
                shipment_statuses: 2,
                permissions: 2,
                roles: 2,
                menus: 1
            }
        );

        let second = seed_lookups(&db, &config).await?;
        assert_eq!(second, SeedSummary::default());

        let booked = ShipmentStatus::find_by_id(1).one(&db).await?.unwrap();
        assert_eq!(booked.shipment_status_name, "Booked");
        Ok(())
    }
}
