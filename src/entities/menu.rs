//! Menu entity - navigation entries shown to roles that hold a privilege for them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menus")]
pub struct Model {
    /// Unique identifier for the menu entry
    #[sea_orm(primary_key)]
    pub menu_id: i64,
    /// Label shown in the navigation
    pub menu_name: String,
    /// Icon shown next to the label
    pub icon_name: Option<String>,
    /// Route the entry opens
    pub url: Option<String>,
    /// Parent entry for nested menus
    pub parent_id: Option<i64>,
    /// Position among top-level entries
    pub menu_order: Option<i32>,
    /// Position under the parent entry
    pub child_order: Option<i32>,
    /// Nesting depth, 0 for top level
    pub menu_level: Option<i32>,
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

/// Defines relationships between Menu and the privilege join table
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One menu is granted to many roles
    #[sea_orm(has_many = "super::menu_privilege::Entity")]
    MenuPrivileges,
}

impl Related<super::menu_privilege::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuPrivileges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
