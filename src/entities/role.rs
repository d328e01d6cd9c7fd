//! Role entity - named groups of permissions and menus.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    /// Unique identifier for the role
    #[sea_orm(primary_key)]
    pub role_id: i64,
    /// Unique role name (e.g. "Dispatcher")
    #[sea_orm(unique)]
    pub role_name: String,
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
}

/// Defines relationships between Role and the join tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One role has many permission links
    #[sea_orm(has_many = "super::role_permission::Entity")]
    RolePermissions,
    /// One role has many menu privileges
    #[sea_orm(has_many = "super::menu_privilege::Entity")]
    MenuPrivileges,
}

impl Related<super::role_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermissions.def()
    }
}

impl Related<super::menu_privilege::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuPrivileges.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
