//! Menu privilege join entity - which roles see which menus.
//!
//! Same soft-delete/reactivate contract as `role_permission`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu privilege database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_privileges")]
pub struct Model {
    /// Unique identifier for the privilege
    #[sea_orm(primary_key)]
    pub menu_privilege_id: i64,
    /// Role holding the privilege
    pub role_id: i64,
    /// Menu the role may see
    pub menu_id: i64,
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

/// Defines relationships between `MenuPrivilege` and its two sides
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each privilege belongs to one role
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::RoleId"
    )]
    Role,
    /// Each privilege grants one menu
    #[sea_orm(
        belongs_to = "super::menu::Entity",
        from = "Column::MenuId",
        to = "super::menu::Column::MenuId"
    )]
    Menu,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::menu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Menu.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
