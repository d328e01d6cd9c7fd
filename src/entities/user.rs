//! User entity - the accounts that act on the system.
//!
//! Only the fields needed for audit stamping and display names live here;
//! credentials are handled by the identity provider.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub user_id: i64,
    /// Given name
    pub first_name: String,
    /// Family name, if known
    pub last_name: Option<String>,
    /// Login email, unique
    #[sea_orm(unique)]
    pub email: String,
    /// Whether the row is currently in use
    pub is_active: bool,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the account was created
    pub created_at: DateTime,
}

/// `User` has no relationships modelled here
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
