//! Role management.

use crate::{
    core::{Actor, name_taken, now, require_name},
    entities::{Role, role},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Creates a role. Names are unique regardless of case.
#[instrument(skip(db))]
pub async fn create_role(
    db: &DatabaseConnection,
    role_name: &str,
    actor: Actor,
) -> Result<role::Model> {
    let role_name = require_name(role_name, "Role name")?;
    if name_taken::<Role, _>(db, role::Column::RoleName, &role_name, None).await? {
        return Err(Error::Duplicate {
            entity: "Role",
            name: role_name,
        });
    }

    let now = now();
    let role = role::ActiveModel {
        role_name: Set(role_name),
        is_active: Set(true),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.stamp()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created role {} ({})", role.role_name, role.role_id);
    Ok(role)
}

/// Finds a live role by id.
pub async fn get_role<C: ConnectionTrait>(db: &C, role_id: i64) -> Result<Option<role::Model>> {
    Role::find_by_id(role_id)
        .filter(role::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Like [`get_role`], but a missing role is `NotFound`.
pub async fn require_role<C: ConnectionTrait>(db: &C, role_id: i64) -> Result<role::Model> {
    get_role(db, role_id)
        .await?
        .ok_or_else(|| Error::not_found("Role", role_id))
}

/// Lists live roles by name.
pub async fn list_roles(db: &DatabaseConnection) -> Result<Vec<role::Model>> {
    Role::find()
        .filter(role::Column::IsDeleted.eq(false))
        .order_by_asc(role::Column::RoleName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a role. Its links stay as they are.
#[instrument(skip(db))]
pub async fn delete_role(db: &DatabaseConnection, role_id: i64) -> Result<role::Model> {
    let existing = require_role(db, role_id).await?;
    let mut active: role::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}
