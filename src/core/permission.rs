//! Permissions and the role-permission links.

use crate::{
    core::{
        Actor, name_taken, now,
        privilege::{self, LinkBatch, Reconciliation},
        require_name,
        role::require_role,
    },
    entities::{Permission, RolePermission, permission, role_permission},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, instrument};

/// Creates a permission. Names are unique regardless of case.
#[instrument(skip(db))]
pub async fn create_permission(
    db: &DatabaseConnection,
    permission_name: &str,
    actor: Actor,
) -> Result<permission::Model> {
    let permission_name = require_name(permission_name, "Permission name")?;
    if name_taken::<Permission, _>(
        db,
        permission::Column::PermissionName,
        &permission_name,
        None,
    )
    .await?
    {
        return Err(Error::Duplicate {
            entity: "Permission",
            name: permission_name,
        });
    }

    let now = now();
    let permission = permission::ActiveModel {
        permission_name: Set(permission_name),
        is_active: Set(true),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.stamp()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Created permission {} ({})",
        permission.permission_name, permission.permission_id
    );
    Ok(permission)
}

/// Finds a live permission by id.
pub async fn get_permission(
    db: &DatabaseConnection,
    permission_id: i64,
) -> Result<Option<permission::Model>> {
    Permission::find_by_id(permission_id)
        .filter(permission::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists live permissions by name.
pub async fn list_permissions(db: &DatabaseConnection) -> Result<Vec<permission::Model>> {
    Permission::find()
        .filter(permission::Column::IsDeleted.eq(false))
        .order_by_asc(permission::Column::PermissionName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a permission. Deleting it twice is `NotFound`.
#[instrument(skip(db))]
pub async fn delete_permission(
    db: &DatabaseConnection,
    permission_id: i64,
    actor: Actor,
) -> Result<permission::Model> {
    let existing = get_permission(db, permission_id)
        .await?
        .ok_or_else(|| Error::not_found("Permission", permission_id))?;

    let mut active: permission::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}

/// Makes `permission_ids` exactly the active permissions of a live role.
pub async fn reconcile_role_permissions(
    db: &DatabaseConnection,
    role_id: i64,
    permission_ids: &[i64],
    actor: Actor,
) -> Result<Reconciliation<role_permission::Model>> {
    require_role(db, role_id).await?;
    privilege::reconcile::<RolePermission>(db, role_id, permission_ids, actor).await
}

/// Grants every permission to every role, keeping existing grants.
pub async fn create_role_permission_links(
    db: &DatabaseConnection,
    role_ids: &[i64],
    permission_ids: &[i64],
    actor: Actor,
) -> Result<LinkBatch<role_permission::Model>> {
    privilege::create_links::<RolePermission>(db, role_ids, permission_ids, actor).await
}

/// Soft-deletes one role-permission link by its own id.
pub async fn delete_role_permission(
    db: &DatabaseConnection,
    role_permission_id: i64,
    actor: Actor,
) -> Result<role_permission::Model> {
    privilege::delete_link::<RolePermission>(db, role_permission_id, actor).await
}

/// Names of the live permissions a role currently holds, sorted.
pub async fn permission_names_for_role(
    db: &DatabaseConnection,
    role_id: i64,
) -> Result<Vec<String>> {
    let ids: Vec<i64> = privilege::active_links::<RolePermission, _>(db, role_id)
        .await?
        .into_iter()
        .map(|link| link.permission_id)
        .collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(Permission::find()
        .filter(permission::Column::PermissionId.is_in(ids))
        .filter(permission::Column::IsDeleted.eq(false))
        .order_by_asc(permission::Column::PermissionName)
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.permission_name)
        .collect())
}
