//! Menus and the menu privileges granted to roles.

use crate::{
    core::{
        Actor, now,
        privilege::{self, LinkBatch, Reconciliation},
        require_name,
        role::require_role,
    },
    entities::{Menu, MenuPrivilege, menu, menu_privilege},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Fields of a new menu entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuRequest {
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
    /// Position under the parent
    pub child_order: Option<i32>,
    /// Nesting depth
    pub menu_level: Option<i32>,
}

/// Creates a menu entry. Menu names need not be unique.
#[instrument(skip(db, request))]
pub async fn create_menu(
    db: &DatabaseConnection,
    request: MenuRequest,
    actor: Actor,
) -> Result<menu::Model> {
    let menu_name = require_name(&request.menu_name, "Menu name")?;
    let now = now();
    let menu = menu::ActiveModel {
        menu_name: Set(menu_name),
        icon_name: Set(request.icon_name),
        url: Set(request.url),
        parent_id: Set(request.parent_id),
        menu_order: Set(request.menu_order),
        child_order: Set(request.child_order),
        menu_level: Set(request.menu_level),
        is_active: Set(true),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        created_by: Set(actor.stamp()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Created menu {} ({})", menu.menu_name, menu.menu_id);
    Ok(menu)
}

/// Finds a live menu by id.
pub async fn get_menu(db: &DatabaseConnection, menu_id: i64) -> Result<Option<menu::Model>> {
    Menu::find_by_id(menu_id)
        .filter(menu::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists live menus in display order.
pub async fn list_menus(db: &DatabaseConnection) -> Result<Vec<menu::Model>> {
    Menu::find()
        .filter(menu::Column::IsDeleted.eq(false))
        .order_by_asc(menu::Column::MenuOrder)
        .order_by_asc(menu::Column::ChildOrder)
        .order_by_asc(menu::Column::MenuId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a menu. Existing privileges stay but no longer surface in `menus_for_role`.
#[instrument(skip(db))]
pub async fn delete_menu(
    db: &DatabaseConnection,
    menu_id: i64,
    actor: Actor,
) -> Result<menu::Model> {
    let existing = get_menu(db, menu_id)
        .await?
        .ok_or_else(|| Error::not_found("Menu", menu_id))?;

    let mut active: menu::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.is_active = Set(false);
    active.updated_by = Set(actor.stamp());
    active.updated_at = Set(now());
    active.update(db).await.map_err(Into::into)
}

/// Makes `menu_ids` exactly the active menus of a live role.
pub async fn reconcile_role_menus(
    db: &DatabaseConnection,
    role_id: i64,
    menu_ids: &[i64],
    actor: Actor,
) -> Result<Reconciliation<menu_privilege::Model>> {
    require_role(db, role_id).await?;
    privilege::reconcile::<MenuPrivilege>(db, role_id, menu_ids, actor).await
}

/// Grants every menu to every role, keeping existing grants.
pub async fn create_menu_privilege_links(
    db: &DatabaseConnection,
    role_ids: &[i64],
    menu_ids: &[i64],
    actor: Actor,
) -> Result<LinkBatch<menu_privilege::Model>> {
    privilege::create_links::<MenuPrivilege>(db, role_ids, menu_ids, actor).await
}

/// Soft-deletes one menu privilege by its own id.
pub async fn delete_menu_privilege(
    db: &DatabaseConnection,
    menu_privilege_id: i64,
    actor: Actor,
) -> Result<menu_privilege::Model> {
    privilege::delete_link::<MenuPrivilege>(db, menu_privilege_id, actor).await
}

/// The live menus a role can see, in display order.
pub async fn menus_for_role(db: &DatabaseConnection, role_id: i64) -> Result<Vec<menu::Model>> {
    let ids: Vec<i64> = privilege::active_links::<MenuPrivilege, _>(db, role_id)
        .await?
        .into_iter()
        .map(|link| link.menu_id)
        .collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    Menu::find()
        .filter(menu::Column::MenuId.is_in(ids))
        .filter(menu::Column::IsDeleted.eq(false))
        .order_by_asc(menu::Column::MenuOrder)
        .order_by_asc(menu::Column::ChildOrder)
        .order_by_asc(menu::Column::MenuId)
        .all(db)
        .await
        .map_err(Into::into)
}
