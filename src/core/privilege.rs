//! Role link reconciliation.
//!
//! `role_permissions` and `menu_privileges` are both soft-deletable join tables
//! between a role and a target id. The algorithms here are written once against
//! [`RoleLink`] and run for either table. Links are never physically removed: a
//! dropped link is soft-deleted and comes back by being reactivated, so its
//! original creation stamp survives.

use crate::{
    core::{Actor, now},
    entities::{Menu, Permission, menu, menu_privilege, permission, role_permission},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::{IntoActiveModel, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument};

/// A join entity linking a role to some target id.
pub trait RoleLink: EntityTrait {
    /// Entity name used in errors and logs
    const LABEL: &'static str;

    /// The table a link points at
    type Target: EntityTrait;
    /// Target entity name used in errors
    const TARGET_LABEL: &'static str;

    /// Primary key column of the target table
    fn target_id_column() -> <Self::Target as EntityTrait>::Column;
    /// Soft delete flag of the target table
    fn target_deleted_column() -> <Self::Target as EntityTrait>::Column;

    /// Primary key column of the link
    fn id_column() -> Self::Column;
    /// Column holding the role id
    fn role_column() -> Self::Column;

    /// Target id a link points at
    fn target_of(link: &Self::Model) -> i64;
    /// Whether a link is soft-deleted
    fn is_deleted(link: &Self::Model) -> bool;

    /// A fresh, active link stamped with `actor` as creator.
    fn new_link(role_id: i64, target_id: i64, actor: Actor, now: NaiveDateTime)
    -> Self::ActiveModel;

    /// `link` with its deleted/active flags set and `actor` as updater.
    fn with_state(
        link: Self::Model,
        deleted: bool,
        actor: Actor,
        now: NaiveDateTime,
    ) -> Self::ActiveModel;
}

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation<M> {
    /// Links soft-deleted or reactivated
    pub updated: Vec<M>,
    /// Links inserted
    pub created: Vec<M>,
}

impl<M> Reconciliation<M> {
    /// True when the call found the links already in the requested state.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.updated.is_empty() && self.created.is_empty()
    }
}

/// Outcome of [`create_links`].
#[derive(Debug, Clone, Serialize)]
pub struct LinkBatch<M> {
    /// Links inserted by this call
    pub new: Vec<M>,
    /// Links that were already there, including reactivated ones
    pub existing: Vec<M>,
}

async fn links_by_target<E, C>(db: &C, role_id: i64) -> Result<BTreeMap<i64, E::Model>>
where
    E: RoleLink,
    C: ConnectionTrait,
{
    Ok(E::find()
        .filter(E::role_column().eq(role_id))
        .order_by_asc(E::id_column())
        .all(db)
        .await?
        .into_iter()
        .map(|link| (E::target_of(&link), link))
        .collect())
}

/// Fails with `NotFound` on the first id in `target_ids` that is not a live target.
async fn require_live_targets<E, C>(db: &C, target_ids: &BTreeSet<i64>) -> Result<()>
where
    E: RoleLink,
    C: ConnectionTrait,
{
    if target_ids.is_empty() {
        return Ok(());
    }
    let live: BTreeSet<i64> = E::Target::find()
        .select_only()
        .column(E::target_id_column())
        .filter(E::target_id_column().is_in(target_ids.iter().copied()))
        .filter(E::target_deleted_column().eq(false))
        .into_tuple::<i64>()
        .all(db)
        .await?
        .into_iter()
        .collect();
    match target_ids.iter().find(|id| !live.contains(id)) {
        Some(missing) => Err(Error::not_found(E::TARGET_LABEL, *missing)),
        None => Ok(()),
    }
}

/// Makes the active targets of `role_id` exactly `target_ids`.
///
/// Links to targets outside the set are soft-deleted, soft-deleted links to
/// targets in the set are reactivated, and missing targets get a new link. Links
/// already in the right state are not touched, so a repeated call is a no-op.
/// Every target must be live. All changes commit together.
#[instrument(skip(db, target_ids), fields(link = E::LABEL, targets = target_ids.len()))]
pub async fn reconcile<E>(
    db: &DatabaseConnection,
    role_id: i64,
    target_ids: &[i64],
    actor: Actor,
) -> Result<Reconciliation<E::Model>>
where
    E: RoleLink,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: Send,
{
    let operation = format!("reconciling {}", E::LABEL);
    let txn = db.begin().await?;
    let wanted: BTreeSet<i64> = target_ids.iter().copied().collect();
    let now = now();

    require_live_targets::<E, _>(&txn, &wanted)
        .await
        .map_err(|e| e.in_transaction(&operation))?;
    let existing = links_by_target::<E, _>(&txn, role_id)
        .await
        .map_err(|e| e.in_transaction(&operation))?;
    let mut outcome = Reconciliation {
        updated: Vec::new(),
        created: Vec::new(),
    };

    for (target_id, link) in &existing {
        if !wanted.contains(target_id) && !E::is_deleted(link) {
            let removed = E::with_state(link.clone(), true, actor, now)
                .update(&txn)
                .await
                .map_err(|e| Error::from(e).in_transaction(&operation))?;
            outcome.updated.push(removed);
        }
    }

    for target_id in &wanted {
        match existing.get(target_id) {
            Some(link) if E::is_deleted(link) => {
                let restored = E::with_state(link.clone(), false, actor, now)
                    .update(&txn)
                    .await
                    .map_err(|e| Error::from(e).in_transaction(&operation))?;
                outcome.updated.push(restored);
            }
            Some(_) => {}
            None => {
                let created = E::new_link(role_id, *target_id, actor, now)
                    .insert(&txn)
                    .await
                    .map_err(|e| Error::from(e).in_transaction(&operation))?;
                outcome.created.push(created);
            }
        }
    }

    txn.commit()
        .await
        .map_err(|e| Error::from(e).in_transaction(&operation))?;
    info!(
        "Reconciled {} for role {role_id}: {} updated, {} created",
        E::LABEL,
        outcome.updated.len(),
        outcome.created.len()
    );
    Ok(outcome)
}

/// Links every role in `role_ids` to every target in `target_ids`.
///
/// Additive only: existing links are reported as existing (reactivated first if
/// soft-deleted) and nothing is removed. Every target must be live.
#[instrument(skip(db, role_ids, target_ids), fields(link = E::LABEL))]
pub async fn create_links<E>(
    db: &DatabaseConnection,
    role_ids: &[i64],
    target_ids: &[i64],
    actor: Actor,
) -> Result<LinkBatch<E::Model>>
where
    E: RoleLink,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: Send,
{
    let operation = format!("creating {} links", E::LABEL);
    let txn = db.begin().await?;
    let roles: BTreeSet<i64> = role_ids.iter().copied().collect();
    let targets: BTreeSet<i64> = target_ids.iter().copied().collect();
    let now = now();
    require_live_targets::<E, _>(&txn, &targets)
        .await
        .map_err(|e| e.in_transaction(&operation))?;
    let mut batch = LinkBatch {
        new: Vec::new(),
        existing: Vec::new(),
    };

    for role_id in roles {
        let existing = links_by_target::<E, _>(&txn, role_id)
            .await
            .map_err(|e| e.in_transaction(&operation))?;
        for target_id in &targets {
            match existing.get(target_id) {
                Some(link) if E::is_deleted(link) => {
                    let restored = E::with_state(link.clone(), false, actor, now)
                        .update(&txn)
                        .await
                        .map_err(|e| Error::from(e).in_transaction(&operation))?;
                    batch.existing.push(restored);
                }
                Some(link) => batch.existing.push(link.clone()),
                None => {
                    let created = E::new_link(role_id, *target_id, actor, now)
                        .insert(&txn)
                        .await
                        .map_err(|e| Error::from(e).in_transaction(&operation))?;
                    batch.new.push(created);
                }
            }
        }
    }

    txn.commit()
        .await
        .map_err(|e| Error::from(e).in_transaction(&operation))?;
    info!(
        "Linked {}: {} new, {} existing",
        E::LABEL,
        batch.new.len(),
        batch.existing.len()
    );
    Ok(batch)
}

/// Soft-deletes one link by its own id.
#[instrument(skip(db), fields(link = E::LABEL))]
pub async fn delete_link<E>(
    db: &DatabaseConnection,
    link_id: i64,
    actor: Actor,
) -> Result<E::Model>
where
    E: RoleLink,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: Send,
{
    let link = E::find()
        .filter(E::id_column().eq(link_id))
        .one(db)
        .await?
        .filter(|link| !E::is_deleted(link))
        .ok_or_else(|| Error::not_found(E::LABEL, link_id))?;

    E::with_state(link, true, actor, now())
        .update(db)
        .await
        .map_err(Into::into)
}

/// Active links of a role, ordered by target id.
pub async fn active_links<E, C>(db: &C, role_id: i64) -> Result<Vec<E::Model>>
where
    E: RoleLink,
    C: ConnectionTrait,
{
    Ok(links_by_target::<E, _>(db, role_id)
        .await?
        .into_values()
        .filter(|link| !E::is_deleted(link))
        .collect())
}

impl RoleLink for role_permission::Entity {
    const LABEL: &'static str = "RolePermission";

    type Target = Permission;
    const TARGET_LABEL: &'static str = "Permission";

    fn target_id_column() -> permission::Column {
        permission::Column::PermissionId
    }

    fn target_deleted_column() -> permission::Column {
        permission::Column::IsDeleted
    }

    fn id_column() -> role_permission::Column {
        role_permission::Column::RolePermissionId
    }

    fn role_column() -> role_permission::Column {
        role_permission::Column::RoleId
    }

    fn target_of(link: &role_permission::Model) -> i64 {
        link.permission_id
    }

    fn is_deleted(link: &role_permission::Model) -> bool {
        link.is_deleted
    }

    fn new_link(
        role_id: i64,
        target_id: i64,
        actor: Actor,
        now: NaiveDateTime,
    ) -> role_permission::ActiveModel {
        role_permission::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(target_id),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(actor.stamp()),
            ..Default::default()
        }
    }

    fn with_state(
        link: role_permission::Model,
        deleted: bool,
        actor: Actor,
        now: NaiveDateTime,
    ) -> role_permission::ActiveModel {
        let mut active: role_permission::ActiveModel = link.into();
        active.is_deleted = Set(deleted);
        active.is_active = Set(!deleted);
        active.updated_by = Set(actor.stamp());
        active.updated_at = Set(now);
        active
    }
}

impl RoleLink for menu_privilege::Entity {
    const LABEL: &'static str = "MenuPrivilege";

    type Target = Menu;
    const TARGET_LABEL: &'static str = "Menu";

    fn target_id_column() -> menu::Column {
        menu::Column::MenuId
    }

    fn target_deleted_column() -> menu::Column {
        menu::Column::IsDeleted
    }

    fn id_column() -> menu_privilege::Column {
        menu_privilege::Column::MenuPrivilegeId
    }

    fn role_column() -> menu_privilege::Column {
        menu_privilege::Column::RoleId
    }

    fn target_of(link: &menu_privilege::Model) -> i64 {
        link.menu_id
    }

    fn is_deleted(link: &menu_privilege::Model) -> bool {
        link.is_deleted
    }

    fn new_link(
        role_id: i64,
        target_id: i64,
        actor: Actor,
        now: NaiveDateTime,
    ) -> menu_privilege::ActiveModel {
        menu_privilege::ActiveModel {
            role_id: Set(role_id),
            menu_id: Set(target_id),
            is_active: Set(true),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(actor.stamp()),
            ..Default::default()
        }
    }

    fn with_state(
        link: menu_privilege::Model,
        deleted: bool,
        actor: Actor,
        now: NaiveDateTime,
    ) -> menu_privilege::ActiveModel {
        let mut active: menu_privilege::ActiveModel = link.into();
        active.is_deleted = Set(deleted);
        active.is_active = Set(!deleted);
        active.updated_by = Set(actor.stamp());
        active.updated_at = Set(now);
        active
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        entities::{MenuPrivilege, RolePermission},
        test_utils::*,
    };

    async fn role_with_permissions(
        db: &DatabaseConnection,
        count: usize,
    ) -> Result<(i64, Vec<i64>)> {
        let role = create_test_role(db, "Dispatcher").await?;
        let mut ids = Vec::new();
        for n in 0..count {
            ids.push(create_test_permission(db, &format!("perm.{n}")).await?.permission_id);
        }
        Ok((role.role_id, ids))
    }

    fn active_targets(links: &[role_permission::Model]) -> BTreeSet<i64> {
        links
            .iter()
            .filter(|l| !l.is_deleted)
            .map(|l| l.permission_id)
            .collect()
    }

    #[tokio::test]
    async fn test_reconcile_creates_then_converges() -> Result<()> {
        let db = setup_test_db().await?;
        let (role_id, perms) = role_with_permissions(&db, 3).await?;

        let first = reconcile::<RolePermission>(&db, role_id, &perms, test_actor()).await?;
        assert_eq!(first.created.len(), 3);
        assert!(first.updated.is_empty());
        assert!(first.created.iter().all(|l| l.created_by == Some(TEST_USER_ID)));

        let second = reconcile::<RolePermission>(&db, role_id, &perms, test_actor()).await?;
        assert!(second.is_noop());
        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_soft_deletes_and_never_duplicates() -> Result<()> {
        let db = setup_test_db().await?;
        let (role_id, p) = role_with_permissions(&db, 4).await?;

        reconcile::<RolePermission>(&db, role_id, &[p[0], p[1], p[2]], test_actor()).await?;
        let outcome =
            reconcile::<RolePermission>(&db, role_id, &[p[1], p[2], p[3]], test_actor()).await?;

        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(outcome.updated[0].permission_id, p[0]);
        assert!(outcome.updated[0].is_deleted);
        assert!(!outcome.updated[0].is_active);
        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.created[0].permission_id, p[3]);

        let rows = RolePermission::find()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 4);
        assert_eq!(active_targets(&rows), BTreeSet::from([p[1], p[2], p[3]]));
        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_reactivates_keeping_original_row() -> Result<()> {
        let db = setup_test_db().await?;
        let (role_id, p) = role_with_permissions(&db, 2).await?;

        let first = reconcile::<RolePermission>(&db, role_id, &[p[0], p[1]], test_actor()).await?;
        let original = first.created[0].clone();
        reconcile::<RolePermission>(&db, role_id, &[p[1]], test_actor()).await?;

        let back = reconcile::<RolePermission>(&db, role_id, &[p[0], p[1]], test_actor()).await?;
        assert!(back.created.is_empty());
        assert_eq!(back.updated.len(), 1);
        let restored = &back.updated[0];
        assert_eq!(restored.role_permission_id, original.role_permission_id);
        assert_eq!(restored.created_at, original.created_at);
        assert!(restored.is_active && !restored.is_deleted);
        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_to_empty_set_clears_role() -> Result<()> {
        let db = setup_test_db().await?;
        let (role_id, perms) = role_with_permissions(&db, 2).await?;
        reconcile::<RolePermission>(&db, role_id, &perms, test_actor()).await?;

        let cleared = reconcile::<RolePermission>(&db, role_id, &[], test_actor()).await?;
        assert_eq!(cleared.updated.len(), 2);
        assert!(active_links::<RolePermission, _>(&db, role_id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_rolls_back_on_failure() -> Result<()> {
        let db = setup_test_db().await?;
        let (role_id, perms) = role_with_permissions(&db, 2).await?;
        reconcile::<RolePermission>(&db, role_id, &perms[..1], test_actor()).await?;

        // The old link is soft-deleted first, then the insert of the new one aborts
        db.execute_unprepared(&format!(
            "CREATE TRIGGER reject_link BEFORE INSERT ON role_permissions \
             WHEN NEW.permission_id = {} BEGIN SELECT RAISE(ABORT, 'rejected'); END",
            perms[1]
        ))
        .await?;
        let err = reconcile::<RolePermission>(&db, role_id, &perms[1..], test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transaction { .. }));

        let active = active_links::<RolePermission, _>(&db, role_id).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].permission_id, perms[0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_reconcile_rejects_missing_or_deleted_targets() -> Result<()> {
        let db = setup_test_db().await?;
        let (role_id, perms) = role_with_permissions(&db, 2).await?;
        reconcile::<RolePermission>(&db, role_id, &perms[..1], test_actor()).await?;
        crate::core::permission::delete_permission(&db, perms[1], test_actor()).await?;

        let err = reconcile::<RolePermission>(&db, role_id, &perms, test_actor())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound { entity: "Permission", ref id } if *id == perms[1].to_string()
        ));

        let err = reconcile::<RolePermission>(&db, role_id, &[9_999], test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Permission", .. }));

        let active = active_links::<RolePermission, _>(&db, role_id).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].permission_id, perms[0]);
        assert_eq!(RolePermission::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_links_rejects_deleted_menu() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_role(&db, "Admin").await?.role_id;
        let orders = create_test_menu(&db, "Orders", 1).await?.menu_id;
        let retired = create_test_menu(&db, "Reports", 2).await?.menu_id;
        crate::core::menu::delete_menu(&db, retired, test_actor()).await?;

        let err = create_links::<MenuPrivilege>(&db, &[admin], &[orders, retired], test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "Menu", .. }));
        assert_eq!(MenuPrivilege::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_links_is_additive() -> Result<()> {
        let db = setup_test_db().await?;
        let admin = create_test_role(&db, "Admin").await?.role_id;
        let clerk = create_test_role(&db, "Clerk").await?.role_id;
        let orders = create_test_menu(&db, "Orders", 1).await?.menu_id;
        let drivers = create_test_menu(&db, "Drivers", 2).await?.menu_id;

        reconcile::<MenuPrivilege>(&db, admin, &[orders], test_actor()).await?;
        reconcile::<MenuPrivilege>(&db, admin, &[], test_actor()).await?;

        let batch = create_links::<MenuPrivilege>(
            &db,
            &[admin, clerk],
            &[orders, drivers],
            test_actor(),
        )
        .await?;
        assert_eq!(batch.new.len(), 3);
        assert_eq!(batch.existing.len(), 1);
        assert_eq!(batch.existing[0].role_id, admin);
        assert!(!batch.existing[0].is_deleted);

        let again =
            create_links::<MenuPrivilege>(&db, &[admin], &[orders], test_actor()).await?;
        assert!(again.new.is_empty());
        assert_eq!(again.existing.len(), 1);
        assert_eq!(MenuPrivilege::find().count(&db).await?, 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_link_twice_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let (role_id, perms) = role_with_permissions(&db, 1).await?;
        let link = reconcile::<RolePermission>(&db, role_id, &perms, test_actor())
            .await?
            .created
            .remove(0);

        let deleted =
            delete_link::<RolePermission>(&db, link.role_permission_id, test_actor()).await?;
        assert!(deleted.is_deleted);
        assert_eq!(deleted.updated_by, Some(TEST_USER_ID));

        let err = delete_link::<RolePermission>(&db, link.role_permission_id, test_actor())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "RolePermission", .. }));
        Ok(())
    }
}
