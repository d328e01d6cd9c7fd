//! Core business logic - framework-agnostic order lifecycle, privilege
//! reconciliation and lookup management.
//!
//! Every operation takes a database connection and, when it writes, the [`Actor`]
//! to stamp into the audit columns. Multi-step writes run in one transaction.

/// Address book CRUD and the reuse-or-create rule used by orders
pub mod address_book;
/// Driver CRUD
pub mod driver;
/// Foreign-key to display-name resolution
pub mod lookup;
/// Menu CRUD and role menu privileges
pub mod menu;
/// Order lifecycle manager
pub mod order;
/// Order item operations
pub mod order_item;
/// Permission CRUD and role permissions
pub mod permission;
/// Generic role link reconciliation engine
pub mod privilege;
/// Role CRUD
pub mod role;
/// Shipment status catalog and CRUD
pub mod status;
/// Append-only order tracking history
pub mod tracking;
/// Minimal user records for audit names
pub mod user;
/// Vehicle CRUD
pub mod vehicle;

use crate::errors::Result;
use chrono::NaiveDateTime;
use sea_orm::{
    prelude::*,
    sea_query::{Expr, Func},
};

/// The authenticated user on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    /// Id of the acting user, written to `created_by` / `updated_by`
    pub user_id: i64,
}

impl Actor {
    /// Creates an actor for the given user id.
    #[must_use]
    pub const fn new(user_id: i64) -> Self {
        Self { user_id }
    }

    /// The id as stored in nullable audit columns.
    #[must_use]
    pub const fn stamp(self) -> Option<i64> {
        Some(self.user_id)
    }
}

/// Timestamp used for audit columns.
pub(crate) fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Rejects blank names, returning the trimmed value.
pub(crate) fn require_name(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::errors::Error::bad_request(format!(
            "{field} cannot be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// The row whose `column` holds `name`, ignoring case. Soft-deleted rows are
/// included, since the unique index covers them too. `except` skips the row
/// being renamed.
pub(crate) async fn find_named<E, C>(
    db: &C,
    column: E::Column,
    name: &str,
    except: Option<(E::Column, i64)>,
) -> Result<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let mut query =
        E::find().filter(Expr::expr(Func::lower(Expr::col(column))).eq(name.to_lowercase()));
    if let Some((id_column, id)) = except {
        query = query.filter(id_column.ne(id));
    }
    Ok(query.one(db).await?)
}

/// Whether `column` already holds `name`, ignoring case. See [`find_named`].
pub(crate) async fn name_taken<E, C>(
    db: &C,
    column: E::Column,
    name: &str,
    except: Option<(E::Column, i64)>,
) -> Result<bool>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    Ok(find_named::<E, C>(db, column, name, except).await?.is_some())
}
