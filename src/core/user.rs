//! Minimal user records.
//!
//! Users exist here so audit columns and driver links resolve to names.
//! Credentials live with the identity provider.

use crate::{
    core::{name_taken, now, require_name},
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use tracing::instrument;

/// Fields of a new user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: Option<String>,
    /// Login email, unique ignoring case
    pub email: String,
}

/// Adds a user. Emails are unique regardless of case.
#[instrument(skip(db, request), fields(email = %request.email))]
pub async fn create_user(db: &DatabaseConnection, request: NewUser) -> Result<user::Model> {
    let first_name = require_name(&request.first_name, "First name")?;
    let email = require_name(&request.email, "Email")?;
    if name_taken::<User, _>(db, user::Column::Email, &email, None).await? {
        return Err(Error::Duplicate {
            entity: "User",
            name: email,
        });
    }

    user::ActiveModel {
        first_name: Set(first_name),
        last_name: Set(request.last_name),
        email: Set(email),
        is_active: Set(true),
        is_deleted: Set(false),
        created_at: Set(now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a live user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id)
        .filter(user::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}
