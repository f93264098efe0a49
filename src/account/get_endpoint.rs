//! Defines the endpoints for listing a user's accounts and fetching a single account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, Query, State, rejection::PathRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{AccountId, get_account, list_accounts},
    auth::UserID,
};

/// The state needed to read accounts.
#[derive(Debug, Clone)]
pub struct AccountsState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Query parameters for listing accounts.
#[derive(Debug, Default, Deserialize)]
pub struct ListAccountsQuery {
    /// Set to "true" (any letter case) to include archived accounts.
    #[serde(default)]
    pub include_archived: Option<String>,
}

impl ListAccountsQuery {
    fn include_archived(&self) -> bool {
        self.include_archived
            .as_deref()
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }
}

/// Get the account ID from the URL path.
///
/// IDs that are not integers cannot match an account, so they are reported as
/// [Error::NotFound].
pub(super) fn account_id_from_path(
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<AccountId, Error> {
    path.map(|Path(account_id)| account_id).map_err(|rejection| {
        tracing::debug!("Invalid account ID in path: {rejection}");
        Error::NotFound
    })
}

/// A route handler for listing the logged in user's accounts, newest first.
pub async fn list_accounts_endpoint(
    State(state): State<AccountsState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<ListAccountsQuery>,
) -> Result<Response, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let accounts = list_accounts(user_id, query.include_archived(), &connection)?;

    Ok(Json(json!({
        "success": true,
        "accounts": accounts,
    }))
    .into_response())
}

/// A route handler for getting one of the logged in user's accounts.
///
/// Accounts owned by other users are reported as not found.
pub async fn get_account_endpoint(
    State(state): State<AccountsState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Response, Error> {
    let account_id = account_id_from_path(path)?;
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let account = get_account(account_id, user_id, &connection)?;

    Ok(Json(json!({
        "success": true,
        "account": account,
    }))
    .into_response())
}
