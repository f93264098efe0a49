//! Defines the endpoint for updating an account
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Extension, Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{
        AccountId, account_exists,
        form::{UpdateAccountForm, validate_account_update},
        get_endpoint::account_id_from_path,
        update_account,
    },
    auth::UserID,
    reference_data::ReferenceData,
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bank and currency lists that edits are checked against.
    pub reference_data: ReferenceData,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            reference_data: state.reference_data.clone(),
        }
    }
}

fn lock(db_connection: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// A route handler for changing the name, type, currency or bank of an account.
///
/// Ownership is checked before the request body is validated, so editing an
/// account of another user always fails with "Account not found".
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<AccountId>, PathRejection>,
    payload: Result<Json<UpdateAccountForm>, JsonRejection>,
) -> Result<Response, Error> {
    let account_id = account_id_from_path(path)?;

    if !account_exists(account_id, user_id, &*lock(&state.db_connection)?)? {
        return Err(Error::UpdateMissingAccount);
    }

    let Json(form) = payload.map_err(|rejection| Error::InvalidJson(rejection.body_text()))?;
    let update = validate_account_update(&form, &state.reference_data)?;

    match update_account(account_id, user_id, &update, &*lock(&state.db_connection)?) {
        Ok(0) => Err(Error::UpdateMissingAccount),
        Ok(_) => {
            tracing::info!("User {user_id} updated account {account_id}");
            Ok(Json(json!({ "success": true, "message": "Account updated" })).into_response())
        }
        Err(error) => {
            tracing::error!("Could not update account {account_id}: {error}");
            Err(error)
        }
    }
}
