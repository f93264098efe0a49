//! Defines the endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{
        create_account,
        form::{CreateAccountForm, validate_new_account},
    },
    auth::UserID,
    reference_data::ReferenceData,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bank and currency lists that new accounts are checked against.
    pub reference_data: ReferenceData,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            reference_data: state.reference_data.clone(),
        }
    }
}

/// A route handler for creating a new account owned by the logged in user.
///
/// Responds with the ID of the new account.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Extension(user_id): Extension<UserID>,
    payload: Result<Json<CreateAccountForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = payload.map_err(|rejection| Error::InvalidJson(rejection.body_text()))?;
    let new_account = validate_new_account(&form, &state.reference_data)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let account_id = create_account(user_id, &new_account, &connection).inspect_err(|error| {
        tracing::error!("Could not create account {new_account:?} for user {user_id}: {error}")
    })?;
    tracing::info!("User {user_id} created account {account_id}");

    Ok(Json(json!({
        "success": true,
        "account_id": account_id,
    }))
    .into_response())
}
