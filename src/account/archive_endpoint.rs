//! Defines the endpoints for archiving (soft deleting) and restoring accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, Error,
    account::{AccountId, get_endpoint::account_id_from_path, set_archived},
    auth::UserID,
};

/// The state needed to archive or restore an account.
#[derive(Debug, Clone)]
pub struct ArchiveAccountState {
    /// The database connection for managing accounts.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ArchiveAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn set_archived_response(
    state: &ArchiveAccountState,
    user_id: UserID,
    path: Result<Path<AccountId>, PathRejection>,
    archived: bool,
) -> Result<Response, Error> {
    let account_id = account_id_from_path(path)?;
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    match set_archived(account_id, user_id, archived, &connection) {
        Ok(0) => Err(Error::UpdateMissingAccount),
        Ok(_) => {
            let message = if archived {
                "Account archived"
            } else {
                "Account restored"
            };
            tracing::info!("User {user_id}: {message} ({account_id})");

            Ok(Json(json!({ "success": true, "message": message })).into_response())
        }
        Err(error) => {
            tracing::error!("Could not set archived={archived} on account {account_id}: {error}");
            Err(error)
        }
    }
}

/// A route handler for archiving an account, hiding it from the default account list.
pub async fn archive_account_endpoint(
    State(state): State<ArchiveAccountState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Response, Error> {
    set_archived_response(&state, user_id, path, true)
}

/// A route handler for restoring an archived account.
pub async fn restore_account_endpoint(
    State(state): State<ArchiveAccountState>,
    Extension(user_id): Extension<UserID>,
    path: Result<Path<AccountId>, PathRejection>,
) -> Result<Response, Error> {
    set_archived_response(&state, user_id, path, false)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        endpoints::{self, format_endpoint},
        test_utils::{create_test_account, get_test_app, register_test_user},
    };

    async fn list_account_ids(server: &TestServer, cookie: &Cookie<'static>, query: &str) -> Vec<i64> {
        let response = server
            .get(&format!("{}{query}", endpoints::ACCOUNTS_API))
            .add_cookie(cookie.clone())
            .await;
        response.assert_status_ok();

        response.json::<Value>()["accounts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|account| account["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn archive_hides_account_and_restore_brings_it_back() {
        let app = get_test_app();
        let (_, session_cookie) = register_test_user(&app.server, "foo@bar.baz").await;
        let account_id = create_test_account(
            &app.server,
            &session_cookie,
            json!({ "name": "Old card", "type": "credit", "currency": "KZT" }),
        )
        .await;

        let response = app
            .server
            .post(&format_endpoint(endpoints::ARCHIVE_ACCOUNT_API, account_id))
            .add_cookie(session_cookie.clone())
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "success": true, "message": "Account archived" })
        );

        assert_eq!(list_account_ids(&app.server, &session_cookie, "").await, Vec::<i64>::new());
        assert_eq!(
            list_account_ids(&app.server, &session_cookie, "?include_archived=TRUE").await,
            vec![account_id]
        );
        let response = app
            .server
            .get(&format_endpoint(endpoints::ACCOUNT_API, account_id))
            .add_cookie(session_cookie.clone())
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["account"]["archived"], true);

        let response = app
            .server
            .post(&format_endpoint(endpoints::RESTORE_ACCOUNT_API, account_id))
            .add_cookie(session_cookie.clone())
            .await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "success": true, "message": "Account restored" })
        );
        assert_eq!(
            list_account_ids(&app.server, &session_cookie, "").await,
            vec![account_id]
        );
    }

    #[tokio::test]
    async fn archive_twice_succeeds() {
        let app = get_test_app();
        let (_, session_cookie) = register_test_user(&app.server, "foo@bar.baz").await;
        let account_id = create_test_account(
            &app.server,
            &session_cookie,
            json!({ "name": "Card", "type": "credit", "currency": "KZT" }),
        )
        .await;
        let url = format_endpoint(endpoints::ARCHIVE_ACCOUNT_API, account_id);

        for _ in 0..2 {
            let response = app
                .server
                .post(&url)
                .add_cookie(session_cookie.clone())
                .await;
            response.assert_status_ok();
            assert_eq!(response.json::<Value>()["success"], true);
        }
    }

    #[tokio::test]
    async fn archive_of_other_users_account_is_rejected() {
        let app = get_test_app();
        let (_, owner_cookie) = register_test_user(&app.server, "owner@bar.baz").await;
        let (_, other_cookie) = register_test_user(&app.server, "other@bar.baz").await;
        let account_id = create_test_account(
            &app.server,
            &owner_cookie,
            json!({ "name": "Card", "type": "credit", "currency": "KZT" }),
        )
        .await;

        let response = app
            .server
            .post(&format_endpoint(endpoints::ARCHIVE_ACCOUNT_API, account_id))
            .add_cookie(other_cookie)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "success": false, "error": "Account not found" })
        );
        assert_eq!(
            list_account_ids(&app.server, &owner_cookie, "").await,
            vec![account_id]
        );
    }

    #[tokio::test]
    async fn restore_requires_session() {
        let app = get_test_app();

        let response = app
            .server
            .post(&format_endpoint(endpoints::RESTORE_ACCOUNT_API, 1))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
