//! The log-in endpoint that checks a user's email and password and starts a session.

use std::sync::{Arc, LazyLock, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        Email, PasswordHash, User, UserID, ValidatedPassword, get_user_by_email, set_auth_cookie,
    },
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data sent by the client in a log-in request.
///
/// The password is kept as a plain string. There is no need for validation here since
/// it will be compared against the password hash in the database.
#[derive(Debug, Default, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    #[serde(default)]
    pub email: Option<String>,
    /// Password entered during log-in.
    #[serde(default)]
    pub password: Option<String>,
}

/// Checked against the password of unknown emails so that a failed log-in costs
/// one bcrypt verification whether or not the email is registered.
static UNKNOWN_USER_PASSWORD_HASH: LazyLock<Option<PasswordHash>> = LazyLock::new(|| {
    PasswordHash::new(
        ValidatedPassword::new_unchecked("no user has this password 0"),
        PasswordHash::DEFAULT_COST,
    )
    .inspect_err(|error| tracing::error!("could not create placeholder password hash: {error}"))
    .ok()
});

/// Find the user with the email in `data` and check their password.
///
/// # Errors
///
/// Returns:
/// - [Error::MissingCredentials] if the email or password is empty,
/// - [Error::InvalidCredentials] if the email is unknown or the password is wrong,
/// - [Error::HashingError] if the password hash could not be checked,
/// - [Error::DatabaseLockError] or [Error::SqlError] for database failures.
fn authenticate(data: &LogInData, db_connection: &Mutex<Connection>) -> Result<User, Error> {
    let raw_email = data.email.as_deref().unwrap_or_default();
    let password = data.password.as_deref().unwrap_or_default();

    if raw_email.trim().is_empty() || password.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let email = Email::new_unchecked(raw_email);
    let user = {
        let connection = db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        match get_user_by_email(&email, &connection) {
            Ok(user) => Some(user),
            Err(Error::NotFound) => None,
            Err(error) => return Err(error),
        }
    };

    let Some(user) = user else {
        if let Some(password_hash) = UNKNOWN_USER_PASSWORD_HASH.as_ref() {
            let _ = password_hash.verify(password);
        }

        return Err(Error::InvalidCredentials);
    };

    let is_password_valid = user
        .password_hash
        .verify(password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    Ok(user)
}

/// Handler for log-in requests.
///
/// On a successful log-in request, the auth cookie is set and the user ID is
/// returned. Unknown emails and wrong passwords get the same error so that
/// clients cannot tell which emails are registered.
pub async fn log_in_endpoint(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(data) = payload.map_err(|rejection| Error::InvalidJson(rejection.body_text()))?;

    let db_connection = state.db_connection.clone();
    let authenticated = tokio::task::spawn_blocking(move || authenticate(&data, &db_connection))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))?;

    let user_id: UserID = match authenticated {
        Ok(user) => user.id,
        Err(error) => {
            tracing::debug!("Log-in attempt failed: {error}");
            return Err(error);
        }
    };

    let jar = set_auth_cookie(jar, user_id, state.cookie_duration)?;
    tracing::info!("User {user_id} logged in");

    Ok((
        jar,
        Json(json!({
            "success": true,
            "user_id": user_id,
        })),
    )
        .into_response())
}
