//! The registration endpoint for creating a new user with an email and password.
use std::sync::{Arc, Mutex};

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
    auth::{Email, PasswordHash, ValidatedPassword, create_user, set_auth_cookie},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used when hashing the new password.
    pub password_hash_cost: u32,
    /// The database connection for storing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The JSON body of a registration request.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Check the email and password of a registration request.
///
/// # Errors
///
/// Returns [Error::MissingCredentials] if either field is empty, otherwise the
/// first email or password rule that is broken.
fn validate_registration(form: &RegisterForm) -> Result<(Email, ValidatedPassword), Error> {
    let raw_email = form.email.as_deref().unwrap_or_default();
    let raw_password = form.password.as_deref().unwrap_or_default();

    if raw_email.trim().is_empty() || raw_password.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let email = Email::new(raw_email)?;
    let password = ValidatedPassword::new(raw_password)?;

    Ok((email, password))
}

/// A route handler for registering a new user.
///
/// On success the new user is logged in and the response contains the new user ID.
pub async fn register_user_endpoint(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    payload: Result<Json<RegisterForm>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(form) = payload.map_err(|rejection| Error::InvalidJson(rejection.body_text()))?;
    let (email, password) = validate_registration(&form)?;
    let cost = state.password_hash_cost;
    let password_hash = tokio::task::spawn_blocking(move || PasswordHash::new(password, cost))
        .await
        .map_err(|error| Error::HashingError(error.to_string()))??;

    let user = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        create_user(email, password_hash, &connection)?
    };

    tracing::info!("Registered new user {}", user.id);
    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok((
        jar,
        Json(json!({
            "success": true,
            "user_id": user.id,
        })),
    )
        .into_response())
}


#[cfg(test)]
mod register_user_endpoint_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        auth::{COOKIE_TOKEN, UserID, get_user_by_id},
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_app},
    };

    #[tokio::test]
    async fn register_succeeds_and_logs_in() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER_API)
            .json(&json!({ "email": "Test@Example.com", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["success"], true);
        let user_id = UserID::new(body["user_id"].as_i64().unwrap());

        let user = get_user_by_id(user_id, &app.state.db_connection.lock().unwrap()).unwrap();
        assert_eq!(user.email.as_str(), "test@example.com");
        assert!(user.password_hash.verify(TEST_PASSWORD).unwrap());

        let session_cookie = response.cookie(COOKIE_TOKEN);
        app.server
            .get(endpoints::ACCOUNTS_API)
            .add_cookie(session_cookie)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn register_with_same_email_twice_is_conflict() {
        let app = get_test_app();
        app.server
            .post(endpoints::REGISTER_API)
            .json(&json!({ "email": "test@example.com", "password": TEST_PASSWORD }))
            .await
            .assert_status_ok();

        let response = app
            .server
            .post(endpoints::REGISTER_API)
            .json(&json!({ "email": "TEST@example.com", "password": "another123" }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body = response.json::<Value>();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Email is already registered");
    }

    #[tokio::test]
    async fn register_with_invalid_email_fails() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER_API)
            .json(&json!({ "email": "invalid-email", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "success": false, "error": "Invalid email format" })
        );
    }

    #[tokio::test]
    async fn register_with_weak_password_names_the_rule() {
        let app = get_test_app();

        for (password, want_error) in [
            ("abc1", "Password must be at least 8 characters long"),
            ("12345678", "Password must contain at least one letter"),
            ("password", "Password must contain at least one digit"),
        ] {
            let response = app
                .server
                .post(endpoints::REGISTER_API)
                .json(&json!({ "email": "test@example.com", "password": password }))
                .await;

            response.assert_status_ok();
            let body = response.json::<Value>();
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], want_error, "password {password:?}");
        }
    }

    #[tokio::test]
    async fn register_with_missing_fields_fails() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER_API)
            .json(&json!({ "email": "test@example.com" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["error"], "Email and password are required");
    }

    #[tokio::test]
    async fn register_with_malformed_body_is_bad_request() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER_API)
            .content_type("application/json")
            .text("{not json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["success"], false);
    }
}
