#![allow(missing_docs)]

use std::{fs, path::Path};

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{
    AppState, build_router,
    account::AccountId,
    auth::{COOKIE_TOKEN, Email, PasswordHash, UserID, create_user},
    db::initialize,
    endpoints,
    reference_data::{BANKS_FILE_NAME, CURRENCIES_FILE_NAME},
};

/// A password that satisfies the password rules.
pub(crate) const TEST_PASSWORD: &str = "password123";

/// The lowest cost bcrypt accepts, so that tests do not spend their time hashing.
const TEST_PASSWORD_HASH_COST: u32 = 4;

/// An in-memory database with all tables created.
pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    connection
}

#[track_caller]
pub(crate) fn must_create_test_user(connection: &Connection, email: &str) -> UserID {
    create_user(
        Email::new(email).expect("invalid test email"),
        PasswordHash::new_unchecked("not a real hash"),
        connection,
    )
    .expect("Could not create test user")
    .id
}

/// Write bank and currency documents with two banks and three currencies to `dir`.
pub(crate) fn write_reference_data(dir: &Path) {
    let banks = json!({
        "banks": [
            { "id": "kaspi", "name": "Kaspi Bank", "color": "#f14635" },
            { "id": "halyk", "name": "Halyk Bank", "color": "#00805f" }
        ]
    });
    let currencies = json!({
        "currencies": [
            { "code": "KZT", "name": "Kazakhstani Tenge", "symbol": "₸", "default": true },
            { "code": "USD", "name": "US Dollar", "symbol": "$" },
            { "code": "EUR", "name": "Euro", "symbol": "€" }
        ]
    });

    fs::write(dir.join(BANKS_FILE_NAME), banks.to_string()).expect("Could not write banks");
    fs::write(dir.join(CURRENCIES_FILE_NAME), currencies.to_string())
        .expect("Could not write currencies");
}

/// A test server running the full router.
pub(crate) struct TestApp {
    pub server: TestServer,
    /// Shares the database connection with the server.
    pub state: AppState,
    _reference_data_dir: TempDir,
}

pub(crate) fn get_test_app() -> TestApp {
    let reference_data_dir = tempfile::tempdir().expect("Could not create temp dir");
    write_reference_data(reference_data_dir.path());

    let connection =
        Connection::open_in_memory().expect("Could not create in-memory SQLite database");
    let mut state = AppState::new(connection, "test secret", reference_data_dir.path())
        .expect("Could not create app state");
    state.password_hash_cost = TEST_PASSWORD_HASH_COST;

    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    TestApp {
        server,
        state,
        _reference_data_dir: reference_data_dir,
    }
}

/// Register a user with [TEST_PASSWORD] and return their ID and session cookie.
pub(crate) async fn register_test_user(
    server: &TestServer,
    email: &str,
) -> (UserID, Cookie<'static>) {
    let response = server
        .post(endpoints::REGISTER_API)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    let user_id = response.json::<Value>()["user_id"]
        .as_i64()
        .expect("response should contain the new user ID");

    (UserID::new(user_id), response.cookie(COOKIE_TOKEN))
}

/// Create an account through the API and return its ID.
pub(crate) async fn create_test_account(
    server: &TestServer,
    session_cookie: &Cookie<'static>,
    body: Value,
) -> AccountId {
    let response = server
        .post(endpoints::ACCOUNTS_API)
        .add_cookie(session_cookie.clone())
        .json(&body)
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["success"], true, "could not create account: {body}");

    body["account_id"]
        .as_i64()
        .expect("response should contain the new account ID")
}
