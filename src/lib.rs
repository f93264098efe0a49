//! Finance Tracker is a web app for keeping track of your bank accounts and
//! their balances.
//!
//! This library provides a JSON API for registering and logging in users and
//! for managing the financial accounts each user owns.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod health;
mod logging;
mod reference_data;
mod routing;
mod transaction;

#[cfg(test)]
mod test_utils;

pub use account::{
    Account, AccountId, AccountType, AccountUpdate, NewAccount, create_account, get_account,
    list_accounts, set_archived, update_account,
};
pub use app_state::AppState;
pub use auth::{Email, PasswordHash, User, UserID, ValidatedPassword, create_user};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use reference_data::{Bank, BankList, Currency, CurrencyList, ReferenceData};
pub use routing::build_router;
pub use transaction::{
    NewTransaction, Transaction, TransactionId, TransactionStatus, create_transaction,
    get_account_transactions,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
///
/// Every error is sent to the client as a JSON object of the form
/// `{"success": false, "error": "..."}`. See [Error::status_code] for how
/// each error maps to an HTTP status code.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request body could not be parsed as the expected JSON object.
    #[error("Invalid request body: {0}")]
    InvalidJson(String),

    /// The email or password was left empty.
    #[error("Email and password are required")]
    MissingCredentials,

    /// The email does not look like an email address.
    #[error("Invalid email format")]
    InvalidEmail,

    /// The password has fewer characters than the minimum.
    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),

    /// The password does not contain a letter.
    #[error("Password must contain at least one letter")]
    PasswordMissingLetter,

    /// The password does not contain a digit.
    #[error("Password must contain at least one digit")]
    PasswordMissingDigit,

    /// The email is already used by another user.
    #[error("Email is already registered")]
    DuplicateEmail,

    /// The email is unknown or the password is wrong.
    ///
    /// The two cases share one error so that clients cannot find out which
    /// email addresses are registered.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The session cookie is missing, invalid or expired.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// An empty string was used for an account name.
    #[error("Account name is required")]
    EmptyAccountName,

    /// No account type was given when creating an account.
    #[error("Account type is required")]
    MissingAccountType,

    /// The account type is not one of the supported types.
    #[error("Unsupported account type \"{0}\"")]
    InvalidAccountType(String),

    /// No currency was given when creating an account.
    #[error("Currency is required")]
    MissingCurrency,

    /// The currency code is not in the currency reference list.
    #[error("Unsupported currency \"{0}\"")]
    UnknownCurrency(String),

    /// The bank ID is not in the bank reference list.
    #[error("Unknown bank \"{0}\"")]
    UnknownBank(String),

    /// The initial balance is not a finite number.
    #[error("Invalid initial balance")]
    InvalidInitialBalance,

    /// An account update did not contain any fields.
    #[error("No fields to update")]
    NoFieldsToUpdate,

    /// Tried to update, archive or restore an account that does not exist or
    /// belongs to another user.
    #[error("Account not found")]
    UpdateMissingAccount,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("Not found")]
    NotFound,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("Database error: {0}")]
    SqlError(rusqlite::Error),
}

impl Error {
    /// The HTTP status code to send to the client for this error.
    ///
    /// Validation errors are sent with 200 OK, the `success` flag in the body
    /// tells the client that the request failed.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::HashingError(_)
            | Error::JSONSerializationError(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("users.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Only the database error text is forwarded to the client, the
        // other internal errors are logged and replaced with a generic message.
        let message = if matches!(
            self,
            Error::HashingError(_) | Error::JSONSerializationError(_) | Error::DatabaseLockError
        ) {
            tracing::error!("An unexpected error occurred: {}", self);
            "An internal error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": message,
            })),
        )
            .into_response()
    }
}
