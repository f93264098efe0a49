//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/accounts/api/accounts/{account_id}', use [format_endpoint].

/// The liveness check.
pub const HEALTH: &str = "/health";

/// The route for registering a new user.
pub const REGISTER_API: &str = "/auth/api/register";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/auth/api/login";
/// The route for the client to log out the current user.
pub const LOG_OUT_API: &str = "/auth/api/logout";

/// The route to list and create accounts.
pub const ACCOUNTS_API: &str = "/accounts/api/accounts";
/// The route to get or update a single account.
pub const ACCOUNT_API: &str = "/accounts/api/accounts/{account_id}";
/// The route to archive an account.
pub const ARCHIVE_ACCOUNT_API: &str = "/accounts/api/accounts/{account_id}/archive";
/// The route to restore an archived account.
pub const RESTORE_ACCOUNT_API: &str = "/accounts/api/accounts/{account_id}/restore";

/// The route for the list of supported banks.
pub const BANKS_API: &str = "/accounts/api/data/banks";
/// The route for the list of supported currencies.
pub const CURRENCIES_API: &str = "/accounts/api/data/currencies";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
