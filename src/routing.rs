//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState, Error,
    account::{
        archive_account_endpoint, create_account_endpoint, edit_account_endpoint,
        get_account_endpoint, list_accounts_endpoint, restore_account_endpoint,
    },
    auth::{auth_guard, log_in_endpoint, log_out_endpoint, register_user_endpoint},
    endpoints,
    health::get_health,
    reference_data::{get_banks_endpoint, get_currencies_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::HEALTH, get(get_health))
        .route(endpoints::REGISTER_API, post(register_user_endpoint))
        .route(endpoints::LOG_IN_API, post(log_in_endpoint))
        .route(endpoints::LOG_OUT_API, post(log_out_endpoint))
        .route(endpoints::BANKS_API, get(get_banks_endpoint))
        .route(endpoints::CURRENCIES_API, get(get_currencies_endpoint));

    let protected_routes = Router::new()
        .route(
            endpoints::ACCOUNTS_API,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT_API,
            get(get_account_endpoint).put(edit_account_endpoint),
        )
        .route(
            endpoints::ARCHIVE_ACCOUNT_API,
            post(archive_account_endpoint),
        )
        .route(
            endpoints::RESTORE_ACCOUNT_API,
            post(restore_account_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The JSON response for routes that do not exist.
async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{endpoints, test_utils::get_test_app};

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let app = get_test_app();

        let response = app.server.get("/does/not/exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(
            response.json::<Value>(),
            json!({ "success": false, "error": "Not found" })
        );
    }

    #[tokio::test]
    async fn protected_routes_need_a_session() {
        let app = get_test_app();

        for path in [
            endpoints::ACCOUNTS_API,
            "/accounts/api/accounts/1",
        ] {
            let response = app.server.get(path).await;

            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.json::<Value>()["error"], "Not authenticated");
        }
    }

    #[tokio::test]
    async fn full_account_flow() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER_API)
            .json(&json!({ "email": "flow@example.com", "password": "password123" }))
            .await;
        response.assert_status_ok();

        let response = app
            .server
            .post(endpoints::LOG_IN_API)
            .json(&json!({ "email": "flow@example.com", "password": "password123" }))
            .await;
        response.assert_status_ok();
        let session_cookie = response.cookie("session");

        let response = app
            .server
            .post(endpoints::ACCOUNTS_API)
            .add_cookie(session_cookie.clone())
            .json(&json!({
                "name": "Main",
                "type": "checking",
                "currency": "KZT",
                "initial_balance": 100000
            }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["success"], true);

        let response = app
            .server
            .get(endpoints::ACCOUNTS_API)
            .add_cookie(session_cookie)
            .await;
        response.assert_status_ok();
        let accounts = response.json::<Value>()["accounts"].clone();
        assert_eq!(accounts.as_array().unwrap().len(), 1);
        assert_eq!(accounts[0]["current_balance"], 100000.0);
    }
}
