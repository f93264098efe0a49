//! The liveness check.

use axum::Json;
use serde_json::{Value, json};

/// Report that the server is up. Does not touch the database.
pub async fn get_health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Finance Tracker is running",
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{endpoints, test_utils::get_test_app};

    #[tokio::test]
    async fn health_check_needs_no_session() {
        let app = get_test_app();

        let response = app.server.get(endpoints::HEALTH).await;

        response.assert_status_ok();
        assert_eq!(
            response.json::<Value>(),
            json!({ "status": "ok", "message": "Finance Tracker is running" })
        );
    }
}
