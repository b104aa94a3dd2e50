//! Health check handler.

use axum::{extract::State, Json};

use crate::state::AppState;
use crate::types::HealthResponse;

/// GET /api/health - Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.ping().is_ok();
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.config.uptime_seconds(),
        database,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::make_test_state;

    #[tokio::test]
    async fn test_health_handler() {
        let state = make_test_state();
        let response = health(State(state)).await;

        assert_eq!(response.status, "ok");
        assert!(response.database);
        assert!(!response.version.is_empty());
    }
}
