use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version and which integrations are configured.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "recruiter-api",
        "capabilities": state.capabilities(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use crate::ledger::memory::MemoryStore;
    use crate::ledger::Ledger;
    use crate::test_support::{get, send, test_state};

    #[tokio::test]
    async fn test_health_reports_capabilities() {
        let (status, body) = send(test_state(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["capabilities"]["store"], false);
        assert_eq!(body["capabilities"]["autoTrigger"], false);

        let mut state = test_state();
        state.ledger = Ledger::new(Arc::new(MemoryStore::default()));
        state.config.webhook_secret = Some("secret".to_string());
        let (_, body) = send(state, get("/health")).await;
        assert_eq!(body["capabilities"]["store"], true);
        assert_eq!(body["capabilities"]["webhookVerification"], true);
        assert_eq!(body["capabilities"]["voice"], false);
    }
}
