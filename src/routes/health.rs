use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

pub(crate) async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz_handler))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_helpers;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn healthz_reports_ok() {
        let app = test_helpers::app();
        let (status, body) = test_helpers::get(&app.router, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
