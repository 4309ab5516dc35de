use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::internal_error;
use crate::model::SiteOverview;
use crate::state::AppState;

pub(crate) async fn sites_overview_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<SiteOverview>>, (StatusCode, String)> {
    let overview = state.stats.sites_overview().await.map_err(internal_error)?;
    Ok(Json(overview))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stats/sites-overview", get(sites_overview_handler))
}

#[cfg(test)]
mod tests {
    use crate::model::StorageSite;
    use crate::routes::test_helpers;
    use crate::store::EnvironmentalStore;
    use crate::test_support::{snapshot, CountingInventory, InMemoryMaterialCatalog, InMemoryTransactionLog};
    use axum::http::StatusCode;
    use uuid::Uuid;

    #[tokio::test]
    async fn overview_lists_every_site_with_its_latest_values() {
        let site_id = Uuid::new_v4();
        let app = test_helpers::app_with(
            InMemoryTransactionLog::default(),
            CountingInventory::default(),
            InMemoryMaterialCatalog::default(),
            vec![StorageSite {
                id: site_id,
                name: "Hall A".to_string(),
            }],
        );
        app.store
            .record(&snapshot(site_id, 0, Some(20.0), None))
            .await
            .unwrap();

        let (status, body) = test_helpers::get(&app.router, "/api/stats/sites-overview").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["site"]["name"], "Hall A");
        assert_eq!(entries[0]["temperature"], 20.0);
        assert!(entries[0]["humidity"].is_null());
    }
}
