use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::{internal_error, not_found};
use crate::model::TraceResult;
use crate::services::TraceError;
use crate::state::AppState;

pub(crate) async fn trace_handler(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TraceResult>, (StatusCode, String)> {
    match state.trace.trace(transaction_id).await {
        Ok(result) => Ok(Json(result)),
        Err(TraceError::TransactionNotFound) => Err(not_found("Transaction not found.")),
        Err(TraceError::MaterialBatchNotFound) => Err(not_found("Material batch not found.")),
        Err(TraceError::MaterialNotFound) => Err(not_found("Material not found.")),
        Err(TraceError::Other(err)) => Err(internal_error(err)),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/trace/{transaction_id}", get(trace_handler))
}
